//! Operand packing for the tiled, blocked GEMM kernel.
//!
//! The GEMM kernel itself lives outside this crate; these transforms put its
//! operands into the tile layout it consumes and turn its output back into a
//! row-major matrix. For `C = A x B` with `A: e x l`, `B: l x h`:
//!
//! - packed LHS: row tiles of width `eP`, each tile stored reduction-major
//!   with the row lane fastest: `lhs[tile][k][r]`;
//! - packed RHS: column tiles of width `hP`, stored `rhs[tile][k][c]`;
//! - blocked output: `out[h_tile][row][c]`, `hP` columns per tile.
//!
//! The reduction dimension is padded to a multiple of `lP` and boundary tiles
//! are zero-filled, so the kernel never needs edge handling; padded terms
//! contribute zero to every dot product. Tile dimensions come from
//! [`crate::dispatch::IsaLevel::preferred_tile`] or an explicit [`MatMulTile`].

/// GEMM pack tile dimensions `(eP, lP, hP)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatMulTile {
    /// Row-tile width of the packed left operand.
    pub e: usize,
    /// Reduction-dimension granule; `1` for the f32 path.
    pub l: usize,
    /// Column-tile width of the packed right operand.
    pub h: usize,
}

impl MatMulTile {
    pub const fn new(e: usize, l: usize, h: usize) -> Self {
        assert!(e > 0 && l > 0 && h > 0, "tile dimensions must be positive");
        Self { e, l, h }
    }

    /// Reduction length padded to a whole number of `lP` granules.
    pub const fn padded_l(&self, l: usize) -> usize {
        l.div_ceil(self.l) * self.l
    }

    /// Element count of the packed left operand for an `e x l` matrix.
    pub const fn packed_lhs_len(&self, e: usize, l: usize) -> usize {
        e.div_ceil(self.e) * self.e * self.padded_l(l)
    }

    /// Element count of the packed right operand for an `l x h` matrix.
    pub const fn packed_rhs_len(&self, h: usize, l: usize) -> usize {
        h.div_ceil(self.h) * self.h * self.padded_l(l)
    }

    /// Element count of the blocked GEMM output for an `e x h` result.
    pub const fn packed_output_len(&self, e: usize, h: usize) -> usize {
        h.div_ceil(self.h) * self.h * e
    }
}

/// Pack the left operand into `eP`-wide row tiles.
///
/// `transpose == false` reads `src` as `e x l` row-major; `transpose == true`
/// reads it as `l x e` (the matrix is stored reduction-major). Boundary tiles
/// and reduction padding are zero-filled.
pub fn pack_lhs(dst: &mut [f32], src: &[f32], e: usize, l: usize, transpose: bool, tile: MatMulTile) {
    debug_assert!(src.len() >= e * l, "pack_lhs: src undersized");
    debug_assert!(dst.len() >= tile.packed_lhs_len(e, l), "pack_lhs: dst undersized");
    if e == 0 || l == 0 {
        return;
    }
    let te = tile.e;
    let lpad = tile.padded_l(l);
    for (t, out) in dst.chunks_exact_mut(lpad * te).enumerate().take(e.div_ceil(te)) {
        let row0 = t * te;
        for k in 0..lpad {
            let out_row = &mut out[k * te..k * te + te];
            for (r, slot) in out_row.iter_mut().enumerate() {
                let row = row0 + r;
                *slot = if row < e && k < l {
                    if transpose {
                        src[k * e + row]
                    } else {
                        src[row * l + k]
                    }
                } else {
                    0.0
                };
            }
        }
    }
}

/// Pack the right operand into `hP`-wide column tiles.
///
/// `transpose == false` reads `src` as `l x h` row-major; `transpose == true`
/// reads it as `h x l`. Boundary tiles and reduction padding are zero-filled.
pub fn pack_rhs(dst: &mut [f32], src: &[f32], h: usize, l: usize, transpose: bool, tile: MatMulTile) {
    debug_assert!(src.len() >= h * l, "pack_rhs: src undersized");
    debug_assert!(dst.len() >= tile.packed_rhs_len(h, l), "pack_rhs: dst undersized");
    if h == 0 || l == 0 {
        return;
    }
    let th = tile.h;
    let lpad = tile.padded_l(l);
    for (u, out) in dst.chunks_exact_mut(lpad * th).enumerate().take(h.div_ceil(th)) {
        let col0 = u * th;
        for k in 0..lpad {
            let out_row = &mut out[k * th..k * th + th];
            for (c, slot) in out_row.iter_mut().enumerate() {
                let col = col0 + c;
                *slot = if col < h && k < l {
                    if transpose {
                        src[col * l + k]
                    } else {
                        src[k * h + col]
                    }
                } else {
                    0.0
                };
            }
        }
    }
}

/// Unpack the blocked GEMM output into a row-major `e x h` matrix.
///
/// The source layout is `src[h_tile][row][c]` with `hP` columns per tile;
/// padded columns beyond `h` are skipped, never read into the result.
pub fn unpack_output(dst: &mut [f32], src: &[f32], e: usize, h: usize, tile: MatMulTile) {
    debug_assert!(dst.len() >= e * h, "unpack_output: dst undersized");
    debug_assert!(src.len() >= tile.packed_output_len(e, h), "unpack_output: src undersized");
    if e == 0 || h == 0 {
        return;
    }
    let th = tile.h;
    for (u, block) in src.chunks_exact(e * th).enumerate().take(h.div_ceil(th)) {
        let col0 = u * th;
        let width = th.min(h - col0);
        for i in 0..e {
            let row = &mut dst[i * h + col0..i * h + col0 + width];
            row.copy_from_slice(&block[i * th..i * th + width]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference triple-loop multiply, `A: e x l`, `B: l x h`.
    fn naive_multiply(a: &[f32], b: &[f32], e: usize, l: usize, h: usize) -> Vec<f32> {
        let mut c = vec![0.0f32; e * h];
        for i in 0..e {
            for j in 0..h {
                let mut sum = 0.0f64;
                for k in 0..l {
                    sum += a[i * l + k] as f64 * b[k * h + j] as f64;
                }
                c[i * h + j] = sum as f32;
            }
        }
        c
    }

    /// Blocked GEMM over packed operands, standing in for the external
    /// kernel: consumes exactly the layouts this module produces.
    fn gemm_packed(lhs: &[f32], rhs: &[f32], e: usize, l: usize, h: usize, tile: MatMulTile) -> Vec<f32> {
        let lpad = tile.padded_l(l);
        let (te, th) = (tile.e, tile.h);
        let mut out = vec![0.0f32; tile.packed_output_len(e, h)];
        for u in 0..h.div_ceil(th) {
            let b_tile = &rhs[u * lpad * th..(u + 1) * lpad * th];
            for i in 0..e {
                let a_tile = &lhs[(i / te) * lpad * te..];
                let r = i % te;
                for c in 0..th {
                    let mut sum = 0.0f32;
                    for k in 0..lpad {
                        sum += a_tile[k * te + r] * b_tile[k * th + c];
                    }
                    out[u * e * th + i * th + c] = sum;
                }
            }
        }
        out
    }

    fn check_shape(e: usize, l: usize, h: usize, tile: MatMulTile) {
        let a: Vec<f32> = (0..e * l).map(|v| ((v * 7 + 3) % 23) as f32 * 0.25 - 2.0).collect();
        let b: Vec<f32> = (0..l * h).map(|v| ((v * 5 + 1) % 19) as f32 * 0.5 - 4.0).collect();

        let mut packed_a = vec![0.0f32; tile.packed_lhs_len(e, l)];
        let mut packed_b = vec![0.0f32; tile.packed_rhs_len(h, l)];
        pack_lhs(&mut packed_a, &a, e, l, false, tile);
        pack_rhs(&mut packed_b, &b, h, l, false, tile);

        let blocked = gemm_packed(&packed_a, &packed_b, e, l, h, tile);
        let mut c = vec![0.0f32; e * h];
        unpack_output(&mut c, &blocked, e, h, tile);

        let reference = naive_multiply(&a, &b, e, l, h);
        // f32 accumulation error grows with the reduction length and the
        // magnitude of the summed products, not the (possibly cancelled)
        // result, so the bound scales with l * max|a*b|.
        let tol = 1e-5 * (l as f32 * 20.0);
        for (idx, (&got, &want)) in c.iter().zip(&reference).enumerate() {
            assert!(
                (got - want).abs() <= tol.max(1e-5 * want.abs()),
                "shape ({e},{l},{h}) tile {tile:?}: C[{idx}] = {got}, reference {want}"
            );
        }
    }

    #[test]
    fn packing_reproduces_naive_multiply() {
        let tile = MatMulTile::new(16, 1, 4);
        // Exact-tile and boundary shapes, all dims off tile multiples.
        check_shape(16, 8, 4, tile);
        check_shape(17, 9, 5, tile);
        check_shape(3, 1, 1, tile);
        check_shape(33, 7, 13, tile);
    }

    #[test]
    fn packing_holds_for_every_isa_tile() {
        use crate::dispatch::IsaLevel;
        for isa in [IsaLevel::Scalar, IsaLevel::Avx2, IsaLevel::Avx512, IsaLevel::Neon] {
            check_shape(19, 11, 21, isa.preferred_tile());
        }
    }

    #[test]
    fn reduction_granule_padding() {
        // lP > 1 pads the reduction dimension with zeros; results unchanged.
        check_shape(10, 7, 9, MatMulTile::new(8, 4, 4));
    }

    #[test]
    fn transposed_operands_match_plain_packing() {
        let tile = MatMulTile::new(16, 1, 4);
        let (e, l, h) = (6usize, 5usize, 7usize);
        let a: Vec<f32> = (0..e * l).map(|v| v as f32).collect();
        let b: Vec<f32> = (0..l * h).map(|v| v as f32 * 0.5).collect();

        // A stored l x e, B stored h x l.
        let mut a_t = vec![0.0f32; e * l];
        for i in 0..e {
            for k in 0..l {
                a_t[k * e + i] = a[i * l + k];
            }
        }
        let mut b_t = vec![0.0f32; l * h];
        for k in 0..l {
            for j in 0..h {
                b_t[j * l + k] = b[k * h + j];
            }
        }

        let mut plain_a = vec![0.0f32; tile.packed_lhs_len(e, l)];
        let mut trans_a = vec![0.0f32; tile.packed_lhs_len(e, l)];
        pack_lhs(&mut plain_a, &a, e, l, false, tile);
        pack_lhs(&mut trans_a, &a_t, e, l, true, tile);
        assert_eq!(plain_a, trans_a);

        let mut plain_b = vec![0.0f32; tile.packed_rhs_len(h, l)];
        let mut trans_b = vec![0.0f32; tile.packed_rhs_len(h, l)];
        pack_rhs(&mut plain_b, &b, h, l, false, tile);
        pack_rhs(&mut trans_b, &b_t, h, l, true, tile);
        assert_eq!(plain_b, trans_b);
    }

    #[test]
    fn boundary_tiles_are_zero_padded() {
        let tile = MatMulTile::new(4, 1, 4);
        let (e, l) = (5usize, 3usize);
        let a: Vec<f32> = (0..e * l).map(|_| 1.0).collect();
        let mut packed = vec![f32::NAN; tile.packed_lhs_len(e, l)];
        pack_lhs(&mut packed, &a, e, l, false, tile);
        // Second row tile holds row 4 in lane 0; lanes 1..3 must be zero.
        let second = &packed[tile.padded_l(l) * 4..];
        for k in 0..l {
            assert_eq!(second[k * 4], 1.0);
            assert_eq!(&second[k * 4 + 1..k * 4 + 4], &[0.0, 0.0, 0.0]);
        }
    }
}
