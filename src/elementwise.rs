//! Fused elementwise kernels over channel-blocked buffers.
//!
//! Blocked operands are laid out `[block][plane][lane]` as produced by
//! [`crate::layout::BlockLayout::pack`]; per-channel parameters (bias, scale,
//! slope) are indexed `[block * lanes + lane]`. The 4-lane case takes a
//! `wide::f32x4` fast path; every other width falls back to the scalar loop
//! with identical arithmetic order, so results match across paths.
//!
//! # Approximations
//!
//! The transcendental kernels use fixed polynomial approximations so outputs
//! are reproducible across platforms:
//!
//! - `exp`: base-2 range reduction with a degree-5 polynomial remainder,
//!   input clamped to `[-87, 87]`. Relative error < 3e-6 on the clamped
//!   domain.
//! - `tanh`: odd-symmetric `(e^{2|x|} - 1) / (e^{2|x|} + 1)` on the same exp
//!   core, exact saturation for `|x| >= 9`. Absolute error < 5e-6 over the
//!   full domain.
//! - `pow`: integer exponent by squaring plus `exp(frac * ln x)` for the
//!   fractional part, `ln` via an atanh-form polynomial. Relative error
//!   < 1e-5 for positive finite inputs.
//!
//! Sizing contracts are `debug_assert!`-checked only; see the crate docs.

use wide::f32x4;

/// Group width of the [`exp_grouped`] / [`pow_grouped`] kernels.
pub const EXP_GROUP: usize = 8;

const EXP_CLAMP: f32 = 87.0;
const LOG2E: f32 = std::f32::consts::LOG2_E;
const LN2: f32 = std::f32::consts::LN_2;
// Cephes-style two-part ln(2) so `x - k*ln2` stays exact for |k| <= 127.
const LN2_HI: f32 = 0.693_359_375;
const LN2_LO: f32 = -2.121_944_4e-4;
const SQRT2: f32 = std::f32::consts::SQRT_2;

// ============================================================================
// Bias addition with fused activation
// ============================================================================

/// In-place per-channel bias add: `dst[z][p][i] += bias[z*lanes + i]`.
pub fn add_bias(dst: &mut [f32], bias: &[f32], plane_number: usize, block_number: usize, lanes: usize) {
    debug_assert!(bias.len() >= block_number * lanes, "add_bias: bias undersized");
    debug_assert!(
        dst.len() >= block_number * plane_number * lanes,
        "add_bias: dst undersized"
    );
    if plane_number == 0 || block_number == 0 {
        return;
    }
    if lanes == 4 {
        for (z, plane) in dst.chunks_exact_mut(plane_number * 4).enumerate().take(block_number) {
            let b = &bias[z * 4..z * 4 + 4];
            let bv = f32x4::from([b[0], b[1], b[2], b[3]]);
            for quad in plane.chunks_exact_mut(4) {
                let v = f32x4::from([quad[0], quad[1], quad[2], quad[3]]) + bv;
                quad.copy_from_slice(&v.to_array());
            }
        }
        return;
    }
    for z in 0..block_number {
        let b = &bias[z * lanes..(z + 1) * lanes];
        let plane = &mut dst[z * plane_number * lanes..(z + 1) * plane_number * lanes];
        for group in plane.chunks_exact_mut(lanes) {
            for (v, &bi) in group.iter_mut().zip(b) {
                *v += bi;
            }
        }
    }
}

/// Bias add fused with ReLU: `dst = max(0, dst + bias)`.
pub fn add_bias_relu(dst: &mut [f32], bias: &[f32], plane_number: usize, block_number: usize, lanes: usize) {
    debug_assert!(bias.len() >= block_number * lanes, "add_bias_relu: bias undersized");
    debug_assert!(
        dst.len() >= block_number * plane_number * lanes,
        "add_bias_relu: dst undersized"
    );
    if plane_number == 0 || block_number == 0 {
        return;
    }
    if lanes == 4 {
        for (z, plane) in dst.chunks_exact_mut(plane_number * 4).enumerate().take(block_number) {
            let b = &bias[z * 4..z * 4 + 4];
            let bv = f32x4::from([b[0], b[1], b[2], b[3]]);
            for quad in plane.chunks_exact_mut(4) {
                let v = (f32x4::from([quad[0], quad[1], quad[2], quad[3]]) + bv).max(f32x4::ZERO);
                quad.copy_from_slice(&v.to_array());
            }
        }
        return;
    }
    for z in 0..block_number {
        let b = &bias[z * lanes..(z + 1) * lanes];
        let plane = &mut dst[z * plane_number * lanes..(z + 1) * plane_number * lanes];
        for group in plane.chunks_exact_mut(lanes) {
            for (v, &bi) in group.iter_mut().zip(b) {
                *v = (*v + bi).max(0.0);
            }
        }
    }
}

/// Bias add fused with ReLU6: `dst = clamp(dst + bias, 0, 6)`.
pub fn add_bias_relu6(dst: &mut [f32], bias: &[f32], plane_number: usize, block_number: usize, lanes: usize) {
    debug_assert!(bias.len() >= block_number * lanes, "add_bias_relu6: bias undersized");
    debug_assert!(
        dst.len() >= block_number * plane_number * lanes,
        "add_bias_relu6: dst undersized"
    );
    if plane_number == 0 || block_number == 0 {
        return;
    }
    if lanes == 4 {
        let six = f32x4::splat(6.0);
        for (z, plane) in dst.chunks_exact_mut(plane_number * 4).enumerate().take(block_number) {
            let b = &bias[z * 4..z * 4 + 4];
            let bv = f32x4::from([b[0], b[1], b[2], b[3]]);
            for quad in plane.chunks_exact_mut(4) {
                let v = (f32x4::from([quad[0], quad[1], quad[2], quad[3]]) + bv)
                    .max(f32x4::ZERO)
                    .min(six);
                quad.copy_from_slice(&v.to_array());
            }
        }
        return;
    }
    for z in 0..block_number {
        let b = &bias[z * lanes..(z + 1) * lanes];
        let plane = &mut dst[z * plane_number * lanes..(z + 1) * plane_number * lanes];
        for group in plane.chunks_exact_mut(lanes) {
            for (v, &bi) in group.iter_mut().zip(b) {
                *v = (*v + bi).clamp(0.0, 6.0);
            }
        }
    }
}

// ============================================================================
// Scale + bias affine transforms
// ============================================================================

/// Per-channel affine on blocked data: `dst = src * alpha[ch] + bias[ch]`.
pub fn scale_and_add_bias(
    dst: &mut [f32],
    src: &[f32],
    bias: &[f32],
    alpha: &[f32],
    plane_number: usize,
    block_number: usize,
    lanes: usize,
) {
    debug_assert!(bias.len() >= block_number * lanes, "scale_and_add_bias: bias undersized");
    debug_assert!(alpha.len() >= block_number * lanes, "scale_and_add_bias: alpha undersized");
    debug_assert!(
        dst.len() >= block_number * plane_number * lanes && src.len() >= block_number * plane_number * lanes,
        "scale_and_add_bias: buffer undersized"
    );
    if lanes == 4 {
        for z in 0..block_number {
            let b = &bias[z * 4..z * 4 + 4];
            let a = &alpha[z * 4..z * 4 + 4];
            let bv = f32x4::from([b[0], b[1], b[2], b[3]]);
            let av = f32x4::from([a[0], a[1], a[2], a[3]]);
            let src_plane = &src[z * plane_number * 4..(z + 1) * plane_number * 4];
            let dst_plane = &mut dst[z * plane_number * 4..(z + 1) * plane_number * 4];
            for (out, quad) in dst_plane.chunks_exact_mut(4).zip(src_plane.chunks_exact(4)) {
                let v = f32x4::from([quad[0], quad[1], quad[2], quad[3]]) * av + bv;
                out.copy_from_slice(&v.to_array());
            }
        }
        return;
    }
    for z in 0..block_number {
        let b = &bias[z * lanes..(z + 1) * lanes];
        let a = &alpha[z * lanes..(z + 1) * lanes];
        let src_plane = &src[z * plane_number * lanes..(z + 1) * plane_number * lanes];
        let dst_plane = &mut dst[z * plane_number * lanes..(z + 1) * plane_number * lanes];
        for (out, group) in dst_plane.chunks_exact_mut(lanes).zip(src_plane.chunks_exact(lanes)) {
            for i in 0..lanes {
                out[i] = src_mul_add(group[i], a[i], b[i]);
            }
        }
    }
}

/// Uniform affine: `dst[i] = src[i] * alpha + bias` for the whole buffer.
pub fn scale_and_add_bias_scalar(dst: &mut [f32], src: &[f32], bias: f32, alpha: f32) {
    debug_assert_eq!(dst.len(), src.len(), "scale_and_add_bias_scalar: length mismatch");
    let bv = f32x4::splat(bias);
    let av = f32x4::splat(alpha);
    let n4 = src.len() / 4 * 4;
    for (out, quad) in dst[..n4].chunks_exact_mut(4).zip(src[..n4].chunks_exact(4)) {
        let v = f32x4::from([quad[0], quad[1], quad[2], quad[3]]) * av + bv;
        out.copy_from_slice(&v.to_array());
    }
    for (out, &x) in dst[n4..].iter_mut().zip(&src[n4..]) {
        *out = src_mul_add(x, alpha, bias);
    }
}

/// Per-channel affine on *linear* (channel-outer) data:
/// `dst[z][p] = src[z][p] * alpha[z] + bias[z]`.
pub fn scale_and_add_bias_outside(
    dst: &mut [f32],
    src: &[f32],
    bias: &[f32],
    alpha: &[f32],
    plane_number: usize,
    bias_number: usize,
) {
    debug_assert!(bias.len() >= bias_number && alpha.len() >= bias_number);
    debug_assert!(dst.len() >= plane_number * bias_number && src.len() >= plane_number * bias_number);
    for z in 0..bias_number {
        let (b, a) = (bias[z], alpha[z]);
        let src_row = &src[z * plane_number..(z + 1) * plane_number];
        let dst_row = &mut dst[z * plane_number..(z + 1) * plane_number];
        for (out, &x) in dst_row.iter_mut().zip(src_row) {
            *out = src_mul_add(x, a, b);
        }
    }
}

#[inline(always)]
fn src_mul_add(x: f32, a: f32, b: f32) -> f32 {
    // Plain mul+add, not fused: keeps scalar and f32x4 paths bit-identical.
    x * a + b
}

// ============================================================================
// Rectifier family
// ============================================================================

/// Leaky rectifier with a uniform slope: negative values scale by `slope`.
pub fn relu_with_slope(dst: &mut [f32], src: &[f32], slope: f32) {
    debug_assert_eq!(dst.len(), src.len(), "relu_with_slope: length mismatch");
    for (out, &x) in dst.iter_mut().zip(src) {
        *out = if x < 0.0 { x * slope } else { x };
    }
}

/// Leaky rectifier with a per-channel slope over blocked data.
pub fn relu_with_slope_channel(
    dst: &mut [f32],
    src: &[f32],
    slope: &[f32],
    plane_number: usize,
    block_number: usize,
    lanes: usize,
) {
    debug_assert!(slope.len() >= block_number * lanes, "relu_with_slope_channel: slope undersized");
    debug_assert!(
        dst.len() >= block_number * plane_number * lanes && src.len() >= block_number * plane_number * lanes,
        "relu_with_slope_channel: buffer undersized"
    );
    for z in 0..block_number {
        let s = &slope[z * lanes..(z + 1) * lanes];
        let src_plane = &src[z * plane_number * lanes..(z + 1) * plane_number * lanes];
        let dst_plane = &mut dst[z * plane_number * lanes..(z + 1) * plane_number * lanes];
        for (out, group) in dst_plane.chunks_exact_mut(lanes).zip(src_plane.chunks_exact(lanes)) {
            for i in 0..lanes {
                out[i] = if group[i] < 0.0 { group[i] * s[i] } else { group[i] };
            }
        }
    }
}

/// Standalone ReLU6: `dst = clamp(src, 0, 6)`.
pub fn relu6(dst: &mut [f32], src: &[f32]) {
    debug_assert_eq!(dst.len(), src.len(), "relu6: length mismatch");
    for (out, &x) in dst.iter_mut().zip(src) {
        *out = x.clamp(0.0, 6.0);
    }
}

/// 8-bit rectifier: `dst = max(0, src)`.
pub fn relu_int8(dst: &mut [i8], src: &[i8]) {
    debug_assert_eq!(dst.len(), src.len(), "relu_int8: length mismatch");
    for (out, &x) in dst.iter_mut().zip(src) {
        *out = x.max(0);
    }
}

// ============================================================================
// Transcendental approximations
// ============================================================================

/// Canonical parameter block for [`exp_grouped`]:
/// `[log2(e), ln2_hi, ln2_lo, 1, 1/2!, 1/3!, 1/4!, 1/5!]`.
pub const fn exp_parameters() -> [f32; 8] {
    [
        LOG2E,
        LN2_HI,
        LN2_LO,
        1.0,
        0.5,
        1.0 / 6.0,
        1.0 / 24.0,
        1.0 / 120.0,
    ]
}

/// Canonical parameter block for [`pow_grouped`] with fractional exponent
/// `beta_frac`: `[beta_frac, 2, 2/3, 2/5]` (atanh-form ln coefficients).
pub const fn pow_parameters(beta_frac: f32) -> [f32; 4] {
    [beta_frac, 2.0, 2.0 / 3.0, 2.0 / 5.0]
}

#[inline(always)]
fn pow2i(k: i32) -> f32 {
    f32::from_bits(((k + 127) as u32) << 23)
}

#[inline(always)]
fn exp_core(x: f32, p: &[f32; 8]) -> f32 {
    let x = x.clamp(-EXP_CLAMP, EXP_CLAMP);
    let k = (x * p[0]).round();
    let r = x - k * p[1] - k * p[2];
    let poly = 1.0 + r * (p[3] + r * (p[4] + r * (p[5] + r * (p[6] + r * p[7]))));
    poly * pow2i(k as i32)
}

/// `ln x` for positive finite `x`, atanh form: `2 atanh((m-1)/(m+1))` on the
/// mantissa normalized into `[sqrt2/2, sqrt2)`, plus the exponent times ln 2.
#[inline(always)]
fn ln_core(x: f32, c: &[f32; 4]) -> f32 {
    let bits = x.to_bits();
    let mut e = ((bits >> 23) & 0xff) as i32 - 127;
    let mut m = f32::from_bits((bits & 0x007f_ffff) | 0x3f80_0000);
    if m >= SQRT2 {
        m *= 0.5;
        e += 1;
    }
    let s = (m - 1.0) / (m + 1.0);
    let s2 = s * s;
    s * (c[1] + s2 * (c[2] + s2 * c[3])) + e as f32 * LN2
}

/// Grouped exponential over `count * EXP_GROUP` elements with caller-supplied
/// polynomial parameters (see [`exp_parameters`] for the canonical block).
pub fn exp_grouped(dst: &mut [f32], src: &[f32], parameters: &[f32; 8], count: usize) {
    let n = count * EXP_GROUP;
    debug_assert!(dst.len() >= n && src.len() >= n, "exp_grouped: buffer undersized");
    for (out, &x) in dst[..n].iter_mut().zip(&src[..n]) {
        *out = exp_core(x, parameters);
    }
}

/// Elementwise exponential with the canonical parameters, any length.
pub fn exp(dst: &mut [f32], src: &[f32]) {
    debug_assert_eq!(dst.len(), src.len(), "exp: length mismatch");
    let p = exp_parameters();
    for (out, &x) in dst.iter_mut().zip(src) {
        *out = exp_core(x, &p);
    }
}

/// Elementwise hyperbolic tangent.
///
/// Computed as `sign(x) * (e^{2|x|} - 1) / (e^{2|x|} + 1)` on the exp core;
/// the `k == 0` branch keeps `e^r - 1` in its cancellation-free polynomial
/// form so tiny inputs stay accurate.
pub fn tanh(dst: &mut [f32], src: &[f32]) {
    debug_assert_eq!(dst.len(), src.len(), "tanh: length mismatch");
    let p = exp_parameters();
    for (out, &x) in dst.iter_mut().zip(src) {
        if !(x.abs() < 9.0) {
            // Saturated (or NaN propagated through signum).
            *out = x.signum();
            continue;
        }
        let a = 2.0 * x.abs();
        let k = (a * p[0]).round();
        let r = a - k * p[1] - k * p[2];
        let pm1 = r * (p[3] + r * (p[4] + r * (p[5] + r * (p[6] + r * p[7]))));
        let e = (1.0 + pm1) * pow2i(k as i32);
        let em1 = if k == 0.0 { pm1 } else { e - 1.0 };
        let t = em1 / (e + 1.0);
        *out = if x < 0.0 { -t } else { t };
    }
}

/// Grouped power: `dst = src ^ (beta_int + pow_param[0])` over
/// `count * EXP_GROUP` elements.
///
/// The integer part multiplies by squaring; the fractional part goes through
/// `exp(frac * ln x)` with the caller's ln coefficients (canonical block from
/// [`pow_parameters`]). Fractional exponents require positive inputs.
pub fn pow_grouped(dst: &mut [f32], src: &[f32], pow_param: &[f32; 4], beta_int: usize, count: usize) {
    let n = count * EXP_GROUP;
    debug_assert!(dst.len() >= n && src.len() >= n, "pow_grouped: buffer undersized");
    let frac = pow_param[0];
    let exp_p = exp_parameters();
    for (out, &x) in dst[..n].iter_mut().zip(&src[..n]) {
        let mut acc = 1.0f32;
        let mut base = x;
        let mut k = beta_int;
        while k > 0 {
            if k & 1 == 1 {
                acc *= base;
            }
            base *= base;
            k >>= 1;
        }
        if frac != 0.0 {
            acc *= exp_core(frac * ln_core(x, pow_param), &exp_p);
        }
        *out = acc;
    }
}

// ============================================================================
// Running reductions
// ============================================================================

/// Running per-lane maximum: folds `input_count_unit` groups of `lanes`
/// elements into the `lanes`-wide accumulator.
pub fn max_float(input: &[f32], acc: &mut [f32], input_count_unit: usize, lanes: usize) {
    debug_assert!(input.len() >= input_count_unit * lanes, "max_float: input undersized");
    debug_assert!(acc.len() >= lanes, "max_float: accumulator undersized");
    if lanes == 4 {
        let mut m = f32x4::from([acc[0], acc[1], acc[2], acc[3]]);
        for quad in input.chunks_exact(4).take(input_count_unit) {
            m = m.max(f32x4::from([quad[0], quad[1], quad[2], quad[3]]));
        }
        acc[..4].copy_from_slice(&m.to_array());
        return;
    }
    for group in input.chunks_exact(lanes).take(input_count_unit) {
        for (a, &v) in acc.iter_mut().zip(group) {
            *a = a.max(v);
        }
    }
}

/// Running per-lane minimum, counterpart of [`max_float`].
pub fn min_float(input: &[f32], acc: &mut [f32], input_count_unit: usize, lanes: usize) {
    debug_assert!(input.len() >= input_count_unit * lanes, "min_float: input undersized");
    debug_assert!(acc.len() >= lanes, "min_float: accumulator undersized");
    if lanes == 4 {
        let mut m = f32x4::from([acc[0], acc[1], acc[2], acc[3]]);
        for quad in input.chunks_exact(4).take(input_count_unit) {
            m = m.min(f32x4::from([quad[0], quad[1], quad[2], quad[3]]));
        }
        acc[..4].copy_from_slice(&m.to_array());
        return;
    }
    for group in input.chunks_exact(lanes).take(input_count_unit) {
        for (a, &v) in acc.iter_mut().zip(group) {
            *a = a.min(v);
        }
    }
}
