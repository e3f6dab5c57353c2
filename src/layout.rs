//! Channel-blocked layout codec.
//!
//! Tensors arrive in *linear* layout: channel-major, `src[c * area + p]`.
//! Vector kernels want the *blocked* layout, where channels are grouped into
//! blocks of `lanes` and the lane index varies fastest:
//!
//! ```text
//! blocked[block * area * lanes + p * lanes + lane] = linear[(block * lanes + lane) * area + p]
//! ```
//!
//! The blocked channel dimension is rounded up to a whole number of blocks;
//! `pack` zero-fills the tail lanes of the final block and `unpack` never
//! reads them. The transpose variants use the spatial-major linear ordering
//! `src[p * depth + c]` on the linear side instead.
//!
//! Sizing is the caller's responsibility: these kernels report no errors and
//! check their contracts only through `debug_assert!`.

use crate::dispatch::{IsaLevel, KernelConfig};
use crate::element::KernelElement;

/// Default channel-blocking lane width.
pub const DEFAULT_LANES: usize = 4;

/// Channel-blocking parameters for the layout codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    lanes: usize,
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self::new(DEFAULT_LANES)
    }
}

impl BlockLayout {
    pub const fn new(lanes: usize) -> Self {
        assert!(lanes > 0, "lane width must be positive");
        Self { lanes }
    }

    pub const fn lanes(&self) -> usize {
        self.lanes
    }

    /// Channel count rounded up to a whole number of blocks.
    pub const fn blocked_depth(&self, depth: usize) -> usize {
        depth.div_ceil(self.lanes) * self.lanes
    }

    /// Element count of a blocked buffer for an `area x depth` tensor.
    pub const fn blocked_len(&self, area: usize, depth: usize) -> usize {
        if depth == 0 {
            return 0;
        }
        area * self.blocked_depth(depth)
    }

    /// Linear (channel-major) to blocked. Tail lanes of the final block are
    /// written as zero.
    pub fn pack<T: KernelElement>(&self, dst: &mut [T], src: &[T], area: usize, depth: usize) {
        debug_assert!(src.len() >= area * depth, "pack: src undersized");
        debug_assert!(dst.len() >= self.blocked_len(area, depth), "pack: dst undersized");
        if area == 0 || depth == 0 {
            return;
        }
        let lanes = self.lanes;
        for (b, dst_block) in dst.chunks_exact_mut(area * lanes).enumerate().take(depth.div_ceil(lanes)) {
            let c0 = b * lanes;
            let fill = lanes.min(depth - c0);
            for p in 0..area {
                let out = &mut dst_block[p * lanes..p * lanes + lanes];
                for (i, slot) in out.iter_mut().enumerate() {
                    *slot = if i < fill { src[(c0 + i) * area + p] } else { T::ZERO };
                }
            }
        }
    }

    /// Blocked to linear (channel-major). Padding lanes are never read.
    pub fn unpack<T: KernelElement>(&self, dst: &mut [T], src: &[T], area: usize, depth: usize) {
        debug_assert!(dst.len() >= area * depth, "unpack: dst undersized");
        debug_assert!(src.len() >= self.blocked_len(area, depth), "unpack: src undersized");
        if area == 0 || depth == 0 {
            return;
        }
        let lanes = self.lanes;
        for c in 0..depth {
            let block = &src[(c / lanes) * area * lanes..];
            let lane = c % lanes;
            let row = &mut dst[c * area..c * area + area];
            for (p, slot) in row.iter_mut().enumerate() {
                *slot = block[p * lanes + lane];
            }
        }
    }

    /// Spatial-major linear (`src[p * depth + c]`) to blocked.
    ///
    /// The channel run for one spatial position is contiguous on the linear
    /// side, so each lane group is a straight slice copy.
    pub fn pack_transposed<T: KernelElement>(
        &self,
        dst: &mut [T],
        src: &[T],
        area: usize,
        depth: usize,
    ) {
        debug_assert!(src.len() >= area * depth, "pack_transposed: src undersized");
        debug_assert!(
            dst.len() >= self.blocked_len(area, depth),
            "pack_transposed: dst undersized"
        );
        if area == 0 || depth == 0 {
            return;
        }
        let lanes = self.lanes;
        for (b, dst_block) in dst.chunks_exact_mut(area * lanes).enumerate().take(depth.div_ceil(lanes)) {
            let c0 = b * lanes;
            let fill = lanes.min(depth - c0);
            for p in 0..area {
                let out = &mut dst_block[p * lanes..p * lanes + lanes];
                out[..fill].copy_from_slice(&src[p * depth + c0..p * depth + c0 + fill]);
                for slot in &mut out[fill..] {
                    *slot = T::ZERO;
                }
            }
        }
    }

    /// Blocked to spatial-major linear (`dst[p * depth + c]`).
    pub fn unpack_transposed<T: KernelElement>(
        &self,
        dst: &mut [T],
        src: &[T],
        area: usize,
        depth: usize,
    ) {
        debug_assert!(dst.len() >= area * depth, "unpack_transposed: dst undersized");
        debug_assert!(
            src.len() >= self.blocked_len(area, depth),
            "unpack_transposed: src undersized"
        );
        if area == 0 || depth == 0 {
            return;
        }
        let lanes = self.lanes;
        let blocks = depth / lanes;
        let tail = depth - blocks * lanes;
        for p in 0..area {
            let row = &mut dst[p * depth..p * depth + depth];
            for b in 0..blocks {
                let quad = &src[b * area * lanes + p * lanes..][..lanes];
                row[b * lanes..b * lanes + lanes].copy_from_slice(quad);
            }
            if tail > 0 {
                let quad = &src[blocks * area * lanes + p * lanes..][..tail];
                row[blocks * lanes..].copy_from_slice(quad);
            }
        }
    }
}

/// In-place 4x4 tile transpose when the platform's vector tier profits from
/// the reordered operand.
///
/// Returns whether the reorder was applied; `false` means the caller must use
/// the generic operand path. This is a capability result, not an error.
pub fn reorder4x4_by_platform(config: &KernelConfig, data: &mut [f32]) -> bool {
    debug_assert_eq!(data.len() % 16, 0, "reorder4x4: length not a multiple of 16");
    if config.isa == IsaLevel::Scalar || config.lanes != 4 {
        return false;
    }
    for tile in data.chunks_exact_mut(16) {
        for r in 0..4 {
            for c in (r + 1)..4 {
                tile.swap(r * 4 + c, c * 4 + r);
            }
        }
    }
    true
}
