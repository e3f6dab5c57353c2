//! Strided block copy and accumulate.
//!
//! Moves `count` channel blocks (groups of `lanes` elements) between two
//! blocked buffers whose block strides differ, e.g. when assembling a
//! concatenated tensor by writing one input's blocks into a sub-region of a
//! larger destination. Strides are in elements and count the distance between
//! consecutive blocks; the blocks themselves are contiguous.
//!
//! `count == 0` touches nothing. Bounds are the caller's contract,
//! `debug_assert!`-checked only.

use crate::element::KernelElement;

#[inline(always)]
fn span(stride: usize, count: usize, lanes: usize) -> usize {
    if count == 0 {
        0
    } else {
        (count - 1) * stride + lanes
    }
}

/// Copy `count` blocks from `src` to `dst` with independent strides.
pub fn copy_with_stride<T: KernelElement>(
    dst: &mut [T],
    src: &[T],
    src_stride: usize,
    dst_stride: usize,
    count: usize,
    lanes: usize,
) {
    debug_assert!(src.len() >= span(src_stride, count, lanes), "copy_with_stride: src undersized");
    debug_assert!(dst.len() >= span(dst_stride, count, lanes), "copy_with_stride: dst undersized");
    for i in 0..count {
        let s = &src[i * src_stride..i * src_stride + lanes];
        let d = &mut dst[i * dst_stride..i * dst_stride + lanes];
        d.copy_from_slice(s);
    }
}

/// Accumulate `count` blocks from `src` into `dst` with independent strides.
pub fn add_with_stride(
    dst: &mut [f32],
    src: &[f32],
    src_stride: usize,
    dst_stride: usize,
    count: usize,
    lanes: usize,
) {
    debug_assert!(src.len() >= span(src_stride, count, lanes), "add_with_stride: src undersized");
    debug_assert!(dst.len() >= span(dst_stride, count, lanes), "add_with_stride: dst undersized");
    for i in 0..count {
        let s = &src[i * src_stride..i * src_stride + lanes];
        let d = &mut dst[i * dst_stride..i * dst_stride + lanes];
        for (o, &v) in d.iter_mut().zip(s) {
            *o += v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_into_sub_region() {
        // Interleave two 1-block-wide tensors into a 2-block-wide destination.
        let lanes = 4;
        let a: Vec<f32> = (0..8).map(|v| v as f32).collect();
        let b: Vec<f32> = (100..108).map(|v| v as f32).collect();
        let mut dst = vec![0.0f32; 16];
        copy_with_stride(&mut dst, &a, 4, 8, 2, lanes);
        copy_with_stride(&mut dst[4..], &b, 4, 8, 2, lanes);
        assert_eq!(
            dst,
            vec![
                0.0, 1.0, 2.0, 3.0, 100.0, 101.0, 102.0, 103.0, //
                4.0, 5.0, 6.0, 7.0, 104.0, 105.0, 106.0, 107.0,
            ]
        );
    }

    #[test]
    fn zero_count_is_a_noop() {
        let src = vec![1.0f32; 4];
        let mut dst = vec![7.0f32; 4];
        copy_with_stride(&mut dst, &src, 4, 4, 0, 4);
        add_with_stride(&mut dst, &src, 4, 4, 0, 4);
        assert_eq!(dst, vec![7.0; 4]);
    }

    #[test]
    fn double_accumulate_doubles() {
        let src: Vec<f32> = (0..8).map(|v| v as f32 + 1.0).collect();
        let mut dst = vec![0.0f32; 8];
        add_with_stride(&mut dst, &src, 4, 4, 2, 4);
        add_with_stride(&mut dst, &src, 4, 4, 2, 4);
        for (o, &s) in dst.iter().zip(&src) {
            assert_eq!(*o, 2.0 * s);
        }
    }

    #[test]
    fn copy_generic_over_u8() {
        let src: Vec<u8> = (0..6).collect();
        let mut dst = vec![0u8; 9];
        // Three 2-lane blocks, source packed, destination every third element.
        copy_with_stride(&mut dst, &src, 2, 3, 3, 2);
        assert_eq!(dst, vec![0, 1, 0, 2, 3, 0, 4, 5, 0]);
    }
}
