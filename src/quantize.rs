//! Widening conversion of blocked 8-bit data to 16-bit.
//!
//! Dequantization front end: each u8 value widens to i16 and the quantizer's
//! zero point is subtracted, leaving a signed value centered on zero for the
//! fixed-point arithmetic downstream. Two forms:
//!
//! - [`widen_u8_to_i16`] walks block by block with independent destination and
//!   source strides.
//! - [`widen_u8_to_i16_fast`] assumes each depth block's plane is contiguous
//!   and only the plane-to-plane steps differ, so the inner loop is a straight
//!   run. Both forms produce identical numerics for the same logical input.

/// General form: `count` blocks of `lanes` values, independent block strides.
pub fn widen_u8_to_i16(
    dst: &mut [i16],
    src: &[u8],
    zero_point: i16,
    count: usize,
    dst_stride: usize,
    src_stride: usize,
    lanes: usize,
) {
    debug_assert!(
        count == 0 || src.len() >= (count - 1) * src_stride + lanes,
        "widen_u8_to_i16: src undersized"
    );
    debug_assert!(
        count == 0 || dst.len() >= (count - 1) * dst_stride + lanes,
        "widen_u8_to_i16: dst undersized"
    );
    for i in 0..count {
        let s = &src[i * src_stride..i * src_stride + lanes];
        let d = &mut dst[i * dst_stride..i * dst_stride + lanes];
        for (o, &v) in d.iter_mut().zip(s) {
            *o = i16::from(v) - zero_point;
        }
    }
}

/// Fast form: `depth_quad` planes of `count * lanes` contiguous values each,
/// planes separated by `dst_z_step` / `src_z_step` elements.
pub fn widen_u8_to_i16_fast(
    dst: &mut [i16],
    src: &[u8],
    zero_point: i16,
    count: usize,
    depth_quad: usize,
    dst_z_step: usize,
    src_z_step: usize,
    lanes: usize,
) {
    let plane = count * lanes;
    debug_assert!(
        depth_quad == 0 || src.len() >= (depth_quad - 1) * src_z_step + plane,
        "widen_u8_to_i16_fast: src undersized"
    );
    debug_assert!(
        depth_quad == 0 || dst.len() >= (depth_quad - 1) * dst_z_step + plane,
        "widen_u8_to_i16_fast: dst undersized"
    );
    for z in 0..depth_quad {
        let s = &src[z * src_z_step..z * src_z_step + plane];
        let d = &mut dst[z * dst_z_step..z * dst_z_step + plane];
        for (o, &v) in d.iter_mut().zip(s) {
            *o = i16::from(v) - zero_point;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widen_subtracts_zero_point() {
        let src: Vec<u8> = vec![0, 1, 127, 128, 254, 255, 9, 10];
        let mut dst = vec![0i16; 8];
        widen_u8_to_i16(&mut dst, &src, 128, 2, 4, 4, 4);
        assert_eq!(dst, vec![-128, -127, -1, 0, 126, 127, -119, -118]);
    }

    #[test]
    fn general_form_honors_strides() {
        // Source blocks packed; destination blocks every 6 elements.
        let src: Vec<u8> = (0..8).collect();
        let mut dst = vec![i16::MIN; 10];
        widen_u8_to_i16(&mut dst, &src, 0, 2, 6, 4, 4);
        assert_eq!(&dst[0..4], &[0, 1, 2, 3]);
        assert_eq!(&dst[4..6], &[i16::MIN, i16::MIN]);
        assert_eq!(&dst[6..10], &[4, 5, 6, 7]);
    }

    #[test]
    fn fast_form_agrees_with_general() {
        // Two depth planes of three blocks each, contiguous layout: the fast
        // form's precondition, so both forms must agree exactly.
        let lanes = 4;
        let (count, depth_quad) = (3usize, 2usize);
        let plane = count * lanes;
        let src: Vec<u8> = (0..(plane * depth_quad) as u8).map(|v| v.wrapping_mul(7)).collect();

        let mut general = vec![0i16; plane * depth_quad];
        widen_u8_to_i16(&mut general, &src, 100, count * depth_quad, lanes, lanes, lanes);

        let mut fast = vec![0i16; plane * depth_quad];
        widen_u8_to_i16_fast(&mut fast, &src, 100, count, depth_quad, plane, plane, lanes);

        assert_eq!(general, fast);
    }

    #[test]
    fn extreme_zero_points() {
        let src: Vec<u8> = vec![0, 255, 0, 255];
        let mut dst = vec![0i16; 4];
        widen_u8_to_i16(&mut dst, &src, 0, 1, 4, 4, 4);
        assert_eq!(dst, vec![0, 255, 0, 255]);
        widen_u8_to_i16(&mut dst, &src, 255, 1, 4, 4, 4);
        assert_eq!(dst, vec![-255, 0, -255, 0]);
    }
}
