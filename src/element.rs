//! Element types accepted by the layout and copy kernels.

use half::{bf16, f16};

/// Scalar element identifier, used by callers that dispatch on dtype at
/// runtime rather than through monomorphization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    F32,
    F16,
    BF16,
    U8,
    I8,
    I16,
}

/// Trait for scalars the layout codec can move around.
///
/// Layout transforms only copy values and write zero padding, so the bound is
/// deliberately thin: `Copy` plus a zero constant. Arithmetic kernels take
/// concrete `f32`/`i8`/`i16` slices instead of going through this trait.
pub trait KernelElement: Copy + Default + Send + Sync + 'static {
    const ZERO: Self;
    const TYPE_ID: ElementType;
}

impl KernelElement for f32 {
    const ZERO: Self = 0.0;
    const TYPE_ID: ElementType = ElementType::F32;
}

impl KernelElement for f16 {
    const ZERO: Self = f16::ZERO;
    const TYPE_ID: ElementType = ElementType::F16;
}

impl KernelElement for bf16 {
    const ZERO: Self = bf16::ZERO;
    const TYPE_ID: ElementType = ElementType::BF16;
}

impl KernelElement for u8 {
    const ZERO: Self = 0;
    const TYPE_ID: ElementType = ElementType::U8;
}

impl KernelElement for i8 {
    const ZERO: Self = 0;
    const TYPE_ID: ElementType = ElementType::I8;
}

impl KernelElement for i16 {
    const ZERO: Self = 0;
    const TYPE_ID: ElementType = ElementType::I16;
}
