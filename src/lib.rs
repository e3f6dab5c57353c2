//! lanepack-kernels: blocked-layout CPU kernels for NN inference.
//!
//! This crate prepares tensor data for SIMD execution and applies fused
//! elementwise math on the prepared buffers:
//! - **Layout codec**: linear ↔ channel-blocked conversion with a fixed lane
//!   width, zero-padded partial blocks, transpose variants
//! - **Elementwise kernels**: bias add with fused ReLU/ReLU6, per-channel
//!   affine, leaky rectifiers, exp/tanh/pow approximations, running max/min
//! - **GEMM packing**: tiled operand layout for a blocked matrix-multiply
//!   kernel plus the output unpack
//! - **Runtime dispatch**: one-time ISA probe feeding an injected
//!   [`KernelConfig`], no hidden global function pointers
//!
//! # Contract
//!
//! Every kernel is a pure transform over caller-owned, non-overlapping
//! buffers: no allocation, no locks, no I/O. Sizing preconditions are checked
//! with `debug_assert!` in debug builds and not at all in release; violating
//! them is a caller bug, not a reported failure. Concurrent calls are safe as
//! long as their `dst`/`src` regions are disjoint.
//!
//! # Quick start
//!
//! ```
//! use lanepack_kernels::{BlockLayout, KernelConfig};
//!
//! let layout: BlockLayout = KernelConfig::native().layout();
//! let (area, depth) = (2, 5);
//! let linear: Vec<f32> = (0..area * depth).map(|v| v as f32).collect();
//! let mut blocked = vec![0.0; layout.blocked_len(area, depth)];
//! layout.pack(&mut blocked, &linear, area, depth);
//! ```

pub mod dispatch;
pub mod element;
pub mod elementwise;
pub mod gemm_pack;
pub mod layout;
pub mod quantize;
pub mod stride;

// Runtime dispatch exports
pub use dispatch::{get_isa_level, IsaLevel, KernelConfig};

// Layout codec exports
pub use layout::{reorder4x4_by_platform, BlockLayout, DEFAULT_LANES};

// Element type exports
pub use element::{ElementType, KernelElement};

// Elementwise kernel exports
pub use elementwise::{
    // Bias with fused activation
    add_bias, add_bias_relu, add_bias_relu6,
    // Affine transforms
    scale_and_add_bias, scale_and_add_bias_outside, scale_and_add_bias_scalar,
    // Rectifier family
    relu6, relu_int8, relu_with_slope, relu_with_slope_channel,
    // Transcendental approximations
    exp, exp_grouped, exp_parameters, pow_grouped, pow_parameters, tanh, EXP_GROUP,
    // Running reductions
    max_float, min_float,
};

// Strided block copy exports
pub use stride::{add_with_stride, copy_with_stride};

// Quantized widening exports
pub use quantize::{widen_u8_to_i16, widen_u8_to_i16_fast};

// GEMM packing exports
pub use gemm_pack::{pack_lhs, pack_rhs, unpack_output, MatMulTile};
