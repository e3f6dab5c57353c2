//! Runtime ISA detection and injected kernel configuration.
//!
//! The probe runs once per process and is cached in a `OnceLock`; a racing
//! first call recomputes the same value, so initialization is idempotent.
//! Kernels never consult a hidden global: callers obtain a [`KernelConfig`]
//! (usually [`KernelConfig::native`]) and pass it, or the pieces they need,
//! into each call.

use std::sync::OnceLock;

use crate::gemm_pack::MatMulTile;
use crate::layout::BlockLayout;

/// Detected instruction-set tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsaLevel {
    Scalar,
    Avx2,
    Avx512,
    Neon,
}

static ISA_LEVEL: OnceLock<IsaLevel> = OnceLock::new();

/// The ISA tier of the executing CPU, probed once and cached.
pub fn get_isa_level() -> IsaLevel {
    *ISA_LEVEL.get_or_init(|| {
        let isa = detect_isa_features();
        log::debug!("detected ISA level: {isa:?}");
        isa
    })
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn detect_isa_features() -> IsaLevel {
    if is_x86_feature_detected!("avx512f") {
        IsaLevel::Avx512
    } else if is_x86_feature_detected!("avx2") {
        IsaLevel::Avx2
    } else {
        IsaLevel::Scalar
    }
}

#[cfg(target_arch = "aarch64")]
fn detect_isa_features() -> IsaLevel {
    IsaLevel::Neon
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
fn detect_isa_features() -> IsaLevel {
    IsaLevel::Scalar
}

impl IsaLevel {
    /// Preferred GEMM pack tile `(eP, lP, hP)` for this tier.
    ///
    /// `lP = 1` on every tier: the f32 path does not pack the reduction
    /// dimension. Stable for the process lifetime.
    pub const fn preferred_tile(self) -> MatMulTile {
        match self {
            IsaLevel::Scalar => MatMulTile::new(16, 1, 4),
            IsaLevel::Avx2 => MatMulTile::new(16, 1, 8),
            IsaLevel::Avx512 => MatMulTile::new(16, 1, 16),
            IsaLevel::Neon => MatMulTile::new(12, 1, 8),
        }
    }

    /// Channel-blocking lane width for this tier.
    ///
    /// Every tier uses the 4-lane scheme: wider registers process several
    /// blocks per iteration instead of widening the block itself, so the
    /// in-memory layout stays identical across tiers.
    pub const fn lanes(self) -> usize {
        4
    }
}

/// Platform parameters injected into the kernels.
///
/// `native()` reflects the executing CPU; the explicit constructor exists for
/// tests and for callers targeting a different vector width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    pub isa: IsaLevel,
    pub lanes: usize,
    pub tile: MatMulTile,
}

static NATIVE_CONFIG: OnceLock<KernelConfig> = OnceLock::new();

impl KernelConfig {
    pub const fn new(isa: IsaLevel, lanes: usize, tile: MatMulTile) -> Self {
        Self { isa, lanes, tile }
    }

    /// Configuration for the executing CPU, probed once and cached.
    pub fn native() -> Self {
        *NATIVE_CONFIG.get_or_init(|| {
            let isa = get_isa_level();
            Self::new(isa, isa.lanes(), isa.preferred_tile())
        })
    }

    /// The channel-blocking layout implied by this configuration.
    pub const fn layout(&self) -> BlockLayout {
        BlockLayout::new(self.lanes)
    }
}
