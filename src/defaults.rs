use crate::types::Float;

// linear operators
pub const DEFAULT_NB_SCALE: usize = 4;
pub const DEFAULT_UNDECIMATED_ID: u32 = 2;
// 2^MAX_NB_SCALE must fit in a usize on 64-bit targets
pub const MAX_NB_SCALE: usize = 32;

// power iteration
pub const DEFAULT_POWER_MAX_ITER: usize = 20;
pub const DEFAULT_POWER_TOL: Float = 1e-6;
pub const DEFAULT_EXTRA_FACTOR: Float = 1.1;
pub const DEFAULT_POWER_SEED: u64 = 0;

// main
pub const DEFAULT_WAVELET_NAME: &str = "HaarWaveletTransform";
pub const DEFAULT_IMAGE_SIZE: usize = 64;
pub const DEFAULT_SAMPLING_FRACTION: Float = 0.3;
pub const DEFAULT_CENTER_LINES: usize = 8;
pub const DEFAULT_MASK_SEED: u64 = 42;
