use crate::defaults::{
    DEFAULT_EXTRA_FACTOR, DEFAULT_POWER_MAX_ITER, DEFAULT_POWER_SEED, DEFAULT_POWER_TOL,
};
use crate::types::Float;

/// What `adj_op_as` hands back: the bare array or the engine's image container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OutputKind {
    Array,
    Image,
}

impl ToString for OutputKind {
    fn to_string(&self) -> String {
        match self {
            OutputKind::Array => String::from("array"),
            OutputKind::Image => String::from("image"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PowerIterationConfig {
    pub max_iter: usize,
    pub tolerance: Float,
    /// Safety multiplier applied to the converged spectral radius.
    pub extra_factor: Float,
    pub seed: u64,
}

impl Default for PowerIterationConfig {
    fn default() -> Self {
        PowerIterationConfig {
            max_iter: DEFAULT_POWER_MAX_ITER,
            tolerance: DEFAULT_POWER_TOL,
            extra_factor: DEFAULT_EXTRA_FACTOR,
            seed: DEFAULT_POWER_SEED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_kind_names() {
        assert_eq!(OutputKind::Array.to_string(), "array");
        assert_eq!(OutputKind::Image.to_string(), "image");
    }

    #[test]
    fn test_power_iteration_defaults() {
        let cfg = PowerIterationConfig::default();
        assert_eq!(cfg.max_iter, 20);
        assert_eq!(cfg.extra_factor, 1.1);
    }
}
