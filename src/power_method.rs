use crate::configs::PowerIterationConfig;
use crate::error::{check_shape, Result};
use crate::ndarray_complex::l2_norm;
use crate::types::{CArrayD, CArrayDView, CFloat, Float};
use log::{debug, warn};
use ndarray::IxDyn;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Estimates the dominant eigenvalue magnitude of `operator` acting on arrays
/// of `shape`, scaled by `config.extra_factor`.
///
/// The start vector is drawn from a generator seeded with `config.seed`, so a
/// given operator, shape and config always yield the same estimate. Stops when
/// successive iterate norms differ by less than `config.tolerance`, or after
/// `config.max_iter` applications.
pub fn power_iteration(
    operator: impl Fn(CArrayDView) -> Result<CArrayD>,
    shape: &[usize],
    config: &PowerIterationConfig,
) -> Result<Float> {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut x_old: CArrayD =
        CArrayD::from_shape_simple_fn(IxDyn(shape), || CFloat::new(rng.gen::<Float>(), 0.0));
    let mut x_new_norm: Float = 0.0;

    for iter in 0..config.max_iter {
        let x_old_norm = l2_norm(&x_old);
        if x_old_norm == 0.0 {
            debug!("Power iteration reached the null space after {} iterations", iter);
            return Ok(0.0);
        }
        let x_new = operator(x_old.view())?;
        check_shape("power iteration", shape, x_new.shape())?;
        let x_new = x_new / x_old_norm;
        x_new_norm = l2_norm(&x_new);
        if (x_new_norm - x_old_norm).abs() < config.tolerance {
            debug!("Power iteration converged in {} iterations", iter + 1);
            return Ok(x_new_norm * config.extra_factor);
        }
        x_old = x_new;
    }
    warn!(
        "Power iteration did not converge after {} iterations",
        config.max_iter
    );
    Ok(x_new_norm * config.extra_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CImage;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1, Ix2};
    use num_complex::Complex;

    fn config(max_iter: usize, extra_factor: Float) -> PowerIterationConfig {
        PowerIterationConfig {
            max_iter,
            extra_factor,
            ..Default::default()
        }
    }

    fn diagonal(weights: Array1<Float>) -> impl Fn(CArrayDView) -> Result<CArrayD> {
        move |x: CArrayDView| {
            let w = weights.clone().into_dyn();
            Ok(&x * &w.mapv(|d| Complex::new(d, 0.0)))
        }
    }

    #[test]
    fn test_diagonal_operator() {
        let op = diagonal(array![1.0, 2.0, 3.0, 0.5]);
        let rho = power_iteration(op, &[4], &config(500, 1.0)).unwrap();
        assert_relative_eq!(rho, 3.0, max_relative = 1e-4);
    }

    #[test]
    fn test_extra_factor_scales_estimate() {
        let op = diagonal(array![4.0, 1.0]);
        let rho = power_iteration(&op, &[2], &config(500, 1.0)).unwrap();
        let rho_safe = power_iteration(&op, &[2], &config(500, 1.1)).unwrap();
        assert_relative_eq!(rho_safe, 1.1 * rho, max_relative = 1e-12);
    }

    #[test]
    fn test_estimate_is_reproducible() {
        let op = |x: CArrayDView| -> Result<CArrayD> {
            let image: CImage = x.to_owned().into_dimensionality::<Ix2>().unwrap();
            let t = image.t().to_owned();
            Ok((&image + &t).into_dyn())
        };
        let first = power_iteration(&op, &[6, 6], &PowerIterationConfig::default()).unwrap();
        let second = power_iteration(&op, &[6, 6], &PowerIterationConfig::default()).unwrap();
        assert!(first > 0.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_projection_converges_to_one() {
        // keeps the first half of the vector: eigenvalues 1 and 0
        let op = |x: CArrayDView| -> Result<CArrayD> {
            let mut y = x.to_owned();
            y.iter_mut().skip(4).for_each(|v| *v = Complex::new(0.0, 0.0));
            Ok(y)
        };
        let rho = power_iteration(op, &[8], &PowerIterationConfig::default()).unwrap();
        assert_relative_eq!(rho, 1.1, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_operator() {
        let op = |x: CArrayDView| -> Result<CArrayD> { Ok(CArrayD::zeros(x.raw_dim())) };
        let rho = power_iteration(op, &[3, 3], &PowerIterationConfig::default()).unwrap();
        assert_eq!(rho, 0.0);
    }

    #[test]
    fn test_iteration_cap() {
        // 0.99 / 1.0 ratio converges far too slowly for two iterations
        let op = diagonal(array![1.0, 0.99, 0.5]);
        let rho = power_iteration(op, &[3], &config(2, 1.0)).unwrap();
        assert!(rho > 0.0 && rho <= 1.0);
    }

    #[test]
    fn test_shape_change_is_rejected() {
        let op = |_: CArrayDView| -> Result<CArrayD> { Ok(CArrayD::zeros(IxDyn(&[5]))) };
        assert!(power_iteration(op, &[4], &PowerIterationConfig::default()).is_err());
    }
}
