use log::debug;
use ndarray::{Ix2, IxDyn};

use crate::configs::PowerIterationConfig;
use crate::error::{check_shape, dimension_mismatch, OperatorError, Result};
use crate::fourier::FourierOperator;
use crate::linear::LinearOperator;
use crate::ndarray_complex::{l2_norm, vdot};
use crate::power_method::power_iteration;
use crate::transform::ShapeManifest;
use crate::types::{CArrayD, CArrayDView, CImage, CImageView, Float, Shape2};

pub enum GradientKind<'a> {
    /// Unknown in image space: `op = F`.
    Analysis { fourier: &'a dyn FourierOperator },
    /// Unknown in coefficient space: `op = F ∘ L*`.
    Synthesis {
        fourier: &'a dyn FourierOperator,
        linear: &'a dyn LinearOperator,
        manifest: ShapeManifest,
    },
    /// Dual variable in coefficient space: `op = L*`.
    ProxDual {
        linear: &'a dyn LinearOperator,
        manifest: ShapeManifest,
    },
}

/// Data-fidelity gradient for a proximal solver. The Lipschitz constant
/// (spectral radius of `trans_op ∘ op` times the extra factor) is estimated
/// once, at construction.
pub struct Gradient<'a> {
    kind: GradientKind<'a>,
    obs_data: CArrayD,
    image_shape: Shape2,
    domain_shape: Vec<usize>,
    spec_rad: Float,
}

fn as_image<'v>(data: CArrayDView<'v>, expected: &[usize]) -> Result<CImageView<'v>> {
    check_shape("gradient operator input", expected, data.shape())?;
    let found = data.shape().to_vec();
    data.into_dimensionality::<Ix2>()
        .map_err(|_| dimension_mismatch("gradient operator input", expected, &found))
}

fn kspace_shape(fourier: &dyn FourierOperator) -> Result<Vec<usize>> {
    let kspace = fourier.op(CImage::zeros(fourier.shape()).view())?;
    Ok(kspace.shape().to_vec())
}

impl<'a> Gradient<'a> {
    pub fn analysis(
        data: CArrayD,
        fourier: &'a dyn FourierOperator,
        config: &PowerIterationConfig,
    ) -> Result<Self> {
        check_shape("analysis observed data", &kspace_shape(fourier)?, data.shape())?;
        let (rows, cols) = fourier.shape();
        let kind = GradientKind::Analysis { fourier };
        Self::build(kind, data, (rows, cols), vec![rows, cols], config)
    }

    pub fn synthesis(
        data: CArrayD,
        linear: &'a dyn LinearOperator,
        fourier: &'a dyn FourierOperator,
        config: &PowerIterationConfig,
    ) -> Result<Self> {
        check_shape("synthesis observed data", &kspace_shape(fourier)?, data.shape())?;
        let (coeffs, manifest) = linear.op(CImage::zeros(fourier.shape()).view())?;
        let domain_shape = coeffs.shape().to_vec();
        let kind = GradientKind::Synthesis {
            fourier,
            linear,
            manifest,
        };
        Self::build(kind, data, fourier.shape(), domain_shape, config)
    }

    /// `image_shape` is the primal image shape; the dual domain is the shape
    /// of `linear`'s coefficients for such an image, which `data` must match.
    pub fn prox_dual(
        data: CArrayD,
        linear: &'a dyn LinearOperator,
        image_shape: Shape2,
        config: &PowerIterationConfig,
    ) -> Result<Self> {
        let (coeffs, manifest) = linear.op(CImage::zeros(image_shape).view())?;
        check_shape("prox-dual observed data", coeffs.shape(), data.shape())?;
        let domain_shape = coeffs.shape().to_vec();
        let kind = GradientKind::ProxDual { linear, manifest };
        Self::build(kind, data, image_shape, domain_shape, config)
    }

    fn build(
        kind: GradientKind<'a>,
        obs_data: CArrayD,
        image_shape: Shape2,
        domain_shape: Vec<usize>,
        config: &PowerIterationConfig,
    ) -> Result<Self> {
        let mut gradient = Gradient {
            kind,
            obs_data,
            image_shape,
            domain_shape,
            spec_rad: 0.0,
        };
        let spec_rad =
            power_iteration(|x| gradient.trans_op_op(x), &gradient.domain_shape, config)?;
        debug!(
            "{} gradient on {:?}: spectral radius {:.6}",
            gradient.kind_name(),
            gradient.domain_shape,
            spec_rad
        );
        if !(spec_rad > 0.0 && spec_rad.is_finite()) {
            return Err(OperatorError::Configuration(format!(
                "{} gradient has no usable Lipschitz constant (estimate {})",
                gradient.kind_name(),
                spec_rad
            )));
        }
        gradient.spec_rad = spec_rad;
        Ok(gradient)
    }

    pub fn kind(&self) -> &GradientKind<'a> {
        &self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            GradientKind::Analysis { .. } => "analysis",
            GradientKind::Synthesis { .. } => "synthesis",
            GradientKind::ProxDual { .. } => "prox-dual",
        }
    }

    pub fn obs_data(&self) -> CArrayDView {
        self.obs_data.view()
    }

    /// Shape of the arrays `gradient` and `cost` accept.
    pub fn domain_shape(&self) -> &[usize] {
        &self.domain_shape
    }

    /// Lipschitz constant estimate, safety factor included.
    pub fn spec_rad(&self) -> Float {
        self.spec_rad
    }

    /// Always finite: construction rejects a zero estimate.
    pub fn inv_spec_rad(&self) -> Float {
        1.0 / self.spec_rad
    }

    fn image_dims(&self) -> [usize; 2] {
        [self.image_shape.0, self.image_shape.1]
    }

    pub fn op(&self, x: CArrayDView) -> Result<CArrayD> {
        match &self.kind {
            GradientKind::Analysis { fourier } => {
                Ok(fourier.op(as_image(x, &self.image_dims())?)?.into_dyn())
            }
            GradientKind::Synthesis {
                fourier,
                linear,
                manifest,
            } => {
                let image = linear.adj_op(x, manifest)?;
                Ok(fourier.op(image.view())?.into_dyn())
            }
            GradientKind::ProxDual { linear, manifest } => {
                Ok(linear.adj_op(x, manifest)?.into_dyn())
            }
        }
    }

    pub fn trans_op(&self, y: CArrayDView) -> Result<CArrayD> {
        match &self.kind {
            GradientKind::Analysis { fourier } => {
                Ok(fourier.adj_op(as_image(y, self.obs_data.shape())?)?.into_dyn())
            }
            GradientKind::Synthesis { fourier, linear, .. } => {
                let image = fourier.adj_op(as_image(y, self.obs_data.shape())?)?;
                Ok(linear.op(image.view())?.0)
            }
            GradientKind::ProxDual { linear, .. } => {
                Ok(linear.op(as_image(y, &self.image_dims())?)?.0)
            }
        }
    }

    pub fn trans_op_op(&self, x: CArrayDView) -> Result<CArrayD> {
        self.trans_op(self.op(x)?.view())
    }

    /// Gradient of the data term at `x`.
    ///
    /// Analysis and synthesis: `trans_op(op(x) - y)`.
    /// Prox-dual: `trans_op(op(x)) + y`.
    pub fn gradient(&self, x: CArrayDView) -> Result<CArrayD> {
        check_shape("gradient", &self.domain_shape, x.shape())?;
        match self.kind {
            GradientKind::ProxDual { .. } => Ok(self.trans_op_op(x)? + &self.obs_data),
            GradientKind::Analysis { .. } | GradientKind::Synthesis { .. } => {
                let residual = self.op(x)? - &self.obs_data;
                self.trans_op(residual.view())
            }
        }
    }

    /// Analysis and synthesis: `0.5 * ||op(x) - y||^2`.
    /// Prox-dual: `0.5 * ||op(x)|| + Re<x, y>`, the norm left unsquared.
    pub fn cost(&self, x: CArrayDView) -> Result<Float> {
        check_shape("cost", &self.domain_shape, x.shape())?;
        match self.kind {
            GradientKind::ProxDual { .. } => {
                let primal = self.op(x.view())?;
                Ok(0.5 * l2_norm(&primal) + vdot(&x, &self.obs_data).re)
            }
            GradientKind::Analysis { .. } | GradientKind::Synthesis { .. } => {
                let residual = self.op(x)? - &self.obs_data;
                Ok(0.5 * l2_norm(&residual).powi(2))
            }
        }
    }
}

/// Zero array on a gradient's domain, the usual starting point of a solver.
pub fn zeros_like_domain(gradient: &Gradient) -> CArrayD {
    CArrayD::zeros(IxDyn(gradient.domain_shape()))
}
