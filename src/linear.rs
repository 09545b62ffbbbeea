use std::cell::RefCell;

use log::debug;
use ndarray::Ix1;

use crate::configs::OutputKind;
use crate::error::{check_shape, dimension_mismatch, OperatorError, Result};
use crate::filters::{
    filter_convolve, AtrousFilterBuilder, FilterBank, FilterBankBuilder, FilterOptions,
};
use crate::image::{centered_impulse, Image};
use crate::ndarray_complex::{combine_complex, l2_norm, split_complex};
use crate::transform::{
    flatten, unflatten, ShapeManifest, TransformEngine, TransformOptions, TransformRegistry,
};
use crate::types::{CArrayD, CArrayDView, CImage, CImageView, CVector, CVectorView, Float, Shape2};

/// Image to coefficients and back. `op` returns the [`ShapeManifest`] of its
/// coefficients and `adj_op` takes it back, so `op`/`adj_op` pairs on
/// different shapes may be interleaved.
pub trait LinearOperator {
    fn op(&self, image: CImageView) -> Result<(CArrayD, ShapeManifest)>;

    fn adj_op(&self, coeffs: CArrayDView, manifest: &ShapeManifest) -> Result<CImage>;

    /// Norm of the coefficients of a centred unit impulse of (even-rounded) `shape`.
    fn l2norm(&self, shape: Shape2) -> Result<Float>;
}

/// Result of [`Wavelet2::adj_op_as`].
#[derive(Clone, Debug, PartialEq)]
pub enum Reconstruction {
    Array(CImage),
    Image(Image),
}

impl Reconstruction {
    pub fn into_array(self) -> CImage {
        match self {
            Reconstruction::Array(data) => data,
            Reconstruction::Image(image) => image.into_data(),
        }
    }
}

/// Decimated 2D wavelet operator backed by a registered transform engine.
pub struct Wavelet2 {
    transform: Box<dyn TransformEngine>,
}

impl Wavelet2 {
    pub fn new(registry: &TransformRegistry, wavelet_name: &str, nb_scale: usize) -> Result<Self> {
        Self::with_options(registry, wavelet_name, TransformOptions::new(nb_scale))
    }

    pub fn with_options(
        registry: &TransformRegistry,
        wavelet_name: &str,
        options: TransformOptions,
    ) -> Result<Self> {
        if !registry.contains(wavelet_name) {
            return Err(OperatorError::Configuration(format!(
                "Unknown transformation '{}'.",
                wavelet_name
            )));
        }
        let transform = registry.load(wavelet_name, &options)?;
        Ok(Wavelet2 { transform })
    }

    pub fn transform_name(&self) -> &str {
        self.transform.name()
    }

    pub fn nb_scale(&self) -> usize {
        self.transform.nb_scale()
    }

    pub fn op_image(&self, image: &Image) -> Result<(CVector, ShapeManifest)> {
        let bands = self.transform.analysis(image)?;
        Ok(flatten(&bands))
    }

    pub fn adj_op_as(
        &self,
        coeffs: CVectorView,
        manifest: &ShapeManifest,
        kind: OutputKind,
    ) -> Result<Reconstruction> {
        let bands = unflatten(coeffs, manifest)?;
        let image = self.transform.synthesis(bands)?;
        Ok(match kind {
            OutputKind::Array => Reconstruction::Array(image.into_data()),
            OutputKind::Image => Reconstruction::Image(image),
        })
    }
}

impl LinearOperator for Wavelet2 {
    fn op(&self, image: CImageView) -> Result<(CArrayD, ShapeManifest)> {
        let (coeffs, manifest) = self.op_image(&Image::from(image))?;
        Ok((coeffs.into_dyn(), manifest))
    }

    fn adj_op(&self, coeffs: CArrayDView, manifest: &ShapeManifest) -> Result<CImage> {
        let found = coeffs.shape().to_vec();
        let flat = coeffs
            .into_dimensionality::<Ix1>()
            .map_err(|_| dimension_mismatch("wavelet adj_op", &[manifest.total_len()], &found))?;
        Ok(self.adj_op_as(flat, manifest, OutputKind::Array)?.into_array())
    }

    fn l2norm(&self, shape: Shape2) -> Result<Float> {
        let impulse = centered_impulse(shape)?;
        let (coeffs, _) = self.op(impulse.view())?;
        Ok(l2_norm(&coeffs))
    }
}

/// Undecimated wavelet operator.
///
/// The filter bank depends on the image shape and is built on the first
/// `op`, then reused until an image of another shape comes in. The cache
/// lives in a `RefCell`, so an instance cannot be shared across threads.
pub struct WaveletUD {
    options: FilterOptions,
    set_norm: Option<Float>,
    builder: Box<dyn FilterBankBuilder>,
    filters: RefCell<Option<FilterBank>>,
}

impl WaveletUD {
    pub fn new(wavelet_id: u32, nb_scale: usize, set_norm: Option<Float>) -> Self {
        Self::with_builder(wavelet_id, nb_scale, set_norm, Box::new(AtrousFilterBuilder))
    }

    pub fn with_builder(
        wavelet_id: u32,
        nb_scale: usize,
        set_norm: Option<Float>,
        builder: Box<dyn FilterBankBuilder>,
    ) -> Self {
        WaveletUD {
            options: FilterOptions { wavelet_id, nb_scale },
            set_norm,
            builder,
            filters: RefCell::new(None),
        }
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Whether a filter bank has been built yet.
    pub fn has_run(&self) -> bool {
        self.filters.borrow().is_some()
    }

    fn ensure_filters(&self, shape: Shape2) -> Result<()> {
        let mut cache = self.filters.borrow_mut();
        let stale = cache.as_ref().map_or(true, |bank| bank.shape() != shape);
        if stale {
            debug!("Building undecimated filters for shape {:?}", shape);
            *cache = Some(self.builder.build(shape, &self.options, true)?);
        }
        Ok(())
    }
}

impl LinearOperator for WaveletUD {
    fn op(&self, image: CImageView) -> Result<(CArrayD, ShapeManifest)> {
        let shape = image.dim();
        self.ensure_filters(shape)?;
        let cache = self.filters.borrow();
        let bank = cache
            .as_ref()
            .ok_or(OperatorError::State("filter bank missing after build"))?;

        let (re, im) = split_complex(&image);
        let coefs_re = filter_convolve(re.view().into_dyn(), bank, false)?;
        let coefs_im = filter_convolve(im.view().into_dyn(), bank, false)?;
        let manifest = ShapeManifest::new(vec![shape; bank.nb_bands()]);
        Ok((combine_complex(&coefs_re, &coefs_im), manifest))
    }

    /// The image shape comes from `manifest`; the bank is rebuilt if the last
    /// `op` saw another shape.
    fn adj_op(&self, coeffs: CArrayDView, manifest: &ShapeManifest) -> Result<CImage> {
        if !self.has_run() {
            return Err(OperatorError::State(
                "`op` must be run before `adj_op` to get the data shape",
            ));
        }
        let nb_bands = self.options.nb_scale;
        let (rows, cols) = manifest.shapes().first().copied().unwrap_or((0, 0));
        let uniform = manifest.shapes().iter().all(|s| *s == (rows, cols));
        if manifest.nb_bands() != nb_bands || !uniform {
            let (found_rows, found_cols) = manifest
                .shapes()
                .iter()
                .copied()
                .find(|s| *s != (rows, cols))
                .unwrap_or((rows, cols));
            return Err(dimension_mismatch(
                "undecimated adj_op manifest",
                &[nb_bands, rows, cols],
                &[manifest.nb_bands(), found_rows, found_cols],
            ));
        }
        self.ensure_filters((rows, cols))?;
        let cache = self.filters.borrow();
        let bank = cache
            .as_ref()
            .ok_or(OperatorError::State("filter bank missing after build"))?;
        check_shape("undecimated adj_op", &[bank.nb_bands(), rows, cols], coeffs.shape())?;

        let (re, im) = split_complex(&coeffs);
        let data_re = filter_convolve(re.view(), bank, true)?;
        let data_im = filter_convolve(im.view(), bank, true)?;
        combine_complex(&data_re, &data_im)
            .into_dimensionality()
            .map_err(|_| dimension_mismatch("undecimated adj_op", &[rows, cols], &[]))
    }

    fn l2norm(&self, shape: Shape2) -> Result<Float> {
        if let Some(norm) = self.set_norm {
            return Ok(norm);
        }
        let impulse = centered_impulse(shape)?;
        let (coeffs, _) = self.op(impulse.view())?;
        Ok(l2_norm(&coeffs))
    }
}
