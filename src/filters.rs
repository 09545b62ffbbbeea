use log::debug;
use ndarray::{ArrayD, ArrayView2, ArrayViewD, Axis, Ix2, Ix3, Zip};

use crate::defaults::MAX_NB_SCALE;
use crate::error::{check_nonempty, check_shape, dimension_mismatch, OperatorError, Result};
use crate::fft::{ifftshift2, Fft2Handler};
use crate::ndarray_complex::Conj;
use crate::types::{CFloat, CImage, CStack, Float, RImage, RStack, Shape2};

/// Decomposition parameters, mirroring the `-t<id> -n<scales>` switches of
/// the multiresolution tools the filters originate from.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterOptions {
    pub wavelet_id: u32,
    pub nb_scale: usize,
}

impl FilterOptions {
    pub fn to_args(&self) -> Vec<String> {
        vec![format!("-t{}", self.wavelet_id), format!("-n{}", self.nb_scale)]
    }
}

/// One full-size real kernel per band, centred on `(rows/2, cols/2)`, with
/// the spectra and FFT plan used to apply them.
#[derive(Clone, Debug)]
pub struct FilterBank {
    kernels: RStack,
    spectra: CStack,
    fft: Fft2Handler,
}

impl FilterBank {
    pub fn from_kernels(kernels: RStack) -> Self {
        let (nb_bands, rows, cols) = kernels.dim();
        let fft = Fft2Handler::new((rows, cols));
        let scale = ((rows * cols) as Float).sqrt();
        let mut spectra = CStack::zeros((nb_bands, rows, cols));
        for (kernel, mut spectrum) in kernels.outer_iter().zip(spectra.outer_iter_mut()) {
            let centred: CImage = ifftshift2(&kernel.to_owned()).mapv(|k| CFloat::new(k, 0.0));
            let transformed = fft.forward(centred.view());
            spectrum.assign(&transformed.mapv(|x| x * scale));
        }
        FilterBank {
            kernels,
            spectra,
            fft,
        }
    }

    pub fn shape(&self) -> Shape2 {
        let (_, rows, cols) = self.kernels.dim();
        (rows, cols)
    }

    pub fn nb_bands(&self) -> usize {
        self.kernels.len_of(Axis(0))
    }

    pub fn kernels(&self) -> &RStack {
        &self.kernels
    }
}

pub trait FilterBankBuilder {
    fn build(&self, shape: Shape2, options: &FilterOptions, coarse: bool) -> Result<FilterBank>;
}

/// Builds the bank by decomposing a centred impulse with the à trous algorithm.
///
/// Wavelet id 1 smooths with the linear spline `[1, 2, 1] / 4`, id 2 with the
/// cubic B-spline `[1, 4, 6, 4, 1] / 16`. Bands are the successive
/// differences of the smoothed planes, followed by the last smoothed plane
/// when `coarse` is set, so a full bank sums to the impulse.
#[derive(Clone, Copy, Debug, Default)]
pub struct AtrousFilterBuilder;

impl AtrousFilterBuilder {
    fn smoothing_kernel(wavelet_id: u32) -> Result<Vec<Float>> {
        match wavelet_id {
            1 => Ok(vec![0.25, 0.5, 0.25]),
            2 => Ok(vec![1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0]),
            _ => Err(OperatorError::Configuration(format!(
                "unsupported undecimated wavelet id {}",
                wavelet_id
            ))),
        }
    }
}

fn smooth_axis(data: ArrayView2<Float>, kernel: &[Float], step: usize, axis: Axis) -> RImage {
    let half = kernel.len() / 2;
    let mut out = RImage::zeros(data.raw_dim());
    Zip::from(out.lanes_mut(axis))
        .and(data.lanes(axis))
        .for_each(|mut dst, src| {
            let n = src.len();
            let step = step % n;
            for i in 0..n {
                let mut acc = 0.0;
                for (k, &w) in kernel.iter().enumerate() {
                    // periodic index of i + (k - half) * step
                    let offset = (k * step) % n + n - (half * step) % n;
                    acc += w * src[(i + offset) % n];
                }
                dst[i] = acc;
            }
        });
    out
}

impl FilterBankBuilder for AtrousFilterBuilder {
    fn build(&self, shape: Shape2, options: &FilterOptions, coarse: bool) -> Result<FilterBank> {
        let kernel = Self::smoothing_kernel(options.wavelet_id)?;
        if options.nb_scale < 2 || options.nb_scale > MAX_NB_SCALE {
            return Err(OperatorError::Configuration(format!(
                "undecimated transform needs 2 to {} scales, got {}",
                MAX_NB_SCALE, options.nb_scale
            )));
        }
        check_nonempty("undecimated filter bank", shape)?;
        let (rows, cols) = shape;
        let nb_bands = if coarse { options.nb_scale } else { options.nb_scale - 1 };

        let mut smooth = RImage::zeros(shape);
        smooth[[rows / 2, cols / 2]] = 1.0;

        let mut kernels = RStack::zeros((nb_bands, rows, cols));
        for scale in 0..options.nb_scale - 1 {
            let step = 1 << scale;
            let tmp = smooth_axis(smooth.view(), &kernel, step, Axis(0));
            let next = smooth_axis(tmp.view(), &kernel, step, Axis(1));
            kernels.index_axis_mut(Axis(0), scale).assign(&(&smooth - &next));
            smooth = next;
        }
        if coarse {
            kernels.index_axis_mut(Axis(0), nb_bands - 1).assign(&smooth);
        }
        debug!("Built {} filters of shape {:?} ({:?})", nb_bands, shape, options.to_args());
        Ok(FilterBank::from_kernels(kernels))
    }
}

/// Applies `bank` to real data.
///
/// Without `rotate`, an image of the bank's shape becomes a
/// `nb_bands x rows x cols` stack. With `rotate`, such a stack is correlated
/// band by band with the kernels and summed back into one image; this is the
/// adjoint of the forward mapping.
pub fn filter_convolve(
    data: ArrayViewD<Float>,
    bank: &FilterBank,
    rotate: bool,
) -> Result<ArrayD<Float>> {
    let (rows, cols) = bank.shape();
    // spectra are unnormalised, so the orthonormal pair reproduces a plain
    // circular convolution
    let handler = &bank.fft;

    if !rotate {
        check_shape("filter_convolve", &[rows, cols], data.shape())?;
        let image = data
            .into_dimensionality::<Ix2>()
            .map_err(|_| dimension_mismatch("filter_convolve", &[rows, cols], &[]))?;
        let spectrum = handler.forward(image.mapv(|x| CFloat::new(x, 0.0)).view());

        let mut out = RStack::zeros((bank.nb_bands(), rows, cols));
        for (filter, mut band) in bank.spectra.outer_iter().zip(out.outer_iter_mut()) {
            let product = &spectrum * &filter;
            let conv = handler.inverse(product.view());
            band.assign(&conv.mapv(|x| x.re));
        }
        Ok(out.into_dyn())
    } else {
        let expected = [bank.nb_bands(), rows, cols];
        check_shape("filter_convolve", &expected, data.shape())?;
        let stack = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| dimension_mismatch("filter_convolve", &expected, &[]))?;
        let rotated = (&bank.spectra).conj();

        let mut acc = CImage::zeros((rows, cols));
        for (band, filter) in stack.outer_iter().zip(rotated.outer_iter()) {
            let spectrum = handler.forward(band.mapv(|x| CFloat::new(x, 0.0)).view());
            acc += &(&spectrum * &filter);
        }
        let out = handler.inverse(acc.view());
        Ok(out.mapv(|x| x.re).into_dyn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn options(wavelet_id: u32, nb_scale: usize) -> FilterOptions {
        FilterOptions { wavelet_id, nb_scale }
    }

    fn random_real(shape: Shape2, seed: u64) -> RImage {
        let mut rng = SmallRng::seed_from_u64(seed);
        RImage::from_shape_simple_fn(shape, || rng.gen_range(-1.0..1.0))
    }

    #[test]
    fn test_option_args() {
        assert_eq!(options(2, 4).to_args(), vec!["-t2", "-n4"]);
    }

    #[test]
    fn test_bank_layout_and_partition_of_unity() {
        let bank = AtrousFilterBuilder.build((16, 12), &options(2, 4), true).unwrap();
        assert_eq!(bank.nb_bands(), 4);
        assert_eq!(bank.shape(), (16, 12));

        let total = bank.kernels().sum_axis(Axis(0));
        let mut impulse = RImage::zeros((16, 12));
        impulse[[8, 6]] = 1.0;
        for (a, b) in total.iter().zip(impulse.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_bank_without_coarse_plane() {
        let bank = AtrousFilterBuilder.build((8, 8), &options(1, 3), false).unwrap();
        assert_eq!(bank.nb_bands(), 2);
        // detail kernels have zero mean
        for kernel in bank.kernels().outer_iter() {
            assert_relative_eq!(kernel.sum(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_builder_rejects_bad_options() {
        assert!(matches!(
            AtrousFilterBuilder.build((8, 8), &options(7, 3), true),
            Err(OperatorError::Configuration(_))
        ));
        assert!(matches!(
            AtrousFilterBuilder.build((8, 8), &options(2, 1), true),
            Err(OperatorError::Configuration(_))
        ));
    }

    #[test]
    fn test_builder_rejects_empty_shape_and_scale_overflow() {
        assert!(matches!(
            AtrousFilterBuilder.build((0, 4), &options(2, 3), true),
            Err(OperatorError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            AtrousFilterBuilder.build((4, 4), &options(2, 200), true),
            Err(OperatorError::Configuration(_))
        ));
    }

    #[test]
    fn test_many_scales_on_small_image() {
        // dilations wider than the image wrap around instead of overflowing
        let bank = AtrousFilterBuilder.build((4, 4), &options(2, MAX_NB_SCALE), true).unwrap();
        let total = bank.kernels().sum_axis(Axis(0));
        assert_relative_eq!(total[[2, 2]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(total.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_convolve_impulse_returns_kernels() {
        let bank = AtrousFilterBuilder.build((8, 8), &options(2, 3), true).unwrap();
        let mut impulse = RImage::zeros((8, 8));
        impulse[[4, 4]] = 1.0;
        let out = filter_convolve(impulse.view().into_dyn(), &bank, false).unwrap();
        for (a, b) in out.iter().zip(bank.kernels().iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_forward_bands_sum_to_input() {
        let bank = AtrousFilterBuilder.build((12, 8), &options(2, 3), true).unwrap();
        let x = random_real((12, 8), 5);
        let bands = filter_convolve(x.view().into_dyn(), &bank, false).unwrap();
        let total = bands.sum_axis(Axis(0));
        for (a, b) in total.iter().zip(x.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_rotated_convolution_is_adjoint() {
        let bank = AtrousFilterBuilder.build((8, 10), &options(2, 3), true).unwrap();
        let x = random_real((8, 10), 11);
        let mut rng = SmallRng::seed_from_u64(12);
        let c = RStack::from_shape_simple_fn((3, 8, 10), || rng.gen_range(-1.0..1.0));

        let wx = filter_convolve(x.view().into_dyn(), &bank, false).unwrap();
        let wtc = filter_convolve(c.view().into_dyn(), &bank, true).unwrap();
        let lhs: Float = wx.iter().zip(c.iter()).map(|(a, b)| a * b).sum();
        let rhs: Float = x.iter().zip(wtc.iter()).map(|(a, b)| a * b).sum();
        assert_relative_eq!(lhs, rhs, max_relative = 1e-10);
    }

    #[test]
    fn test_convolve_checks_shapes() {
        let bank = AtrousFilterBuilder.build((8, 8), &options(2, 3), true).unwrap();
        let wrong = RImage::zeros((8, 6));
        assert!(matches!(
            filter_convolve(wrong.view().into_dyn(), &bank, false),
            Err(OperatorError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            filter_convolve(wrong.view().into_dyn(), &bank, true),
            Err(OperatorError::DimensionMismatch { .. })
        ));
    }
}
