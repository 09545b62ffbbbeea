use log::debug;
use ndarray::{Axis, Zip};

use super::{TransformEngine, TransformOptions};
use crate::defaults::MAX_NB_SCALE;
use crate::error::{check_nonempty, check_shape, OperatorError, Result};
use crate::image::Image;
use crate::types::{CFloat, CImage, CImageView, Float};

const SQRT2: Float = std::f64::consts::SQRT_2;

// Daubechies lowpass filters, normalised to sum to sqrt(2).
const DB2: [Float; 4] = [
    0.482_962_913_144_534_1,
    0.836_516_303_737_807_9,
    0.224_143_868_042_013_4,
    -0.129_409_522_551_260_4,
];
const DB3: [Float; 6] = [
    0.332_670_552_950_956_9,
    0.806_891_509_313_338_8,
    0.459_877_502_119_331_3,
    -0.135_011_020_010_390_8,
    -0.085_441_273_882_241_5,
    0.035_226_291_882_100_7,
];

/// Periodised Mallat transform. Each level filters rows then columns and
/// keeps every other sample; with orthonormal filters the synthesis is both
/// the inverse and the adjoint of the analysis.
pub struct OrthogonalWavelet {
    name: String,
    nb_scale: usize,
    lowpass: Vec<Float>,
    highpass: Vec<Float>,
}

impl OrthogonalWavelet {
    pub fn new(name: &str, nb_scale: usize, lowpass: Vec<Float>) -> Result<Self> {
        if nb_scale == 0 || nb_scale > MAX_NB_SCALE {
            return Err(OperatorError::Configuration(format!(
                "'{}' needs 1 to {} scales, got {}",
                name, MAX_NB_SCALE, nb_scale
            )));
        }
        // quadrature mirror: g[k] = (-1)^k h[L-1-k]
        let highpass = lowpass
            .iter()
            .rev()
            .enumerate()
            .map(|(k, &h)| if k % 2 == 0 { h } else { -h })
            .collect();
        Ok(OrthogonalWavelet {
            name: name.to_owned(),
            nb_scale,
            lowpass,
            highpass,
        })
    }

    pub fn lowpass(&self) -> &[Float] {
        &self.lowpass
    }

    pub fn highpass(&self) -> &[Float] {
        &self.highpass
    }

    fn split_axis(&self, data: CImageView, axis: Axis) -> (CImage, CImage) {
        let mut half = data.raw_dim();
        half[axis.index()] /= 2;
        let mut lo = CImage::zeros(half.clone());
        let mut hi = CImage::zeros(half);

        Zip::from(data.lanes(axis))
            .and(lo.lanes_mut(axis))
            .and(hi.lanes_mut(axis))
            .for_each(|src, mut lo, mut hi| {
                let n = src.len();
                for i in 0..n / 2 {
                    let mut a = CFloat::new(0.0, 0.0);
                    let mut d = CFloat::new(0.0, 0.0);
                    for (k, (&h, &g)) in self.lowpass.iter().zip(&self.highpass).enumerate() {
                        let x = src[(2 * i + k) % n];
                        a += x * h;
                        d += x * g;
                    }
                    lo[i] = a;
                    hi[i] = d;
                }
            });
        (lo, hi)
    }

    fn merge_axis(&self, lo: CImageView, hi: CImageView, axis: Axis) -> CImage {
        let mut full = lo.raw_dim();
        full[axis.index()] *= 2;
        let mut out = CImage::zeros(full);

        Zip::from(out.lanes_mut(axis))
            .and(lo.lanes(axis))
            .and(hi.lanes(axis))
            .for_each(|mut dst, lo, hi| {
                let n = dst.len();
                for i in 0..n / 2 {
                    for (k, (&h, &g)) in self.lowpass.iter().zip(&self.highpass).enumerate() {
                        dst[(2 * i + k) % n] += lo[i] * h + hi[i] * g;
                    }
                }
            });
        out
    }
}

impl TransformEngine for OrthogonalWavelet {
    fn name(&self) -> &str {
        &self.name
    }

    fn nb_scale(&self) -> usize {
        self.nb_scale
    }

    /// Bands are ordered finest level first, `[LH, HL, HH]` per level, with
    /// the coarse approximation last.
    fn analysis(&self, image: &Image) -> Result<Vec<CImage>> {
        let (rows, cols) = image.shape();
        check_nonempty("orthogonal wavelet analysis", (rows, cols))?;
        let block: usize = 1 << self.nb_scale;
        let expected = [
            (rows + block - 1) / block * block,
            (cols + block - 1) / block * block,
        ];
        check_shape("orthogonal wavelet analysis", &expected, &[rows, cols])?;

        let mut bands = Vec::with_capacity(3 * self.nb_scale + 1);
        let mut approx = image.data().to_owned();
        for _ in 0..self.nb_scale {
            let (lo, hi) = self.split_axis(approx.view(), Axis(1));
            let (ll, lh) = self.split_axis(lo.view(), Axis(0));
            let (hl, hh) = self.split_axis(hi.view(), Axis(0));
            bands.push(lh);
            bands.push(hl);
            bands.push(hh);
            approx = ll;
        }
        bands.push(approx);
        Ok(bands)
    }

    fn synthesis(&self, mut bands: Vec<CImage>) -> Result<Image> {
        check_shape(
            "orthogonal wavelet synthesis",
            &[3 * self.nb_scale + 1],
            &[bands.len()],
        )?;

        let mut approx = bands.pop().unwrap_or_default();
        for level in (0..self.nb_scale).rev() {
            let details = &bands[3 * level..3 * level + 3];
            for band in details {
                check_shape("orthogonal wavelet synthesis", approx.shape(), band.shape())?;
            }
            let lo = self.merge_axis(approx.view(), details[0].view(), Axis(0));
            let hi = self.merge_axis(details[1].view(), details[2].view(), Axis(0));
            approx = self.merge_axis(lo.view(), hi.view(), Axis(1));
        }
        Ok(Image::new(approx))
    }
}

fn reject_extra(name: &str, options: &TransformOptions, allowed: &[&str]) -> Result<()> {
    match options.extra.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(OperatorError::Configuration(format!(
            "'{}' does not understand option '{}'",
            name, key
        ))),
        None => Ok(()),
    }
}

pub fn haar_factory(options: &TransformOptions) -> Result<Box<dyn TransformEngine>> {
    let name = "HaarWaveletTransform";
    reject_extra(name, options, &[])?;
    let engine = OrthogonalWavelet::new(name, options.nb_scale, vec![1.0 / SQRT2, 1.0 / SQRT2])?;
    Ok(Box::new(engine))
}

/// Accepts `vanishing_moments` in `1..=3` (default 2, i.e. the 4-tap filter).
pub fn daubechies_factory(options: &TransformOptions) -> Result<Box<dyn TransformEngine>> {
    let name = "DaubechiesWaveletTransform";
    reject_extra(name, options, &["vanishing_moments"])?;
    let moments = match options.extra.get("vanishing_moments") {
        Some(value) => value.parse::<usize>().map_err(|_| {
            OperatorError::Configuration(format!("invalid vanishing_moments '{}'", value))
        })?,
        None => 2,
    };
    let lowpass = match moments {
        1 => vec![1.0 / SQRT2, 1.0 / SQRT2],
        2 => DB2.to_vec(),
        3 => DB3.to_vec(),
        _ => {
            return Err(OperatorError::Configuration(format!(
                "vanishing_moments must be 1, 2 or 3, got {}",
                moments
            )))
        }
    };
    if options.verbose > 0 {
        debug!("{} with {} taps and {} scales", name, lowpass.len(), options.nb_scale);
    }
    let engine = OrthogonalWavelet::new(name, options.nb_scale, lowpass)?;
    Ok(Box::new(engine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndarray_complex::{carray_abs_diff_eq, l2_norm};
    use approx::assert_relative_eq;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_image(shape: (usize, usize), seed: u64) -> CImage {
        let mut rng = SmallRng::seed_from_u64(seed);
        CImage::from_shape_simple_fn(shape, || {
            CFloat::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
        })
    }

    fn engines(nb_scale: usize) -> Vec<Box<dyn TransformEngine>> {
        let mut out = vec![haar_factory(&TransformOptions::new(nb_scale)).unwrap()];
        for moments in ["1", "2", "3"] {
            let options = TransformOptions::new(nb_scale).with_extra("vanishing_moments", moments);
            out.push(daubechies_factory(&options).unwrap());
        }
        out
    }

    #[test]
    fn test_filters_are_orthonormal() {
        for engine in [
            OrthogonalWavelet::new("db2", 1, DB2.to_vec()).unwrap(),
            OrthogonalWavelet::new("db3", 1, DB3.to_vec()).unwrap(),
        ] {
            let h = engine.lowpass();
            let g = engine.highpass();
            assert_relative_eq!(h.iter().sum::<Float>(), SQRT2, epsilon = 1e-12);
            assert_relative_eq!(h.iter().map(|x| x * x).sum::<Float>(), 1.0, epsilon = 1e-12);
            let cross: Float = h.iter().zip(g).map(|(a, b)| a * b).sum();
            assert_relative_eq!(cross, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_band_layout() {
        let engine = haar_factory(&TransformOptions::new(2)).unwrap();
        let bands = engine.analysis(&Image::new(random_image((16, 8), 1))).unwrap();
        let shapes: Vec<_> = bands.iter().map(|b| b.dim()).collect();
        assert_eq!(shapes, vec![(8, 4), (8, 4), (8, 4), (4, 2), (4, 2), (4, 2), (4, 2)]);
    }

    #[test]
    fn test_analysis_synthesis_roundtrip() {
        let x = random_image((16, 16), 7);
        for engine in engines(3) {
            let bands = engine.analysis(&Image::new(x.clone())).unwrap();
            let x_recon = engine.synthesis(bands).unwrap().into_data();
            assert!(carray_abs_diff_eq(&x, &x_recon, 1e-10), "{}", engine.name());
        }
    }

    #[test]
    fn test_analysis_preserves_energy() {
        let x = random_image((32, 16), 3);
        for engine in engines(2) {
            let bands = engine.analysis(&Image::new(x.clone())).unwrap();
            let energy: Float = bands.iter().map(|b| l2_norm(b).powi(2)).sum();
            assert_relative_eq!(energy.sqrt(), l2_norm(&x), max_relative = 1e-10);
        }
    }

    #[test]
    fn test_haar_coarse_band_is_scaled_mean() {
        let x = CImage::from_elem((4, 4), CFloat::new(1.0, 0.0));
        let engine = haar_factory(&TransformOptions::new(2)).unwrap();
        let bands = engine.analysis(&Image::new(x)).unwrap();
        // two levels of 2D Haar scale a constant by 2 per level
        assert_relative_eq!(bands[6][[0, 0]].re, 4.0, epsilon = 1e-12);
        for band in &bands[..6] {
            assert!(l2_norm(band) < 1e-12);
        }
    }

    #[test]
    fn test_analysis_rejects_indivisible_shape() {
        let engine = haar_factory(&TransformOptions::new(3)).unwrap();
        let result = engine.analysis(&Image::new(CImage::zeros((12, 16))));
        assert!(matches!(result, Err(OperatorError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_synthesis_rejects_wrong_band_count() {
        let engine = haar_factory(&TransformOptions::new(1)).unwrap();
        let result = engine.synthesis(vec![CImage::zeros((2, 2)); 3]);
        assert!(matches!(result, Err(OperatorError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_factory_options() {
        let bad_key = TransformOptions::new(2).with_extra("mode", "symmetric");
        assert!(matches!(
            haar_factory(&bad_key),
            Err(OperatorError::Configuration(_))
        ));
        let bad_value = TransformOptions::new(2).with_extra("vanishing_moments", "9");
        assert!(matches!(
            daubechies_factory(&bad_value),
            Err(OperatorError::Configuration(_))
        ));
        assert!(matches!(
            haar_factory(&TransformOptions::new(0)),
            Err(OperatorError::Configuration(_))
        ));
        assert!(matches!(
            haar_factory(&TransformOptions::new(64)),
            Err(OperatorError::Configuration(_))
        ));
    }

    #[test]
    fn test_analysis_rejects_degenerate_inputs() {
        let engine = haar_factory(&TransformOptions::new(MAX_NB_SCALE)).unwrap();
        let result = engine.analysis(&Image::new(CImage::zeros((4, 4))));
        assert!(matches!(result, Err(OperatorError::DimensionMismatch { .. })));

        let engine = haar_factory(&TransformOptions::new(1)).unwrap();
        let result = engine.analysis(&Image::new(CImage::zeros((0, 4))));
        assert!(matches!(result, Err(OperatorError::DimensionMismatch { .. })));
    }
}
