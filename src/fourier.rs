use log::debug;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{check_shape, OperatorError, Result};
use crate::fft::{fftshift2, ifftshift2, Fft2Handler};
use crate::types::{CImage, CImageView, Float, RImage, Shape2};

/// Image to k-space mapping.
pub trait FourierOperator {
    /// Image-domain shape the operator accepts.
    fn shape(&self) -> Shape2;

    fn op(&self, image: CImageView) -> Result<CImage>;

    fn adj_op(&self, kspace: CImageView) -> Result<CImage>;
}

/// Undersampled Cartesian acquisition: orthonormal 2D FFT with the
/// zero frequency at the centre, followed by a binary sampling mask.
#[derive(Clone, Debug)]
pub struct CartesianFft {
    mask: RImage,
    fft: Fft2Handler,
}

impl CartesianFft {
    pub fn new(mask: RImage) -> Self {
        let fft = Fft2Handler::new(mask.dim());
        CartesianFft { mask, fft }
    }

    pub fn fully_sampled(shape: Shape2) -> Self {
        Self::new(RImage::ones(shape))
    }

    /// Keeps `center_lines` phase-encode rows around the centre plus randomly
    /// chosen rows until `fraction` of all rows are sampled.
    pub fn random_lines(
        shape: Shape2,
        fraction: Float,
        center_lines: usize,
        seed: u64,
    ) -> Result<Self> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(OperatorError::Configuration(format!(
                "sampling fraction must lie in (0, 1], got {}",
                fraction
            )));
        }
        let (rows, cols) = shape;
        let center_lines = center_lines.min(rows);
        let target = ((fraction * rows as Float).round() as usize).clamp(center_lines, rows);

        let first = rows / 2 - center_lines / 2;
        let center = first..first + center_lines;
        let mut others: Vec<usize> = (0..rows).filter(|r| !center.contains(r)).collect();
        let mut rng = SmallRng::seed_from_u64(seed);
        others.shuffle(&mut rng);

        let mut mask = RImage::zeros((rows, cols));
        for row in center.chain(others.into_iter().take(target - center_lines)) {
            mask.row_mut(row).fill(1.0);
        }
        debug!("Sampling {} of {} k-space lines", target, rows);
        Ok(Self::new(mask))
    }

    pub fn mask(&self) -> &RImage {
        &self.mask
    }

    pub fn sampling_ratio(&self) -> Float {
        self.mask.sum() / self.mask.len() as Float
    }
}

impl FourierOperator for CartesianFft {
    fn shape(&self) -> Shape2 {
        self.mask.dim()
    }

    fn op(&self, image: CImageView) -> Result<CImage> {
        check_shape("fourier op", self.mask.shape(), image.shape())?;
        let kspace = fftshift2(&self.fft.forward(image));
        Ok(kspace * &self.mask)
    }

    fn adj_op(&self, kspace: CImageView) -> Result<CImage> {
        check_shape("fourier adj_op", self.mask.shape(), kspace.shape())?;
        let masked = &kspace * &self.mask;
        Ok(self.fft.inverse(ifftshift2(&masked).view()))
    }
}
