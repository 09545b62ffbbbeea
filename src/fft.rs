use std::fmt;

use crate::types::{CImage, CImageView, Float, Shape2};
use ndarray::Array2;
use ndrustfft::{ndfft, ndifft, FftHandler};

/// Planned 2D FFT, scaled by `1/sqrt(N)` both ways so the inverse is also the
/// adjoint.
#[derive(Clone)]
pub struct Fft2Handler {
    shape: Shape2,
    rows: FftHandler<Float>,
    cols: FftHandler<Float>,
}

impl Fft2Handler {
    pub fn new(shape: Shape2) -> Self {
        Fft2Handler {
            shape,
            rows: FftHandler::new(shape.0),
            cols: FftHandler::new(shape.1),
        }
    }

    pub fn shape(&self) -> Shape2 {
        self.shape
    }

    fn scale(&self) -> Float {
        ((self.shape.0 * self.shape.1) as Float).sqrt()
    }

    pub fn forward(&self, data: CImageView) -> CImage {
        let mut tmp = CImage::zeros(self.shape);
        let mut out = CImage::zeros(self.shape);
        ndfft(&data, &mut tmp, &self.cols, 1);
        ndfft(&tmp, &mut out, &self.rows, 0);
        let scale = self.scale();
        out.mapv_inplace(|x| x / scale);
        out
    }

    pub fn inverse(&self, data: CImageView) -> CImage {
        let mut tmp = CImage::zeros(self.shape);
        let mut out = CImage::zeros(self.shape);
        ndifft(&data, &mut tmp, &self.rows, 0);
        ndifft(&tmp, &mut out, &self.cols, 1);
        // ndifft already divides by N
        let scale = self.scale();
        out.mapv_inplace(|x| x * scale);
        out
    }
}

impl fmt::Debug for Fft2Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fft2Handler").field("shape", &self.shape).finish()
    }
}

/// Moves the zero-frequency sample from `(0, 0)` to `(rows/2, cols/2)`.
pub fn fftshift2<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (n0, n1) = data.dim();
    let (h0, h1) = (n0 / 2, n1 / 2);
    Array2::from_shape_fn((n0, n1), |(i, j)| {
        data[[(i + n0 - h0) % n0, (j + n1 - h1) % n1]].clone()
    })
}

/// Inverse of [`fftshift2`], also for odd sizes.
pub fn ifftshift2<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (n0, n1) = data.dim();
    let (h0, h1) = (n0 / 2, n1 / 2);
    Array2::from_shape_fn((n0, n1), |(i, j)| data[[(i + h0) % n0, (j + h1) % n1]].clone())
}
