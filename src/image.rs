use std::collections::BTreeMap;

use crate::error::{check_nonempty, Result};
use crate::types::{CFloat, CImage, CImageView, Float, Shape2};

/// Image container the transform engines consume and produce.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    data: CImage,
    pub metadata: BTreeMap<String, String>,
}

impl Image {
    pub fn new(data: CImage) -> Self {
        Image {
            data,
            metadata: BTreeMap::new(),
        }
    }

    pub fn shape(&self) -> Shape2 {
        self.data.dim()
    }

    pub fn data(&self) -> CImageView {
        self.data.view()
    }

    pub fn into_data(self) -> CImage {
        self.data
    }
}

impl From<CImage> for Image {
    fn from(data: CImage) -> Self {
        Image::new(data)
    }
}

impl<'a> From<CImageView<'a>> for Image {
    fn from(data: CImageView<'a>) -> Self {
        Image::new(data.to_owned())
    }
}

/// Unit impulse at the centre of `shape` after rounding each side up to even.
///
/// Operator norms are calibrated on this image; an empty shape
/// has no centre and is rejected.
pub fn centered_impulse(shape: Shape2) -> Result<CImage> {
    check_nonempty("centered impulse", shape)?;
    let rows = shape.0 + shape.0 % 2;
    let cols = shape.1 + shape.1 % 2;
    let mut data = CImage::zeros((rows, cols));
    data[[rows / 2, cols / 2]] = CFloat::new(1.0, 0.0);
    Ok(data)
}

/// Real-valued test object: an outer ellipse with three brighter or darker
/// inclusions, on normalised coordinates in [-1, 1].
pub fn ellipse_phantom(shape: Shape2) -> CImage {
    // (centre y, centre x, semi-axis y, semi-axis x, intensity)
    let ellipses: [(Float, Float, Float, Float, Float); 4] = [
        (0.0, 0.0, 0.9, 0.7, 1.0),
        (0.0, -0.3, 0.35, 0.15, -0.4),
        (0.0, 0.3, 0.35, 0.15, -0.4),
        (-0.5, 0.0, 0.12, 0.12, 0.5),
    ];
    let (rows, cols) = shape;
    CImage::from_shape_fn(shape, |(i, j)| {
        let y = 2.0 * i as Float / rows.max(1) as Float - 1.0;
        let x = 2.0 * j as Float / cols.max(1) as Float - 1.0;
        let value = ellipses
            .iter()
            .filter(|(cy, cx, ay, ax, _)| ((y - cy) / ay).powi(2) + ((x - cx) / ax).powi(2) <= 1.0)
            .map(|e| e.4)
            .sum::<Float>();
        CFloat::new(value, 0.0)
    })
}
