use crate::error::{check_shape, Result};
use crate::types::{CImage, CVector, CVectorView, Shape2};

/// Ordered per-subband shapes needed to undo [`flatten`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShapeManifest {
    shapes: Vec<Shape2>,
}

impl ShapeManifest {
    pub fn new(shapes: Vec<Shape2>) -> Self {
        ShapeManifest { shapes }
    }

    pub fn shapes(&self) -> &[Shape2] {
        &self.shapes
    }

    pub fn nb_bands(&self) -> usize {
        self.shapes.len()
    }

    /// Number of coefficients a vector must hold to match this manifest.
    pub fn total_len(&self) -> usize {
        self.shapes.iter().map(|(r, c)| r * c).sum()
    }
}

/// Concatenates every band, row-major, into one vector.
pub fn flatten(bands: &[CImage]) -> (CVector, ShapeManifest) {
    let manifest = ShapeManifest::new(bands.iter().map(|b| b.dim()).collect());
    let flat: CVector = bands.iter().flat_map(|b| b.iter().cloned()).collect();
    (flat, manifest)
}

pub fn unflatten(flat: CVectorView, manifest: &ShapeManifest) -> Result<Vec<CImage>> {
    check_shape("unflatten", &[manifest.total_len()], flat.shape())?;

    let mut offset = 0;
    let mut bands = Vec::with_capacity(manifest.nb_bands());
    for &(rows, cols) in manifest.shapes() {
        let band = CImage::from_shape_fn((rows, cols), |(i, j)| flat[offset + i * cols + j]);
        bands.push(band);
        offset += rows * cols;
    }
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperatorError;
    use ndarray::s;
    use num_complex::Complex;

    fn bands() -> Vec<CImage> {
        vec![
            CImage::from_shape_fn((4, 4), |(i, j)| Complex::new(i as f64, j as f64)),
            CImage::from_shape_fn((2, 3), |(i, j)| Complex::new(-(i as f64), 1.0 + j as f64)),
            CImage::from_elem((1, 1), Complex::new(7.0, 0.5)),
        ]
    }

    #[test]
    fn test_flatten_unflatten_roundtrip() {
        let original = bands();
        let (flat, manifest) = flatten(&original);
        assert_eq!(flat.len(), 16 + 6 + 1);
        assert_eq!(manifest.shapes(), &[(4, 4), (2, 3), (1, 1)]);

        let restored = unflatten(flat.view(), &manifest).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_flatten_is_row_major() {
        let (flat, _) = flatten(&bands());
        assert_eq!(flat[1], Complex::new(0.0, 1.0));
        assert_eq!(flat[4], Complex::new(1.0, 0.0));
        assert_eq!(flat[22], Complex::new(7.0, 0.5));
    }

    #[test]
    fn test_unflatten_rejects_wrong_length() {
        let (flat, manifest) = flatten(&bands());
        let truncated = flat.slice(s![..20]);
        match unflatten(truncated, &manifest) {
            Err(OperatorError::DimensionMismatch { expected, found, .. }) => {
                assert_eq!(expected, vec![23]);
                assert_eq!(found, vec![20]);
            }
            other => panic!("expected a dimension mismatch, got {:?}", other),
        }
    }
}
