use std::collections::BTreeMap;

use crate::error::Result;
use crate::image::Image;
use crate::types::CImage;

mod flatten;
mod orthogonal;
mod registry;

pub use flatten::{flatten, unflatten, ShapeManifest};
pub use orthogonal::{daubechies_factory, haar_factory, OrthogonalWavelet};
pub use registry::{TransformFactory, TransformRegistry};

/// Construction parameters handed to a [`TransformFactory`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformOptions {
    pub nb_scale: usize,
    pub verbose: u8,
    /// Engine specific settings, passed through untouched.
    pub extra: BTreeMap<String, String>,
}

impl TransformOptions {
    pub fn new(nb_scale: usize) -> Self {
        TransformOptions {
            nb_scale,
            ..Default::default()
        }
    }

    pub fn with_extra(mut self, key: &str, value: &str) -> Self {
        self.extra.insert(key.to_owned(), value.to_owned());
        self
    }
}

/// A multiscale decomposition producing an ordered list of 2D subbands.
pub trait TransformEngine {
    fn name(&self) -> &str;

    fn nb_scale(&self) -> usize;

    fn analysis(&self, image: &Image) -> Result<Vec<CImage>>;

    fn synthesis(&self, bands: Vec<CImage>) -> Result<Image>;
}
