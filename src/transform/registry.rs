use std::collections::BTreeMap;

use log::debug;

use super::{daubechies_factory, haar_factory, TransformEngine, TransformOptions};
use crate::error::{OperatorError, Result};

pub type TransformFactory = fn(&TransformOptions) -> Result<Box<dyn TransformEngine>>;

/// Name to engine-constructor table.
///
/// Callers own the registry and hand it to the operators that need it; there
/// is no process-wide instance.
#[derive(Clone)]
pub struct TransformRegistry {
    factories: BTreeMap<String, TransformFactory>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        TransformRegistry {
            factories: BTreeMap::new(),
        }
    }

    /// Registry holding the engines bundled with this crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("HaarWaveletTransform", haar_factory);
        registry.register("DaubechiesWaveletTransform", daubechies_factory);
        registry
    }

    pub fn register(&mut self, name: &str, factory: TransformFactory) {
        self.factories.insert(name.to_owned(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn load(&self, name: &str, options: &TransformOptions) -> Result<Box<dyn TransformEngine>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| {
                OperatorError::Configuration(format!("Unknown transformation '{}'.", name))
            })?;
        debug!("Loading transform '{}' with {} scales", name, options.nb_scale);
        factory(options)
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
