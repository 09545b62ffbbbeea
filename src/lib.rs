//! Wavelet, Fourier and gradient operators for iterative MRI reconstruction.

pub mod configs;
pub mod defaults;
pub mod error;
pub mod fft;
pub mod filters;
pub mod fourier;
pub mod gradient;
pub mod image;
pub mod linear;
pub mod ndarray_complex;
pub mod power_method;
pub mod transform;
pub mod types;

pub use configs::{OutputKind, PowerIterationConfig};
pub use error::{OperatorError, Result};
pub use fourier::{CartesianFft, FourierOperator};
pub use gradient::{Gradient, GradientKind};
pub use linear::{LinearOperator, Reconstruction, Wavelet2, WaveletUD};
pub use power_method::power_iteration;
pub use transform::{ShapeManifest, TransformRegistry};
