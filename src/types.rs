use ndarray::{Array1, Array2, Array3, ArrayD, ArrayView1, ArrayView2, ArrayViewD};
use num_complex::Complex;

pub type Float = f64;
pub type CFloat = Complex<Float>;

pub type RImage = Array2<Float>;
pub type RStack = Array3<Float>;

pub type CVector = Array1<CFloat>;
pub type CImage = Array2<CFloat>;
pub type CStack = Array3<CFloat>;
pub type CArrayD = ArrayD<CFloat>;

pub type CVectorView<'a> = ArrayView1<'a, CFloat>;
pub type CImageView<'a> = ArrayView2<'a, CFloat>;
pub type CArrayDView<'a> = ArrayViewD<'a, CFloat>;

/// (rows, columns) of a 2D image.
pub type Shape2 = (usize, usize);
