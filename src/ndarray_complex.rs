use crate::types::{CFloat, Float};
use ndarray::{Array, ArrayBase, Data, DataMut, DataOwned, Dimension, Zip};
use num_complex::{Complex, ComplexFloat};

pub trait Conj {
    type Output;
    fn conj(self) -> Self::Output;
}

impl<S, D> Conj for ArrayBase<S, D>
where
    S: DataOwned<Elem = Complex<Float>> + DataMut,
    D: Dimension,
{
    type Output = Self;

    fn conj(mut self) -> Self {
        self.map_inplace(|x| {
            *x = x.conj();
        });
        self
    }
}

impl<'a, S, D> Conj for &'a ArrayBase<S, D>
where
    S: Data<Elem = Complex<Float>>,
    D: Dimension,
{
    type Output = Array<Complex<Float>, D>;

    fn conj(self) -> Array<Complex<Float>, D> {
        self.map(|&x| x.conj())
    }
}

/// Euclidean (Frobenius) norm over every element, whatever the dimension.
pub fn l2_norm<S, D>(a: &ArrayBase<S, D>) -> Float
where
    S: Data<Elem = CFloat>,
    D: Dimension,
{
    a.iter().map(|x| x.norm_sqr()).sum::<Float>().sqrt()
}

/// `sum(conj(a) * b)`, shapes must agree.
pub fn vdot<S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>) -> CFloat
where
    S1: Data<Elem = CFloat>,
    S2: Data<Elem = CFloat>,
    D: Dimension,
{
    Zip::from(a)
        .and(b)
        .fold(CFloat::new(0.0, 0.0), |acc, x, y| acc + x.conj() * y)
}

/// Splits a complex array into its real and imaginary planes.
pub fn split_complex<S, D>(a: &ArrayBase<S, D>) -> (Array<Float, D>, Array<Float, D>)
where
    S: Data<Elem = CFloat>,
    D: Dimension,
{
    (a.map(|x| x.re), a.map(|x| x.im))
}

/// `re + i * im`
pub fn combine_complex<S1, S2, D>(re: &ArrayBase<S1, D>, im: &ArrayBase<S2, D>) -> Array<CFloat, D>
where
    S1: Data<Elem = Float>,
    S2: Data<Elem = Float>,
    D: Dimension,
{
    Zip::from(re).and(im).map_collect(|&r, &i| CFloat::new(r, i))
}

#[allow(dead_code)]
pub fn carray_abs_diff_eq<'a, S, D>(
    a: &'a ArrayBase<S, D>,
    b: &'a ArrayBase<S, D>,
    epsilon: Float,
) -> bool
where
    S: Data<Elem = Complex<Float>>,
    D: Dimension,
{
    a.shape() == b.shape() && Zip::from(a).and(b).all(|&x, &y| (x - y).abs() < epsilon)
}
