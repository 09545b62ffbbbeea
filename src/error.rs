use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("state error: {0}")]
    State(&'static str),

    #[error("dimension mismatch in {context}: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        context: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
}

pub type Result<T> = std::result::Result<T, OperatorError>;

/// Fails with `DimensionMismatch` unless `found == expected`.
pub(crate) fn check_shape(
    context: &'static str,
    expected: &[usize],
    found: &[usize],
) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(dimension_mismatch(context, expected, found))
    }
}

pub(crate) fn dimension_mismatch(
    context: &'static str,
    expected: &[usize],
    found: &[usize],
) -> OperatorError {
    OperatorError::DimensionMismatch {
        context,
        expected: expected.to_vec(),
        found: found.to_vec(),
    }
}

/// Fails with `DimensionMismatch` if either side of `shape` is zero.
pub(crate) fn check_nonempty(context: &'static str, shape: (usize, usize)) -> Result<()> {
    let (rows, cols) = shape;
    if rows > 0 && cols > 0 {
        Ok(())
    } else {
        Err(dimension_mismatch(context, &[rows.max(1), cols.max(1)], &[rows, cols]))
    }
}
