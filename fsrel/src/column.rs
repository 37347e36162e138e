//! Shared numeric columns.
use std::{ops::Deref, sync::Arc};

/// An immutable column of `f64` values.
///
/// Storage is shared: cloning a column (for instance when a derived record
/// feeds the input table of another relation) never copies the values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column(Arc<[f64]>);

impl Column {
    /// Create a column from owned values.
    pub fn new(values: Vec<f64>) -> Self {
        Self(Arc::from(values))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the values.
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Element-wise transform.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Column {
        self.0.iter().map(|&x| f(x)).collect()
    }

    /// Element-wise combination of two columns.
    ///
    /// Columns of a single [`Table`](crate::table::Table) always share a
    /// length. For mismatched inputs the result is truncated to the shorter one.
    pub fn zip_with(&self, other: &Column, f: impl Fn(f64, f64) -> f64) -> Column {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(&x, &y)| f(x, y))
            .collect()
    }

    /// Largest absolute element-wise difference between two columns.
    ///
    /// Two `NaN` at the same row agree; a `NaN` facing a number counts as an
    /// infinite difference. Returns `None` when the lengths differ.
    pub fn max_abs_diff(&self, other: &Column) -> Option<f64> {
        if self.len() != other.len() {
            return None;
        }

        let mut max = 0.0f64;
        for (&x, &y) in self.0.iter().zip(other.0.iter()) {
            let diff = match (x.is_nan(), y.is_nan()) {
                (true, true) => 0.0,
                (true, false) | (false, true) => f64::INFINITY,
                (false, false) if x == y => 0.0, // equal infinities
                (false, false) => (x - y).abs(),
            };
            max = max.max(diff);
        }
        Some(max)
    }
}

impl Deref for Column {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl From<&[f64]> for Column {
    fn from(values: &[f64]) -> Self {
        Self(Arc::from(values))
    }
}

impl<const N: usize> From<[f64; N]> for Column {
    fn from(values: [f64; N]) -> Self {
        Self(Arc::from(values.as_slice()))
    }
}

impl FromIterator<f64> for Column {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
