//! Dense in-memory matrix engines.
//!
//! One type covers both orientations: the backing [`Array2`] is either in
//! standard (row-major) or Fortran (column-major) memory order, and the
//! layout decides which axis extracts zero-copy and which one is copied
//! element by element into the caller's buffer.

use ndarray::{Array2, ShapeBuilder};

use crate::content::Value;
use crate::errors::AnymatError;
use crate::matrix::{Matrix, Workspace};

/// A dense matrix over a flat value store.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<T> {
    data: Array2<T>,
}

impl<T: Value> DenseMatrix<T> {
    /// Build a row-major dense matrix from `values` of length `nrows * ncols`.
    pub fn new_row_major(
        nrows: usize,
        ncols: usize,
        values: Vec<T>,
    ) -> Result<Self, AnymatError> {
        let nvals = values.len();
        let data = Array2::from_shape_vec((nrows, ncols), values).map_err(|_| {
            AnymatError::InvalidShape(format!(
                "dense storage has {} values, expected {} x {}",
                nvals, nrows, ncols,
            ))
        })?;
        Ok(DenseMatrix { data })
    }

    /// Build a column-major dense matrix from `values` of length `nrows * ncols`.
    pub fn new_col_major(
        nrows: usize,
        ncols: usize,
        values: Vec<T>,
    ) -> Result<Self, AnymatError> {
        let nvals = values.len();
        let data = Array2::from_shape_vec((nrows, ncols).f(), values).map_err(|_| {
            AnymatError::InvalidShape(format!(
                "dense storage has {} values, expected {} x {}",
                nvals, nrows, ncols,
            ))
        })?;
        Ok(DenseMatrix { data })
    }
}

impl<T> From<Array2<T>> for DenseMatrix<T> {
    fn from(data: Array2<T>) -> Self {
        DenseMatrix { data }
    }
}

impl<T: Value> Matrix<T> for DenseMatrix<T> {
    type Index = i32;

    fn nrow(&self) -> usize {
        self.data.nrows()
    }

    fn ncol(&self) -> usize {
        self.data.ncols()
    }

    fn prefers_rows(&self) -> bool {
        self.data.is_standard_layout()
    }

    fn new_workspace(&self, _row_axis: bool) -> Option<Workspace> {
        None
    }

    fn row_into<'a>(
        &'a self,
        r: usize,
        buffer: &'a mut [T],
        first: usize,
        last: usize,
        _work: Option<&mut Workspace>,
    ) -> &'a [T] {
        debug_assert!(r < self.data.nrows());
        debug_assert!(first <= last && last <= self.data.ncols());
        if let Some(slice) = self.data.row(r).to_slice() {
            return &slice[first..last];
        }
        let n = last - first;
        for (k, slot) in buffer[..n].iter_mut().enumerate() {
            *slot = self.data[[r, first + k]];
        }
        &buffer[..n]
    }

    fn column_into<'a>(
        &'a self,
        c: usize,
        buffer: &'a mut [T],
        first: usize,
        last: usize,
        _work: Option<&mut Workspace>,
    ) -> &'a [T] {
        debug_assert!(c < self.data.ncols());
        debug_assert!(first <= last && last <= self.data.nrows());
        if let Some(slice) = self.data.column(c).to_slice() {
            return &slice[first..last];
        }
        let n = last - first;
        for (k, slot) in buffer[..n].iter_mut().enumerate() {
            *slot = self.data[[first + k, c]];
        }
        &buffer[..n]
    }
}
