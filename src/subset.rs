//! Delayed subsetting along one axis of a wrapped matrix.
//!
//! Nothing is copied out of the wrapped matrix at construction; the index
//! vector is applied lazily at every extraction. Indices are arbitrary:
//! duplicates and out-of-order entries are allowed, so a subset can also
//! reorder or repeat slices of its target.

use std::sync::Arc;

use crate::content::Value;
use crate::errors::AnymatError;
use crate::indexing::MatIndex;
use crate::matrix::{Matrix, SparseRange, Workspace};

/// A matrix wrapping another one, remapping one axis through an index
/// vector.
///
/// The wrapped matrix is shared, not copied; several subsets can point at
/// the same target.
#[derive(Debug, Clone)]
pub struct DelayedSubset<M: ?Sized> {
    indices: Vec<usize>,
    by_rows: bool,
    inner: Arc<M>,
}

impl<M: ?Sized> DelayedSubset<M> {
    /// Subset the rows of `inner`: row `i` of the result is row
    /// `indices[i]` of `inner`.
    pub fn rows<T>(inner: Arc<M>, indices: Vec<usize>) -> Result<Self, AnymatError>
    where
        T: Value,
        M: Matrix<T>,
    {
        Self::new(inner.nrow(), inner, indices, true)
    }

    /// Subset the columns of `inner`: column `j` of the result is column
    /// `indices[j]` of `inner`.
    pub fn cols<T>(inner: Arc<M>, indices: Vec<usize>) -> Result<Self, AnymatError>
    where
        T: Value,
        M: Matrix<T>,
    {
        Self::new(inner.ncol(), inner, indices, false)
    }

    fn new(
        extent: usize,
        inner: Arc<M>,
        indices: Vec<usize>,
        by_rows: bool,
    ) -> Result<Self, AnymatError> {
        for &i in indices.iter() {
            if i >= extent {
                return Err(AnymatError::OutOfBounds(format!(
                    "subset index {} exceeds the {} {}",
                    i,
                    if by_rows { "row count" } else { "column count" },
                    extent,
                )));
            }
        }
        Ok(DelayedSubset {
            indices,
            by_rows,
            inner,
        })
    }

    /// The index vector applied along the subset axis.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Gather `inner`'s row or column `q` through the index vector into
    /// `buffer[..last - first]`.
    fn gather<'a, T, I>(
        &self,
        q: usize,
        buffer: &'a mut [T],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
    ) -> &'a [T]
    where
        T: Value,
        I: MatIndex,
        M: Matrix<T, Index = I>,
    {
        let extent = if self.by_rows {
            self.inner.nrow()
        } else {
            self.inner.ncol()
        };
        let mut scratch = vec![T::zero(); extent];
        let source = if self.by_rows {
            self.inner.column_into(q, &mut scratch, 0, extent, work)
        } else {
            self.inner.row_into(q, &mut scratch, 0, extent, work)
        };
        let n = last - first;
        for (k, slot) in buffer[..n].iter_mut().enumerate() {
            *slot = source[self.indices[first + k]];
        }
        &buffer[..n]
    }

    /// Sparse variant of [`DelayedSubset::gather`]: the gathered positions
    /// are emitted in ascending subset position, so the output is sorted
    /// regardless of the index vector's order. Stored zeros of the target
    /// are dropped on this path.
    fn gather_sparse<'a, T, I>(
        &self,
        q: usize,
        vbuf: &'a mut [T],
        ibuf: &'a mut [I],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
    ) -> SparseRange<'a, T, I>
    where
        T: Value,
        I: MatIndex,
        M: Matrix<T, Index = I>,
    {
        let extent = if self.by_rows {
            self.inner.nrow()
        } else {
            self.inner.ncol()
        };
        let mut scratch = vec![T::zero(); extent];
        let source = if self.by_rows {
            self.inner.column_into(q, &mut scratch, 0, extent, work)
        } else {
            self.inner.row_into(q, &mut scratch, 0, extent, work)
        };
        let mut n = 0;
        for k in first..last {
            let v = source[self.indices[k]];
            if v != T::zero() {
                vbuf[n] = v;
                ibuf[n] = I::from_usize(k);
                n += 1;
            }
        }
        SparseRange::new(&vbuf[..n], &ibuf[..n])
    }
}

impl<T, I, M> Matrix<T> for DelayedSubset<M>
where
    T: Value,
    I: MatIndex,
    M: Matrix<T, Index = I> + ?Sized,
{
    type Index = I;

    fn nrow(&self) -> usize {
        if self.by_rows {
            self.indices.len()
        } else {
            self.inner.nrow()
        }
    }

    fn ncol(&self) -> usize {
        if self.by_rows {
            self.inner.ncol()
        } else {
            self.indices.len()
        }
    }

    fn is_sparse(&self) -> bool {
        self.inner.is_sparse()
    }

    fn prefers_rows(&self) -> bool {
        self.inner.prefers_rows()
    }

    fn new_workspace(&self, row_axis: bool) -> Option<Workspace> {
        if row_axis == self.by_rows {
            // the access pattern on the target is driven by the index
            // vector, which is not monotone in general
            None
        } else {
            self.inner.new_workspace(row_axis)
        }
    }

    fn row_into<'a>(
        &'a self,
        r: usize,
        buffer: &'a mut [T],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
    ) -> &'a [T] {
        if self.by_rows {
            self.inner
                .row_into(self.indices[r], buffer, first, last, None)
        } else {
            self.gather(r, buffer, first, last, work)
        }
    }

    fn column_into<'a>(
        &'a self,
        c: usize,
        buffer: &'a mut [T],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
    ) -> &'a [T] {
        if self.by_rows {
            self.gather(c, buffer, first, last, work)
        } else {
            self.inner
                .column_into(self.indices[c], buffer, first, last, None)
        }
    }

    fn sparse_row_into<'a>(
        &'a self,
        r: usize,
        vbuf: &'a mut [T],
        ibuf: &'a mut [I],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
        sorted: bool,
    ) -> SparseRange<'a, T, I> {
        if self.by_rows {
            self.inner
                .sparse_row_into(self.indices[r], vbuf, ibuf, first, last, None, sorted)
        } else {
            self.gather_sparse(r, vbuf, ibuf, first, last, work)
        }
    }

    fn sparse_column_into<'a>(
        &'a self,
        c: usize,
        vbuf: &'a mut [T],
        ibuf: &'a mut [I],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
        sorted: bool,
    ) -> SparseRange<'a, T, I> {
        if self.by_rows {
            self.gather_sparse(c, vbuf, ibuf, first, last, work)
        } else {
            self.inner.sparse_column_into(
                self.indices[c],
                vbuf,
                ibuf,
                first,
                last,
                None,
                sorted,
            )
        }
    }
}
