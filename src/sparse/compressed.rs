//! A sparse matrix in the compressed sparse row/column format.
//!
//! In the CSR format, a matrix is a structure containing three vectors:
//! `indptr`, `indices`, and `data`. These vectors satisfy the relation
//! `A(i, indices[indptr[i]..indptr[i+1]]) = data[indptr[i]..indptr[i+1]]`.
//! In the CSC format, the relation is
//! `A(indices[indptr[i]..indptr[i+1]], i) = data[indptr[i]..indptr[i+1]]`.
//!
//! The compressed dimension is referred to as the *outer* dimension (rows
//! for CSR, columns for CSC) and the other one as the *inner* dimension.
//! Outer extraction walks a single slab; inner extraction has to visit
//! every slab, and a [`SecondaryCursors`] workspace keeps one cursor per
//! slab so that monotone inner sweeps stay linear overall.

use crate::content::Value;
use crate::errors::AnymatError;
use crate::indexing::MatIndex;
use crate::matrix::{Matrix, SparseRange, Workspace};

/// Describes the storage of a compressed matrix.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum CompressedStorage {
    /// Compressed row storage
    CSR,
    /// Compressed column storage
    CSC,
}

impl CompressedStorage {
    /// Get the other storage, ie return CSC if we were CSR, and vice versa
    pub fn other_storage(self) -> Self {
        match self {
            CompressedStorage::CSR => CompressedStorage::CSC,
            CompressedStorage::CSC => CompressedStorage::CSR,
        }
    }
}

/// Cursor state for inner-axis traversal of a compressed matrix.
///
/// Holds one offset per outer slab, each pointing at the first entry of
/// that slab not yet passed, plus the previously requested inner index so
/// the engine can tell monotone advances from jumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryCursors {
    pub(crate) offsets: Vec<usize>,
    pub(crate) last: Option<usize>,
}

impl SecondaryCursors {
    pub(crate) fn new(indptr: &[usize]) -> Self {
        SecondaryCursors {
            offsets: indptr[..indptr.len() - 1].to_vec(),
            last: None,
        }
    }

    /// The current per-slab offsets into the index/value arrays.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }
}

/// Locate `target` in the sorted slab `indices[lo..hi]` by binary search.
pub(crate) fn lookup_binary<I: MatIndex>(
    indices: &[I],
    lo: usize,
    hi: usize,
    target: usize,
) -> Option<usize> {
    let k = lo + indices[lo..hi].partition_point(|i| i.index() < target);
    if k < hi && indices[k].index() == target {
        Some(k)
    } else {
        None
    }
}

/// Locate `target` in the sorted slab `indices[lo..hi]`, resuming from a
/// cached cursor.
///
/// On a forward request the cursor is advanced linearly, which amortizes a
/// monotone sweep of the inner axis to one pass over the slab; a backward
/// request relocates the cursor by binary search.
pub(crate) fn lookup_with_cursor<I: MatIndex>(
    indices: &[I],
    lo: usize,
    hi: usize,
    target: usize,
    cursor: &mut usize,
    forward: bool,
) -> Option<usize> {
    if forward {
        while *cursor < hi && indices[*cursor].index() < target {
            *cursor += 1;
        }
    } else {
        *cursor = lo + indices[lo..hi].partition_point(|i| i.index() < target);
    }
    if *cursor < hi && indices[*cursor].index() == target {
        Some(*cursor)
    } else {
        None
    }
}

/// Narrow the slab `indices[lo..hi]` to the entries falling in `[first, last)`.
pub(crate) fn window_of_slab<I: MatIndex>(
    indices: &[I],
    lo: usize,
    hi: usize,
    first: usize,
    last: usize,
) -> (usize, usize) {
    let l = lo + indices[lo..hi].partition_point(|i| i.index() < first);
    let h = lo + indices[lo..hi].partition_point(|i| i.index() < last);
    (l, h)
}

/// Compressed matrix in the CSR or CSC format, with sorted indices.
#[derive(Debug, Clone, PartialEq)]
pub struct CsMatrix<N, I = i32> {
    storage: CompressedStorage,
    nrows: usize,
    ncols: usize,
    indptr: Vec<usize>,
    indices: Vec<I>,
    data: Vec<N>,
}

impl<N: Value, I: MatIndex> CsMatrix<N, I> {
    /// Create a compressed matrix from its components, checking their
    /// validity.
    ///
    /// This will ensure that:
    /// * `indptr` has one entry per outer slab plus one, starts at zero,
    ///   is nondecreasing and ends at `nnz`
    /// * `indices` and `data` have matching lengths
    /// * indices are in range of the inner dimension and strictly
    ///   increasing within each slab
    pub fn new(
        storage: CompressedStorage,
        nrows: usize,
        ncols: usize,
        indptr: Vec<usize>,
        indices: Vec<I>,
        data: Vec<N>,
    ) -> Result<Self, AnymatError> {
        let outer = match storage {
            CompressedStorage::CSR => nrows,
            CompressedStorage::CSC => ncols,
        };
        let inner = match storage {
            CompressedStorage::CSR => ncols,
            CompressedStorage::CSC => nrows,
        };
        if indptr.len() != outer + 1 {
            return Err(AnymatError::InvalidShape(format!(
                "pointer array has {} entries, expected {}",
                indptr.len(),
                outer + 1,
            )));
        }
        if indices.len() != data.len() {
            return Err(AnymatError::InvalidShape(format!(
                "{} indices do not match {} values",
                indices.len(),
                data.len(),
            )));
        }
        if indptr[0] != 0 {
            return Err(AnymatError::InvalidInput(
                "pointer array does not start at zero".to_string(),
            ));
        }
        if !indptr.windows(2).all(|w| w[0] <= w[1]) {
            return Err(AnymatError::InvalidInput(
                "pointer array is not nondecreasing".to_string(),
            ));
        }
        if indptr[outer] != data.len() {
            return Err(AnymatError::InvalidShape(format!(
                "pointer array ends at {} but {} values are stored",
                indptr[outer],
                data.len(),
            )));
        }
        for w in indptr.windows(2) {
            let slab = &indices[w[0]..w[1]];
            if !slab.windows(2).all(|p| p[0] < p[1]) {
                return Err(AnymatError::InvalidInput(
                    "indices are not strictly increasing within a slab".to_string(),
                ));
            }
            if let Some(i) = slab.last() {
                if i.index() >= inner {
                    return Err(AnymatError::InvalidInput(format!(
                        "index {} exceeds the inner dimension {}",
                        i.index(),
                        inner,
                    )));
                }
            }
        }
        Ok(CsMatrix {
            storage,
            nrows,
            ncols,
            indptr,
            indices,
            data,
        })
    }

    /// Create a CSR matrix from its components, checking their validity.
    pub fn new_csr(
        nrows: usize,
        ncols: usize,
        indptr: Vec<usize>,
        indices: Vec<I>,
        data: Vec<N>,
    ) -> Result<Self, AnymatError> {
        Self::new(CompressedStorage::CSR, nrows, ncols, indptr, indices, data)
    }

    /// Create a CSC matrix from its components, checking their validity.
    pub fn new_csc(
        nrows: usize,
        ncols: usize,
        indptr: Vec<usize>,
        indices: Vec<I>,
        data: Vec<N>,
    ) -> Result<Self, AnymatError> {
        Self::new(CompressedStorage::CSC, nrows, ncols, indptr, indices, data)
    }

    /// The storage orientation of this matrix.
    pub fn storage(&self) -> CompressedStorage {
        self.storage
    }

    /// The number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// The pointer array delimiting the outer slabs.
    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    /// The inner indices of the stored entries.
    pub fn indices(&self) -> &[I] {
        &self.indices
    }

    /// The stored values.
    pub fn data(&self) -> &[N] {
        &self.data
    }

    fn outer_dims(&self) -> usize {
        match self.storage {
            CompressedStorage::CSR => self.nrows,
            CompressedStorage::CSC => self.ncols,
        }
    }

    fn inner_dims(&self) -> usize {
        match self.storage {
            CompressedStorage::CSR => self.ncols,
            CompressedStorage::CSC => self.nrows,
        }
    }

    /// Dense extraction of outer slab `p`, windowed to `[first, last)`.
    fn outer_dense<'a>(
        &'a self,
        p: usize,
        buffer: &'a mut [N],
        first: usize,
        last: usize,
    ) -> &'a [N] {
        let n = last - first;
        for slot in buffer[..n].iter_mut() {
            *slot = N::zero();
        }
        let (lo, hi) = (self.indptr[p], self.indptr[p + 1]);
        let (l, h) = window_of_slab(&self.indices, lo, hi, first, last);
        for k in l..h {
            buffer[self.indices[k].index() - first] = self.data[k];
        }
        &buffer[..n]
    }

    /// Sparse extraction of outer slab `p`, windowed to `[first, last)`.
    ///
    /// A full window aliases the internal storage; a narrower one copies
    /// the matching subrange into the caller's buffers.
    fn outer_sparse<'a>(
        &'a self,
        p: usize,
        vbuf: &'a mut [N],
        ibuf: &'a mut [I],
        first: usize,
        last: usize,
    ) -> SparseRange<'a, N, I> {
        let (lo, hi) = (self.indptr[p], self.indptr[p + 1]);
        if first == 0 && last == self.inner_dims() {
            return SparseRange::new(&self.data[lo..hi], &self.indices[lo..hi]);
        }
        let (l, h) = window_of_slab(&self.indices, lo, hi, first, last);
        let m = h - l;
        vbuf[..m].copy_from_slice(&self.data[l..h]);
        ibuf[..m].copy_from_slice(&self.indices[l..h]);
        SparseRange::new(&vbuf[..m], &ibuf[..m])
    }

    /// Dense extraction of inner position `target` across the outer slabs
    /// `[first, last)`.
    fn inner_dense<'a>(
        &'a self,
        target: usize,
        buffer: &'a mut [N],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
    ) -> &'a [N] {
        let n = last - first;
        for slot in buffer[..n].iter_mut() {
            *slot = N::zero();
        }
        match self.cursors(work) {
            Some(cursors) => {
                let forward = cursors.last.map_or(true, |l| target >= l);
                for p in first..last {
                    let (lo, hi) = (self.indptr[p], self.indptr[p + 1]);
                    let cur = &mut cursors.offsets[p];
                    if let Some(k) =
                        lookup_with_cursor(&self.indices, lo, hi, target, cur, forward)
                    {
                        buffer[p - first] = self.data[k];
                    }
                }
                cursors.last = Some(target);
            }
            None => {
                for p in first..last {
                    let (lo, hi) = (self.indptr[p], self.indptr[p + 1]);
                    if let Some(k) = lookup_binary(&self.indices, lo, hi, target) {
                        buffer[p - first] = self.data[k];
                    }
                }
            }
        }
        &buffer[..n]
    }

    /// Sparse extraction of inner position `target` across the outer slabs
    /// `[first, last)`. The outer positions are visited in order, so the
    /// output is always sorted.
    fn inner_sparse<'a>(
        &'a self,
        target: usize,
        vbuf: &'a mut [N],
        ibuf: &'a mut [I],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
    ) -> SparseRange<'a, N, I> {
        let mut n = 0;
        match self.cursors(work) {
            Some(cursors) => {
                let forward = cursors.last.map_or(true, |l| target >= l);
                for p in first..last {
                    let (lo, hi) = (self.indptr[p], self.indptr[p + 1]);
                    let cur = &mut cursors.offsets[p];
                    if let Some(k) =
                        lookup_with_cursor(&self.indices, lo, hi, target, cur, forward)
                    {
                        vbuf[n] = self.data[k];
                        ibuf[n] = I::from_usize(p);
                        n += 1;
                    }
                }
                cursors.last = Some(target);
            }
            None => {
                for p in first..last {
                    let (lo, hi) = (self.indptr[p], self.indptr[p + 1]);
                    if let Some(k) = lookup_binary(&self.indices, lo, hi, target) {
                        vbuf[n] = self.data[k];
                        ibuf[n] = I::from_usize(p);
                        n += 1;
                    }
                }
            }
        }
        SparseRange::new(&vbuf[..n], &ibuf[..n])
    }

    fn cursors<'w>(
        &self,
        work: Option<&'w mut Workspace>,
    ) -> Option<&'w mut SecondaryCursors> {
        debug_assert!(
            matches!(&work, None | Some(Workspace::Compressed(_))),
            "workspace was not created by this matrix",
        );
        match work {
            Some(Workspace::Compressed(c)) if c.offsets.len() == self.outer_dims() => {
                Some(c)
            }
            _ => None,
        }
    }
}

impl<N: Value, I: MatIndex> Matrix<N> for CsMatrix<N, I> {
    type Index = I;

    fn nrow(&self) -> usize {
        self.nrows
    }

    fn ncol(&self) -> usize {
        self.ncols
    }

    fn is_sparse(&self) -> bool {
        true
    }

    fn prefers_rows(&self) -> bool {
        self.storage == CompressedStorage::CSR
    }

    fn new_workspace(&self, row_axis: bool) -> Option<Workspace> {
        let cross = match self.storage {
            CompressedStorage::CSR => !row_axis,
            CompressedStorage::CSC => row_axis,
        };
        if cross {
            Some(Workspace::Compressed(SecondaryCursors::new(&self.indptr)))
        } else {
            None
        }
    }

    fn row_into<'a>(
        &'a self,
        r: usize,
        buffer: &'a mut [N],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
    ) -> &'a [N] {
        debug_assert!(r < self.nrows);
        debug_assert!(first <= last && last <= self.ncols);
        match self.storage {
            CompressedStorage::CSR => self.outer_dense(r, buffer, first, last),
            CompressedStorage::CSC => self.inner_dense(r, buffer, first, last, work),
        }
    }

    fn column_into<'a>(
        &'a self,
        c: usize,
        buffer: &'a mut [N],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
    ) -> &'a [N] {
        debug_assert!(c < self.ncols);
        debug_assert!(first <= last && last <= self.nrows);
        match self.storage {
            CompressedStorage::CSR => self.inner_dense(c, buffer, first, last, work),
            CompressedStorage::CSC => self.outer_dense(c, buffer, first, last),
        }
    }

    fn sparse_row_into<'a>(
        &'a self,
        r: usize,
        vbuf: &'a mut [N],
        ibuf: &'a mut [I],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
        _sorted: bool,
    ) -> SparseRange<'a, N, I> {
        debug_assert!(r < self.nrows);
        debug_assert!(first <= last && last <= self.ncols);
        match self.storage {
            CompressedStorage::CSR => self.outer_sparse(r, vbuf, ibuf, first, last),
            CompressedStorage::CSC => {
                self.inner_sparse(r, vbuf, ibuf, first, last, work)
            }
        }
    }

    fn sparse_column_into<'a>(
        &'a self,
        c: usize,
        vbuf: &'a mut [N],
        ibuf: &'a mut [I],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
        _sorted: bool,
    ) -> SparseRange<'a, N, I> {
        debug_assert!(c < self.ncols);
        debug_assert!(first <= last && last <= self.nrows);
        match self.storage {
            CompressedStorage::CSR => {
                self.inner_sparse(c, vbuf, ibuf, first, last, work)
            }
            CompressedStorage::CSC => self.outer_sparse(c, vbuf, ibuf, first, last),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{CompressedStorage::*, CsMatrix};
    use crate::matrix::{Matrix, Workspace};

    fn eye3() -> CsMatrix<f64, i32> {
        CsMatrix::new_csc(3, 3, vec![0, 1, 2, 3], vec![0, 1, 2], vec![1., 1., 1.])
            .unwrap()
    }

    // |1 . 2 .|
    // |. 3 . .|
    // |4 . 5 6|
    fn sample_csc() -> CsMatrix<f64, i32> {
        CsMatrix::new_csc(
            3,
            4,
            vec![0, 2, 3, 5, 6],
            vec![0, 2, 1, 0, 2, 2],
            vec![1., 4., 3., 2., 5., 6.],
        )
        .unwrap()
    }

    #[test]
    fn construction_rejects_bad_components() {
        let ok = CsMatrix::<f64, i32>::new_csr(
            3,
            3,
            vec![0, 1, 2, 3],
            vec![0, 1, 2],
            vec![1., 1., 1.],
        );
        assert!(ok.is_ok());

        // pointer array too short
        assert!(CsMatrix::<f64, i32>::new_csr(
            3,
            3,
            vec![0, 1, 2],
            vec![0, 1, 2],
            vec![1., 1., 1.],
        )
        .is_err());
        // pointer array not ending at nnz
        assert!(CsMatrix::<f64, i32>::new_csr(
            3,
            3,
            vec![0, 1, 2, 4],
            vec![0, 1, 2],
            vec![1., 1., 1.],
        )
        .is_err());
        // decreasing pointers
        assert!(CsMatrix::<f64, i32>::new_csr(
            3,
            3,
            vec![0, 2, 1, 3],
            vec![0, 1, 2],
            vec![1., 1., 1.],
        )
        .is_err());
        // index beyond the inner dimension
        assert!(CsMatrix::<f64, i32>::new_csr(
            3,
            3,
            vec![0, 1, 2, 3],
            vec![0, 1, 4],
            vec![1., 1., 1.],
        )
        .is_err());
        // non-increasing indices within a slab
        assert!(CsMatrix::<f64, i32>::new_csr(
            3,
            3,
            vec![0, 2, 3, 3],
            vec![1, 1, 2],
            vec![1., 1., 1.],
        )
        .is_err());
        // indices/data length mismatch
        assert!(CsMatrix::<f64, i32>::new_csr(
            3,
            3,
            vec![0, 1, 2, 3],
            vec![0, 1, 2],
            vec![1., 1.],
        )
        .is_err());
    }

    #[test]
    fn identity_extraction() {
        let mat = eye3();
        assert_eq!(mat.col_vec(1), vec![0., 1., 0.]);
        assert_eq!(mat.row_vec(1), vec![0., 1., 0.]);

        let mut vbuf = vec![0.0; 3];
        let mut ibuf = vec![0i32; 3];
        let range = mat.sparse_row_into(1, &mut vbuf, &mut ibuf, 0, 3, None, true);
        assert_eq!(range.indices, &[1]);
        assert_eq!(range.values, &[1.]);
    }

    #[test]
    fn outer_sparse_full_window_aliases_storage() {
        let mat = sample_csc();
        let mut vbuf = vec![0.0; 3];
        let mut ibuf = vec![0i32; 3];
        let vbuf_ptr = vbuf.as_ptr();
        let ibuf_ptr = ibuf.as_ptr();
        let range = mat.sparse_column_into(2, &mut vbuf, &mut ibuf, 0, 3, None, true);
        assert_eq!(range.values, &[2., 5.]);
        assert_eq!(range.indices, &[0, 2]);
        assert!(!std::ptr::eq(range.values.as_ptr(), vbuf_ptr));
        assert!(!std::ptr::eq(range.indices.as_ptr(), ibuf_ptr));

        // a narrower window copies into the caller's buffers
        let range = mat.sparse_column_into(2, &mut vbuf, &mut ibuf, 1, 3, None, true);
        assert_eq!(range.values, &[5.]);
        assert_eq!(range.indices, &[2]);
        assert!(std::ptr::eq(range.values.as_ptr(), vbuf_ptr));
    }

    #[test]
    fn inner_extraction_matches_outer() {
        let mat = sample_csc();
        let expected = [
            vec![1., 0., 2., 0.],
            vec![0., 3., 0., 0.],
            vec![4., 0., 5., 6.],
        ];
        for r in 0..3 {
            assert_eq!(mat.row_vec(r), expected[r]);
        }

        let mut vbuf = vec![0.0; 4];
        let mut ibuf = vec![0i32; 4];
        let range = mat.sparse_row_into(2, &mut vbuf, &mut ibuf, 0, 4, None, true);
        assert_eq!(range.values, &[4., 5., 6.]);
        assert_eq!(range.indices, &[0, 2, 3]);
    }

    #[test]
    fn windows_match_full_extraction() {
        let mat = sample_csc();
        for r in 0..3 {
            let full = mat.row_vec(r);
            let mut buf = vec![0.0; 4];
            let out = mat.row_into(r, &mut buf, 1, 3, None);
            assert_eq!(out, &full[1..3]);
        }
    }

    #[test]
    fn workspace_axis_assignment() {
        let csc = sample_csc();
        assert!(csc.new_workspace(false).is_none());
        let work = csc.new_workspace(true);
        match work {
            Some(Workspace::Compressed(c)) => assert_eq!(c.offsets(), &csc.indptr()[..4]),
            _ => panic!("expected a cursor workspace"),
        }

        let csr = CsMatrix::<f64, i32>::new_csr(
            3,
            3,
            vec![0, 1, 2, 3],
            vec![0, 1, 2],
            vec![1., 1., 1.],
        )
        .unwrap();
        assert!(csr.new_workspace(true).is_none());
        assert!(csr.new_workspace(false).is_some());
    }

    #[test]
    fn workspace_is_only_an_optimization() {
        let mat = sample_csc();
        let sweep = |work: &mut Option<Workspace>| {
            let mut got = Vec::new();
            let mut buf = vec![0.0; 4];
            for r in 0..3 {
                got.push(mat.row_into(r, &mut buf, 0, 4, work.as_mut()).to_vec());
            }
            for r in (0..3).rev() {
                got.push(mat.row_into(r, &mut buf, 0, 4, work.as_mut()).to_vec());
            }
            for r in (0..3).step_by(2) {
                got.push(mat.row_into(r, &mut buf, 0, 4, work.as_mut()).to_vec());
            }
            got
        };
        let mut with = mat.new_workspace(true);
        let mut without = None;
        assert_eq!(sweep(&mut with), sweep(&mut without));

        // the sweep must actually have moved the cursors
        match with {
            Some(Workspace::Compressed(ref c)) => {
                assert_ne!(c.offsets(), &mat.indptr()[..4])
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn storage_transposition() {
        assert_eq!(CSR.other_storage(), CSC);
        assert_eq!(CSC.other_storage(), CSR);
    }
}
