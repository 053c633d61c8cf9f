//! Layered loading of Matrix Market data.
//!
//! Counting data is dominated by small values, so storing every entry as a
//! wide integer wastes memory. The layered loader buckets each row by the
//! magnitude of its largest value (fits in `u8`, in `u16`, or needs `u32`)
//! and builds one column-compressed storage per bucket at the narrowest
//! sufficient width. The buckets are hidden behind [`LayeredMatrix`], a
//! single `f64`-valued matrix whose rows are grouped by bucket; a row
//! permutation maps original row numbers to their grouped positions.
//!
//! Categorization happens in a first pass over the document
//! ([`LineAssignments`]); the build pass then reads it a second time, so
//! the layered entry points need a rereadable source.

use std::fs::File;
use std::io;
use std::io::BufRead;
use std::path::Path;

use num_traits::cast;

use crate::content::Value;
use crate::errors::AnymatError;
use crate::indexing::MatIndex;
use crate::io::{parse, MarketHeader, MmSink};
use crate::matrix::{Matrix, SparseRange, Workspace};
use crate::sparse::compressed::{
    lookup_binary, lookup_with_cursor, window_of_slab, CompressedStorage, CsMatrix,
    SecondaryCursors,
};
use crate::sparse::triplet::compress_sparse_triplets;

/// Upper value bound of category 0: rows fitting in `u8`.
const MAX_U8: u64 = u8::MAX as u64;
/// Upper value bound of category 1: rows fitting in `u16`.
const MAX_U16: u64 = u16::MAX as u64;
/// The largest row count whose local row indices still fit in `u16`:
/// `2^16` rows index positions `0..=65535`.
const MAX_U16_ROWS: usize = u16::MAX as usize + 1;

/// The per-row bucketing computed by the layered pre-pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAssignments {
    /// Magnitude bucket of each input row: 0 fits `u8`, 1 fits `u16`,
    /// 2 needs `u32`. Rows without stored entries land in bucket 0.
    pub category: Vec<u8>,
    /// The number of non-zero data lines per bucket.
    pub lines_per_category: [usize; 3],
    /// The number of rows per bucket.
    pub rows_per_category: [usize; 3],
    /// Maps an input row index to its position in the grouped matrix.
    /// Buckets appear in order, and rows keep their input order within a
    /// bucket, so this is a bijection on `0..nrow`.
    pub permutation: Vec<usize>,
}

/// First parsing pass: track the maximum value and line count of each row.
#[derive(Default)]
struct AssignmentSink {
    nrow: usize,
    row_max: Vec<u64>,
    row_lines: Vec<usize>,
}

impl MmSink for AssignmentSink {
    fn dimensions(&mut self, header: MarketHeader) -> Result<(), AnymatError> {
        self.nrow = header.nrow;
        self.row_max = vec![0; header.nrow];
        self.row_lines = vec![0; header.nrow];
        Ok(())
    }

    fn line(&mut self, row: usize, _col: usize, value: u64) -> Result<(), AnymatError> {
        if value != 0 {
            self.row_max[row] = self.row_max[row].max(value);
            self.row_lines[row] += 1;
        }
        Ok(())
    }
}

fn category_of(max: u64) -> u8 {
    if max <= MAX_U8 {
        0
    } else if max <= MAX_U16 {
        1
    } else {
        2
    }
}

impl AssignmentSink {
    fn finish(self) -> LineAssignments {
        let category: Vec<u8> = self.row_max.iter().map(|&m| category_of(m)).collect();

        let mut lines_per_category = [0usize; 3];
        let mut rows_per_category = [0usize; 3];
        for (r, &cat) in category.iter().enumerate() {
            lines_per_category[cat as usize] += self.row_lines[r];
            rows_per_category[cat as usize] += 1;
        }

        let mut offsets = [0usize; 3];
        offsets[1] = rows_per_category[0];
        offsets[2] = rows_per_category[0] + rows_per_category[1];

        let mut seen = [0usize; 3];
        let mut permutation = vec![0usize; self.nrow];
        for (r, &cat) in category.iter().enumerate() {
            permutation[r] = offsets[cat as usize] + seen[cat as usize];
            seen[cat as usize] += 1;
        }

        LineAssignments {
            category,
            lines_per_category,
            rows_per_category,
            permutation,
        }
    }
}

/// Compute the layered pre-pass over an in-memory document.
pub fn line_assignments_from_buffer(buffer: &[u8]) -> Result<LineAssignments, AnymatError> {
    line_assignments(&mut &buffer[..])
}

/// Compute the layered pre-pass over any byte reader.
pub fn line_assignments<R: BufRead>(reader: &mut R) -> Result<LineAssignments, AnymatError> {
    let mut sink = AssignmentSink::default();
    parse(reader, &mut sink)?;
    Ok(sink.finish())
}

/// Second parsing pass: route each entry to its bucket's triplet store,
/// with the row renumbered to its local position inside the bucket.
struct BuilderSink<'a> {
    assignments: &'a LineAssignments,
    offsets: [usize; 3],
    ncol: usize,
    values: [Vec<u32>; 3],
    rows: [Vec<u32>; 3],
    cols: [Vec<u32>; 3],
}

impl<'a> BuilderSink<'a> {
    fn new(assignments: &'a LineAssignments) -> Self {
        let offsets = [
            0,
            assignments.rows_per_category[0],
            assignments.rows_per_category[0] + assignments.rows_per_category[1],
        ];
        BuilderSink {
            assignments,
            offsets,
            ncol: 0,
            values: Default::default(),
            rows: Default::default(),
            cols: Default::default(),
        }
    }
}

impl MmSink for BuilderSink<'_> {
    fn dimensions(&mut self, header: MarketHeader) -> Result<(), AnymatError> {
        self.ncol = header.ncol;
        Ok(())
    }

    fn line(&mut self, row: usize, col: usize, value: u64) -> Result<(), AnymatError> {
        if value == 0 {
            return Ok(());
        }
        let cat = self.assignments.category[row] as usize;
        let local = self.assignments.permutation[row] - self.offsets[cat];
        self.values[cat].push(value as u32);
        self.rows[cat].push(local as u32);
        self.cols[cat].push(col as u32);
        Ok(())
    }
}

/// One magnitude bucket of a [`LayeredMatrix`]: a column-compressed
/// storage at the narrowest width holding that bucket's values.
#[derive(Debug, Clone)]
enum LayerStore<I: MatIndex> {
    U8(CsMatrix<u8, I>),
    U16(CsMatrix<u16, I>),
    U32(CsMatrix<u32, I>),
}

#[derive(Debug, Clone)]
struct Layer<I: MatIndex> {
    /// The grouped row index of this bucket's first row.
    offset: usize,
    store: LayerStore<I>,
}

macro_rules! with_store {
    ($layer: expr, $m: ident => $body: expr) => {
        match &$layer.store {
            LayerStore::U8($m) => $body,
            LayerStore::U16($m) => $body,
            LayerStore::U32($m) => $body,
        }
    };
}

/// A column-compressed `f64` matrix backed by up to three narrow-integer
/// buckets stacked along the row axis.
///
/// Built by the layered Matrix Market loader; rows are grouped by
/// magnitude bucket, so callers translate row numbers through the loader's
/// permutation.
#[derive(Debug, Clone)]
pub struct LayeredMatrix<I: MatIndex = u16> {
    nrows: usize,
    ncols: usize,
    layers: Vec<Layer<I>>,
}

impl<I: MatIndex> LayeredMatrix<I> {
    fn layer_rows(layer: &Layer<I>) -> usize {
        with_store!(layer, m => m.nrow())
    }

    /// The layer holding grouped row `r`, with the row renumbered locally.
    fn locate(&self, r: usize) -> (usize, usize) {
        for (idx, layer) in self.layers.iter().enumerate() {
            let n = Self::layer_rows(layer);
            if r < layer.offset + n {
                return (idx, r - layer.offset);
            }
        }
        unreachable!("row {} beyond the layered row space", r)
    }
}

impl<I: MatIndex> Matrix<f64> for LayeredMatrix<I> {
    type Index = i32;

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
        false
    }

    fn new_workspace(&self, row_axis: bool) -> Option<Workspace> {
        if !row_axis {
            return None;
        }
        let per_layer = self
            .layers
            .iter()
            .map(|layer| {
                let indptr = with_store!(layer, m => m.indptr());
                Workspace::Compressed(SecondaryCursors::new(indptr))
            })
            .collect();
        Some(Workspace::Layered(per_layer))
    }

    fn row_into<'a>(
        &'a self,
        r: usize,
        buffer: &'a mut [f64],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
    ) -> &'a [f64] {
        debug_assert!(r < self.nrows);
        debug_assert!(first <= last && last <= self.ncols);
        let n = last - first;
        for slot in buffer[..n].iter_mut() {
            *slot = 0.0;
        }
        let (idx, local) = self.locate(r);
        let layer = &self.layers[idx];
        let cursors = layer_cursors(work, idx);
        with_store!(layer, m => {
            let indptr = m.indptr();
            let indices = m.indices();
            let forward = cursors
                .as_ref()
                .map_or(false, |c| c.last.map_or(true, |l| local >= l));
            match cursors {
                Some(cursors) => {
                    for p in first..last {
                        let (lo, hi) = (indptr[p], indptr[p + 1]);
                        let cur = &mut cursors.offsets[p];
                        if let Some(k) =
                            lookup_with_cursor(indices, lo, hi, local, cur, forward)
                        {
                            buffer[p - first] = cast(m.data()[k]).unwrap();
                        }
                    }
                    cursors.last = Some(local);
                }
                None => {
                    for p in first..last {
                        let (lo, hi) = (indptr[p], indptr[p + 1]);
                        if let Some(k) = lookup_binary(indices, lo, hi, local) {
                            buffer[p - first] = cast(m.data()[k]).unwrap();
                        }
                    }
                }
            }
        });
        &buffer[..n]
    }

    fn column_into<'a>(
        &'a self,
        c: usize,
        buffer: &'a mut [f64],
        first: usize,
        last: usize,
        _work: Option<&mut Workspace>,
    ) -> &'a [f64] {
        debug_assert!(c < self.ncols);
        debug_assert!(first <= last && last <= self.nrows);
        let n = last - first;
        for slot in buffer[..n].iter_mut() {
            *slot = 0.0;
        }
        for layer in self.layers.iter() {
            let nrows = Self::layer_rows(layer);
            let lfirst = first.saturating_sub(layer.offset).min(nrows);
            let llast = last.saturating_sub(layer.offset).min(nrows);
            if lfirst >= llast {
                continue;
            }
            with_store!(layer, m => {
                let (lo, hi) = (m.indptr()[c], m.indptr()[c + 1]);
                let (l, h) = window_of_slab(m.indices(), lo, hi, lfirst, llast);
                for k in l..h {
                    let row = layer.offset + m.indices()[k].index();
                    buffer[row - first] = cast(m.data()[k]).unwrap();
                }
            });
        }
        &buffer[..n]
    }

    fn sparse_row_into<'a>(
        &'a self,
        r: usize,
        vbuf: &'a mut [f64],
        ibuf: &'a mut [i32],
        first: usize,
        last: usize,
        work: Option<&mut Workspace>,
        _sorted: bool,
    ) -> SparseRange<'a, f64, i32> {
        debug_assert!(r < self.nrows);
        debug_assert!(first <= last && last <= self.ncols);
        let (idx, local) = self.locate(r);
        let layer = &self.layers[idx];
        let cursors = layer_cursors(work, idx);
        let mut n = 0;
        with_store!(layer, m => {
            let indptr = m.indptr();
            let indices = m.indices();
            let forward = cursors
                .as_ref()
                .map_or(false, |c| c.last.map_or(true, |l| local >= l));
            match cursors {
                Some(cursors) => {
                    for p in first..last {
                        let (lo, hi) = (indptr[p], indptr[p + 1]);
                        let cur = &mut cursors.offsets[p];
                        if let Some(k) =
                            lookup_with_cursor(indices, lo, hi, local, cur, forward)
                        {
                            vbuf[n] = cast(m.data()[k]).unwrap();
                            ibuf[n] = i32::from_usize(p);
                            n += 1;
                        }
                    }
                    cursors.last = Some(local);
                }
                None => {
                    for p in first..last {
                        let (lo, hi) = (indptr[p], indptr[p + 1]);
                        if let Some(k) = lookup_binary(indices, lo, hi, local) {
                            vbuf[n] = cast(m.data()[k]).unwrap();
                            ibuf[n] = i32::from_usize(p);
                            n += 1;
                        }
                    }
                }
            }
        });
        SparseRange::new(&vbuf[..n], &ibuf[..n])
    }

    fn sparse_column_into<'a>(
        &'a self,
        c: usize,
        vbuf: &'a mut [f64],
        ibuf: &'a mut [i32],
        first: usize,
        last: usize,
        _work: Option<&mut Workspace>,
        _sorted: bool,
    ) -> SparseRange<'a, f64, i32> {
        debug_assert!(c < self.ncols);
        debug_assert!(first <= last && last <= self.nrows);
        let mut n = 0;
        // layers are stacked in row order, so the output stays sorted
        for layer in self.layers.iter() {
            let nrows = Self::layer_rows(layer);
            let lfirst = first.saturating_sub(layer.offset).min(nrows);
            let llast = last.saturating_sub(layer.offset).min(nrows);
            if lfirst >= llast {
                continue;
            }
            with_store!(layer, m => {
                let (lo, hi) = (m.indptr()[c], m.indptr()[c + 1]);
                let (l, h) = window_of_slab(m.indices(), lo, hi, lfirst, llast);
                for k in l..h {
                    vbuf[n] = cast(m.data()[k]).unwrap();
                    ibuf[n] = i32::from_usize(layer.offset + m.indices()[k].index());
                    n += 1;
                }
            });
        }
        SparseRange::new(&vbuf[..n], &ibuf[..n])
    }
}

fn layer_cursors<'w>(
    work: Option<&'w mut Workspace>,
    layer: usize,
) -> Option<&'w mut SecondaryCursors> {
    debug_assert!(
        matches!(&work, None | Some(Workspace::Layered(_))),
        "workspace was not created by this matrix",
    );
    match work {
        Some(Workspace::Layered(per_layer)) => match per_layer.get_mut(layer) {
            Some(Workspace::Compressed(c)) => Some(c),
            _ => None,
        },
        _ => None,
    }
}

/// The result of a layered load: the grouped matrix plus the row
/// permutation relating it to the input.
///
/// `matrix.row(permutation[i])` reproduces row `i` of the document.
pub struct LayeredLoad {
    pub matrix: Box<dyn Matrix<f64, Index = i32> + Send + Sync>,
    pub permutation: Vec<usize>,
}

fn build_layer<N, I>(
    nrows: usize,
    ncols: usize,
    values: Vec<u32>,
    mut rows: Vec<u32>,
    mut cols: Vec<u32>,
) -> Result<CsMatrix<N, I>, AnymatError>
where
    N: Value,
    I: MatIndex,
{
    let mut narrowed: Vec<N> = values
        .into_iter()
        .map(|v| cast(v).unwrap())
        .collect();
    let indptr = compress_sparse_triplets(
        CompressedStorage::CSC,
        nrows,
        ncols,
        &mut narrowed,
        &mut rows,
        &mut cols,
    )?;
    let indices: Vec<I> = rows.iter().map(|&r| I::from_usize(r as usize)).collect();
    CsMatrix::new_csc(nrows, ncols, indptr, indices, narrowed)
}

fn build_layered<I, R>(
    reader: &mut R,
    assignments: &LineAssignments,
    ncol: usize,
) -> Result<LayeredMatrix<I>, AnymatError>
where
    I: MatIndex,
    R: BufRead,
{
    let mut sink = BuilderSink::new(assignments);
    parse(reader, &mut sink)?;

    let nrows_total = assignments.permutation.len();
    let offsets = sink.offsets;
    let BuilderSink {
        values, rows, cols, ..
    } = sink;

    let mut layers = Vec::new();
    for (cat, ((values, rows), cols)) in values
        .into_iter()
        .zip(rows.into_iter())
        .zip(cols.into_iter())
        .enumerate()
    {
        let nrows = assignments.rows_per_category[cat];
        if nrows == 0 {
            continue;
        }
        let store = match cat {
            0 => LayerStore::U8(build_layer(nrows, ncol, values, rows, cols)?),
            1 => LayerStore::U16(build_layer(nrows, ncol, values, rows, cols)?),
            _ => LayerStore::U32(build_layer(nrows, ncol, values, rows, cols)?),
        };
        layers.push(Layer {
            offset: offsets[cat],
            store,
        });
    }

    Ok(LayeredMatrix {
        nrows: nrows_total,
        ncols: ncol,
        layers,
    })
}

/// Load a Matrix Market document into a layered matrix.
///
/// Runs the categorization pass and the build pass over the same buffer.
/// Past 2^16 rows the internal row indices widen from 16 to 32 bits; the
/// surfaced matrix is `f64`-valued either way.
pub fn load_layered_matrix_from_buffer(buffer: &[u8]) -> Result<LayeredLoad, AnymatError> {
    let assignments = line_assignments_from_buffer(buffer)?;
    let header = crate::io::inspect_header_from_buffer(buffer)?;
    let matrix: Box<dyn Matrix<f64, Index = i32> + Send + Sync> =
        if header.nrow > MAX_U16_ROWS {
            Box::new(build_layered::<u32, _>(
                &mut &buffer[..],
                &assignments,
                header.ncol,
            )?)
        } else {
            Box::new(build_layered::<u16, _>(
                &mut &buffer[..],
                &assignments,
                header.ncol,
            )?)
        };
    Ok(LayeredLoad {
        matrix,
        permutation: assignments.permutation,
    })
}

/// Load a Matrix Market file into a layered matrix, reading it twice.
pub fn load_layered_matrix_from_path<P: AsRef<Path>>(
    path: P,
) -> Result<LayeredLoad, AnymatError> {
    let path = path.as_ref();
    let open = |p: &Path| -> Result<io::BufReader<File>, AnymatError> {
        File::open(p)
            .map(io::BufReader::new)
            .map_err(|e| AnymatError::ParseError(format!("cannot open file: {}", e)))
    };
    let assignments = line_assignments(&mut open(path)?)?;
    let header = crate::io::inspect_header(&mut open(path)?)?;
    let matrix: Box<dyn Matrix<f64, Index = i32> + Send + Sync> =
        if header.nrow > MAX_U16_ROWS {
            Box::new(build_layered::<u32, _>(
                &mut open(path)?,
                &assignments,
                header.ncol,
            )?)
        } else {
            Box::new(build_layered::<u16, _>(
                &mut open(path)?,
                &assignments,
                header.ncol,
            )?)
        };
    Ok(LayeredLoad {
        matrix,
        permutation: assignments.permutation,
    })
}

#[cfg(test)]
mod test {
    use super::{line_assignments_from_buffer, load_layered_matrix_from_buffer};
    use crate::content::ContentType;
    use crate::io::load_matrix_from_buffer;
    use crate::matrix::Matrix;

    fn render(nr: usize, nc: usize, entries: &[(usize, usize, u64)]) -> String {
        let mut out = format!("% layered test data\n{} {} {}\n", nr, nc, entries.len());
        for &(r, c, v) in entries {
            out.push_str(&format!("{} {} {}\n", r + 1, c + 1, v));
        }
        out
    }

    // rows with maxima {200, 300, 80000, 50}: buckets {0, 1, 2, 0}
    fn sample() -> String {
        render(
            4,
            3,
            &[
                (0, 0, 200),
                (0, 2, 3),
                (1, 1, 300),
                (1, 0, 2),
                (2, 2, 80000),
                (3, 1, 50),
            ],
        )
    }

    #[test]
    fn categories_and_permutation() {
        let ass = line_assignments_from_buffer(sample().as_bytes()).unwrap();
        assert_eq!(ass.category, vec![0, 1, 2, 0]);
        assert_eq!(ass.rows_per_category, [2, 1, 1]);
        assert_eq!(ass.lines_per_category, [3, 2, 1]);
        // buckets in order {0, 1, 2}, input order kept within a bucket
        assert_eq!(ass.permutation, vec![0, 2, 3, 1]);
    }

    #[test]
    fn permuted_rows_reproduce_the_input() {
        let text = sample();
        let reference = load_matrix_from_buffer(text.as_bytes()).unwrap();
        let loaded = load_layered_matrix_from_buffer(text.as_bytes()).unwrap();

        assert_eq!(loaded.matrix.nrow(), 4);
        assert_eq!(loaded.matrix.ncol(), 3);
        assert!(loaded.matrix.is_sparse());
        assert!(!loaded.matrix.prefers_rows());
        // the narrow internal storages stay hidden behind an f64 surface
        assert_eq!(loaded.matrix.content_type(), ContentType::Float64);

        for i in 0..4 {
            assert_eq!(
                loaded.matrix.row_vec(loaded.permutation[i]),
                reference.row_vec(i),
            );
        }
        for c in 0..3 {
            let mut expected = reference.col_vec(c);
            // permute the reference column into the grouped row space
            let plain = expected.clone();
            for (i, &p) in loaded.permutation.iter().enumerate() {
                expected[p] = plain[i];
            }
            assert_eq!(loaded.matrix.col_vec(c), expected);
        }
    }

    #[test]
    fn zero_entries_do_not_count() {
        // the zero is deliberate, it must be dropped everywhere
        let text = render(3, 2, &[(0, 0, 0), (1, 1, 7), (2, 0, 70000)]);
        let ass = line_assignments_from_buffer(text.as_bytes()).unwrap();
        assert_eq!(ass.category, vec![0, 0, 2]);
        assert_eq!(ass.lines_per_category, [1, 0, 1]);
        assert_eq!(ass.rows_per_category, [2, 0, 1]);

        let loaded = load_layered_matrix_from_buffer(text.as_bytes()).unwrap();
        assert_eq!(loaded.matrix.row_vec(loaded.permutation[0]), vec![0., 0.]);
        let mut vbuf = vec![0.0; 3];
        let mut ibuf = vec![0i32; 3];
        let range = loaded
            .matrix
            .sparse_column_into(0, &mut vbuf, &mut ibuf, 0, 3, None, true);
        assert_eq!(range.len(), 1);
        assert_eq!(range.values, &[70000.]);
    }

    #[test]
    fn row_workspace_round_trips() {
        let text = sample();
        let loaded = load_layered_matrix_from_buffer(text.as_bytes()).unwrap();
        let mut work = loaded.matrix.new_workspace(true);
        assert!(work.is_some());
        assert!(loaded.matrix.new_workspace(false).is_none());

        let mut buf = vec![0.0; 3];
        let mut expected = Vec::new();
        for r in 0..4 {
            expected.push(loaded.matrix.row_vec(r));
        }
        for r in 0..4 {
            let got = loaded
                .matrix
                .row_into(r, &mut buf, 0, 3, work.as_mut())
                .to_vec();
            assert_eq!(got, expected[r]);
        }
        for r in (0..4).rev() {
            let got = loaded
                .matrix
                .row_into(r, &mut buf, 0, 3, work.as_mut())
                .to_vec();
            assert_eq!(got, expected[r]);
        }
    }

    #[test]
    fn missing_buckets_are_skipped() {
        // only u16-sized values
        let text = render(3, 3, &[(0, 0, 1000), (1, 1, 2000), (2, 2, 3000)]);
        let ass = line_assignments_from_buffer(text.as_bytes()).unwrap();
        assert_eq!(ass.rows_per_category, [0, 3, 0]);

        let loaded = load_layered_matrix_from_buffer(text.as_bytes()).unwrap();
        let reference = load_matrix_from_buffer(text.as_bytes()).unwrap();
        for i in 0..3 {
            assert_eq!(
                loaded.matrix.row_vec(loaded.permutation[i]),
                reference.row_vec(i),
            );
        }
    }

    #[test]
    fn empty_documents() {
        // no columns at all
        let loaded = load_layered_matrix_from_buffer(b"%%\n1000 0 0").unwrap();
        assert_eq!(loaded.matrix.nrow(), 1000);
        assert_eq!(loaded.matrix.ncol(), 0);
        for (i, &p) in loaded.permutation.iter().enumerate() {
            assert_eq!(p, i);
        }

        // columns but no values
        let loaded = load_layered_matrix_from_buffer(b"%%\n1000 10 0").unwrap();
        assert_eq!(loaded.matrix.nrow(), 1000);
        assert_eq!(loaded.matrix.ncol(), 10);
        let mut vbuf = vec![0.0; 10];
        let mut ibuf = vec![0i32; 10];
        for r in [0usize, 500, 999] {
            let range = loaded
                .matrix
                .sparse_row_into(r, &mut vbuf, &mut ibuf, 0, 10, None, true);
            assert_eq!(range.len(), 0);
        }
    }

    #[test]
    fn widening_boundary_sits_at_two_to_the_sixteen_rows() {
        // 2^16 rows still fit u16 local indices; every row lands in bucket
        // 0, so the last entry exercises the largest representable index
        let nr = 1 << 16;
        let entries = [(0usize, 0usize, 9u64), (nr - 1, 1, 200)];
        let text = render(nr, 2, &entries);
        let loaded = load_layered_matrix_from_buffer(text.as_bytes()).unwrap();
        let reference = load_matrix_from_buffer(text.as_bytes()).unwrap();
        for &(r, _, _) in entries.iter() {
            assert_eq!(
                loaded.matrix.row_vec(loaded.permutation[r]),
                reference.row_vec(r),
            );
        }

        // one row more and the local indices must widen
        let nr = (1 << 16) + 1;
        let entries = [(0usize, 0usize, 9u64), (nr - 1, 1, 200)];
        let text = render(nr, 2, &entries);
        let loaded = load_layered_matrix_from_buffer(text.as_bytes()).unwrap();
        let reference = load_matrix_from_buffer(text.as_bytes()).unwrap();
        for &(r, _, _) in entries.iter() {
            assert_eq!(
                loaded.matrix.row_vec(loaded.permutation[r]),
                reference.row_vec(r),
            );
        }
    }

    #[test]
    fn many_rows_widen_the_indices() {
        // past the 16-bit limit, checking the dispatch to wider row indices
        let nr = 70000;
        let entries = [
            (0usize, 0usize, 5u64),
            (42, 1, 600),
            (65535, 2, 70000),
            (65536, 0, 1),
            (69999, 1, 12),
        ];
        let text = render(nr, 3, &entries);
        let loaded = load_layered_matrix_from_buffer(text.as_bytes()).unwrap();
        let reference = load_matrix_from_buffer(text.as_bytes()).unwrap();
        assert_eq!(loaded.matrix.nrow(), nr);
        for &(r, _, _) in entries.iter() {
            assert_eq!(
                loaded.matrix.row_vec(loaded.permutation[r]),
                reference.row_vec(r),
            );
        }
    }
}
