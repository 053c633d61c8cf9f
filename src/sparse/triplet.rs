//! Compression of triplet data into the compressed sparse format.
//!
//! Triplets are the natural format when assembling a matrix entry by entry,
//! but not for computations; [`compress_sparse_triplets`] reorders them in
//! place into the slab layout consumed by
//! [`CsMatrix`](crate::sparse::CsMatrix).

use crate::content::Value;
use crate::errors::AnymatError;
use crate::indexing::MatIndex;
use crate::sparse::compressed::CompressedStorage;

/// Compress triplet data in place and return the slab pointer array.
///
/// Explicit zeros are dropped, then the three parallel vectors are
/// stable-sorted by `(row, column)` for [`CompressedStorage::CSR`] or
/// `(column, row)` for [`CompressedStorage::CSC`]. The returned pointer
/// array has one entry per outer slab plus one, ending at the number of
/// surviving entries.
///
/// Fails with `InvalidInput` on an out-of-range coordinate or a coordinate
/// that appears twice, and with `InvalidShape` when the vector lengths
/// disagree.
pub fn compress_sparse_triplets<N: Value, I: MatIndex>(
    storage: CompressedStorage,
    nrows: usize,
    ncols: usize,
    values: &mut Vec<N>,
    rows: &mut Vec<I>,
    cols: &mut Vec<I>,
) -> Result<Vec<usize>, AnymatError> {
    if values.len() != rows.len() || values.len() != cols.len() {
        return Err(AnymatError::InvalidShape(format!(
            "triplet vectors of lengths {}, {} and {} do not match",
            values.len(),
            rows.len(),
            cols.len(),
        )));
    }
    for r in rows.iter() {
        if r.index() >= nrows {
            return Err(AnymatError::InvalidInput(format!(
                "row index {} exceeds the row count {}",
                r.index(),
                nrows,
            )));
        }
    }
    for c in cols.iter() {
        if c.index() >= ncols {
            return Err(AnymatError::InvalidInput(format!(
                "column index {} exceeds the column count {}",
                c.index(),
                ncols,
            )));
        }
    }

    // drop explicit zeros, keeping the three vectors parallel
    let mut kept = 0;
    for k in 0..values.len() {
        if values[k] != N::zero() {
            values[kept] = values[k];
            rows[kept] = rows[k];
            cols[kept] = cols[k];
            kept += 1;
        }
    }
    values.truncate(kept);
    rows.truncate(kept);
    cols.truncate(kept);

    let key = |k: usize| -> (usize, usize) {
        match storage {
            CompressedStorage::CSR => (rows[k].index(), cols[k].index()),
            CompressedStorage::CSC => (cols[k].index(), rows[k].index()),
        }
    };

    let mut order: Vec<usize> = (0..kept).collect();
    order.sort_by_key(|&k| key(k));

    for w in order.windows(2) {
        if key(w[0]) == key(w[1]) {
            return Err(AnymatError::InvalidInput(format!(
                "duplicate entry at ({}, {})",
                rows[w[0]].index(),
                cols[w[0]].index(),
            )));
        }
    }

    let sorted_values: Vec<N> = order.iter().map(|&k| values[k]).collect();
    let sorted_rows: Vec<I> = order.iter().map(|&k| rows[k]).collect();
    let sorted_cols: Vec<I> = order.iter().map(|&k| cols[k]).collect();
    *values = sorted_values;
    *rows = sorted_rows;
    *cols = sorted_cols;

    let outer_inds = match storage {
        CompressedStorage::CSR => &rows[..],
        CompressedStorage::CSC => &cols[..],
    };
    let outer = match storage {
        CompressedStorage::CSR => nrows,
        CompressedStorage::CSC => ncols,
    };
    let mut indptr = vec![0usize; outer + 1];
    for p in outer_inds.iter() {
        indptr[p.index() + 1] += 1;
    }
    for p in 1..=outer {
        indptr[p] += indptr[p - 1];
    }
    Ok(indptr)
}
