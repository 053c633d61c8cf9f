//! High level construction of compressed matrices from other matrices.

use crate::content::Value;
use crate::errors::AnymatError;
use crate::indexing::MatIndex;
use crate::matrix::Matrix;
use crate::sparse::compressed::{CompressedStorage, CsMatrix};
use crate::sparse::triplet::compress_sparse_triplets;

/// Materialize any matrix into compressed storage.
///
/// Streams the axis that becomes the outer dimension of the requested
/// `storage`, holding a workspace so that engines with streaming state stay
/// linear. Stored zeros of the source are not carried over.
pub fn convert_to_compressed<T, I, M>(
    mat: &M,
    storage: CompressedStorage,
) -> Result<CsMatrix<T, I>, AnymatError>
where
    T: Value,
    I: MatIndex,
    M: Matrix<T, Index = I> + ?Sized,
{
    let (nr, nc) = (mat.nrow(), mat.ncol());
    let mut values: Vec<T> = Vec::new();
    let mut rows: Vec<I> = Vec::new();
    let mut cols: Vec<I> = Vec::new();

    match storage {
        CompressedStorage::CSR => {
            let mut work = mat.new_workspace(true);
            let mut vbuf = vec![T::zero(); nc];
            let mut ibuf = vec![I::default(); nc];
            for r in 0..nr {
                let range =
                    mat.sparse_row_into(r, &mut vbuf, &mut ibuf, 0, nc, work.as_mut(), true);
                for (&v, &i) in range.values.iter().zip(range.indices.iter()) {
                    if v != T::zero() {
                        values.push(v);
                        rows.push(I::from_usize(r));
                        cols.push(i);
                    }
                }
            }
        }
        CompressedStorage::CSC => {
            let mut work = mat.new_workspace(false);
            let mut vbuf = vec![T::zero(); nr];
            let mut ibuf = vec![I::default(); nr];
            for c in 0..nc {
                let range = mat.sparse_column_into(
                    c,
                    &mut vbuf,
                    &mut ibuf,
                    0,
                    nr,
                    work.as_mut(),
                    true,
                );
                for (&v, &i) in range.values.iter().zip(range.indices.iter()) {
                    if v != T::zero() {
                        values.push(v);
                        rows.push(i);
                        cols.push(I::from_usize(c));
                    }
                }
            }
        }
    }

    let indptr =
        compress_sparse_triplets(storage, nr, nc, &mut values, &mut rows, &mut cols)?;
    let indices = match storage {
        CompressedStorage::CSR => cols,
        CompressedStorage::CSC => rows,
    };
    CsMatrix::new(storage, nr, nc, indptr, indices, values)
}

#[cfg(test)]
mod test {
    use super::convert_to_compressed;
    use crate::dense::DenseMatrix;
    use crate::matrix::Matrix;
    use crate::sparse::compressed::CompressedStorage::{CSC, CSR};

    #[test]
    fn dense_to_compressed_round_trip() {
        let source = vec![
            0., 2., 0., 0., //
            1., 0., 0., 3., //
            0., 0., 0., 0., //
        ];
        let dense = DenseMatrix::new_row_major(3, 4, source).unwrap();
        let csc = convert_to_compressed(&dense, CSC).unwrap();
        let csr = convert_to_compressed(&dense, CSR).unwrap();

        assert_eq!(csc.nnz(), 3);
        assert_eq!(csr.nnz(), 3);
        for r in 0..3 {
            let expected = dense.row_vec(r);
            assert_eq!(csc.row_vec(r), expected);
            assert_eq!(csr.row_vec(r), expected);
        }
    }
}
