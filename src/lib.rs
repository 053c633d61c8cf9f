/*!
# anymat

anymat provides uniform, value-level access to two-dimensional numeric
matrices whose physical layout may be dense or sparse, row- or
column-oriented, and possibly composed through delayed transformations.
Statistics and reduction routines iterate matrices one row or column at a
time through the [`Matrix`] trait without knowing the storage; engines
that keep streaming state hand it to callers as an opaque [`Workspace`].

## Examples

Extracting from a compressed sparse matrix:

```rust
use anymat::{CsMatrix, Matrix};

let eye = CsMatrix::<f64, i32>::new_csc(
    3, 3,
    vec![0, 1, 2, 3],
    vec![0, 1, 2],
    vec![1., 1., 1.],
).unwrap();
assert_eq!(eye.row_vec(1), vec![0., 1., 0.]);
assert_eq!(eye.col_vec(2), vec![0., 0., 1.]);
```

Delayed subsetting, with duplicate and out-of-order indices:

```rust
use std::sync::Arc;
use anymat::{DelayedSubset, DenseMatrix, Matrix};

let base = Arc::new(DenseMatrix::new_row_major(2, 2, vec![1., 2., 3., 4.]).unwrap());
let sub = DelayedSubset::rows(base, vec![1, 0, 1]).unwrap();
assert_eq!(sub.col_vec(0), vec![3., 1., 3.]);
```

Loading a Matrix Market document:

```rust
use anymat::io::load_matrix_from_buffer;
use anymat::Matrix;

let mat = load_matrix_from_buffer(b"% demo\n2 2 2\n1 1 5\n2 2 8\n").unwrap();
assert_eq!(mat.row_vec(0), vec![5., 0.]);
```
*/

pub mod content;
pub mod dense;
pub mod errors;
pub mod indexing;
pub mod io;
pub mod matrix;
pub mod sparse;
pub mod subset;

pub use crate::content::{ContentType, TypedValue, Value};
pub use crate::dense::DenseMatrix;
pub use crate::errors::AnymatError;
pub use crate::indexing::MatIndex;
pub use crate::matrix::{Matrix, SparseRange, Workspace};
pub use crate::sparse::CompressedStorage::{CSC, CSR};
pub use crate::sparse::{
    compress_sparse_triplets, convert_to_compressed, CompressedStorage, CsMatrix,
};
pub use crate::subset::DelayedSubset;
