//! Sparse storage engines and their construction helpers.

pub use self::compressed::{CompressedStorage, CsMatrix, SecondaryCursors};
pub use self::construct::convert_to_compressed;
pub use self::triplet::compress_sparse_triplets;

pub mod compressed;
pub mod construct;
pub mod triplet;
