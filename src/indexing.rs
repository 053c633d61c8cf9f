//! Abstraction over the integer types usable as matrix indices.
//!
//! Sparse ranges and compressed storage can index with any primitive
//! integer wide enough for the dimension they address: the crate default
//! is `i32`, while the layered loader shrinks its internal row indices
//! down to `u16` when the row count allows it. [`MatIndex`] carries the
//! two conversions the engines need, checked in debug builds and free in
//! release builds.

use std::fmt::Debug;

use num_traits::int::PrimInt;

/// A matrix index.
///
/// Converts losslessly to and from `usize` for every value a correctly
/// constructed matrix can hold; out-of-range conversions are a caller
/// bug and are only caught by debug assertions.
pub trait MatIndex: Debug + PrimInt + Default + 'static {
    /// The position this index denotes.
    fn index(self) -> usize;

    /// Build an index denoting position `ind`.
    fn from_usize(ind: usize) -> Self;
}

macro_rules! mat_index_impl {
    ($($int: ty),*) => {
        $(
            impl MatIndex for $int {
                #[inline]
                fn index(self) -> usize {
                    debug_assert!(
                        usize::try_from(self).is_ok(),
                        "index does not denote a position",
                    );
                    self as usize
                }

                #[inline]
                fn from_usize(ind: usize) -> Self {
                    debug_assert!(
                        <$int>::try_from(ind).is_ok(),
                        "position overflows the index type",
                    );
                    ind as $int
                }
            }
        )*
    };
}

mat_index_impl!(u16, u32, u64, usize, i16, i32, i64, isize);

#[cfg(test)]
mod test {
    use super::MatIndex;

    #[test]
    fn round_trips_cover_the_engine_widths() {
        // i32 is the crate-wide default for sparse range indices
        assert_eq!(i32::from_usize(0).index(), 0);
        assert_eq!(i32::from_usize(i32::MAX as usize).index(), i32::MAX as usize);
        // the layered loader stores u16 row indices up to 2^16 rows
        assert_eq!(u16::from_usize(65535).index(), 65535);
        assert_eq!(u32::from_usize(65536).index(), 65536);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic)]
    fn narrow_type_rejects_a_wide_position() {
        let _ = u16::from_usize(1 << 16);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic)]
    fn negative_index_denotes_no_position() {
        let _ = (-3i32).index();
    }
}
