/*!
Small, cheaply-copied index types used throughout this crate.

Every graph in this core -- the colormap trie, the NFA arc chains, the DFA
state-set cache, the subre tree -- is expressed in the source material as a
web of pointers. In a language with strict aliasing rules, re-expressing
that as flat arrays indexed by small integers is both safer and, in
practice, about as fast. This module defines those integer types once so
that each arena (`Colormap`, `Cnfa`, `Dfa`, `SubreTree`) gets a distinct,
non-interchangeable ID type instead of passing bare `usize` around.
*/

use core::{convert::TryFrom, fmt, ops};

/// A macro for defining near-identical newtype index types.
///
/// Each of `Color`, `NfaStateID`, `SsetID` and `SubreID` is a
/// `#[repr(transparent)]` wrapper around a `u32`, following the same shape
/// as `PatternID`/`StateID` in upstream lazy-DFA code: a fallible
/// constructor, an infallible `new_unchecked` for paths that have already
/// validated the bound, and `Index`/`IndexMut` impls so arenas can be
/// indexed directly by the ID type instead of by `.as_usize()` everywhere.
macro_rules! index_type {
    ($(#[$meta:meta])* $ty:ident, $tyerr:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
        pub struct $ty(u32);

        impl $ty {
            /// The maximum value representable by this ID type.
            pub const MAX: $ty = $ty(u32::MAX - 1);

            /// A sentinel used by the owning arena to mean "not present" /
            /// "no such element" / "error". Never a valid index.
            pub const NONE: $ty = $ty(u32::MAX);

            /// The zero value of this ID type. Not necessarily meaningful
            /// for every arena (e.g. `SubreID::ZERO` is just "the first
            /// node pushed"), but always constructible.
            pub const ZERO: $ty = $ty(0);

            #[inline]
            pub fn new(id: usize) -> Result<$ty, $tyerr> {
                $ty::try_from(id)
            }

            #[inline]
            pub fn new_unchecked(id: usize) -> $ty {
                $ty(id as u32)
            }

            #[inline]
            pub fn as_usize(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn as_u32(self) -> u32 {
                self.0
            }

            /// True when this ID is the arena's `NONE` sentinel.
            #[inline]
            pub fn is_none(self) -> bool {
                self == $ty::NONE
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if *self == $ty::NONE {
                    write!(f, concat!(stringify!($ty), "(NONE)"))
                } else {
                    write!(f, concat!(stringify!($ty), "({})"), self.0)
                }
            }
        }

        #[derive(Clone, Debug, Eq, PartialEq)]
        pub struct $tyerr {
            attempted: u64,
        }

        impl fmt::Display for $tyerr {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!(
                        "failed to create ",
                        stringify!($ty),
                        " from {:?}, which exceeds {:?}"
                    ),
                    self.attempted,
                    $ty::MAX,
                )
            }
        }

        #[cfg(feature = "std")]
        impl std::error::Error for $tyerr {}

        impl TryFrom<usize> for $ty {
            type Error = $tyerr;

            fn try_from(id: usize) -> Result<$ty, $tyerr> {
                if id > $ty::MAX.as_usize() {
                    return Err($tyerr { attempted: id as u64 });
                }
                Ok($ty::new_unchecked(id))
            }
        }

        impl<T> ops::Index<$ty> for [T] {
            type Output = T;

            #[inline]
            fn index(&self, index: $ty) -> &T {
                &self[index.as_usize()]
            }
        }

        impl<T> ops::IndexMut<$ty> for [T] {
            #[inline]
            fn index_mut(&mut self, index: $ty) -> &mut T {
                &mut self[index.as_usize()]
            }
        }

        #[cfg(feature = "alloc")]
        impl<T> ops::Index<$ty> for alloc::vec::Vec<T> {
            type Output = T;

            #[inline]
            fn index(&self, index: $ty) -> &T {
                &self[index.as_usize()]
            }
        }

        #[cfg(feature = "alloc")]
        impl<T> ops::IndexMut<$ty> for alloc::vec::Vec<T> {
            #[inline]
            fn index_mut(&mut self, index: $ty) -> &mut T {
                &mut self[index.as_usize()]
            }
        }
    };
}

index_type!(
    /// A color: an index into a [`crate::colormap::Colormap`]'s descriptor
    /// table. `Color::ZERO` is the distinguished `WHITE` color that every
    /// code point belongs to before any `setcolor`/`subcolor` call narrows
    /// it. `Color::NONE` is the spec's `COLORLESS` sentinel.
    Color,
    ColorIDError
);

index_type!(
    /// An index into a [`crate::cnfa::Cnfa`]'s flat state table.
    NfaStateID,
    NfaStateIDError
);

index_type!(
    /// An index into a lazy [`crate::dfa::Dfa`]'s state-set cache.
    SsetID,
    SsetIDError
);

index_type!(
    /// An index into a [`crate::subre::SubreTree`]'s node arena.
    SubreID,
    SubreIDError
);

/// `Color::WHITE` is the initial "everything" color every code point starts
/// out mapped to (spec.md, Colormap). Defined separately from the
/// `index_type!` macro since it's meaningful only for `Color`.
impl Color {
    pub const WHITE: Color = Color::ZERO;

    /// The spec's `COLORLESS`: "no color / error".
    pub const COLORLESS: Color = Color::NONE;
}
