/*!
Construction-time errors for [`crate::dfa::Dfa`], mirroring the shape of
`hybrid::error::BuildError`/`CacheError` (manual `Display`, no `thiserror`).
Runtime cache errors reuse [`crate::error::CacheError`] directly since
they're the same failure (allocation) wearing a different hat depending on
when it's observed.
*/

use core::fmt;

use crate::error::OutOfMemory;

/// Failure building a fresh [`crate::dfa::Dfa`] (spec.md §3: a DFA is
/// either stack-allocated (`smalldfa`) or heap-allocated; only the latter
/// can fail).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BuildError(OutOfMemory);

impl From<OutOfMemory> for BuildError {
    fn from(e: OutOfMemory) -> BuildError {
        BuildError(e)
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to build lazy DFA: {}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BuildError {}
