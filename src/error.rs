/*!
Error types shared across the colormap, lazy DFA, and dissector.

Follows the manual-`Display`-impl, `#[cfg(feature = "std")] impl
std::error::Error` shape used throughout the teacher crate's `id.rs` and
`util::matchtypes::MatchError`, rather than reaching for `thiserror`: these
are small, closed sets of variants, and this crate builds under `no_std` by
default.

Per spec.md §7, failures inside a single `exec` are latched into [`Vars`]
(first error wins) rather than being threaded through every call as a
`Result`; the types here are what gets latched, and what `exec` ultimately
returns.

[`Vars`]: crate::vars::Vars
*/

use core::fmt;

/// An allocation failure from the colormap's descriptor table or trie
/// arena. The only error kind the colormap can produce (spec.md §4.1,
/// "Failure model").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OutOfMemory;

impl fmt::Display for OutOfMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "out of memory")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OutOfMemory {}

/// An error returned while stepping or growing a lazy DFA's state-set
/// cache. Cache-too-small is explicitly *not* an error (spec.md §4.2.5) --
/// growth always succeeds by evicting -- so the only way to end up here is
/// genuine allocation failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CacheError(OutOfMemory);

impl From<OutOfMemory> for CacheError {
    fn from(e: OutOfMemory) -> CacheError {
        CacheError(e)
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lazy DFA cache error: {}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CacheError {}

/// The status codes `exec` can return (spec.md §6).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecStatus {
    /// A match was found; `pmatch` has been filled in.
    Ok,
    /// No match was found anywhere in the searched range.
    NoMatch,
}

/// The error taxonomy `exec` can return (spec.md §6/§7). `Assert` denotes an
/// internal invariant violation that should never surface in a released
/// build -- it is kept as a variant (rather than a `panic!`) so that a
/// caller embedding this engine can fail a single match gracefully instead
/// of aborting the host process.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecError {
    /// The compiled regex handle did not match this crate's expectations
    /// (magic mismatch).
    InvalidArg,
    /// The compiled regex and the input disagree on code-point width.
    Mixed,
    /// An allocation failed somewhere during the match.
    OutOfMemory,
    /// An internal invariant was violated. Should never occur.
    Assert,
}

impl From<OutOfMemory> for ExecError {
    fn from(_: OutOfMemory) -> ExecError {
        ExecError::OutOfMemory
    }
}

impl From<CacheError> for ExecError {
    fn from(_: CacheError) -> ExecError {
        ExecError::OutOfMemory
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ExecError::InvalidArg => {
                write!(f, "invalid regex handle (magic mismatch)")
            }
            ExecError::Mixed => {
                write!(f, "mismatched code-point size between regex and input")
            }
            ExecError::OutOfMemory => write!(f, "out of memory"),
            ExecError::Assert => {
                write!(f, "internal assertion failed (this is a bug)")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ExecError {}

/// The three-way outcome of a dissection step (spec.md §4.3.1, §7): unlike
/// `exec`'s top-level `Result<ExecStatus, ExecError>`, the dissector's
/// internal calls need to distinguish an ordinary "this alternative/midpoint
/// didn't pan out" from a genuine error, since only the latter aborts the
/// whole dissection rather than trying the next candidate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DissectResult {
    Ok,
    NoMatch,
}

pub type DissectOutcome = Result<DissectResult, ExecError>;
