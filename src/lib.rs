/*!
A colormap and lazy-DFA core for a POSIX-advanced regex engine, plus a
recursive dissector for capture-group recovery.

This crate implements three closely related components, grounded in a
TRE/AT&T-style POSIX regex engine's internals (see `DESIGN.md` for the
per-module grounding ledger):

  - [`colormap`]: partitions the input alphabet into color equivalence
    classes, so the automata below never branch on individual code points.
  - [`dfa`]: a lazily-constructed DFA over colors, with a bounded, evicting
    state-set cache (`hybrid`-style subset construction, built on demand
    rather than ahead of time).
  - [`dissect`]: recovers capture-group boundaries (and validates
    backreferences) once the DFA has established that an overall match
    exists, by recursively re-deriving it against the subexpression tree.

Surface regex syntax, parsing, and host-language bindings are explicitly
out of scope: callers hand this crate an already-compiled [`cnfa::Cnfa`]
and [`subre::SubreTree`].
*/

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod chr;
pub mod error;
pub mod id;

#[cfg(feature = "alloc")]
pub mod colormap;
#[cfg(feature = "alloc")]
pub mod vars;

#[cfg(feature = "alloc")]
pub mod cnfa;
#[cfg(feature = "alloc")]
pub mod subre;

#[cfg(feature = "alloc")]
pub mod dfa;
#[cfg(feature = "alloc")]
pub mod dissect;
#[cfg(feature = "alloc")]
pub mod exec;

pub mod config;

#[cfg(all(feature = "alloc", any(test, feature = "builder")))]
pub mod buildnfa;
