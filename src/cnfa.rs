/*!
The compact NFA (spec.md §3, "Compact NFA (`cnfa`)"): a flat, read-only
transition table handed to this crate by an external compiler. Surface
parsing into this representation is explicitly out of scope (spec.md §1);
this module owns only the data model and, under `#[cfg(any(test, feature =
"builder"))]`, a minimal hand builder used to assemble test fixtures
directly against this shape, per spec.md §9's instruction that tests must
be generated from the compiled tree rather than surface syntax.

Arena-indexed per the "pointer graphs -> indices" design note, following
`hybrid::lazy::Cache`'s flat `states: Vec<State>` arena shape.
*/

#[cfg(feature = "alloc")]
use alloc::{boxed::Box, vec::Vec};

use crate::id::{Color, NfaStateID};

/// One cnfa state: its out-arcs, each a `(color, target)` pair. Boxed
/// slices rather than `Vec` since a state's arc list is fixed at
/// construction and never grows afterward -- `Cnfa` is read-only once
/// built (spec.md §9: "subre nodes... likewise arena-allocated").
#[derive(Clone, Debug)]
pub struct CnfaState {
    out: Box<[(Color, NfaStateID)]>,
}

impl CnfaState {
    pub fn out_arcs(&self) -> &[(Color, NfaStateID)] {
        &self.out
    }
}

/// The compact NFA itself: a flat array of states plus the two
/// distinguished states spec.md §3 calls out -- `pre` (matches BOS
/// assertions) and `post` (acceptance).
#[derive(Clone, Debug)]
pub struct Cnfa {
    states: Vec<CnfaState>,
    pre: NfaStateID,
    post: NfaStateID,
    ncolors: u32,
}

impl Cnfa {
    pub fn nstates(&self) -> usize {
        self.states.len()
    }

    pub fn pre(&self) -> NfaStateID {
        self.pre
    }

    pub fn post(&self) -> NfaStateID {
        self.post
    }

    /// The number of distinct colors this cnfa's arcs are labeled with --
    /// used by `LazyDfa` to size bitvectors (`wordsper`, spec.md §3).
    pub fn ncolors(&self) -> u32 {
        self.ncolors
    }

    pub fn state(&self, id: NfaStateID) -> &CnfaState {
        &self.states[id.as_usize()]
    }

    pub fn out_arcs(&self, id: NfaStateID) -> &[(Color, NfaStateID)] {
        self.states[id.as_usize()].out_arcs()
    }

    /// True iff `id` is the distinguished accepting state.
    pub fn is_post(&self, id: NfaStateID) -> bool {
        id == self.post
    }
}

/// Hand builder for `Cnfa` values, used only by this crate's own tests and
/// by callers who opt into the `builder` feature to assemble fixtures the
/// same way. Not a parser: callers add states and colored arcs directly.
#[cfg(any(test, feature = "builder"))]
pub struct CnfaBuilder {
    out: Vec<Vec<(Color, NfaStateID)>>,
}

#[cfg(any(test, feature = "builder"))]
impl CnfaBuilder {
    pub fn new() -> CnfaBuilder {
        CnfaBuilder { out: Vec::new() }
    }

    pub fn add_state(&mut self) -> NfaStateID {
        self.out.push(Vec::new());
        NfaStateID::new_unchecked(self.out.len() - 1)
    }

    pub fn add_arc(&mut self, from: NfaStateID, color: Color, to: NfaStateID) {
        self.out[from.as_usize()].push((color, to));
    }

    /// Finish building, declaring `pre`/`post` and the alphabet's color
    /// count (the maximum color id used by any arc, plus one; callers
    /// building against a real `Colormap` should pass `colormap.ncolors()`
    /// instead so pseudo-colors used only for assertions are still
    /// accounted for).
    pub fn build(self, pre: NfaStateID, post: NfaStateID, ncolors: u32) -> Cnfa {
        let states = self
            .out
            .into_iter()
            .map(|arcs| CnfaState { out: arcs.into_boxed_slice() })
            .collect();
        Cnfa { states, pre, post, ncolors }
    }
}

#[cfg(any(test, feature = "builder"))]
impl Default for CnfaBuilder {
    fn default() -> CnfaBuilder {
        CnfaBuilder::new()
    }
}
