/*!
A minimal, build-time-only NFA used for two things: exercising
[`crate::colormap::Colormap`]'s arc-chain contract in tests, and serving as
the concrete collaborator behind [`crate::cnfa::CnfaBuilder`] (gated
`#[cfg(any(test, feature = "builder"))]` since no surface syntax parser is
in scope here -- spec.md is explicit that a compiler feeding this engine
builds its NFA/subre trees some other way, and that this crate's own tests
must do the same).

This is deliberately *not* the production NFA a real compiler would use --
it exists only so that `Colormap`'s `rainbow`/`colorcomplement`/`okcolors`
contract (which spec.md describes in terms of "the NFA", external to C1)
has something concrete to operate on. Its arc representation mirrors the
flat, arena-indexed shape used everywhere else in this crate (see
`src/id.rs`'s doc comment) rather than a pointer graph.
*/

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::{
    colormap::ArcNetwork,
    id::{Color, NfaStateID},
};

#[derive(Clone, Copy, Debug)]
struct Arc {
    color: Color,
    from: NfaStateID,
    to: NfaStateID,
    next: Option<NfaStateID>,
    prev: Option<NfaStateID>,
}

/// A build-time NFA: states are opaque IDs, arcs are colored edges between
/// them. Arcs are addressed by [`NfaStateID`] reused as an arc handle --
/// acceptable here because this builder never needs to distinguish "state"
/// from "arc" ID spaces; a production compiler's NFA would keep them
/// separate.
#[derive(Default)]
pub struct BuildNfa {
    nstates: u32,
    arcs: Vec<Arc>,
}

impl BuildNfa {
    pub fn new() -> BuildNfa {
        BuildNfa { nstates: 0, arcs: Vec::new() }
    }

    pub fn new_state(&mut self) -> NfaStateID {
        let id = NfaStateID::new_unchecked(self.nstates as usize);
        self.nstates += 1;
        id
    }

    pub fn nstates(&self) -> u32 {
        self.nstates
    }

    /// All arcs currently labeled `color`, in chain order from whatever
    /// head the caller is tracking (this type itself does not track
    /// per-color heads; [`crate::colormap::Colormap`] does).
    pub fn arcs_from(&self, state: NfaStateID) -> impl Iterator<Item = NfaStateID> + '_ {
        self.arcs
            .iter()
            .enumerate()
            .filter(move |(_, a)| a.from == state)
            .map(|(i, _)| NfaStateID::new_unchecked(i))
    }
}

impl ArcNetwork for BuildNfa {
    type ArcID = NfaStateID;
    type StateID = NfaStateID;

    fn new_arc(
        &mut self,
        color: Color,
        from: NfaStateID,
        to: NfaStateID,
    ) -> NfaStateID {
        let id = NfaStateID::new_unchecked(self.arcs.len());
        self.arcs.push(Arc { color, from, to, next: None, prev: None });
        id
    }

    fn arc_color(&self, arc: NfaStateID) -> Color {
        self.arcs[arc.as_usize()].color
    }

    fn set_arc_color(&mut self, arc: NfaStateID, color: Color) {
        self.arcs[arc.as_usize()].color = color;
    }

    fn arc_endpoints(&self, arc: NfaStateID) -> (NfaStateID, NfaStateID) {
        let a = &self.arcs[arc.as_usize()];
        (a.from, a.to)
    }

    fn has_out_arc(&self, state: NfaStateID, color: Color) -> bool {
        self.arcs.iter().any(|a| a.from == state && a.color == color)
    }

    fn chain_next(&self, arc: NfaStateID) -> Option<NfaStateID> {
        self.arcs[arc.as_usize()].next
    }

    fn set_chain_next(&mut self, arc: NfaStateID, next: Option<NfaStateID>) {
        self.arcs[arc.as_usize()].next = next;
    }

    fn chain_prev(&self, arc: NfaStateID) -> Option<NfaStateID> {
        self.arcs[arc.as_usize()].prev
    }

    fn set_chain_prev(&mut self, arc: NfaStateID, prev: Option<NfaStateID>) {
        self.arcs[arc.as_usize()].prev = prev;
    }
}
