/*!
The subre tree (spec.md §3, "Subre tree"): an externally-produced parse
tree describing capture / alternation / concatenation / back-reference
structure. As with [`crate::cnfa`], surface parsing is out of scope; this
module owns the arena and, under the same `builder`/`test` gate, a hand
constructor.

Arena-allocated per spec.md §9: "Subre nodes... likewise arena-allocated;
left/right become indices. The retry slot is an index into mem, never a
pointer."
*/

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::{cnfa::Cnfa, id::SubreID};

/// A node's operator tag (spec.md §3).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Op {
    /// `=`: a leaf matched directly against the embedded `cnfa`.
    Terminal,
    /// `|`: alternation. `right` continues the chain of alternatives;
    /// `left` is this alternative's body.
    Alt,
    /// `.`: concatenation of `left` then `right`.
    Concat,
    /// `(`: capturing group around `left`.
    Capture,
    /// `b`: back-reference to an earlier capture (`subno`), with `min`/
    /// `max` repeat bounds.
    Backref,
}

/// Per-node flags (spec.md §3). Only `SHORTER` exists today, but this is
/// kept as a bitset rather than a lone `bool` field so additional per-node
/// hints (e.g. a future `ANCHORED`) don't require a layout change.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct SubreFlags(u8);

impl SubreFlags {
    /// "Prefer shortest match" -- drives the complicated-concatenation
    /// midpoint search direction in `cdissect` (spec.md §4.3.3).
    const SHORTER: SubreFlags = SubreFlags(0b0000_0001);

    fn empty() -> SubreFlags {
        SubreFlags(0)
    }

    fn contains(self, flag: SubreFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    fn insert(&mut self, flag: SubreFlags) {
        self.0 |= flag.0;
    }
}

/// A node of the subre tree.
#[derive(Clone, Debug)]
pub struct Subre {
    op: Op,
    left: Option<SubreID>,
    right: Option<SubreID>,
    flags: SubreFlags,
    /// Capture index (positive for `Capture`/`Backref`); `0` otherwise.
    subno: u32,
    /// Index into the caller's `mem` retry-memory vector (spec.md §3,
    /// §4.3.1). Every node — not only the ones `cdissect` retries — is
    /// assigned a slot, since `zapmem` walks the whole tree uniformly.
    retry: usize,
    /// Repeat bounds for `Backref`; unused otherwise. `max == INFINITE`
    /// (`u32::MAX`) denotes unbounded, per spec.md §4.3.5.
    min: u32,
    max: u32,
    /// The cnfa driving this node directly. Present on `Terminal` nodes
    /// (and, in this implementation, also on `Alt`/`Concat`/`Capture`
    /// nodes so that `dissect`'s "uncomplicated" midpoint search can run
    /// `longest`/`shortest` against the node's own compiled form without
    /// a separate side table) — absent only on `Backref`, which has no
    /// cnfa of its own (spec.md §4.3.2: "Never called... assert" in
    /// uncomplicated mode, since a pattern containing a backref is by
    /// definition complicated).
    cnfa: Option<Cnfa>,
}

/// `max` sentinel meaning "unbounded" (spec.md §4.3.5, "`INFINITY` meaning
/// unbounded").
pub const INFINITE: u32 = u32::MAX;

impl Subre {
    pub fn op(&self) -> Op {
        self.op
    }

    pub fn left(&self) -> Option<SubreID> {
        self.left
    }

    pub fn right(&self) -> Option<SubreID> {
        self.right
    }

    pub fn is_shorter(&self) -> bool {
        self.flags.contains(SubreFlags::SHORTER)
    }

    pub fn subno(&self) -> u32 {
        self.subno
    }

    pub fn retry_slot(&self) -> usize {
        self.retry
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn cnfa(&self) -> Option<&Cnfa> {
        self.cnfa.as_ref()
    }
}

/// The arena owning every `Subre` node in one compiled tree, plus the
/// root. Mirrors `Cnfa`'s "flat, read-only once built" shape.
#[derive(Clone, Debug)]
pub struct SubreTree {
    nodes: Vec<Subre>,
    root: SubreID,
    /// Count of `mem`/`pmatch` slots this tree requires (`ntree`, `nsub`
    /// in spec.md §6's dependency list) — the caller sizes `Vars::mem`
    /// and `Vars::pmatch` from these.
    ntree: usize,
    nsub: usize,
}

impl SubreTree {
    pub fn root(&self) -> SubreID {
        self.root
    }

    pub fn node(&self, id: SubreID) -> &Subre {
        &self.nodes[id.as_usize()]
    }

    pub fn ntree(&self) -> usize {
        self.ntree
    }

    pub fn nsub(&self) -> usize {
        self.nsub
    }
}

/// Hand builder for `SubreTree` values (test/fixture use only; see the
/// module doc and [`crate::cnfa::CnfaBuilder`]).
#[cfg(any(test, feature = "builder"))]
pub struct SubreTreeBuilder {
    nodes: Vec<Subre>,
    next_retry: usize,
    max_subno: u32,
}

#[cfg(any(test, feature = "builder"))]
impl SubreTreeBuilder {
    pub fn new() -> SubreTreeBuilder {
        SubreTreeBuilder { nodes: Vec::new(), next_retry: 0, max_subno: 0 }
    }

    fn push(&mut self, node: Subre) -> SubreID {
        self.max_subno = self.max_subno.max(node.subno);
        self.nodes.push(node);
        SubreID::new_unchecked(self.nodes.len() - 1)
    }

    fn alloc_retry(&mut self) -> usize {
        let slot = self.next_retry;
        self.next_retry += 1;
        slot
    }

    pub fn terminal(&mut self, cnfa: Cnfa) -> SubreID {
        let retry = self.alloc_retry();
        self.push(Subre {
            op: Op::Terminal,
            left: None,
            right: None,
            flags: SubreFlags::empty(),
            subno: 0,
            retry,
            min: 0,
            max: 0,
            cnfa: Some(cnfa),
        })
    }

    pub fn concat(
        &mut self,
        left: SubreID,
        right: SubreID,
        cnfa: Option<Cnfa>,
    ) -> SubreID {
        let retry = self.alloc_retry();
        self.push(Subre {
            op: Op::Concat,
            left: Some(left),
            right: Some(right),
            flags: SubreFlags::empty(),
            subno: 0,
            retry,
            min: 0,
            max: 0,
            cnfa,
        })
    }

    pub fn alt(
        &mut self,
        body: SubreID,
        next: Option<SubreID>,
        cnfa: Option<Cnfa>,
    ) -> SubreID {
        let retry = self.alloc_retry();
        self.push(Subre {
            op: Op::Alt,
            left: Some(body),
            right: next,
            flags: SubreFlags::empty(),
            subno: 0,
            retry,
            min: 0,
            max: 0,
            cnfa,
        })
    }

    pub fn capture(
        &mut self,
        subno: u32,
        body: SubreID,
        cnfa: Option<Cnfa>,
    ) -> SubreID {
        let retry = self.alloc_retry();
        self.push(Subre {
            op: Op::Capture,
            left: Some(body),
            right: None,
            flags: SubreFlags::empty(),
            subno,
            retry,
            min: 0,
            max: 0,
            cnfa,
        })
    }

    pub fn backref(&mut self, subno: u32, min: u32, max: u32) -> SubreID {
        let retry = self.alloc_retry();
        self.push(Subre {
            op: Op::Backref,
            left: None,
            right: None,
            flags: SubreFlags::empty(),
            subno,
            retry,
            min,
            max,
            cnfa: None,
        })
    }

    pub fn mark_shorter(&mut self, id: SubreID) {
        self.nodes[id.as_usize()].flags.insert(SubreFlags::SHORTER);
    }

    pub fn build(self, root: SubreID) -> SubreTree {
        let ntree = self.next_retry;
        let nsub = self.max_subno as usize;
        SubreTree { nodes: self.nodes, root, ntree, nsub }
    }
}

#[cfg(any(test, feature = "builder"))]
impl Default for SubreTreeBuilder {
    fn default() -> SubreTreeBuilder {
        SubreTreeBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_links_left_and_right_with_no_subno() {
        let mut t = SubreTreeBuilder::new();
        let l = t.terminal(dummy_cnfa());
        let r = t.terminal(dummy_cnfa());
        let root = t.concat(l, r, None);
        let tree = t.build(root);

        let node = tree.node(root);
        assert_eq!(node.op(), Op::Concat);
        assert_eq!(node.left(), Some(l));
        assert_eq!(node.right(), Some(r));
        assert_eq!(node.subno(), 0);
    }

    #[test]
    fn capture_records_its_subno_and_body() {
        let mut t = SubreTreeBuilder::new();
        let body = t.terminal(dummy_cnfa());
        let cap = t.capture(3, body, None);
        let tree = t.build(cap);

        let node = tree.node(cap);
        assert_eq!(node.op(), Op::Capture);
        assert_eq!(node.subno(), 3);
        assert_eq!(node.left(), Some(body));
        assert_eq!(node.right(), None);
    }

    #[test]
    fn mark_shorter_is_idempotent_and_scoped_to_one_node() {
        let mut t = SubreTreeBuilder::new();
        let a = t.terminal(dummy_cnfa());
        let b = t.terminal(dummy_cnfa());
        t.mark_shorter(a);
        t.mark_shorter(a);
        let tree = t.build(a);
        assert!(tree.node(a).is_shorter());

        // `b` was never marked, and was built from the same tree -- make
        // sure marking `a` didn't leak onto it.
        let mut t2 = SubreTreeBuilder::new();
        let c = t2.terminal(dummy_cnfa());
        t2.terminal(dummy_cnfa());
        let tree2 = t2.build(c);
        assert!(!tree2.node(c).is_shorter());
        let _ = b;
    }

    #[test]
    fn backref_carries_repeat_bounds_and_no_cnfa() {
        let mut t = SubreTreeBuilder::new();
        let r = t.backref(2, 1, INFINITE);
        let tree = t.build(r);

        let node = tree.node(r);
        assert_eq!(node.op(), Op::Backref);
        assert_eq!(node.subno(), 2);
        assert_eq!(node.min(), 1);
        assert_eq!(node.max(), INFINITE);
        assert!(node.cnfa().is_none());
    }

    #[test]
    fn every_node_gets_a_distinct_retry_slot() {
        let mut t = SubreTreeBuilder::new();
        let a = t.terminal(dummy_cnfa());
        let b = t.terminal(dummy_cnfa());
        let root = t.concat(a, b, None);
        let tree = t.build(root);

        let slots: alloc::vec::Vec<usize> = [a, b, root]
            .iter()
            .map(|&id| tree.node(id).retry_slot())
            .collect();
        assert_eq!(tree.ntree(), 3);
        assert_eq!(slots.len(), 3);
        assert_ne!(slots[0], slots[1]);
        assert_ne!(slots[1], slots[2]);
        assert_ne!(slots[0], slots[2]);
    }

    fn dummy_cnfa() -> Cnfa {
        use crate::cnfa::CnfaBuilder;
        let mut b = CnfaBuilder::new();
        let pre = b.add_state();
        let post = b.add_state();
        b.add_arc(pre, crate::id::Color::WHITE, post);
        b.build(pre, post, 1)
    }
}
