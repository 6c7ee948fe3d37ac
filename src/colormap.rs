/*!
C1: the character-class colormap (spec.md §4.1).

A colormap is conceptually a total function `chr -> color` (spec.md §3): a
fixed-height radix trie over the byte-chunks of a code point, with a "fill"
spine so that lookup becomes branchless table indexing once construction is
done (`fillcm`). It is populated during compilation by interleaved
`setcolor`/`subcolor`/`okcolors` calls, then consumed read-only.

The trie/cache arena shape here is generalized from the arena-of-arrays,
arena-indexed-by-small-integer style of `hybrid::lazy::Cache` (`trans`,
`states`, `states_to_id` as flat `Vec`s addressed by ID newtypes rather than
pointers).
*/

use core::fmt;

#[cfg(feature = "alloc")]
use alloc::{boxed::Box, vec, vec::Vec};

use crate::{
    chr::{Chr, CHRBITS},
    error::OutOfMemory,
    id::Color,
};

/// Bits of a code point consumed per trie level. The trie is a byte-radix
/// tree (spec.md §3: "Height is NBYTS = ceil(CHRBITS / BYTBITS)").
const BYTBITS: u32 = 8;
/// Number of slots per interior/leaf node: `2^BYTBITS`.
const BYTTAB: usize = 1 << BYTBITS;
/// Trie height.
const NBYTS: u32 = (CHRBITS + BYTBITS - 1) / BYTBITS;

/// Flags on a [`ColorDesc`]. A plain bitset rather than a `bitflags!`-style
/// macro crate: there is exactly one flag today and the colormap otherwise
/// carries no external dependencies.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct ColorFlags(u8);

impl ColorFlags {
    /// Allocated but not backed by any real code point; used to label
    /// zero-width assertions (BOS/EOS/word-boundary pseudo-transitions).
    const PSEUDO: ColorFlags = ColorFlags(0b0000_0001);

    fn empty() -> ColorFlags {
        ColorFlags(0)
    }

    fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn contains(self, flag: ColorFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    fn insert(&mut self, flag: ColorFlags) {
        self.0 |= flag.0;
    }
}

/// One descriptor per allocated color (spec.md §3, "Color descriptor").
///
/// `arcs` is generic over the caller's NFA arc-handle type: the colormap
/// only ever needs to remember the *head* of each color's arc chain, never
/// to interpret the arc itself. Chain traversal (next/prev) lives on the
/// arc, inside whatever NFA representation the caller supplies via
/// [`ArcNetwork`].
#[derive(Clone, Copy, Debug)]
struct ColorDesc<A> {
    /// Count of code points currently mapped to this color. Wide enough to
    /// hold the full alphabet (`CHR_MAX - CHR_MIN + 1`, which for the
    /// 32-bit `Chr` this crate uses is `2^32` and does not fit in `u32`).
    nchrs: u64,
    sub: Color,
    arcs: Option<A>,
    flags: ColorFlags,
}

impl<A: Copy> ColorDesc<A> {
    fn unused() -> ColorDesc<A> {
        ColorDesc {
            nchrs: 0,
            sub: Color::NONE,
            arcs: None,
            flags: ColorFlags::empty(),
        }
    }

    /// spec.md §3: "an UNUSED predicate derived from nchrs==0 && sub==NOSUB
    /// && arcs==NULL && flags==0".
    fn is_unused(&self) -> bool {
        self.nchrs == 0
            && self.sub == Color::NONE
            && self.arcs.is_none()
            && self.flags.is_empty()
    }
}

/// Trie node. `Interior` nodes hold child node indices; `Leaf` nodes (the
/// bottom trie level) hold colors directly. Arena-indexed, never boxed
/// individually, per the "pointer graphs -> indices" design note.
#[derive(Clone)]
enum Node {
    Interior(Box<[NodeID; BYTTAB]>),
    Leaf(Box<[Color; BYTTAB]>),
}

#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
struct NodeID(u32);

impl NodeID {
    const NULL: NodeID = NodeID(u32::MAX);

    fn is_null(self) -> bool {
        self == NodeID::NULL
    }
}

/// An operation on the caller-owned NFA that back the arcs chained off of
/// each color. The colormap never interprets arc identity beyond what's
/// needed to splice it into (or out of) a color's chain, create parallel
/// arcs during [`Colormap::okcolors`], or probe existing arcs during
/// [`Colormap::rainbow`]/[`Colormap::colorcomplement`] -- all per spec.md
/// §4.1. A real compiler's NFA builder implements this trait once; this
/// crate's own [`crate::buildnfa::BuildNfa`] is a minimal stand-in used by
/// tests and by [`crate::cnfa::CnfaBuilder`].
pub trait ArcNetwork {
    type ArcID: Copy + Eq + fmt::Debug;
    type StateID: Copy + Eq + fmt::Debug;

    /// Create a new arc labeled `color` from `from` to `to`.
    fn new_arc(
        &mut self,
        color: Color,
        from: Self::StateID,
        to: Self::StateID,
    ) -> Self::ArcID;

    /// The color currently labeling `arc`.
    fn arc_color(&self, arc: Self::ArcID) -> Color;

    /// Relabel `arc` in place to `color` (used by `okcolors` when a split
    /// leaves the parent color with zero code points, so its arcs simply
    /// move to the subcolor rather than being duplicated).
    fn set_arc_color(&mut self, arc: Self::ArcID, color: Color);

    /// The `(from, to)` endpoints of `arc`, needed to build a parallel arc
    /// with a different color during `okcolors`.
    fn arc_endpoints(&self, arc: Self::ArcID) -> (Self::StateID, Self::StateID);

    /// True iff `state` has an existing out-arc labeled `color`. Used by
    /// [`Colormap::colorcomplement`] to skip colors already handled by an
    /// explicit (non-negated) branch.
    fn has_out_arc(&self, state: Self::StateID, color: Color) -> bool;

    /// The next arc in the (caller-owned) chain after `arc`, or `None` at
    /// the tail. The colormap stores only the chain *head*; traversal is
    /// delegated here so that the link fields can live alongside the arc's
    /// other data in the caller's own arena.
    fn chain_next(&self, arc: Self::ArcID) -> Option<Self::ArcID>;
    fn set_chain_next(&mut self, arc: Self::ArcID, next: Option<Self::ArcID>);
    fn chain_prev(&self, arc: Self::ArcID) -> Option<Self::ArcID>;
    fn set_chain_prev(&mut self, arc: Self::ArcID, prev: Option<Self::ArcID>);
}

/// C1: the colormap itself.
///
/// `A` is the caller's arc-handle type (see [`ArcNetwork`]); it defaults to
/// `()` so that a colormap used purely for its `getcolor`/`setcolor`
/// surface (e.g. inside the lazy DFA or dissector, long after compilation
/// has finished and `okcolors`/`rainbow` are no longer called) doesn't need
/// to carry a real NFA arc type around.
pub struct Colormap<A = ()> {
    cd: Vec<ColorDesc<A>>,
    free: Vec<Color>,
    nodes: Vec<Node>,
    root: NodeID,
    /// The color any as-yet-unvisited code point maps to. Starts as
    /// `Color::WHITE` and never changes thereafter in this implementation
    /// (the spec permits `rest` to be a caller-chosen default, but nothing
    /// in the contract requires changing it after construction).
    rest: Color,
    /// Spine node at each trie level, used by `fillcm` to patch every
    /// absent (null) slot to its logically-equivalent fill subtree.
    fill: [NodeID; NBYTS as usize],
    filled: bool,
    err: Option<OutOfMemory>,
}

impl<A: Copy + Eq + fmt::Debug> Colormap<A> {
    /// Build a fresh colormap with every code point initially mapped to
    /// `Color::WHITE`.
    pub fn new() -> Colormap<A> {
        let mut nodes = Vec::new();
        let mut fill = [NodeID::NULL; NBYTS as usize];

        let leaf = Node::Leaf(Box::new([Color::WHITE; BYTTAB]));
        nodes.push(leaf);
        fill[(NBYTS - 1) as usize] = NodeID((nodes.len() - 1) as u32);

        for level in (0..NBYTS - 1).rev() {
            let child = fill[(level + 1) as usize];
            let interior = Node::Interior(Box::new([child; BYTTAB]));
            nodes.push(interior);
            fill[level as usize] = NodeID((nodes.len() - 1) as u32);
        }

        let root = fill[0];
        let alphabet_size =
            Chr::MAX.as_u32() as u64 - Chr::MIN.as_u32() as u64 + 1;
        let mut cd = Vec::new();
        cd.push(ColorDesc {
            nchrs: alphabet_size,
            sub: Color::NONE,
            arcs: None,
            flags: ColorFlags::empty(),
        });

        Colormap {
            cd,
            free: Vec::new(),
            nodes,
            root,
            rest: Color::WHITE,
            fill,
            filled: false,
            err: None,
        }
    }

    /// spec.md §4.1: "getcolor(c) -> color -- branchless lookup once the
    /// map is filled, otherwise falls through to `rest` for NULL slots.
    /// Never fails."
    pub fn getcolor(&self, c: Chr) -> Color {
        let mut node = self.root;
        let bytes = c.as_u32().to_be_bytes();
        for level in 0..(NBYTS - 1) as usize {
            let slot = bytes[level] as usize;
            match &self.nodes[node.0 as usize] {
                Node::Interior(children) => {
                    let child = children[slot];
                    if child.is_null() {
                        // Only reachable pre-`fillcm`; post-fill every slot
                        // is non-null by construction.
                        return self.rest;
                    }
                    node = child;
                }
                Node::Leaf(_) => unreachable!("trie height mismatch"),
            }
        }
        let last = bytes[(NBYTS - 1) as usize] as usize;
        match &self.nodes[node.0 as usize] {
            Node::Leaf(colors) => colors[last],
            Node::Interior(_) => unreachable!("trie height mismatch"),
        }
    }

    /// spec.md §4.1: "setcolor(c, co) -> prev_color -- replaces the color
    /// of a single code point; lazily expands tree nodes along the path."
    /// Callers are responsible for the paired `nchrs` bookkeeping on the
    /// descriptors (per spec.md: "Updates to a color must be paired with a
    /// caller-maintained nchrs accounting").
    pub fn setcolor(&mut self, c: Chr, co: Color) -> Color {
        if self.err.is_some() {
            return Color::COLORLESS;
        }
        debug_assert!(!self.filled, "setcolor after fillcm is a contract violation");
        let bytes = c.as_u32().to_be_bytes();
        let mut node = self.root;
        let mut path = [NodeID::NULL; NBYTS as usize];
        let mut slots = [0usize; NBYTS as usize];
        for level in 0..(NBYTS - 1) as usize {
            path[level] = node;
            let slot = bytes[level] as usize;
            slots[level] = slot;
            let child = match &self.nodes[node.0 as usize] {
                Node::Interior(children) => children[slot],
                Node::Leaf(_) => unreachable!(),
            };
            node = if child.is_null() {
                match self.alloc_child(level) {
                    Some(fresh) => {
                        if let Node::Interior(children) =
                            &mut self.nodes[path[level].0 as usize]
                        {
                            children[slot] = fresh;
                        }
                        fresh
                    }
                    None => {
                        self.err = Some(OutOfMemory);
                        return Color::COLORLESS;
                    }
                }
            } else {
                child
            };
        }
        let last = bytes[(NBYTS - 1) as usize] as usize;
        match &mut self.nodes[node.0 as usize] {
            Node::Leaf(colors) => {
                let prev = colors[last];
                colors[last] = co;
                prev
            }
            Node::Interior(_) => unreachable!(),
        }
    }

    /// Allocate a fresh child for `level + 1`, initialized as a copy of the
    /// fill spine at that depth (so unrelated code points routed through
    /// the new node still behave as "everything maps to `rest`" until
    /// explicitly overridden).
    fn alloc_child(&mut self, level: usize) -> Option<NodeID> {
        let child_level = level + 1;
        let fresh = if child_level as u32 == NBYTS - 1 {
            Node::Leaf(Box::new([self.rest; BYTTAB]))
        } else {
            let grandchild = self.fill[child_level + 1];
            Node::Interior(Box::new([grandchild; BYTTAB]))
        };
        self.nodes.push(fresh);
        Some(NodeID((self.nodes.len() - 1) as u32))
    }

    /// spec.md §4.1: "newcolor() -> color -- returns the first UNUSED color
    /// slot, growing the descriptor table geometrically ... when all are
    /// used."
    pub fn newcolor(&mut self) -> Color {
        if self.err.is_some() {
            return Color::COLORLESS;
        }
        if let Some(c) = self.free.pop() {
            self.cd[c.as_usize()] = ColorDesc::unused();
            return c;
        }
        let next = self.cd.len();
        if next > Color::MAX.as_usize() {
            self.err = Some(OutOfMemory);
            return Color::COLORLESS;
        }
        self.cd.push(ColorDesc::unused());
        Color::new_unchecked(next)
    }

    /// spec.md §4.1: "pseudocolor() -> color -- like newcolor but the
    /// result is marked PSEUDO, carries nchrs = 1 virtually, and is
    /// excluded from rainbow/colorcomplement iterations."
    pub fn pseudocolor(&mut self) -> Color {
        let c = self.newcolor();
        if c == Color::COLORLESS {
            return c;
        }
        self.cd[c.as_usize()].nchrs = 1;
        self.cd[c.as_usize()].flags.insert(ColorFlags::PSEUDO);
        c
    }

    /// spec.md §4.1: "subcolor(c) -> color". See the module doc for the
    /// split/idempotence contract.
    pub fn subcolor(&mut self, c: Chr) -> Color {
        if self.err.is_some() {
            return Color::COLORLESS;
        }
        let old = self.getcolor(c);
        if old == Color::COLORLESS {
            return Color::COLORLESS;
        }
        let pending = self.cd[old.as_usize()].sub;
        if pending != Color::NONE {
            // A split is already underway for `old`; if `c` is already
            // routed to the subcolor we're idempotent, otherwise this call
            // is asking to peel `c` off into that same pending subcolor.
            if self.getcolor(c) == pending {
                return pending;
            }
            self.move_one(c, old, pending);
            return pending;
        }
        if self.cd[old.as_usize()].nchrs <= 1 {
            // singleton: no split necessary, spec.md §4.1.
            return old;
        }
        let sub = self.newcolor();
        if sub == Color::COLORLESS {
            return Color::COLORLESS;
        }
        #[cfg(feature = "logging")]
        log::trace!("splitting color {:?} -> new subcolor {:?}", old, sub);
        self.cd[old.as_usize()].sub = sub;
        self.cd[sub.as_usize()].sub = sub;
        self.move_one(c, old, sub);
        sub
    }

    fn move_one(&mut self, c: Chr, from: Color, to: Color) {
        self.cd[from.as_usize()].nchrs -= 1;
        self.cd[to.as_usize()].nchrs += 1;
        self.setcolor(c, to);
    }

    /// spec.md §4.1: "okcolors(nfa) -- resolves all pending subcolors."
    pub fn okcolors<N>(&mut self, nfa: &mut N)
    where
        N: ArcNetwork<ArcID = A>,
    {
        for k in 0..self.cd.len() {
            let owner = Color::new_unchecked(k);
            let s = self.cd[k].sub;
            if s == Color::NONE || s == owner {
                continue;
            }
            if self.cd[k].nchrs == 0 {
                // The split emptied the parent; its arcs simply move.
                let mut cur = self.cd[k].arcs.take();
                let mut tail = None;
                while let Some(arc) = cur {
                    nfa.set_arc_color(arc, s);
                    tail = Some(arc);
                    cur = nfa.chain_next(arc);
                }
                if let Some(tail) = tail {
                    // Splice the relabeled chain onto the front of `s`'s
                    // existing chain (if any), then adopt it as the head.
                    let old_s_head = self.cd[s.as_usize()].arcs;
                    nfa.set_chain_next(tail, old_s_head);
                    if let Some(old_head) = old_s_head {
                        nfa.set_chain_prev(old_head, Some(tail));
                    }
                    // Walk from the original head (now on `s`'s chain) to
                    // find it again for the new head pointer.
                    let mut head = tail;
                    while let Some(prev) = nfa.chain_prev(head) {
                        if nfa.arc_color(prev) != s {
                            break;
                        }
                        head = prev;
                    }
                    self.cd[s.as_usize()].arcs = Some(head);
                }
            } else {
                // The parent keeps its arcs; the subcolor gets parallel
                // copies of each.
                let mut cur = self.cd[k].arcs;
                while let Some(arc) = cur {
                    let (from, to) = nfa.arc_endpoints(arc);
                    let new_arc = nfa.new_arc(s, from, to);
                    self.colorchain(nfa, s, new_arc);
                    cur = nfa.chain_next(arc);
                }
            }
        }
        for desc in self.cd.iter_mut() {
            desc.sub = Color::NONE;
        }
    }

    /// spec.md §4.1: "colorchain(a) -- O(1) insert of arc a at the head of
    /// its color's chain."
    pub fn colorchain<N>(&mut self, nfa: &mut N, color: Color, arc: A)
    where
        N: ArcNetwork<ArcID = A>,
    {
        let old_head = self.cd[color.as_usize()].arcs;
        nfa.set_chain_prev(arc, None);
        nfa.set_chain_next(arc, old_head);
        if let Some(head) = old_head {
            nfa.set_chain_prev(head, Some(arc));
        }
        self.cd[color.as_usize()].arcs = Some(arc);
    }

    /// spec.md §4.1: "uncolorchain(a) -- O(chain-length) delete."
    pub fn uncolorchain<N>(&mut self, nfa: &mut N, color: Color, arc: A)
    where
        N: ArcNetwork<ArcID = A>,
    {
        let prev = nfa.chain_prev(arc);
        let next = nfa.chain_next(arc);
        match prev {
            Some(p) => nfa.set_chain_next(p, next),
            None => self.cd[color.as_usize()].arcs = next,
        }
        if let Some(n) = next {
            nfa.set_chain_prev(n, prev);
        }
        nfa.set_chain_next(arc, None);
        nfa.set_chain_prev(arc, None);
    }

    /// spec.md §4.1: "singleton(c) -> bool".
    pub fn singleton(&self, c: Chr) -> bool {
        let co = self.getcolor(c);
        if co == Color::COLORLESS {
            return false;
        }
        let d = &self.cd[co.as_usize()];
        d.nchrs == 1 && d.sub == Color::NONE
    }

    /// spec.md §4.1: "rainbow(nfa, type, but, from, to) -- for each
    /// allocated color k != but, skipping PSEUDO and colors that are
    /// themselves subcolors of a distinct parent, add an arc."
    pub fn rainbow<N>(
        &mut self,
        nfa: &mut N,
        but: Color,
        from: N::StateID,
        to: N::StateID,
    ) where
        N: ArcNetwork<ArcID = A>,
    {
        for k in 0..self.cd.len() {
            let color = Color::new_unchecked(k);
            if color == but {
                continue;
            }
            let d = &self.cd[k];
            if d.is_unused() || d.flags.contains(ColorFlags::PSEUDO) {
                continue;
            }
            // A color that is itself a subcolor of some other color (i.e.
            // `d.sub == color`, meaning it was *created* as a subcolor) is
            // not yet a stable member of the alphabet partition until
            // `okcolors` resolves it; skip it here just like the spec
            // directs for "colors that are themselves subcolors".
            if d.sub == color {
                continue;
            }
            let arc = nfa.new_arc(color, from, to);
            self.colorchain(nfa, color, arc);
        }
    }

    /// spec.md §4.1: "colorcomplement(nfa, type, of, from, to) -- for each
    /// allocated non-PSEUDO color, add an arc ... iff state `of` has no
    /// existing PLAIN out-arc of that color."
    pub fn colorcomplement<N>(
        &mut self,
        nfa: &mut N,
        of: N::StateID,
        from: N::StateID,
        to: N::StateID,
    ) where
        N: ArcNetwork<ArcID = A>,
    {
        for k in 0..self.cd.len() {
            let color = Color::new_unchecked(k);
            let d = &self.cd[k];
            if d.is_unused() || d.flags.contains(ColorFlags::PSEUDO) {
                continue;
            }
            if nfa.has_out_arc(of, color) {
                continue;
            }
            let arc = nfa.new_arc(color, from, to);
            self.colorchain(nfa, color, arc);
        }
    }

    /// spec.md §4.1: "fillcm() -- idempotent; after it returns, every
    /// interior slot is non-NULL."
    pub fn fillcm(&mut self) {
        if self.filled {
            return;
        }
        self.fill_node(self.root, 0);
        self.filled = true;
    }

    fn fill_node(&mut self, id: NodeID, level: usize) {
        if (level as u32) >= NBYTS - 1 {
            return;
        }
        let slots: Vec<(usize, NodeID)> = match &self.nodes[id.0 as usize] {
            Node::Interior(children) => children
                .iter()
                .enumerate()
                .filter_map(|(i, &c)| {
                    if c.is_null() {
                        Some((i, self.fill[level + 1]))
                    } else {
                        Some((i, c))
                    }
                })
                .collect(),
            Node::Leaf(_) => return,
        };
        if let Node::Interior(children) = &mut self.nodes[id.0 as usize] {
            for (i, c) in &slots {
                children[*i] = *c;
            }
        }
        // Recurse only into real (non-spine) children to avoid re-walking
        // the shared fill subtree on every branch -- it's already uniform.
        let spine_at_next = self.fill[level + 1];
        for (_, c) in slots {
            if c != spine_at_next {
                self.fill_node(c, level + 1);
            }
        }
    }

    /// Number of distinct colors currently allocated (used, pending, or
    /// pseudo), including the initial `WHITE`.
    pub fn ncolors(&self) -> usize {
        self.cd.len()
    }

    /// Iterate allocated, non-pseudo colors (used by callers implementing
    /// their own rainbow/complement-style logic, or by diagnostics).
    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        (0..self.cd.len())
            .map(Color::new_unchecked)
            .filter(move |&c| {
                let d = &self.cd[c.as_usize()];
                !d.is_unused() && !d.flags.contains(ColorFlags::PSEUDO)
            })
    }

    pub fn nchrs(&self, color: Color) -> u64 {
        self.cd[color.as_usize()].nchrs
    }

    pub fn is_pseudo(&self, color: Color) -> bool {
        self.cd[color.as_usize()].flags.contains(ColorFlags::PSEUDO)
    }

    /// The sticky allocation-failure flag (spec.md §4.1, "Failure model").
    pub fn has_failed(&self) -> bool {
        self.err.is_some()
    }

    /// spec.md Testable Property #2: "Count conservation".
    #[cfg(test)]
    pub(crate) fn check_count_conservation(&self) -> bool {
        let total: u64 = self
            .cd
            .iter()
            .filter(|d| !d.flags.contains(ColorFlags::PSEUDO))
            .map(|d| d.nchrs)
            .sum();
        total == (Chr::MAX.as_u32() as u64 - Chr::MIN.as_u32() as u64 + 1)
    }
}

impl<A: Copy + Eq + fmt::Debug> Default for Colormap<A> {
    fn default() -> Colormap<A> {
        Colormap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildnfa::BuildNfa;

    #[test]
    fn fresh_colormap_is_all_white() {
        let cm: Colormap<<BuildNfa as ArcNetwork>::ArcID> = Colormap::new();
        assert_eq!(cm.getcolor(Chr::new(0)), Color::WHITE);
        assert_eq!(cm.getcolor(Chr::new(0x10FFFF)), Color::WHITE);
        assert!(cm.check_count_conservation());
    }

    #[test]
    fn setcolor_then_getcolor_roundtrips() {
        let mut cm: Colormap<<BuildNfa as ArcNetwork>::ArcID> =
            Colormap::new();
        let co = cm.newcolor();
        cm.cd[Color::WHITE.as_usize()].nchrs -= 1;
        cm.cd[co.as_usize()].nchrs += 1;
        let prev = cm.setcolor(Chr::new(b'q' as u32), co);
        assert_eq!(prev, Color::WHITE);
        assert_eq!(cm.getcolor(Chr::new(b'q' as u32)), co);
        assert_eq!(cm.getcolor(Chr::new(b'r' as u32)), Color::WHITE);
        assert!(cm.check_count_conservation());
    }

    #[test]
    fn fillcm_is_idempotent_and_preserves_lookup() {
        let mut cm: Colormap<<BuildNfa as ArcNetwork>::ArcID> =
            Colormap::new();
        let co = cm.newcolor();
        cm.cd[Color::WHITE.as_usize()].nchrs -= 1;
        cm.cd[co.as_usize()].nchrs += 1;
        cm.setcolor(Chr::new(b'a' as u32), co);
        cm.fillcm();
        let snapshot_a = cm.getcolor(Chr::new(b'a' as u32));
        let snapshot_z = cm.getcolor(Chr::new(b'z' as u32));
        cm.fillcm();
        assert_eq!(cm.getcolor(Chr::new(b'a' as u32)), snapshot_a);
        assert_eq!(cm.getcolor(Chr::new(b'z' as u32)), snapshot_z);
    }

    #[test]
    fn subcolor_splits_singleton_quickly() {
        let mut cm: Colormap<<BuildNfa as ArcNetwork>::ArcID> =
            Colormap::new();
        let s1 = cm.subcolor(Chr::new(b'a' as u32));
        assert_ne!(s1, Color::WHITE);
        let s1_again = cm.subcolor(Chr::new(b'a' as u32));
        assert_eq!(s1, s1_again, "subcolor must be idempotent for the same chr");
    }

    #[test]
    fn okcolors_duplicates_arcs_onto_subcolor() {
        let mut cm: Colormap<<BuildNfa as ArcNetwork>::ArcID> =
            Colormap::new();
        let mut nfa = BuildNfa::new();
        let (s0, s1) = (nfa.new_state(), nfa.new_state());
        let arc = nfa.new_arc(Color::WHITE, s0, s1);
        cm.colorchain(&mut nfa, Color::WHITE, arc);
        cm.cd[Color::WHITE.as_usize()].arcs = Some(arc);

        let sub = cm.subcolor(Chr::new(b'a' as u32));
        cm.okcolors(&mut nfa);

        // WHITE keeps its original arc, and the subcolor now has a
        // parallel one with the same endpoints.
        assert!(cm.cd[Color::WHITE.as_usize()].arcs.is_some());
        let sub_arc = cm.cd[sub.as_usize()]
            .arcs
            .expect("subcolor should have gained a parallel arc");
        assert_eq!(nfa.arc_endpoints(sub_arc), (s0, s1));
        assert_eq!(nfa.arc_color(sub_arc), sub);
    }
}
