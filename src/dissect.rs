/*!
C3: the dissector (spec.md §4.3). Given a top-level match `(begin, end)`
already established by C2 against the root cnfa, recursively fills in
`pmatch[subno]` for every capture and validates back-references by driving
fresh, scope-owned [`crate::dfa::Dfa`] instances over sub-cnfas (spec.md
§5: "A DFA is owned by the lexical scope that constructs it (per sub-cnfa,
per dissection level)").
*/

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::{
    chr::{Chr, Span},
    config::DfaConfig,
    dfa::{BosEosContext, ColorLookup, Dfa},
    error::{DissectOutcome, ExecError},
    id::SubreID,
    subre::{Op, SubreTree, INFINITE},
    vars::Vars,
};

pub use crate::error::DissectResult;

/// A code-point comparator, enabling case/locale-aware back-reference
/// matching (spec.md §6: "`guts.compare(a, b, len) -> int`"). The default
/// implementation below compares code points for exact equality.
pub trait Comparator {
    fn eq(&self, haystack: &[Chr], a: usize, b: usize, len: usize) -> bool;
}

/// Plain code-point equality.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactComparator;

impl Comparator for ExactComparator {
    fn eq(&self, haystack: &[Chr], a: usize, b: usize, len: usize) -> bool {
        haystack[a..a + len] == haystack[b..b + len]
    }
}

/// `zapsubs(pmatch, n)` (spec.md §4.3.6): resets captures `1..n` to
/// unset. Index `0` (the whole match) is left alone -- the DFA fills it
/// directly.
pub fn zapsubs(vars: &mut Vars, n: usize) {
    for i in 1..n {
        vars.set_pmatch(i, Span::UNSET);
    }
}

/// Drives both dissection modes over one compiled tree against one fixed
/// haystack. Does not own a `Vars` -- every entry point takes one by
/// `&mut` so a single dissector can be reused across midpoint retries.
pub struct Dissector<'a, CM, C = ExactComparator> {
    tree: &'a SubreTree,
    colormap: &'a CM,
    haystack: &'a [Chr],
    compare: &'a C,
}

impl<'a, CM: ColorLookup, C: Comparator> Dissector<'a, CM, C> {
    pub fn new(
        tree: &'a SubreTree,
        colormap: &'a CM,
        haystack: &'a [Chr],
        compare: &'a C,
    ) -> Dissector<'a, CM, C> {
        Dissector { tree, colormap, haystack, compare }
    }

    fn ctx(&self) -> BosEosContext {
        BosEosContext::new(None, None, self.haystack.len())
    }

    fn node_dfa(&self, id: SubreID) -> Dfa<'_, CM> {
        let cnfa = self
            .tree
            .node(id)
            .cnfa()
            .expect("dissected node must carry its own compiled cnfa");
        Dfa::new(cnfa, self.colormap, DfaConfig::new())
    }

    /// `zapmem(v, t)` (spec.md §4.3.6): recursively clears `mem[retry]` for
    /// subtree `t` and resets `pmatch[subno]` where `t.op == Capture`.
    pub fn zapmem(&self, vars: &mut Vars, node_id: SubreID) {
        let node = self.tree.node(node_id);
        vars.mem_mut()[node.retry_slot()] = 0;
        if node.op() == Op::Capture {
            vars.set_pmatch(node.subno() as usize, Span::UNSET);
        }
        if let Some(l) = node.left() {
            self.zapmem(vars, l);
        }
        if let Some(r) = node.right() {
            self.zapmem(vars, r);
        }
    }

    // ---- Uncomplicated mode (spec.md §4.3.2, left column) ----

    pub fn dissect(
        &self,
        vars: &mut Vars,
        node_id: SubreID,
        begin: usize,
        end: usize,
    ) -> DissectOutcome {
        match self.tree.node(node_id).op() {
            Op::Terminal => self.dissect_terminal(node_id, begin, end),
            Op::Capture => {
                let subno = self.tree.node(node_id).subno() as usize;
                vars.set_pmatch(subno, Span::new(begin, end));
                let child = self
                    .tree
                    .node(node_id)
                    .left()
                    .expect("capture node must have a body");
                self.dissect(vars, child, begin, end)
            }
            Op::Concat => self.dissect_concat(vars, node_id, begin, end),
            Op::Alt => self.dissect_alt(vars, node_id, begin, end),
            // spec.md §4.3.2: "Never called in uncomplicated mode (assert)."
            Op::Backref => Err(ExecError::Assert),
        }
    }

    /// A leaf is only as good as whatever window it was handed: since
    /// `cdissect_concat`'s right child is never pre-checked against its own
    /// DFA (a back-reference has none to check), the leaf itself is the
    /// last point where a bad split gets caught.
    fn dissect_terminal(
        &self,
        node_id: SubreID,
        begin: usize,
        end: usize,
    ) -> DissectOutcome {
        let ctx = self.ctx();
        let mut dfa = self.node_dfa(node_id);
        let covers = dfa
            .longest(self.haystack, begin, end, false, &ctx)
            .map_err(ExecError::from)?
            == Some(end);
        Ok(if covers { DissectResult::Ok } else { DissectResult::NoMatch })
    }

    fn dissect_concat(
        &self,
        vars: &mut Vars,
        node_id: SubreID,
        begin: usize,
        end: usize,
    ) -> DissectOutcome {
        let node = self.tree.node(node_id);
        let l = node.left().expect("concat must have a left child");
        let r = node.right().expect("concat must have a right child");
        let ctx = self.ctx();

        let mut limit = end;
        loop {
            let mut ldfa = self.node_dfa(l);
            let mid = ldfa
                .longest(self.haystack, begin, limit, false, &ctx)
                .map_err(ExecError::from)?;
            let mid = match mid {
                Some(m) => m,
                None => return Err(ExecError::Assert),
            };

            let mut rdfa = self.node_dfa(r);
            let rend = rdfa
                .longest(self.haystack, mid, end, false, &ctx)
                .map_err(ExecError::from)?;
            if rend == Some(end) {
                self.dissect(vars, l, begin, mid)?;
                return self.dissect(vars, r, mid, end);
            }
            if mid == begin {
                return Err(ExecError::Assert);
            }
            limit = mid - 1;
        }
    }

    fn dissect_alt(
        &self,
        vars: &mut Vars,
        node_id: SubreID,
        begin: usize,
        end: usize,
    ) -> DissectOutcome {
        let ctx = self.ctx();
        let mut current = node_id;
        loop {
            let node = self.tree.node(current);
            let body = node.left().expect("alt node must have a body");
            let mut dfa = self.node_dfa(body);
            let covers = dfa
                .longest(self.haystack, begin, end, false, &ctx)
                .map_err(ExecError::from)?
                == Some(end);
            if covers {
                return self.dissect(vars, body, begin, end);
            }
            match node.right() {
                Some(next) => current = next,
                None => return Ok(DissectResult::NoMatch),
            }
        }
    }

    // ---- Complicated mode (spec.md §4.3.3-§4.3.5) ----

    pub fn cdissect(
        &self,
        vars: &mut Vars,
        node_id: SubreID,
        begin: usize,
        end: usize,
    ) -> DissectOutcome {
        match self.tree.node(node_id).op() {
            Op::Terminal => self.dissect_terminal(node_id, begin, end),
            Op::Capture => {
                let subno = self.tree.node(node_id).subno() as usize;
                let child = self
                    .tree
                    .node(node_id)
                    .left()
                    .expect("capture node must have a body");
                // spec.md §4.3.2: "only on OK set pmatch[subno]" -- ordering
                // matters for retries, unlike the uncomplicated table.
                match self.cdissect(vars, child, begin, end)? {
                    DissectResult::Ok => {
                        vars.set_pmatch(subno, Span::new(begin, end));
                        Ok(DissectResult::Ok)
                    }
                    other => Ok(other),
                }
            }
            Op::Concat => self.cdissect_concat(vars, node_id, begin, end),
            Op::Alt => self.caltdissect(vars, node_id, begin, end),
            Op::Backref => self.backref(vars, node_id, begin, end),
        }
    }

    fn cdissect_concat(
        &self,
        vars: &mut Vars,
        node_id: SubreID,
        begin: usize,
        end: usize,
    ) -> DissectOutcome {
        let node = self.tree.node(node_id);
        let l = node.left().expect("concat must have a left child");
        let r = node.right().expect("concat must have a right child");
        let retry_slot = node.retry_slot();
        let shorter = self.tree.node(l).is_shorter();
        let ctx = self.ctx();

        loop {
            let prev = vars.mem()[retry_slot];
            let candidate = if shorter {
                let lo = if prev == 0 { begin } else { prev };
                let mut ldfa = self.node_dfa(l);
                match ldfa
                    .shortest(self.haystack, begin, lo, end, false, &ctx)
                    .map_err(ExecError::from)?
                {
                    (Some(m), _) => m,
                    (None, _) => return Ok(DissectResult::NoMatch),
                }
            } else {
                let hi = if prev == 0 { end } else { prev.saturating_sub(2) };
                // `prev != 0` means this is a retry: the previous candidate
                // (at `hi + 1`) already failed further down. If the
                // midpoint can no longer move below `begin` -- e.g. a
                // nullable left child, which `longest` always reports as
                // accepting at `begin` regardless of how narrow `[begin,
                // hi]` gets -- there is no smaller candidate left to try.
                if prev != 0 && hi <= begin {
                    return Ok(DissectResult::NoMatch);
                }
                let mut ldfa = self.node_dfa(l);
                match ldfa
                    .longest(self.haystack, begin, hi, false, &ctx)
                    .map_err(ExecError::from)?
                {
                    Some(m) => m,
                    None => return Ok(DissectResult::NoMatch),
                }
            };
            vars.mem_mut()[retry_slot] = candidate + 1;

            // Unlike the uncomplicated path, the right child is never
            // pre-checked with its own DFA: it may be (or contain) a
            // back-reference, which has no `cnfa` of its own to drive one.
            // Retrying on a `NoMatch` from either recursive call is what
            // stands in for that check.
            if self.cdissect(vars, l, begin, candidate)? == DissectResult::NoMatch
            {
                #[cfg(feature = "logging")]
                log::trace!("concat retry at midpoint {}: left dissection failed", candidate);
                self.zapmem(vars, l);
                self.zapmem(vars, r);
                vars.mem_mut()[retry_slot] = candidate + 1;
                continue;
            }
            if self.cdissect(vars, r, candidate, end)? == DissectResult::NoMatch
            {
                #[cfg(feature = "logging")]
                log::trace!("concat retry at midpoint {}: right dissection failed", candidate);
                self.zapmem(vars, l);
                self.zapmem(vars, r);
                vars.mem_mut()[retry_slot] = candidate + 1;
                continue;
            }
            return Ok(DissectResult::Ok);
        }
    }

    /// `caltdissect` (spec.md §4.3.4). Iterative, not recursive, over the
    /// `|`-chain's `right` links, per the design note on preserving the
    /// tail call.
    fn caltdissect(
        &self,
        vars: &mut Vars,
        node_id: SubreID,
        begin: usize,
        end: usize,
    ) -> DissectOutcome {
        const UNTRIED: usize = 0;
        const TRIED: usize = 2;

        let ctx = self.ctx();
        let mut current = node_id;
        loop {
            let node = self.tree.node(current);
            let body = node.left().expect("alt node must have a body");
            let retry_slot = node.retry_slot();
            let next = node.right();

            if vars.mem()[retry_slot] == UNTRIED {
                let mut dfa = self.node_dfa(body);
                let covers = dfa
                    .longest(self.haystack, begin, end, false, &ctx)
                    .map_err(ExecError::from)?
                    == Some(end);
                if !covers {
                    vars.mem_mut()[retry_slot] = TRIED;
                    match next {
                        Some(n) => {
                            current = n;
                            continue;
                        }
                        None => return Ok(DissectResult::NoMatch),
                    }
                }
                vars.mem_mut()[retry_slot] = 1; // TRYING
                match self.cdissect(vars, body, begin, end)? {
                    DissectResult::Ok => return Ok(DissectResult::Ok),
                    DissectResult::NoMatch => {
                        vars.mem_mut()[retry_slot] = TRIED;
                        match next {
                            Some(n) => {
                                current = n;
                                continue;
                            }
                            None => return Ok(DissectResult::NoMatch),
                        }
                    }
                }
            }

            match next {
                Some(n) => current = n,
                None => return Ok(DissectResult::NoMatch),
            }
        }
    }

    /// Back-reference matching (spec.md §4.3.5).
    fn backref(
        &self,
        vars: &mut Vars,
        node_id: SubreID,
        begin: usize,
        end: usize,
    ) -> DissectOutcome {
        let node = self.tree.node(node_id);
        let n = node.subno() as usize;
        let retry_slot = node.retry_slot();

        let referent = vars.pmatch()[n];
        let start = match referent.start() {
            Some(s) => s,
            None => return Ok(DissectResult::NoMatch),
        };
        let len = referent.end() - start;

        if vars.mem()[retry_slot] != 0 {
            return Ok(DissectResult::NoMatch);
        }
        vars.mem_mut()[retry_slot] = 1;

        if len == 0 {
            return Ok(if begin == end {
                DissectResult::Ok
            } else {
                DissectResult::NoMatch
            });
        }

        let mut p = begin;
        let mut i: u32 = 0;
        while p + len <= end && self.compare.eq(self.haystack, start, p, len) {
            p += len;
            i += 1;
            if node.max() != INFINITE && i >= node.max() {
                break;
            }
        }
        let within_bounds =
            i >= node.min() && (node.max() == INFINITE || i <= node.max());
        Ok(if p == end && within_bounds {
            DissectResult::Ok
        } else {
            DissectResult::NoMatch
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cnfa::CnfaBuilder,
        colormap::Colormap,
        id::{Color, NfaStateID},
        subre::SubreTreeBuilder,
    };

    /// Builds a one-arc cnfa over a single color, from `pre` to `post`.
    fn single_color_cnfa(color: Color) -> crate::cnfa::Cnfa {
        let mut b = CnfaBuilder::new();
        let pre = b.add_state();
        let post = b.add_state();
        b.add_arc(pre, color, post);
        b.build(pre, post, color.as_u32() + 1)
    }

    /// Builds a cnfa accepting one-or-more of `color` (a simple loop), used
    /// for the `a(b+)c` E1 fixture's middle term.
    fn plus_cnfa(color: Color) -> crate::cnfa::Cnfa {
        let mut b = CnfaBuilder::new();
        let pre = b.add_state();
        let post = b.add_state();
        b.add_arc(pre, color, post);
        b.add_arc(post, color, post);
        b.build(pre, post, color.as_u32() + 1)
    }

    /// Builds a cnfa accepting one-or-more of `bcolor` followed by one
    /// `ccolor` -- the `(b+)c` suffix's own compiled form, needed since
    /// every non-`Backref` node the dissector drives must carry one.
    fn plus_then_cnfa(bcolor: Color, ccolor: Color) -> crate::cnfa::Cnfa {
        let mut b = CnfaBuilder::new();
        let pre = b.add_state();
        let loop_state = b.add_state();
        let post = b.add_state();
        b.add_arc(pre, bcolor, loop_state);
        b.add_arc(loop_state, bcolor, loop_state);
        b.add_arc(loop_state, ccolor, post);
        let ncolors = bcolor.as_u32().max(ccolor.as_u32()) + 1;
        b.build(pre, post, ncolors)
    }

    fn colormap_for(chrs: &[(u32, Color)]) -> Colormap<NfaStateID> {
        let mut cm = Colormap::new();
        for &(c, color) in chrs {
            cm.setcolor(Chr::new(c), color);
        }
        cm
    }

    /// spec.md §8, E1: `a(b+)c` against `"xabbbcy"` dissected over the
    /// already-located top-level match window `(1,6)`.
    #[test]
    fn e1_capture_around_plus() {
        let ca = Color::new_unchecked(1);
        let cb = Color::new_unchecked(2);
        let cc = Color::new_unchecked(3);
        let cm = colormap_for(&[
            (b'a' as u32, ca),
            (b'b' as u32, cb),
            (b'c' as u32, cc),
        ]);

        let mut t = SubreTreeBuilder::new();
        let a_term = t.terminal(single_color_cnfa(ca));
        let b_plus = t.terminal(plus_cnfa(cb));
        let b_capture = t.capture(1, b_plus, Some(plus_cnfa(cb)));
        let c_term = t.terminal(single_color_cnfa(cc));
        let bc = t.concat(b_capture, c_term, Some(plus_then_cnfa(cb, cc)));
        let root = t.concat(a_term, bc, None);
        let tree = t.build(root);

        let haystack: Vec<Chr> =
            "xabbbcy".chars().map(Chr::from).collect();
        let compare = ExactComparator;
        let d = Dissector::new(&tree, &cm, &haystack, &compare);

        let mut vars = Vars::new(
            0,
            haystack.len(),
            crate::vars::EFlags::default(),
            2,
            tree.ntree(),
        );
        vars.set_pmatch(0, Span::new(1, 6));
        let outcome = d.dissect(&mut vars, root, 1, 6).unwrap();
        assert_eq!(outcome, DissectResult::Ok);
        assert_eq!(vars.pmatch()[1], Span::new(2, 5));
    }

    #[test]
    fn zero_length_backref_matches_only_zero_length_gap() {
        let cm: Colormap<NfaStateID> = Colormap::new();
        let mut t = SubreTreeBuilder::new();
        let backref = t.backref(1, 0, INFINITE);
        let tree = t.build(backref);
        let haystack: Vec<Chr> = Vec::new();
        let compare = ExactComparator;
        let d = Dissector::new(&tree, &cm, &haystack, &compare);

        let mut vars = Vars::new(
            0,
            0,
            crate::vars::EFlags::default(),
            2,
            tree.ntree(),
        );
        vars.set_pmatch(1, Span::new(0, 0));
        let outcome = d.cdissect(&mut vars, backref, 0, 0).unwrap();
        assert_eq!(outcome, DissectResult::Ok);
    }

    #[test]
    fn unmatched_backref_group_is_nomatch() {
        let cm: Colormap<NfaStateID> = Colormap::new();
        let mut t = SubreTreeBuilder::new();
        let backref = t.backref(1, 0, INFINITE);
        let tree = t.build(backref);
        let haystack: Vec<Chr> = "xx".chars().map(Chr::from).collect();
        let compare = ExactComparator;
        let d = Dissector::new(&tree, &cm, &haystack, &compare);

        let mut vars = Vars::new(
            0,
            haystack.len(),
            crate::vars::EFlags::default(),
            2,
            tree.ntree(),
        );
        // pmatch[1] left at UNSET: group never participated.
        let outcome = d.cdissect(&mut vars, backref, 0, 2).unwrap();
        assert_eq!(outcome, DissectResult::NoMatch);
    }
}
