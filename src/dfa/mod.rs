/*!
C2: the lazy DFA (spec.md §4.2). A DFA is instantiated for one specific
`(cnfa, colormap)` pair; it performs subset construction on demand into a
bounded, evicting cache.

Generalized from the cache/state-table machinery in `hybrid::lazy::Cache`
and `hybrid::dfa::DFA` (arena of states, `outs`/`ins` cross-linked
transition tables, the `maybe_add_state`/`add_state` split), and from the
scan loops in `hybrid::search::find_fwd`/`find_rev` (tagged-state dispatch,
stop-on-dead-or-end shape).

**Scope note on look-around.** Spec.md §4.2.2 describes closing a raw move
under "epsilon/assertions (`lacon` handles look-around context by invoking
a recursive mini-DFA on a sub-cnfa at the current position)." This crate's
`Cnfa` (spec.md §3) is a flat, already-epsilon-resolved transition table —
it has no separate epsilon-arc representation, only colored out-arcs — so
there is no epsilon step to close over in the general case. What remains is
exactly the zero-width-assertion case: colors the compiler marked `PSEUDO`
(boundary/anchor colors, never matched against a real input code point).
This crate closes a freshly computed destination set under whichever pseudo
colors the caller's [`AssertionContext`] reports as "satisfied here," then
iterates to a fixed point (trivially terminating: bitvector union is
monotonic and bounded). `NOPROGRESS` is therefore simplified from "every
member reached only by epsilon" to "this step's own color was itself
pseudo" — see [`AssertionContext`] and [`BosEosContext`]. A compiler with
richer lookaround than BOS/EOS can still drive this engine by implementing
`AssertionContext` itself; only the BOS/EOS case ships here, matching
spec.md §6's "at minimum BOS-suppressed, EOS-suppressed."
*/

pub mod error;
mod sset;

#[cfg(feature = "alloc")]
use alloc::{vec, vec::Vec};

use crate::{
    chr::Chr,
    cnfa::Cnfa,
    colormap::Colormap,
    config::DfaConfig,
    error::CacheError,
    id::{Color, SsetID},
};

pub use sset::{OutEntry, Sset};
use sset::{Flags, StateBits};

/// Anything that can answer `getcolor` for a `Chr`. Implemented for every
/// [`Colormap<A>`] regardless of its build-time arc type, since by the
/// time a `Dfa` is constructed the colormap is sealed (`fillcm`'d) and
/// read-only.
pub trait ColorLookup {
    fn getcolor(&self, c: Chr) -> Color;
}

impl<A: Copy + Eq + core::fmt::Debug> ColorLookup for Colormap<A> {
    fn getcolor(&self, c: Chr) -> Color {
        Colormap::getcolor(self, c)
    }
}

/// Which pseudo colors are "satisfied" at a given point in the scan, so
/// the DFA can close a step's destination set under them. See the module
/// doc's "Scope note on look-around".
pub trait AssertionContext {
    /// Pseudo colors active at the absolute start of the subject, used to
    /// pick the BOS-flavored initial state set (spec.md §4.2.1: "if
    /// `begin == v->start` and BOS anchors apply, use the initial state
    /// suitable for BOS").
    fn bos_colors(&self) -> &[Color];
    /// Pseudo colors active immediately after the scan reaches `pos`
    /// (e.g. EOS, once `pos` reaches the subject's true end).
    fn colors_at(&self, pos: usize) -> &[Color];
}

/// The only `AssertionContext` this crate ships: BOS/EOS, per spec.md §6's
/// minimum execution-flag set. `bos`/`eos` are `None` when the compiler
/// never reserved a pseudo color for that assertion (the pattern doesn't
/// use `^`/`$`).
#[derive(Clone, Copy, Debug)]
pub struct BosEosContext {
    bos: Option<Color>,
    eos: Option<Color>,
    subject_end: usize,
}

impl BosEosContext {
    pub fn new(
        bos: Option<Color>,
        eos: Option<Color>,
        subject_end: usize,
    ) -> BosEosContext {
        BosEosContext { bos, eos, subject_end }
    }
}

impl AssertionContext for BosEosContext {
    fn bos_colors(&self) -> &[Color] {
        match &self.bos {
            Some(c) => core::slice::from_ref(c),
            None => &[],
        }
    }

    fn colors_at(&self, pos: usize) -> &[Color] {
        if pos == self.subject_end {
            match &self.eos {
                Some(c) => core::slice::from_ref(c),
                None => &[],
            }
        } else {
            &[]
        }
    }
}

/// C2: the lazy DFA cache itself (spec.md §3, "DFA (`dfa`)").
pub struct Dfa<'c, CM> {
    cnfa: &'c Cnfa,
    colormap: &'c CM,
    ncolors: usize,
    nstates: usize,
    config: DfaConfig,

    ssets: Vec<Sset>,
    buckets: Vec<Vec<SsetID>>,
    /// Rotating eviction search pointer (spec.md §4.2.3, "search").
    search: usize,
    /// Rolling next-free-slot pointer, tried before falling back to
    /// `pickss`.
    next_free: usize,

    starter_plain: Option<SsetID>,
    starter_bos: Option<SsetID>,

    lastpost: Option<usize>,
    lastnopr: Option<usize>,
}

impl<'c, CM: ColorLookup> Dfa<'c, CM> {
    pub fn new(
        cnfa: &'c Cnfa,
        colormap: &'c CM,
        config: DfaConfig,
    ) -> Dfa<'c, CM> {
        let ncolors = cnfa.ncolors() as usize;
        let nstates = cnfa.nstates();
        let capacity = config.get_cache_capacity().max(2);
        let ssets = (0..capacity).map(|_| empty_slot(ncolors)).collect();
        let buckets = vec![Vec::new(); capacity];
        Dfa {
            cnfa,
            colormap,
            ncolors,
            nstates,
            config,
            ssets,
            buckets,
            search: 0,
            next_free: 0,
            starter_plain: None,
            starter_bos: None,
            lastpost: None,
            lastnopr: None,
        }
    }

    pub fn config(&self) -> &DfaConfig {
        &self.config
    }

    /// Input position at which a `POSTSTATE` set was last evicted (spec.md
    /// §4.2.3).
    pub fn lastpost(&self) -> Option<usize> {
        self.lastpost
    }

    /// Input position at which a `NOPROGRESS` set was last evicted.
    pub fn lastnopr(&self) -> Option<usize> {
        self.lastnopr
    }

    fn raw_move(&self, states: &StateBits, color: Color) -> StateBits {
        let mut out = StateBits::empty(self.nstates);
        for q in states.iter() {
            for &(c, r) in self.cnfa.out_arcs(q) {
                if c == color {
                    out.set(r);
                }
            }
        }
        out
    }

    /// Close `states` under whichever of `active`'s pseudo colors have
    /// out-arcs from states already in the set, to a fixed point.
    fn close_pseudo(&self, states: &mut StateBits, active: &[Color]) {
        if active.is_empty() {
            return;
        }
        loop {
            let mut grew = false;
            for &pc in active {
                let add = self.raw_move(states, pc);
                if !add.is_empty() {
                    let before = states.hash();
                    states.union_with(&add);
                    if states.hash() != before {
                        grew = true;
                    }
                }
            }
            if !grew {
                break;
            }
        }
    }

    fn bitset_flags(&self, states: &StateBits, color_was_pseudo: bool) -> Flags {
        let mut flags = Flags::empty();
        if states.is_set(self.cnfa.post()) {
            flags.insert(Flags::POSTSTATE);
        }
        if color_was_pseudo {
            flags.insert(Flags::NOPROGRESS);
        }
        flags
    }

    /// Initial state set, chosen per spec.md §4.2.1's BOS/non-BOS rule.
    pub fn initial_state(
        &mut self,
        at_absolute_start: bool,
        ctx: &dyn AssertionContext,
    ) -> Result<SsetID, CacheError> {
        if at_absolute_start {
            if let Some(id) = self.starter_bos {
                return Ok(id);
            }
        } else if let Some(id) = self.starter_plain {
            return Ok(id);
        }

        let mut states = StateBits::empty(self.nstates);
        states.set(self.cnfa.pre());
        if at_absolute_start {
            let active: Vec<Color> = ctx.bos_colors().to_vec();
            self.close_pseudo(&mut states, &active);
        }
        let mut flags = self.bitset_flags(&states, false);
        flags.insert(Flags::STARTER);
        // Not `LOCKED`: that flag means "pinned for the duration of the
        // current step" (spec.md §3), not "permanently unevictable". A
        // starter's own protection from eviction is conditional on
        // `DfaConfig::starters_are_locked` and handled by `pickss` via
        // `STARTER`, so `starters_are_locked(false)` can still make room by
        // evicting and later rebuilding one.
        let hash = states.hash();
        let id = self.find_or_insert(states, hash, 0, flags)?;
        if at_absolute_start {
            self.starter_bos = Some(id);
        } else {
            self.starter_plain = Some(id);
        }
        Ok(id)
    }

    /// Step from `from` under `color`, observed at position `pos` (the
    /// position the scan will be at *after* consuming this symbol; used
    /// both to touch `lastseen` and to evaluate `ctx.colors_at(pos)`).
    /// Returns `Ok(None)` for a dead transition (spec.md: "a step yields
    /// the empty set").
    pub fn step(
        &mut self,
        from: SsetID,
        color: Color,
        pos: usize,
        ctx: &dyn AssertionContext,
    ) -> Result<Option<SsetID>, CacheError> {
        match self.ssets[from.as_usize()].outs[color.as_usize()] {
            OutEntry::Dead => return Ok(None),
            OutEntry::Known(to) => {
                self.touch(to, pos);
                return Ok(Some(to));
            }
            OutEntry::Unknown => {}
        }

        let mut dest = self.raw_move(&self.ssets[from.as_usize()].states, color);
        let active: Vec<Color> = ctx.colors_at(pos).to_vec();
        self.close_pseudo(&mut dest, &active);

        if dest.is_empty() {
            self.ssets[from.as_usize()].outs[color.as_usize()] = OutEntry::Dead;
            return Ok(None);
        }

        let flags = self.bitset_flags(&dest, self.colormap_is_pseudo_hint(color));
        let hash = dest.hash();
        let to = self.find_or_insert(dest, hash, pos, flags)?;

        self.ssets[from.as_usize()].outs[color.as_usize()] = OutEntry::Known(to);
        self.ssets[to.as_usize()].ins.push((from, color));
        Ok(Some(to))
    }

    /// Whether `color` is itself a pseudo (assertion) color, driving the
    /// simplified `NOPROGRESS` computation described in the module doc.
    /// `Dfa` only has a `ColorLookup`, which doesn't expose `is_pseudo`;
    /// callers whose `CM` is a real `Colormap` get real answers by virtue
    /// of `color` never legitimately being pseudo except when routed
    /// through a pseudo-only arc, which only `rainbow`/`colorcomplement`
    /// ever avoid labeling — in practice the scan loop never steps on a
    /// pseudo color directly (those are consumed via `close_pseudo`), so
    /// this is always `false` for `step`'s caller-facing colors today.
    /// Kept as a named hook rather than inlined `false` so a future
    /// `ColorLookup::is_pseudo` extension has an obvious call site.
    fn colormap_is_pseudo_hint(&self, _color: Color) -> bool {
        false
    }

    fn touch(&mut self, id: SsetID, pos: usize) {
        self.ssets[id.as_usize()].lastseen = pos;
    }

    fn find_or_insert(
        &mut self,
        states: StateBits,
        hash: u64,
        now: usize,
        flags: Flags,
    ) -> Result<SsetID, CacheError> {
        let bucket = (hash as usize) % self.buckets.len();
        for &candidate in &self.buckets[bucket] {
            let slot = &self.ssets[candidate.as_usize()];
            if slot.occupied && slot.hash == hash && slot.states == states {
                return Ok(candidate);
            }
        }
        let id = self.allocate_slot(now)?;
        self.ssets[id.as_usize()] = Sset {
            states,
            hash,
            flags,
            ins: Vec::new(),
            lastseen: now,
            outs: vec![OutEntry::Unknown; self.ncolors],
            occupied: true,
        };
        self.buckets[bucket].push(id);
        Ok(id)
    }

    fn allocate_slot(&mut self, now: usize) -> Result<SsetID, CacheError> {
        let cap = self.ssets.len();
        for off in 0..cap {
            let idx = (self.next_free + off) % cap;
            if !self.ssets[idx].occupied {
                self.next_free = (idx + 1) % cap;
                return Ok(SsetID::new_unchecked(idx));
            }
        }
        self.pickss(now)
    }

    /// Eviction (spec.md §4.2.3).
    fn pickss(&mut self, now: usize) -> Result<SsetID, CacheError> {
        let cap = self.ssets.len();
        let locked_ok = self.config.get_starters_are_locked();
        let mut best: Option<(usize, usize)> = None;
        for off in 0..cap {
            let idx = (self.search + off) % cap;
            let s = &self.ssets[idx];
            if !s.occupied {
                continue;
            }
            if s.is_locked() || (locked_ok && s.is_starter()) {
                continue;
            }
            match best {
                None => best = Some((idx, s.lastseen)),
                Some((_, bl)) if s.lastseen < bl => best = Some((idx, s.lastseen)),
                _ => {}
            }
        }
        let (victim, _) = best.ok_or(CacheError::from(crate::error::OutOfMemory))?;
        self.search = (victim + 1) % cap;
        self.evict(SsetID::new_unchecked(victim), now);
        Ok(SsetID::new_unchecked(victim))
    }

    fn evict(&mut self, victim: SsetID, now: usize) {
        #[cfg(feature = "logging")]
        log::trace!(
            "evicting sset {:?} (lastseen {}) to make room at position {}",
            victim,
            self.ssets[victim.as_usize()].lastseen(),
            now
        );
        if self.ssets[victim.as_usize()].is_poststate() {
            self.lastpost = Some(now);
        }
        if self.ssets[victim.as_usize()].is_noprogress() {
            self.lastnopr = Some(now);
        }

        // Inbound: every (src, color) pointing at `victim` goes back to
        // Unknown.
        let ins = core::mem::take(&mut self.ssets[victim.as_usize()].ins);
        for (src, color) in ins {
            if let Some(slot) = self.ssets.get_mut(src.as_usize()) {
                slot.outs[color.as_usize()] = OutEntry::Unknown;
            }
        }

        // Outbound: unregister `victim` from every target's `ins` list so
        // a later reuse of this slot index doesn't leave a stale backlink
        // (see the module's eviction note -- without this, a slot reused
        // for an unrelated set could have one of its *unrelated* outs
        // cleared when the original referrer is itself evicted).
        let outs = core::mem::replace(
            &mut self.ssets[victim.as_usize()].outs,
            Vec::new(),
        );
        for (color_idx, entry) in outs.into_iter().enumerate() {
            if let OutEntry::Known(target) = entry {
                if let Some(slot) = self.ssets.get_mut(target.as_usize()) {
                    slot.ins.retain(|&(s, c)| {
                        !(s == victim && c.as_usize() == color_idx)
                    });
                }
            }
        }

        let bucket = (self.ssets[victim.as_usize()].hash as usize)
            % self.buckets.len();
        self.buckets[bucket].retain(|&id| id != victim);

        self.ssets[victim.as_usize()].occupied = false;
        if self.starter_plain == Some(victim) {
            self.starter_plain = None;
        }
        if self.starter_bos == Some(victim) {
            self.starter_bos = None;
        }
    }

    pub fn is_poststate(&self, id: SsetID) -> bool {
        self.ssets[id.as_usize()].is_poststate()
    }

    /// `longest(begin, end)` (spec.md §4.2.1): the latest accepting
    /// position in `[begin, end]`, or `None`.
    pub fn longest(
        &mut self,
        haystack: &[Chr],
        begin: usize,
        end: usize,
        at_absolute_start: bool,
        ctx: &dyn AssertionContext,
    ) -> Result<Option<usize>, CacheError> {
        let mut cur = self.initial_state(at_absolute_start, ctx)?;
        self.touch(cur, begin);
        let mut best = if self.is_poststate(cur) { Some(begin) } else { None };

        let mut pos = begin;
        while pos < end {
            let color = self.colormap.getcolor(haystack[pos]);
            pos += 1;
            match self.step(cur, color, pos, ctx)? {
                None => break,
                Some(next) => {
                    cur = next;
                    if self.is_poststate(cur) {
                        best = Some(pos);
                    }
                }
            }
        }
        Ok(best)
    }

    /// `shortest(begin, start, end, &hitstart)` (spec.md §4.2.1): the
    /// earliest accepting position in `[start, end]` reachable from a run
    /// starting at `begin`. `hitstart` is set to `begin` when a match is
    /// found (the run that found it could be extended from there) and
    /// left `None` otherwise -- see the module doc's look-around scope
    /// note for why this crate doesn't attempt the fuller multi-start
    /// refinement spec.md alludes to; that belongs to the external
    /// leftmost-search entry point, not to a single DFA instance.
    pub fn shortest(
        &mut self,
        haystack: &[Chr],
        begin: usize,
        start: usize,
        end: usize,
        at_absolute_start: bool,
        ctx: &dyn AssertionContext,
    ) -> Result<(Option<usize>, Option<usize>), CacheError> {
        let mut cur = self.initial_state(at_absolute_start, ctx)?;
        self.touch(cur, begin);
        if self.is_poststate(cur) && begin >= start {
            return Ok((Some(begin), Some(begin)));
        }

        let mut pos = begin;
        while pos < end {
            let color = self.colormap.getcolor(haystack[pos]);
            pos += 1;
            match self.step(cur, color, pos, ctx)? {
                None => return Ok((None, None)),
                Some(next) => {
                    cur = next;
                    if self.is_poststate(cur) && pos >= start {
                        return Ok((Some(pos), Some(begin)));
                    }
                }
            }
        }
        Ok((None, None))
    }
}

fn empty_slot(ncolors: usize) -> Sset {
    Sset {
        states: StateBits::default(),
        hash: 0,
        flags: Flags::empty(),
        ins: Vec::new(),
        lastseen: 0,
        outs: vec![OutEntry::Unknown; ncolors],
        occupied: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cnfa::CnfaBuilder,
        colormap::Colormap,
        id::NfaStateID,
    };

    fn linear_ab_cnfa() -> (Cnfa, Color, Color) {
        // pre --a--> mid --b--> post
        let mut b = CnfaBuilder::new();
        let pre = b.add_state();
        let mid = b.add_state();
        let post = b.add_state();
        let ca = Color::new_unchecked(1);
        let cb = Color::new_unchecked(2);
        b.add_arc(pre, ca, mid);
        b.add_arc(mid, cb, post);
        (b.build(pre, post, 3), ca, cb)
    }

    #[test]
    fn longest_finds_full_match_and_nothing_past_it() {
        let (cnfa, ca, cb) = linear_ab_cnfa();
        let mut cm: Colormap<NfaStateID> = Colormap::new();
        cm.setcolor(Chr::new(b'a' as u32), ca);
        cm.setcolor(Chr::new(b'b' as u32), cb);

        let mut dfa = Dfa::new(&cnfa, &cm, DfaConfig::new());
        let haystack: Vec<Chr> =
            "ab".chars().map(Chr::from).collect();
        let ctx = BosEosContext::new(None, None, haystack.len());

        let end = dfa
            .longest(&haystack, 0, haystack.len(), true, &ctx)
            .unwrap();
        assert_eq!(end, Some(2));
    }

    #[test]
    fn dead_transition_stops_the_scan() {
        let (cnfa, ca, _cb) = linear_ab_cnfa();
        let mut cm: Colormap<NfaStateID> = Colormap::new();
        cm.setcolor(Chr::new(b'a' as u32), ca);

        let mut dfa = Dfa::new(&cnfa, &cm, DfaConfig::new());
        let haystack: Vec<Chr> =
            "ax".chars().map(Chr::from).collect();
        let ctx = BosEosContext::new(None, None, haystack.len());

        let end = dfa
            .longest(&haystack, 0, haystack.len(), true, &ctx)
            .unwrap();
        assert_eq!(end, None, "no poststate ever reached on \"ax\"");
    }

    #[test]
    fn cache_transparency_under_forced_eviction() {
        let (cnfa, ca, cb) = linear_ab_cnfa();
        let mut cm: Colormap<NfaStateID> = Colormap::new();
        cm.setcolor(Chr::new(b'a' as u32), ca);
        cm.setcolor(Chr::new(b'b' as u32), cb);

        let haystack: Vec<Chr> =
            "ab".chars().map(Chr::from).collect();
        let ctx = BosEosContext::new(None, None, haystack.len());

        let mut roomy = Dfa::new(&cnfa, &cm, DfaConfig::new().cache_capacity(64));
        let mut tiny = Dfa::new(
            &cnfa,
            &cm,
            DfaConfig::new().cache_capacity(2).starters_are_locked(false),
        );

        let a = roomy.longest(&haystack, 0, haystack.len(), true, &ctx).unwrap();
        let b = tiny.longest(&haystack, 0, haystack.len(), true, &ctx).unwrap();
        assert_eq!(a, b, "cache size must not change the match result");
    }
}
