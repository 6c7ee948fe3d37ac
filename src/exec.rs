/*!
The top-level entry point (spec.md §6): `exec` locates a match window with
C2 and, unless the caller only wants a yes/no answer, hands it to C3 to
recover capture spans.
*/

use crate::{
    chr::{Chr, Span},
    config::DfaConfig,
    dfa::{BosEosContext, ColorLookup, Dfa},
    dissect::{zapsubs, Comparator, DissectResult, Dissector},
    error::{ExecError, ExecStatus},
    cnfa::Cnfa,
    id::Color,
    subre::SubreTree,
    vars::{EFlags, Vars},
};

/// Everything `exec` needs from the compiled regex (spec.md §6,
/// "Dependency (consumed from the compiled regex)"). Built and owned by the
/// external surface compiler; read-only and shareable across concurrent
/// matchers (spec.md §5).
pub struct Guts<'a, CM, Cmp> {
    pub colormap: &'a CM,
    /// `guts.tree`: the root subre, carrying its own `cnfa`.
    pub tree: &'a SubreTree,
    /// `guts.search`: the cnfa used to locate the leftmost feasible
    /// starting window. In the common case (no distinct unanchored-prefix
    /// optimization from the compiler) this is the same cnfa as the root
    /// subre's own, and that's what every constructor below assumes.
    pub search: &'a Cnfa,
    pub compare: &'a Cmp,
    pub nsub: usize,
    pub ntree: usize,
    /// Whether `cdissect` (rather than the uncomplicated `dissect`) must be
    /// used: true when the compiled pattern uses `SHORTER` anywhere or
    /// contains a back-reference (spec.md §4.3.1).
    pub complicated: bool,
    /// Set by the compiler when the pattern is a syntactic impossibility
    /// (spec.md's `guts.unmatchable`); `exec` short-circuits to `NoMatch`.
    pub unmatchable: bool,
    /// Pseudo color reserved for BOS (`^`), if the pattern uses it.
    pub bos_color: Option<Color>,
    /// Pseudo color reserved for EOS (`$`), if the pattern uses it.
    pub eos_color: Option<Color>,
}

impl<'a, CM, Cmp> Guts<'a, CM, Cmp> {
    fn ctx_for(&self, begin: usize, stop: usize, eflags: EFlags) -> (bool, BosEosContext) {
        let at_bos = begin == 0 && !eflags.not_bol;
        let bos_color = if at_bos { self.bos_color } else { None };
        let eos_color = if eflags.not_eol { None } else { self.eos_color };
        (at_bos, BosEosContext::new(bos_color, eos_color, stop))
    }
}

/// `exec(re, string, length, details, nmatch, pmatch[], eflags)` (spec.md
/// §6), minus the `re`-handle validation (`InvalidArg`/`Mixed`), which is
/// the surface compiler's concern before it ever builds a `Guts` -- this
/// entry point starts from an already-validated `guts` and input slice.
///
/// `nmatch` caps how many capture slots the caller wants filled; `0` means
/// "report match/no-match only" (spec.md's `REG_NOSUB`), skipping the
/// dissector entirely.
pub fn exec<CM, Cmp>(
    guts: &Guts<'_, CM, Cmp>,
    haystack: &[Chr],
    start: usize,
    stop: usize,
    nmatch: usize,
    eflags: EFlags,
) -> Result<(ExecStatus, Vars), ExecError>
where
    CM: ColorLookup,
    Cmp: Comparator,
{
    let slots = nmatch.max(1);
    let mut vars = Vars::new(start, stop, eflags, slots, guts.ntree);

    if guts.unmatchable {
        return Ok((ExecStatus::NoMatch, vars));
    }

    let window = find_leftmost(guts, haystack, start, stop, eflags)?;
    let (mstart, mend) = match window {
        Some(pair) => pair,
        None => return Ok((ExecStatus::NoMatch, vars)),
    };
    vars.set_pmatch(0, Span::new(mstart, mend));

    if nmatch == 0 {
        return Ok((ExecStatus::Ok, vars));
    }

    let dissector = Dissector::new(guts.tree, guts.colormap, haystack, guts.compare);
    let outcome = if guts.complicated {
        dissector.cdissect(&mut vars, guts.tree.root(), mstart, mend)?
    } else {
        dissector.dissect(&mut vars, guts.tree.root(), mstart, mend)?
    };

    match outcome {
        DissectResult::Ok => Ok((ExecStatus::Ok, vars)),
        DissectResult::NoMatch => {
            zapsubs(&mut vars, slots);
            Ok((ExecStatus::NoMatch, vars))
        }
    }
}

/// Scans `begin` forward from `start` until `guts.search` accepts
/// something starting exactly at `begin`, returning `(begin, end)` for the
/// first (leftmost) such position -- POSIX leftmost-match semantics,
/// implemented as repeated anchored `longest` probes since this crate (per
/// the `dfa` module's scope note) doesn't ship the source material's
/// dedicated unanchored-prefix search construction.
fn find_leftmost<CM, Cmp>(
    guts: &Guts<'_, CM, Cmp>,
    haystack: &[Chr],
    start: usize,
    stop: usize,
    eflags: EFlags,
) -> Result<Option<(usize, usize)>, ExecError>
where
    CM: ColorLookup,
{
    let mut dfa = Dfa::new(guts.search, guts.colormap, DfaConfig::new());
    let mut begin = start;
    loop {
        let (at_bos, ctx) = guts.ctx_for(begin, stop, eflags);
        if let Some(end) = dfa.longest(haystack, begin, stop, at_bos, &ctx)? {
            return Ok(Some((begin, end)));
        }
        if begin >= stop {
            return Ok(None);
        }
        begin += 1;
    }
}
