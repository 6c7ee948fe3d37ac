/*!
Per-exec scratch state (spec.md §3, "Match execution state (`vars`)"). One
`Vars` is exclusively owned by one `exec` call (spec.md §5: "a single
`vars` structure... [is] exclusively owned by one `exec` invocation").

Carries the sticky error latch described in spec.md §7: "a single integer
slot on vars... writes the first such code; subsequent routines test and
short-circuit." Here that's `Option<ExecError>`, set once via
[`Vars::latch`] and never overwritten thereafter.
*/

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::{chr::Span, error::ExecError};

/// Execution flags (spec.md §6: "bitset of execution flags (at minimum
/// BOS-suppressed, EOS-suppressed)").
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EFlags {
    /// Treat `start` as not being the beginning of the whole subject, so
    /// `^`/BOS-anchored transitions do not fire there.
    pub not_bol: bool,
    /// Treat `stop` as not being the end of the whole subject, so `$`/EOS
    /// anchored transitions do not fire there.
    pub not_eol: bool,
}

/// Per-exec scratch (spec.md §3/§5).
pub struct Vars {
    start: usize,
    stop: usize,
    eflags: EFlags,
    err: Option<ExecError>,
    pmatch: Vec<Span>,
    mem: Vec<usize>,
}

impl Vars {
    /// Allocate scratch for one `exec` call over `[start, stop)`, with
    /// `nmatch` capture slots (`pmatch[0]` is the whole match) and `ntree`
    /// retry-memory slots (spec.md §6: "`nmatch, pmatch`"; §3: "retry
    /// memory vector `mem[0..ntree)`").
    pub fn new(
        start: usize,
        stop: usize,
        eflags: EFlags,
        nmatch: usize,
        ntree: usize,
    ) -> Vars {
        Vars {
            start,
            stop,
            eflags,
            err: None,
            pmatch: vec_of(Span::UNSET, nmatch),
            mem: vec_of(0, ntree),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn stop(&self) -> usize {
        self.stop
    }

    pub fn eflags(&self) -> EFlags {
        self.eflags
    }

    /// Record `err` iff no error has been latched yet (spec.md §7: "first
    /// such code wins"). Returns `true` iff this call actually latched
    /// (i.e. there was no error already sticky).
    pub fn latch(&mut self, err: ExecError) -> bool {
        if self.err.is_some() {
            return false;
        }
        self.err = Some(err);
        true
    }

    pub fn has_failed(&self) -> bool {
        self.err.is_some()
    }

    pub fn take_error(&mut self) -> Option<ExecError> {
        self.err.take()
    }

    pub fn error(&self) -> Option<ExecError> {
        self.err
    }

    pub fn pmatch(&self) -> &[Span] {
        &self.pmatch
    }

    pub fn pmatch_mut(&mut self) -> &mut [Span] {
        &mut self.pmatch
    }

    pub fn set_pmatch(&mut self, i: usize, span: Span) {
        self.pmatch[i] = span;
    }

    pub fn mem(&self) -> &[usize] {
        &self.mem
    }

    pub fn mem_mut(&mut self) -> &mut [usize] {
        &mut self.mem
    }
}

fn vec_of<T: Clone>(value: T, n: usize) -> Vec<T> {
    alloc::vec![value; n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_vars_starts_with_every_pmatch_slot_unset() {
        let vars = Vars::new(0, 10, EFlags::default(), 3, 2);
        assert_eq!(vars.pmatch(), &[Span::UNSET, Span::UNSET, Span::UNSET]);
        assert_eq!(vars.mem(), &[0, 0]);
    }

    #[test]
    fn latch_keeps_the_first_error_and_reports_it_stuck() {
        let mut vars = Vars::new(0, 0, EFlags::default(), 1, 0);
        assert!(!vars.has_failed());

        assert!(vars.latch(ExecError::Assert));
        assert!(vars.has_failed());
        // A second, different error must not overwrite the first.
        assert!(!vars.latch(ExecError::InvalidArg));
        assert_eq!(vars.error(), Some(ExecError::Assert));
    }

    #[test]
    fn take_error_clears_the_latch() {
        let mut vars = Vars::new(0, 0, EFlags::default(), 1, 0);
        vars.latch(ExecError::Mixed);
        assert_eq!(vars.take_error(), Some(ExecError::Mixed));
        assert!(!vars.has_failed());
    }

    #[test]
    fn set_pmatch_writes_through_to_the_accessor() {
        let mut vars = Vars::new(0, 5, EFlags::default(), 2, 0);
        vars.set_pmatch(1, Span::new(1, 4));
        assert_eq!(vars.pmatch()[1], Span::new(1, 4));
        assert_eq!(vars.pmatch()[0], Span::UNSET);
    }
}
