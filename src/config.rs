/*!
`Config`-struct-with-`Option`-fields configuration, in the style of
`dfa::onepass::Config`/`hybrid::lazy::Config`: every knob is `Option<T>` so
that a freshly built `Config` has no opinions of its own, `get_*()`
accessors supply the defaults, and `overwrite()` lets a caller layer a
partial config over a base one (used when a sub-DFA allocated by the
dissector wants to inherit its parent's cache-sizing policy but override
just one field).
*/

/// Configuration for a [`crate::colormap::Colormap`].
#[derive(Clone, Debug, Default)]
pub struct ColormapConfig {
    reserved_pseudocolors: Option<u32>,
}

impl ColormapConfig {
    pub fn new() -> ColormapConfig {
        ColormapConfig::default()
    }

    /// How many pseudo-colors to reserve up front (BOS/EOS/word-boundary
    /// assertions typically need a small fixed number). Defaults to `4`.
    pub fn reserved_pseudocolors(mut self, n: u32) -> ColormapConfig {
        self.reserved_pseudocolors = Some(n);
        self
    }

    pub fn get_reserved_pseudocolors(&self) -> u32 {
        self.reserved_pseudocolors.unwrap_or(4)
    }

    pub fn overwrite(&self, o: ColormapConfig) -> ColormapConfig {
        ColormapConfig {
            reserved_pseudocolors: o
                .reserved_pseudocolors
                .or(self.reserved_pseudocolors),
        }
    }
}

/// Configuration for a [`crate::dfa::Dfa`] (spec.md §3: "Sizing knobs").
#[derive(Clone, Debug, Default)]
pub struct DfaConfig {
    cache_capacity: Option<usize>,
    minimum_cache_flush_count: Option<usize>,
    starters_are_locked: Option<bool>,
}

impl DfaConfig {
    pub fn new() -> DfaConfig {
        DfaConfig::default()
    }

    /// Maximum number of state sets held in the cache at once before
    /// `pickss` must evict (spec.md §4.2.3). Defaults to `1024`, which
    /// comfortably exceeds `FEWSTATES`/`FEWCOLORS`-class small DFAs while
    /// still bounding memory for pathological patterns.
    pub fn cache_capacity(mut self, n: usize) -> DfaConfig {
        self.cache_capacity = Some(n);
        self
    }

    pub fn get_cache_capacity(&self) -> usize {
        self.cache_capacity.unwrap_or(1024)
    }

    /// The smallest cache capacity this crate will honor when a caller
    /// asks for less (e.g. to force eviction pressure in cache-transparency
    /// tests, spec.md §8 Testable Property 9). Below this, correctness
    /// itself could be compromised if a single step needed more live state
    /// sets than the cache can hold simultaneously while `LOCKED`.
    pub fn get_minimum_cache_flush_count(&self) -> usize {
        self.minimum_cache_flush_count.unwrap_or(2)
    }

    pub fn minimum_cache_flush_count(mut self, n: usize) -> DfaConfig {
        self.minimum_cache_flush_count = Some(n);
        self
    }

    /// Whether `STARTER` state sets should additionally be treated as
    /// `LOCKED` (never evicted even under extreme pressure). Defaults to
    /// `true`, matching spec.md §4.2.3 ("Never evict a STARTER or LOCKED
    /// set") — this flag exists only so a test can relax it and exercise
    /// the pathological "starters get evicted and rebuilt" path.
    pub fn starters_are_locked(mut self, yes: bool) -> DfaConfig {
        self.starters_are_locked = Some(yes);
        self
    }

    pub fn get_starters_are_locked(&self) -> bool {
        self.starters_are_locked.unwrap_or(true)
    }

    pub fn overwrite(&self, o: DfaConfig) -> DfaConfig {
        DfaConfig {
            cache_capacity: o.cache_capacity.or(self.cache_capacity),
            minimum_cache_flush_count: o
                .minimum_cache_flush_count
                .or(self.minimum_cache_flush_count),
            starters_are_locked: o
                .starters_are_locked
                .or(self.starters_are_locked),
        }
    }
}
