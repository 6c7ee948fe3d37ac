/*!
The input alphabet's element type (spec.md §3, "Code point (`chr`)").
*/

use core::fmt;

/// The bit width of [`Chr`]. A compile-time constant in the source material;
/// fixed here at 32 bits since this crate's input is a slice of Unicode
/// scalar values (`char`) widened to `u32`; a caller that only ever matches
/// ASCII or raw bytes still fits comfortably, it just never allocates colors
/// above `0xFF`.
pub const CHRBITS: u32 = 32;

/// A single input symbol. `Chr` wraps `u32` rather than `char` so that
/// pseudo-positions (the spec's `PSEUDO` boundary markers passed to
/// `lacon`/look-around handling) can reuse the same type without forcing
/// every caller through `char`'s validity checks.
#[repr(transparent)]
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Chr(u32);

impl Chr {
    pub const MIN: Chr = Chr(0);
    pub const MAX: Chr = Chr(u32::MAX);

    #[inline]
    pub fn new(c: u32) -> Chr {
        Chr(c)
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<char> for Chr {
    #[inline]
    fn from(c: char) -> Chr {
        Chr(c as u32)
    }
}

impl From<u8> for Chr {
    #[inline]
    fn from(b: u8) -> Chr {
        Chr(b as u32)
    }
}

impl fmt::Debug for Chr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match char::from_u32(self.0) {
            Some(c) if !c.is_control() => write!(f, "Chr({:?})", c),
            _ => write!(f, "Chr(0x{:X})", self.0),
        }
    }
}

/// A half-open span of positions into the input sequence, `[start, end)`.
/// Used both for the overall match (`pmatch[0]`) and for each capture group.
/// A span whose `start` is `None` represents a group that did not
/// participate in the match (the spec's `rm_so == -1`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Span {
    start: Option<usize>,
    end: usize,
}

impl Span {
    /// The canonical "did not participate" span.
    pub const UNSET: Span = Span { start: None, end: 0 };

    #[inline]
    pub fn new(start: usize, end: usize) -> Span {
        assert!(start <= end, "span start must not exceed end");
        Span { start: Some(start), end }
    }

    #[inline]
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.start.is_some()
    }

    #[inline]
    pub fn range(&self) -> Option<core::ops::Range<usize>> {
        self.start.map(|s| s..self.end)
    }
}

impl Default for Span {
    fn default() -> Span {
        Span::UNSET
    }
}
