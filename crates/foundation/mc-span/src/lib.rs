//! Byte spans into minic source text

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A half-open byte range `start..end` in a source file
#[derive(Copy, Clone, Debug, Default, Display, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[display("{start}..{end}")]
pub struct Span {
    /// First byte covered by the span
    pub start: u32,
    /// One past the last byte covered by the span
    pub end: u32,
}

impl Span {
    /// Creates a span from its bounds
    #[must_use]
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Creates an empty span sitting at `offset`
    #[must_use]
    pub fn empty(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    /// Byte range usable for slicing the source
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Length in bytes
    #[must_use]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the span covers no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_join() {
        let joined = Span::new(4, 6).to(Span::new(1, 3));
        assert_eq!(joined, Span::new(1, 6));
        assert_eq!(joined.len(), 5);
        assert_eq!(joined.to_string(), "1..6");
    }

    #[test]
    fn test_empty_span() {
        let span = Span::empty(9);
        assert!(span.is_empty());
        assert_eq!(span.range(), 9..9);
    }
}
