use core::fmt;
use core::ops::Range;

use crate::ProtocolError;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Half-open token range `[start, end)` without any payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Builds an interval that is non-empty and fits a sequence of `len` tokens.
    pub fn checked(start: usize, end: usize, len: usize) -> Result<Self, ProtocolError> {
        if start >= end {
            return Err(ProtocolError::EmptyInterval { start, end });
        }
        if end > len {
            return Err(ProtocolError::OutOfBounds { start, end, len });
        }
        Ok(Self { start, end })
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Interval {
    fn from(r: Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Caller data carried by a span. Opaque to the core apart from the tag,
/// which only feeds render keys and the default mark rendering.
pub trait Payload: Clone {
    fn tag(&self) -> Option<&str> {
        None
    }
}

impl Payload for () {}

/// Ready-made payload: an optional classification tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Label {
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub tag: Option<String>,
}

impl Label {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: Some(tag.into()) }
    }
}

impl Payload for Label {
    fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

/// An annotation over the token range `[start, end)`.
///
/// Only `start` and `end` take part in ordering and removal; the payload is
/// never compared by the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Span<P = ()> {
    pub start: usize,
    pub end: usize,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub payload: P,
}

impl<P> Span<P> {
    pub fn new(start: usize, end: usize, payload: P) -> Self {
        Self { start, end, payload }
    }

    pub fn from_interval(interval: Interval, payload: P) -> Self {
        Self::new(interval.start, interval.end, payload)
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    /// Sort key: lexicographic `(start, end)`.
    pub fn key(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub fn matches(&self, target: &Interval) -> bool {
        self.start == target.start && self.end == target.end
    }

    pub fn len(&self) -> usize {
        self.interval().len()
    }

    pub fn is_empty(&self) -> bool {
        self.interval().is_empty()
    }
}

impl<P: Payload> Span<P> {
    /// Stable render key, `"{start}-{end}-{tag}"`.
    pub fn render_key(&self) -> String {
        format!("{}-{}-{}", self.start, self.end, self.payload.tag().unwrap_or(""))
    }
}

impl From<Interval> for Span<()> {
    fn from(interval: Interval) -> Self {
        Span::from_interval(interval, ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_overlap() {
        let a = Interval::new(1, 3);
        assert!(a.overlaps(&Interval::new(2, 4)));
        assert!(a.overlaps(&Interval::new(0, 2)));
        // Touching ranges share no token
        assert!(!a.overlaps(&Interval::new(3, 5)));
        assert!(!a.overlaps(&Interval::new(0, 1)));
    }

    #[test]
    fn test_span_matches_ignores_payload() {
        let span = Span::new(1, 3, Label::new("ORG"));
        assert!(span.matches(&Interval::new(1, 3)));
        assert!(!span.matches(&Interval::new(1, 2)));
        assert_eq!(span.len(), 2);
    }

    #[test]
    fn test_render_key() {
        assert_eq!(Span::new(1, 3, Label::new("PER")).render_key(), "1-3-PER");
        assert_eq!(Span::new(0, 2, ()).render_key(), "0-2-");
        assert_eq!(Span::new(4, 5, Label::default()).render_key(), "4-5-");
    }

    #[test]
    fn test_interval_display() {
        assert_eq!(Interval::from(2..6).to_string(), "[2, 6)");
    }
}
