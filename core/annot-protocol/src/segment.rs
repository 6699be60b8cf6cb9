use core::ops::Range;

use crate::model::Span;

/// One render unit: either a single plain token or a marked run backed by a span.
///
/// Segments borrow from the token sequence and the span collection they were
/// derived from and are meant to be consumed right away.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<'a, S, P = ()> {
    pub start: usize,
    pub end: usize,
    pub tokens: &'a [S],
    pub mark: Option<&'a Span<P>>,
}

impl<'a, S, P> Segment<'a, S, P> {
    pub fn plain(index: usize, tokens: &'a [S]) -> Self {
        Self { start: index, end: index + 1, tokens, mark: None }
    }

    pub fn marked(span: &'a Span<P>, tokens: &'a [S]) -> Self {
        Self { start: span.start, end: span.end, tokens, mark: Some(span) }
    }

    pub fn is_marked(&self) -> bool {
        self.mark.is_some()
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl<'a, S: AsRef<str>, P> Segment<'a, S, P> {
    /// Covered tokens joined by a single space.
    pub fn content(&self) -> String {
        let mut out = String::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(token.as_ref());
        }
        out
    }
}
