use annot_protocol::{Interval, Payload, Span};

use crate::render::MarkView;

/// Builds the span to store from a resolved interval and the tokens it covers.
pub trait SpanEnricher<P> {
    fn enrich(&self, interval: Interval, tokens: &[String]) -> Span<P>;
}

impl<P, F> SpanEnricher<P> for F
where
    F: Fn(Interval, &[String]) -> Span<P>,
{
    fn enrich(&self, interval: Interval, tokens: &[String]) -> Span<P> {
        self(interval, tokens)
    }
}

/// Default enricher: the bare interval with a default payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityEnricher;

impl<P: Default> SpanEnricher<P> for IdentityEnricher {
    fn enrich(&self, interval: Interval, _tokens: &[String]) -> Span<P> {
        Span::from_interval(interval, P::default())
    }
}

pub trait MarkRenderer<P> {
    type Output;

    fn render_mark(&self, mark: &MarkView<'_, P>) -> Self::Output;
}

/// Default mark rendering: `[quick brown]`, or `[quick brown|ADJ]` with a tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightMark;

impl<P: Payload> MarkRenderer<P> for HighlightMark {
    type Output = String;

    fn render_mark(&self, mark: &MarkView<'_, P>) -> String {
        match mark.span.payload.tag() {
            Some(tag) => format!("[{}|{}]", mark.content, tag),
            None => format!("[{}]", mark.content),
        }
    }
}

/// Receives every new collection. The host must adopt it as its current value.
pub trait ChangeSink<P> {
    fn on_change(&mut self, value: Vec<Span<P>>);
}

impl<P, F> ChangeSink<P> for F
where
    F: FnMut(Vec<Span<P>>),
{
    fn on_change(&mut self, value: Vec<Span<P>>) {
        self(value)
    }
}
