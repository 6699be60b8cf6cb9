//! Wires selection gestures and mark clicks to the store and the segmenter.
//!
//! The controller never keeps the span collection. Every handler receives the
//! host's current value, and every change goes out through the [`ChangeSink`].

pub mod config;
pub mod render;
pub mod strategy;

pub use config::ControllerConfig;
pub use render::{MarkClick, MarkView, RenderNode};
pub use strategy::{ChangeSink, HighlightMark, IdentityEnricher, MarkRenderer, SpanEnricher};

use annot_protocol::{Interval, Payload, Segment, Span};
use annot_resolver::{resolve, SelectionError, SelectionSource};
use annot_store::{OverlapPolicy, StoreError};
use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    AwaitingSelectionEnd,
}

/// What a gesture did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// A span was stored and the sink notified.
    Added(Interval),
    /// A matching span was dropped and the sink notified.
    Removed(Interval),
    /// Nothing matched the click; the sink got the unchanged collection.
    Unchanged(Interval),
    /// No sink is installed.
    Ignored,
    /// The span was refused by the overlap policy or does not fit the tokens.
    Rejected(Interval),
    NoSelection(SelectionError),
}

pub struct AnnotatorController<P, R = HighlightMark> {
    enricher: Box<dyn SpanEnricher<P>>,
    renderer: R,
    sink: Option<Box<dyn ChangeSink<P>>>,
    config: ControllerConfig,
    state: GestureState,
}

impl<P: Payload + Default + 'static> AnnotatorController<P, HighlightMark> {
    pub fn builder() -> ControllerBuilder<P, HighlightMark> {
        ControllerBuilder::new(IdentityEnricher)
    }
}

impl<P, R> AnnotatorController<P, R>
where
    P: Payload,
    R: MarkRenderer<P>,
{
    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Without a sink no gesture has any effect.
    pub fn is_read_only(&self) -> bool {
        self.sink.is_none()
    }

    pub fn pointer_down(&mut self) {
        self.state = GestureState::AwaitingSelectionEnd;
    }

    /// Handles a pointer release: resolve the selection, enrich, store, notify,
    /// then clear the host highlight.
    pub fn pointer_release<S>(
        &mut self,
        source: &mut S,
        tokens: &[String],
        value: &[Span<P>],
    ) -> GestureOutcome
    where
        S: SelectionSource + ?Sized,
    {
        self.state = GestureState::Idle;
        let Some(sink) = self.sink.as_deref_mut() else {
            return GestureOutcome::Ignored;
        };

        let interval = match resolve(&*source) {
            Ok(interval) => interval,
            Err(e) => {
                debug!("selection dropped: {}", e);
                source.clear();
                return GestureOutcome::NoSelection(e);
            }
        };
        if interval.end > tokens.len() {
            warn!("selection {} exceeds {} tokens", interval, tokens.len());
            source.clear();
            return GestureOutcome::Rejected(interval);
        }

        let span = self.enricher.enrich(interval, &tokens[interval.range()]);
        let stored = span.interval();
        match annot_store::try_add(value, span, self.config.overlap) {
            Ok(next) => {
                debug!("added {} ({} spans)", stored, next.len());
                sink.on_change(next);
                source.clear();
                GestureOutcome::Added(stored)
            }
            Err(StoreError::Overlap { candidate, existing }) => {
                debug!("rejected {}: overlaps {}", candidate, existing);
                source.clear();
                GestureOutcome::Rejected(candidate)
            }
            Err(e) => {
                warn!("add failed: {}", e);
                source.clear();
                GestureOutcome::Rejected(stored)
            }
        }
    }

    /// Handles a click on a rendered mark. The sink is notified even when
    /// nothing matched.
    pub fn mark_click(&mut self, click: MarkClick, value: &[Span<P>]) -> GestureOutcome {
        self.state = GestureState::Idle;
        let Some(sink) = self.sink.as_deref_mut() else {
            return GestureOutcome::Ignored;
        };

        let target = click.interval();
        let next = annot_store::remove(value, &target);
        let removed = next.len() < value.len();
        sink.on_change(next);

        if removed {
            debug!("removed {}", target);
            GestureOutcome::Removed(target)
        } else {
            debug!("remove {}: no match", target);
            GestureOutcome::Unchanged(target)
        }
    }

    pub fn segments<'a>(
        &self,
        tokens: &'a [String],
        value: &'a [Span<P>],
    ) -> Vec<Segment<'a, String, P>> {
        annot_segmenter::segment(tokens, value)
    }

    /// Segments the tokens and renders each marked run with the mark renderer.
    pub fn render(&self, tokens: &[String], value: &[Span<P>]) -> Vec<RenderNode<R::Output>> {
        self.segments(tokens, value)
            .into_iter()
            .map(|seg| match seg.mark {
                Some(span) => {
                    let view = MarkView {
                        key: span.render_key(),
                        start: seg.start,
                        end: seg.end,
                        content: seg.content(),
                        span,
                        click: MarkClick::from(span.interval()),
                    };
                    RenderNode::Mark(self.renderer.render_mark(&view))
                }
                None => RenderNode::Token { index: seg.start, content: seg.content() },
            })
            .collect()
    }
}

pub struct ControllerBuilder<P, R> {
    enricher: Box<dyn SpanEnricher<P>>,
    renderer: R,
    sink: Option<Box<dyn ChangeSink<P>>>,
    config: ControllerConfig,
}

impl<P: 'static> ControllerBuilder<P, HighlightMark> {
    /// Starts from a custom enricher, for payloads without a useful default.
    pub fn new(enricher: impl SpanEnricher<P> + 'static) -> Self {
        Self {
            enricher: Box::new(enricher),
            renderer: HighlightMark,
            sink: None,
            config: ControllerConfig::default(),
        }
    }
}

impl<P: 'static, R> ControllerBuilder<P, R> {
    pub fn enricher(mut self, enricher: impl SpanEnricher<P> + 'static) -> Self {
        self.enricher = Box::new(enricher);
        self
    }

    pub fn renderer<R2: MarkRenderer<P>>(self, renderer: R2) -> ControllerBuilder<P, R2> {
        ControllerBuilder {
            enricher: self.enricher,
            renderer,
            sink: self.sink,
            config: self.config,
        }
    }

    pub fn sink(mut self, sink: impl ChangeSink<P> + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn overlap(mut self, policy: OverlapPolicy) -> Self {
        self.config.overlap = policy;
        self
    }

    pub fn build(self) -> AnnotatorController<P, R> {
        AnnotatorController {
            enricher: self.enricher,
            renderer: self.renderer,
            sink: self.sink,
            config: self.config,
            state: GestureState::Idle,
        }
    }
}
