use std::cell::RefCell;
use std::rc::Rc;

use annot_controller::{
    AnnotatorController, ControllerConfig, GestureOutcome, MarkClick, MarkRenderer, MarkView,
    RenderNode,
};
use annot_protocol::{Interval, Label, NodeId, Span, TokenIndex};
use annot_resolver::{HostSelection, SelectionPoint, SelectionSource};
use annot_store::OverlapPolicy;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// One render unit as handed to the React side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentView {
    pub start: usize,
    pub end: usize,
    pub mark: bool,
    pub content: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Renders marks as serializable views; React draws them.
struct ViewMark;

impl MarkRenderer<Label> for ViewMark {
    type Output = SegmentView;

    fn render_mark(&self, mark: &MarkView<'_, Label>) -> SegmentView {
        SegmentView {
            start: mark.start,
            end: mark.end,
            mark: true,
            content: mark.content.clone(),
            key: mark.key.clone(),
            tag: mark.span.payload.tag.clone(),
        }
    }
}

/// Selection endpoints read by JS from `window.getSelection()`: the `data-i`
/// of each endpoint's parent element (absent when untagged), its position in
/// document order, and the character offset.
#[derive(Debug, Deserialize)]
pub struct SelectionEvent {
    pub anchor: EventPoint,
    pub focus: EventPoint,
}

#[derive(Debug, Deserialize)]
pub struct EventPoint {
    pub order: u32,
    pub index: Option<usize>,
    pub offset: usize,
}

/// Adapts a decoded event to the resolver. Clearing stays on the JS side,
/// after every `select` call.
struct EventSource {
    event: SelectionEvent,
}

impl SelectionSource for EventSource {
    fn selection(&self) -> Option<HostSelection> {
        Some(HostSelection::new(
            SelectionPoint::new(NodeId::new(self.event.anchor.order), self.event.anchor.offset),
            SelectionPoint::new(NodeId::new(self.event.focus.order), self.event.focus.offset),
        ))
    }

    fn token_index(&self, node: NodeId) -> Option<TokenIndex> {
        [&self.event.anchor, &self.event.focus]
            .into_iter()
            .find(|p| p.order == node.get())
            .and_then(|p| p.index)
            .map(TokenIndex::new)
    }

    fn clear(&mut self) {}
}

type Latest = Rc<RefCell<Option<Vec<Span<Label>>>>>;

/// Native side of the annotator: owns the controller, never the spans.
pub struct Annotator {
    tokens: Vec<String>,
    controller: AnnotatorController<Label, ViewMark>,
    latest: Latest,
    tag: Rc<RefCell<Option<String>>>,
}

impl Annotator {
    pub fn new(tokens: Vec<String>, config: ControllerConfig) -> Self {
        let latest: Latest = Rc::default();
        let tag: Rc<RefCell<Option<String>>> = Rc::default();
        let sink_latest = Rc::clone(&latest);
        let enrich_tag = Rc::clone(&tag);

        let controller = AnnotatorController::<Label>::builder()
            .config(config)
            .enricher(move |interval: Interval, _: &[String]| {
                Span::from_interval(interval, Label { tag: enrich_tag.borrow().clone() })
            })
            .renderer(ViewMark)
            .sink(move |value: Vec<Span<Label>>| {
                *sink_latest.borrow_mut() = Some(value);
            })
            .build();

        Self { tokens, controller, latest, tag }
    }

    pub fn segments(&self, value: &[Span<Label>]) -> Vec<SegmentView> {
        self.controller
            .render(&self.tokens, value)
            .into_iter()
            .map(|node| match node {
                RenderNode::Token { index, content } => SegmentView {
                    start: index,
                    end: index + 1,
                    mark: false,
                    content,
                    key: index.to_string(),
                    tag: None,
                },
                RenderNode::Mark(view) => view,
            })
            .collect()
    }

    /// Runs a mouseup gesture. `None` means nothing changed.
    pub fn select(
        &mut self,
        event: SelectionEvent,
        tag: Option<String>,
        value: &[Span<Label>],
    ) -> (GestureOutcome, Option<Vec<Span<Label>>>) {
        *self.tag.borrow_mut() = tag;
        let mut source = EventSource { event };
        self.controller.pointer_down();
        let outcome = self.controller.pointer_release(&mut source, &self.tokens, value);
        (outcome, self.latest.borrow_mut().take())
    }

    pub fn click(&mut self, click: MarkClick, value: &[Span<Label>]) -> Option<Vec<Span<Label>>> {
        self.controller.mark_click(click, value);
        self.latest.borrow_mut().take()
    }
}

fn js_err(e: impl ToString) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_err)
}

fn spans_from_js(value: JsValue) -> Result<Vec<Span<Label>>, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(js_err)
}

/// Browser handle for one token sequence. The span collection stays in
/// React state; each call takes the current value and returns the next one.
#[wasm_bindgen]
pub struct TokenAnnotator {
    inner: Annotator,
}

#[wasm_bindgen]
impl TokenAnnotator {
    #[wasm_bindgen(constructor)]
    pub fn new(tokens: Vec<String>, reject_overlap: bool) -> Self {
        let overlap = if reject_overlap { OverlapPolicy::Reject } else { OverlapPolicy::Layer };
        let config = ControllerConfig { overlap, ..ControllerConfig::default() };
        Self { inner: Annotator::new(tokens, config) }
    }

    pub fn segments(&self, value: JsValue) -> Result<JsValue, JsValue> {
        let spans = spans_from_js(value)?;
        to_js(&self.inner.segments(&spans))
    }

    /// Handles mouseup. Returns the new collection, or `null` when the
    /// selection was dropped or refused. JS clears the native selection either way.
    pub fn select(&mut self, value: JsValue, event: JsValue, tag: Option<String>) -> Result<JsValue, JsValue> {
        let spans = spans_from_js(value)?;
        let event: SelectionEvent = serde_wasm_bindgen::from_value(event).map_err(js_err)?;
        match self.inner.select(event, tag, &spans) {
            (_, Some(next)) => to_js(&next),
            (_, None) => Ok(JsValue::NULL),
        }
    }

    /// Handles a click on a mark. Always returns a collection.
    pub fn click(&mut self, value: JsValue, start: usize, end: usize) -> Result<JsValue, JsValue> {
        let spans = spans_from_js(value)?;
        match self.inner.click(MarkClick { start, end }, &spans) {
            Some(next) => to_js(&next),
            None => to_js(&spans),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annot_resolver::{Endpoint, SelectionError};

    fn fox() -> Annotator {
        let tokens = ["The", "quick", "brown", "fox"].iter().map(|s| s.to_string()).collect();
        Annotator::new(tokens, ControllerConfig::default())
    }

    fn event(anchor: (u32, Option<usize>), focus: (u32, Option<usize>)) -> SelectionEvent {
        SelectionEvent {
            anchor: EventPoint { order: anchor.0, index: anchor.1, offset: 0 },
            focus: EventPoint { order: focus.0, index: focus.1, offset: 1 },
        }
    }

    #[test]
    fn test_segment_views_keys() {
        let spans = vec![Span::new(1, 3, Label::new("ADJ"))];
        let views = fox().segments(&spans);
        let keys: Vec<&str> = views.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, vec!["0", "1-3-ADJ", "3"]);
        assert_eq!(views[1].content, "quick brown");
        assert_eq!(views[1].tag.as_deref(), Some("ADJ"));
    }

    #[test]
    fn test_backwards_select_adds_span() {
        let mut annotator = fox();
        let (outcome, next) = annotator.select(event((9, Some(2)), (3, Some(1))), Some("ADJ".into()), &[]);
        assert_eq!(outcome, GestureOutcome::Added(Interval::new(1, 3)));
        assert_eq!(next, Some(vec![Span::new(1, 3, Label::new("ADJ"))]));
    }

    #[test]
    fn test_untagged_endpoint_changes_nothing() {
        let mut annotator = fox();
        let (outcome, next) = annotator.select(event((1, None), (3, Some(2))), None, &[]);
        assert_eq!(
            outcome,
            GestureOutcome::NoSelection(SelectionError::Unresolved { endpoint: Endpoint::Anchor })
        );
        assert_eq!(next, None);
    }

    #[test]
    fn test_largest_index_changes_nothing() {
        let mut annotator = fox();
        let (outcome, next) = annotator.select(event((1, Some(0)), (3, Some(usize::MAX))), None, &[]);
        assert_eq!(
            outcome,
            GestureOutcome::NoSelection(SelectionError::Unresolved { endpoint: Endpoint::Focus })
        );
        assert_eq!(next, None);
    }

    #[test]
    fn test_index_past_tokens_is_rejected() {
        let mut annotator = fox();
        let (outcome, next) = annotator.select(event((1, Some(2)), (3, Some(7))), None, &[]);
        assert_eq!(outcome, GestureOutcome::Rejected(Interval::new(2, 8)));
        assert_eq!(next, None);
    }

    #[test]
    fn test_click_removes_span() {
        let mut annotator = fox();
        let value = vec![Span::new(1, 3, Label::new("ADJ"))];
        assert_eq!(annotator.click(MarkClick { start: 1, end: 3 }, &value), Some(vec![]));
        assert_eq!(annotator.click(MarkClick { start: 0, end: 1 }, &value), Some(value.clone()));
    }
}
