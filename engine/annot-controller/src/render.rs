use annot_protocol::{Interval, Span};

/// Sent back by the host when a rendered mark is clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkClick {
    pub start: usize,
    pub end: usize,
}

impl MarkClick {
    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }
}

impl From<Interval> for MarkClick {
    fn from(i: Interval) -> Self {
        Self { start: i.start, end: i.end }
    }
}

/// Everything a mark renderer needs for one marked run.
#[derive(Debug, Clone)]
pub struct MarkView<'a, P> {
    pub key: String,
    pub start: usize,
    pub end: usize,
    pub content: String,
    pub span: &'a Span<P>,
    pub click: MarkClick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderNode<M> {
    Token { index: usize, content: String },
    Mark(M),
}

impl<M> RenderNode<M> {
    pub fn is_mark(&self) -> bool {
        matches!(self, RenderNode::Mark(_))
    }
}
