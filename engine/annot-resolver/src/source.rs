use core::cmp::Ordering;

use annot_protocol::{NodeId, TokenIndex};

/// A point in the rendered output: an element plus a character offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl SelectionPoint {
    pub const fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Raw selection as reported by the host, in gesture order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSelection {
    pub anchor: SelectionPoint,
    pub focus: SelectionPoint,
}

impl HostSelection {
    pub const fn new(anchor: SelectionPoint, focus: SelectionPoint) -> Self {
        Self { anchor, focus }
    }

    /// Zero characters selected.
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// The host's native selection, injected instead of read from global state.
pub trait SelectionSource {
    fn selection(&self) -> Option<HostSelection>;

    /// Index tag attached to the token element that contains `node`.
    fn token_index(&self, node: NodeId) -> Option<TokenIndex>;

    /// Render order of two nodes.
    fn compare_nodes(&self, a: NodeId, b: NodeId) -> Ordering {
        a.cmp(&b)
    }

    /// Drops the native highlight.
    fn clear(&mut self);
}

/// In-memory selection source. Node ids follow render order; each node
/// optionally carries a token index tag.
///
/// Token positions that do not fit a node id land on [`MemorySelection::DETACHED`],
/// which never carries a tag.
#[derive(Debug, Clone, Default)]
pub struct MemorySelection {
    tags: Vec<Option<TokenIndex>>,
    current: Option<HostSelection>,
    clears: usize,
}

impl MemorySelection {
    pub const DETACHED: NodeId = NodeId::new(u32::MAX);

    /// One node per token, node `i` tagged with token `i`.
    pub fn for_tokens(count: usize) -> Self {
        Self {
            tags: (0..count).map(|i| Some(TokenIndex::new(i))).collect(),
            ..Self::default()
        }
    }

    /// Node at render position `position`, or [`Self::DETACHED`] past the id range.
    pub fn node(position: usize) -> NodeId {
        u32::try_from(position)
            .ok()
            .filter(|&id| id != u32::MAX)
            .map(NodeId::new)
            .unwrap_or(Self::DETACHED)
    }

    /// Appends an untagged node (whitespace, chrome) and returns its id.
    pub fn push_untagged(&mut self) -> NodeId {
        self.tags.push(None);
        Self::node(self.tags.len() - 1)
    }

    pub fn select(&mut self, anchor: SelectionPoint, focus: SelectionPoint) {
        self.current = Some(HostSelection::new(anchor, focus));
    }

    /// Selects from token `anchor` to token `focus` using the per-token nodes.
    pub fn select_tokens(&mut self, anchor: (usize, usize), focus: (usize, usize)) {
        self.select(
            SelectionPoint::new(Self::node(anchor.0), anchor.1),
            SelectionPoint::new(Self::node(focus.0), focus.1),
        );
    }

    pub fn is_cleared(&self) -> bool {
        self.current.is_none()
    }

    /// How many times the host highlight was cleared.
    pub fn clear_count(&self) -> usize {
        self.clears
    }
}

impl SelectionSource for MemorySelection {
    fn selection(&self) -> Option<HostSelection> {
        self.current
    }

    fn token_index(&self, node: NodeId) -> Option<TokenIndex> {
        if node == Self::DETACHED {
            return None;
        }
        self.tags.get(node.get() as usize).copied().flatten()
    }

    fn clear(&mut self) {
        self.current = None;
        self.clears += 1;
    }
}
