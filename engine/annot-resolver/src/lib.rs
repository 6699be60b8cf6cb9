//! Turns a host text selection into a whole-token interval.

pub mod source;

pub use source::{HostSelection, MemorySelection, SelectionPoint, SelectionSource};

use core::cmp::Ordering;
use core::fmt;

use annot_protocol::Interval;
use log::debug;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Anchor,
    Focus,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Anchor => write!(f, "anchor"),
            Endpoint::Focus => write!(f, "focus"),
        }
    }
}

/// Why a selection produced no interval. The host highlight should be
/// cleared in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no active selection")]
    NoSelection,
    #[error("selection is empty")]
    Empty,
    #[error("{endpoint} is not inside a token")]
    Unresolved { endpoint: Endpoint },
}

/// Reads the current selection from `source` and resolves it.
pub fn resolve<S: SelectionSource + ?Sized>(source: &S) -> Result<Interval, SelectionError> {
    let selection = source.selection().ok_or(SelectionError::NoSelection)?;
    resolve_selection(source, &selection)
}

/// Normalizes `selection` to `[first, last + 1)` over the tokens it touches.
///
/// Backwards selections are flipped first: the anchor comes after the focus
/// when its node renders later, or, within one node, when its offset is larger.
/// Partially covered boundary tokens count as fully selected.
pub fn resolve_selection<S: SelectionSource + ?Sized>(
    source: &S,
    selection: &HostSelection,
) -> Result<Interval, SelectionError> {
    if selection.is_collapsed() {
        return Err(SelectionError::Empty);
    }

    let anchor = source
        .token_index(selection.anchor.node)
        .ok_or(SelectionError::Unresolved { endpoint: Endpoint::Anchor })?;
    let focus = source
        .token_index(selection.focus.node)
        .ok_or(SelectionError::Unresolved { endpoint: Endpoint::Focus })?;

    let (mut start, mut end) = ((anchor.get(), Endpoint::Anchor), (focus.get(), Endpoint::Focus));
    if is_backwards(source, selection) {
        core::mem::swap(&mut start, &mut end);
    }
    if start.0 > end.0 {
        // Index tags disagree with render order; trust the tags.
        debug!("selection tags out of render order: {} > {}", start.0, end.0);
        core::mem::swap(&mut start, &mut end);
    }

    let (last, endpoint) = end;
    let end = last.checked_add(1).ok_or(SelectionError::Unresolved { endpoint })?;
    Ok(Interval::new(start.0, end))
}

fn is_backwards<S: SelectionSource + ?Sized>(source: &S, selection: &HostSelection) -> bool {
    match source.compare_nodes(selection.anchor.node, selection.focus.node) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => selection.anchor.offset > selection.focus.offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annot_protocol::NodeId;

    fn point(node: u32, offset: usize) -> SelectionPoint {
        SelectionPoint::new(NodeId::new(node), offset)
    }

    #[test]
    fn test_forward_selection() {
        let mut src = MemorySelection::for_tokens(8);
        src.select_tokens((2, 1), (5, 3));
        assert_eq!(resolve(&src), Ok(Interval::new(2, 6)));
    }

    #[test]
    fn test_backwards_selection_is_flipped() {
        let mut src = MemorySelection::for_tokens(8);
        src.select_tokens((5, 0), (2, 4));
        assert_eq!(resolve(&src), Ok(Interval::new(2, 6)));
    }

    #[test]
    fn test_single_token_either_direction() {
        let mut src = MemorySelection::for_tokens(4);
        src.select_tokens((1, 0), (1, 3));
        assert_eq!(resolve(&src), Ok(Interval::new(1, 2)));
        src.select_tokens((1, 3), (1, 0));
        assert_eq!(resolve(&src), Ok(Interval::new(1, 2)));
    }

    #[test]
    fn test_collapsed_selection() {
        let mut src = MemorySelection::for_tokens(4);
        src.select_tokens((2, 1), (2, 1));
        assert_eq!(resolve(&src), Err(SelectionError::Empty));
    }

    #[test]
    fn test_no_selection() {
        let src = MemorySelection::for_tokens(4);
        assert_eq!(resolve(&src), Err(SelectionError::NoSelection));
    }

    #[test]
    fn test_untagged_endpoints() {
        let mut src = MemorySelection::for_tokens(4);
        let chrome = src.push_untagged();
        assert_eq!(chrome, NodeId::new(4));

        src.select(point(4, 0), point(1, 2));
        assert_eq!(
            resolve(&src),
            Err(SelectionError::Unresolved { endpoint: Endpoint::Anchor })
        );

        src.select(point(0, 0), point(4, 1));
        assert_eq!(
            resolve(&src),
            Err(SelectionError::Unresolved { endpoint: Endpoint::Focus })
        );
    }

    #[test]
    fn test_clear_tracks_host_highlight() {
        let mut src = MemorySelection::for_tokens(2);
        src.select_tokens((0, 0), (1, 1));
        assert!(!src.is_cleared());
        src.clear();
        assert!(src.is_cleared());
        assert_eq!(src.clear_count(), 1);
    }

    #[test]
    fn test_position_past_node_ids_is_unresolved() {
        let mut src = MemorySelection::for_tokens(4);
        src.select_tokens(((1usize << 32) + 1, 0), (2, 0));
        assert_eq!(
            resolve(&src),
            Err(SelectionError::Unresolved { endpoint: Endpoint::Anchor })
        );

        src.select_tokens((0, 0), (u32::MAX as usize, 0));
        assert_eq!(
            resolve(&src),
            Err(SelectionError::Unresolved { endpoint: Endpoint::Focus })
        );
    }

    /// Tags node `n` with token `n`, except node 9 which claims the largest index.
    struct Unbounded(HostSelection);

    impl SelectionSource for Unbounded {
        fn selection(&self) -> Option<HostSelection> {
            Some(self.0)
        }
        fn token_index(&self, node: NodeId) -> Option<annot_protocol::TokenIndex> {
            let index = if node.get() == 9 { usize::MAX } else { node.get() as usize };
            Some(annot_protocol::TokenIndex::new(index))
        }
        fn clear(&mut self) {}
    }

    #[test]
    fn test_last_index_overflow_is_unresolved() {
        let src = Unbounded(HostSelection::new(point(2, 0), point(9, 0)));
        assert_eq!(
            resolve(&src),
            Err(SelectionError::Unresolved { endpoint: Endpoint::Focus })
        );

        // Backwards: the anchor ends up as the last token
        let src = Unbounded(HostSelection::new(point(9, 0), point(2, 0)));
        assert_eq!(
            resolve(&src),
            Err(SelectionError::Unresolved { endpoint: Endpoint::Anchor })
        );
    }

    struct Reversed(MemorySelection);

    impl SelectionSource for Reversed {
        fn selection(&self) -> Option<HostSelection> {
            self.0.selection()
        }
        fn token_index(&self, node: NodeId) -> Option<annot_protocol::TokenIndex> {
            self.0.token_index(node)
        }
        fn compare_nodes(&self, a: NodeId, b: NodeId) -> Ordering {
            b.cmp(&a)
        }
        fn clear(&mut self) {
            self.0.clear()
        }
    }

    #[test]
    fn test_direction_follows_render_order() {
        let mut inner = MemorySelection::for_tokens(6);
        inner.select_tokens((4, 0), (1, 0));
        let src = Reversed(inner);
        // Render order says forward; tags still yield an ascending interval
        assert_eq!(resolve(&src), Ok(Interval::new(1, 5)));
    }
}
