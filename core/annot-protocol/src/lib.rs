//! Value types shared by every layer of the annotator.
//!
//! Tokens are identified by position only. A [`Span`] attaches a caller
//! payload to a half-open token range, and a [`Segment`] is the transient
//! render unit the segmenter derives from a token sequence and its spans.

pub mod ids;
pub mod model;
pub mod segment;

pub use ids::{NodeId, TokenIndex};
pub use model::*;
pub use segment::Segment;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty interval [{start}, {end})")]
    EmptyInterval { start: usize, end: usize },
    #[error("interval [{start}, {end}) exceeds token count {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },
}
