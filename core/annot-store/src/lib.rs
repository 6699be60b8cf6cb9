//! Store discipline for span collections.
//!
//! The collection itself belongs to the host. Every operation here takes the
//! current collection by reference and hands back a fresh one, sorted by
//! `(start, end)`; the input is never touched.

use annot_protocol::{Interval, ProtocolError, Span};
use log::trace;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("span #{index} is invalid: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: ProtocolError,
    },
    #[error("span #{index} {found} is out of order")]
    Unsorted { index: usize, found: Interval },
    #[error("{candidate} overlaps existing span {existing}")]
    Overlap { candidate: Interval, existing: Interval },
}

/// What to do when a new span intersects one already in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OverlapPolicy {
    /// Keep both; the segmenter shadows the later one.
    #[default]
    Layer,
    /// Refuse the new span.
    Reject,
}

/// Appends `span` and re-sorts by `(start, end)`.
///
/// The sort is stable, so entries with an equal interval keep their relative
/// order and the new span lands after them.
pub fn add<P: Clone>(collection: &[Span<P>], span: Span<P>) -> Vec<Span<P>> {
    trace!("add {} to {} spans", span.interval(), collection.len());
    let mut next = Vec::with_capacity(collection.len() + 1);
    next.extend_from_slice(collection);
    next.push(span);
    next.sort_by_key(Span::key);
    next
}

/// Like [`add`], but honours an [`OverlapPolicy`].
pub fn try_add<P: Clone>(
    collection: &[Span<P>],
    span: Span<P>,
    policy: OverlapPolicy,
) -> Result<Vec<Span<P>>, StoreError> {
    if policy == OverlapPolicy::Reject {
        let candidate = span.interval();
        if let Some(existing) = find_overlap(collection, &candidate) {
            return Err(StoreError::Overlap { candidate, existing: existing.interval() });
        }
    }
    Ok(add(collection, span))
}

/// Drops the first span whose interval equals `target`. Payloads are not compared.
///
/// Without a match the result equals the input, so calling it twice is harmless.
pub fn remove<P: Clone>(collection: &[Span<P>], target: &Interval) -> Vec<Span<P>> {
    match collection.iter().position(|s| s.matches(target)) {
        Some(idx) => {
            trace!("remove {} at position {}", target, idx);
            let mut next = Vec::with_capacity(collection.len() - 1);
            next.extend_from_slice(&collection[..idx]);
            next.extend_from_slice(&collection[idx + 1..]);
            next
        }
        None => {
            trace!("remove {}: no match", target);
            collection.to_vec()
        }
    }
}

pub fn find_overlap<'a, P>(collection: &'a [Span<P>], candidate: &Interval) -> Option<&'a Span<P>> {
    collection.iter().find(|s| s.interval().overlaps(candidate))
}

pub fn is_sorted<P>(collection: &[Span<P>]) -> bool {
    collection.windows(2).all(|w| w[0].key() <= w[1].key())
}

/// Checks a host-supplied collection against a sequence of `len` tokens:
/// every span non-empty and in bounds, and the whole list sorted.
pub fn validate<P>(len: usize, collection: &[Span<P>]) -> Result<(), StoreError> {
    for (index, span) in collection.iter().enumerate() {
        Interval::checked(span.start, span.end, len)
            .map_err(|source| StoreError::Invalid { index, source })?;
        if index > 0 && collection[index - 1].key() > span.key() {
            return Err(StoreError::Unsorted { index, found: span.interval() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use annot_protocol::{Label, Payload};
    use proptest::prelude::*;

    fn tagged(start: usize, end: usize, tag: &str) -> Span<Label> {
        Span::new(start, end, Label::new(tag))
    }

    #[test]
    fn test_add_sorts_out_of_order_inserts() {
        let c = add(&[], tagged(4, 6, "a"));
        let c = add(&c, tagged(0, 2, "b"));
        let c = add(&c, tagged(0, 1, "c"));
        let keys: Vec<_> = c.iter().map(Span::key).collect();
        assert_eq!(keys, vec![(0, 1), (0, 2), (4, 6)]);
    }

    #[test]
    fn test_add_is_stable_for_equal_intervals() {
        let c = vec![tagged(1, 3, "first")];
        let c = add(&c, tagged(1, 3, "second"));
        assert_eq!(c[0].payload.tag(), Some("first"));
        assert_eq!(c[1].payload.tag(), Some("second"));
    }

    #[test]
    fn test_add_leaves_input_untouched() {
        let original = vec![tagged(2, 3, "x")];
        let next = add(&original, tagged(0, 1, "y"));
        assert_eq!(original.len(), 1);
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_remove_first_match_only() {
        let c = vec![tagged(1, 3, "a"), tagged(1, 3, "b"), tagged(4, 5, "c")];
        let next = remove(&c, &Interval::new(1, 3));
        assert_eq!(next, vec![tagged(1, 3, "b"), tagged(4, 5, "c")]);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let c = vec![tagged(1, 3, "a")];
        assert_eq!(remove(&c, &Interval::new(1, 2)), c);
        assert!(remove::<Label>(&[], &Interval::new(0, 1)).is_empty());
    }

    #[test]
    fn test_try_add_reject_policy() {
        let c = vec![tagged(1, 3, "a")];
        let err = try_add(&c, tagged(2, 4, "b"), OverlapPolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            StoreError::Overlap { candidate: Interval::new(2, 4), existing: Interval::new(1, 3) }
        );
        // Adjacent spans do not overlap
        assert_eq!(try_add(&c, tagged(3, 4, "b"), OverlapPolicy::Reject).unwrap().len(), 2);
        assert_eq!(try_add(&c, tagged(2, 4, "b"), OverlapPolicy::Layer).unwrap().len(), 2);
    }

    #[test]
    fn test_validate() {
        assert!(validate(4, &[tagged(0, 1, "a"), tagged(1, 4, "b")]).is_ok());
        assert!(matches!(
            validate(4, &[tagged(0, 5, "a")]),
            Err(StoreError::Invalid { index: 0, source: ProtocolError::OutOfBounds { .. } })
        ));
        assert!(matches!(
            validate(4, &[tagged(2, 2, "a")]),
            Err(StoreError::Invalid { index: 0, source: ProtocolError::EmptyInterval { .. } })
        ));
        assert_eq!(
            validate(4, &[tagged(2, 3, "a"), tagged(0, 1, "b")]),
            Err(StoreError::Unsorted { index: 1, found: Interval::new(0, 1) })
        );
    }

    fn arb_span() -> impl Strategy<Value = Span<Label>> {
        (0usize..20, 1usize..5, "[A-Z]{1,3}")
            .prop_map(|(start, len, tag)| Span::new(start, start + len, Label::new(tag)))
    }

    proptest! {
        #[test]
        fn prop_add_keeps_sorted(spans in prop::collection::vec(arb_span(), 0..16)) {
            let mut c: Vec<Span<Label>> = Vec::new();
            for s in spans {
                c = add(&c, s);
                prop_assert!(is_sorted(&c));
            }
        }

        #[test]
        fn prop_remove_is_idempotent(
            spans in prop::collection::vec(arb_span(), 0..12),
            target in arb_span(),
        ) {
            let mut c: Vec<Span<Label>> = Vec::new();
            for s in spans {
                c = add(&c, s);
            }
            let once = remove(&c, &target.interval());
            let twice = remove(&once, &target.interval());
            // A second removal only differs if a duplicate interval was present
            if c.iter().filter(|s| s.matches(&target.interval())).count() <= 1 {
                prop_assert_eq!(once, twice);
            } else {
                prop_assert_eq!(twice.len() + 1, once.len());
            }
        }

        #[test]
        fn prop_add_then_remove_round_trips(
            spans in prop::collection::vec(arb_span(), 0..12),
            extra in arb_span(),
        ) {
            let mut c: Vec<Span<Label>> = Vec::new();
            for s in spans {
                c = add(&c, s);
            }
            prop_assume!(!c.iter().any(|s| s.matches(&extra.interval())));
            let back = remove(&add(&c, extra.clone()), &extra.interval());
            prop_assert_eq!(back, c);
        }
    }
}
