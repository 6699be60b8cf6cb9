pub mod tokenizer;

pub use tokenizer::{token_at_byte, tokenize, ByteRange};

use annot_protocol::{Segment, Span};
use log::{debug, trace, warn};

/// Partitions `tokens` into render segments.
///
/// `spans` must be sorted by `(start, end)`. Each position either starts a
/// marked run (the first usable span beginning there) or yields a single plain
/// token, so the output always covers `[0, tokens.len())` exactly once.
///
/// Spans that cannot be rendered are skipped rather than trusted:
/// - a span starting inside an earlier marked run is shadowed,
/// - an empty span or one ending past the last token is dropped with a warning.
pub fn segment<'a, S, P>(tokens: &'a [S], spans: &'a [Span<P>]) -> Vec<Segment<'a, S, P>> {
    let n = tokens.len();
    let mut out = Vec::with_capacity(n);
    let mut cursor = 0;
    let mut i = 0;

    while i < n {
        match next_run(spans, &mut cursor, i, n) {
            Some(span) => {
                trace!("marked run [{}, {})", span.start, span.end);
                out.push(Segment::marked(span, &tokens[span.start..span.end]));
                i = span.end;
            }
            None => {
                out.push(Segment::plain(i, &tokens[i..i + 1]));
                i += 1;
            }
        }
    }

    if cursor < spans.len() {
        debug!("{} span(s) left unrendered past token {}", spans.len() - cursor, n);
    }

    out
}

/// Advances `cursor` to the span that should open a run at `i`, if any.
fn next_run<'a, P>(
    spans: &'a [Span<P>],
    cursor: &mut usize,
    i: usize,
    n: usize,
) -> Option<&'a Span<P>> {
    loop {
        let span = spans.get(*cursor)?;
        if span.start > i {
            return None;
        }
        *cursor += 1;

        if span.start < i {
            debug!("span [{}, {}) shadowed by an earlier run", span.start, span.end);
            continue;
        }
        if span.end <= span.start || span.end > n {
            warn!("span [{}, {}) does not fit {} tokens, skipped", span.start, span.end, n);
            continue;
        }
        return Some(span);
    }
}

/// Pairs every marked segment with the span it renders.
pub fn marks<'s, 'a, S, P>(
    segments: &'s [Segment<'a, S, P>],
) -> impl Iterator<Item = (&'s Segment<'a, S, P>, &'a Span<P>)> + 's {
    segments.iter().filter_map(|seg| seg.mark.map(|span| (seg, span)))
}
