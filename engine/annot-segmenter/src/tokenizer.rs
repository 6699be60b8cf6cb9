use core::ops::Range;

use annot_protocol::TokenIndex;
use nom::{
    bytes::complete::{take_till1, take_while},
    IResult,
};

pub type ByteRange = Range<usize>;

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace)(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace)(input)
}

/// Splits `text` on Unicode whitespace, keeping the byte range of every token.
///
/// Punctuation stays attached to its word; hosts that need finer tokens
/// should supply their own sequence.
pub fn tokenize(text: &str) -> Vec<(ByteRange, &str)> {
    let mut input = text;
    let mut result = Vec::new();

    loop {
        input = match whitespace(input) {
            Ok((rest, _)) => rest,
            Err(_) => break,
        };
        if input.is_empty() {
            break;
        }

        match word(input) {
            Ok((rest, token)) => {
                let start = text.len() - input.len();
                result.push((start..start + token.len(), token));
                input = rest;
            }
            Err(_) => break,
        }
    }

    result
}

/// Maps a byte offset in the tokenized text back to the token covering it.
/// Offsets that fall on whitespace resolve to nothing.
pub fn token_at_byte(ranges: &[ByteRange], offset: usize) -> Option<TokenIndex> {
    let idx = ranges.partition_point(|r| r.end <= offset);
    ranges
        .get(idx)
        .filter(|r| r.start <= offset)
        .map(|_| TokenIndex::new(idx))
}
