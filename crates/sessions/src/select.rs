//! Interprets a reply's text as a 1-based pick from an option list.

use crate::error::SelectionError;

/// Parse `text` as a choice among `count` options.
///
/// Accepts a whitespace-trimmed base-10 integer in `1..=count` and returns
/// the zero-based index. No fuzzy matching: the replies these bots expect
/// are numeric only.
pub fn parse_choice(text: &str, count: usize) -> Result<usize, SelectionError> {
    let n: i64 = text
        .trim()
        .parse()
        .map_err(|_| SelectionError::NotANumber)?;
    if n < 1 || n > count as i64 {
        return Err(SelectionError::OutOfRange { got: n, max: count });
    }
    Ok((n - 1) as usize)
}
