//! Splitting of `;`-delimited prefixed queries such as `USQL;TABLE;City;SELECT ...`.

use crate::consts::PREFIX_SEPARATOR;
use crate::error::QueryError;

/// Split `input` into exactly `count` pieces on `;`.
///
/// The last piece keeps any further separators verbatim, so payloads such as
/// `SELECT city FROM usersession WHERE x IN('a;b')` survive intact.
pub fn split(input: &str, count: usize) -> Result<Vec<&str>, QueryError> {
    let pieces: Vec<&str> = input.splitn(count, PREFIX_SEPARATOR).collect();
    if pieces.len() != count {
        return Err(QueryError::IncorrectPrefix {
            expected: count,
            found: pieces.len(),
        });
    }
    Ok(pieces)
}

/// Split `input` like [`split`] and require the first piece to be `tag`.
///
/// Only the pieces after the tag are returned.
pub fn split_tagged<'a>(
    input: &'a str,
    tag: &'static str,
    count: usize,
) -> Result<Vec<&'a str>, QueryError> {
    let mut pieces = split(input, count)?;
    if pieces[0] != tag {
        return Err(QueryError::UnrecognizedPrefix {
            expected: tag,
            found: pieces[0].to_string(),
        });
    }
    pieces.remove(0);
    Ok(pieces)
}

/// Whether `input` begins with `tag` immediately followed by `;`.
pub fn has_tag(input: &str, tag: &str) -> bool {
    input
        .strip_prefix(tag)
        .is_some_and(|rest| rest.starts_with(PREFIX_SEPARATOR))
}
