//! Parsing and encoding of `key=value` pairs joined by `&`.
//!
//! Every query grammar funnels through one codec here. Callers configure it
//! with [`ParseOptions`]: whether an empty body is acceptable, and which keys
//! are recognised.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::consts::{KEY_VALUE_SEPARATOR, PAIR_SEPARATOR};
use crate::error::QueryError;

/// Decides whether a key is recognised by a query grammar.
///
/// Validators hold no state and may be shared between threads.
pub trait KeyValidator: Send + Sync {
    fn validate(&self, key: &str) -> bool;
}

/// Accepts exactly the listed keys (case-sensitive).
#[derive(Debug, Clone, Copy)]
pub struct AllowedKeys(pub &'static [&'static str]);

impl KeyValidator for AllowedKeys {
    fn validate(&self, key: &str) -> bool {
        self.0.iter().any(|k| *k == key)
    }
}

/// Accepts every key. Used when only the shape of the input matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyKey;

impl KeyValidator for AnyKey {
    fn validate(&self, _key: &str) -> bool {
        true
    }
}

/// Configuration for a single [`parse`] call.
#[derive(Clone, Copy)]
pub struct ParseOptions<'a> {
    /// Whether an empty input yields zero pairs instead of an error.
    pub allow_empty_input: bool,
    pub validator: &'a dyn KeyValidator,
}

impl<'a> ParseOptions<'a> {
    /// Empty input is an error.
    pub fn strict(validator: &'a dyn KeyValidator) -> Self {
        Self {
            allow_empty_input: false,
            validator,
        }
    }

    /// Empty input yields zero pairs.
    pub fn lenient(validator: &'a dyn KeyValidator) -> Self {
        Self {
            allow_empty_input: true,
            validator,
        }
    }
}

/// Assigns each key a fixed position in an encoded query string.
pub trait KeyOrderer: Send + Sync {
    fn position(&self, key: &str) -> Option<usize>;
}

/// Orders keys by their index in the listed slice.
#[derive(Debug, Clone, Copy)]
pub struct FixedOrder(pub &'static [&'static str]);

impl KeyOrderer for FixedOrder {
    fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|k| *k == key)
    }
}

/// Key-value pairs in the order they were inserted. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValuePairs {
    pairs: Vec<(String, String)>,
}

impl KeyValuePairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs for the fields of a typed query. Keys must be distinct; absent
    /// and empty values are skipped.
    pub(crate) fn from_fields<'v>(
        fields: impl IntoIterator<Item = (&'static str, Option<&'v str>)>,
    ) -> Self {
        let pairs = fields
            .into_iter()
            .filter_map(|(key, value)| match value {
                Some(value) if !value.is_empty() => Some((key.to_string(), value.to_string())),
                _ => None,
            })
            .collect();
        Self { pairs }
    }

    /// Append a pair, rejecting a key that is already present.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), QueryError> {
        let key = key.into();
        if self.contains_key(&key) {
            return Err(QueryError::DuplicateKey(key));
        }
        self.pairs.push((key, value.into()));
        Ok(())
    }

    /// Append a pair only when `value` is present and non-empty.
    pub fn insert_non_empty(
        &mut self,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), QueryError> {
        match value {
            Some(value) if !value.is_empty() => self.insert(key, value),
            _ => Ok(()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Alphabetically keyed view of the pairs.
    pub fn sorted(&self) -> BTreeMap<&str, &str> {
        self.iter().collect()
    }
}

/// Parse `input` into key-value pairs.
///
/// The input is split on `&`. Each chunk must contain exactly one `=` with
/// non-empty text on both sides. Duplicates are rejected before the key is
/// checked against the validator.
pub fn parse(input: &str, options: &ParseOptions<'_>) -> Result<KeyValuePairs, QueryError> {
    let mut pairs = KeyValuePairs::new();

    if input.is_empty() {
        if options.allow_empty_input {
            return Ok(pairs);
        }
        return Err(QueryError::EmptyInput);
    }

    for chunk in input.split(PAIR_SEPARATOR) {
        let (key, value) = split_pair(chunk)?;
        if pairs.contains_key(key) {
            return Err(QueryError::DuplicateKey(key.to_string()));
        }
        if !options.validator.validate(key) {
            return Err(QueryError::UnknownKey(key.to_string()));
        }
        pairs.insert(key, value)?;
    }

    Ok(pairs)
}

fn split_pair(chunk: &str) -> Result<(&str, &str), QueryError> {
    let mut parts = chunk.split(KEY_VALUE_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) if !key.is_empty() && !value.is_empty() => Ok((key, value)),
        _ => Err(QueryError::MalformedPair(chunk.to_string())),
    }
}

/// Encode pairs alphabetically by key without percent-encoding.
///
/// This is the canonical storage form and parses back to the same pairs.
pub fn encode_sorted(pairs: &KeyValuePairs) -> String {
    pairs
        .sorted()
        .into_iter()
        .map(|(key, value)| format!("{key}{KEY_VALUE_SEPARATOR}{value}"))
        .collect::<Vec<_>>()
        .join(PAIR_SEPARATOR)
}

/// Whether `value` comes back unchanged from [`encode_sorted`] then [`parse`].
pub fn is_storable(value: &str) -> bool {
    !value.contains(PAIR_SEPARATOR) && !value.contains(KEY_VALUE_SEPARATOR)
}

pub(crate) fn ensure_storable(field: &'static str, value: &str) -> Result<(), QueryError> {
    if is_storable(value) {
        Ok(())
    } else {
        Err(QueryError::UnencodableValue {
            field,
            value: value.to_string(),
        })
    }
}

/// Percent-encode `segment` for use as a single URL path segment.
///
/// Only alphanumerics and `*-._` pass through, so `/`, `?` and `#` cannot
/// change the shape of the path.
pub fn encode_path_segment(segment: &str) -> String {
    // A `+` left by the encoder always stands for a space.
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Encode pairs in the positions assigned by `orderer`, percent-encoding
/// every value as a URL query value (space becomes `+`).
pub fn encode_ordered(
    pairs: &KeyValuePairs,
    orderer: &dyn KeyOrderer,
) -> Result<String, QueryError> {
    let mut slots: BTreeMap<usize, (&str, &str)> = BTreeMap::new();

    for (key, value) in pairs.iter() {
        let position = orderer
            .position(key)
            .ok_or_else(|| QueryError::UnexpectedKey(key.to_string()))?;
        if let Some((existing, _)) = slots.insert(position, (key, value)) {
            return Err(QueryError::AmbiguousOrdering {
                first: existing.to_string(),
                second: key.to_string(),
                position,
            });
        }
    }

    Ok(slots
        .into_values()
        .map(|(key, value)| {
            let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
            format!("{key}{KEY_VALUE_SEPARATOR}{encoded}")
        })
        .collect::<Vec<_>>()
        .join(PAIR_SEPARATOR))
}
