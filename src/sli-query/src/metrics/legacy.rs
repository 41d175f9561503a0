//! Upgrade of the deprecated `<metricSelector>?scope=<entitySelector>` syntax.
//!
//! The scope always gains `type(SERVICE)` when it does not already mention
//! it, even for selectors that target other entity types. Existing SLI
//! definitions rely on this, so it is reproduced as is.

use crate::consts::{
    ENTITY_SELECTOR_KEY, KEY_VALUE_SEPARATOR, LEGACY_SCOPE_KEY, LEGACY_SCOPE_SEPARATOR,
    METRIC_SELECTOR_KEY, PAIR_SEPARATOR, SERVICE_ENTITY_TYPE,
};
use crate::error::QueryError;
use crate::keyvalue::{self, AllowedKeys, AnyKey, ParseOptions};
use crate::parser;

use super::MetricsQuery;

const SCOPE_KEYS: AllowedKeys = AllowedKeys(&[LEGACY_SCOPE_KEY]);

/// Whether an unprefixed query uses the legacy syntax.
///
/// The text left of the first `?` is tried as key=value pairs with any key.
/// If that fails, or yields nothing, the query is legacy. A legacy metric
/// selector that happens to look like a single `key=value` pair is therefore
/// treated as current syntax. Duplicate keys are reported rather than
/// reinterpreted.
pub fn is_legacy(raw: &str) -> Result<bool, QueryError> {
    let head = raw
        .split_once(LEGACY_SCOPE_SEPARATOR)
        .map_or(raw, |(head, _)| head);

    match keyvalue::parse(head, &ParseOptions::lenient(&AnyKey)) {
        Ok(pairs) => Ok(pairs.is_empty()),
        Err(err @ QueryError::DuplicateKey(_)) => Err(err),
        Err(_) => Ok(true),
    }
}

/// Rewrite a legacy query in the current syntax.
///
/// A query without `?` carries no scope and is returned unchanged.
pub fn upgrade(raw: &str) -> Result<String, QueryError> {
    let (metric_selector, entity_selector) = split(raw)?;
    let Some(entity_selector) = entity_selector else {
        return Ok(raw.to_string());
    };

    // Rejects selectors that cannot be written out as key=value pairs.
    MetricsQuery::new(metric_selector)?.with_entity_selector(entity_selector.as_str())?;

    Ok(format!(
        "{METRIC_SELECTOR_KEY}{KEY_VALUE_SEPARATOR}{metric_selector}{PAIR_SEPARATOR}{ENTITY_SELECTOR_KEY}{KEY_VALUE_SEPARATOR}{entity_selector}"
    ))
}

/// Parse a legacy query into a [`MetricsQuery`].
pub fn parse(raw: &str) -> Result<MetricsQuery, QueryError> {
    let (metric_selector, entity_selector) = split(raw)?;
    let query = MetricsQuery::new(metric_selector)?;
    match entity_selector {
        Some(entity_selector) => query.with_entity_selector(entity_selector),
        None => Ok(query),
    }
}

/// Whether `selector`, stored on its own, parses back as this same legacy
/// metric selector.
pub(crate) fn reads_back(selector: &str) -> bool {
    !selector.contains(LEGACY_SCOPE_SEPARATOR)
        && selector.trim() == selector
        && !parser::has_prefix_tag(selector)
        && matches!(is_legacy(selector), Ok(true))
}

fn split(raw: &str) -> Result<(&str, Option<String>), QueryError> {
    let Some((metric_selector, scope)) = raw.split_once(LEGACY_SCOPE_SEPARATOR) else {
        return Ok((raw, None));
    };

    let pairs = keyvalue::parse(scope, &ParseOptions::strict(&SCOPE_KEYS))?;
    let scope = pairs
        .get(LEGACY_SCOPE_KEY)
        .ok_or(QueryError::MissingRequiredField(LEGACY_SCOPE_KEY))?;

    Ok((metric_selector, Some(with_service_type(scope))))
}

fn with_service_type(scope: &str) -> String {
    if scope.contains(SERVICE_ENTITY_TYPE) {
        scope.to_string()
    } else {
        format!("{scope},{SERVICE_ENTITY_TYPE}")
    }
}
