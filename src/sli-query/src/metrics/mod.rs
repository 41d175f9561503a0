//! Metrics queries: `metricSelector=...&entitySelector=...&resolution=...&mzSelector=...`
//!
//! Queries without a prefix are metrics queries. They come in two syntaxes:
//! the current key=value form handled here, and the deprecated
//! `<metricSelector>?scope=<entitySelector>` form handled by [`legacy`].

pub mod legacy;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::consts::{
    ENTITY_SELECTOR_KEY, LEGACY_SCOPE_SEPARATOR, METRIC_SELECTOR_KEY, MZ_SELECTOR_KEY,
    RESOLUTION_KEY,
};
use crate::error::QueryError;
use crate::keyvalue::{self, AllowedKeys, FixedOrder, KeyValuePairs, ParseOptions};

/// Keys recognised in the current metrics syntax.
pub const METRICS_KEYS: AllowedKeys = AllowedKeys(&[
    METRIC_SELECTOR_KEY,
    ENTITY_SELECTOR_KEY,
    RESOLUTION_KEY,
    MZ_SELECTOR_KEY,
]);

/// Parameter layout accepted by the metrics query API.
pub const METRICS_API_ORDER: FixedOrder = FixedOrder(&[
    ENTITY_SELECTOR_KEY,
    METRIC_SELECTOR_KEY,
    MZ_SELECTOR_KEY,
    RESOLUTION_KEY,
]);

/// A validated metrics query. The metric selector is always present.
///
/// Values never contain `&` or `=`, with one exception: a legacy metric
/// selector standing alone, which is stored as the bare selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    metric_selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mz_selector: Option<String>,
}

impl MetricsQuery {
    pub fn new(metric_selector: impl Into<String>) -> Result<Self, QueryError> {
        let metric_selector = metric_selector.into();
        if metric_selector.is_empty() {
            return Err(QueryError::MissingRequiredField(METRIC_SELECTOR_KEY));
        }
        Self {
            metric_selector,
            entity_selector: None,
            resolution: None,
            mz_selector: None,
        }
        .validated()
    }

    pub fn with_entity_selector(
        mut self,
        entity_selector: impl Into<String>,
    ) -> Result<Self, QueryError> {
        self.entity_selector = non_empty(entity_selector.into());
        self.validated()
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Result<Self, QueryError> {
        self.resolution = non_empty(resolution.into());
        self.validated()
    }

    pub fn with_mz_selector(mut self, mz_selector: impl Into<String>) -> Result<Self, QueryError> {
        self.mz_selector = non_empty(mz_selector.into());
        self.validated()
    }

    pub fn metric_selector(&self) -> &str {
        &self.metric_selector
    }

    pub fn entity_selector(&self) -> Option<&str> {
        self.entity_selector.as_deref()
    }

    pub fn resolution(&self) -> Option<&str> {
        self.resolution.as_deref()
    }

    pub fn mz_selector(&self) -> Option<&str> {
        self.mz_selector.as_deref()
    }

    /// Whether the storage form is `key=value` pairs. Otherwise it is the
    /// bare legacy metric selector.
    pub fn uses_key_value_form(&self) -> bool {
        is_key_value_storable(&self.metric_selector)
    }

    /// Build a query from pairs already checked against [`METRICS_KEYS`].
    pub fn from_pairs(pairs: &KeyValuePairs) -> Result<Self, QueryError> {
        let metric_selector = pairs
            .get(METRIC_SELECTOR_KEY)
            .ok_or(QueryError::MissingRequiredField(METRIC_SELECTOR_KEY))?;

        let mut query = Self::new(metric_selector)?;
        if let Some(entity_selector) = pairs.get(ENTITY_SELECTOR_KEY) {
            query = query.with_entity_selector(entity_selector)?;
        }
        if let Some(resolution) = pairs.get(RESOLUTION_KEY) {
            query = query.with_resolution(resolution)?;
        }
        if let Some(mz_selector) = pairs.get(MZ_SELECTOR_KEY) {
            query = query.with_mz_selector(mz_selector)?;
        }
        Ok(query)
    }

    /// The present fields as key-value pairs, in declaration order.
    pub fn to_pairs(&self) -> KeyValuePairs {
        KeyValuePairs::from_fields([
            (METRIC_SELECTOR_KEY, Some(self.metric_selector())),
            (ENTITY_SELECTOR_KEY, self.entity_selector()),
            (RESOLUTION_KEY, self.resolution()),
            (MZ_SELECTOR_KEY, self.mz_selector()),
        ])
    }

    /// Canonical storage form: alphabetical keys, values not percent-encoded.
    pub fn canonical(&self) -> String {
        if self.uses_key_value_form() {
            keyvalue::encode_sorted(&self.to_pairs())
        } else {
            self.metric_selector.clone()
        }
    }

    /// API form: `entitySelector`, `metricSelector`, `mzSelector`, `resolution`
    /// in that order, values percent-encoded.
    pub fn encode_for_api(&self) -> Result<String, QueryError> {
        keyvalue::encode_ordered(&self.to_pairs(), &METRICS_API_ORDER)
    }

    fn validated(self) -> Result<Self, QueryError> {
        let optional = [
            (ENTITY_SELECTOR_KEY, self.entity_selector()),
            (RESOLUTION_KEY, self.resolution()),
            (MZ_SELECTOR_KEY, self.mz_selector()),
        ];
        let mut has_optional = false;
        for (field, value) in optional {
            if let Some(value) = value {
                has_optional = true;
                if !is_key_value_storable(value) {
                    return Err(unencodable(field, value));
                }
            }
        }

        if !self.uses_key_value_form()
            && (has_optional || !legacy::reads_back(&self.metric_selector))
        {
            return Err(unencodable(METRIC_SELECTOR_KEY, &self.metric_selector));
        }
        Ok(self)
    }
}

/// Parses the current key=value syntax only. Use [`parse`] to also accept
/// the legacy syntax.
impl FromStr for MetricsQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pairs = keyvalue::parse(s, &ParseOptions::strict(&METRICS_KEYS))?;
        Self::from_pairs(&pairs)
    }
}

impl fmt::Display for MetricsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Parse an unprefixed query, upgrading the legacy syntax when detected.
pub fn parse(raw: &str) -> Result<MetricsQuery, QueryError> {
    if legacy::is_legacy(raw)? {
        log::debug!("Upgrading legacy metrics query '{raw}'");
        return legacy::parse(raw);
    }
    raw.parse()
}

/// Values in the `key=value` form hold no `&` or `=`. A leading `?` would
/// make the stored form read as a legacy query.
fn is_key_value_storable(value: &str) -> bool {
    keyvalue::is_storable(value) && !value.starts_with(LEGACY_SCOPE_SEPARATOR)
}

fn unencodable(field: &'static str, value: &str) -> QueryError {
    QueryError::UnencodableValue {
        field,
        value: value.to_string(),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_current_syntax() {
        let query: MetricsQuery = "metricSelector=builtin:service.response.time:avg&entitySelector=type(SERVICE),tag(app)&resolution=10m&mzSelector=mzId(1)"
            .parse()
            .unwrap();

        assert_eq!(query.metric_selector(), "builtin:service.response.time:avg");
        assert_eq!(query.entity_selector(), Some("type(SERVICE),tag(app)"));
        assert_eq!(query.resolution(), Some("10m"));
        assert_eq!(query.mz_selector(), Some("mzId(1)"));
    }

    #[test]
    fn test_metric_selector_is_required() {
        let result: Result<MetricsQuery, _> = "entitySelector=type(SERVICE)&resolution=Inf".parse();
        assert_eq!(
            result,
            Err(QueryError::MissingRequiredField(METRIC_SELECTOR_KEY))
        );
        assert_eq!(
            MetricsQuery::new(""),
            Err(QueryError::MissingRequiredField(METRIC_SELECTOR_KEY))
        );
    }

    #[test]
    fn test_unknown_key_is_named() {
        let result: Result<MetricsQuery, _> = "metricSelector=a&bogus=b".parse();
        assert_eq!(result, Err(QueryError::UnknownKey("bogus".to_string())));
    }

    #[test]
    fn test_empty_current_syntax_is_rejected() {
        let result: Result<MetricsQuery, _> = "".parse();
        assert_eq!(result, Err(QueryError::EmptyInput));
    }

    #[test]
    fn test_canonical_form_is_sorted() {
        let query = MetricsQuery::new("m")
            .and_then(|q| q.with_resolution("1h"))
            .and_then(|q| q.with_entity_selector("type(HOST)"))
            .unwrap();
        assert_eq!(query.canonical(), "entitySelector=type(HOST)&metricSelector=m&resolution=1h");
        assert_eq!(query.to_string(), query.canonical());
    }

    #[test]
    fn test_api_form_is_fixed_order_and_encoded() {
        let query = MetricsQuery::new("builtin:host.cpu.usage:avg")
            .and_then(|q| q.with_resolution("Inf"))
            .and_then(|q| q.with_mz_selector("mzName(my zone)"))
            .and_then(|q| q.with_entity_selector("type(HOST)"))
            .unwrap();
        assert_eq!(
            query.encode_for_api().unwrap(),
            "entitySelector=type%28HOST%29&metricSelector=builtin%3Ahost.cpu.usage%3Aavg&mzSelector=mzName%28my+zone%29&resolution=Inf"
        );
    }

    #[test]
    fn test_empty_optional_fields_are_dropped() {
        let query = MetricsQuery::new("m").unwrap().with_entity_selector("").unwrap();
        assert_eq!(query.entity_selector(), None);
        assert_eq!(query.canonical(), "metricSelector=m");
    }

    #[test]
    fn test_parse_dispatches_between_syntaxes() {
        let current = parse("metricSelector=m&entitySelector=type(HOST)").unwrap();
        assert_eq!(current.entity_selector(), Some("type(HOST)"));

        let legacy = parse("m?scope=tag(x)").unwrap();
        assert_eq!(legacy.metric_selector(), "m");
        assert_eq!(legacy.entity_selector(), Some("tag(x),type(SERVICE)"));
    }

    #[test]
    fn test_legacy_selector_is_stored_bare() {
        let raw = "calc:service.x:filter(and(eq(a,b=c),eq(d,e=f)))";
        let query = parse(raw).unwrap();
        assert_eq!(query.metric_selector(), raw);
        assert!(!query.uses_key_value_form());
        assert_eq!(query.canonical(), raw);
        assert_eq!(parse(&query.canonical()), Ok(query));

        let query = MetricsQuery::new("a&b").unwrap();
        assert_eq!(query.canonical(), "a&b");
        assert_eq!(parse(&query.canonical()), Ok(query));
    }

    #[test]
    fn test_rejects_values_the_storage_form_cannot_carry() {
        let query = MetricsQuery::new("m").unwrap();
        assert_eq!(
            query.clone().with_entity_selector("tag(a&b)"),
            Err(QueryError::UnencodableValue {
                field: ENTITY_SELECTOR_KEY,
                value: "tag(a&b)".to_string(),
            })
        );
        assert!(query.clone().with_resolution("1=h").is_err());
        assert!(query.with_mz_selector("?mzId(1)").is_err());
    }

    #[test]
    fn test_bare_selector_takes_no_other_fields() {
        let legacy = MetricsQuery::new("eq(a,b=c)=d").unwrap();
        assert!(matches!(
            legacy.with_entity_selector("type(HOST)"),
            Err(QueryError::UnencodableValue { field: METRIC_SELECTOR_KEY, .. })
        ));
    }

    #[test]
    fn test_selector_that_would_read_back_differently_is_rejected() {
        // Each of these, stored bare, would parse as something else.
        for selector in ["a=b", "k=v1&k=v2", "m?x=y&z", "SLO;a=b=c", "?x=y=z", " a&b"] {
            assert!(
                matches!(
                    MetricsQuery::new(selector),
                    Err(QueryError::UnencodableValue { .. })
                ),
                "{selector:?} was accepted"
            );
        }
    }
}
