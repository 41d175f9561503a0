//! Problems v2 queries: `PV2;problemSelector=...&entitySelector=...`

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::consts::{ENTITY_SELECTOR_KEY, PREFIX_SEPARATOR, PROBLEM_SELECTOR_KEY, PROBLEMS_V2_TAG};
use crate::error::QueryError;
use crate::keyvalue::{self, AllowedKeys, FixedOrder, KeyValuePairs, ParseOptions};
use crate::prefix;

pub const PROBLEMS_KEYS: AllowedKeys = AllowedKeys(&[PROBLEM_SELECTOR_KEY, ENTITY_SELECTOR_KEY]);

/// Both selectors are optional. An empty query matches every problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    problem_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_selector: Option<String>,
}

impl ProblemsQuery {
    pub fn new(
        problem_selector: Option<&str>,
        entity_selector: Option<&str>,
    ) -> Result<Self, QueryError> {
        for (field, value) in [
            (PROBLEM_SELECTOR_KEY, problem_selector),
            (ENTITY_SELECTOR_KEY, entity_selector),
        ] {
            if let Some(value) = value {
                keyvalue::ensure_storable(field, value)?;
            }
        }
        Ok(Self {
            problem_selector: problem_selector.filter(|s| !s.is_empty()).map(str::to_string),
            entity_selector: entity_selector.filter(|s| !s.is_empty()).map(str::to_string),
        })
    }

    pub fn problem_selector(&self) -> Option<&str> {
        self.problem_selector.as_deref()
    }

    pub fn entity_selector(&self) -> Option<&str> {
        self.entity_selector.as_deref()
    }

    pub fn to_pairs(&self) -> KeyValuePairs {
        KeyValuePairs::from_fields([
            (PROBLEM_SELECTOR_KEY, self.problem_selector()),
            (ENTITY_SELECTOR_KEY, self.entity_selector()),
        ])
    }

    /// Percent-encoded selector fragment for the problems API.
    pub fn encode_for_api(&self) -> Result<String, QueryError> {
        keyvalue::encode_ordered(
            &self.to_pairs(),
            &FixedOrder(&[PROBLEM_SELECTOR_KEY, ENTITY_SELECTOR_KEY]),
        )
    }
}

impl FromStr for ProblemsQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pieces = prefix::split_tagged(s, PROBLEMS_V2_TAG, 2)?;
        let pairs = keyvalue::parse(pieces[0], &ParseOptions::lenient(&PROBLEMS_KEYS))?;
        Self::new(
            pairs.get(PROBLEM_SELECTOR_KEY),
            pairs.get(ENTITY_SELECTOR_KEY),
        )
    }
}

/// Canonical `PV2;` form with alphabetical keys.
impl fmt::Display for ProblemsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PROBLEMS_V2_TAG}{PREFIX_SEPARATOR}{}",
            keyvalue::encode_sorted(&self.to_pairs())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_selectors() {
        let query: ProblemsQuery = "PV2;problemSelector=status(open)&entitySelector=mzId(7030365576649815430)"
            .parse()
            .unwrap();
        assert_eq!(query.problem_selector(), Some("status(open)"));
        assert_eq!(query.entity_selector(), Some("mzId(7030365576649815430)"));
        assert_eq!(
            query.to_string(),
            "PV2;entitySelector=mzId(7030365576649815430)&problemSelector=status(open)"
        );
    }

    #[test]
    fn test_empty_body_is_valid() {
        let query: ProblemsQuery = "PV2;".parse().unwrap();
        assert_eq!(query, ProblemsQuery::default());
        assert_eq!(query.to_string(), "PV2;");
    }

    #[test]
    fn test_rejects_metrics_keys() {
        let result: Result<ProblemsQuery, _> = "PV2;metricSelector=x".parse();
        assert_eq!(result, Err(QueryError::UnknownKey("metricSelector".to_string())));
    }

    #[test]
    fn test_rejects_missing_separator() {
        let result: Result<ProblemsQuery, _> = "PV2".parse();
        assert!(matches!(result, Err(QueryError::IncorrectPrefix { .. })));
    }

    #[test]
    fn test_api_fragment() {
        let query = ProblemsQuery::new(Some("status(open)"), Some("type(SERVICE)")).unwrap();
        assert_eq!(
            query.encode_for_api().unwrap(),
            "problemSelector=status%28open%29&entitySelector=type%28SERVICE%29"
        );
    }

    #[test]
    fn test_rejects_selectors_with_separators() {
        assert_eq!(
            ProblemsQuery::new(Some("status(open)&x"), None),
            Err(QueryError::UnencodableValue {
                field: PROBLEM_SELECTOR_KEY,
                value: "status(open)&x".to_string(),
            })
        );
        assert!(ProblemsQuery::new(None, Some("tag(a=b)")).is_err());
    }
}
