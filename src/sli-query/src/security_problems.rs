//! Security problems v2 queries: `SECPV2;securityProblemSelector=...`

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::consts::{PREFIX_SEPARATOR, SECURITY_PROBLEM_SELECTOR_KEY, SECURITY_PROBLEMS_V2_TAG};
use crate::error::QueryError;
use crate::keyvalue::{self, AllowedKeys, FixedOrder, KeyValuePairs, ParseOptions};
use crate::prefix;

pub const SECURITY_PROBLEMS_KEYS: AllowedKeys = AllowedKeys(&[SECURITY_PROBLEM_SELECTOR_KEY]);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityProblemsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    security_problem_selector: Option<String>,
}

impl SecurityProblemsQuery {
    pub fn new(security_problem_selector: Option<&str>) -> Result<Self, QueryError> {
        if let Some(value) = security_problem_selector {
            keyvalue::ensure_storable(SECURITY_PROBLEM_SELECTOR_KEY, value)?;
        }
        Ok(Self {
            security_problem_selector: security_problem_selector
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }

    pub fn security_problem_selector(&self) -> Option<&str> {
        self.security_problem_selector.as_deref()
    }

    pub fn to_pairs(&self) -> KeyValuePairs {
        KeyValuePairs::from_fields([(
            SECURITY_PROBLEM_SELECTOR_KEY,
            self.security_problem_selector(),
        )])
    }

    /// Percent-encoded selector fragment for the security problems API.
    pub fn encode_for_api(&self) -> Result<String, QueryError> {
        keyvalue::encode_ordered(
            &self.to_pairs(),
            &FixedOrder(&[SECURITY_PROBLEM_SELECTOR_KEY]),
        )
    }
}

impl FromStr for SecurityProblemsQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pieces = prefix::split_tagged(s, SECURITY_PROBLEMS_V2_TAG, 2)?;
        let pairs = keyvalue::parse(pieces[0], &ParseOptions::lenient(&SECURITY_PROBLEMS_KEYS))?;
        Self::new(pairs.get(SECURITY_PROBLEM_SELECTOR_KEY))
    }
}

impl fmt::Display for SecurityProblemsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SECURITY_PROBLEMS_V2_TAG}{PREFIX_SEPARATOR}{}",
            keyvalue::encode_sorted(&self.to_pairs())
        )
    }
}
