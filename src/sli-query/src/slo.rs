//! SLO queries: `SLO;<id>`
//!
//! The body may also be written as `id=<id>`.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::consts::{KEY_VALUE_SEPARATOR, PREFIX_SEPARATOR, SLO_ID_KEY, SLO_TAG};
use crate::error::QueryError;
use crate::keyvalue::{self, AllowedKeys, ParseOptions};
use crate::prefix;

const SLO_KEYS: AllowedKeys = AllowedKeys(&[SLO_ID_KEY]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SloQuery {
    slo_id: String,
}

impl SloQuery {
    /// The ID becomes a URL path segment, so `.` and `..` are refused along
    /// with IDs the storage form cannot carry.
    pub fn new(slo_id: impl Into<String>) -> Result<Self, QueryError> {
        let slo_id = slo_id.into();
        if slo_id.is_empty() {
            return Err(QueryError::MissingRequiredField(SLO_ID_KEY));
        }
        keyvalue::ensure_storable(SLO_ID_KEY, &slo_id)?;
        if slo_id == "." || slo_id == ".." {
            return Err(QueryError::UnencodableValue {
                field: SLO_ID_KEY,
                value: slo_id,
            });
        }
        Ok(Self { slo_id })
    }

    pub fn slo_id(&self) -> &str {
        &self.slo_id
    }
}

impl FromStr for SloQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pieces = prefix::split_tagged(s, SLO_TAG, 2)?;
        let body = pieces[0];
        if !body.contains(KEY_VALUE_SEPARATOR) {
            return Self::new(body);
        }

        let pairs = keyvalue::parse(body, &ParseOptions::lenient(&SLO_KEYS))?;
        let slo_id = pairs
            .get(SLO_ID_KEY)
            .ok_or(QueryError::MissingRequiredField(SLO_ID_KEY))?;
        Self::new(slo_id)
    }
}

impl fmt::Display for SloQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SLO_TAG}{PREFIX_SEPARATOR}{}", self.slo_id)
    }
}
