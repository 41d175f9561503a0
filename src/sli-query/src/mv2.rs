//! Unit-wrapped metrics queries: `MV2;<unit>;<metrics query>`
//!
//! The unit names what the value returned by the metrics API measures.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::consts::{METRIC_SELECTOR_KEY, METRICS_V2_TAG, PREFIX_SEPARATOR};
use crate::error::QueryError;
use crate::metrics::MetricsQuery;
use crate::prefix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mv2Unit {
    Byte,
    MicroSecond,
}

impl Mv2Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Byte => "Byte",
            Self::MicroSecond => "MicroSecond",
        }
    }
}

impl fmt::Display for Mv2Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Units are matched case-insensitively.
impl FromStr for Mv2Unit {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("byte") {
            Ok(Self::Byte)
        } else if s.eq_ignore_ascii_case("microsecond") {
            Ok(Self::MicroSecond)
        } else {
            Err(QueryError::InvalidEnumValue {
                field: "MV2 unit",
                value: s.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mv2Query {
    unit: Mv2Unit,
    query: MetricsQuery,
}

impl Mv2Query {
    /// The wrapped query must be stored as `key=value` pairs.
    pub fn new(unit: Mv2Unit, query: MetricsQuery) -> Result<Self, QueryError> {
        if !query.uses_key_value_form() {
            return Err(QueryError::UnencodableValue {
                field: METRIC_SELECTOR_KEY,
                value: query.metric_selector().to_string(),
            });
        }
        Ok(Self { unit, query })
    }

    pub fn unit(&self) -> Mv2Unit {
        self.unit
    }

    pub fn query(&self) -> &MetricsQuery {
        &self.query
    }
}

/// The wrapped query must use the current metrics syntax.
impl FromStr for Mv2Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pieces = prefix::split_tagged(s, METRICS_V2_TAG, 3)?;
        let unit: Mv2Unit = pieces[0].parse()?;
        let query: MetricsQuery = pieces[1].parse()?;
        Self::new(unit, query)
    }
}

impl fmt::Display for Mv2Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{METRICS_V2_TAG}{PREFIX_SEPARATOR}{}{PREFIX_SEPARATOR}{}",
            self.unit, self.query
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_is_case_insensitive() {
        assert_eq!("Byte".parse::<Mv2Unit>(), Ok(Mv2Unit::Byte));
        assert_eq!("byte".parse::<Mv2Unit>(), Ok(Mv2Unit::Byte));
        assert_eq!("MicroSecond".parse::<Mv2Unit>(), Ok(Mv2Unit::MicroSecond));
        assert_eq!("microSecond".parse::<Mv2Unit>(), Ok(Mv2Unit::MicroSecond));
    }

    #[test]
    fn test_unsupported_units() {
        for unit in ["Percent", "Count", "", "bytes"] {
            assert_eq!(
                unit.parse::<Mv2Unit>(),
                Err(QueryError::InvalidEnumValue {
                    field: "MV2 unit",
                    value: unit.to_string(),
                })
            );
        }
    }

    #[test]
    fn test_parse_wrapped_query() {
        let query: Mv2Query = "MV2;MicroSecond;metricSelector=builtin:service.response.time:merge(0):percentile(90)&entitySelector=type(SERVICE)"
            .parse()
            .unwrap();
        assert_eq!(query.unit(), Mv2Unit::MicroSecond);
        assert_eq!(
            query.query().metric_selector(),
            "builtin:service.response.time:merge(0):percentile(90)"
        );
        assert_eq!(
            query.to_string(),
            "MV2;MicroSecond;entitySelector=type(SERVICE)&metricSelector=builtin:service.response.time:merge(0):percentile(90)"
        );
    }

    #[test]
    fn test_wrapped_query_must_use_current_syntax() {
        let result: Result<Mv2Query, _> = "MV2;Byte;builtin:host.mem.used".parse();
        assert!(matches!(result, Err(QueryError::MalformedPair(_))));
    }

    #[test]
    fn test_missing_query_piece() {
        let result: Result<Mv2Query, _> = "MV2;Byte".parse();
        assert!(matches!(result, Err(QueryError::IncorrectPrefix { expected: 3, .. })));
    }

    #[test]
    fn test_wrapped_query_cannot_be_a_bare_legacy_selector() {
        let legacy = MetricsQuery::new("eq(a,b=c)=d").unwrap();
        assert!(matches!(
            Mv2Query::new(Mv2Unit::Byte, legacy),
            Err(QueryError::UnencodableValue { .. })
        ));
    }
}
