//! User session query language queries: `USQL;<resultType>;<dimension>;<query>`

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::consts::{PREFIX_SEPARATOR, USQL_QUERY_KEY, USQL_TAG};
use crate::error::QueryError;
use crate::prefix;

/// Shape of the USQL result the indicator value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsqlResultType {
    SingleValue,
    Table,
    ColumnChart,
    PieChart,
    /// Recognised so it can be reported precisely; no query may use it.
    LineChart,
}

impl UsqlResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleValue => "SINGLE_VALUE",
            Self::Table => "TABLE",
            Self::ColumnChart => "COLUMN_CHART",
            Self::PieChart => "PIE_CHART",
            Self::LineChart => "LINE_CHART",
        }
    }
}

impl fmt::Display for UsqlResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsqlResultType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SINGLE_VALUE" => Ok(Self::SingleValue),
            "TABLE" => Ok(Self::Table),
            "COLUMN_CHART" => Ok(Self::ColumnChart),
            "PIE_CHART" => Ok(Self::PieChart),
            "LINE_CHART" => Ok(Self::LineChart),
            other => Err(QueryError::InvalidEnumValue {
                field: "USQL result type",
                value: other.to_string(),
            }),
        }
    }
}

/// A validated USQL query.
///
/// `SINGLE_VALUE` queries have no dimension; `TABLE`, `COLUMN_CHART` and
/// `PIE_CHART` queries name the column holding the dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsqlQuery {
    result_type: UsqlResultType,
    dimension: String,
    query: String,
}

impl UsqlQuery {
    pub fn new(
        result_type: UsqlResultType,
        dimension: impl Into<String>,
        query: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let dimension = dimension.into();
        let query = query.into();

        match result_type {
            UsqlResultType::SingleValue if !dimension.is_empty() => {
                return Err(QueryError::DimensionMismatch {
                    result_type: result_type.to_string(),
                    reason: "must be empty",
                });
            }
            UsqlResultType::Table | UsqlResultType::ColumnChart | UsqlResultType::PieChart
                if dimension.is_empty() =>
            {
                return Err(QueryError::DimensionMismatch {
                    result_type: result_type.to_string(),
                    reason: "is required",
                });
            }
            UsqlResultType::LineChart => {
                return Err(QueryError::InvalidEnumValue {
                    field: "USQL result type",
                    value: result_type.to_string(),
                });
            }
            _ => {}
        }

        if dimension.contains(PREFIX_SEPARATOR) {
            return Err(QueryError::UnencodableValue {
                field: "dimension",
                value: dimension,
            });
        }

        if query.is_empty() {
            return Err(QueryError::MissingRequiredField(USQL_QUERY_KEY));
        }

        Ok(Self {
            result_type,
            dimension,
            query,
        })
    }

    pub fn result_type(&self) -> UsqlResultType {
        self.result_type
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

impl FromStr for UsqlQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pieces = prefix::split_tagged(s, USQL_TAG, 4)?;
        let result_type: UsqlResultType = pieces[0].parse()?;
        Self::new(result_type, pieces[1], pieces[2])
    }
}

impl fmt::Display for UsqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{USQL_TAG}{PREFIX_SEPARATOR}{}{PREFIX_SEPARATOR}{}{PREFIX_SEPARATOR}{}",
            self.result_type, self.dimension, self.query
        )
    }
}
