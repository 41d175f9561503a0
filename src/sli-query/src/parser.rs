//! Entry point: turns a raw SLI query string into a typed [`SliQuery`].
//!
//! Prefixed grammars are tried in the order of [`PREFIX_RULES`]. A query
//! matching none of them is a metrics query, in either the current or the
//! legacy syntax.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::consts::{METRICS_V2_TAG, PROBLEMS_V2_TAG, SECURITY_PROBLEMS_V2_TAG, SLO_TAG, USQL_TAG};
use crate::error::QueryError;
use crate::metrics::{self, MetricsQuery};
use crate::mv2::Mv2Query;
use crate::prefix;
use crate::problems::ProblemsQuery;
use crate::request::{
    ApiRequest, MetricsRequest, ProblemsRequest, RequestOptions, SecurityProblemsRequest,
    SloRequest, UsqlRequest,
};
use crate::security_problems::SecurityProblemsQuery;
use crate::slo::SloQuery;
use crate::timeframe::Timeframe;
use crate::usql::UsqlQuery;

/// Any query an SLI definition may hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "query", rename_all = "camelCase")]
pub enum SliQuery {
    Metrics(MetricsQuery),
    Problems(ProblemsQuery),
    SecurityProblems(SecurityProblemsQuery),
    Slo(SloQuery),
    Usql(UsqlQuery),
    Mv2(Mv2Query),
}

type Decoder = fn(&str) -> Result<SliQuery, QueryError>;

/// Literal prefix tags and their decoders, tried in order.
pub const PREFIX_RULES: &[(&str, Decoder)] = &[
    (USQL_TAG, decode_usql),
    (SLO_TAG, decode_slo),
    (PROBLEMS_V2_TAG, decode_problems),
    (SECURITY_PROBLEMS_V2_TAG, decode_security_problems),
    (METRICS_V2_TAG, decode_mv2),
];

fn decode_usql(raw: &str) -> Result<SliQuery, QueryError> {
    raw.parse::<UsqlQuery>().map(SliQuery::Usql)
}

fn decode_slo(raw: &str) -> Result<SliQuery, QueryError> {
    raw.parse::<SloQuery>().map(SliQuery::Slo)
}

fn decode_problems(raw: &str) -> Result<SliQuery, QueryError> {
    raw.parse::<ProblemsQuery>().map(SliQuery::Problems)
}

fn decode_security_problems(raw: &str) -> Result<SliQuery, QueryError> {
    raw.parse::<SecurityProblemsQuery>().map(SliQuery::SecurityProblems)
}

fn decode_mv2(raw: &str) -> Result<SliQuery, QueryError> {
    raw.parse::<Mv2Query>().map(SliQuery::Mv2)
}

/// Parse a raw SLI query. Surrounding whitespace is ignored.
pub fn parse(raw: &str) -> Result<SliQuery, QueryError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(QueryError::EmptyInput);
    }

    for (tag, decode) in PREFIX_RULES {
        if prefix::has_tag(raw, tag) {
            log::debug!("Parsing '{raw}' as {tag} query");
            return decode(raw);
        }
    }

    metrics::parse(raw).map(SliQuery::Metrics)
}

/// Whether `raw` is routed to one of the prefixed grammars.
pub(crate) fn has_prefix_tag(raw: &str) -> bool {
    PREFIX_RULES.iter().any(|(tag, _)| prefix::has_tag(raw, tag))
}

impl SliQuery {
    /// Short name of the query grammar.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Metrics(_) => "metrics",
            Self::Problems(_) => PROBLEMS_V2_TAG,
            Self::SecurityProblems(_) => SECURITY_PROBLEMS_V2_TAG,
            Self::Slo(_) => SLO_TAG,
            Self::Usql(_) => USQL_TAG,
            Self::Mv2(_) => METRICS_V2_TAG,
        }
    }

    /// Canonical storage form. Parsing it yields an equal query.
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Path and query string of the API request answering this query.
    pub fn request_string(
        &self,
        timeframe: Timeframe,
        options: &RequestOptions,
    ) -> Result<String, QueryError> {
        match self {
            Self::Metrics(query) => MetricsRequest::new(query, timeframe, options).request_string(),
            Self::Mv2(query) => {
                MetricsRequest::new(query.query(), timeframe, options).request_string()
            }
            Self::Problems(query) => ProblemsRequest::new(query, timeframe).request_string(),
            Self::SecurityProblems(query) => {
                SecurityProblemsRequest::new(query, timeframe).request_string()
            }
            Self::Slo(query) => SloRequest::new(query, timeframe, options).request_string(),
            Self::Usql(query) => UsqlRequest::new(query, timeframe).request_string(),
        }
    }
}

impl FromStr for SliQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl fmt::Display for SliQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metrics(query) => write!(f, "{query}"),
            Self::Problems(query) => write!(f, "{query}"),
            Self::SecurityProblems(query) => write!(f, "{query}"),
            Self::Slo(query) => write!(f, "{query}"),
            Self::Usql(query) => write!(f, "{query}"),
            Self::Mv2(query) => write!(f, "{query}"),
        }
    }
}
