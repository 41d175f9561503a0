//! Request strings for the backend's REST APIs.
//!
//! Each builder pairs a validated query with a [`Timeframe`] and renders the
//! path and percent-encoded query string the HTTP layer sends verbatim.

use crate::consts::{
    DEFAULT_RESOLUTION, DEFAULT_SLO_TIME_FRAME, ENTITY_SELECTOR_KEY, FROM_KEY,
    METRIC_SELECTOR_KEY, MZ_SELECTOR_KEY, PROBLEM_SELECTOR_KEY, RESOLUTION_KEY,
    SECURITY_PROBLEM_SELECTOR_KEY, TIME_FRAME_KEY, TO_KEY, USQL_ADD_DEEP_LINK_FIELDS_KEY,
    USQL_END_TIMESTAMP_KEY, USQL_EXPLAIN_KEY, USQL_QUERY_KEY, USQL_START_TIMESTAMP_KEY,
};
use crate::error::QueryError;
use crate::keyvalue::{self, FixedOrder, KeyValuePairs};
use crate::metrics::MetricsQuery;
use crate::problems::ProblemsQuery;
use crate::security_problems::SecurityProblemsQuery;
use crate::slo::SloQuery;
use crate::timeframe::Timeframe;
use crate::usql::UsqlQuery;

pub const METRICS_QUERY_PATH: &str = "/api/v2/metrics/query";
pub const USQL_PATH: &str = "/api/v1/userSessionQueryLanguage/table";
pub const PROBLEMS_PATH: &str = "/api/v2/problems";
pub const SECURITY_PROBLEMS_PATH: &str = "/api/v2/securityProblems";
pub const SLO_PATH: &str = "/api/v2/slo";

const METRICS_REQUEST_ORDER: FixedOrder = FixedOrder(&[
    ENTITY_SELECTOR_KEY,
    METRIC_SELECTOR_KEY,
    MZ_SELECTOR_KEY,
    RESOLUTION_KEY,
    FROM_KEY,
    TO_KEY,
]);

const USQL_REQUEST_ORDER: FixedOrder = FixedOrder(&[
    USQL_QUERY_KEY,
    USQL_EXPLAIN_KEY,
    USQL_ADD_DEEP_LINK_FIELDS_KEY,
    USQL_START_TIMESTAMP_KEY,
    USQL_END_TIMESTAMP_KEY,
]);

const PROBLEMS_REQUEST_ORDER: FixedOrder =
    FixedOrder(&[PROBLEM_SELECTOR_KEY, ENTITY_SELECTOR_KEY, FROM_KEY, TO_KEY]);

const SECURITY_PROBLEMS_REQUEST_ORDER: FixedOrder =
    FixedOrder(&[SECURITY_PROBLEM_SELECTOR_KEY, FROM_KEY, TO_KEY]);

const SLO_REQUEST_ORDER: FixedOrder = FixedOrder(&[FROM_KEY, TO_KEY, TIME_FRAME_KEY]);

/// Settings applied by the request builders rather than by the queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// Resolution sent when a metrics query carries none.
    pub default_resolution: String,
    /// Time frame sent to the SLO endpoint.
    pub slo_time_frame: String,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            default_resolution: DEFAULT_RESOLUTION.to_string(),
            slo_time_frame: DEFAULT_SLO_TIME_FRAME.to_string(),
        }
    }
}

/// A request against one of the backend APIs.
pub trait ApiRequest {
    fn path(&self) -> String;

    /// Percent-encoded query string, without the leading `?`.
    fn query_string(&self) -> Result<String, QueryError>;

    fn request_string(&self) -> Result<String, QueryError> {
        Ok(format!("{}?{}", self.path(), self.query_string()?))
    }
}

fn insert_timeframe(pairs: &mut KeyValuePairs, timeframe: &Timeframe) -> Result<(), QueryError> {
    pairs.insert(FROM_KEY, timeframe.start_millis().to_string())?;
    pairs.insert(TO_KEY, timeframe.end_millis().to_string())
}

pub struct MetricsRequest<'a> {
    query: &'a MetricsQuery,
    timeframe: Timeframe,
    default_resolution: &'a str,
}

impl<'a> MetricsRequest<'a> {
    pub fn new(query: &'a MetricsQuery, timeframe: Timeframe, options: &'a RequestOptions) -> Self {
        Self {
            query,
            timeframe,
            default_resolution: &options.default_resolution,
        }
    }
}

impl ApiRequest for MetricsRequest<'_> {
    fn path(&self) -> String {
        METRICS_QUERY_PATH.to_string()
    }

    fn query_string(&self) -> Result<String, QueryError> {
        let mut pairs = self.query.to_pairs();
        if self.query.resolution().is_none() {
            pairs.insert_non_empty(RESOLUTION_KEY, Some(self.default_resolution))?;
        }
        insert_timeframe(&mut pairs, &self.timeframe)?;
        keyvalue::encode_ordered(&pairs, &METRICS_REQUEST_ORDER)
    }
}

pub struct UsqlRequest<'a> {
    query: &'a UsqlQuery,
    timeframe: Timeframe,
}

impl<'a> UsqlRequest<'a> {
    pub fn new(query: &'a UsqlQuery, timeframe: Timeframe) -> Self {
        Self { query, timeframe }
    }
}

impl ApiRequest for UsqlRequest<'_> {
    fn path(&self) -> String {
        USQL_PATH.to_string()
    }

    fn query_string(&self) -> Result<String, QueryError> {
        let mut pairs = KeyValuePairs::new();
        pairs.insert(USQL_QUERY_KEY, self.query.query())?;
        pairs.insert(USQL_EXPLAIN_KEY, "false")?;
        pairs.insert(USQL_ADD_DEEP_LINK_FIELDS_KEY, "false")?;
        pairs.insert(USQL_START_TIMESTAMP_KEY, self.timeframe.start_millis().to_string())?;
        pairs.insert(USQL_END_TIMESTAMP_KEY, self.timeframe.end_millis().to_string())?;
        keyvalue::encode_ordered(&pairs, &USQL_REQUEST_ORDER)
    }
}

pub struct ProblemsRequest<'a> {
    query: &'a ProblemsQuery,
    timeframe: Timeframe,
}

impl<'a> ProblemsRequest<'a> {
    pub fn new(query: &'a ProblemsQuery, timeframe: Timeframe) -> Self {
        Self { query, timeframe }
    }
}

impl ApiRequest for ProblemsRequest<'_> {
    fn path(&self) -> String {
        PROBLEMS_PATH.to_string()
    }

    fn query_string(&self) -> Result<String, QueryError> {
        let mut pairs = self.query.to_pairs();
        insert_timeframe(&mut pairs, &self.timeframe)?;
        keyvalue::encode_ordered(&pairs, &PROBLEMS_REQUEST_ORDER)
    }
}

pub struct SecurityProblemsRequest<'a> {
    query: &'a SecurityProblemsQuery,
    timeframe: Timeframe,
}

impl<'a> SecurityProblemsRequest<'a> {
    pub fn new(query: &'a SecurityProblemsQuery, timeframe: Timeframe) -> Self {
        Self { query, timeframe }
    }
}

impl ApiRequest for SecurityProblemsRequest<'_> {
    fn path(&self) -> String {
        SECURITY_PROBLEMS_PATH.to_string()
    }

    fn query_string(&self) -> Result<String, QueryError> {
        let mut pairs = self.query.to_pairs();
        insert_timeframe(&mut pairs, &self.timeframe)?;
        keyvalue::encode_ordered(&pairs, &SECURITY_PROBLEMS_REQUEST_ORDER)
    }
}

pub struct SloRequest<'a> {
    query: &'a SloQuery,
    timeframe: Timeframe,
    time_frame: &'a str,
}

impl<'a> SloRequest<'a> {
    pub fn new(query: &'a SloQuery, timeframe: Timeframe, options: &'a RequestOptions) -> Self {
        Self {
            query,
            timeframe,
            time_frame: &options.slo_time_frame,
        }
    }
}

impl ApiRequest for SloRequest<'_> {
    fn path(&self) -> String {
        format!("{SLO_PATH}/{}", keyvalue::encode_path_segment(self.query.slo_id()))
    }

    fn query_string(&self) -> Result<String, QueryError> {
        let mut pairs = KeyValuePairs::new();
        insert_timeframe(&mut pairs, &self.timeframe)?;
        pairs.insert(TIME_FRAME_KEY, self.time_frame)?;
        keyvalue::encode_ordered(&pairs, &SLO_REQUEST_ORDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usql::UsqlResultType;
    use chrono::{TimeZone, Utc};

    fn timeframe() -> Timeframe {
        Timeframe::new(
            Utc.timestamp_millis_opt(1_622_505_600_000).unwrap(),
            Utc.timestamp_millis_opt(1_622_505_900_000).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_metrics_request_defaults_resolution() {
        let query = MetricsQuery::new("builtin:service.response.time:avg")
            .and_then(|q| q.with_entity_selector("type(SERVICE)"))
            .unwrap();
        let options = RequestOptions::default();
        let request = MetricsRequest::new(&query, timeframe(), &options);
        assert_eq!(
            request.request_string().unwrap(),
            "/api/v2/metrics/query?entitySelector=type%28SERVICE%29&metricSelector=builtin%3Aservice.response.time%3Aavg&resolution=Inf&from=1622505600000&to=1622505900000"
        );
    }

    #[test]
    fn test_metrics_request_keeps_query_resolution() {
        let query = MetricsQuery::new("m").unwrap().with_resolution("5m").unwrap();
        let options = RequestOptions::default();
        let request = MetricsRequest::new(&query, timeframe(), &options);
        assert_eq!(
            request.query_string().unwrap(),
            "metricSelector=m&resolution=5m&from=1622505600000&to=1622505900000"
        );
    }

    #[test]
    fn test_usql_request() {
        let query = UsqlQuery::new(
            UsqlResultType::SingleValue,
            "",
            "SELECT AVG(duration) FROM usersession",
        )
        .unwrap();
        let request = UsqlRequest::new(&query, timeframe());
        assert_eq!(
            request.request_string().unwrap(),
            "/api/v1/userSessionQueryLanguage/table?query=SELECT+AVG%28duration%29+FROM+usersession&explain=false&addDeepLinkFields=false&startTimestamp=1622505600000&endTimestamp=1622505900000"
        );
    }

    #[test]
    fn test_problems_request_omits_empty_selectors() {
        let query = ProblemsQuery::new(Some("status(open)"), None).unwrap();
        let request = ProblemsRequest::new(&query, timeframe());
        assert_eq!(
            request.request_string().unwrap(),
            "/api/v2/problems?problemSelector=status%28open%29&from=1622505600000&to=1622505900000"
        );
    }

    #[test]
    fn test_security_problems_request() {
        let query = SecurityProblemsQuery::new(Some("status(OPEN)")).unwrap();
        let request = SecurityProblemsRequest::new(&query, timeframe());
        assert_eq!(
            request.query_string().unwrap(),
            "securityProblemSelector=status%28OPEN%29&from=1622505600000&to=1622505900000"
        );
    }

    #[test]
    fn test_slo_request() {
        let query = SloQuery::new("7d07efde-b714-3e6e-ad95-08490e2540c4").unwrap();
        let options = RequestOptions::default();
        let request = SloRequest::new(&query, timeframe(), &options);
        assert_eq!(
            request.request_string().unwrap(),
            "/api/v2/slo/7d07efde-b714-3e6e-ad95-08490e2540c4?from=1622505600000&to=1622505900000&timeFrame=GTF"
        );
    }

    #[test]
    fn test_slo_request_escapes_id_in_path() {
        let query = SloQuery::new("abc/../../v1/x?evil").unwrap();
        let options = RequestOptions::default();
        let request = SloRequest::new(&query, timeframe(), &options);
        assert_eq!(request.path(), "/api/v2/slo/abc%2F..%2F..%2Fv1%2Fx%3Fevil");
        assert_eq!(
            request.request_string().unwrap(),
            "/api/v2/slo/abc%2F..%2F..%2Fv1%2Fx%3Fevil?from=1622505600000&to=1622505900000&timeFrame=GTF"
        );
    }
}
