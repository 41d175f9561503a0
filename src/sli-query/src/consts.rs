//! Delimiters, prefix tags and key names shared by every query grammar.

/// Separates the pairs of a key=value query.
pub const PAIR_SEPARATOR: &str = "&";

/// Separates a key from its value.
pub const KEY_VALUE_SEPARATOR: &str = "=";

/// Separates the pieces of a prefixed query.
pub const PREFIX_SEPARATOR: &str = ";";

/// Separates the metric selector from the scope in the legacy syntax.
pub const LEGACY_SCOPE_SEPARATOR: &str = "?";

pub const USQL_TAG: &str = "USQL";
pub const SLO_TAG: &str = "SLO";
pub const PROBLEMS_V2_TAG: &str = "PV2";
pub const SECURITY_PROBLEMS_V2_TAG: &str = "SECPV2";
pub const METRICS_V2_TAG: &str = "MV2";

pub const METRIC_SELECTOR_KEY: &str = "metricSelector";
pub const ENTITY_SELECTOR_KEY: &str = "entitySelector";
pub const RESOLUTION_KEY: &str = "resolution";
pub const MZ_SELECTOR_KEY: &str = "mzSelector";
pub const PROBLEM_SELECTOR_KEY: &str = "problemSelector";
pub const SECURITY_PROBLEM_SELECTOR_KEY: &str = "securityProblemSelector";
pub const SLO_ID_KEY: &str = "id";
pub const LEGACY_SCOPE_KEY: &str = "scope";

pub const FROM_KEY: &str = "from";
pub const TO_KEY: &str = "to";
pub const TIME_FRAME_KEY: &str = "timeFrame";
pub const USQL_QUERY_KEY: &str = "query";
pub const USQL_EXPLAIN_KEY: &str = "explain";
pub const USQL_ADD_DEEP_LINK_FIELDS_KEY: &str = "addDeepLinkFields";
pub const USQL_START_TIMESTAMP_KEY: &str = "startTimestamp";
pub const USQL_END_TIMESTAMP_KEY: &str = "endTimestamp";

/// Entity type clause the legacy syntax implies for every scope.
pub const SERVICE_ENTITY_TYPE: &str = "type(SERVICE)";

/// Resolution requested when a metrics query does not carry its own.
pub const DEFAULT_RESOLUTION: &str = "Inf";

/// Time frame requested from the SLO endpoint.
pub const DEFAULT_SLO_TIME_FRAME: &str = "GTF";
