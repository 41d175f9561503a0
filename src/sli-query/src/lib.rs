//! sli-query - The SLI query language
//!
//! SLI definitions hold one query string per indicator. This crate turns
//! those strings into typed, validated queries and back again:
//!
//! - [`parser`] - raw string → [`SliQuery`], routed on the prefix tag
//! - [`keyvalue`] - the `key=value&...` codec shared by every grammar
//! - [`prefix`] - `;`-delimited prefix splitting
//! - [`metrics`], [`problems`], [`security_problems`], [`slo`], [`usql`],
//!   [`mv2`] - one module per query grammar
//! - [`request`] - API request strings for a query and a [`Timeframe`]
//!
//! # Example
//!
//! ```
//! use sli_query::{SliQuery, parse};
//!
//! let query = parse("builtin:service.requestCount.total:merge(0):sum?scope=tag(keptn_project:my-proj)").unwrap();
//! let SliQuery::Metrics(metrics) = &query else { panic!() };
//! assert_eq!(metrics.entity_selector(), Some("tag(keptn_project:my-proj),type(SERVICE)"));
//! assert_eq!(
//!     query.canonical(),
//!     "entitySelector=tag(keptn_project:my-proj),type(SERVICE)&metricSelector=builtin:service.requestCount.total:merge(0):sum"
//! );
//! ```

pub mod consts;
pub mod error;
pub mod keyvalue;
pub mod metrics;
pub mod mv2;
pub mod parser;
pub mod prefix;
pub mod problems;
pub mod request;
pub mod security_problems;
pub mod slo;
pub mod timeframe;
pub mod usql;

pub use error::QueryError;
pub use metrics::MetricsQuery;
pub use mv2::{Mv2Query, Mv2Unit};
pub use parser::{SliQuery, parse};
pub use problems::ProblemsQuery;
pub use request::{ApiRequest, RequestOptions};
pub use security_problems::SecurityProblemsQuery;
pub use slo::SloQuery;
pub use timeframe::Timeframe;
pub use usql::{UsqlQuery, UsqlResultType};
