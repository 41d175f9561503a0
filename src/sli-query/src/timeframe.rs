use chrono::{DateTime, Utc};

use crate::error::QueryError;

/// The evaluation window of an indicator. `start` is strictly before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeframe {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Timeframe {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, QueryError> {
        if start >= end {
            return Err(QueryError::InvalidTimeframe { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Start as milliseconds since the Unix epoch.
    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// End as milliseconds since the Unix epoch.
    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }
}
