//! Error type for the routing core.
//!
//! Only malformed input and scheduler lifecycle problems are errors.
//! Empty request sets, infeasible requests and an exhausted improvement
//! budget are ordinary outcomes and never surface here.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),

    #[error("request {id}: time window ends at {end} before it starts at {start}")]
    InvalidTimeWindow { id: String, start: i64, end: i64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("optimization scheduler has shut down")]
    SchedulerClosed,
}
