//! Route optimization core for hawkers serving buyer requests.
//!
//! Spatial and temporal filtering of requests, time-window aware route
//! sequencing, and the scheduling policy that decides when to recompute.

pub mod error;
pub mod filter;
pub mod geo_index;
pub mod haversine;
pub mod model;
pub mod pipeline;
pub mod polyline;
pub mod scheduler;
pub mod solver;
pub mod traits;

pub use error::PlannerError;
pub use model::{BuyerRequest, Coordinate, HawkerLocation, Route, RouteSegment};
