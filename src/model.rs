//! Value types passed into and out of the routing core.
//!
//! Every type here is an immutable snapshot. Coordinates and request time
//! windows are validated on construction (including deserialization), so
//! the rest of the crate can assume well-formed input.

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::traits::Located;

/// A validated WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, PlannerError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(PlannerError::InvalidLatitude(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(PlannerError::InvalidLongitude(lng));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// (lat, lng) pair.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = PlannerError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.lat, raw.lng)
    }
}

impl From<Coordinate> for RawCoordinate {
    fn from(coord: Coordinate) -> Self {
        Self {
            lat: coord.lat,
            lng: coord.lng,
        }
    }
}

/// An outstanding buyer request.
///
/// Times are unix timestamps in seconds. The request expires when its
/// window closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBuyerRequest", into = "RawBuyerRequest")]
pub struct BuyerRequest {
    id: String,
    location: Coordinate,
    commodities: Vec<String>,
    window_start: i64,
    window_end: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawBuyerRequest {
    id: String,
    location: Coordinate,
    commodities: Vec<String>,
    window_start: i64,
    window_end: i64,
}

impl BuyerRequest {
    pub fn new(
        id: impl Into<String>,
        location: Coordinate,
        commodities: Vec<String>,
        window_start: i64,
        window_end: i64,
    ) -> Result<Self, PlannerError> {
        let id = id.into();
        if window_start > window_end {
            return Err(PlannerError::InvalidTimeWindow {
                id,
                start: window_start,
                end: window_end,
            });
        }
        Ok(Self {
            id,
            location,
            commodities,
            window_start,
            window_end,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn commodities(&self) -> &[String] {
        &self.commodities
    }

    /// Window start/end.
    pub fn window(&self) -> (i64, i64) {
        (self.window_start, self.window_end)
    }

    pub fn window_start(&self) -> i64 {
        self.window_start
    }

    pub fn window_end(&self) -> i64 {
        self.window_end
    }

    /// Same as the window end.
    pub fn expiration(&self) -> i64 {
        self.window_end
    }
}

impl Located for BuyerRequest {
    fn location(&self) -> Coordinate {
        self.location
    }
}

impl TryFrom<RawBuyerRequest> for BuyerRequest {
    type Error = PlannerError;

    fn try_from(raw: RawBuyerRequest) -> Result<Self, Self::Error> {
        BuyerRequest::new(
            raw.id,
            raw.location,
            raw.commodities,
            raw.window_start,
            raw.window_end,
        )
    }
}

impl From<BuyerRequest> for RawBuyerRequest {
    fn from(request: BuyerRequest) -> Self {
        Self {
            id: request.id,
            location: request.location,
            commodities: request.commodities,
            window_start: request.window_start,
            window_end: request.window_end,
        }
    }
}

/// Last reported position of a hawker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HawkerLocation {
    pub id: String,
    pub location: Coordinate,
    pub commodities: Vec<String>,
    /// Unix timestamp (seconds) of the last position update.
    pub updated_at: i64,
}

impl Located for HawkerLocation {
    fn location(&self) -> Coordinate {
        self.location
    }
}

/// One leg of a route, ending at a buyer request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub request_id: String,
    pub from: Coordinate,
    pub to: Coordinate,
    pub distance_m: f64,
    /// Estimated travel time for this leg.
    pub duration_secs: i64,
    /// Unix timestamp at which service at `to` can begin.
    pub arrival: i64,
}

/// An ordered, time-window feasible sequence of segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub segments: Vec<RouteSegment>,
    pub total_distance_m: f64,
    pub total_duration_secs: i64,
}

impl Route {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Request ids in visiting order.
    pub fn request_ids(&self) -> Vec<&str> {
        self.segments
            .iter()
            .map(|segment| segment.request_id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds_inclusive() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_coordinate_rejects_out_of_range() {
        assert_eq!(
            Coordinate::new(90.5, 0.0),
            Err(PlannerError::InvalidLatitude(90.5))
        );
        assert_eq!(
            Coordinate::new(0.0, -180.1),
            Err(PlannerError::InvalidLongitude(-180.1))
        );
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_request_rejects_inverted_window() {
        let loc = Coordinate::new(1.0, 1.0).unwrap();
        let err = BuyerRequest::new("r1", loc, vec!["fish".into()], 100, 50).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidTimeWindow { start: 100, end: 50, .. }));
    }

    #[test]
    fn test_request_expiration_is_window_end() {
        let loc = Coordinate::new(1.0, 1.0).unwrap();
        let request = BuyerRequest::new("r1", loc, vec!["fish".into()], 10, 70).unwrap();
        assert_eq!(request.expiration(), 70);
        assert_eq!(request.window(), (10, 70));
    }

    #[test]
    fn test_empty_route() {
        let route = Route::empty();
        assert!(route.is_empty());
        assert_eq!(route.total_distance_m, 0.0);
        assert_eq!(route.total_duration_secs, 0);
    }
}
