//! Great-circle distance model.
//!
//! Travel time is straight-line distance over an assumed average speed.
//! It ignores the street network, so durations are estimates only.

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::model::Coordinate;
use crate::traits::DistanceModel;

/// Average hawker travel speed assumption (cart or bicycle pace).
pub const DEFAULT_SPEED_KMH: f64 = 20.0;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance with a constant-speed duration estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HaversineModel {
    /// Assumed average travel speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineModel {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineModel {
    pub fn new(speed_kmh: f64) -> Result<Self, PlannerError> {
        let model = Self { speed_kmh };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        if !self.speed_kmh.is_finite() || self.speed_kmh <= 0.0 {
            return Err(PlannerError::InvalidConfig(format!(
                "speed_kmh must be positive, got {}",
                self.speed_kmh
            )));
        }
        Ok(())
    }

    /// Great-circle distance in meters.
    pub fn haversine_m(from: Coordinate, to: Coordinate) -> f64 {
        // Order the endpoints so the result is bit-for-bit symmetric.
        let (a, b) = if (from.lat(), from.lng()) <= (to.lat(), to.lng()) {
            (from, to)
        } else {
            (to, from)
        };

        let lat1_rad = a.lat().to_radians();
        let lat2_rad = b.lat().to_radians();
        let delta_lat = (b.lat() - a.lat()).to_radians();
        let delta_lng = (b.lng() - a.lng()).to_radians();

        let h = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * h.min(1.0).sqrt().asin();

        EARTH_RADIUS_M * c
    }

    fn speed_mps(&self) -> f64 {
        self.speed_kmh * 1000.0 / 3600.0
    }
}

impl DistanceModel for HaversineModel {
    fn distance(&self, from: Coordinate, to: Coordinate) -> f64 {
        Self::haversine_m(from, to)
    }

    fn travel_duration(&self, from: Coordinate, to: Coordinate) -> f64 {
        Self::haversine_m(from, to) / self.speed_mps()
    }

    fn is_great_circle(&self) -> bool {
        true
    }
}
