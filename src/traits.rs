//! Core seams of the routing planner.
//!
//! The optimizer and spatial filters are generic over these so that callers
//! can plug in their own travel model or entity types.

use crate::model::Coordinate;

/// Anything with a position that can be spatially filtered.
pub trait Located {
    fn location(&self) -> Coordinate;
}

impl Located for Coordinate {
    fn location(&self) -> Coordinate {
        *self
    }
}

/// Distance and travel-time estimates between two coordinates.
///
/// Implementations must be pure and symmetric, and return zero for
/// identical points.
pub trait DistanceModel {
    /// Distance in meters.
    fn distance(&self, from: Coordinate, to: Coordinate) -> f64;

    /// Estimated travel time in seconds.
    fn travel_duration(&self, from: Coordinate, to: Coordinate) -> f64;

    /// True when `distance` is the plain great-circle distance, which lets
    /// radius queries skip entities with a lat/lng bounding box.
    fn is_great_circle(&self) -> bool {
        false
    }
}

impl<M: DistanceModel + ?Sized> DistanceModel for &M {
    fn distance(&self, from: Coordinate, to: Coordinate) -> f64 {
        (**self).distance(from, to)
    }

    fn travel_duration(&self, from: Coordinate, to: Coordinate) -> f64 {
        (**self).travel_duration(from, to)
    }

    fn is_great_circle(&self) -> bool {
        (**self).is_great_circle()
    }
}
