//! Route geometry handed to the presentation layer.
//!
//! Points are decoded (lat, lng) pairs. Any compact encoding is the
//! renderer's business.

use serde::{Deserialize, Serialize};

use crate::model::Route;

/// Ordered straight-line geometry of a route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Route {
    /// The start point followed by each stop, in visiting order.
    ///
    /// An empty route has an empty polyline.
    pub fn polyline(&self) -> Polyline {
        let Some(first) = self.segments.first() else {
            return Polyline::default();
        };
        let mut points = Vec::with_capacity(self.segments.len() + 1);
        points.push(first.from.as_tuple());
        points.extend(self.segments.iter().map(|segment| segment.to.as_tuple()));
        Polyline::new(points)
    }
}

impl From<&Route> for Polyline {
    fn from(route: &Route) -> Self {
        route.polyline()
    }
}
