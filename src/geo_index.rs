//! Radius queries over a snapshot of located entities.

use tracing::trace;

use crate::haversine::{EARTH_RADIUS_M, HaversineModel};
use crate::model::Coordinate;
use crate::traits::{DistanceModel, Located};

/// Returns the entities whose great-circle distance from `center` is at
/// most `radius_m`.
///
/// The boundary is inclusive. A zero radius or empty input yields nothing.
/// Output order follows input order, but callers should not rely on it.
pub fn entities_within_radius<'a, E: Located>(
    center: Coordinate,
    entities: &'a [E],
    radius_m: f64,
) -> Vec<&'a E> {
    if entities.is_empty() || radius_m.is_nan() || radius_m <= 0.0 {
        return Vec::new();
    }
    entities
        .iter()
        .filter(|entity| HaversineModel::haversine_m(center, entity.location()) <= radius_m)
        .collect()
}

/// A borrowed entity snapshot with a bounding-box prefilter in front of
/// the exact distance test.
#[derive(Debug, Clone)]
pub struct GeoIndex<'a, E> {
    entities: &'a [E],
}

impl<'a, E: Located> GeoIndex<'a, E> {
    pub fn new(entities: &'a [E]) -> Self {
        Self { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Same result set as [`entities_within_radius`].
    pub fn within_radius(&self, center: Coordinate, radius_m: f64) -> Vec<&'a E> {
        self.within_radius_by(center, radius_m, &HaversineModel::default())
    }

    /// Entities whose `model` distance from `center` is at most `radius_m`.
    ///
    /// The bounding-box prefilter only applies to great-circle models.
    pub fn within_radius_by<M>(&self, center: Coordinate, radius_m: f64, model: &M) -> Vec<&'a E>
    where
        M: DistanceModel + ?Sized,
    {
        if self.entities.is_empty() || radius_m.is_nan() || radius_m <= 0.0 {
            return Vec::new();
        }
        let bounds = model
            .is_great_circle()
            .then(|| BoundingBox::around(center, radius_m));
        let found: Vec<&'a E> = self
            .entities
            .iter()
            .filter(|entity| {
                let location = entity.location();
                bounds.is_none_or(|bounds| bounds.may_contain(location))
                    && model.distance(center, location) <= radius_m
            })
            .collect();
        trace!(
            candidates = self.entities.len(),
            found = found.len(),
            radius_m,
            "radius query"
        );
        found
    }
}

/// Conservative lat/lng box around a spherical cap.
///
/// Only ever used to skip entities that are certainly outside the radius.
#[derive(Debug, Clone, Copy)]
struct BoundingBox {
    center: Coordinate,
    lat_margin: f64,
    /// `None` when the cap touches a pole and longitude is unbounded.
    lng_margin: Option<f64>,
}

/// Relative slack on the margins to absorb floating point error.
const MARGIN_SLACK: f64 = 1.01;

impl BoundingBox {
    fn around(center: Coordinate, radius_m: f64) -> Self {
        let angular = radius_m / EARTH_RADIUS_M;
        let lat_margin = angular.to_degrees() * MARGIN_SLACK;

        let cos_lat = center.lat().to_radians().cos();
        let sin_angular = angular.sin();
        let lng_margin = if angular < std::f64::consts::FRAC_PI_2 && sin_angular < cos_lat * 0.99 {
            Some((sin_angular / cos_lat).asin().to_degrees() * MARGIN_SLACK)
        } else {
            None
        };

        Self {
            center,
            lat_margin,
            lng_margin,
        }
    }

    fn may_contain(&self, point: Coordinate) -> bool {
        if (point.lat() - self.center.lat()).abs() > self.lat_margin {
            return false;
        }
        match self.lng_margin {
            Some(margin) => lng_delta(self.center.lng(), point.lng()) <= margin,
            None => true,
        }
    }
}

/// Absolute longitude difference in degrees, wrapped across the antimeridian.
fn lng_delta(a: f64, b: f64) -> f64 {
    let delta = (a - b).abs() % 360.0;
    if delta > 180.0 { 360.0 - delta } else { delta }
}
