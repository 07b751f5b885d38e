//! End-to-end planning for one hawker or a whole fleet.
//!
//! Spatial filter, commodity match, eligibility and sequencing, in that
//! order. Hawkers share nothing, so fleet planning fans out with rayon.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PlannerError;
use crate::filter::matches_commodities;
use crate::geo_index::GeoIndex;
use crate::model::{BuyerRequest, HawkerLocation};
use crate::solver::{PlannerResult, SolveOptions, solve};
use crate::traits::DistanceModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Only requests within this distance of the hawker are considered.
    pub search_radius_m: f64,
    /// Drop requests for commodities the hawker does not sell.
    pub match_commodities: bool,
    pub solve: SolveOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            search_radius_m: 2_000.0,
            match_commodities: true,
            solve: SolveOptions::default(),
        }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> Result<(), PlannerError> {
        if !self.search_radius_m.is_finite() || self.search_radius_m < 0.0 {
            return Err(PlannerError::InvalidConfig(format!(
                "search_radius_m must be a non-negative number, got {}",
                self.search_radius_m
            )));
        }
        self.solve.validate()
    }
}

/// Route for `hawker` over the visible `requests` at time `now`.
///
/// `model` measures both the search radius and the route.
pub fn plan_for_hawker<M>(
    hawker: &HawkerLocation,
    requests: &[BuyerRequest],
    now: i64,
    model: &M,
    options: &PipelineOptions,
) -> PlannerResult
where
    M: DistanceModel + ?Sized,
{
    let nearby =
        GeoIndex::new(requests).within_radius_by(hawker.location, options.search_radius_m, model);
    let candidates: Vec<&BuyerRequest> = nearby
        .into_iter()
        .filter(|request| {
            !options.match_commodities || matches_commodities(request, &hawker.commodities)
        })
        .collect();
    debug!(
        hawker = %hawker.id,
        visible = requests.len(),
        candidates = candidates.len(),
        "planning hawker route"
    );

    solve(hawker.location, candidates, now, model, &options.solve)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HawkerPlan {
    pub hawker_id: String,
    pub result: PlannerResult,
}

/// Plans every hawker independently and in parallel.
///
/// Results come back in the same order as `hawkers`.
pub fn plan_fleet<M>(
    hawkers: &[HawkerLocation],
    requests: &[BuyerRequest],
    now: i64,
    model: &M,
    options: &PipelineOptions,
) -> Vec<HawkerPlan>
where
    M: DistanceModel + Sync + ?Sized,
{
    hawkers
        .par_iter()
        .map(|hawker| HawkerPlan {
            hawker_id: hawker.id.clone(),
            result: plan_for_hawker(hawker, requests, now, model, options),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine::HaversineModel;
    use crate::model::Coordinate;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn hawker(id: &str, lat: f64, lng: f64, sells: &[&str]) -> HawkerLocation {
        HawkerLocation {
            id: id.to_string(),
            location: coord(lat, lng),
            commodities: sells.iter().map(|c| c.to_string()).collect(),
            updated_at: 0,
        }
    }

    fn request(id: &str, lat: f64, lng: f64, wants: &[&str]) -> BuyerRequest {
        BuyerRequest::new(
            id,
            coord(lat, lng),
            wants.iter().map(|c| c.to_string()).collect(),
            0,
            10_000,
        )
        .unwrap()
    }

    #[test]
    fn test_radius_and_commodity_filtering() {
        let requests = vec![
            request("near-match", 0.0, 0.005, &["durian"]),
            request("near-other", 0.0, -0.005, &["rambutan"]),
            request("far-match", 0.0, 0.5, &["durian"]),
        ];
        let result = plan_for_hawker(
            &hawker("h1", 0.0, 0.0, &["durian"]),
            &requests,
            0,
            &HaversineModel::default(),
            &PipelineOptions::default(),
        );
        assert_eq!(result.route.request_ids(), vec!["near-match"]);
    }

    #[test]
    fn test_commodity_matching_can_be_disabled() {
        let requests = vec![request("near-other", 0.0, -0.005, &["rambutan"])];
        let options = PipelineOptions {
            match_commodities: false,
            ..PipelineOptions::default()
        };
        let result = plan_for_hawker(
            &hawker("h1", 0.0, 0.0, &["durian"]),
            &requests,
            0,
            &HaversineModel::default(),
            &options,
        );
        assert_eq!(result.route.len(), 1);
    }

    #[test]
    fn test_fleet_preserves_order_and_independence() {
        let requests = vec![
            request("west", 0.0, -0.005, &["kaya"]),
            request("east", 0.0, 0.005, &["kaya"]),
        ];
        let hawkers = vec![
            hawker("h-east", 0.0, 0.006, &["kaya"]),
            hawker("h-west", 0.0, -0.006, &["kaya"]),
        ];
        let options = PipelineOptions {
            search_radius_m: 300.0,
            ..PipelineOptions::default()
        };
        let plans = plan_fleet(&hawkers, &requests, 0, &HaversineModel::default(), &options);

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].hawker_id, "h-east");
        assert_eq!(plans[0].result.route.request_ids(), vec!["east"]);
        assert_eq!(plans[1].hawker_id, "h-west");
        assert_eq!(plans[1].result.route.request_ids(), vec!["west"]);
    }

    /// Street distance approximated as great-circle times a detour factor.
    struct Detour(f64);

    impl DistanceModel for Detour {
        fn distance(&self, from: Coordinate, to: Coordinate) -> f64 {
            HaversineModel::haversine_m(from, to) * self.0
        }

        fn travel_duration(&self, from: Coordinate, to: Coordinate) -> f64 {
            self.distance(from, to) / 5.0
        }
    }

    #[test]
    fn test_search_radius_uses_callers_model() {
        // ~1.1 km away: inside 1.5 km as the crow flies, outside it by street.
        let requests = vec![request("r1", 0.0, 0.01, &["durian"])];
        let h = hawker("h1", 0.0, 0.0, &["durian"]);
        let options = PipelineOptions {
            search_radius_m: 1_500.0,
            ..PipelineOptions::default()
        };

        let direct = plan_for_hawker(&h, &requests, 0, &HaversineModel::default(), &options);
        assert_eq!(direct.route.len(), 1);

        let by_street = plan_for_hawker(&h, &requests, 0, &Detour(1.5), &options);
        assert!(by_street.route.is_empty());
        assert!(by_street.excluded.is_empty());
    }

    #[test]
    fn test_validate_rejects_negative_radius() {
        let options = PipelineOptions {
            search_radius_m: -1.0,
            ..PipelineOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
