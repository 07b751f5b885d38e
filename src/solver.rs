//! Single-hawker route optimizer.
//!
//! Orders eligible buyer requests into a time-window feasible route:
//! nearest-neighbor construction with an earliest-expiration tie-break,
//! a feasibility-checked 2-opt pass, then one recovery attempt for requests
//! the construction had to skip.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PlannerError;
use crate::filter::{ExclusionReason, ineligibility};
use crate::model::{BuyerRequest, Coordinate, Route, RouteSegment};
use crate::traits::{DistanceModel, Located};

/// Minimum distance gain (meters) for a 2-opt move to count as improving.
const IMPROVEMENT_EPSILON_M: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Time spent at each stop before moving on, in seconds.
    pub service_secs: i64,
    /// Candidates whose distance is within this many meters of the nearest
    /// one are considered tied and ordered by expiration.
    pub tie_tolerance_m: f64,
    /// Maximum number of accepted 2-opt moves.
    pub max_improvement_rounds: usize,
    /// Wall-clock budget for 2-opt and recovery insertion together.
    #[serde(with = "duration_ms")]
    pub time_budget: Duration,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            service_secs: 120,
            tie_tolerance_m: 1.0,
            max_improvement_rounds: 1000,
            time_budget: Duration::from_millis(200),
        }
    }
}

impl SolveOptions {
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.service_secs < 0 {
            return Err(PlannerError::InvalidConfig(format!(
                "service_secs must not be negative, got {}",
                self.service_secs
            )));
        }
        if !self.tie_tolerance_m.is_finite() || self.tie_tolerance_m < 0.0 {
            return Err(PlannerError::InvalidConfig(format!(
                "tie_tolerance_m must be a non-negative number, got {}",
                self.tie_tolerance_m
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedRequest {
    pub request_id: String,
    pub reason: ExclusionReason,
}

/// How the improvement phase ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementStats {
    /// Accepted 2-opt moves.
    pub rounds: usize,
    /// True when the round cap or time budget stopped the search early.
    pub budget_exhausted: bool,
    /// Requests skipped during construction and later inserted.
    pub recovered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerResult {
    pub route: Route,
    pub excluded: Vec<ExcludedRequest>,
    pub stats: ImprovementStats,
}

impl PlannerResult {
    pub fn empty() -> Self {
        Self {
            route: Route::empty(),
            excluded: Vec::new(),
            stats: ImprovementStats::default(),
        }
    }
}

/// Computes the best route from `start` over `requests` at time `now`.
///
/// Requests that are ineligible or cannot be reached inside their window
/// are left out and listed in `excluded`; none of these are errors.
pub fn solve<'a, I, M>(
    start: Coordinate,
    requests: I,
    now: i64,
    model: &M,
    options: &SolveOptions,
) -> PlannerResult
where
    I: IntoIterator<Item = &'a BuyerRequest>,
    M: DistanceModel + ?Sized,
{
    let started_at = Instant::now();
    let mut excluded: Vec<ExcludedRequest> = Vec::new();
    let mut candidates: Vec<&BuyerRequest> = Vec::new();

    for request in requests {
        match ineligibility(request, now) {
            Some(reason) => excluded.push(ExcludedRequest {
                request_id: request.id().to_string(),
                reason,
            }),
            None => candidates.push(request),
        }
    }

    if candidates.is_empty() {
        debug!(excluded = excluded.len(), "no eligible requests");
        return PlannerResult {
            excluded,
            ..PlannerResult::empty()
        };
    }

    let plan = Plan::new(start, now, &candidates, model, options);
    let (mut tour, mut skipped) = plan.nearest_neighbor_tour();
    debug!(
        candidates = candidates.len(),
        tour = tour.len(),
        skipped = skipped.len(),
        "constructed initial tour"
    );

    let deadline = started_at + options.time_budget;
    let mut stats = ImprovementStats::default();
    stats.budget_exhausted = plan.two_opt(&mut tour, deadline, &mut stats.rounds);

    skipped.sort_by(|&a, &b| plan.deadline_order(a, b));
    let mut still_skipped = Vec::new();
    let mut out_of_time = false;
    for node in skipped {
        if !out_of_time {
            match plan.insert_cheapest(&mut tour, node, deadline) {
                Some(true) => {
                    stats.recovered += 1;
                    continue;
                }
                Some(false) => {}
                None => out_of_time = true,
            }
        }
        still_skipped.push(node);
    }
    if out_of_time {
        debug!(skipped = still_skipped.len(), "recovery stopped at deadline");
        stats.budget_exhausted = true;
    }
    if stats.recovered > 0 && !stats.budget_exhausted {
        stats.budget_exhausted = plan.two_opt(&mut tour, deadline, &mut stats.rounds);
    }

    if stats.budget_exhausted {
        warn!(
            rounds = stats.rounds,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "route improvement budget exhausted; returning best tour found"
        );
    }

    excluded.extend(still_skipped.into_iter().map(|node| ExcludedRequest {
        request_id: candidates[node].id().to_string(),
        reason: ExclusionReason::OutsideWindow,
    }));

    // Every tour the plan keeps is feasible, so a schedule always exists.
    let route = plan.assemble(&tour).unwrap_or_default();

    PlannerResult {
        route,
        excluded,
        stats,
    }
}

/// Route-only form of [`solve`].
pub fn optimize<'a, I, M>(
    start: Coordinate,
    requests: I,
    now: i64,
    model: &M,
    options: &SolveOptions,
) -> Route
where
    I: IntoIterator<Item = &'a BuyerRequest>,
    M: DistanceModel + ?Sized,
{
    solve(start, requests, now, model, options).route
}

/// Precomputed costs for one optimization.
///
/// Node 0 is the start point, node `i + 1` is candidate `i`. Tours hold
/// candidate indices.
struct Plan<'r, 'o> {
    start: Coordinate,
    now: i64,
    candidates: &'r [&'r BuyerRequest],
    distance: Vec<Vec<f64>>,
    duration: Vec<Vec<i64>>,
    options: &'o SolveOptions,
}

enum Search {
    Found(Vec<usize>, f64),
    Converged,
    OutOfTime,
}

/// Arrival times and leg costs of a feasible tour.
struct Schedule {
    arrivals: Vec<i64>,
    total_distance_m: f64,
}

impl<'r, 'o> Plan<'r, 'o> {
    fn new<M: DistanceModel + ?Sized>(
        start: Coordinate,
        now: i64,
        candidates: &'r [&'r BuyerRequest],
        model: &M,
        options: &'o SolveOptions,
    ) -> Self {
        let mut points = Vec::with_capacity(candidates.len() + 1);
        points.push(start);
        points.extend(candidates.iter().map(|request| request.location()));

        let n = points.len();
        let mut distance = vec![vec![0.0; n]; n];
        let mut duration = vec![vec![0; n]; n];
        for (i, from) in points.iter().enumerate() {
            for (j, to) in points.iter().enumerate() {
                if i != j {
                    distance[i][j] = model.distance(*from, *to);
                    duration[i][j] = model.travel_duration(*from, *to).round() as i64;
                }
            }
        }

        Self {
            start,
            now,
            candidates,
            distance,
            duration,
            options,
        }
    }

    fn location(&self, node: usize) -> Coordinate {
        self.candidates[node].location()
    }

    /// Earliest expiration first, then id.
    fn deadline_order(&self, a: usize, b: usize) -> Ordering {
        let (ra, rb) = (self.candidates[a], self.candidates[b]);
        ra.expiration()
            .cmp(&rb.expiration())
            .then_with(|| ra.id().cmp(rb.id()))
            .then_with(|| a.cmp(&b))
    }

    /// Arrival at `node` when leaving `from` (0 = start) at `departure`, or
    /// `None` if the window has closed by then.
    fn arrive(&self, from: usize, node: usize, departure: i64) -> Option<i64> {
        let request = self.candidates[node];
        let arrival = (departure + self.duration[from][node + 1]).max(request.window_start());
        (arrival <= request.window_end()).then_some(arrival)
    }

    fn nearest_neighbor_tour(&self) -> (Vec<usize>, Vec<usize>) {
        let mut remaining: Vec<usize> = (0..self.candidates.len()).collect();
        let mut tour = Vec::with_capacity(remaining.len());
        let mut skipped = Vec::new();
        let mut position = 0;
        let mut time = self.now;

        while !remaining.is_empty() {
            let nearest = remaining
                .iter()
                .map(|&node| self.distance[position][node + 1])
                .fold(f64::INFINITY, f64::min);
            let Some(slot) = remaining
                .iter()
                .enumerate()
                .filter(|&(_, &node)| {
                    self.distance[position][node + 1] <= nearest + self.options.tie_tolerance_m
                })
                .min_by(|&(_, &a), &(_, &b)| self.deadline_order(a, b))
                .map(|(slot, _)| slot)
            else {
                break;
            };
            let node = remaining.remove(slot);

            match self.arrive(position, node, time) {
                Some(arrival) => {
                    tour.push(node);
                    time = arrival + self.options.service_secs;
                    position = node + 1;
                }
                None => skipped.push(node),
            }
        }

        (tour, skipped)
    }

    fn schedule(&self, tour: &[usize]) -> Option<Schedule> {
        let mut arrivals = Vec::with_capacity(tour.len());
        let mut total_distance_m = 0.0;
        let mut position = 0;
        let mut time = self.now;

        for &node in tour {
            let arrival = self.arrive(position, node, time)?;
            total_distance_m += self.distance[position][node + 1];
            arrivals.push(arrival);
            time = arrival + self.options.service_secs;
            position = node + 1;
        }

        Some(Schedule {
            arrivals,
            total_distance_m,
        })
    }

    fn tour_distance(&self, tour: &[usize]) -> f64 {
        let mut position = 0;
        let mut total = 0.0;
        for &node in tour {
            total += self.distance[position][node + 1];
            position = node + 1;
        }
        total
    }

    /// First-improvement 2-opt over the open path from the start point.
    ///
    /// Returns true when the round cap or deadline stopped the search
    /// while an improving move was still possible. `tour` is always left
    /// feasible.
    fn two_opt(&self, tour: &mut Vec<usize>, deadline: Instant, rounds: &mut usize) -> bool {
        if tour.len() < 2 {
            return false;
        }

        let mut current = self.tour_distance(tour);
        loop {
            let (candidate, distance) = match self.improving_reversal(tour, current, deadline) {
                Search::Converged => return false,
                Search::OutOfTime => return true,
                Search::Found(candidate, distance) => (candidate, distance),
            };
            if *rounds >= self.options.max_improvement_rounds {
                return true;
            }
            *tour = candidate;
            current = distance;
            *rounds += 1;
        }
    }

    /// First reversal that is strictly shorter than `current` and feasible.
    fn improving_reversal(&self, tour: &[usize], current: f64, deadline: Instant) -> Search {
        let n = tour.len();
        for i in 0..n - 1 {
            if Instant::now() >= deadline {
                return Search::OutOfTime;
            }
            for j in i + 1..n {
                let mut candidate = tour.to_vec();
                candidate[i..=j].reverse();

                let distance = self.tour_distance(&candidate);
                if distance >= current - IMPROVEMENT_EPSILON_M {
                    continue;
                }
                if self.schedule(&candidate).is_some() {
                    return Search::Found(candidate, distance);
                }
            }
        }
        Search::Converged
    }

    /// Inserts `node` where it adds the least distance while keeping the
    /// whole tour feasible. Earliest position wins ties.
    ///
    /// Returns whether `node` was inserted, or `None` if `deadline` passed
    /// first, in which case `tour` is untouched.
    fn insert_cheapest(
        &self,
        tour: &mut Vec<usize>,
        node: usize,
        deadline: Instant,
    ) -> Option<bool> {
        let base = self.tour_distance(tour);
        let mut best: Option<(usize, f64)> = None;

        for position in 0..=tour.len() {
            if Instant::now() >= deadline {
                return None;
            }
            let mut candidate = tour.clone();
            candidate.insert(position, node);
            let Some(schedule) = self.schedule(&candidate) else {
                continue;
            };
            let added = schedule.total_distance_m - base;
            if best.is_none_or(|(_, best_added)| added < best_added) {
                best = Some((position, added));
            }
        }

        match best {
            Some((position, _)) => {
                tour.insert(position, node);
                Some(true)
            }
            None => Some(false),
        }
    }

    fn assemble(&self, tour: &[usize]) -> Option<Route> {
        let schedule = self.schedule(tour)?;
        let mut segments = Vec::with_capacity(tour.len());
        let mut position = 0;
        let mut from = self.start;
        let mut total_duration_secs = 0;

        for (&node, &arrival) in tour.iter().zip(&schedule.arrivals) {
            let to = self.location(node);
            let duration_secs = self.duration[position][node + 1];
            segments.push(RouteSegment {
                request_id: self.candidates[node].id().to_string(),
                from,
                to,
                distance_m: self.distance[position][node + 1],
                duration_secs,
                arrival,
            });
            total_duration_secs += duration_secs;
            from = to;
            position = node + 1;
        }

        Some(Route {
            segments,
            total_distance_m: schedule.total_distance_m,
            total_duration_secs,
        })
    }
}

pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
