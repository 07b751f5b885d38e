//! Decides when a hawker's route is recomputed.
//!
//! The location feed pushes immutable [`Snapshot`]s into an
//! [`OptimizationScheduler`]. A worker thread coalesces bursts, skips
//! snapshots that change nothing relevant, runs the pipeline and publishes
//! the result. Every snapshot carries a generation number; a result is only
//! ever published if no newer snapshot has been submitted, and the cached
//! route never moves backwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::PlannerError;
use crate::filter::eligible;
use crate::model::{BuyerRequest, HawkerLocation};
use crate::pipeline::{PipelineOptions, plan_for_hawker};
use crate::solver::{PlannerResult, duration_ms};
use crate::traits::DistanceModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Snapshots arriving within this long of the first one in a burst are
    /// folded into a single run.
    #[serde(with = "duration_ms")]
    pub debounce: Duration,
    /// Hawker movement below this many meters does not trigger a rerun.
    pub min_displacement_m: f64,
    pub pipeline: PipelineOptions,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(3),
            min_displacement_m: 25.0,
            pipeline: PipelineOptions::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), PlannerError> {
        if !self.min_displacement_m.is_finite() || self.min_displacement_m < 0.0 {
            return Err(PlannerError::InvalidConfig(format!(
                "min_displacement_m must be a non-negative number, got {}",
                self.min_displacement_m
            )));
        }
        self.pipeline.validate()
    }
}

/// Everything one optimization run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub hawker: HawkerLocation,
    pub requests: Vec<BuyerRequest>,
    /// Reference time (unix seconds) for eligibility and arrivals.
    pub now: i64,
}

/// Why a snapshot caused a rerun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// Nothing has been optimized yet.
    Initial,
    NewRequest,
    /// A known request was replaced with different contents.
    RequestUpdated,
    /// A previously eligible request expired or disappeared.
    RequestExpired,
    HawkerMoved,
}

/// Whether `next` warrants re-optimizing relative to the last optimized
/// snapshot.
pub fn detect_trigger<M>(
    previous: Option<&Snapshot>,
    next: &Snapshot,
    min_displacement_m: f64,
    model: &M,
) -> Option<Trigger>
where
    M: DistanceModel + ?Sized,
{
    let Some(previous) = previous else {
        return Some(Trigger::Initial);
    };

    let before: HashMap<&str, &BuyerRequest> = eligible(&previous.requests, previous.now)
        .into_iter()
        .map(|request| (request.id(), request))
        .collect();
    let after = eligible(&next.requests, next.now);

    if after.iter().any(|request| !before.contains_key(request.id())) {
        return Some(Trigger::NewRequest);
    }
    if after
        .iter()
        .any(|request| before.get(request.id()).is_some_and(|old| *old != *request))
    {
        return Some(Trigger::RequestUpdated);
    }
    if after.len() < before.len() {
        return Some(Trigger::RequestExpired);
    }

    let moved = model.distance(previous.hawker.location, next.hawker.location);
    if moved >= min_displacement_m && moved > 0.0 {
        return Some(Trigger::HawkerMoved);
    }

    None
}

/// A published optimization outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteUpdate {
    pub generation: u64,
    pub trigger: Trigger,
    /// Reference time of the snapshot the route was computed from.
    pub computed_for: i64,
    pub result: PlannerResult,
}

/// Last good route, only ever replaced by a newer generation.
#[derive(Debug, Default)]
pub struct RouteCache {
    latest: RwLock<Option<RouteUpdate>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `update` unless an equal or newer generation is already
    /// cached. Returns whether it was stored.
    pub fn publish(&self, update: RouteUpdate) -> bool {
        let mut latest = self.latest.write().unwrap_or_else(|e| e.into_inner());
        if latest
            .as_ref()
            .is_some_and(|current| current.generation >= update.generation)
        {
            return false;
        }
        *latest = Some(update);
        true
    }

    pub fn latest(&self) -> Option<RouteUpdate> {
        self.latest
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

enum Command {
    Snapshot(u64, Box<Snapshot>),
    Shutdown,
}

/// Per-hawker scheduler running the pipeline on a worker thread.
pub struct OptimizationScheduler {
    sender: Option<Sender<Command>>,
    submitted: Arc<AtomicU64>,
    cache: Arc<RouteCache>,
    worker: Option<JoinHandle<()>>,
}

impl OptimizationScheduler {
    /// Starts the worker. Published updates are also sent on the returned
    /// receiver, in increasing generation order.
    pub fn spawn<M>(
        config: SchedulerConfig,
        model: M,
    ) -> Result<(Self, Receiver<RouteUpdate>), PlannerError>
    where
        M: DistanceModel + Send + 'static,
    {
        config.validate()?;

        let (sender, commands) = mpsc::channel();
        let (updates, receiver) = mpsc::channel();
        let submitted = Arc::new(AtomicU64::new(0));
        let cache = Arc::new(RouteCache::new());

        let worker = Worker {
            config,
            model,
            submitted: Arc::clone(&submitted),
            cache: Arc::clone(&cache),
            updates,
        };
        let handle = thread::spawn(move || worker.run(commands));

        Ok((
            Self {
                sender: Some(sender),
                submitted,
                cache,
                worker: Some(handle),
            },
            receiver,
        ))
    }

    /// Queues a snapshot and returns its generation.
    pub fn submit(&self, snapshot: Snapshot) -> Result<u64, PlannerError> {
        let sender = self.sender.as_ref().ok_or(PlannerError::SchedulerClosed)?;
        let generation = self.submitted.fetch_add(1, Ordering::SeqCst) + 1;
        sender
            .send(Command::Snapshot(generation, Box::new(snapshot)))
            .map_err(|_| PlannerError::SchedulerClosed)?;
        Ok(generation)
    }

    /// The most recent published route, if any.
    pub fn latest(&self) -> Option<RouteUpdate> {
        self.cache.latest()
    }

    /// Generation of the most recently submitted snapshot.
    pub fn submitted_generation(&self) -> u64 {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Stops the worker and waits for it. Pending snapshots are dropped.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(Command::Shutdown);
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for OptimizationScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker<M> {
    config: SchedulerConfig,
    model: M,
    submitted: Arc<AtomicU64>,
    cache: Arc<RouteCache>,
    updates: Sender<RouteUpdate>,
}

impl<M: DistanceModel> Worker<M> {
    fn run(self, commands: Receiver<Command>) {
        let mut last_optimized: Option<Snapshot> = None;
        let mut last_generation = 0;

        loop {
            let (generation, snapshot) = match commands.recv() {
                Ok(Command::Snapshot(generation, snapshot)) => (generation, snapshot),
                Ok(Command::Shutdown) | Err(_) => return,
            };
            let Some((generation, snapshot, disconnected)) =
                self.coalesce(&commands, generation, snapshot)
            else {
                return;
            };

            if generation > last_generation {
                last_generation = generation;
                if self.process(generation, *snapshot, &mut last_optimized) {
                    trace!(generation, "published route update");
                }
            }

            if disconnected {
                return;
            }
        }
    }

    /// Folds snapshots arriving within the debounce window into the newest
    /// one. Returns `None` on shutdown; the flag reports a closed channel.
    fn coalesce(
        &self,
        commands: &Receiver<Command>,
        mut generation: u64,
        mut snapshot: Box<Snapshot>,
    ) -> Option<(u64, Box<Snapshot>, bool)> {
        let window_ends = Instant::now() + self.config.debounce;
        let mut folded = 0;

        loop {
            let wait = window_ends.saturating_duration_since(Instant::now());
            match commands.recv_timeout(wait) {
                Ok(Command::Snapshot(next_generation, next)) => {
                    folded += 1;
                    if next_generation > generation {
                        generation = next_generation;
                        snapshot = next;
                    }
                }
                Ok(Command::Shutdown) => return None,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Some((generation, snapshot, true)),
            }
        }

        if folded > 0 {
            debug!(generation, folded, "coalesced snapshot burst");
        }
        Some((generation, snapshot, false))
    }

    fn process(
        &self,
        generation: u64,
        snapshot: Snapshot,
        last_optimized: &mut Option<Snapshot>,
    ) -> bool {
        let Some(trigger) = detect_trigger(
            last_optimized.as_ref(),
            &snapshot,
            self.config.min_displacement_m,
            &self.model,
        ) else {
            trace!(generation, "snapshot changes nothing; keeping current route");
            return false;
        };

        debug!(generation, ?trigger, hawker = %snapshot.hawker.id, "optimizing");
        let result = plan_for_hawker(
            &snapshot.hawker,
            &snapshot.requests,
            snapshot.now,
            &self.model,
            &self.config.pipeline,
        );

        if self.submitted.load(Ordering::SeqCst) > generation {
            debug!(generation, "newer snapshot pending; discarding result");
            return false;
        }

        let update = RouteUpdate {
            generation,
            trigger,
            computed_for: snapshot.now,
            result,
        };
        if !self.cache.publish(update.clone()) {
            return false;
        }
        let _ = self.updates.send(update);
        *last_optimized = Some(snapshot);
        true
    }
}
