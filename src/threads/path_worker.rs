//! Background path synthesis.
//!
//! Every request gets a generation number and its own short-lived worker
//! thread (`path-gen-<n>`). Results land in a single [`PathSlot`]:
//!
//! - a worker publishes only if its generation is still the latest request
//! - readers only see a path whose generation matches the latest request
//! - a failed request sets a per-generation failure instead of publishing
//!
//! A new request or [`PathRequester::cancel`] bumps the generation, which
//! makes any in-flight worker's result invisible. Workers check the
//! generation before starting and before publishing.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crate::core::types::Pose2D;
use crate::error::PathError;
use crate::planning::{Path, PathSource};

/// Single-slot handoff between path workers and the control thread.
#[derive(Debug, Default)]
pub struct PathSlot {
    generation: AtomicU64,
    published: Mutex<Option<(u64, Arc<Path>)>>,
    failure: Mutex<Option<(u64, PathError)>>,
}

impl PathSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest requested generation (0 before any request).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Start a new generation, invalidating everything before it.
    fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Store `path` for `generation` if it is still current.
    fn publish(&self, generation: u64, path: Arc<Path>) -> bool {
        let mut slot = self.published.lock();
        if !self.is_current(generation) {
            return false;
        }
        *slot = Some((generation, path));
        true
    }

    fn mark_failed(&self, generation: u64, error: PathError) {
        let mut failure = self.failure.lock();
        if self.is_current(generation) {
            *failure = Some((generation, error));
        }
    }

    /// Path for the latest request, if its worker has published.
    pub fn current_path(&self) -> Option<(u64, Arc<Path>)> {
        let generation = self.generation();
        self.published
            .lock()
            .as_ref()
            .filter(|(g, _)| *g == generation)
            .map(|(g, path)| (*g, Arc::clone(path)))
    }

    /// Failure for the latest request, if synthesis failed.
    pub fn current_failure(&self) -> Option<PathError> {
        let generation = self.generation();
        self.failure
            .lock()
            .as_ref()
            .filter(|(g, _)| *g == generation)
            .map(|(_, e)| e.clone())
    }

    /// True when the latest request failed.
    pub fn is_failed(&self) -> bool {
        self.current_failure().is_some()
    }
}

/// A started request.
#[derive(Debug)]
pub struct PathTicket {
    pub generation: u64,
    handle: JoinHandle<()>,
}

impl PathTicket {
    /// Block until the worker has finished (published, failed or abandoned).
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Issues path requests and owns the generation counter.
#[derive(Clone)]
pub struct PathRequester {
    source: Arc<dyn PathSource>,
    slot: Arc<PathSlot>,
}

impl PathRequester {
    pub fn new(source: Arc<dyn PathSource>) -> Self {
        Self {
            source,
            slot: Arc::new(PathSlot::new()),
        }
    }

    /// Slot shared with the consumer.
    pub fn slot(&self) -> Arc<PathSlot> {
        Arc::clone(&self.slot)
    }

    /// Request a path from `start` to `end`.
    ///
    /// Zone location runs synchronously; if it fails the request is marked
    /// failed and no worker is started. Otherwise a worker is spawned and
    /// its ticket returned.
    pub fn request(&self, start: Pose2D, end: Pose2D) -> Result<PathTicket, PathError> {
        let generation = self.slot.advance();

        if let Err(e) = self.source.precheck(&start, &end) {
            log::warn!("Path request {} rejected: {}", generation, e);
            self.slot.mark_failed(generation, e.clone());
            return Err(e);
        }

        let source = Arc::clone(&self.source);
        let slot = Arc::clone(&self.slot);
        let spawned = thread::Builder::new()
            .name(format!("path-gen-{}", generation))
            .spawn(move || run_worker(source, slot, generation, start, end));

        match spawned {
            Ok(handle) => Ok(PathTicket { generation, handle }),
            Err(e) => {
                let error = PathError::WorkerUnavailable(e.to_string());
                log::error!("Path request {}: {}", generation, error);
                self.slot.mark_failed(generation, error.clone());
                Err(error)
            }
        }
    }

    /// Abandon whatever request is in flight.
    pub fn cancel(&self) -> u64 {
        let generation = self.slot.advance();
        log::debug!("Path requests cancelled, generation now {}", generation);
        generation
    }
}

fn run_worker(
    source: Arc<dyn PathSource>,
    slot: Arc<PathSlot>,
    generation: u64,
    start: Pose2D,
    end: Pose2D,
) {
    if !slot.is_current(generation) {
        log::debug!("Path worker {} superseded before start", generation);
        return;
    }

    match source.synthesize(&start, &end) {
        Ok(path) => {
            let waypoints = path.len();
            if slot.publish(generation, Arc::new(path)) {
                log::debug!("Path {} published ({} waypoints)", generation, waypoints);
            } else {
                log::debug!(
                    "Path {} discarded, superseded by {}",
                    generation,
                    slot.generation()
                );
            }
        }
        Err(e) => {
            log::warn!("Path {} synthesis failed: {}", generation, e);
            slot.mark_failed(generation, e);
        }
    }
}
