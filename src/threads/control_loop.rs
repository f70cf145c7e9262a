//! Control thread - fixed-period fusion and pursuit.
//!
//! Each cycle:
//! - Runs one fusion step (the only blocking point, bounded by the signal timeout)
//! - Drains pending [`DriveCommand`]s
//! - Computes module states for the active goal
//! - Hands the states to the [`ModuleSink`] and updates [`SharedStatus`]
//!
//! Path goals are resolved through the [`PathSlot`]: the loop waits (modules
//! stopped) until the worker for the goal's generation publishes, and ends
//! the goal immediately if that generation is marked failed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::path_worker::{PathRequester, PathSlot};
use crate::control::{PathFollower, PursuitController};
use crate::core::types::{MODULE_COUNT, ModuleState, Pose2D};
use crate::error::{Error, PathError, Result};
use crate::localization::PoseFusionEngine;
use crate::planning::Waypoint;
use crate::sensors::SignalSource;
use crate::state::{
    CommandReceiver, CommandSender, DriveCommand, DriveStatus, FusedPose, SharedPose,
    SharedStatus,
};

/// Consumer of commanded module states (motor controllers, simulator).
pub trait ModuleSink: Send {
    fn apply(&mut self, states: &[ModuleState; MODULE_COUNT]);
}

enum Goal {
    Idle,
    Waypoint(Waypoint),
    Path {
        generation: u64,
        follower: Option<PathFollower>,
    },
    Finished(DriveStatus),
}

/// The control loop state, owned by the control thread.
pub struct ControlLoop<S: SignalSource, K: ModuleSink> {
    fusion: PoseFusionEngine<S>,
    controller: PursuitController,
    sink: K,
    slot: Arc<PathSlot>,
    commands: CommandReceiver,
    status: SharedStatus,
    goal: Goal,
    goal_generation: u64,
    period: Duration,
}

impl<S: SignalSource, K: ModuleSink> ControlLoop<S, K> {
    pub fn new(
        fusion: PoseFusionEngine<S>,
        controller: PursuitController,
        sink: K,
        slot: Arc<PathSlot>,
        commands: CommandReceiver,
    ) -> Self {
        let period = Duration::from_secs_f32(controller.config().period_s);
        Self {
            fusion,
            controller,
            sink,
            slot,
            commands,
            status: SharedStatus::default(),
            goal: Goal::Idle,
            goal_generation: 0,
            period,
        }
    }

    pub fn shared_pose(&self) -> SharedPose {
        self.fusion.shared_pose()
    }

    pub fn shared_status(&self) -> SharedStatus {
        self.status.clone()
    }

    pub fn fusion(&self) -> &PoseFusionEngine<S> {
        &self.fusion
    }

    /// Run one control cycle.
    pub fn tick(&mut self) -> DriveStatus {
        let fused = self.fusion.step();
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command);
        }

        let (states, status) = self.pursue(&fused);
        self.sink.apply(&states);
        self.status.set(status, self.goal_generation);
        status
    }

    /// Loop at the configured period until `running` is cleared, then stop
    /// the modules.
    pub fn run(mut self, running: Arc<AtomicBool>) {
        log::info!(
            "Control thread running at {}ms period",
            self.period.as_millis()
        );
        let mut overruns = 0u64;

        while running.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();
            self.tick();

            let elapsed = cycle_start.elapsed();
            if elapsed < self.period {
                thread::sleep(self.period - elapsed);
            } else {
                overruns += 1;
                log::trace!("Control cycle overran: {:?}", elapsed);
            }
        }

        let states = self.controller.stop();
        self.sink.apply(&states);
        let stats = self.fusion.stats();
        log::info!(
            "Control thread stopped ({} cycles, {} stale, {} overruns)",
            stats.cycles,
            stats.stale_cycles,
            overruns
        );
    }

    fn handle_command(&mut self, command: DriveCommand) {
        log::debug!("Drive command: {:?}", command);
        match command {
            DriveCommand::FollowPath { generation } => {
                self.goal = Goal::Path {
                    generation,
                    follower: None,
                };
                self.goal_generation = generation;
            }
            DriveCommand::DriveTo { target } => {
                self.goal = Goal::Waypoint(target);
                self.goal_generation = 0;
            }
            DriveCommand::ResetPose { pose } => self.fusion.reset_pose(pose),
            DriveCommand::Stop => {
                self.goal = Goal::Idle;
                self.goal_generation = 0;
            }
        }
    }

    fn pursue(&mut self, fused: &FusedPose) -> ([ModuleState; MODULE_COUNT], DriveStatus) {
        let pose = fused.pose;
        let mut next = None;

        let result = match &mut self.goal {
            Goal::Idle => (self.controller.stop(), DriveStatus::Idle),
            Goal::Finished(status) => (self.controller.stop(), *status),
            Goal::Waypoint(target) => {
                let out = self.controller.drive_to(&pose, target);
                if out.done {
                    next = Some(Goal::Finished(DriveStatus::Arrived));
                    (out.states, DriveStatus::Arrived)
                } else {
                    (out.states, DriveStatus::Tracking)
                }
            }
            Goal::Path {
                generation,
                follower,
            } => {
                let generation = *generation;
                if let Some(error) = failure_for(&self.slot, generation) {
                    log::warn!("Path {} failed ({}), stopping", generation, error);
                    next = Some(Goal::Finished(DriveStatus::PathFailed));
                    (self.controller.abort().states, DriveStatus::PathFailed)
                } else {
                    if follower.is_none()
                        && let Some((published, path)) = self.slot.current_path()
                        && published == generation
                    {
                        let config = self.controller.config();
                        *follower = Some(PathFollower::new(
                            path,
                            config.lookup_mode,
                            config.lookahead,
                        ));
                    }
                    match follower {
                        Some(follower) => {
                            let out = follower.update(&mut self.controller, &pose);
                            if out.done {
                                next = Some(Goal::Finished(DriveStatus::Arrived));
                                (out.states, DriveStatus::Arrived)
                            } else {
                                (out.states, DriveStatus::Tracking)
                            }
                        }
                        None => (self.controller.stop(), DriveStatus::AwaitingPath),
                    }
                }
            }
        };

        if let Some(goal) = next {
            self.goal = goal;
        }
        result
    }
}

fn failure_for(slot: &PathSlot, generation: u64) -> Option<PathError> {
    if slot.generation() != generation {
        return None;
    }
    slot.current_failure()
}

/// Handle to a running control thread.
pub struct ControlThread {
    handle: JoinHandle<()>,
}

impl ControlThread {
    /// Spawn the control loop on a thread named `control`.
    pub fn spawn<S, K>(control: ControlLoop<S, K>, running: Arc<AtomicBool>) -> Result<Self>
    where
        S: SignalSource + 'static,
        K: ModuleSink + 'static,
    {
        let handle = thread::Builder::new()
            .name("control".into())
            .spawn(move || control.run(running))
            .map_err(|e| Error::Thread(format!("failed to spawn control thread: {}", e)))?;
        Ok(Self { handle })
    }

    /// Wait for the thread to finish.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

/// Caller-side API: request goals and observe progress.
#[derive(Clone)]
pub struct DriveHandle {
    requester: PathRequester,
    commands: CommandSender,
    pose: SharedPose,
    status: SharedStatus,
}

impl DriveHandle {
    pub fn new(
        requester: PathRequester,
        commands: CommandSender,
        pose: SharedPose,
        status: SharedStatus,
    ) -> Self {
        Self {
            requester,
            commands,
            pose,
            status,
        }
    }

    /// Synthesize and follow a path from the current pose to `goal`.
    ///
    /// Returns the request generation. A request that fails zone location
    /// is still handed to the control thread, which stops immediately.
    pub fn go_to(&self, goal: Pose2D) -> std::result::Result<u64, PathError> {
        let start = self.pose.get().pose;
        let result = self.requester.request(start, goal);
        let generation = match &result {
            Ok(ticket) => ticket.generation,
            Err(_) => self.requester.slot().generation(),
        };
        self.send(DriveCommand::FollowPath { generation });
        result.map(|ticket| ticket.generation)
    }

    /// Drive straight at a single waypoint.
    pub fn drive_to(&self, target: Waypoint) {
        self.send(DriveCommand::DriveTo { target });
    }

    /// Cancel any path request and stop.
    pub fn stop(&self) {
        self.requester.cancel();
        self.send(DriveCommand::Stop);
    }

    pub fn reset_pose(&self, pose: Pose2D) {
        self.send(DriveCommand::ResetPose { pose });
    }

    pub fn pose(&self) -> FusedPose {
        self.pose.get()
    }

    pub fn status(&self) -> DriveStatus {
        self.status.get()
    }

    /// Poll until the goal for `generation` finishes or `timeout` elapses.
    pub fn wait_for(&self, generation: u64, timeout: Duration) -> Option<DriveStatus> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let (status, current) = self.status.get_with_generation();
            if current == generation && status.is_finished() {
                return Some(status);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    fn send(&self, command: DriveCommand) {
        if self.commands.send(command).is_err() {
            log::warn!("Control thread is gone, command dropped");
        }
    }
}
