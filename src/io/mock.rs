//! Mock swerve drivetrain for the node binary and tests.
//!
//! Commanded module states are held until the next command and integrated
//! into a ground-truth pose, cumulative wheel distances and a gyro yaw.
//! The drivetrain is both the [`ModuleSink`] the control loop commands and
//! the [`SignalSource`] the fusion engine reads; clones share one state.
//! Every read integrates up to the current time, so batches are never stale.

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::core::kinematics::SwerveKinematics;
use crate::core::math::elapsed_secs;
use crate::core::types::{MODULE_COUNT, ModuleState, Pose2D, Twist2D};
use crate::sensors::{SignalBatch, SignalSource, batch_at};
use crate::threads::ModuleSink;
use crate::utils::MonotonicClock;

/// Simulated drivetrain.
#[derive(Clone)]
pub struct MockDrivetrain {
    state: Arc<Mutex<MockState>>,
    kinematics: SwerveKinematics,
    clock: MonotonicClock,
}

#[derive(Debug, Clone)]
struct MockState {
    truth: Pose2D,
    /// Unwrapped gyro heading
    yaw: f32,
    distances: [f32; MODULE_COUNT],
    commanded: [ModuleState; MODULE_COUNT],
    last_us: Option<u64>,
    signals_enabled: bool,
}

impl MockDrivetrain {
    /// Create a stationary drivetrain at `initial_pose`.
    ///
    /// The gyro reads zero at start regardless of the field heading.
    pub fn new(kinematics: SwerveKinematics, clock: MonotonicClock, initial_pose: Pose2D) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                truth: initial_pose,
                yaw: 0.0,
                distances: [0.0; MODULE_COUNT],
                commanded: [ModuleState::default(); MODULE_COUNT],
                last_us: None,
                signals_enabled: true,
            })),
            kinematics,
            clock,
        }
    }

    /// Ground-truth pose.
    pub fn truth(&self) -> Pose2D {
        self.state.lock().truth
    }

    /// Last commanded module states.
    pub fn commanded(&self) -> [ModuleState; MODULE_COUNT] {
        self.state.lock().commanded
    }

    /// Stop or resume delivering batches (simulates a stalled signal bus).
    ///
    /// The robot keeps moving on its last command while signals are off.
    pub fn set_signals_enabled(&self, enabled: bool) {
        self.state.lock().signals_enabled = enabled;
    }

    /// Integrate the held command up to the current time and sample it.
    pub fn sample(&self) -> SignalBatch {
        let now = self.clock.now_us();
        let mut state = self.state.lock();
        self.integrate(&mut state, now);
        self.batch(&state, now)
    }

    fn integrate(&self, state: &mut MockState, now_us: u64) {
        let Some(last_us) = state.last_us else {
            state.last_us = Some(now_us);
            return;
        };
        let dt = elapsed_secs(last_us, now_us);
        state.last_us = Some(now_us);
        if dt <= 0.0 {
            return;
        }

        let speeds = self.kinematics.to_chassis_speeds(&state.commanded);
        let twist = Twist2D::new(speeds.vx * dt, speeds.vy * dt, speeds.omega * dt);
        state.truth = state.truth.compose(&twist.exp());
        state.yaw += speeds.omega * dt;
        for (distance, module) in state.distances.iter_mut().zip(&state.commanded) {
            *distance += module.speed * dt;
        }
    }

    fn batch(&self, state: &MockState, now_us: u64) -> SignalBatch {
        let speeds = self.kinematics.to_chassis_speeds(&state.commanded);
        let modules: [(f32, f32, f32); MODULE_COUNT] = std::array::from_fn(|i| {
            (
                state.distances[i],
                state.commanded[i].speed,
                state.commanded[i].angle,
            )
        });
        batch_at(modules, state.yaw, speeds.omega, now_us)
    }
}

impl ModuleSink for MockDrivetrain {
    fn apply(&mut self, states: &[ModuleState; MODULE_COUNT]) {
        let now = self.clock.now_us();
        let mut state = self.state.lock();
        // Close out the interval driven at the previous command
        self.integrate(&mut state, now);
        state.commanded = *states;
    }
}

impl SignalSource for MockDrivetrain {
    fn wait_for_batch(&mut self, timeout: Duration) -> Option<SignalBatch> {
        if !self.state.lock().signals_enabled {
            thread::sleep(timeout);
            return None;
        }
        Some(self.sample())
    }
}
