//! Synchronized signal batches and the sources that deliver them.
//!
//! All drive, steer and IMU signals are refreshed together by the hardware
//! layer. A [`SignalBatch`] is one such refresh; the fusion engine blocks on
//! a [`SignalSource`] for at most a bounded timeout per cycle.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::time::Duration;

use super::signal::{CompensatedSignal, SignalSample};
use crate::core::types::{MODULE_COUNT, ModulePosition};

/// Raw drive and steer signals for one swerve module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleSignals {
    /// Cumulative wheel travel (m) with drive velocity (m/s)
    pub drive: CompensatedSignal,
    /// Steer angle (rad) with steer rate (rad/s)
    pub steer: CompensatedSignal,
}

impl ModuleSignals {
    /// Latency-compensated module position at `now_us`.
    pub fn position_at(&self, now_us: u64) -> ModulePosition {
        ModulePosition::new(self.drive.at(now_us), self.steer.at(now_us))
    }
}

/// Raw IMU attitude signals.
///
/// Angles in radians, rates in rad/s. Yaw is the gyro heading, which is not
/// necessarily aligned with the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSignals {
    pub yaw: CompensatedSignal,
    pub roll: CompensatedSignal,
    pub pitch: CompensatedSignal,
}

impl ImuSignals {
    /// Level IMU with the given yaw, no rates.
    pub fn level(yaw: f32, timestamp_us: u64) -> Self {
        Self {
            yaw: CompensatedSignal::position_only(yaw, timestamp_us),
            roll: CompensatedSignal::position_only(0.0, timestamp_us),
            pitch: CompensatedSignal::position_only(0.0, timestamp_us),
        }
    }
}

/// One synchronized refresh of every drivetrain signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalBatch {
    /// Modules in front-left, front-right, back-left, back-right order
    pub modules: [ModuleSignals; MODULE_COUNT],
    pub imu: ImuSignals,
    /// Time the refresh completed; signals are compensated to this instant
    pub refreshed_us: u64,
}

impl SignalBatch {
    /// Compensated module positions at the refresh time.
    ///
    /// Values are extrapolated to `refreshed_us`, not to the moment the
    /// batch is consumed. The fused pose built from them is stamped with
    /// `refreshed_us`, so position and timestamp refer to the same instant.
    pub fn module_positions(&self) -> [ModulePosition; MODULE_COUNT] {
        self.modules.map(|m| m.position_at(self.refreshed_us))
    }

    /// Compensated gyro yaw at the refresh time.
    pub fn yaw(&self) -> f32 {
        self.imu.yaw.at(self.refreshed_us)
    }

    /// Compensated (roll, pitch) at the refresh time.
    pub fn attitude(&self) -> (f32, f32) {
        (
            self.imu.roll.at(self.refreshed_us),
            self.imu.pitch.at(self.refreshed_us),
        )
    }

    /// Oldest sample timestamp in the batch.
    pub fn oldest_sample_us(&self) -> u64 {
        let module_samples = self.modules.iter().flat_map(|m| {
            [
                m.drive.position.timestamp_us,
                m.steer.position.timestamp_us,
            ]
        });
        let imu_samples = [
            self.imu.yaw.position.timestamp_us,
            self.imu.roll.position.timestamp_us,
            self.imu.pitch.position.timestamp_us,
        ];
        module_samples
            .chain(imu_samples)
            .min()
            .unwrap_or(self.refreshed_us)
    }
}

/// Producer of synchronized signal batches.
pub trait SignalSource: Send {
    /// Block for at most `timeout` waiting for the next batch.
    ///
    /// Returns `None` when nothing arrived in time or the producer is gone.
    fn wait_for_batch(&mut self, timeout: Duration) -> Option<SignalBatch>;
}

/// [`SignalSource`] fed over a crossbeam channel.
///
/// When several batches queue up between cycles only the newest is used.
/// Module positions are cumulative, so skipping intermediate batches loses
/// no travel.
pub struct ChannelSignalSource {
    rx: Receiver<SignalBatch>,
    skipped: u64,
}

impl ChannelSignalSource {
    pub fn new(rx: Receiver<SignalBatch>) -> Self {
        Self { rx, skipped: 0 }
    }

    /// Number of batches dropped in favour of a newer one.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl SignalSource for ChannelSignalSource {
    fn wait_for_batch(&mut self, timeout: Duration) -> Option<SignalBatch> {
        let mut batch = match self.rx.recv_timeout(timeout) {
            Ok(batch) => batch,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => {
                log::trace!("Signal channel disconnected");
                return None;
            }
        };
        while let Ok(newer) = self.rx.try_recv() {
            batch = newer;
            self.skipped += 1;
        }
        Some(batch)
    }
}

/// Build a batch where every signal was sampled at `timestamp_us`.
pub fn batch_at(
    modules: [(f32, f32, f32); MODULE_COUNT],
    yaw: f32,
    yaw_rate: f32,
    timestamp_us: u64,
) -> SignalBatch {
    SignalBatch {
        modules: modules.map(|(distance, speed, angle)| ModuleSignals {
            drive: CompensatedSignal::with_rate(distance, speed, timestamp_us),
            steer: CompensatedSignal::position_only(angle, timestamp_us),
        }),
        imu: ImuSignals {
            yaw: CompensatedSignal {
                position: SignalSample::new(yaw, timestamp_us),
                velocity: Some(SignalSample::new(yaw_rate, timestamp_us)),
            },
            ..ImuSignals::level(yaw, timestamp_us)
        },
        refreshed_us: timestamp_us,
    }
}
