//! Sensor processing layer.
//!
//! - [`signal`]: latency compensation of raw readings
//! - [`batch`]: synchronized signal batches and their sources
//! - [`odometry`]: swerve wheel odometry

pub mod batch;
pub mod odometry;
pub mod signal;

pub use batch::{
    ChannelSignalSource, ImuSignals, ModuleSignals, SignalBatch, SignalSource, batch_at,
};
pub use odometry::SwerveOdometry;
pub use signal::{CompensatedSignal, SignalSample, compensate};
