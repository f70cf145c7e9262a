//! Latency-compensated signal reads.
//!
//! Every raw reading from a motor controller or IMU carries the time it was
//! sampled. By the time the control loop consumes it the mechanism has kept
//! moving, so the reading is extrapolated forward using its rate signal.

use crate::core::math::elapsed_secs;
use crate::core::types::Timestamped;

/// A single raw reading and the time it was sampled.
pub type SignalSample = Timestamped<f32>;

/// Extrapolate a position reading to `now_us`.
///
/// Returns `position + velocity × (now − sample_time)`, where the elapsed
/// time is measured from the position sample. Without a velocity signal the
/// raw position is returned unchanged. A sample stamped after `now_us` is
/// treated as current.
#[inline]
pub fn compensate(position: &SignalSample, velocity: Option<&SignalSample>, now_us: u64) -> f32 {
    match velocity {
        Some(rate) => position.data + rate.data * elapsed_secs(position.timestamp_us, now_us),
        None => position.data,
    }
}

/// A position signal with its optional rate signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompensatedSignal {
    pub position: SignalSample,
    pub velocity: Option<SignalSample>,
}

impl CompensatedSignal {
    /// Position-only signal.
    pub fn position_only(value: f32, timestamp_us: u64) -> Self {
        Self {
            position: SignalSample::new(value, timestamp_us),
            velocity: None,
        }
    }

    /// Position and rate sampled at the same instant.
    pub fn with_rate(value: f32, rate: f32, timestamp_us: u64) -> Self {
        Self {
            position: SignalSample::new(value, timestamp_us),
            velocity: Some(SignalSample::new(rate, timestamp_us)),
        }
    }

    /// Latency-compensated value at `now_us`.
    #[inline]
    pub fn at(&self, now_us: u64) -> f32 {
        compensate(&self.position, self.velocity.as_ref(), now_us)
    }
}
