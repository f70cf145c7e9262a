//! Timestamp wrapper.

use serde::{Deserialize, Serialize};

/// A value tagged with the time it was acquired.
///
/// Timestamps are microseconds on the control loop's monotonic time base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timestamped<T> {
    /// The wrapped data
    pub data: T,
    /// Acquisition time in microseconds
    pub timestamp_us: u64,
}

impl<T> Timestamped<T> {
    /// Wrap a value with its timestamp.
    #[inline]
    pub fn new(data: T, timestamp_us: u64) -> Self {
        Self { data, timestamp_us }
    }

    /// Transform the payload, keeping the timestamp.
    #[inline]
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Timestamped<U> {
        Timestamped {
            data: f(self.data),
            timestamp_us: self.timestamp_us,
        }
    }
}
