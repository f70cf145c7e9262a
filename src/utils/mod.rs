//! Process utilities.
//!
//! - Monotonic microsecond clock shared by all components
//! - Signal handling (Ctrl-C)

mod clock;
mod signal;

pub use clock::MonotonicClock;
pub use signal::setup_ctrl_c_handler;
