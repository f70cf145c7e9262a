//! Runtime threads.
//!
//! - [`control_loop`]: fixed-period fusion and pursuit (`control` thread)
//! - [`path_worker`]: per-request path synthesis (`path-gen-<n>` threads)

pub mod control_loop;
pub mod path_worker;

pub use control_loop::{ControlLoop, ControlThread, DriveHandle, ModuleSink};
pub use path_worker::{PathRequester, PathSlot, PathTicket};
