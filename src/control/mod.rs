//! Motion control.
//!
//! - [`pursuit`]: waypoint pursuit, path following, module commands

pub mod pursuit;

pub use pursuit::{
    FollowState, LookupMode, PathFollower, PursuitConfig, PursuitController, PursuitOutput,
};
