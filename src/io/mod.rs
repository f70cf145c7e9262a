//! Drivetrain I/O.
//!
//! - [`mock`]: simulated swerve drivetrain publishing signal batches

pub mod mock;

pub use mock::MockDrivetrain;
