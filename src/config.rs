//! Configuration loading for gati-nav.
//!
//! All values are static for the lifetime of the process; the file is read
//! once at startup.

use serde::Deserialize;
use std::path::Path;

use crate::control::LookupMode;
use crate::core::types::Point2D;
use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GatiConfig {
    #[serde(default)]
    pub drivetrain: DrivetrainConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub localization: LocalizationConfig,
    #[serde(default)]
    pub planning: PlanningConfig,
}

/// Swerve drivetrain geometry
#[derive(Clone, Debug, Deserialize)]
pub struct DrivetrainConfig {
    /// Front-to-back distance between module centers in meters (default: 0.57)
    #[serde(default = "default_wheelbase")]
    pub wheelbase: f32,

    /// Left-to-right distance between module centers in meters (default: 0.57)
    #[serde(default = "default_track_width")]
    pub track_width: f32,

    /// Physical wheel speed limit in m/s (default: 4.5)
    #[serde(default = "default_max_wheel_speed")]
    pub max_wheel_speed: f32,
}

/// Motion limits and pursuit tuning
#[derive(Clone, Debug, Deserialize)]
pub struct MotionConfig {
    /// Maximum linear velocity in m/s (default: 4.0)
    #[serde(default = "default_max_linear_velocity")]
    pub max_linear_velocity: f32,

    /// Maximum linear acceleration in m/s² (default: 3.0)
    #[serde(default = "default_max_linear_acceleration")]
    pub max_linear_acceleration: f32,

    /// Maximum angular velocity in rad/s (default: 2π)
    #[serde(default = "default_max_angular_velocity")]
    pub max_angular_velocity: f32,

    /// Position error below which a target counts as reached (default: 0.03)
    #[serde(default = "default_position_tolerance")]
    pub position_tolerance: f32,

    /// Heading error below which a target counts as reached, degrees (default: 2.0)
    #[serde(default = "default_heading_tolerance_deg")]
    pub heading_tolerance_deg: f32,

    /// Control loop period in milliseconds (default: 20)
    #[serde(default = "default_control_period_ms")]
    pub control_period_ms: u64,

    /// How far ahead of the current progress to pick the target waypoint (default: 0.25)
    #[serde(default = "default_lookahead_distance")]
    pub lookahead_distance: f32,

    /// Floor on the waypoint speed fraction so the final approach never stalls (default: 0.1)
    #[serde(default = "default_min_speed_fraction")]
    pub min_speed_fraction: f32,

    /// Waypoint lookup strategy for path following
    #[serde(default)]
    pub lookup_mode: LookupMode,
}

/// Pose estimation settings
#[derive(Clone, Debug, Deserialize)]
pub struct LocalizationConfig {
    /// Bounded wait for a fresh signal batch in milliseconds (default: 100)
    #[serde(default = "default_signal_timeout_ms")]
    pub signal_timeout_ms: u64,

    /// Odometry history retained for delayed vision corrections in seconds (default: 1.5)
    #[serde(default = "default_history_window_s")]
    pub history_window_s: f32,

    /// Single-tag observations above this ambiguity are dropped (default: 0.2)
    #[serde(default = "default_ambiguity_threshold")]
    pub ambiguity_threshold: f32,

    /// Odometry standard deviations [x m, y m, heading rad]
    #[serde(default = "default_state_std_devs")]
    pub state_std_devs: [f32; 3],

    /// Vision standard deviations [x m, y m, heading rad]
    #[serde(default = "default_vision_std_devs")]
    pub vision_std_devs: [f32; 3],
}

/// Path synthesis settings
#[derive(Clone, Debug, Deserialize)]
pub struct PlanningConfig {
    /// Spacing of generated straight-segment waypoints in meters (default: 0.15)
    #[serde(default = "default_step_size")]
    pub step_size: f32,

    /// Path to the binary zone-to-zone segment asset
    #[serde(default = "default_segment_asset")]
    pub segment_asset: String,

    /// Static zone polygons
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
}

/// One zone polygon as listed in the config file
#[derive(Clone, Debug, Deserialize)]
pub struct ZoneConfig {
    pub id: u8,
    /// Vertices as [x, y] pairs in meters, in winding order
    pub vertices: Vec<[f32; 2]>,
}

impl ZoneConfig {
    /// Vertices as points.
    pub fn points(&self) -> Vec<Point2D> {
        self.vertices
            .iter()
            .map(|&[x, y]| Point2D::new(x, y))
            .collect()
    }
}

impl Default for DrivetrainConfig {
    fn default() -> Self {
        Self {
            wheelbase: default_wheelbase(),
            track_width: default_track_width(),
            max_wheel_speed: default_max_wheel_speed(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_linear_velocity: default_max_linear_velocity(),
            max_linear_acceleration: default_max_linear_acceleration(),
            max_angular_velocity: default_max_angular_velocity(),
            position_tolerance: default_position_tolerance(),
            heading_tolerance_deg: default_heading_tolerance_deg(),
            control_period_ms: default_control_period_ms(),
            lookahead_distance: default_lookahead_distance(),
            min_speed_fraction: default_min_speed_fraction(),
            lookup_mode: LookupMode::default(),
        }
    }
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            signal_timeout_ms: default_signal_timeout_ms(),
            history_window_s: default_history_window_s(),
            ambiguity_threshold: default_ambiguity_threshold(),
            state_std_devs: default_state_std_devs(),
            vision_std_devs: default_vision_std_devs(),
        }
    }
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            step_size: default_step_size(),
            segment_asset: default_segment_asset(),
            zones: Vec::new(),
        }
    }
}

// Default value functions
fn default_wheelbase() -> f32 {
    0.57
}
fn default_track_width() -> f32 {
    0.57
}
fn default_max_wheel_speed() -> f32 {
    4.5
}
fn default_max_linear_velocity() -> f32 {
    4.0
}
fn default_max_linear_acceleration() -> f32 {
    3.0
}
fn default_max_angular_velocity() -> f32 {
    std::f32::consts::TAU
}
fn default_position_tolerance() -> f32 {
    0.03
}
fn default_heading_tolerance_deg() -> f32 {
    2.0
}
fn default_control_period_ms() -> u64 {
    20
}
fn default_lookahead_distance() -> f32 {
    0.25
}
fn default_min_speed_fraction() -> f32 {
    0.1
}

// Localization defaults
fn default_signal_timeout_ms() -> u64 {
    100
}
fn default_history_window_s() -> f32 {
    1.5
}
fn default_ambiguity_threshold() -> f32 {
    0.2
}
fn default_state_std_devs() -> [f32; 3] {
    [0.1, 0.1, 0.1]
}
fn default_vision_std_devs() -> [f32; 3] {
    [0.9, 0.9, 0.9]
}

// Planning defaults
fn default_step_size() -> f32 {
    0.15
}
fn default_segment_asset() -> String {
    "deploy/segments.bin".to_string()
}

impl GatiConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GatiConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the control math cannot work with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("drivetrain.wheelbase", self.drivetrain.wheelbase),
            ("drivetrain.track_width", self.drivetrain.track_width),
            ("drivetrain.max_wheel_speed", self.drivetrain.max_wheel_speed),
            ("motion.max_linear_velocity", self.motion.max_linear_velocity),
            (
                "motion.max_linear_acceleration",
                self.motion.max_linear_acceleration,
            ),
            ("motion.max_angular_velocity", self.motion.max_angular_velocity),
            ("motion.position_tolerance", self.motion.position_tolerance),
            ("planning.step_size", self.planning.step_size),
            ("localization.history_window_s", self.localization.history_window_s),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(Error::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if self.motion.control_period_ms == 0 {
            return Err(Error::Config("motion.control_period_ms must be non-zero".into()));
        }
        if !(0.0..=1.0).contains(&self.motion.min_speed_fraction) {
            return Err(Error::Config(format!(
                "motion.min_speed_fraction must be within [0, 1], got {}",
                self.motion.min_speed_fraction
            )));
        }
        Ok(())
    }

    /// Heading tolerance in radians.
    pub fn heading_tolerance(&self) -> f32 {
        self.motion.heading_tolerance_deg.to_radians()
    }

    /// Control loop period in seconds.
    pub fn control_period_s(&self) -> f32 {
        self.motion.control_period_ms as f32 / 1000.0
    }
}
