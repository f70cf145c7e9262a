//! Swerve drive kinematics.
//!
//! Module order everywhere in the crate is front-left, front-right,
//! back-left, back-right. Module locations are in the robot frame with
//! +X forward and +Y left.

use crate::core::types::{
    ChassisSpeeds, MODULE_COUNT, ModulePosition, ModuleState, Point2D, Twist2D,
};
use crate::error::{Error, Result};

/// Speeds below this are treated as "not moving" when choosing steer angles.
const STOPPED_SPEED: f32 = 1e-6;

/// Inverse and forward kinematics for a four-module swerve chassis.
#[derive(Debug, Clone)]
pub struct SwerveKinematics {
    locations: [Point2D; MODULE_COUNT],
    /// Inverse of the 3x3 normal matrix AᵀA used by the forward solve.
    normal_inv: [[f32; 3]; 3],
}

impl SwerveKinematics {
    /// Rectangular chassis with the given wheelbase (front-back) and track width.
    pub fn rectangular(wheelbase: f32, track_width: f32) -> Result<Self> {
        let hx = wheelbase / 2.0;
        let hy = track_width / 2.0;
        Self::new([
            Point2D::new(hx, hy),
            Point2D::new(hx, -hy),
            Point2D::new(-hx, hy),
            Point2D::new(-hx, -hy),
        ])
    }

    /// Arbitrary module placement.
    ///
    /// Fails if every module sits at the same point, which leaves rotation
    /// unobservable.
    pub fn new(locations: [Point2D; MODULE_COUNT]) -> Result<Self> {
        let n = MODULE_COUNT as f32;
        let sum_x: f32 = locations.iter().map(|p| p.x).sum();
        let sum_y: f32 = locations.iter().map(|p| p.y).sum();
        let sum_r2: f32 = locations.iter().map(|p| p.x * p.x + p.y * p.y).sum();

        // AᵀA for the stacked rows [1 0 -y] and [0 1 x]
        let m = [
            [n, 0.0, -sum_y],
            [0.0, n, sum_x],
            [-sum_y, sum_x, sum_r2],
        ];
        let normal_inv = invert_3x3(&m).ok_or_else(|| {
            Error::Config("swerve module locations must not be coincident".into())
        })?;

        Ok(Self {
            locations,
            normal_inv,
        })
    }

    /// Module locations in the robot frame.
    pub fn locations(&self) -> &[Point2D; MODULE_COUNT] {
        &self.locations
    }

    /// Robot-relative chassis speeds to per-module states.
    ///
    /// A module with no commanded motion reports angle 0; callers that want
    /// to hold the previous steer angle do so themselves.
    pub fn to_module_states(&self, speeds: &ChassisSpeeds) -> [ModuleState; MODULE_COUNT] {
        self.locations.map(|loc| {
            let vx = speeds.vx - speeds.omega * loc.y;
            let vy = speeds.vy + speeds.omega * loc.x;
            let speed = vx.hypot(vy);
            if speed < STOPPED_SPEED {
                ModuleState::new(0.0, 0.0)
            } else {
                ModuleState::new(speed, vy.atan2(vx))
            }
        })
    }

    /// Least-squares chassis speeds from measured module states.
    pub fn to_chassis_speeds(&self, states: &[ModuleState; MODULE_COUNT]) -> ChassisSpeeds {
        let components = states.map(|s| (s.speed * s.angle.cos(), s.speed * s.angle.sin()));
        let [vx, vy, omega] = self.solve(&components);
        ChassisSpeeds::new(vx, vy, omega)
    }

    /// Least-squares robot-frame twist from per-module travel since the
    /// previous sample.
    ///
    /// `start` and `end` are cumulative module positions; the end angle is
    /// taken as the direction of travel over the interval.
    pub fn to_twist(
        &self,
        start: &[ModulePosition; MODULE_COUNT],
        end: &[ModulePosition; MODULE_COUNT],
    ) -> Twist2D {
        let mut components = [(0.0, 0.0); MODULE_COUNT];
        for (i, c) in components.iter_mut().enumerate() {
            let d = end[i].distance - start[i].distance;
            *c = (d * end[i].angle.cos(), d * end[i].angle.sin());
        }
        let [dx, dy, dtheta] = self.solve(&components);
        Twist2D::new(dx, dy, dtheta)
    }

    /// Solve AᵀA·u = Aᵀb for u = [x, y, θ] given per-module (x, y) components.
    fn solve(&self, components: &[(f32, f32); MODULE_COUNT]) -> [f32; 3] {
        let mut rhs = [0.0f32; 3];
        for (loc, &(cx, cy)) in self.locations.iter().zip(components.iter()) {
            rhs[0] += cx;
            rhs[1] += cy;
            rhs[2] += -loc.y * cx + loc.x * cy;
        }
        let m = &self.normal_inv;
        [
            m[0][0] * rhs[0] + m[0][1] * rhs[1] + m[0][2] * rhs[2],
            m[1][0] * rhs[0] + m[1][1] * rhs[1] + m[1][2] * rhs[2],
            m[2][0] * rhs[0] + m[2][1] * rhs[1] + m[2][2] * rhs[2],
        ]
    }
}

/// Scale all module speeds down uniformly so none exceeds `max_speed`.
///
/// Steer angles are untouched, so the chassis velocity keeps its direction.
pub fn desaturate(states: &mut [ModuleState; MODULE_COUNT], max_speed: f32) {
    let fastest = states.iter().map(|s| s.speed.abs()).fold(0.0f32, f32::max);
    if fastest > max_speed && fastest > 0.0 {
        let scale = max_speed / fastest;
        for s in states.iter_mut() {
            s.speed *= scale;
        }
    }
}

fn invert_3x3(m: &[[f32; 3]; 3]) -> Option<[[f32; 3]; 3]> {
    let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
    if det.abs() < 1e-6 {
        return None;
    }
    let inv_det = 1.0 / det;
    Some([
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ])
}
