//! Trapezoidal velocity profile over path distance.
//!
//! Accelerate at `A` from rest, cruise at `Vmax`, then decelerate at `2A`
//! to rest at the end. Short paths never reach cruise and peak where the
//! two ramps meet. Speed as a function of distance travelled `d` is
//!
//! ```text
//! v(d) = min(Vmax, sqrt(2·A·d), sqrt(2·2A·(D − d)))
//! ```

/// Which part of the profile a progress value falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilePhase {
    Accelerating,
    Cruising,
    Decelerating,
    Finished,
}

/// Speed-versus-distance profile for one path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidProfile {
    distance: f32,
    max_velocity: f32,
    acceleration: f32,
}

impl TrapezoidProfile {
    /// Deceleration is twice the acceleration.
    pub const DECEL_FACTOR: f32 = 2.0;

    pub fn new(distance: f32, max_velocity: f32, acceleration: f32) -> Self {
        Self {
            distance: distance.max(0.0),
            max_velocity,
            acceleration,
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    fn deceleration(&self) -> f32 {
        self.acceleration * Self::DECEL_FACTOR
    }

    /// Distance needed to reach cruise speed from rest.
    pub fn accel_distance(&self) -> f32 {
        let full = self.max_velocity * self.max_velocity / (2.0 * self.acceleration);
        full.min(self.distance * self.deceleration() / (self.acceleration + self.deceleration()))
    }

    /// Distance needed to stop from cruise speed.
    pub fn decel_distance(&self) -> f32 {
        let full = self.max_velocity * self.max_velocity / (2.0 * self.deceleration());
        full.min(self.distance * self.acceleration / (self.acceleration + self.deceleration()))
    }

    /// Distance spent at cruise speed; zero for short paths.
    pub fn cruise_distance(&self) -> f32 {
        (self.distance - self.accel_distance() - self.decel_distance()).max(0.0)
    }

    /// Highest speed the profile reaches.
    pub fn peak_velocity(&self) -> f32 {
        (2.0 * self.acceleration * self.accel_distance())
            .sqrt()
            .min(self.max_velocity)
    }

    /// Target speed at fractional progress `p` in [0, 1].
    ///
    /// Zero outside that range and for zero-length profiles.
    pub fn speed_at(&self, p: f32) -> f32 {
        if !(0.0..=1.0).contains(&p) || self.distance <= 0.0 {
            return 0.0;
        }
        self.speed_at_distance(p * self.distance)
    }

    /// Target speed after travelling `d` meters.
    pub fn speed_at_distance(&self, d: f32) -> f32 {
        if d < 0.0 || d > self.distance || self.distance <= 0.0 {
            return 0.0;
        }
        let accel = (2.0 * self.acceleration * d).sqrt();
        let decel = (2.0 * self.deceleration() * (self.distance - d)).sqrt();
        self.max_velocity.min(accel).min(decel)
    }

    pub fn phase_at(&self, p: f32) -> ProfilePhase {
        if !(0.0..1.0).contains(&p) {
            return ProfilePhase::Finished;
        }
        let d = p * self.distance;
        if d < self.accel_distance() {
            ProfilePhase::Accelerating
        } else if d <= self.distance - self.decel_distance() {
            ProfilePhase::Cruising
        } else {
            ProfilePhase::Decelerating
        }
    }
}
