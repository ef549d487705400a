//! Per-body kinematic state
//!
//! Semi-implicit Euler: velocity is advanced first, then the new velocity
//! produces the displacement for the tick. Only state owned by the body is
//! touched here; geometry is the resolvers' business.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Velocity, acceleration and gravity response of one body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Units per second
    pub velocity: Vec2,
    /// Units per second²
    pub acceleration: Vec2,
    pub gravity_enabled: bool,
    /// Scales the sector's gravity (0.5 in water, negative to float up)
    pub gravity_modifier: f32,
    /// Terminal fall speed, only applied when set
    #[serde(default)]
    pub max_fall_speed: Option<f32>,
    /// Per-axis speed cap, only applied when set
    #[serde(default)]
    pub max_speed: Option<Vec2>,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            gravity_enabled: true,
            gravity_modifier: 1.0,
            max_fall_speed: None,
            max_speed: None,
        }
    }
}

impl Kinematics {
    /// Kinematics that ignore gravity
    pub fn floating() -> Self {
        Self {
            gravity_enabled: false,
            ..Default::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn set_velocity_x(&mut self, vx: f32) {
        self.velocity.x = vx;
    }

    pub fn set_velocity_y(&mut self, vy: f32) {
        self.velocity.y = vy;
    }

    pub fn enable_gravity(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }

    /// Stop all motion
    pub fn reset(&mut self) {
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
    }

    /// Advance velocity by one step and return the displacement for it
    pub fn integrate(&mut self, gravity: f32, dt: f32) -> Vec2 {
        let mut accel = self.acceleration;
        if self.gravity_enabled {
            accel.y += gravity * self.gravity_modifier;
        }
        self.velocity += accel * dt;

        if let Some(cap) = self.max_speed {
            self.velocity = self.velocity.clamp(-cap, cap);
        }
        if let Some(max_fall) = self.max_fall_speed {
            self.velocity.y = self.velocity.y.min(max_fall);
        }

        self.velocity * dt
    }

    /// Clear any NaN or infinite component so the next tick starts clean
    pub fn sanitize(&mut self) {
        self.velocity = crate::sanitize_vec(self.velocity);
        self.acceleration = crate::sanitize_vec(self.acceleration);
        if !self.gravity_modifier.is_finite() {
            self.gravity_modifier = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrate_gravity() {
        let mut k = Kinematics::default();
        let d = k.integrate(1000.0, 0.1);
        // v = 100 after the step, displacement uses the new velocity
        assert!((k.velocity.y - 100.0).abs() < 0.001);
        assert!((d.y - 10.0).abs() < 0.001);
        assert!(d.x.abs() < 0.001);
    }

    #[test]
    fn test_gravity_modifier_and_disable() {
        let mut k = Kinematics {
            gravity_modifier: -0.5,
            ..Default::default()
        };
        k.integrate(1000.0, 0.1);
        assert!((k.velocity.y - -50.0).abs() < 0.001);

        let mut k = Kinematics::floating().with_velocity(Vec2::new(30.0, 0.0));
        let d = k.integrate(1000.0, 0.5);
        assert!((d.x - 15.0).abs() < 0.001);
        assert!(d.y.abs() < 0.001);
    }

    #[test]
    fn test_no_implicit_clamp() {
        let mut k = Kinematics::floating().with_velocity(Vec2::new(0.0, 1.0e6));
        let d = k.integrate(0.0, 1.0);
        assert!((d.y - 1.0e6).abs() < 1.0);
    }

    #[test]
    fn test_opt_in_clamps() {
        let mut k = Kinematics {
            max_fall_speed: Some(200.0),
            max_speed: Some(Vec2::new(50.0, 1000.0)),
            velocity: Vec2::new(80.0, 190.0),
            ..Default::default()
        };
        k.integrate(1000.0, 0.1);
        assert!((k.velocity.y - 200.0).abs() < 0.001);
        assert!((k.velocity.x - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_sanitize() {
        let mut k = Kinematics::default().with_velocity(Vec2::new(f32::NAN, 4.0));
        k.sanitize();
        assert_eq!(k.velocity, Vec2::new(0.0, 4.0));
    }
}
