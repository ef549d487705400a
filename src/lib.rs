//! Tilephys - movement and collision core for 2D tile platformers
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, spatial queries, static and dynamic resolution)
//! - `settings`: Data-driven physics configuration
//! - `error`: Configuration and numerical error types

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, ResolveError};
pub use settings::PhysicsSettings;

use glam::Vec2;

/// Physics configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, the classic platformer rate)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default edge length of a grid cell
    pub const TILE_SIZE: f32 = 32.0;
    /// Default downward acceleration (units/s²)
    pub const GRAVITY: f32 = 1000.0;

    /// Tolerance when comparing edges, absorbs float jitter at rest
    pub const REST_EPSILON: f32 = 1.0;
    /// Area difference under which two MovingStatic bodies still block each other
    pub const MOVING_STATIC_FORGIVENESS: f32 = 256.0;
    /// Smallest slope area edge that still defines a usable hypotenuse
    pub const MIN_SLOPE_EXTENT: f32 = 1.0e-3;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// True when every component of the vector is finite
#[inline]
pub fn is_finite_vec(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Zero out non-finite components, keeping the finite ones
#[inline]
pub fn sanitize_vec(v: Vec2) -> Vec2 {
    Vec2::new(
        if v.x.is_finite() { v.x } else { 0.0 },
        if v.y.is_finite() { v.y } else { 0.0 },
    )
}
