//! Collision results and move negotiation
//!
//! A `CollisionHit` describes contact from one body's point of view. When two
//! bodies meet, each answers with a `HitResponse` and `HitResponse::combine`
//! turns the pair of answers into what actually happens to each side.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::{Axis, Rect, min_penetration};

/// Which sides of a body were struck
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CollisionHit {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
    /// Blocked from two opposing sides in the same tick
    pub crush: bool,
    /// Surface normal pointing toward the struck body; the hypotenuse normal on slopes
    pub normal: Vec2,
}

impl CollisionHit {
    /// Hit from moving along `axis` in the direction of `sign` into a flat surface
    pub fn axis(axis: Axis, sign: f32) -> Self {
        let mut hit = Self::default();
        match (axis, sign > 0.0) {
            (Axis::X, true) => {
                hit.right = true;
                hit.normal = Vec2::NEG_X;
            }
            (Axis::X, false) => {
                hit.left = true;
                hit.normal = Vec2::X;
            }
            (Axis::Y, true) => {
                hit.bottom = true;
                hit.normal = Vec2::NEG_Y;
            }
            (Axis::Y, false) => {
                hit.top = true;
                hit.normal = Vec2::Y;
            }
        }
        hit
    }

    /// Same contact, but carrying a slope's surface normal
    pub fn with_normal(mut self, normal: Vec2) -> Self {
        self.normal = normal;
        self
    }

    /// Squeezed along `axis`: both opposing sides plus the crush flag
    pub fn crushed(axis: Axis) -> Self {
        let mut hit = Self {
            crush: true,
            ..Default::default()
        };
        match axis {
            Axis::X => {
                hit.left = true;
                hit.right = true;
            }
            Axis::Y => {
                hit.top = true;
                hit.bottom = true;
            }
        }
        hit
    }

    /// Contact as seen by `a` when its box overlaps `b`, split on the shallowest axis
    pub fn between(a: &Rect, b: &Rect) -> Self {
        let (axis, push) = min_penetration(a, b);
        // `push` is how `a` would move to get out, so it was moving the other way
        Self::axis(axis, -push)
    }

    /// Same contact from the other body's point of view
    pub fn mirrored(&self) -> Self {
        Self {
            left: self.right,
            right: self.left,
            top: self.bottom,
            bottom: self.top,
            crush: self.crush,
            normal: -self.normal,
        }
    }

    /// Axis the contact happened on
    pub fn hit_axis(&self) -> Axis {
        if self.left || self.right { Axis::X } else { Axis::Y }
    }
}

/// Answer a body gives when it runs into another body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitResponse {
    /// Cancel the offending component of movement
    Block,
    /// Keep moving regardless of the other party
    Force,
    /// No opinion; let other contacts decide
    #[default]
    Continue,
    /// Veto this body's whole move for the tick
    Abort,
}

impl HitResponse {
    /// Effective outcome for the body that answered `self` when the other answered `theirs`
    ///
    /// A body can always make itself pass-through (`Force`) or stay put
    /// (`Abort`), but it never gets through a peer that does not agree: the
    /// other side's `Block` or `Force` both make this side yield.
    pub fn combine(self, theirs: HitResponse) -> HitResponse {
        match (self, theirs) {
            (HitResponse::Abort, _) => HitResponse::Abort,
            (HitResponse::Force, _) => HitResponse::Force,
            (HitResponse::Block, _) | (_, HitResponse::Block) | (_, HitResponse::Force) => {
                HitResponse::Block
            }
            _ => HitResponse::Continue,
        }
    }
}
