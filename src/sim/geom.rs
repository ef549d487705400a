//! Axis-aligned rectangles and segment tests
//!
//! World coordinates grow to the right (+x) and downward (+y), so `min.y` is
//! the top edge and `max.y` the bottom edge.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Horizontal or vertical sweep axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn other(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Component of `v` along this axis
    #[inline]
    pub fn of(self, v: Vec2) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    /// Vector with `amount` on this axis and zero on the other
    #[inline]
    pub fn vec(self, amount: f32) -> Vec2 {
        match self {
            Axis::X => Vec2::new(amount, 0.0),
            Axis::Y => Vec2::new(0.0, amount),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box from its top-left corner and size
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.max.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.max.y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Lower and upper bound along an axis
    #[inline]
    pub fn span(&self, axis: Axis) -> (f32, f32) {
        (axis.of(self.min), axis.of(self.max))
    }

    /// Finite corners and strictly positive extent
    pub fn is_valid(&self) -> bool {
        self.min.x.is_finite()
            && self.min.y.is_finite()
            && self.max.x.is_finite()
            && self.max.y.is_finite()
            && self.width() > 0.0
            && self.height() > 0.0
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Grow each side by the given margin per axis
    pub fn grown(&self, margin: Vec2) -> Self {
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    pub fn union(&self, other: &Rect) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Region covered while moving by `movement`
    pub fn swept(&self, movement: Vec2) -> Self {
        self.union(&self.translated(movement))
    }

    /// Interiors intersect (touching edges do not count)
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Length of the shared interval along an axis (negative when apart)
    #[inline]
    pub fn overlap_along(&self, other: &Rect, axis: Axis) -> f32 {
        let (a0, a1) = self.span(axis);
        let (b0, b1) = other.span(axis);
        a1.min(b1) - a0.max(b0)
    }

    /// Euclidean distance from a point to the box (zero inside)
    pub fn distance_to_point(&self, p: Vec2) -> f32 {
        let clamped = p.clamp(self.min, self.max);
        (p - clamped).length()
    }

    /// Parameter in [0, 1] where the segment `start -> end` first enters the box
    ///
    /// Slab test; a segment that starts inside reports 0.
    pub fn segment_entry(&self, start: Vec2, end: Vec2) -> Option<f32> {
        let delta = end - start;
        let mut t_min = 0.0f32;
        let mut t_max = 1.0f32;

        for axis in [Axis::X, Axis::Y] {
            let d = axis.of(delta);
            let s = axis.of(start);
            let (lo, hi) = self.span(axis);
            if d.abs() < f32::EPSILON {
                if s < lo || s > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (lo - s) * inv;
            let mut t1 = (hi - s) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Axis along which two overlapping boxes are least deep, with the depth
///
/// The sign of the depth tells which way `a` has to move to get out of `b`.
pub fn min_penetration(a: &Rect, b: &Rect) -> (Axis, f32) {
    let push_up = b.top() - a.bottom();
    let push_down = b.bottom() - a.top();
    let push_left = b.left() - a.right();
    let push_right = b.right() - a.left();

    let vert = if -push_up < push_down { push_up } else { push_down };
    let horiz = if -push_left < push_right {
        push_left
    } else {
        push_right
    };

    if vert.abs() < horiz.abs() {
        (Axis::Y, vert)
    } else {
        (Axis::X, horiz)
    }
}
