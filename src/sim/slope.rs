//! Slope tiles
//!
//! A slope cell is solid on one side of a hypotenuse. The direction names the
//! corner the solid part sits in; the deformation picks the half of the cell
//! the hypotenuse spans, which is how gentle two-tile ramps are built.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use crate::consts::MIN_SLOPE_EXTENT;
use crate::error::{ConfigError, ResolveError};
use crate::lerp;

const DIRECTION_MASK: u8 = 0x03;
const DEFORM_MASK: u8 = 0x70;

/// Corner of the cell holding the solid part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlopeDirection {
    SouthWest,
    NorthEast,
    SouthEast,
    NorthWest,
}

/// Sub-area of the cell the hypotenuse runs across
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlopeDeform {
    Full,
    BottomHalf,
    TopHalf,
    LeftHalf,
    RightHalf,
}

/// Decoded slope-type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlopeType {
    pub direction: SlopeDirection,
    pub deform: SlopeDeform,
}

impl SlopeType {
    pub fn from_code(code: u8) -> Result<Self, ConfigError> {
        if code & !(DIRECTION_MASK | DEFORM_MASK) != 0 {
            return Err(ConfigError::UnknownSlopeCode(code));
        }
        let direction = match code & DIRECTION_MASK {
            0 => SlopeDirection::SouthWest,
            1 => SlopeDirection::NorthEast,
            2 => SlopeDirection::SouthEast,
            _ => SlopeDirection::NorthWest,
        };
        let deform = match code & DEFORM_MASK {
            0x00 => SlopeDeform::Full,
            0x10 => SlopeDeform::BottomHalf,
            0x20 => SlopeDeform::TopHalf,
            0x30 => SlopeDeform::LeftHalf,
            0x40 => SlopeDeform::RightHalf,
            _ => return Err(ConfigError::UnknownSlopeCode(code)),
        };
        Ok(Self { direction, deform })
    }

    pub fn code(&self) -> u8 {
        let direction = match self.direction {
            SlopeDirection::SouthWest => 0,
            SlopeDirection::NorthEast => 1,
            SlopeDirection::SouthEast => 2,
            SlopeDirection::NorthWest => 3,
        };
        let deform = match self.deform {
            SlopeDeform::Full => 0x00,
            SlopeDeform::BottomHalf => 0x10,
            SlopeDeform::TopHalf => 0x20,
            SlopeDeform::LeftHalf => 0x30,
            SlopeDeform::RightHalf => 0x40,
        };
        direction | deform
    }

    /// Solid part below the hypotenuse (walkable)
    pub fn is_floor(&self) -> bool {
        matches!(
            self.direction,
            SlopeDirection::SouthWest | SlopeDirection::SouthEast
        )
    }

    /// Surface falls as x grows
    fn descends_right(&self) -> bool {
        matches!(
            self.direction,
            SlopeDirection::SouthWest | SlopeDirection::NorthEast
        )
    }

    fn area(&self, cell: &Rect) -> Rect {
        let mid = cell.center();
        match self.deform {
            SlopeDeform::Full => *cell,
            SlopeDeform::BottomHalf => Rect::new(Vec2::new(cell.left(), mid.y), cell.max),
            SlopeDeform::TopHalf => Rect::new(cell.min, Vec2::new(cell.right(), mid.y)),
            SlopeDeform::LeftHalf => Rect::new(cell.min, Vec2::new(mid.x, cell.bottom())),
            SlopeDeform::RightHalf => Rect::new(Vec2::new(mid.x, cell.top()), cell.max),
        }
    }
}

/// A slope tile placed in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slope {
    pub kind: SlopeType,
    /// Grid cell coordinates
    pub cell_index: (i32, i32),
    /// Full cell bounds
    pub cell: Rect,
    /// Area the hypotenuse spans
    pub area: Rect,
    /// Hypotenuse end at the area's left edge
    pub start: Vec2,
    /// Hypotenuse end at the area's right edge
    pub end: Vec2,
}

impl Slope {
    pub fn new(kind: SlopeType, cell_index: (i32, i32), cell: Rect) -> Result<Self, ResolveError> {
        let area = kind.area(&cell);
        if !(area.width() > MIN_SLOPE_EXTENT && area.height() > MIN_SLOPE_EXTENT) {
            return Err(ResolveError::DegenerateSlope {
                x: cell_index.0,
                y: cell_index.1,
            });
        }
        let (start, end) = if kind.descends_right() {
            (area.min, area.max)
        } else {
            (
                Vec2::new(area.left(), area.bottom()),
                Vec2::new(area.right(), area.top()),
            )
        };
        Ok(Self {
            kind,
            cell_index,
            cell,
            area,
            start,
            end,
        })
    }

    pub fn is_floor(&self) -> bool {
        self.kind.is_floor()
    }

    /// Horizontal direction (-1 or 1) in which a floor slope rises
    pub fn uphill(&self) -> f32 {
        if self.kind.descends_right() { -1.0 } else { 1.0 }
    }

    /// Hypotenuse height at `x`, clamped to the area
    pub fn surface_y(&self, x: f32) -> f32 {
        let t = ((x - self.start.x) / (self.end.x - self.start.x)).clamp(0.0, 1.0);
        lerp(self.start.y, self.end.y, t)
    }

    /// Hypotenuse x at height `y`, clamped to the area
    pub fn surface_x(&self, y: f32) -> f32 {
        let t = ((y - self.start.y) / (self.end.y - self.start.y)).clamp(0.0, 1.0);
        lerp(self.start.x, self.end.x, t)
    }

    /// Unit normal of the hypotenuse, pointing out of the solid part
    pub fn normal(&self) -> Vec2 {
        let w = self.area.width();
        let h = self.area.height();
        let n = match self.kind.direction {
            SlopeDirection::SouthWest => Vec2::new(h, -w),
            SlopeDirection::SouthEast => Vec2::new(-h, -w),
            SlopeDirection::NorthEast => Vec2::new(-h, w),
            SlopeDirection::NorthWest => Vec2::new(h, w),
        };
        n.normalize_or_zero()
    }

    /// Highest floor point under the horizontal range `[left, right]`
    pub fn floor_under(&self, left: f32, right: f32) -> f32 {
        self.surface_y(left).min(self.surface_y(right))
    }

    /// Lowest ceiling point over the horizontal range `[left, right]`
    pub fn ceiling_over(&self, left: f32, right: f32) -> f32 {
        self.surface_y(left).max(self.surface_y(right))
    }

    /// Whether a box reaches into the solid part by more than `tolerance`
    pub fn overlaps_rect(&self, rect: &Rect, tolerance: f32) -> bool {
        let left = rect.left().max(self.cell.left());
        let right = rect.right().min(self.cell.right());
        let top = rect.top().max(self.cell.top());
        let bottom = rect.bottom().min(self.cell.bottom());
        if right - left <= tolerance || bottom - top <= tolerance {
            return false;
        }
        if self.is_floor() {
            bottom - self.floor_under(left, right) > tolerance
        } else {
            self.ceiling_over(left, right) - top > tolerance
        }
    }

    /// Horizontal extent of the solid part on the row `y`
    ///
    /// Empty (`left >= right`) when the row misses the solid part.
    pub fn solid_span_at(&self, y: f32) -> (f32, f32) {
        let (empty, full) = if self.is_floor() {
            (y < self.area.top(), y >= self.area.bottom())
        } else {
            (y > self.area.bottom(), y <= self.area.top())
        };
        if empty {
            return (self.cell.left(), self.cell.left());
        }
        if full {
            return (self.cell.left(), self.cell.right());
        }
        let x = self.surface_x(y);
        if self.is_floor() == self.kind.descends_right() {
            (self.cell.left(), x)
        } else {
            (x, self.cell.right())
        }
    }

    /// Signed distance of `p` into the half-plane behind the hypotenuse
    fn depth(&self, p: Vec2) -> f32 {
        -self.normal().dot(p - self.start)
    }

    /// First point where the segment enters the solid part, as a parameter in [0, 1]
    ///
    /// The solid part is the cell clipped by the hypotenuse's half-plane, so
    /// clipping the segment to the cell first leaves a single linear test.
    pub fn segment_entry(&self, start: Vec2, end: Vec2) -> Option<f32> {
        let enter = self.cell.segment_entry(start, end)?;
        let exit = self
            .cell
            .segment_entry(end, start)
            .map(|t| 1.0 - t)
            .unwrap_or(1.0);
        let delta = end - start;
        let d0 = self.depth(start + delta * enter);
        let d1 = self.depth(start + delta * exit);
        if d0 >= 0.0 {
            return Some(enter);
        }
        if d1 < 0.0 {
            return None;
        }
        let t = d0 / (d0 - d1);
        Some(enter + (exit - enter) * t)
    }
}
