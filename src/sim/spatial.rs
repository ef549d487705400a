//! Spatial index
//!
//! The world is already partitioned by the tile grid, so tile lookups map a
//! region straight to cells. Entities are few enough for a linear scan, which
//! also keeps the visit order equal to registration order.

use glam::Vec2;

use super::entity::{Body, CollisionGroup, EntityId};
use super::geom::Rect;
use super::grid::TileGrid;
use super::slope::Slope;
use super::tile::{Tile, TileAttributes};
use crate::consts::REST_EPSILON;
use crate::error::ResolveError;

/// Solid shape of a tile candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileShape {
    /// Full cell
    Block,
    /// Full cell, solid from above only
    OneWay,
    Slope(Slope),
}

/// Solid-layer tile found by a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileCandidate {
    pub cell: (i32, i32),
    pub rect: Rect,
    pub tile: Tile,
    pub shape: TileShape,
}

/// Result of a broad-phase query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidates {
    /// Row-major
    pub tiles: Vec<TileCandidate>,
    /// Indices into the body list, registration order
    pub entities: Vec<usize>,
}

/// What a line query ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTarget {
    Tile { x: i32, y: i32 },
    Entity(EntityId),
}

/// First intersection along a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHit {
    pub point: Vec2,
    /// Fraction of the segment travelled, in [0, 1]
    pub t: f32,
    pub target: LineTarget,
}

/// Read-only queries over the grid and the entity registry
#[derive(Clone, Copy)]
pub struct SpatialIndex<'a> {
    grid: &'a TileGrid,
    bodies: &'a [Body],
}

impl<'a> SpatialIndex<'a> {
    pub fn new(grid: &'a TileGrid, bodies: &'a [Body]) -> Self {
        Self { grid, bodies }
    }

    pub fn grid(&self) -> &'a TileGrid {
        self.grid
    }

    pub fn bodies(&self) -> &'a [Body] {
        self.bodies
    }

    /// Solid tiles and active entities whose proposed boxes overlap `region`
    pub fn query(&self, region: &Rect) -> Result<Candidates, ResolveError> {
        Ok(Candidates {
            tiles: self.solid_tiles(region)?,
            entities: self.entities_in(region, |b| b.group.is_active()),
        })
    }

    /// Solid tiles in the cells a region touches, row-major
    pub fn solid_tiles(&self, region: &Rect) -> Result<Vec<TileCandidate>, ResolveError> {
        let mut tiles = Vec::new();
        for (x, y) in self.grid.cells_overlapping(region).iter() {
            let tile = self.grid.tile(x, y);
            if !tile.is_solid() {
                continue;
            }
            let shape = match self.grid.slope_at(x, y) {
                Some(slope) => TileShape::Slope(slope?),
                None if tile.is_unisolid() => TileShape::OneWay,
                None => TileShape::Block,
            };
            tiles.push(TileCandidate {
                cell: (x, y),
                rect: self.grid.cell_rect(x, y),
                tile,
                shape,
            });
        }
        Ok(tiles)
    }

    /// Indices of bodies whose proposed box overlaps `region` and passes `filter`
    pub fn entities_in(&self, region: &Rect, filter: impl Fn(&Body) -> bool) -> Vec<usize> {
        self.bodies
            .iter()
            .enumerate()
            .filter(|(_, b)| filter(b) && b.dest.overlaps(region))
            .map(|(i, _)| i)
            .collect()
    }

    /// No solid tile overlaps `rect`
    pub fn is_free_of_tiles(&self, rect: &Rect, ignore_unisolid: bool) -> bool {
        for (x, y) in self.grid.cells_overlapping(rect).iter() {
            let tile = self.grid.tile(x, y);
            if !tile.is_solid() || (ignore_unisolid && tile.is_unisolid()) {
                continue;
            }
            let blocked = match self.grid.slope_at(x, y) {
                Some(Ok(slope)) => slope.overlaps_rect(rect, 0.0),
                // Broken slope geometry counts as a full block
                Some(Err(_)) => true,
                None => self.grid.cell_rect(x, y).overlaps(rect),
            };
            if blocked {
                return false;
            }
        }
        true
    }

    /// Free of tiles and of Static/MovingStatic entities
    pub fn is_free_of_statics(
        &self,
        rect: &Rect,
        ignore: Option<EntityId>,
        ignore_unisolid: bool,
    ) -> bool {
        self.is_free_of_tiles(rect, ignore_unisolid)
            && !self.any_entity(rect, ignore, |g| g.is_obstacle())
    }

    /// Free of tiles and of every entity that can block a mover
    pub fn is_free_of_movingstatics(&self, rect: &Rect, ignore: Option<EntityId>) -> bool {
        self.is_free_of_tiles(rect, false)
            && !self.any_entity(rect, ignore, |g| {
                g.is_obstacle() || g == CollisionGroup::Moving
            })
    }

    fn any_entity(
        &self,
        rect: &Rect,
        ignore: Option<EntityId>,
        groups: impl Fn(CollisionGroup) -> bool,
    ) -> bool {
        self.bodies
            .iter()
            .any(|b| Some(b.id) != ignore && groups(b.group) && b.bbox.overlaps(rect))
    }

    /// Nearest solid tile or blocking entity along `start -> end`
    ///
    /// One-way tiles never stop a line.
    pub fn first_line_intersection(
        &self,
        start: Vec2,
        end: Vec2,
        ignore_entities: bool,
        ignore: Option<EntityId>,
    ) -> Option<LineHit> {
        let mut best: Option<(f32, LineTarget)> = None;
        let mut consider = |t: f32, target: LineTarget| {
            if best.is_none_or(|(bt, _)| t < bt) {
                best = Some((t, target));
            }
        };

        let region = Rect::new(start.min(end), start.max(end)).grown(Vec2::splat(REST_EPSILON));
        for (x, y) in self.grid.cells_overlapping(&region).iter() {
            let tile = self.grid.tile(x, y);
            if !tile.is_solid() || tile.is_unisolid() {
                continue;
            }
            let t = match self.grid.slope_at(x, y) {
                Some(Ok(slope)) => slope.segment_entry(start, end),
                _ => self.grid.cell_rect(x, y).segment_entry(start, end),
            };
            if let Some(t) = t {
                consider(t, LineTarget::Tile { x, y });
            }
        }

        if !ignore_entities {
            for body in self.bodies {
                if Some(body.id) == ignore
                    || !(body.group.is_obstacle() || body.group == CollisionGroup::Moving)
                {
                    continue;
                }
                if let Some(t) = body.bbox.segment_entry(start, end) {
                    consider(t, LineTarget::Entity(body.id));
                }
            }
        }

        best.map(|(t, target)| LineHit {
            point: start + (end - start) * t,
            t,
            target,
        })
    }

    /// Nothing solid between two points
    pub fn free_line_of_sight(&self, start: Vec2, end: Vec2, ignore: Option<EntityId>) -> bool {
        self.first_line_intersection(start, end, false, ignore)
            .is_none()
    }

    /// Active entities whose box lies within `max_distance` of `center`
    pub fn nearby_entities(&self, center: Vec2, max_distance: f32) -> Vec<EntityId> {
        self.bodies
            .iter()
            .filter(|b| b.group.is_active() && b.bbox.distance_to_point(center) <= max_distance)
            .map(|b| b.id)
            .collect()
    }

    /// Attributes of the solid-layer tile under a point
    pub fn tile_attributes_at(&self, p: Vec2) -> TileAttributes {
        let (x, y) = self.grid.cell_at(p);
        self.grid.tile(x, y).attributes
    }

    /// Union of tile attributes a box overlaps, for advisory events
    ///
    /// Slopes only count when the box reaches their solid part. Ice is also
    /// picked up from the row right under the box so standing on it counts.
    pub fn touched_attributes(&self, rect: &Rect) -> TileAttributes {
        let mut result = TileAttributes::empty();
        let inside = self.grid.cells_overlapping(rect);
        let feet = self
            .grid
            .cells_overlapping(&Rect::new(rect.min, rect.max + Vec2::new(0.0, REST_EPSILON)));

        for (x, y) in feet.iter() {
            let tile = self.grid.tile(x, y);
            if tile.is_empty() {
                continue;
            }
            let touched = match self.grid.slope_at(x, y) {
                Some(Ok(slope)) => {
                    slope.overlaps_rect(&rect.translated(Vec2::new(0.0, REST_EPSILON)), 0.0)
                }
                _ => true,
            };
            if !touched {
                continue;
            }
            if y < inside.y1 {
                result |= tile.attributes;
            } else {
                result |= tile.attributes & TileAttributes::UNDERFOOT;
            }
        }
        result
    }
}
