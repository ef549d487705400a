//! Static geometry resolver
//!
//! Sweeps one mover's proposed displacement against solid tiles and against
//! Static/MovingStatic entities, horizontal axis first, then vertical. Each
//! axis stops at the earliest contact, so no speed can carry a box through a
//! one-tile wall. Floor slopes approached from the downhill side lift the mover
//! onto the hypotenuse instead of blocking it.
//!
//! Entity obstacles have a say in whether they block. The first time the
//! earliest contact on an axis is an entity whose answer is not known yet, the
//! resolver stops with `StaticStep::Negotiate`; the caller asks both
//! behaviours, records the verdict and runs the resolver again.

use glam::Vec2;

use super::collision::CollisionHit;
use super::entity::{Body, CollisionGroup, EntityId};
use super::geom::{Axis, Rect, min_penetration};
use super::slope::Slope;
use super::spatial::{SpatialIndex, TileShape};
use crate::consts::{MOVING_STATIC_FORGIVENESS, REST_EPSILON};
use crate::error::ResolveError;
use crate::is_finite_vec;

/// What stopped a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    Tile(i32, i32),
    /// Index into the body list
    Entity(usize),
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    /// Distance the mover can still travel along the axis (may dip to -epsilon)
    gap: f32,
    hit: CollisionHit,
    blocker: Blocker,
}

#[derive(Debug, Clone, Copy)]
enum Obstacle {
    Rect {
        rect: Rect,
        one_way: bool,
        blocker: Blocker,
    },
    Slope(Slope),
}

enum Stop {
    Negotiate(usize, CollisionHit),
    Degenerate(ResolveError),
}

impl From<ResolveError> for Stop {
    fn from(e: ResolveError) -> Self {
        Stop::Degenerate(e)
    }
}

/// Answers already collected from entity obstacles for one mover this tick
#[derive(Debug, Clone, Default)]
pub struct Verdicts {
    decided: Vec<(usize, bool)>,
}

impl Verdicts {
    /// Obstacle lets the mover through
    pub fn allow(&mut self, obstacle: usize) {
        self.decided.push((obstacle, true));
    }

    /// Obstacle blocks like scenery
    pub fn block(&mut self, obstacle: usize) {
        self.decided.push((obstacle, false));
    }

    pub fn is_known(&self, obstacle: usize) -> bool {
        self.decided.iter().any(|&(i, _)| i == obstacle)
    }

    pub fn is_passable(&self, obstacle: usize) -> bool {
        self.decided.iter().any(|&(i, pass)| i == obstacle && pass)
    }
}

/// Resolved move for one mover
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticOutcome {
    /// Corrected destination box
    pub dest: Rect,
    pub hit_x: Option<CollisionHit>,
    pub hit_y: Option<CollisionHit>,
    /// Entity the mover stands on, if it was carried along
    pub carried_by: Option<EntityId>,
}

/// Result of one resolver pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StaticStep {
    Done(StaticOutcome),
    /// Earliest contact is an entity obstacle that has not answered yet
    Negotiate { obstacle: usize, hit: CollisionHit },
}

struct HorizontalMove {
    dx: f32,
    lift: f32,
    contact: Option<Contact>,
}

impl HorizontalMove {
    fn none() -> Self {
        Self {
            dx: 0.0,
            lift: 0.0,
            contact: None,
        }
    }
}

/// Resolves the proposed move of the body at `mover`
pub struct StaticResolver<'a> {
    index: SpatialIndex<'a>,
    mover: usize,
    verdicts: &'a Verdicts,
}

impl<'a> StaticResolver<'a> {
    pub fn new(index: SpatialIndex<'a>, mover: usize, verdicts: &'a Verdicts) -> Self {
        Self {
            index,
            mover,
            verdicts,
        }
    }

    fn body(&self) -> &'a Body {
        &self.index.bodies()[self.mover]
    }

    pub fn resolve(&self) -> Result<StaticStep, ResolveError> {
        match self.run() {
            Ok(outcome) => Ok(StaticStep::Done(outcome)),
            Err(Stop::Negotiate(obstacle, hit)) => Ok(StaticStep::Negotiate { obstacle, hit }),
            Err(Stop::Degenerate(e)) => Err(e),
        }
    }

    fn run(&self) -> Result<StaticOutcome, Stop> {
        let body = self.body();
        if !is_finite_vec(body.movement) {
            return Err(ResolveError::NonFiniteMovement(body.movement).into());
        }

        let mut pos = body.bbox;
        let mut movement = body.movement;

        // An obstacle already overlapping us dictates the move on its axis
        let push = self.push_out(&pos)?;
        if let Some((axis, amount, _)) = push {
            movement = match axis {
                Axis::X => Vec2::new(amount, movement.y),
                Axis::Y => Vec2::new(movement.x, amount),
            };
        }

        let horizontal = self.sweep_horizontal(&pos, movement.x)?;
        pos = pos.translated(Vec2::new(horizontal.dx, -horizontal.lift));
        let mut hit_x = horizontal.contact.map(|c| c.hit);

        let vertical = self.sweep_vertical(&pos, movement.y)?;
        let dy = vertical.map_or(movement.y, |c| movement.y.signum() * c.gap);
        pos = pos.translated(Vec2::new(0.0, dy));
        let mut hit_y = vertical.map(|c| c.hit);

        let mut support = match vertical {
            Some(Contact {
                blocker: Blocker::Entity(o),
                hit,
                ..
            }) if hit.bottom => Some(o),
            _ => None,
        };

        if let Some((axis, amount, pusher)) = push {
            let achieved = match axis {
                Axis::X => horizontal.dx,
                Axis::Y => dy,
            };
            let hit = if (achieved - amount).abs() > REST_EPSILON {
                CollisionHit::crushed(axis)
            } else {
                CollisionHit::axis(axis, -amount)
            };
            if hit.bottom && !hit.crush {
                support = Some(pusher);
            }
            match axis {
                Axis::X => hit_x = Some(hit),
                Axis::Y => hit_y = Some(hit),
            }
        }

        // Ride along with whatever we stand on
        let mut carried_by = None;
        if let Some(o) = support {
            let platform = &self.index.bodies()[o];
            let carry = platform.dest.min.x - platform.bbox.min.x;
            if carry != 0.0 {
                let ride = self.sweep_horizontal(&pos, carry)?;
                pos = pos.translated(Vec2::new(ride.dx, -ride.lift));
                if hit_x.is_none() {
                    hit_x = ride.contact.map(|c| c.hit);
                }
                carried_by = Some(platform.id);
            }
        }

        Ok(StaticOutcome {
            dest: pos,
            hit_x,
            hit_y,
            carried_by,
        })
    }

    /// Entity obstacles this mover has to respect, registration order
    fn entity_obstacles(&self) -> impl Iterator<Item = usize> + '_ {
        let me = self.body();
        self.index
            .bodies()
            .iter()
            .enumerate()
            .filter(move |&(i, other)| {
                i != self.mover
                    && other.group.is_obstacle()
                    && !self.verdicts.is_passable(i)
                    && !forgiven(me, other)
            })
            .map(|(i, _)| i)
    }

    fn gather(&self, region: &Rect) -> Result<Vec<Obstacle>, ResolveError> {
        let mut obstacles: Vec<Obstacle> = self
            .index
            .solid_tiles(region)?
            .into_iter()
            .map(|t| {
                let blocker = Blocker::Tile(t.cell.0, t.cell.1);
                match t.shape {
                    TileShape::Block => Obstacle::Rect {
                        rect: t.rect,
                        one_way: false,
                        blocker,
                    },
                    TileShape::OneWay => Obstacle::Rect {
                        rect: t.rect,
                        one_way: true,
                        blocker,
                    },
                    TileShape::Slope(slope) => Obstacle::Slope(slope),
                }
            })
            .collect();

        let bodies = self.index.bodies();
        for o in self.entity_obstacles() {
            if bodies[o].dest.overlaps(region) {
                obstacles.push(Obstacle::Rect {
                    rect: bodies[o].dest,
                    one_way: false,
                    blocker: Blocker::Entity(o),
                });
            }
        }
        Ok(obstacles)
    }

    /// First entity obstacle the box is sunk into, with the push that frees it
    fn push_out(&self, pos: &Rect) -> Result<Option<(Axis, f32, usize)>, Stop> {
        let bodies = self.index.bodies();
        for o in self.entity_obstacles() {
            let other = &bodies[o].dest;
            if pos.overlap_along(other, Axis::X) <= REST_EPSILON
                || pos.overlap_along(other, Axis::Y) <= REST_EPSILON
            {
                continue;
            }
            if !self.verdicts.is_known(o) {
                return Err(Stop::Negotiate(o, CollisionHit::between(pos, other)));
            }
            let (axis, amount) = min_penetration(pos, other);
            return Ok(Some((axis, amount, o)));
        }
        Ok(None)
    }

    fn settle(&self, contact: Option<Contact>) -> Result<Option<Contact>, Stop> {
        match contact {
            Some(Contact {
                blocker: Blocker::Entity(o),
                hit,
                ..
            }) if !self.verdicts.is_known(o) => Err(Stop::Negotiate(o, hit)),
            other => Ok(other),
        }
    }

    fn sweep_vertical(&self, pos: &Rect, dy: f32) -> Result<Option<Contact>, Stop> {
        if dy == 0.0 {
            return Ok(None);
        }
        let region = pos
            .swept(Vec2::new(0.0, dy))
            .grown(Vec2::splat(REST_EPSILON));

        let mut best = None;
        for obstacle in self.gather(&region)? {
            let contact = match obstacle {
                Obstacle::Rect {
                    rect,
                    one_way,
                    blocker,
                } => {
                    // One-way platforms only catch falling boxes
                    if one_way && dy < 0.0 {
                        continue;
                    }
                    rect_gap(pos, &rect, Axis::Y, dy).map(|gap| Contact {
                        gap,
                        hit: CollisionHit::axis(Axis::Y, dy),
                        blocker,
                    })
                }
                Obstacle::Slope(slope) => slope_vertical_gap(&slope, pos, dy).map(|(gap, normal)| {
                    Contact {
                        gap,
                        hit: CollisionHit::axis(Axis::Y, dy).with_normal(normal),
                        blocker: Blocker::Tile(slope.cell_index.0, slope.cell_index.1),
                    }
                }),
            };
            keep_earliest(&mut best, contact);
        }
        self.settle(best)
    }

    /// Horizontal sweep, taking climbable slopes one cell at a time
    ///
    /// Stretches with no climbable slope ahead are swept in one go.
    fn sweep_horizontal(&self, pos: &Rect, dx: f32) -> Result<HorizontalMove, Stop> {
        let step = self.index.grid().cell_size();
        let mut total = HorizontalMove::none();
        let mut at = *pos;
        let mut left = dx;
        while left != 0.0 {
            let chunk = match self.next_climb(&at, left)? {
                Some(gap) => left.signum() * left.abs().min(gap.max(step)),
                None => left,
            };
            let part = self.sweep_step(&at, chunk)?;
            at = at.translated(Vec2::new(part.dx, -part.lift));
            total.dx += part.dx;
            total.lift += part.lift;
            if part.contact.is_some() {
                total.contact = part.contact;
                break;
            }
            left -= chunk;
        }
        Ok(total)
    }

    /// Distance to the nearest floor slope the box could start climbing
    fn next_climb(&self, pos: &Rect, dx: f32) -> Result<Option<f32>, ResolveError> {
        let region = pos
            .swept(Vec2::new(dx, 0.0))
            .grown(Vec2::new(REST_EPSILON, self.index.grid().cell_size()));
        let nearest = self
            .index
            .solid_tiles(&region)?
            .into_iter()
            .filter_map(|t| match t.shape {
                TileShape::Slope(s) if climbable(&s, pos, dx) => Some(if dx > 0.0 {
                    s.cell.left() - pos.right()
                } else {
                    pos.left() - s.cell.right()
                }),
                _ => None,
            })
            .reduce(f32::min);
        Ok(nearest)
    }

    /// One stretch of the horizontal sweep, crossing at most one slope cell
    fn sweep_step(&self, pos: &Rect, dx: f32) -> Result<HorizontalMove, Stop> {
        if dx == 0.0 {
            return Ok(HorizontalMove::none());
        }
        let cell = self.index.grid().cell_size();
        let region = pos
            .swept(Vec2::new(dx, 0.0))
            .grown(Vec2::new(REST_EPSILON, cell));
        let obstacles = self.gather(&region)?;

        // Rise needed to clear every climbable slope passed over while moving `d`
        let lift_at = |d: f32| -> f32 {
            let reach = pos.swept(Vec2::new(d, 0.0));
            obstacles
                .iter()
                .filter_map(|o| match o {
                    Obstacle::Slope(s) if climbable(s, pos, dx) => climb_height(s, pos, &reach),
                    _ => None,
                })
                .fold(0.0, f32::max)
        };

        let reach = pos.swept(Vec2::new(dx, 0.0));
        let mut lift = lift_at(dx);
        if lift > 0.0 && self.sweep_vertical(&reach, -lift)?.is_some() {
            // No headroom: the slope becomes a wall
            lift = 0.0;
        }
        let climbing = lift > 0.0;
        let moving = pos.translated(Vec2::new(0.0, -lift));

        let mut best = None;
        for obstacle in &obstacles {
            let contact = match *obstacle {
                Obstacle::Rect {
                    rect,
                    one_way,
                    blocker,
                } => {
                    if one_way {
                        continue;
                    }
                    rect_gap(&moving, &rect, Axis::X, dx).map(|gap| Contact {
                        gap,
                        hit: CollisionHit::axis(Axis::X, dx),
                        blocker,
                    })
                }
                Obstacle::Slope(slope) => {
                    let climbed = climbable(&slope, pos, dx)
                        && climb_height(&slope, pos, &reach).is_some();
                    if climbing && climbed {
                        continue;
                    }
                    slope_face_gap(&slope, &moving, dx).map(|(gap, normal)| Contact {
                        gap,
                        hit: CollisionHit::axis(Axis::X, dx).with_normal(normal),
                        blocker: Blocker::Tile(slope.cell_index.0, slope.cell_index.1),
                    })
                }
            };
            keep_earliest(&mut best, contact);
        }

        let contact = self.settle(best)?;
        let mut moved = dx;
        if let Some(c) = contact {
            moved = dx.signum() * c.gap;
            if climbing {
                lift = lift_at(moved).max(0.0);
            }
        }
        Ok(HorizontalMove {
            dx: moved,
            lift,
            contact,
        })
    }
}

/// Floor slope rising in the direction of travel, not above the box's feet
fn climbable(slope: &Slope, pos: &Rect, dx: f32) -> bool {
    slope.is_floor()
        && slope.uphill() * dx > 0.0
        && pos.bottom() <= slope.cell.bottom() + REST_EPSILON
}

/// Rise that puts the box's feet on the highest point of `slope` within `reach`
fn climb_height(slope: &Slope, pos: &Rect, reach: &Rect) -> Option<f32> {
    let l = reach.left().max(slope.cell.left());
    let r = reach.right().min(slope.cell.right());
    (r - l > REST_EPSILON).then(|| pos.bottom() - slope.floor_under(l, r))
}

/// A MovingStatic body much bigger than a MovingStatic obstacle shoves past it
fn forgiven(mover: &Body, obstacle: &Body) -> bool {
    mover.group == CollisionGroup::MovingStatic
        && obstacle.group == CollisionGroup::MovingStatic
        && mover.bbox.area() > obstacle.bbox.area() + MOVING_STATIC_FORGIVENESS
}

fn keep_earliest(best: &mut Option<Contact>, contact: Option<Contact>) {
    if let Some(c) = contact {
        if best.is_none_or(|b| c.gap < b.gap) {
            *best = Some(c);
        }
    }
}

/// Travel left before `pos` touches `rect` when moving `delta` along `axis`
///
/// Boxes that barely share the other axis, or that are already sunk in past
/// the epsilon, do not count.
fn rect_gap(pos: &Rect, rect: &Rect, axis: Axis, delta: f32) -> Option<f32> {
    if pos.overlap_along(rect, axis.other()) <= REST_EPSILON {
        return None;
    }
    let (p0, p1) = pos.span(axis);
    let (r0, r1) = rect.span(axis);
    let gap = if delta > 0.0 { r0 - p1 } else { p0 - r1 };
    (gap >= -REST_EPSILON && gap <= delta.abs()).then_some(gap)
}

/// Vertical travel left before the box meets a slope, with the contact normal
fn slope_vertical_gap(slope: &Slope, pos: &Rect, dy: f32) -> Option<(f32, Vec2)> {
    let l = pos.left().max(slope.cell.left());
    let r = pos.right().min(slope.cell.right());
    if r - l <= REST_EPSILON {
        return None;
    }
    let (gap, normal) = match (slope.is_floor(), dy > 0.0) {
        (true, true) => (slope.floor_under(l, r) - pos.bottom(), slope.normal()),
        (true, false) => (pos.top() - slope.cell.bottom(), Vec2::Y),
        (false, false) => (pos.top() - slope.ceiling_over(l, r), slope.normal()),
        (false, true) => (slope.cell.top() - pos.bottom(), Vec2::NEG_Y),
    };
    (gap >= -REST_EPSILON && gap <= dy.abs()).then_some((gap, normal))
}

/// Horizontal travel left before the box runs into a slope's solid part
///
/// The widest row of the solid part the box shares decides where it stops.
fn slope_face_gap(slope: &Slope, pos: &Rect, dx: f32) -> Option<(f32, Vec2)> {
    let cell = slope.cell;
    let (solid_top, solid_bottom) = if slope.is_floor() {
        (slope.area.top(), cell.bottom())
    } else {
        (cell.top(), slope.area.bottom())
    };
    if pos.bottom().min(solid_bottom) - pos.top().max(solid_top) <= REST_EPSILON {
        return None;
    }

    let row = if slope.is_floor() {
        pos.bottom().min(cell.bottom()) - REST_EPSILON
    } else {
        pos.top().max(cell.top()) + REST_EPSILON
    };
    let (lo, hi) = slope.solid_span_at(row);
    if hi <= lo {
        return None;
    }

    let (gap, on_leg) = if dx > 0.0 {
        (lo - pos.right(), lo <= cell.left())
    } else {
        (pos.left() - hi, hi >= cell.right())
    };
    let normal = if on_leg {
        CollisionHit::axis(Axis::X, dx).normal
    } else {
        slope.normal()
    };
    (gap >= -REST_EPSILON && gap <= dx.abs()).then_some((gap, normal))
}
