//! Dynamic pair resolver
//!
//! Moving bodies are paired after each has been resolved against the static
//! world. Detection and the effect of a negotiated answer live here; asking the
//! behaviours is left to the tick, which owns them.

use glam::Vec2;

use super::collision::{CollisionHit, HitResponse};
use super::entity::{Body, CollisionGroup};
use super::geom::{Axis, Rect};
use super::grid::TileGrid;
use super::spatial::SpatialIndex;
use crate::consts::REST_EPSILON;

/// Dynamic bodies overlapping a touchable, as (dynamic, touchable) index pairs
pub fn touch_pairs(bodies: &[Body]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, body) in bodies.iter().enumerate() {
        if !body.group.is_dynamic() {
            continue;
        }
        for (j, other) in bodies.iter().enumerate() {
            if other.group == CollisionGroup::Touchable && body.dest.overlaps(&other.dest) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Contact between two dynamic bodies as seen by `i`
///
/// Uses the current proposed boxes, so answers given to earlier pairs are
/// already reflected.
pub fn pair_contact(bodies: &[Body], i: usize, j: usize) -> Option<CollisionHit> {
    let (a, b) = (&bodies[i], &bodies[j]);
    if !a.group.is_dynamic() || !b.group.is_dynamic() || !a.dest.overlaps(&b.dest) {
        return None;
    }
    Some(CollisionHit::between(&a.dest, &b.dest))
}

/// Apply one body's negotiated outcome to its proposed box
///
/// Blocking only cancels the movement along `axis`. If what is left of the
/// move still ends inside solid tiles, the whole move is dropped.
pub fn apply_response(grid: &TileGrid, body: &mut Body, response: HitResponse, axis: Axis) {
    match response {
        HitResponse::Abort => body.dest = body.bbox,
        HitResponse::Block => {
            let undo = axis.vec(axis.of(body.bbox.min - body.dest.min));
            let dest = body.dest.translated(undo);
            body.dest = if is_clear(grid, &dest) { dest } else { body.bbox };
        }
        HitResponse::Force | HitResponse::Continue => {}
    }
}

fn is_clear(grid: &TileGrid, rect: &Rect) -> bool {
    SpatialIndex::new(grid, &[]).is_free_of_tiles(&rect.grown(Vec2::splat(-REST_EPSILON)), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::fixtures::{grid, moving_body};

    fn dynamic(id: u32, x: f32, y: f32, movement: Vec2) -> Body {
        moving_body(id, Vec2::new(x, y), Vec2::splat(16.0), CollisionGroup::Moving, movement)
    }

    #[test]
    fn test_pair_contact_from_both_sides() {
        let bodies = vec![
            dynamic(1, 0.0, 0.0, Vec2::new(10.0, 0.0)),
            dynamic(2, 30.0, 0.0, Vec2::new(-10.0, 0.0)),
        ];
        // Boxes end up at 10..26 and 20..36
        let hit = pair_contact(&bodies, 0, 1).unwrap();
        assert!(hit.right);
        assert_eq!(hit.hit_axis(), Axis::X);
        assert!(pair_contact(&bodies, 1, 0).unwrap().left);
    }

    #[test]
    fn test_only_dynamic_pairs() {
        let mut bodies = vec![
            dynamic(1, 0.0, 0.0, Vec2::ZERO),
            dynamic(2, 4.0, 0.0, Vec2::ZERO),
        ];
        bodies[1].group = CollisionGroup::MovingOnlyStatic;
        assert!(pair_contact(&bodies, 0, 1).is_none());

        bodies[1].group = CollisionGroup::Touchable;
        assert!(pair_contact(&bodies, 0, 1).is_none());
        assert_eq!(touch_pairs(&bodies), vec![(0, 1)]);
    }

    #[test]
    fn test_touching_edges_do_not_pair() {
        let bodies = vec![
            dynamic(1, 0.0, 0.0, Vec2::ZERO),
            dynamic(2, 16.0, 0.0, Vec2::ZERO),
        ];
        assert!(pair_contact(&bodies, 0, 1).is_none());
    }

    #[test]
    fn test_block_cancels_one_axis() {
        let grid = grid(&["....", "....", "...."]);
        let mut body = dynamic(1, 10.0, 10.0, Vec2::new(6.0, 4.0));
        apply_response(&grid, &mut body, HitResponse::Block, Axis::X);
        assert_eq!(body.dest.min, Vec2::new(10.0, 14.0));
    }

    #[test]
    fn test_block_reverts_fully_when_left_inside_tiles() {
        // Keeping only the vertical part would sink the box into the floor
        let grid = grid(&["....", "....", "####"]);
        let mut body = dynamic(1, 10.0, 40.0, Vec2::new(6.0, 20.0));
        apply_response(&grid, &mut body, HitResponse::Block, Axis::X);
        assert_eq!(body.dest, body.bbox);
    }

    #[test]
    fn test_abort_and_force() {
        let grid = grid(&["...."]);
        let mut body = dynamic(1, 0.0, 0.0, Vec2::new(5.0, 5.0));
        let moved = body.dest;
        apply_response(&grid, &mut body, HitResponse::Force, Axis::Y);
        apply_response(&grid, &mut body, HitResponse::Continue, Axis::Y);
        assert_eq!(body.dest, moved);
        apply_response(&grid, &mut body, HitResponse::Abort, Axis::Y);
        assert_eq!(body.dest, body.bbox);
    }
}
