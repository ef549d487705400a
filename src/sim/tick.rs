//! Fixed timestep simulation tick
//!
//! One tick runs five strictly sequential phases:
//! Integrate -> StaticResolve -> DynamicResolve -> Commit -> ApplyDeferredMutations.
//! Behaviour callbacks fire from the resolve phases; anything structural they
//! ask for waits until the last phase.

use super::collision::{CollisionHit, HitResponse};
use super::entity::{Body, CollisionGroup};
use super::resolve_dynamic::{apply_response, pair_contact, touch_pairs};
use super::resolve_static::{StaticResolver, StaticStep, Verdicts};
use super::spatial::SpatialIndex;
use super::state::{Sector, TickPhase, TickReport};
use super::tile::TileAttributes;
use crate::error::ResolveError;
use crate::is_finite_vec;

/// Advance the sector by one fixed timestep
pub fn tick(sector: &mut Sector, dt: f32) -> TickReport {
    sector.tick += 1;
    let mut report = TickReport {
        tick: sector.tick,
        ..Default::default()
    };

    sector.phase = TickPhase::Integrate;
    integrate(sector, dt, &mut report);

    sector.phase = TickPhase::StaticResolve;
    for index in resolve_order(&sector.bodies) {
        resolve_mover(sector, index, &mut report);
        report.resolved += 1;
    }
    touch_advisory(sector);

    sector.phase = TickPhase::DynamicResolve;
    touch_entities(sector);
    resolve_pairs(sector);

    sector.phase = TickPhase::Commit;
    commit(sector);

    sector.phase = TickPhase::ApplyDeferredMutations;
    sector.apply_mutations();

    sector.phase = TickPhase::Idle;
    log::trace!(
        "Tick {} done: {} resolved, {} diagnostics",
        report.tick,
        report.resolved,
        report.diagnostics.len()
    );
    report
}

/// Propose a destination for every active body
fn integrate(sector: &mut Sector, dt: f32, report: &mut TickReport) {
    let gravity = sector.settings.gravity;
    for index in 0..sector.bodies.len() {
        let body = &mut sector.bodies[index];
        if !body.group.is_active() {
            body.freeze();
            continue;
        }
        let movement = body.kinematics.integrate(gravity, dt);
        if !is_finite_vec(movement) {
            let diagnostic = sector.contain(index, ResolveError::NonFiniteMovement(movement));
            report.diagnostics.push(diagnostic);
            continue;
        }
        body.movement = movement;
        body.dest = body.bbox.translated(movement);
    }
}

/// MovingStatic movers first so riders see where their platform goes, then
/// the rest; registration order within each group
fn resolve_order(bodies: &[Body]) -> Vec<usize> {
    let movers = || bodies.iter().enumerate().filter(|(_, b)| b.group.is_mover());
    movers()
        .filter(|(_, b)| b.group == CollisionGroup::MovingStatic)
        .chain(movers().filter(|(_, b)| b.group != CollisionGroup::MovingStatic))
        .map(|(i, _)| i)
        .collect()
}

/// Run one mover through the static resolver, negotiating with entity obstacles
fn resolve_mover(sector: &mut Sector, index: usize, report: &mut TickReport) {
    let mut verdicts = Verdicts::default();
    loop {
        let step =
            StaticResolver::new(SpatialIndex::new(&sector.grid, &sector.bodies), index, &verdicts)
                .resolve();

        match step {
            Err(e) => {
                report.diagnostics.push(sector.contain(index, e));
                return;
            }
            Ok(StaticStep::Negotiate { obstacle, hit }) => {
                let mine = ask(sector, index, obstacle, &hit);
                let theirs = ask(sector, obstacle, index, &hit.mirrored());
                match (mine, theirs) {
                    (HitResponse::Abort, _) => {
                        sector.bodies[index].dest = sector.bodies[index].bbox;
                        return;
                    }
                    (HitResponse::Force, _) | (_, HitResponse::Abort) => verdicts.allow(obstacle),
                    _ => verdicts.block(obstacle),
                }
            }
            Ok(StaticStep::Done(outcome)) => {
                sector.bodies[index].dest = outcome.dest;
                for hit in [outcome.hit_x, outcome.hit_y].into_iter().flatten() {
                    sector.with_behavior(index, |behavior, ctx| {
                        behavior.on_collide_static(&hit, ctx)
                    });
                }
                return;
            }
        }
    }
}

/// Ask the behaviour at `index` about running into the body at `other`
fn ask(sector: &mut Sector, index: usize, other: usize, hit: &CollisionHit) -> HitResponse {
    let other = sector.bodies[other].snapshot();
    sector.with_behavior(index, |behavior, ctx| behavior.on_collide_entity(&other, hit, ctx))
}

/// Tell movers about gameplay attributes of the tiles they end up in
fn touch_advisory(sector: &mut Sector) {
    for index in 0..sector.bodies.len() {
        let body = &sector.bodies[index];
        if !body.group.is_mover() {
            continue;
        }
        let touched =
            SpatialIndex::new(&sector.grid, &sector.bodies).touched_attributes(&body.dest);
        if touched.intersects(TileAttributes::ADVISORY) {
            sector.with_behavior(index, |behavior, ctx| behavior.on_touch_advisory(touched, ctx));
        }
    }
}

/// Overlap events with touchables; answers are ignored
fn touch_entities(sector: &mut Sector) {
    for (mover, touchable) in touch_pairs(&sector.bodies) {
        let hit = CollisionHit::between(&sector.bodies[mover].dest, &sector.bodies[touchable].dest);
        ask(sector, mover, touchable, &hit);
        ask(sector, touchable, mover, &hit.mirrored());
    }
}

/// Negotiate every overlapping pair of dynamic bodies, registration order
fn resolve_pairs(sector: &mut Sector) {
    let count = sector.bodies.len();
    for i in 0..count {
        for j in (i + 1)..count {
            let Some(hit) = pair_contact(&sector.bodies, i, j) else {
                continue;
            };
            let from_i = ask(sector, i, j, &hit);
            let from_j = ask(sector, j, i, &hit.mirrored());

            let axis = hit.hit_axis();
            apply_response(&sector.grid, &mut sector.bodies[i], from_i.combine(from_j), axis);
            apply_response(&sector.grid, &mut sector.bodies[j], from_j.combine(from_i), axis);
        }
    }
}

/// Make the resolved destinations the new boxes
fn commit(sector: &mut Sector) {
    for body in sector.bodies.iter_mut().filter(|b| b.group.is_active()) {
        body.movement = body.dest.min - body.bbox.min;
        body.bbox = body.dest;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use proptest::prelude::*;

    use super::*;
    use crate::consts::REST_EPSILON;
    use crate::settings::PhysicsSettings;
    use crate::sim::behavior::{Behavior, Inert, SectorContext};
    use crate::sim::entity::{EntityDesc, EntityId, EntityRef};
    use crate::sim::fixtures::grid;
    use crate::sim::grid::{LayerDesc, TileGrid};
    use crate::sim::kinematics::Kinematics;
    use crate::sim::tile::{TileDef, TileSet};

    const DT: f32 = 1.0 / 60.0;

    #[derive(Default)]
    struct Log {
        static_hits: Vec<(EntityId, CollisionHit)>,
        entity_hits: Vec<(EntityId, EntityId)>,
        advisory: Vec<(EntityId, TileAttributes)>,
    }

    struct Recorder {
        log: Rc<RefCell<Log>>,
        answer: HitResponse,
    }

    impl Behavior for Recorder {
        fn on_collide_static(&mut self, hit: &CollisionHit, ctx: &mut SectorContext<'_>) {
            assert_eq!(ctx.phase(), TickPhase::StaticResolve);
            self.log.borrow_mut().static_hits.push((ctx.id(), *hit));
        }

        fn on_collide_entity(
            &mut self,
            other: &EntityRef,
            _hit: &CollisionHit,
            ctx: &mut SectorContext<'_>,
        ) -> HitResponse {
            self.log.borrow_mut().entity_hits.push((ctx.id(), other.id));
            self.answer
        }

        fn on_touch_advisory(&mut self, attributes: TileAttributes, ctx: &mut SectorContext<'_>) {
            self.log.borrow_mut().advisory.push((ctx.id(), attributes));
        }
    }

    fn recorder(log: &Rc<RefCell<Log>>, answer: HitResponse) -> Box<dyn Behavior> {
        Box::new(Recorder {
            log: Rc::clone(log),
            answer,
        })
    }

    fn sector(rows: &[&str]) -> Sector {
        Sector::new(grid(rows), PhysicsSettings::default()).unwrap()
    }

    fn desc(x: f32, y: f32, w: f32, h: f32, group: CollisionGroup) -> EntityDesc {
        EntityDesc::new(Vec2::new(x, y), Vec2::new(w, h), group)
    }

    fn floating(
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        group: CollisionGroup,
        velocity: Vec2,
    ) -> EntityDesc {
        desc(x, y, w, h, group).with_kinematics(Kinematics::floating().with_velocity(velocity))
    }

    #[test]
    fn test_resting_on_ground_hits_bottom_every_tick() {
        let mut sector = sector(&["....", "....", "####"]);
        let log = Rc::new(RefCell::new(Log::default()));
        let id = sector
            .add_entity(
                desc(8.0, 48.0, 16.0, 16.0, CollisionGroup::Moving),
                recorder(&log, HitResponse::Continue),
            )
            .unwrap();

        for _ in 0..30 {
            tick(&mut sector, DT);
            assert_eq!(sector.body(id).unwrap().bbox.bottom(), 64.0);
        }
        let log = log.borrow();
        assert_eq!(log.static_hits.len(), 30);
        assert!(log.static_hits.iter().all(|(_, hit)| hit.bottom && !hit.crush));
    }

    #[test]
    fn test_fast_fall_lands_on_row() {
        let mut sector = sector(&["....", "....", "####"]);
        let id = sector
            .add_entity(
                floating(8.0, 22.0, 16.0, 32.0, CollisionGroup::Moving, Vec2::new(0.0, 500.0 / DT)),
                Box::new(Inert),
            )
            .unwrap();
        let report = tick(&mut sector, DT);
        assert_eq!(report.tick, 1);
        assert_eq!(report.resolved, 1);
        assert_eq!(sector.body(id).unwrap().bbox.bottom(), 64.0);
    }

    #[test]
    fn test_fast_mover_stops_at_wall_face() {
        let mut sector = sector(&["..........", "......#...", "##########"]);
        let id = sector
            .add_entity(
                floating(
                    80.0,
                    40.0,
                    16.0,
                    16.0,
                    CollisionGroup::Moving,
                    Vec2::new(300.0 / DT, 0.0),
                ),
                Box::new(Inert),
            )
            .unwrap();
        tick(&mut sector, DT);
        let body = sector.body(id).unwrap();
        assert_eq!(body.bbox.right(), 192.0);
        assert!((body.movement.x - 96.0).abs() < 0.001);
    }

    #[test]
    fn test_walk_up_ramp() {
        let mut sector = sector(&["......", "../###", "######"]);
        let kinematics = Kinematics::default().with_velocity(Vec2::new(120.0, 0.0));
        let id = sector
            .add_entity(
                desc(8.0, 48.0, 16.0, 16.0, CollisionGroup::Moving).with_kinematics(kinematics),
                Box::new(Inert),
            )
            .unwrap();

        for _ in 0..60 {
            tick(&mut sector, DT);
            let bbox = sector.body(id).unwrap().bbox;
            let inner = bbox.grown(Vec2::splat(-REST_EPSILON));
            assert!(sector.spatial().is_free_of_tiles(&inner, false));
        }
        let bbox = sector.body(id).unwrap().bbox;
        assert!(bbox.left() > 96.0);
        assert!((bbox.bottom() - 32.0).abs() < 0.01);
    }

    #[test]
    fn test_force_against_block() {
        let run = |a: HitResponse, b: HitResponse| {
            let mut sector = sector(&["........"]);
            let log = Rc::new(RefCell::new(Log::default()));
            let a = sector
                .add_entity(
                    floating(0.0, 8.0, 16.0, 16.0, CollisionGroup::Moving, Vec2::new(720.0, 0.0)),
                    recorder(&log, a),
                )
                .unwrap();
            let b = sector
                .add_entity(
                    floating(20.0, 8.0, 16.0, 16.0, CollisionGroup::Moving, Vec2::ZERO),
                    recorder(&log, b),
                )
                .unwrap();
            tick(&mut sector, DT);
            let hits = log.borrow().entity_hits.clone();
            assert_eq!(hits, vec![(a, b), (b, a)]);
            (sector.body(a).unwrap().bbox.left(), sector.body(b).unwrap().bbox.left())
        };

        // The forcing side goes through, the blocking side stays put
        let (a, b) = run(HitResponse::Force, HitResponse::Block);
        assert!((a - 12.0).abs() < 0.001);
        assert_eq!(b, 20.0);

        // Swapped: the mover yields to the peer that forces
        let (a, _) = run(HitResponse::Block, HitResponse::Force);
        assert_eq!(a, 0.0);

        // Nobody objects: the overlap is left alone
        let (a, _) = run(HitResponse::Continue, HitResponse::Continue);
        assert!((a - 12.0).abs() < 0.001);

        // Abort only freezes the side that answered it
        let (a, _) = run(HitResponse::Continue, HitResponse::Abort);
        assert!((a - 12.0).abs() < 0.001);
        let (a, _) = run(HitResponse::Abort, HitResponse::Continue);
        assert_eq!(a, 0.0);
    }

    #[test]
    fn test_static_entity_obstacle() {
        let run = |answer: HitResponse| {
            let mut sector = sector(&["........"]);
            let log = Rc::new(RefCell::new(Log::default()));
            let mover = sector
                .add_entity(
                    floating(0.0, 8.0, 16.0, 16.0, CollisionGroup::Moving, Vec2::new(1800.0, 0.0)),
                    recorder(&log, answer),
                )
                .unwrap();
            sector
                .add_entity(
                    floating(40.0, 0.0, 32.0, 32.0, CollisionGroup::Static, Vec2::ZERO),
                    Box::new(Inert),
                )
                .unwrap();
            tick(&mut sector, DT);
            sector.body(mover).unwrap().bbox.right()
        };

        assert_eq!(run(HitResponse::Continue), 40.0);
        assert!((run(HitResponse::Force) - 46.0).abs() < 0.001);
        assert_eq!(run(HitResponse::Abort), 16.0);
    }

    #[test]
    fn test_disabled_round_trip() {
        let mut sector = sector(&["....", "....", "####"]);
        let log = Rc::new(RefCell::new(Log::default()));
        let id = sector
            .add_entity(
                desc(8.0, 20.0, 16.0, 16.0, CollisionGroup::Moving),
                recorder(&log, HitResponse::Continue),
            )
            .unwrap();
        let peer = sector
            .add_entity(
                floating(12.0, 20.0, 16.0, 16.0, CollisionGroup::Moving, Vec2::ZERO),
                recorder(&log, HitResponse::Continue),
            )
            .unwrap();

        assert!(sector.set_group(id, CollisionGroup::Disabled));
        for _ in 0..10 {
            let report = tick(&mut sector, DT);
            assert_eq!(report.resolved, 1);
        }
        let body = sector.body(id).unwrap();
        assert_eq!(body.bbox.top(), 20.0);
        assert_eq!(body.kinematics.velocity, Vec2::ZERO);
        let seen = sector.spatial().query(&body.bbox).unwrap().entities;
        assert!(seen.iter().all(|&i| sector.bodies()[i].id != id));
        assert!(log.borrow().entity_hits.is_empty());

        // Back in both phases: the overlap with the peer gets negotiated
        assert!(sector.set_group(id, CollisionGroup::Moving));
        let report = tick(&mut sector, DT);
        assert_eq!(report.resolved, 2);
        assert_eq!(log.borrow().entity_hits, vec![(id, peer), (peer, id)]);

        for _ in 0..60 {
            tick(&mut sector, DT);
        }
        assert_eq!(sector.body(id).unwrap().bbox.bottom(), 64.0);
        assert!(log.borrow().static_hits.iter().any(|(who, hit)| *who == id && hit.bottom));
    }

    #[test]
    fn test_degenerate_slope_is_contained() {
        // Cells too small for a slope to span anything
        let tileset = TileSet::from_defs(&[TileDef {
            attributes: 0,
            slope: Some(0x02),
        }])
        .unwrap();
        let layer = LayerDesc {
            width: 2,
            height: 2,
            tiles: vec![0, 0, 1, 1],
            solid: true,
        };
        let grid = TileGrid::new(0.001, tileset, &[layer]).unwrap();
        let mut sector = Sector::new(grid, PhysicsSettings::default()).unwrap();
        let id = sector
            .add_entity(
                desc(0.0, 0.0, 0.0005, 0.0005, CollisionGroup::Moving),
                Box::new(Inert),
            )
            .unwrap();

        let report = tick(&mut sector, DT);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].entity, id);
        assert!(matches!(
            report.diagnostics[0].error,
            ResolveError::DegenerateSlope { x: 0, y: 1 }
        ));
        let body = sector.body(id).unwrap();
        assert_eq!(body.bbox.min, Vec2::ZERO);
        assert_eq!(body.movement, Vec2::ZERO);
        assert_eq!(sector.diagnostics().count(), 1);
    }

    #[test]
    fn test_advisory_attributes() {
        let mut sector = sector(&["....", "~~.H", "IIII"]);
        let log = Rc::new(RefCell::new(Log::default()));
        let swimmer = sector
            .add_entity(
                floating(4.0, 36.0, 16.0, 16.0, CollisionGroup::Moving, Vec2::ZERO),
                recorder(&log, HitResponse::Continue),
            )
            .unwrap();
        let skater = sector
            .add_entity(
                desc(72.0, 48.0, 16.0, 16.0, CollisionGroup::Moving),
                recorder(&log, HitResponse::Continue),
            )
            .unwrap();
        let hurt = sector
            .add_entity(
                desc(100.0, 48.0, 16.0, 16.0, CollisionGroup::Moving),
                recorder(&log, HitResponse::Continue),
            )
            .unwrap();
        tick(&mut sector, DT);

        let log = log.borrow();
        let of = |id: EntityId| {
            log.advisory
                .iter()
                .find(|(who, _)| *who == id)
                .map(|(_, attributes)| *attributes)
                .unwrap_or_default()
        };
        assert!(of(swimmer).contains(TileAttributes::WATER));
        assert!(of(skater).contains(TileAttributes::ICE));
        assert!(!of(skater).contains(TileAttributes::WATER));
        assert!(of(hurt).contains(TileAttributes::HURTS | TileAttributes::ICE));
        assert!(!of(skater).contains(TileAttributes::HURTS));
    }

    #[test]
    fn test_touchable_overlap_never_blocks() {
        let mut sector = sector(&["........"]);
        let log = Rc::new(RefCell::new(Log::default()));
        let mover = sector
            .add_entity(
                floating(0.0, 8.0, 16.0, 16.0, CollisionGroup::Moving, Vec2::new(720.0, 0.0)),
                recorder(&log, HitResponse::Continue),
            )
            .unwrap();
        let coin = sector
            .add_entity(
                floating(20.0, 8.0, 8.0, 8.0, CollisionGroup::Touchable, Vec2::ZERO),
                recorder(&log, HitResponse::Block),
            )
            .unwrap();
        tick(&mut sector, DT);
        assert!((sector.body(mover).unwrap().bbox.left() - 12.0).abs() < 0.001);
        assert_eq!(log.borrow().entity_hits, vec![(mover, coin), (coin, mover)]);
    }

    /// Splits into a new entity and removes itself the first time it lands
    struct Splitter;

    impl Behavior for Splitter {
        fn on_collide_static(&mut self, _hit: &CollisionHit, ctx: &mut SectorContext<'_>) {
            let Some(pos) = ctx.this_body().map(|b| b.bbox.min) else {
                return;
            };
            let count = ctx.bodies().len();
            let above = pos - Vec2::new(0.0, 40.0);
            ctx.spawn(
                EntityDesc::new(above, Vec2::splat(8.0), CollisionGroup::Touchable)
                    .with_kinematics(Kinematics::floating()),
                Box::new(Inert),
            )
            .unwrap();
            ctx.remove(ctx.id());
            // Nothing structural changes until the tick is over
            assert_eq!(ctx.bodies().len(), count);
        }
    }

    #[test]
    fn test_deferred_spawn_and_remove() {
        let mut sector = sector(&["....", "....", "####"]);
        let splitter = sector
            .add_entity(desc(8.0, 48.0, 16.0, 16.0, CollisionGroup::Moving), Box::new(Splitter))
            .unwrap();
        tick(&mut sector, DT);

        assert!(sector.body(splitter).is_none());
        let spawned = &sector.bodies()[0];
        assert!(spawned.id > splitter);
        assert_eq!(spawned.group, CollisionGroup::Touchable);
        assert_eq!(spawned.bbox.min, Vec2::new(8.0, 8.0));
        assert_eq!(sector.phase(), TickPhase::Idle);
    }

    #[test]
    fn test_crushed_by_descending_platform() {
        let mut sector = sector(&["....", "....", "####"]);
        let log = Rc::new(RefCell::new(Log::default()));
        sector
            .add_entity(
                floating(0.0, 0.0, 64.0, 40.0, CollisionGroup::MovingStatic, Vec2::new(0.0, 720.0)),
                Box::new(Inert),
            )
            .unwrap();
        let victim = sector
            .add_entity(
                floating(8.0, 36.0, 16.0, 28.0, CollisionGroup::Moving, Vec2::ZERO),
                recorder(&log, HitResponse::Continue),
            )
            .unwrap();
        tick(&mut sector, DT);

        let log = log.borrow();
        assert!(log.static_hits.iter().any(|(who, hit)| *who == victim && hit.crush));
        assert_eq!(sector.body(victim).unwrap().bbox.bottom(), 64.0);
    }

    #[test]
    fn test_rider_follows_platform() {
        let mut sector = sector(&["........", "........", "........"]);
        let platform = sector
            .add_entity(
                floating(
                    32.0,
                    48.0,
                    64.0,
                    16.0,
                    CollisionGroup::MovingStatic,
                    Vec2::new(300.0, 0.0),
                ),
                Box::new(Inert),
            )
            .unwrap();
        let rider = sector
            .add_entity(desc(40.0, 32.0, 16.0, 16.0, CollisionGroup::Moving), Box::new(Inert))
            .unwrap();
        for _ in 0..3 {
            tick(&mut sector, DT);
        }
        let platform = sector.body(platform).unwrap().bbox;
        let rider = sector.body(rider).unwrap().bbox;
        assert!((platform.left() - 47.0).abs() < 0.01);
        assert!((rider.left() - 55.0).abs() < 0.01);
        assert_eq!(rider.bottom(), 48.0);
    }

    #[test]
    fn test_non_finite_velocity_is_contained() {
        let settings = PhysicsSettings {
            diagnostics_capacity: 2,
            ..Default::default()
        };
        let mut sector = Sector::new(grid(&["....", "####"]), settings).unwrap();
        let id = sector
            .add_entity(desc(8.0, 4.0, 16.0, 16.0, CollisionGroup::Moving), Box::new(Inert))
            .unwrap();

        for n in 1..=3 {
            sector.set_velocity(id, Vec2::new(f32::NAN, 10.0));
            let report = tick(&mut sector, DT);
            assert_eq!(report.diagnostics.len(), 1);
            assert_eq!(report.diagnostics[0].tick, n);
            assert!(matches!(report.diagnostics[0].error, ResolveError::NonFiniteMovement(_)));
            let body = sector.body(id).unwrap();
            assert_eq!(body.bbox.min, Vec2::new(8.0, 4.0));
            assert!(body.kinematics.velocity.x.is_finite());
        }
        // Only the newest diagnostics are kept
        let kept: Vec<_> = sector.diagnostics().map(|d| d.tick).collect();
        assert_eq!(kept, vec![2, 3]);

        // Next clean tick moves again
        let report = tick(&mut sector, DT);
        assert!(report.diagnostics.is_empty());
        assert!(sector.body(id).unwrap().bbox.top() > 4.0);
    }

    #[test]
    fn test_tile_replaced_mid_tick_is_seen() {
        /// Knocks out the tile under itself on landing
        struct Breaker;
        impl Behavior for Breaker {
            fn on_collide_static(&mut self, hit: &CollisionHit, ctx: &mut SectorContext<'_>) {
                if hit.bottom {
                    ctx.replace_tile(0, 2, 0).unwrap();
                }
            }
        }

        let mut sector = sector(&["....", "....", "#..."]);
        let id = sector
            .add_entity(desc(8.0, 48.0, 16.0, 16.0, CollisionGroup::Moving), Box::new(Breaker))
            .unwrap();
        tick(&mut sector, DT);
        assert!(sector.grid().tile(0, 2).is_empty());
        for _ in 0..10 {
            tick(&mut sector, DT);
        }
        assert!(sector.body(id).unwrap().bbox.bottom() > 64.0);
    }

    fn scatter(seed_velocities: &[(f32, f32)]) -> Sector {
        let mut sector = sector(&[
            "#........#",
            "#...#....#",
            "#........#",
            "#./...\\..#",
            "##########",
        ]);
        for (i, &(vx, vy)) in seed_velocities.iter().enumerate() {
            let kinematics = Kinematics::default().with_velocity(Vec2::new(vx, vy));
            sector
                .add_entity(
                    desc(40.0 + 36.0 * i as f32, 8.0, 12.0, 12.0, CollisionGroup::Moving)
                        .with_kinematics(kinematics),
                    Box::new(Inert),
                )
                .unwrap();
        }
        sector
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_identical_sectors_stay_identical(
            velocities in prop::collection::vec((-600.0f32..600.0, -600.0f32..3000.0), 1..6),
        ) {
            let mut a = scatter(&velocities);
            let mut b = scatter(&velocities);
            for _ in 0..40 {
                tick(&mut a, DT);
                tick(&mut b, DT);
            }
            prop_assert_eq!(a.bodies(), b.bodies());
        }

        #[test]
        fn test_never_sinks_below_floor(
            velocities in prop::collection::vec((-600.0f32..600.0, 0.0f32..30000.0), 1..6),
        ) {
            let mut sector = scatter(&velocities);
            for _ in 0..40 {
                tick(&mut sector, DT);
                for body in sector.bodies() {
                    // Floor row starts at y = 128
                    prop_assert!(body.bbox.bottom() <= 128.0 + REST_EPSILON);
                }
            }
        }
    }
}
