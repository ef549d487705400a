//! Behaviour contract and the context handed to it
//!
//! Entity logic lives outside this crate. It plugs in through `Behavior`, and
//! every callback receives a `SectorContext` instead of reaching for a global
//! sector. Structural changes made through the context are queued and applied
//! once the tick is over, so callbacks can never invalidate the iteration the
//! resolvers are in the middle of.

use glam::Vec2;

use super::collision::{CollisionHit, HitResponse};
use super::entity::{Body, CollisionGroup, EntityDesc, EntityId, EntityRef};
use super::geom::Rect;
use super::grid::TileGrid;
use super::kinematics::Kinematics;
use super::spatial::SpatialIndex;
use super::state::TickPhase;
use super::tile::{TileAttributes, TileId};
use crate::error::ConfigError;

/// Capabilities an entity implements to take part in collision
pub trait Behavior {
    /// Blocked by geometry; at most once per axis per tick
    fn on_collide_static(&mut self, _hit: &CollisionHit, _ctx: &mut SectorContext<'_>) {}

    /// Ran into another entity; the answer feeds the pair negotiation
    fn on_collide_entity(
        &mut self,
        _other: &EntityRef,
        _hit: &CollisionHit,
        _ctx: &mut SectorContext<'_>,
    ) -> HitResponse {
        HitResponse::Continue
    }

    /// Overlapping tiles with gameplay attributes (water, hazards, goals...)
    fn on_touch_advisory(&mut self, _attributes: TileAttributes, _ctx: &mut SectorContext<'_>) {}
}

/// Behaviour for entities with no logic of their own
#[derive(Debug, Clone, Copy, Default)]
pub struct Inert;

impl Behavior for Inert {}

/// Structural change waiting for the end of the tick
pub enum Mutation {
    Spawn {
        id: EntityId,
        body: Body,
        behavior: Box<dyn Behavior>,
    },
    Remove(EntityId),
    SetGroup(EntityId, CollisionGroup),
    SetBox(EntityId, Rect),
    SetKinematics(EntityId, Kinematics),
    SetVelocity(EntityId, Vec2),
}

impl std::fmt::Debug for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mutation::Spawn { id, body, .. } => f
                .debug_struct("Spawn")
                .field("id", id)
                .field("body", body)
                .finish_non_exhaustive(),
            Mutation::Remove(id) => f.debug_tuple("Remove").field(id).finish(),
            Mutation::SetGroup(id, g) => f.debug_tuple("SetGroup").field(id).field(g).finish(),
            Mutation::SetBox(id, b) => f.debug_tuple("SetBox").field(id).field(b).finish(),
            Mutation::SetKinematics(id, k) => {
                f.debug_tuple("SetKinematics").field(id).field(k).finish()
            }
            Mutation::SetVelocity(id, v) => {
                f.debug_tuple("SetVelocity").field(id).field(v).finish()
            }
        }
    }
}

/// View of the sector handed to behaviour callbacks
pub struct SectorContext<'a> {
    this: EntityId,
    tick: u64,
    phase: TickPhase,
    bodies: &'a [Body],
    grid: &'a mut TileGrid,
    pending: &'a mut Vec<Mutation>,
    next_id: &'a mut u32,
}

impl<'a> SectorContext<'a> {
    pub(crate) fn new(
        this: EntityId,
        tick: u64,
        phase: TickPhase,
        bodies: &'a [Body],
        grid: &'a mut TileGrid,
        pending: &'a mut Vec<Mutation>,
        next_id: &'a mut u32,
    ) -> Self {
        Self {
            this,
            tick,
            phase,
            bodies,
            grid,
            pending,
            next_id,
        }
    }

    /// Entity the callback runs for
    pub fn id(&self) -> EntityId {
        self.this
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Phase the callback was raised from
    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    pub fn grid(&self) -> &TileGrid {
        self.grid
    }

    pub fn bodies(&self) -> &[Body] {
        self.bodies
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &self.bodies[i])
    }

    /// This entity's physics record
    pub fn this_body(&self) -> Option<&Body> {
        self.body(self.this)
    }

    /// Tile and entity queries over the current sector state
    pub fn spatial(&self) -> SpatialIndex<'_> {
        SpatialIndex::new(self.grid, self.bodies)
    }

    /// Change this entity's group from the next tick on
    pub fn set_group(&mut self, group: CollisionGroup) {
        self.pending.push(Mutation::SetGroup(self.this, group));
    }

    /// Move or resize this entity from the next tick on
    pub fn set_box(&mut self, pos: Vec2, size: Vec2) -> Result<(), ConfigError> {
        let bbox = EntityDesc::new(pos, size, CollisionGroup::Disabled).bbox()?;
        self.pending.push(Mutation::SetBox(self.this, bbox));
        Ok(())
    }

    pub fn set_kinematics(&mut self, kinematics: Kinematics) {
        self.pending.push(Mutation::SetKinematics(self.this, kinematics));
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.pending.push(Mutation::SetVelocity(self.this, velocity));
    }

    /// Queue a new entity; its id is reserved right away
    pub fn spawn(
        &mut self,
        desc: EntityDesc,
        behavior: Box<dyn Behavior>,
    ) -> Result<EntityId, ConfigError> {
        let id = EntityId(*self.next_id);
        let body = Body::new(id, &desc)?;
        *self.next_id += 1;
        self.pending.push(Mutation::Spawn { id, body, behavior });
        Ok(id)
    }

    /// Queue removal of any entity (usually this one)
    pub fn remove(&mut self, id: EntityId) {
        self.pending.push(Mutation::Remove(id));
    }

    /// Replace a tile on the solid layer; takes effect immediately
    pub fn replace_tile(&mut self, x: i32, y: i32, id: TileId) -> Result<(), ConfigError> {
        let layer = self.grid.solid_layer_index();
        self.grid.replace_tile(layer, x, y, id)
    }

    /// Replace a tile on any layer; takes effect immediately
    pub fn replace_tile_in(
        &mut self,
        layer: usize,
        x: i32,
        y: i32,
        id: TileId,
    ) -> Result<(), ConfigError> {
        self.grid.replace_tile(layer, x, y, id)
    }
}
