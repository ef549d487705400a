//! Sector state and core simulation types
//!
//! A sector owns everything one tick touches: the tile grid, the entity
//! registry with its behaviours, queued structural changes and the
//! diagnostics of recent ticks. Bodies are kept sorted by id, which is also
//! registration order, so every phase visits them in a stable order.

use std::collections::VecDeque;

use glam::Vec2;

use super::behavior::{Behavior, Mutation, SectorContext};
use super::entity::{Body, CollisionGroup, EntityDesc, EntityId};
use super::grid::{GridDesc, TileGrid};
use super::kinematics::Kinematics;
use super::spatial::SpatialIndex;
use super::tick::tick;
use super::tile::TileId;
use crate::error::{ConfigError, ResolveError};
use crate::settings::PhysicsSettings;

/// Longest frame `Sector::step` accepts before dropping time (seconds)
const MAX_FRAME_TIME: f32 = 0.1;

/// Stage of the tick currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPhase {
    /// Between ticks
    #[default]
    Idle,
    Integrate,
    StaticResolve,
    DynamicResolve,
    Commit,
    ApplyDeferredMutations,
}

/// Numerical problem contained to one entity for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostic {
    pub tick: u64,
    pub entity: EntityId,
    pub error: ResolveError,
}

/// Summary of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Movers run through the static resolver
    pub resolved: usize,
    /// Problems recorded during this tick
    pub diagnostics: Vec<Diagnostic>,
}

/// One self-contained level section and its entities
pub struct Sector {
    pub(crate) settings: PhysicsSettings,
    pub(crate) grid: TileGrid,
    /// Sorted by id
    pub(crate) bodies: Vec<Body>,
    /// Parallel to `bodies`
    pub(crate) behaviors: Vec<Box<dyn Behavior>>,
    pub(crate) pending: Vec<Mutation>,
    next_id: u32,
    pub(crate) tick: u64,
    pub(crate) phase: TickPhase,
    accumulator: f32,
    diagnostics: VecDeque<Diagnostic>,
}

impl Sector {
    pub fn new(grid: TileGrid, settings: PhysicsSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            settings,
            grid,
            bodies: Vec::new(),
            behaviors: Vec::new(),
            pending: Vec::new(),
            next_id: 1,
            tick: 0,
            phase: TickPhase::Idle,
            accumulator: 0.0,
            diagnostics: VecDeque::new(),
        })
    }

    /// Build the grid from its description, then the sector around it
    pub fn from_desc(desc: &GridDesc, settings: PhysicsSettings) -> Result<Self, ConfigError> {
        Self::new(TileGrid::from_desc(desc)?, settings)
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.index_of(id).map(|i| &self.bodies[i])
    }

    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    /// Ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Most recent diagnostics, oldest first
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain(..).collect()
    }

    /// World queries over the committed state
    pub fn spatial(&self) -> SpatialIndex<'_> {
        SpatialIndex::new(&self.grid, &self.bodies)
    }

    /// Register an entity; it takes part from the next tick on
    pub fn add_entity(
        &mut self,
        desc: EntityDesc,
        behavior: Box<dyn Behavior>,
    ) -> Result<EntityId, ConfigError> {
        let id = EntityId(self.next_id);
        let body = Body::new(id, &desc)?;
        self.next_id += 1;
        log::debug!("Added entity {:?} ({:?}) at {:?}", id, body.group, body.bbox.min);
        self.insert(body, behavior);
        Ok(id)
    }

    /// Returns false when the id is unknown
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        self.apply(Mutation::Remove(id))
    }

    pub fn set_group(&mut self, id: EntityId, group: CollisionGroup) -> bool {
        self.apply(Mutation::SetGroup(id, group))
    }

    pub fn set_velocity(&mut self, id: EntityId, velocity: Vec2) -> bool {
        self.apply(Mutation::SetVelocity(id, velocity))
    }

    pub fn set_kinematics(&mut self, id: EntityId, kinematics: Kinematics) -> bool {
        self.apply(Mutation::SetKinematics(id, kinematics))
    }

    /// Teleport or resize an entity
    pub fn set_box(&mut self, id: EntityId, pos: Vec2, size: Vec2) -> Result<bool, ConfigError> {
        let bbox = EntityDesc::new(pos, size, CollisionGroup::Disabled).bbox()?;
        Ok(self.apply(Mutation::SetBox(id, bbox)))
    }

    /// Replace a tile on the solid layer
    pub fn replace_tile(&mut self, x: i32, y: i32, id: TileId) -> Result<(), ConfigError> {
        let layer = self.grid.solid_layer_index();
        self.grid.replace_tile(layer, x, y, id)
    }

    pub fn replace_tile_in(
        &mut self,
        layer: usize,
        x: i32,
        y: i32,
        id: TileId,
    ) -> Result<(), ConfigError> {
        self.grid.replace_tile(layer, x, y, id)
    }

    /// Advance by a frame's worth of time using fixed substeps
    ///
    /// Returns the number of ticks run.
    pub fn step(&mut self, frame_time: f32) -> u32 {
        if frame_time.is_nan() || frame_time <= 0.0 {
            return 0;
        }
        let dt = self.settings.fixed_dt;
        self.accumulator += frame_time.min(MAX_FRAME_TIME);

        let mut substeps = 0;
        while self.accumulator >= dt && substeps < self.settings.max_substeps {
            tick(self, dt);
            self.accumulator -= dt;
            substeps += 1;
        }
        substeps
    }

    pub(crate) fn index_of(&self, id: EntityId) -> Option<usize> {
        self.bodies.binary_search_by_key(&id, |b| b.id).ok()
    }

    /// Run a behaviour callback for the body at `index`
    pub(crate) fn with_behavior<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut dyn Behavior, &mut SectorContext<'_>) -> R,
    ) -> R {
        let Self {
            grid,
            bodies,
            behaviors,
            pending,
            next_id,
            tick,
            phase,
            ..
        } = self;
        let mut ctx =
            SectorContext::new(bodies[index].id, *tick, *phase, bodies, grid, pending, next_id);
        f(behaviors[index].as_mut(), &mut ctx)
    }

    /// Freeze the body for this tick and keep a record of why
    pub(crate) fn contain(&mut self, index: usize, error: ResolveError) -> Diagnostic {
        let body = &mut self.bodies[index];
        body.freeze();
        body.kinematics.sanitize();
        let diagnostic = Diagnostic {
            tick: self.tick,
            entity: body.id,
            error,
        };
        log::warn!("Entity {:?} frozen on tick {}: {}", body.id, self.tick, error);

        if self.diagnostics.len() >= self.settings.diagnostics_capacity {
            self.diagnostics.pop_front();
        }
        if self.settings.diagnostics_capacity > 0 {
            self.diagnostics.push_back(diagnostic);
        }
        diagnostic
    }

    /// Apply everything behaviours queued this tick, in queue order
    pub(crate) fn apply_mutations(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for mutation in pending {
            self.apply(mutation);
        }
    }

    fn insert(&mut self, body: Body, behavior: Box<dyn Behavior>) {
        let at = self.bodies.partition_point(|b| b.id < body.id);
        self.bodies.insert(at, body);
        self.behaviors.insert(at, behavior);
    }

    fn apply(&mut self, mutation: Mutation) -> bool {
        log::debug!("Applying {:?}", mutation);
        let id = match &mutation {
            Mutation::Spawn { .. } => None,
            Mutation::Remove(id)
            | Mutation::SetGroup(id, _)
            | Mutation::SetBox(id, _)
            | Mutation::SetKinematics(id, _)
            | Mutation::SetVelocity(id, _) => Some(*id),
        };
        let index = match id {
            Some(id) => match self.index_of(id) {
                Some(index) => index,
                None => {
                    log::debug!("Ignoring mutation for unknown entity {:?}", id);
                    return false;
                }
            },
            None => 0,
        };

        match mutation {
            Mutation::Spawn { body, behavior, .. } => self.insert(body, behavior),
            Mutation::Remove(_) => {
                self.bodies.remove(index);
                self.behaviors.remove(index);
            }
            Mutation::SetGroup(_, group) => {
                let body = &mut self.bodies[index];
                body.group = group;
                body.freeze();
            }
            Mutation::SetBox(_, bbox) => {
                let body = &mut self.bodies[index];
                body.bbox = bbox;
                body.dest = bbox;
                body.movement = Vec2::ZERO;
            }
            Mutation::SetKinematics(_, kinematics) => self.bodies[index].kinematics = kinematics,
            Mutation::SetVelocity(_, velocity) => self.bodies[index].kinematics.velocity = velocity,
        }
        true
    }
}

impl std::fmt::Debug for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sector")
            .field("tick", &self.tick)
            .field("phase", &self.phase)
            .field("bodies", &self.bodies)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
