//! Deterministic simulation module
//!
//! All movement and collision logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (registration order, which is id order)
//! - No hash containers, no clocks, no global state
//! - Numerical trouble is contained per entity, never a panic

pub mod behavior;
pub mod collision;
pub mod entity;
pub mod geom;
pub mod grid;
pub mod kinematics;
pub mod resolve_dynamic;
pub mod resolve_static;
pub mod slope;
pub mod spatial;
pub mod state;
pub mod tick;
pub mod tile;

#[cfg(test)]
mod fixtures;

pub use behavior::{Behavior, Inert, SectorContext};
pub use collision::{CollisionHit, HitResponse};
pub use entity::{Body, CollisionGroup, EntityDesc, EntityId, EntityRef, EntityTag};
pub use geom::{Axis, Rect};
pub use grid::{GridDesc, LayerDesc, TileGrid};
pub use kinematics::Kinematics;
pub use slope::{Slope, SlopeDeform, SlopeDirection, SlopeType};
pub use spatial::{LineHit, LineTarget, SpatialIndex};
pub use state::{Diagnostic, Sector, TickPhase, TickReport};
pub use tick::tick;
pub use tile::{Tile, TileAttributes, TileDef, TileId, TileSet};
