//! Entity records and collision groups

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use super::kinematics::Kinematics;
use crate::error::ConfigError;

/// Stable entity handle; ids are handed out in increasing order and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Opaque kind marker chosen by behaviour code (player, coin, platform...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct EntityTag(pub u32);

/// Which categories of bodies block, push or merely overlap each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionGroup {
    /// Immovable scenery everyone collides with
    Static,
    /// Normal dynamic body
    #[default]
    Moving,
    /// Dynamic, but scenery to other dynamics (loaded platform, frozen enemy)
    MovingStatic,
    /// Collides with Static/MovingStatic only, ignores peers
    MovingOnlyStatic,
    /// Overlap-only, never blocks
    Touchable,
    /// Excluded from every phase
    Disabled,
}

impl CollisionGroup {
    /// Resolved against static geometry
    pub fn is_mover(self) -> bool {
        matches!(
            self,
            CollisionGroup::Moving | CollisionGroup::MovingStatic | CollisionGroup::MovingOnlyStatic
        )
    }

    /// Paired against peers and touchables
    pub fn is_dynamic(self) -> bool {
        matches!(self, CollisionGroup::Moving | CollisionGroup::MovingStatic)
    }

    /// Acts as scenery for movers
    pub fn is_obstacle(self) -> bool {
        matches!(self, CollisionGroup::Static | CollisionGroup::MovingStatic)
    }

    pub fn is_active(self) -> bool {
        self != CollisionGroup::Disabled
    }
}

/// Registration request for a new entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityDesc {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    #[serde(default)]
    pub group: CollisionGroup,
    #[serde(default)]
    pub kinematics: Kinematics,
    #[serde(default)]
    pub tag: EntityTag,
}

impl EntityDesc {
    pub fn new(pos: Vec2, size: Vec2, group: CollisionGroup) -> Self {
        Self {
            pos,
            size,
            group,
            kinematics: Kinematics::default(),
            tag: EntityTag::default(),
        }
    }

    pub fn with_kinematics(mut self, kinematics: Kinematics) -> Self {
        self.kinematics = kinematics;
        self
    }

    pub fn with_tag(mut self, tag: EntityTag) -> Self {
        self.tag = tag;
        self
    }

    /// Bounding box, rejected when it is empty or not finite
    pub fn bbox(&self) -> Result<Rect, ConfigError> {
        let bbox = Rect::from_pos_size(self.pos, self.size);
        if !bbox.is_valid() {
            return Err(ConfigError::InvalidBox {
                pos: self.pos,
                size: self.size,
            });
        }
        Ok(bbox)
    }
}

/// Physics-side record of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    pub tag: EntityTag,
    pub group: CollisionGroup,
    /// Committed box
    pub bbox: Rect,
    /// Box proposed for the end of the current tick
    pub dest: Rect,
    /// Displacement produced by integration this tick
    pub movement: Vec2,
    pub kinematics: Kinematics,
}

impl Body {
    pub fn new(id: EntityId, desc: &EntityDesc) -> Result<Self, ConfigError> {
        let bbox = desc.bbox()?;
        Ok(Self {
            id,
            tag: desc.tag,
            group: desc.group,
            bbox,
            dest: bbox,
            movement: Vec2::ZERO,
            kinematics: desc.kinematics,
        })
    }

    /// Forget the proposed move
    pub fn freeze(&mut self) {
        self.dest = self.bbox;
        self.movement = Vec2::ZERO;
    }

    pub fn snapshot(&self) -> EntityRef {
        EntityRef {
            id: self.id,
            tag: self.tag,
            group: self.group,
            bbox: self.bbox,
            dest: self.dest,
            velocity: self.kinematics.velocity,
        }
    }
}

/// Read-only snapshot of the other party in a collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityRef {
    pub id: EntityId,
    pub tag: EntityTag,
    pub group: CollisionGroup,
    pub bbox: Rect,
    pub dest: Rect,
    pub velocity: Vec2,
}
