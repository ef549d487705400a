//! Tile attributes and the tile set
//!
//! A tile set maps tile ids to attribute masks and optional slope shapes.
//! Id 0 is always the empty tile.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::slope::SlopeType;
use crate::error::ConfigError;

/// Index into a tile set
pub type TileId = u32;

bitflags! {
    /// Per-tile attribute mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TileAttributes: u32 {
        const SOLID = 0x0001;
        /// Solid only from above
        const UNISOLID = 0x0002;
        const BRICK = 0x0004;
        const GOAL = 0x0008;
        const SLOPE = 0x0010;
        /// Collectible container
        const FULLBOX = 0x0020;
        const COIN = 0x0040;
        const ICE = 0x0100;
        const WATER = 0x0200;
        const HURTS = 0x0400;
        const FIRE = 0x0800;
        const WALLJUMP = 0x1000;
    }
}

impl TileAttributes {
    /// Attributes reported through advisory touch events
    pub const ADVISORY: Self = Self::ICE
        .union(Self::WATER)
        .union(Self::HURTS)
        .union(Self::FIRE)
        .union(Self::WALLJUMP)
        .union(Self::GOAL)
        .union(Self::FULLBOX)
        .union(Self::COIN);

    /// Advisory bits that are also reported for the row under the feet
    pub const UNDERFOOT: Self = Self::ICE;
}

/// Raw tile description as a level loader hands it over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDef {
    #[serde(default)]
    pub attributes: u32,
    #[serde(default)]
    pub slope: Option<u8>,
}

/// Validated tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tile {
    pub attributes: TileAttributes,
    pub slope: Option<SlopeType>,
}

impl Tile {
    pub const EMPTY: Tile = Tile {
        attributes: TileAttributes::empty(),
        slope: None,
    };

    pub fn solid() -> Self {
        Self {
            attributes: TileAttributes::SOLID,
            slope: None,
        }
    }

    pub fn is_solid(&self) -> bool {
        self.attributes.contains(TileAttributes::SOLID)
    }

    pub fn is_unisolid(&self) -> bool {
        self.attributes.contains(TileAttributes::UNISOLID)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    fn from_def(id: TileId, def: &TileDef) -> Result<Self, ConfigError> {
        let mut attributes = TileAttributes::from_bits(def.attributes)
            .ok_or(ConfigError::UnknownTileAttributes(def.attributes))?;
        let slope = match def.slope {
            Some(code) => {
                attributes |= TileAttributes::SOLID | TileAttributes::SLOPE;
                Some(SlopeType::from_code(code)?)
            }
            None if attributes.contains(TileAttributes::SLOPE) => {
                return Err(ConfigError::MissingSlopeCode(id));
            }
            None => None,
        };
        if attributes.contains(TileAttributes::UNISOLID) {
            attributes |= TileAttributes::SOLID;
        }
        Ok(Self { attributes, slope })
    }
}

/// Attribute and slope table indexed by tile id
#[derive(Debug, Clone, PartialEq)]
pub struct TileSet {
    tiles: Vec<Tile>,
}

impl Default for TileSet {
    fn default() -> Self {
        Self {
            tiles: vec![Tile::EMPTY],
        }
    }
}

impl TileSet {
    /// Build a tile set; `defs[i]` becomes tile id `i + 1`
    pub fn from_defs(defs: &[TileDef]) -> Result<Self, ConfigError> {
        let mut set = Self::default();
        for def in defs {
            set.push(*def)?;
        }
        Ok(set)
    }

    /// Append a tile definition, returning its id
    pub fn push(&mut self, def: TileDef) -> Result<TileId, ConfigError> {
        let id = self.tiles.len() as TileId;
        let tile = Tile::from_def(id, &def)?;
        self.tiles.push(tile);
        Ok(id)
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id as usize)
    }

    pub fn contains(&self, id: TileId) -> bool {
        (id as usize) < self.tiles.len()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.len() <= 1
    }
}
