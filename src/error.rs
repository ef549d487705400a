//! Error types
//!
//! Configuration errors are surfaced to whoever builds a sector. Numerical
//! problems never leave the tick loop; they freeze the offending entity and
//! are recorded as diagnostics instead.

use glam::Vec2;

/// Rejected input at load or registration time
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Entity box with a zero, negative or non-finite extent
    #[error("invalid bounding box: position {pos:?}, size {size:?}")]
    InvalidBox { pos: Vec2, size: Vec2 },

    /// Tile attribute mask with bits outside the known set
    #[error("unknown tile attribute bits {0:#06x}")]
    UnknownTileAttributes(u32),

    /// Slope code that is not a valid direction/deformation pair
    #[error("unknown slope code {0:#04x}")]
    UnknownSlopeCode(u8),

    /// Tile flagged as a slope without a slope code
    #[error("tile {0} has the slope attribute but no slope code")]
    MissingSlopeCode(u32),

    /// Layer references a tile id the tile set does not define
    #[error("layer {layer} references unknown tile id {id}")]
    UnknownTileId { layer: usize, id: u32 },

    /// Layer data length disagrees with its declared dimensions
    #[error("layer {layer} has {actual} cells, expected {expected}")]
    LayerSizeMismatch {
        layer: usize,
        expected: usize,
        actual: usize,
    },

    /// The grid needs exactly one authoritative solid layer
    #[error("expected exactly one solid layer, found {0}")]
    SolidLayerCount(usize),

    /// Cell outside the grid passed to a tile mutation
    #[error("cell ({x}, {y}) is outside the grid")]
    CellOutOfBounds { x: i32, y: i32 },

    /// Settings value out of range
    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Numerical degeneracy hit while resolving one entity
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ResolveError {
    /// Velocity or displacement contained NaN or infinity
    #[error("non-finite movement {0:?}")]
    NonFiniteMovement(Vec2),

    /// Slope whose hypotenuse collapsed to a point or an axis line
    #[error("degenerate slope at cell ({x}, {y})")]
    DegenerateSlope { x: i32, y: i32 },
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}
