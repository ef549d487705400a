//! Tile grid
//!
//! One or more layers of tile ids over a shared tile set. Exactly one layer is
//! the solid layer that physics reads; the others only carry ids for whoever
//! else consumes the grid.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use super::slope::Slope;
use super::tile::{Tile, TileDef, TileId, TileSet};
use crate::consts::TILE_SIZE;
use crate::error::{ConfigError, ResolveError};

/// Layer as handed over by a level loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDesc {
    pub width: usize,
    pub height: usize,
    /// Row-major tile ids
    pub tiles: Vec<TileId>,
    #[serde(default)]
    pub solid: bool,
}

/// Complete grid description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDesc {
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    pub tileset: Vec<TileDef>,
    pub layers: Vec<LayerDesc>,
}

fn default_cell_size() -> f32 {
    TILE_SIZE
}

/// Row-major tile id array
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    width: usize,
    height: usize,
    tiles: Vec<TileId>,
}

impl TileLayer {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    /// Tile id at a cell, 0 outside the layer
    pub fn get(&self, x: i32, y: i32) -> TileId {
        self.index(x, y).map_or(0, |i| self.tiles[i])
    }
}

/// Inclusive-exclusive cell rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl CellRange {
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + use<> {
        let (x0, x1) = (self.x0, self.x1);
        (self.y0..self.y1).flat_map(move |y| (x0..x1).map(move |x| (x, y)))
    }
}

/// Layers plus the tile set they index
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    cell_size: f32,
    tileset: TileSet,
    layers: Vec<TileLayer>,
    solid_layer: usize,
}

impl TileGrid {
    pub fn from_desc(desc: &GridDesc) -> Result<Self, ConfigError> {
        let tileset = TileSet::from_defs(&desc.tileset)?;
        Self::new(desc.cell_size, tileset, &desc.layers)
    }

    pub fn new(
        cell_size: f32,
        tileset: TileSet,
        layers: &[LayerDesc],
    ) -> Result<Self, ConfigError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ConfigError::InvalidSetting {
                field: "cell_size",
                reason: format!("must be positive, got {cell_size}"),
            });
        }

        let solid_count = layers.iter().filter(|l| l.solid).count();
        if solid_count != 1 {
            return Err(ConfigError::SolidLayerCount(solid_count));
        }

        let mut built = Vec::with_capacity(layers.len());
        let mut solid_layer = 0;
        for (index, layer) in layers.iter().enumerate() {
            let expected = layer.width * layer.height;
            if layer.tiles.len() != expected {
                return Err(ConfigError::LayerSizeMismatch {
                    layer: index,
                    expected,
                    actual: layer.tiles.len(),
                });
            }
            if let Some(&id) = layer.tiles.iter().find(|&&id| !tileset.contains(id)) {
                return Err(ConfigError::UnknownTileId { layer: index, id });
            }
            if layer.solid {
                solid_layer = index;
            }
            built.push(TileLayer {
                width: layer.width,
                height: layer.height,
                tiles: layer.tiles.clone(),
            });
        }

        log::debug!(
            "Tile grid built: {} layers, solid layer {}, {} tile kinds",
            built.len(),
            solid_layer,
            tileset.len()
        );

        Ok(Self {
            cell_size,
            tileset,
            layers: built,
            solid_layer,
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn tileset(&self) -> &TileSet {
        &self.tileset
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn solid_layer(&self) -> &TileLayer {
        &self.layers[self.solid_layer]
    }

    /// Solid-layer tile at a cell; empty outside the grid
    pub fn tile(&self, x: i32, y: i32) -> Tile {
        let id = self.solid_layer().get(x, y);
        self.tileset.get(id).copied().unwrap_or(Tile::EMPTY)
    }

    /// World rectangle of a cell
    pub fn cell_rect(&self, x: i32, y: i32) -> Rect {
        let min = Vec2::new(x as f32, y as f32) * self.cell_size;
        Rect::new(min, min + Vec2::splat(self.cell_size))
    }

    /// Cell containing a world point
    pub fn cell_at(&self, p: Vec2) -> (i32, i32) {
        let c = (p / self.cell_size).floor();
        (c.x as i32, c.y as i32)
    }

    /// Solid-layer cells whose interior intersects `region`, clamped to the grid
    pub fn cells_overlapping(&self, region: &Rect) -> CellRange {
        let layer = self.solid_layer();
        let lo = (region.min / self.cell_size).floor();
        let hi = (region.max / self.cell_size).ceil();
        let clamp = |v: f32, max: usize| v.clamp(0.0, max as f32) as i32;
        CellRange {
            x0: clamp(lo.x, layer.width),
            y0: clamp(lo.y, layer.height),
            x1: clamp(hi.x, layer.width),
            y1: clamp(hi.y, layer.height),
        }
    }

    /// Slope geometry for a cell, if the tile there is a slope
    pub fn slope_at(&self, x: i32, y: i32) -> Option<Result<Slope, ResolveError>> {
        let kind = self.tile(x, y).slope?;
        Some(Slope::new(kind, (x, y), self.cell_rect(x, y)))
    }

    /// Swap the tile at a cell; visible to every query from now on
    pub fn replace_tile(
        &mut self,
        layer: usize,
        x: i32,
        y: i32,
        id: TileId,
    ) -> Result<(), ConfigError> {
        if !self.tileset.contains(id) {
            return Err(ConfigError::UnknownTileId { layer, id });
        }
        let target = self
            .layers
            .get_mut(layer)
            .ok_or(ConfigError::CellOutOfBounds { x, y })?;
        let index = target
            .index(x, y)
            .ok_or(ConfigError::CellOutOfBounds { x, y })?;
        target.tiles[index] = id;
        log::debug!("Tile ({x}, {y}) on layer {layer} replaced with {id}");
        Ok(())
    }

    /// Index of the solid layer
    pub fn solid_layer_index(&self) -> usize {
        self.solid_layer
    }
}
