//! Test worlds drawn as ASCII rows

use glam::Vec2;

use super::entity::{Body, CollisionGroup, EntityDesc, EntityId};
use super::grid::{LayerDesc, TileGrid};
use super::kinematics::Kinematics;
use super::tile::{TileAttributes, TileDef, TileSet};

pub const CELL: f32 = 32.0;

fn def(attributes: TileAttributes, slope: Option<u8>) -> TileDef {
    TileDef {
        attributes: attributes.bits(),
        slope,
    }
}

/// Legend: `#` solid, `-` one-way, `~` water, `I` ice floor, `H` hurts,
/// `\` south-west slope, `/` south-east slope, `N` north-east ceiling,
/// `W` north-west ceiling, `g` gentle south-east (bottom half), `G` gentle
/// south-east (top half)
pub fn grid(rows: &[&str]) -> TileGrid {
    let tileset = TileSet::from_defs(&[
        def(TileAttributes::SOLID, None),
        def(TileAttributes::UNISOLID, None),
        def(TileAttributes::WATER, None),
        def(TileAttributes::SOLID | TileAttributes::ICE, None),
        def(TileAttributes::empty(), Some(0x00)),
        def(TileAttributes::empty(), Some(0x02)),
        def(TileAttributes::empty(), Some(0x01)),
        def(TileAttributes::empty(), Some(0x03)),
        def(TileAttributes::HURTS, None),
        def(TileAttributes::empty(), Some(0x12)),
        def(TileAttributes::empty(), Some(0x22)),
    ])
    .unwrap();

    let width = rows[0].chars().count();
    let tiles = rows
        .iter()
        .flat_map(|r| {
            r.chars().map(|c| match c {
                '#' => 1,
                '-' => 2,
                '~' => 3,
                'I' => 4,
                '\\' => 5,
                '/' => 6,
                'N' => 7,
                'W' => 8,
                'H' => 9,
                'g' => 10,
                'G' => 11,
                _ => 0,
            })
        })
        .collect();

    TileGrid::new(
        CELL,
        tileset,
        &[LayerDesc {
            width,
            height: rows.len(),
            tiles,
            solid: true,
        }],
    )
    .unwrap()
}

/// Body with the proposed move already integrated
pub fn moving_body(id: u32, pos: Vec2, size: Vec2, group: CollisionGroup, movement: Vec2) -> Body {
    let desc = EntityDesc::new(pos, size, group).with_kinematics(Kinematics::floating());
    let mut body = Body::new(EntityId(id), &desc).unwrap();
    body.movement = movement;
    body.dest = body.bbox.translated(movement);
    body
}
