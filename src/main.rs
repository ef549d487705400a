//! Tilephys demo entry point
//!
//! Lays out a seeded test sector, runs it for a few simulated seconds and logs
//! what happened. Usage: `tilephys [seed] [settings.json]`

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use tilephys::consts::*;
use tilephys::sim::{
    Behavior, CollisionGroup, CollisionHit, EntityDesc, EntityRef, GridDesc, HitResponse,
    Kinematics, LayerDesc, Sector, SectorContext, TileAttributes, TileDef,
};
use tilephys::{ConfigError, PhysicsSettings};

const WIDTH: usize = 40;
const HEIGHT: usize = 15;
const WALKERS: usize = 12;
const FRAMES: u32 = 600;

const EMPTY: u32 = 0;
const SOLID: u32 = 1;
const RAMP_UP: u32 = 2;
const RAMP_DOWN: u32 = 3;
const WATER: u32 = 4;
const ONE_WAY: u32 = 5;

/// Walks until it hits a wall, then turns around
struct Walker {
    speed: f32,
}

impl Behavior for Walker {
    fn on_collide_static(&mut self, hit: &CollisionHit, ctx: &mut SectorContext<'_>) {
        if hit.crush {
            log::info!("Entity {:?} crushed on tick {}", ctx.id(), ctx.tick());
            ctx.remove(ctx.id());
            return;
        }
        let Some(velocity) = ctx.this_body().map(|b| b.kinematics.velocity) else {
            return;
        };
        if hit.left || hit.right {
            self.speed = -self.speed;
            ctx.set_velocity(Vec2::new(self.speed, velocity.y));
        } else if hit.bottom || hit.top {
            ctx.set_velocity(Vec2::new(self.speed, 0.0));
        }
    }

    fn on_collide_entity(
        &mut self,
        _other: &EntityRef,
        _hit: &CollisionHit,
        _ctx: &mut SectorContext<'_>,
    ) -> HitResponse {
        HitResponse::Block
    }

    fn on_touch_advisory(&mut self, attributes: TileAttributes, ctx: &mut SectorContext<'_>) {
        if attributes.contains(TileAttributes::WATER) {
            log::trace!("Entity {:?} is swimming", ctx.id());
        }
    }
}

/// Horizontal platform bouncing between walls
struct Shuttle {
    speed: f32,
}

impl Behavior for Shuttle {
    fn on_collide_static(&mut self, hit: &CollisionHit, ctx: &mut SectorContext<'_>) {
        if hit.left || hit.right {
            self.speed = -self.speed;
            ctx.set_velocity(Vec2::new(self.speed, 0.0));
        }
    }
}

fn build_grid(rng: &mut Pcg32) -> GridDesc {
    let mut tiles = vec![EMPTY; WIDTH * HEIGHT];
    let mut set = |x: usize, y: usize, id: u32| tiles[y * WIDTH + x] = id;

    for x in 0..WIDTH {
        set(x, HEIGHT - 1, SOLID);
    }
    for y in 0..HEIGHT {
        set(0, y, SOLID);
        set(WIDTH - 1, y, SOLID);
    }

    // Ramps and bumps along the floor
    let mut x = 3;
    while x < WIDTH - 4 {
        match rng.random_range(0..4) {
            0 => {
                set(x, HEIGHT - 2, RAMP_UP);
                set(x + 1, HEIGHT - 2, SOLID);
                set(x + 2, HEIGHT - 2, RAMP_DOWN);
            }
            1 => set(x, HEIGHT - 2, WATER),
            _ => {}
        }
        x += rng.random_range(4..7);
    }

    // Floating one-way ledges
    for _ in 0..5 {
        let y = rng.random_range(4..HEIGHT - 4);
        let x0 = rng.random_range(2..WIDTH - 6);
        for x in x0..x0 + 3 {
            set(x, y, ONE_WAY);
        }
    }

    GridDesc {
        cell_size: TILE_SIZE,
        tileset: vec![
            TileDef {
                attributes: TileAttributes::SOLID.bits(),
                slope: None,
            },
            TileDef {
                attributes: TileAttributes::empty().bits(),
                slope: Some(0x02),
            },
            TileDef {
                attributes: TileAttributes::empty().bits(),
                slope: Some(0x00),
            },
            TileDef {
                attributes: TileAttributes::WATER.bits(),
                slope: None,
            },
            TileDef {
                attributes: TileAttributes::UNISOLID.bits(),
                slope: None,
            },
        ],
        layers: vec![LayerDesc {
            width: WIDTH,
            height: HEIGHT,
            tiles,
            solid: true,
        }],
    }
}

fn build_sector(seed: u64, settings: PhysicsSettings) -> Result<Sector, ConfigError> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut sector = Sector::from_desc(&build_grid(&mut rng), settings)?;

    for _ in 0..WALKERS {
        let x = rng.random_range(2.0..(WIDTH as f32 - 3.0)) * TILE_SIZE;
        let y = rng.random_range(1.0..4.0) * TILE_SIZE;
        let speed = rng.random_range(40.0..160.0) * if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let desc = EntityDesc::new(Vec2::new(x, y), Vec2::new(16.0, 24.0), CollisionGroup::Moving)
            .with_kinematics(Kinematics::default().with_velocity(Vec2::new(speed, 0.0)));
        sector.add_entity(desc, Box::new(Walker { speed }))?;
    }

    let desc = EntityDesc::new(
        Vec2::new(4.0 * TILE_SIZE, 8.0 * TILE_SIZE),
        Vec2::new(3.0 * TILE_SIZE, 16.0),
        CollisionGroup::MovingStatic,
    )
    .with_kinematics(Kinematics::floating().with_velocity(Vec2::new(60.0, 0.0)));
    sector.add_entity(desc, Box::new(Shuttle { speed: 60.0 }))?;

    Ok(sector)
}

fn run(seed: u64, settings: PhysicsSettings) -> Result<(), ConfigError> {
    let mut sector = build_sector(seed, settings)?;
    log::info!(
        "Sector ready: {}x{} cells, {} entities",
        WIDTH,
        HEIGHT,
        sector.bodies().len()
    );

    let mut ticks = 0;
    for _ in 0..FRAMES {
        ticks += sector.step(SIM_DT);
    }

    log::info!("Ran {} ticks ({} total)", ticks, sector.tick_count());
    for body in sector.bodies() {
        log::info!(
            "  {:?} {:?} at ({:.1}, {:.1}) moving {:?}",
            body.id,
            body.group,
            body.bbox.min.x,
            body.bbox.min.y,
            body.kinematics.velocity
        );
    }
    let diagnostics = sector.take_diagnostics();
    if !diagnostics.is_empty() {
        log::warn!("{} diagnostics recorded", diagnostics.len());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Tilephys demo starting...");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(12345);
    let settings = match args.next() {
        Some(path) => match PhysicsSettings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to load settings from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => PhysicsSettings::default(),
    };
    log::info!("Seed: {}", seed);

    if let Err(e) = run(seed, settings) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}
