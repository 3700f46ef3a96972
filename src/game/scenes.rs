// Demo scenes for the headless host

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::math::{Real, Vector};
use crate::engine::physics::body::{presets, BodyBuilder};
use crate::engine::physics::shape::{random_convex_polygon, Shape};
use crate::engine::physics::{PhysicsResult, PhysicsWorld, RigidBody};

/// Scene name that does not match any known scene
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown scene '{0}' (expected one of: collision, stack, tunneling, spawn)")]
pub struct UnknownScene(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scene {
    /// A triangle dropped onto the floor
    Collision,
    /// A column of crates resting on the floor
    Stack,
    /// A fast projectile fired at a thin and a thick wall
    Tunneling,
    /// Random polygons, circles and boxes
    Spawn,
}

impl Scene {
    pub const ALL: [Scene; 4] = [Scene::Collision, Scene::Stack, Scene::Tunneling, Scene::Spawn];

    pub fn name(&self) -> &'static str {
        match self {
            Scene::Collision => "collision",
            Scene::Stack => "stack",
            Scene::Tunneling => "tunneling",
            Scene::Spawn => "spawn",
        }
    }

    /// Build a world populated with this scene. `seed` only affects `Spawn`.
    pub fn build(&self, seed: u64) -> PhysicsResult<PhysicsWorld> {
        let mut world = PhysicsWorld::new();
        world.add_body(floor()?);

        match self {
            Scene::Collision => collision(&mut world)?,
            Scene::Stack => stack(&mut world)?,
            Scene::Tunneling => tunneling(&mut world)?,
            Scene::Spawn => spawn(&mut world, &mut StdRng::seed_from_u64(seed))?,
        }

        info!("Scene '{}' ready with {} bodies", self.name(), world.len());
        Ok(world)
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scene {
    type Err = UnknownScene;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scene::ALL
            .into_iter()
            .find(|scene| scene.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownScene(s.to_string()))
    }
}

const FLOOR_Y: Real = -10.0;

fn floor() -> PhysicsResult<RigidBody> {
    presets::platform_body(10.0, FLOOR_Y, 200.0, 0.4)
}

fn collision(world: &mut PhysicsWorld) -> PhysicsResult<()> {
    let triangle = Shape::polygon(&[
        Vector::new(-1.0, -1.0),
        Vector::new(1.0, -1.0),
        Vector::new(0.0, 1.0),
    ])?;
    world.add_body(
        BodyBuilder::new_dynamic(triangle)
            .position(10.0, 0.0)
            .density(10.0)
            .build()?,
    );
    Ok(())
}

fn stack(world: &mut PhysicsWorld) -> PhysicsResult<()> {
    const HALF_SIZE: Real = 0.5;
    let floor_top = FLOOR_Y + 0.2;

    for level in 0..5 {
        let y = floor_top + HALF_SIZE + level as Real * 2.0 * HALF_SIZE;
        world.add_body(presets::crate_body(10.0, y, HALF_SIZE, 1.0)?);
    }
    Ok(())
}

fn tunneling(world: &mut PhysicsWorld) -> PhysicsResult<()> {
    world.add_body(presets::platform_body(13.0, -5.0, 0.4, 10.0)?);
    world.add_body(presets::platform_body(27.0, -5.0, 20.0, 10.0)?);

    let bullet = world.add_body(presets::projectile_body(-10.0, -5.0, 0.0, 0.0)?);
    world.apply_impulse(bullet, Vector::new(80.0, 0.0), Vector::ZERO)?;
    Ok(())
}

fn spawn(world: &mut PhysicsWorld, rng: &mut StdRng) -> PhysicsResult<()> {
    for i in 0..5 {
        let x = i as Real * 4.0;

        let density = rng.gen_range(5..15) as Real;
        let polygon = random_shape(rng)?.with_color(random_color(rng));
        world.add_body(
            BodyBuilder::new_dynamic(polygon)
                .position(x, 0.0)
                .density(density)
                .build()?,
        );

        let radius = rng.gen_range(0..10) as Real * 0.05 + 1.0;
        let ball = Shape::circle(radius)?.with_color(random_color(rng));
        world.add_body(BodyBuilder::new_dynamic(ball).position(x, 5.0).build()?);

        let half_width = rng.gen_range(0.3..1.5);
        let half_height = rng.gen_range(0.3..1.5);
        let rect = Shape::rect(half_width, half_height)?.with_color(random_color(rng));
        world.add_body(BodyBuilder::new_dynamic(rect).position(x, 10.0).build()?);
    }
    Ok(())
}

fn random_color(rng: &mut StdRng) -> u32 {
    rng.gen_range(0..0x100_0000)
}

/// Random convex polygon about three units across.
/// Falls back to a square if the generator keeps producing slivers.
fn random_shape(rng: &mut StdRng) -> PhysicsResult<Shape> {
    const ATTEMPTS: usize = 8;

    for _ in 0..ATTEMPTS {
        let count = rng.gen_range(3..8);
        let vertices: Vec<Vector> = random_convex_polygon(rng, count)
            .into_iter()
            .map(|v| v * 3.0)
            .collect();
        match Shape::polygon(&vertices) {
            Ok(shape) => return Ok(shape),
            Err(err) => debug!("Discarding random polygon: {}", err),
        }
    }
    Shape::rect(1.0, 1.0)
}
