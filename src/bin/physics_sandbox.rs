//! Physics Sandbox - Headless Scenario Runner
//!
//! Run with: `cargo run --bin physics_sandbox -- --steps 240 -v`
//!
//! Runs three small scenes against the engine and logs what happened:
//! - drop: a ball falling onto a static floor
//! - hinge: a motorized door swinging up to its limit
//! - platform: a character riding a kinematic platform, mirrored by a ghost

use std::cell::Cell;
use std::f32::consts::{FRAC_PI_2, PI};
use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, ValueEnum};
use glam::Vec3;
use kinema_engine::character::{CharacterConfig, CharacterController};
use kinema_engine::physics::{
    Constraint, Cuboid, GhostObject, Hinge, PhysicsWorld, RigidBody, Sphere, WorldConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    Drop,
    Hinge,
    Platform,
    All,
}

#[derive(Debug, Parser)]
#[command(about = "Run headless physics scenarios and log the results")]
struct Args {
    /// World configuration file (JSON). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Character configuration file (JSON) for the platform scene.
    #[arg(long)]
    character: Option<PathBuf>,

    /// Scene to run
    #[arg(long, value_enum, default_value = "all")]
    scenario: Scenario,

    /// Number of fixed steps per scene
    #[arg(long, default_value_t = 240)]
    steps: u32,

    /// Log at debug level (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    use simplelog::LevelFilter::{Debug, Info, Off, Trace};
    let level = match args.verbose {
        0 => Info,
        1 => Debug,
        _ => Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .set_target_level(Off)
            .set_location_level(Off)
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let world_config = match &args.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    let character_config = match &args.character {
        Some(path) => CharacterConfig::load(path)?,
        None => CharacterConfig::default(),
    };

    let run_all = args.scenario == Scenario::All;
    if run_all || args.scenario == Scenario::Drop {
        drop_scene(&world_config, args.steps)?;
    }
    if run_all || args.scenario == Scenario::Hinge {
        hinge_scene(&world_config, args.steps)?;
    }
    if run_all || args.scenario == Scenario::Platform {
        platform_scene(&world_config, &character_config, args.steps)?;
    }
    Ok(())
}

fn drop_scene(config: &WorldConfig, steps: u32) -> anyhow::Result<()> {
    let mut world = PhysicsWorld::with_config(config.clone())?;
    world.add_rigid_body(
        RigidBody::fixed(Cuboid::new(Vec3::new(10.0, 0.5, 10.0)))
            .with_position(Vec3::new(0.0, -0.5, 0.0)),
    )?;
    let ball = world.add_rigid_body(
        RigidBody::dynamic(1.0, Sphere::new(0.5)).with_position(Vec3::new(0.0, 10.0, 0.0)),
    )?;

    let contacts = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&contacts);
    world.on_collision(move |contact| {
        counter.set(counter.get() + 1);
        log::trace!("drop: contact at {:?} depth {:.3}", contact.point, contact.penetration_depth);
    })?;

    let time_step = world.config().time_step;
    for _ in 0..steps {
        world.step(time_step)?;
    }

    if let Some(body) = world.body(ball) {
        log::info!(
            "drop: ball at y = {:.3}, vy = {:.3} after {} steps ({} contacts reported)",
            body.position().y,
            body.linear_velocity().y,
            world.step_count(),
            contacts.get()
        );
    }
    Ok(())
}

fn hinge_scene(config: &WorldConfig, steps: u32) -> anyhow::Result<()> {
    let mut world = PhysicsWorld::with_config(config.clone())?;
    world.set_gravity(Vec3::ZERO)?;

    let frame = world.add_rigid_body(RigidBody::fixed(Sphere::new(0.1)))?;
    let door = world.add_rigid_body(
        RigidBody::dynamic(10.0, Sphere::new(0.5)).with_position(Vec3::new(1.0, 0.0, 0.0)),
    )?;
    let mut hinge = Hinge::new(Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0), Vec3::Y, Vec3::Y);
    hinge.set_limit(0.0, FRAC_PI_2);
    hinge.enable_angular_motor(PI, 200.0);
    let handle = world.add_constraint(Constraint::new(frame, Some(door), hinge))?;

    let time_step = world.config().time_step;
    for step in 0..steps {
        world.step(time_step)?;
        if step % 60 == 0 {
            log::debug!("hinge: step {step} angle {:.3}", world.hinge_angle(handle).unwrap_or(0.0));
        }
    }

    let angle = world.hinge_angle(handle).unwrap_or(0.0);
    let position = world.body(door).map(|b| b.position()).unwrap_or(Vec3::ZERO);
    log::info!(
        "hinge: door angle {:.3} rad (limit {:.3}), door at {:?}",
        angle,
        FRAC_PI_2,
        position
    );
    Ok(())
}

fn platform_scene(
    config: &WorldConfig,
    character_config: &CharacterConfig,
    steps: u32,
) -> anyhow::Result<()> {
    let mut world = PhysicsWorld::with_config(config.clone())?;
    world.add_rigid_body(
        RigidBody::fixed(Cuboid::new(Vec3::new(4.0, 0.5, 4.0)))
            .with_position(Vec3::new(-4.0, -0.5, 0.0)),
    )?;
    let platform = world.add_rigid_body(
        RigidBody::kinematic(Cuboid::new(Vec3::new(2.0, 0.25, 2.0)))
            .with_position(Vec3::new(2.0, -0.25, 0.0)),
    )?;

    let spawn = Vec3::new(-2.0, 0.02, 0.0);
    let mut controller = CharacterController::new(character_config.clone(), spawn);
    let ghost = world.add_collision_object(GhostObject::with_shape(
        controller.ghost_shape(),
        controller.ghost_position(),
    ))?;

    let dt = world.config().time_step;
    let walk_speed = 3.0;
    let platform_speed = 1.0;
    for frame in 0..steps {
        // The platform drifts away along +X after the character has had time to board it
        let t = frame as f32 * dt;
        let platform_x = 2.0 + (t - 2.0).max(0.0) * platform_speed;
        if let Some(body) = world.body_mut(platform) {
            body.set_position(Vec3::new(platform_x, -0.25, 0.0));
        }

        world.step(dt)?;

        let walking = controller.position().x < 2.0;
        let walk = if walking { Vec3::X * walk_speed * dt } else { Vec3::ZERO };
        let state = controller.update(&world, dt, walk, false);
        world.set_collision_object_position(ghost, controller.ghost_position())?;

        if frame % 60 == 0 {
            log::debug!(
                "platform: frame {frame} feet {:?} grounded {} carry {:?}",
                state.position,
                state.ground.is_on_ground,
                state.platform_velocity
            );
        }
    }

    let on_platform = controller.ground().ground_object == Some(platform.into());
    log::info!(
        "platform: character at {:?}, on platform: {}, carried at {:?}",
        controller.position(),
        on_platform,
        controller.platform_tracker().velocity()
    );
    Ok(())
}
