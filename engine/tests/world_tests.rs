//! World Tests - Integration, Listeners, Lifecycle and Configuration
//!
//! Drives a full PhysicsWorld through its public API: gravity integration,
//! damping, contact and trigger reporting, ghost objects, lifecycle errors and
//! JSON configuration files.

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use glam::Vec3;
use kinema_engine::physics::{
    BroadphaseType, CollisionContact, CollisionGroups, CollisionObjectHandle, Constraint,
    Cuboid, GhostObject, PhysicsError, PhysicsWorld, PointToPoint, RigidBody, Sphere,
    WorldConfig,
};
use rstest::rstest;

const DT: f32 = 1.0 / 60.0;

fn zero_g_world() -> PhysicsWorld {
    PhysicsWorld::with_config(WorldConfig::with_gravity(Vec3::ZERO)).unwrap()
}

// ============================================================================
// Integration
// ============================================================================

#[test]
fn test_free_fall_one_second() {
    let mut world = PhysicsWorld::new();
    let ball = world
        .add_rigid_body(
            RigidBody::dynamic(1.0, Sphere::new(0.5)).with_position(Vec3::new(0.0, 10.0, 0.0)),
        )
        .unwrap();

    for _ in 0..60 {
        world.step(DT).unwrap();
    }

    let body = world.body(ball).unwrap();
    let expected = 10.0 - 0.5 * 9.81;
    assert_abs_diff_eq!(body.position().y, expected, epsilon = 0.1);
    assert_abs_diff_eq!(body.linear_velocity().y, -9.81, epsilon = 1e-3);
    assert_eq!(world.step_count(), 60);
}

#[rstest]
#[case(0.0)]
#[case(0.5)]
#[case(2.0)]
fn test_damped_fall_velocity(#[case] damping: f32) {
    let mut world = PhysicsWorld::new();
    let ball = world
        .add_rigid_body(RigidBody::dynamic(2.0, Sphere::new(0.5)).with_damping(damping, 0.0))
        .unwrap();

    let steps = 90;
    let mut expected = 0.0f32;
    for _ in 0..steps {
        world.step(DT).unwrap();
        expected = (expected - 9.81 * DT) * (1.0 - damping * DT);
    }

    let vy = world.body(ball).unwrap().linear_velocity().y;
    assert_abs_diff_eq!(vy, expected, epsilon = 1e-3);
    let undamped = -9.81 * steps as f32 * DT;
    assert!(vy >= undamped - 1e-3);
}

#[test]
fn test_static_and_kinematic_bodies_ignore_gravity() {
    let mut world = PhysicsWorld::new();
    let floor = world
        .add_rigid_body(RigidBody::fixed(Cuboid::new(Vec3::new(5.0, 0.5, 5.0))))
        .unwrap();
    let platform = world
        .add_rigid_body(
            RigidBody::kinematic(Cuboid::new(Vec3::ONE))
                .with_position(Vec3::new(0.0, 3.0, 0.0))
                .with_linear_velocity(Vec3::new(1.0, 0.0, 0.0)),
        )
        .unwrap();

    for _ in 0..60 {
        world.step(DT).unwrap();
    }

    assert_eq!(world.body(floor).unwrap().position(), Vec3::ZERO);
    // Kinematic bodies only move when the caller moves them
    assert_eq!(world.body(platform).unwrap().position(), Vec3::new(0.0, 3.0, 0.0));
}

#[test]
fn test_advance_keeps_remainder() {
    let config = WorldConfig {
        time_step: 0.25,
        ..WorldConfig::default()
    };
    let mut world = PhysicsWorld::with_config(config).unwrap();
    let steps = world.advance(0.625).unwrap();
    assert_eq!(steps, 2);
    assert_eq!(world.accumulated_time(), 0.125);

    let steps = world.advance(0.125).unwrap();
    assert_eq!(steps, 1);
    assert_eq!(world.step_count(), 3);
}

// ============================================================================
// Contacts and triggers
// ============================================================================

#[test]
fn test_collision_callback_and_listeners() {
    let mut world = zero_g_world();
    let a = world.add_rigid_body(RigidBody::dynamic(1.0, Sphere::new(1.0))).unwrap();
    let b = world
        .add_rigid_body(
            RigidBody::dynamic(1.0, Sphere::new(1.0)).with_position(Vec3::new(1.5, 0.0, 0.0)),
        )
        .unwrap();

    let from_callback: Rc<RefCell<Vec<CollisionContact>>> = Rc::default();
    let sink = Rc::clone(&from_callback);
    world
        .set_collision_callback(move |contact: &CollisionContact| sink.borrow_mut().push(*contact))
        .unwrap();

    let listener_hits = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&listener_hits);
    world.on_collision(move |_| *counter.borrow_mut() += 1).unwrap();

    world.step(DT).unwrap();

    let contacts = from_callback.borrow();
    assert_eq!(contacts.len(), 1);
    let contact = contacts[0];
    assert!(contact.involves(a) && contact.involves(b));
    assert_abs_diff_eq!(contact.penetration_depth, 0.5, epsilon = 1e-5);
    assert_abs_diff_eq!(contact.normal.x, 1.0, epsilon = 1e-5);
    assert_eq!(*listener_hits.borrow(), 1);
}

#[test]
fn test_static_pairs_are_not_reported() {
    let mut world = zero_g_world();
    world.add_rigid_body(RigidBody::fixed(Sphere::new(1.0))).unwrap();
    world
        .add_rigid_body(RigidBody::fixed(Sphere::new(1.0)).with_position(Vec3::new(0.5, 0.0, 0.0)))
        .unwrap();

    let hits = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&hits);
    world.on_collision(move |_| *counter.borrow_mut() += 1).unwrap();
    world.step(DT).unwrap();
    assert_eq!(*hits.borrow(), 0);
}

#[test]
fn test_filtered_pairs_are_not_reported() {
    let mut world = zero_g_world();
    world
        .add_rigid_body(
            RigidBody::dynamic(1.0, Sphere::new(1.0))
                .with_groups(CollisionGroups::DEFAULT, CollisionGroups::STATIC),
        )
        .unwrap();
    world
        .add_rigid_body(
            RigidBody::dynamic(1.0, Sphere::new(1.0)).with_position(Vec3::new(0.5, 0.0, 0.0)),
        )
        .unwrap();

    let hits = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&hits);
    world.on_collision(move |_| *counter.borrow_mut() += 1).unwrap();
    world.step(DT).unwrap();
    assert_eq!(*hits.borrow(), 0);
}

#[test]
fn test_trigger_enter_and_exit_fire_once() {
    let mut world = PhysicsWorld::new();
    let zone = world
        .add_rigid_body(RigidBody::fixed(Sphere::new(1.0)).as_trigger())
        .unwrap();
    let ball = world
        .add_rigid_body(
            RigidBody::dynamic(1.0, Sphere::new(0.25))
                .with_position(Vec3::new(0.0, 2.0, 0.0))
                .with_linear_velocity(Vec3::new(0.0, -4.0, 0.0)),
        )
        .unwrap();

    let entered = Rc::new(RefCell::new(Vec::new()));
    let exited = Rc::new(RefCell::new(Vec::new()));
    let enter_sink = Rc::clone(&entered);
    let exit_sink = Rc::clone(&exited);
    world
        .on_trigger_enter(move |c| enter_sink.borrow_mut().push(c.other(zone)))
        .unwrap();
    world
        .on_trigger_exit(move |c| exit_sink.borrow_mut().push(c.other(zone)))
        .unwrap();

    // Falls straight through the zone
    for _ in 0..90 {
        world.step(DT).unwrap();
    }

    let ball: CollisionObjectHandle = ball.into();
    assert_eq!(*entered.borrow(), vec![Some(ball)]);
    assert_eq!(*exited.borrow(), vec![Some(ball)]);
}

#[test]
fn test_trigger_is_invisible_to_raycast() {
    let mut world = zero_g_world();
    world
        .add_rigid_body(RigidBody::fixed(Sphere::new(1.0)).as_trigger())
        .unwrap();
    let hit = world
        .raycast(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0), CollisionGroups::ALL)
        .unwrap();
    assert!(hit.is_none());

    let overlapping = world.sphere_cast(Vec3::ZERO, 0.5, CollisionGroups::ALL).unwrap();
    assert_eq!(overlapping.len(), 1);
}

// ============================================================================
// Ghost objects
// ============================================================================

#[test]
fn test_ghost_object_moves_and_is_queried() {
    let mut world = zero_g_world();
    let ghost = world
        .add_collision_object(GhostObject::with_shape(Sphere::new(0.5), Vec3::ZERO))
        .unwrap();
    assert_eq!(world.collision_object_count(), 1);

    world
        .set_collision_object_position(ghost, Vec3::new(10.0, 0.0, 0.0))
        .unwrap();
    let hit = world
        .raycast(Vec3::new(10.0, 5.0, 0.0), Vec3::new(10.0, -5.0, 0.0), CollisionGroups::ALL)
        .unwrap()
        .unwrap();
    assert_eq!(hit.object, ghost.into());
    assert_abs_diff_eq!(hit.distance, 4.5, epsilon = 1e-4);

    // Character-group ghosts are skipped by masks without that bit
    let miss = world
        .raycast(Vec3::new(10.0, 5.0, 0.0), Vec3::new(10.0, -5.0, 0.0), CollisionGroups::STATIC)
        .unwrap();
    assert!(miss.is_none());

    assert!(world.remove_collision_object(ghost).unwrap().is_some());
    assert!(world.remove_collision_object(ghost).unwrap().is_none());
    let err = world
        .set_collision_object_position(ghost, Vec3::ZERO)
        .unwrap_err();
    assert!(matches!(err, PhysicsError::InvalidParameters(_)));
}

#[test]
fn test_ghost_overlapping_dynamic_body_reports_contact() {
    let mut world = zero_g_world();
    world
        .add_collision_object(GhostObject::with_shape(Sphere::new(1.0), Vec3::ZERO))
        .unwrap();
    world.add_rigid_body(RigidBody::dynamic(1.0, Sphere::new(0.5))).unwrap();

    let hits = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&hits);
    world.on_collision(move |_| *counter.borrow_mut() += 1).unwrap();
    world.step(DT).unwrap();
    assert_eq!(*hits.borrow(), 1);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_reset_keeps_listeners() {
    let mut world = zero_g_world();
    let hits = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&hits);
    world.on_collision(move |_| *counter.borrow_mut() += 1).unwrap();
    world.add_rigid_body(RigidBody::dynamic(1.0, Sphere::new(1.0))).unwrap();

    world.reset().unwrap();
    assert_eq!(world.body_count(), 0);

    world.add_rigid_body(RigidBody::dynamic(1.0, Sphere::new(1.0))).unwrap();
    world
        .add_rigid_body(RigidBody::dynamic(1.0, Sphere::new(1.0)).with_position(Vec3::X))
        .unwrap();
    world.step(DT).unwrap();
    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn test_dispose_is_terminal() {
    let mut world = PhysicsWorld::new();
    world.dispose().unwrap();
    assert!(world.is_disposed());
    assert!(matches!(world.step(DT), Err(PhysicsError::UnsupportedOperation(_))));
    assert!(matches!(world.dispose(), Err(PhysicsError::UnsupportedOperation(_))));
    assert!(matches!(
        world.add_rigid_body(RigidBody::default()),
        Err(PhysicsError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_negative_time_step_is_invalid() {
    let mut world = PhysicsWorld::new();
    assert!(matches!(world.step(-DT), Err(PhysicsError::InvalidParameters(_))));
    assert!(matches!(world.step(f32::NAN), Err(PhysicsError::InvalidParameters(_))));
    assert!(world.step(0.0).is_ok());
}

#[test]
#[cfg_attr(debug_assertions, should_panic(expected = "still references it"))]
fn test_removing_constrained_body_is_contract_violation() {
    let mut world = zero_g_world();
    let a = world.add_rigid_body(RigidBody::fixed(Sphere::new(0.5))).unwrap();
    let b = world
        .add_rigid_body(RigidBody::dynamic(1.0, Sphere::new(0.5)).with_position(Vec3::X))
        .unwrap();
    world
        .add_constraint(Constraint::new(a, Some(b), PointToPoint::new(Vec3::ZERO, Vec3::NEG_X)))
        .unwrap();

    // Release builds log, skip the orphaned constraint and keep stepping
    world.remove_rigid_body(b).unwrap();
    world.step(DT).unwrap();
    assert_eq!(world.constraint_count(), 1);
}

// ============================================================================
// Configuration files
// ============================================================================

#[test]
fn test_world_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("world.json");

    let mut config = WorldConfig::with_gravity(Vec3::new(0.0, -1.62, 0.0));
    config.broadphase = BroadphaseType::SweepAndPrune;
    config.max_sub_steps = 3;
    config.save(&path).unwrap();

    let loaded = WorldConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    let world = PhysicsWorld::with_config(loaded).unwrap();
    assert_eq!(world.gravity(), Vec3::new(0.0, -1.62, 0.0));
}

#[test]
fn test_missing_config_file_is_engine_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = WorldConfig::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, PhysicsError::Engine { .. }));
}
