//! Physics world
//!
//! [`PhysicsWorld`] owns every rigid body, ghost object and constraint of one
//! simulation and advances them with a fixed-order step:
//!
//! 1. gravity (`gravity · mass`) is added to every simulated body as a force
//! 2. velocities are integrated and damped
//! 3. enabled constraints are solved once each, in registration order
//! 4. poses are integrated (semi-implicit Euler)
//! 5. overlapping pairs are detected and reported to listeners
//!
//! The world is single-threaded: it holds no locks and its listeners are not
//! `Send`. Callers that share a world between threads must synchronize
//! externally.
//!
//! # Example
//!
//! ```ignore
//! use kinema_engine::physics::{PhysicsWorld, RigidBody, Sphere, Vec3};
//!
//! let mut world = PhysicsWorld::new();
//! let ball = world.add_rigid_body(
//!     RigidBody::dynamic(1.0, Sphere::new(0.5)).with_position(Vec3::new(0.0, 10.0, 0.0)),
//! )?;
//! for _ in 0..60 {
//!     world.step(1.0 / 60.0)?;
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use glam::{Quat, Vec3};

use super::body::RigidBody;
use super::collision::{obb_sphere_overlap, sphere_sphere_contact};
use super::config::WorldConfig;
use super::constraints::solver::SolverBody;
use super::constraints::{Constraint, ConstraintHandle, ConstraintKind};
use super::error::{PhysicsError, PhysicsResult};
use super::events::{CollisionCallback, CollisionContact, ContactListener};
use super::object::{
    BodyHandle, Collidable, CollisionGroups, CollisionObjectHandle, GhostHandle, GhostObject,
    filters_allow,
};
use super::query::{CollisionQuery, RaycastResult};
use super::shape::CollisionShape;
use super::types::{Transform, is_finite_vec};

/// Segments shorter than this never hit anything.
const MIN_RAY_LENGTH: f32 = 1e-6;

type PairKey = (CollisionObjectHandle, CollisionObjectHandle);

/// Per-step copy of the data pair detection needs.
#[derive(Debug, Clone, Copy)]
struct Proxy {
    handle: CollisionObjectHandle,
    center: Vec3,
    radius: f32,
    groups: CollisionGroups,
    mask: CollisionGroups,
    trigger: bool,
    dynamic: bool,
}

impl Proxy {
    fn new(handle: CollisionObjectHandle, object: &dyn Collidable, dynamic: bool) -> Self {
        let (center, radius) = object.bounding_sphere();
        Self {
            handle,
            center,
            radius,
            groups: object.collision_groups(),
            mask: object.collision_mask(),
            trigger: object.is_trigger(),
            dynamic,
        }
    }

    fn accepts(&self, other: &Proxy) -> bool {
        self.groups.intersects(other.mask) && other.groups.intersects(self.mask)
    }
}

/// A simulation: bodies, ghosts, constraints and the listeners fed by pair detection.
pub struct PhysicsWorld {
    config: WorldConfig,
    bodies: BTreeMap<BodyHandle, RigidBody>,
    ghosts: BTreeMap<GhostHandle, GhostObject>,
    constraints: Vec<Constraint>,
    next_object_id: u32,
    next_constraint_id: u32,
    callback: Option<Box<dyn CollisionCallback>>,
    collision_listeners: Vec<ContactListener>,
    trigger_enter_listeners: Vec<ContactListener>,
    trigger_exit_listeners: Vec<ContactListener>,
    active_triggers: BTreeMap<PairKey, CollisionContact>,
    accumulator: f32,
    paused: bool,
    disposed: bool,
    step_count: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("config", &self.config)
            .field("bodies", &self.bodies.len())
            .field("ghosts", &self.ghosts.len())
            .field("constraints", &self.constraints.len())
            .field("paused", &self.paused)
            .field("disposed", &self.disposed)
            .field("step_count", &self.step_count)
            .finish_non_exhaustive()
    }
}

impl PhysicsWorld {
    /// Empty world with default configuration.
    pub fn new() -> Self {
        Self::from_valid_config(WorldConfig::default())
    }

    /// Empty world with the given configuration.
    pub fn with_config(config: WorldConfig) -> PhysicsResult<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: WorldConfig) -> Self {
        log::info!(
            "Physics world: created (gravity {:?}, time step {:.5}s, broadphase {:?})",
            config.gravity,
            config.time_step,
            config.broadphase
        );
        Self {
            config,
            bodies: BTreeMap::new(),
            ghosts: BTreeMap::new(),
            constraints: Vec::new(),
            next_object_id: 0,
            next_constraint_id: 0,
            callback: None,
            collision_listeners: Vec::new(),
            trigger_enter_listeners: Vec::new(),
            trigger_exit_listeners: Vec::new(),
            active_triggers: BTreeMap::new(),
            accumulator: 0.0,
            paused: false,
            disposed: false,
            step_count: 0,
        }
    }

    fn ensure_alive(&self, operation: &str) -> PhysicsResult<()> {
        if self.disposed {
            Err(PhysicsError::unsupported(format!("{operation} on a disposed world")))
        } else {
            Ok(())
        }
    }

    fn allocate_object_id(&mut self) -> u32 {
        let id = self.next_object_id;
        self.next_object_id += 1;
        id
    }

    // ========================================================================
    // Configuration and state
    // ========================================================================

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn gravity(&self) -> Vec3 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) -> PhysicsResult<()> {
        self.ensure_alive("set_gravity")?;
        if !is_finite_vec(gravity) {
            return Err(PhysicsError::invalid("gravity must be finite"));
        }
        self.config.gravity = gravity;
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Number of steps simulated since creation or the last reset.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Suspend stepping; `step` becomes a successful no-op.
    pub fn pause(&mut self) -> PhysicsResult<()> {
        self.ensure_alive("pause")?;
        self.paused = true;
        log::info!("Physics world: paused");
        Ok(())
    }

    pub fn resume(&mut self) -> PhysicsResult<()> {
        self.ensure_alive("resume")?;
        self.paused = false;
        log::info!("Physics world: resumed");
        Ok(())
    }

    /// Remove every body, ghost and constraint. Listeners stay registered.
    pub fn reset(&mut self) -> PhysicsResult<()> {
        self.ensure_alive("reset")?;
        self.clear_simulation();
        log::info!("Physics world: reset");
        Ok(())
    }

    /// Release everything. Every later mutating call or query fails with
    /// [`PhysicsError::UnsupportedOperation`].
    pub fn dispose(&mut self) -> PhysicsResult<()> {
        self.ensure_alive("dispose")?;
        self.clear_simulation();
        self.callback = None;
        self.collision_listeners.clear();
        self.trigger_enter_listeners.clear();
        self.trigger_exit_listeners.clear();
        self.disposed = true;
        log::info!("Physics world: disposed");
        Ok(())
    }

    fn clear_simulation(&mut self) {
        self.bodies.clear();
        self.ghosts.clear();
        self.constraints.clear();
        self.active_triggers.clear();
        self.accumulator = 0.0;
        self.step_count = 0;
    }

    // ========================================================================
    // Rigid bodies
    // ========================================================================

    /// Register a body and return its handle.
    ///
    /// Adding a body that already carries a handle of this world is a no-op
    /// returning that handle.
    pub fn add_rigid_body(&mut self, mut body: RigidBody) -> PhysicsResult<BodyHandle> {
        self.ensure_alive("add_rigid_body")?;
        if let Some(handle) = body.id.filter(|h| self.bodies.contains_key(h)) {
            return Ok(handle);
        }
        if !(body.mass.is_finite() && body.mass >= 0.0) {
            return Err(PhysicsError::invalid(format!(
                "mass must be finite and >= 0, got {}",
                body.mass
            )));
        }
        if !is_finite_vec(body.transform.position)
            || !is_finite_vec(body.linear_velocity)
            || !is_finite_vec(body.angular_velocity)
        {
            return Err(PhysicsError::invalid("body position and velocities must be finite"));
        }
        let handle = BodyHandle(self.allocate_object_id());
        body.id = Some(handle);
        log::debug!(
            "Physics world: added body {:?} ({:?}, mass {})",
            handle,
            body.body_type,
            body.mass
        );
        self.bodies.insert(handle, body);
        Ok(handle)
    }

    /// Unregister a body and hand it back. Unknown handles yield `Ok(None)`.
    ///
    /// Constraints are not removed with their bodies; removing a body that a
    /// constraint still references is a contract violation (debug assertion).
    /// In release builds such constraints are skipped by the solver.
    pub fn remove_rigid_body(&mut self, handle: BodyHandle) -> PhysicsResult<Option<RigidBody>> {
        self.ensure_alive("remove_rigid_body")?;
        let referenced = self.constraints.iter().any(|c| c.references(handle));
        debug_assert!(
            !referenced,
            "body {handle:?} removed while a constraint still references it"
        );
        if referenced {
            log::warn!("Physics world: body {:?} removed while referenced by a constraint", handle);
        }
        let removed = self.bodies.remove(&handle).map(|mut body| {
            body.id = None;
            body
        });
        if removed.is_some() {
            log::debug!("Physics world: removed body {:?}", handle);
        }
        Ok(removed)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(&handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(&handle)
    }

    /// All bodies in handle order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter().map(|(h, b)| (*h, b))
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // ========================================================================
    // Ghost collision objects
    // ========================================================================

    /// Register a kinematic-only collision object.
    pub fn add_collision_object(&mut self, ghost: GhostObject) -> PhysicsResult<GhostHandle> {
        self.ensure_alive("add_collision_object")?;
        if !is_finite_vec(ghost.transform.position) {
            return Err(PhysicsError::invalid("collision object position must be finite"));
        }
        let handle = GhostHandle(self.allocate_object_id());
        self.ghosts.insert(handle, ghost);
        log::debug!("Physics world: added collision object {:?}", handle);
        Ok(handle)
    }

    /// Unregister a ghost. Unknown handles yield `Ok(None)`.
    pub fn remove_collision_object(
        &mut self,
        handle: GhostHandle,
    ) -> PhysicsResult<Option<GhostObject>> {
        self.ensure_alive("remove_collision_object")?;
        let removed = self.ghosts.remove(&handle);
        if removed.is_some() {
            log::debug!("Physics world: removed collision object {:?}", handle);
        }
        Ok(removed)
    }

    /// Move a ghost.
    pub fn set_collision_object_position(
        &mut self,
        handle: GhostHandle,
        position: Vec3,
    ) -> PhysicsResult<()> {
        self.ensure_alive("set_collision_object_position")?;
        if !is_finite_vec(position) {
            return Err(PhysicsError::invalid("collision object position must be finite"));
        }
        let ghost = self
            .ghosts
            .get_mut(&handle)
            .ok_or_else(|| PhysicsError::invalid(format!("unknown collision object {handle:?}")))?;
        ghost.transform.position = position;
        Ok(())
    }

    pub fn collision_object(&self, handle: GhostHandle) -> Option<&GhostObject> {
        self.ghosts.get(&handle)
    }

    /// Bodies plus ghosts.
    pub fn collision_object_count(&self) -> usize {
        self.bodies.len() + self.ghosts.len()
    }

    fn collidable(&self, handle: CollisionObjectHandle) -> Option<&dyn Collidable> {
        match handle {
            CollisionObjectHandle::Body(h) => self.bodies.get(&h).map(|b| b as &dyn Collidable),
            CollisionObjectHandle::Ghost(h) => self.ghosts.get(&h).map(|g| g as &dyn Collidable),
        }
    }

    /// Every collision object, bodies first, each group in handle order.
    fn collidables(&self) -> impl Iterator<Item = (CollisionObjectHandle, &dyn Collidable)> {
        let bodies = self
            .bodies
            .iter()
            .map(|(h, b)| (CollisionObjectHandle::Body(*h), b as &dyn Collidable));
        let ghosts = self
            .ghosts
            .iter()
            .map(|(h, g)| (CollisionObjectHandle::Ghost(*h), g as &dyn Collidable));
        bodies.chain(ghosts)
    }

    // ========================================================================
    // Constraints
    // ========================================================================

    /// Register a constraint. Both bodies must already be in this world.
    ///
    /// Adding a constraint that already carries a handle of this world is a
    /// no-op returning that handle.
    pub fn add_constraint(
        &mut self,
        mut constraint: Constraint,
    ) -> PhysicsResult<ConstraintHandle> {
        self.ensure_alive("add_constraint")?;
        if let Some(handle) = constraint
            .id
            .filter(|h| self.constraints.iter().any(|c| c.id == Some(*h)))
        {
            return Ok(handle);
        }
        let body_a = constraint.body_a();
        if !self.bodies.contains_key(&body_a) {
            return Err(PhysicsError::invalid(format!(
                "constraint body A {body_a:?} is not in this world"
            )));
        }
        if let Some(body_b) = constraint.body_b() {
            if body_b == body_a {
                return Err(PhysicsError::invalid("constraint bodies A and B must differ"));
            }
            if !self.bodies.contains_key(&body_b) {
                return Err(PhysicsError::invalid(format!(
                    "constraint body B {body_b:?} is not in this world"
                )));
            }
        }
        let handle = ConstraintHandle(self.next_constraint_id);
        self.next_constraint_id += 1;
        constraint.id = Some(handle);
        log::debug!(
            "Physics world: added {} constraint {:?} ({:?} - {:?})",
            constraint.kind().name(),
            handle,
            constraint.body_a(),
            constraint.body_b()
        );
        self.constraints.push(constraint);
        Ok(handle)
    }

    /// Unregister a constraint. Unknown handles yield `Ok(None)`.
    pub fn remove_constraint(
        &mut self,
        handle: ConstraintHandle,
    ) -> PhysicsResult<Option<Constraint>> {
        self.ensure_alive("remove_constraint")?;
        let Some(index) = self.constraint_index(handle) else {
            return Ok(None);
        };
        let mut constraint = self.constraints.remove(index);
        constraint.id = None;
        log::debug!("Physics world: removed constraint {:?}", handle);
        Ok(Some(constraint))
    }

    fn constraint_index(&self, handle: ConstraintHandle) -> Option<usize> {
        self.constraints.iter().position(|c| c.id == Some(handle))
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&Constraint> {
        self.constraint_index(handle).map(|i| &self.constraints[i])
    }

    pub fn constraint_mut(&mut self, handle: ConstraintHandle) -> Option<&mut Constraint> {
        self.constraint_index(handle).map(|i| &mut self.constraints[i])
    }

    /// Constraints in registration order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// World poses of a constraint's bodies (identity for the world frame).
    pub fn constraint_transforms(
        &self,
        handle: ConstraintHandle,
    ) -> Option<(Transform, Transform)> {
        let constraint = self.constraint(handle)?;
        let a = self.bodies.get(&constraint.body_a())?.transform;
        let b = match constraint.body_b() {
            Some(h) => self.bodies.get(&h)?.transform,
            None => Transform::IDENTITY,
        };
        Some((a, b))
    }

    /// Current angle of a hinge constraint; `None` for other kinds.
    pub fn hinge_angle(&self, handle: ConstraintHandle) -> Option<f32> {
        let (a, b) = self.constraint_transforms(handle)?;
        match self.constraint(handle)?.kind() {
            ConstraintKind::Hinge(hinge) => Some(hinge.hinge_angle(&a, &b)),
            _ => None,
        }
    }

    /// Solve one constraint now, outside of `step`.
    pub fn solve_constraint(&mut self, handle: ConstraintHandle, dt: f32) -> PhysicsResult<()> {
        self.ensure_alive("solve_constraint")?;
        if !(dt >= 0.0) {
            return Err(PhysicsError::invalid(format!("deltaTime must be >= 0, got {dt}")));
        }
        let index = self
            .constraint_index(handle)
            .ok_or_else(|| PhysicsError::invalid(format!("unknown constraint {handle:?}")))?;
        self.solve_constraint_at(index, dt);
        Ok(())
    }

    fn solve_constraint_at(&mut self, index: usize, dt: f32) {
        let constraint = &self.constraints[index];
        if !constraint.is_enabled() {
            return;
        }
        let (handle_a, handle_b) = (constraint.body_a(), constraint.body_b());

        let Some(body_a) = self.bodies.get(&handle_a) else {
            log::warn!("Constraint {:?}: body A {:?} missing, skipped", constraint.id, handle_a);
            return;
        };
        let mut a = SolverBody::from_body(body_a);
        let mut b = match handle_b {
            None => SolverBody::world(),
            Some(h) => match self.bodies.get(&h) {
                Some(body) => SolverBody::from_body(body),
                None => {
                    log::warn!("Constraint {:?}: body B {:?} missing, skipped", constraint.id, h);
                    return;
                }
            },
        };

        self.constraints[index].solve(&mut a, &mut b, dt);

        if let Some(body) = self.bodies.get_mut(&handle_a) {
            a.write_back(body);
        }
        if let Some(body) = handle_b.and_then(|h| self.bodies.get_mut(&h)) {
            b.write_back(body);
        }
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Install the structured contact callback, replacing any previous one.
    pub fn set_collision_callback(
        &mut self,
        callback: impl CollisionCallback + 'static,
    ) -> PhysicsResult<()> {
        self.ensure_alive("set_collision_callback")?;
        self.callback = Some(Box::new(callback));
        Ok(())
    }

    pub fn clear_collision_callback(&mut self) -> PhysicsResult<()> {
        self.ensure_alive("clear_collision_callback")?;
        self.callback = None;
        Ok(())
    }

    /// Listen to every solid contact.
    pub fn on_collision(
        &mut self,
        listener: impl FnMut(&CollisionContact) + 'static,
    ) -> PhysicsResult<()> {
        self.ensure_alive("on_collision")?;
        self.collision_listeners.push(Box::new(listener));
        Ok(())
    }

    /// Listen to trigger overlaps starting.
    pub fn on_trigger_enter(
        &mut self,
        listener: impl FnMut(&CollisionContact) + 'static,
    ) -> PhysicsResult<()> {
        self.ensure_alive("on_trigger_enter")?;
        self.trigger_enter_listeners.push(Box::new(listener));
        Ok(())
    }

    /// Listen to trigger overlaps ending. The contact is the last one seen.
    pub fn on_trigger_exit(
        &mut self,
        listener: impl FnMut(&CollisionContact) + 'static,
    ) -> PhysicsResult<()> {
        self.ensure_alive("on_trigger_exit")?;
        self.trigger_exit_listeners.push(Box::new(listener));
        Ok(())
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Advance the simulation by `dt` seconds.
    ///
    /// Fails with `InvalidParameters` for negative (or NaN) `dt` and with
    /// `UnsupportedOperation` once disposed. Paused worlds return `Ok(())`
    /// without changing anything.
    pub fn step(&mut self, dt: f32) -> PhysicsResult<()> {
        self.ensure_alive("step")?;
        if !(dt >= 0.0) {
            return Err(PhysicsError::invalid(format!("deltaTime must be >= 0, got {dt}")));
        }
        if self.paused {
            return Ok(());
        }

        let gravity = self.config.gravity;
        for body in self.bodies.values_mut().filter(|b| b.is_simulated()) {
            body.apply_central_force(gravity * body.mass);
        }
        for body in self.bodies.values_mut() {
            body.integrate_velocity(dt);
        }

        if self.config.solve_constraints_in_step {
            for index in 0..self.constraints.len() {
                self.solve_constraint_at(index, dt);
            }
        }

        for body in self.bodies.values_mut() {
            body.integrate_transform(dt);
        }

        let contacts = self.detect_collisions();
        self.step_count += 1;
        log::trace!(
            "Physics world: step {} dt={:.5} bodies={} constraints={} contacts={}",
            self.step_count,
            dt,
            self.bodies.len(),
            self.constraints.len(),
            contacts
        );
        Ok(())
    }

    /// Feed real frame time into the fixed-step accumulator.
    ///
    /// Runs `config.time_step` steps while enough time has accumulated, at most
    /// `config.max_sub_steps` per call. Whole steps beyond the cap are dropped;
    /// the sub-step remainder carries over. Returns the number of steps run.
    pub fn advance(&mut self, frame_time: f32) -> PhysicsResult<u32> {
        self.ensure_alive("advance")?;
        if !(frame_time >= 0.0) {
            return Err(PhysicsError::invalid(format!(
                "frame time must be >= 0, got {frame_time}"
            )));
        }
        if self.paused {
            return Ok(0);
        }
        let time_step = self.config.time_step;
        self.accumulator += frame_time;
        let mut steps = 0;
        while self.accumulator >= time_step && steps < self.config.max_sub_steps {
            self.step(time_step)?;
            self.accumulator -= time_step;
            steps += 1;
        }
        if self.accumulator >= time_step {
            log::debug!(
                "Physics world: dropping {:.4}s after {} sub-steps",
                self.accumulator - self.accumulator % time_step,
                steps
            );
            self.accumulator %= time_step;
        }
        Ok(steps)
    }

    /// Time carried over to the next `advance` call.
    pub fn accumulated_time(&self) -> f32 {
        self.accumulator
    }

    /// Brute-force pair detection over bounding spheres. Returns the number of
    /// contacts reported.
    fn detect_collisions(&mut self) -> usize {
        let proxies: Vec<Proxy> = self
            .bodies
            .iter()
            .map(|(h, b)| Proxy::new((*h).into(), b, b.is_simulated()))
            .chain(self.ghosts.iter().map(|(h, g)| Proxy::new((*h).into(), g, false)))
            .collect();

        let mut solid = Vec::new();
        let mut triggered = BTreeMap::new();
        for (i, a) in proxies.iter().enumerate() {
            for b in &proxies[i + 1..] {
                let is_trigger = a.trigger || b.trigger;
                if !(a.dynamic || b.dynamic || is_trigger) || !a.accepts(b) {
                    continue;
                }
                let Some((normal, depth, point)) =
                    sphere_sphere_contact(a.center, a.radius, b.center, b.radius)
                else {
                    continue;
                };
                let contact = CollisionContact {
                    object_a: a.handle,
                    object_b: b.handle,
                    point,
                    normal,
                    penetration_depth: depth,
                    impulse: 0.0,
                };
                if is_trigger {
                    triggered.insert((a.handle, b.handle), contact);
                } else {
                    solid.push(contact);
                }
            }
        }

        for contact in &solid {
            if let Some(callback) = self.callback.as_mut() {
                callback.on_contact_added(contact);
            }
            for listener in &mut self.collision_listeners {
                listener(contact);
            }
        }

        let previous = std::mem::take(&mut self.active_triggers);
        for (key, contact) in &triggered {
            if !previous.contains_key(key) {
                for listener in &mut self.trigger_enter_listeners {
                    listener(contact);
                }
            }
        }
        for (key, contact) in &previous {
            if !triggered.contains_key(key) {
                for listener in &mut self.trigger_exit_listeners {
                    listener(contact);
                }
            }
        }
        let count = solid.len() + triggered.len();
        self.active_triggers = triggered;
        count
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Closest hit on the segment `from → to` among non-trigger objects whose
    /// groups match `mask` ([`CollisionGroups::ALL`] matches everything).
    pub fn raycast(
        &self,
        from: Vec3,
        to: Vec3,
        mask: CollisionGroups,
    ) -> PhysicsResult<Option<RaycastResult>> {
        self.ensure_alive("raycast")?;
        if !is_finite_vec(from) || !is_finite_vec(to) {
            return Err(PhysicsError::invalid("raycast endpoints must be finite"));
        }
        let segment = to - from;
        let length = segment.length();
        if length < MIN_RAY_LENGTH {
            return Ok(None);
        }
        let direction = segment / length;

        let mut best: Option<RaycastResult> = None;
        for (handle, object) in self.collidables() {
            if object.is_trigger() || !object.matches_mask(mask) {
                continue;
            }
            let Some(hit) = object.ray_test(from, direction, length) else {
                continue;
            };
            if best.is_none_or(|b| hit.distance < b.distance) {
                best = Some(RaycastResult {
                    object: handle,
                    point: from + direction * hit.distance,
                    normal: hit.normal,
                    distance: hit.distance,
                    fraction: hit.distance / length,
                });
            }
        }
        Ok(best)
    }

    /// Objects whose bounding sphere overlaps the sphere `(center, radius)`.
    pub fn sphere_cast(
        &self,
        center: Vec3,
        radius: f32,
        mask: CollisionGroups,
    ) -> PhysicsResult<Vec<CollisionObjectHandle>> {
        self.ensure_alive("sphere_cast")?;
        if !(radius >= 0.0) || !is_finite_vec(center) {
            return Err(PhysicsError::invalid(format!(
                "sphere cast needs a finite center and radius >= 0, got {radius}"
            )));
        }
        Ok(self.collect_overlapping(mask, |c, r| {
            sphere_sphere_contact(center, radius, c, r).is_some()
        }))
    }

    /// Objects whose bounding sphere overlaps an oriented box.
    pub fn box_cast(
        &self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        mask: CollisionGroups,
    ) -> PhysicsResult<Vec<CollisionObjectHandle>> {
        self.ensure_alive("box_cast")?;
        if half_extents.min_element() < 0.0
            || !is_finite_vec(half_extents)
            || !is_finite_vec(center)
        {
            return Err(PhysicsError::invalid(format!(
                "box cast needs finite, non-negative half extents, got {half_extents:?}"
            )));
        }
        let rotation = rotation.normalize();
        Ok(self.collect_overlapping(mask, |c, r| {
            obb_sphere_overlap(center, half_extents, rotation, c, r)
        }))
    }

    /// Objects whose bounding sphere overlaps `shape` placed at `transform`.
    pub fn overlaps(
        &self,
        shape: &dyn CollisionShape,
        transform: &Transform,
        mask: CollisionGroups,
    ) -> PhysicsResult<Vec<CollisionObjectHandle>> {
        self.sphere_cast(transform.position, shape.bounding_radius(), mask)
    }

    fn collect_overlapping(
        &self,
        mask: CollisionGroups,
        overlaps: impl Fn(Vec3, f32) -> bool,
    ) -> Vec<CollisionObjectHandle> {
        self.collidables()
            .filter(|(_, object)| object.matches_mask(mask))
            .filter(|(_, object)| {
                let (center, radius) = object.bounding_sphere();
                overlaps(center, radius)
            })
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Whether two objects' filters let them collide. Unknown handles never do.
    pub fn can_collide(&self, a: CollisionObjectHandle, b: CollisionObjectHandle) -> bool {
        match (self.collidable(a), self.collidable(b)) {
            (Some(a), Some(b)) => filters_allow(a, b),
            _ => false,
        }
    }
}

impl CollisionQuery for PhysicsWorld {
    fn raycast(&self, from: Vec3, to: Vec3, mask: CollisionGroups) -> Option<RaycastResult> {
        PhysicsWorld::raycast(self, from, to, mask).ok().flatten()
    }

    fn object_position(&self, object: CollisionObjectHandle) -> Option<Vec3> {
        self.collidable(object).map(|o| o.transform().position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::shape::{Cuboid, Sphere};

    fn zero_g_world() -> PhysicsWorld {
        PhysicsWorld::with_config(WorldConfig::with_gravity(Vec3::ZERO)).unwrap()
    }

    #[test]
    fn test_negative_dt_rejected() {
        let mut world = PhysicsWorld::new();
        let err = world.step(-0.1).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidParameters(_)));
        assert!(world.step(f32::NAN).is_err());
    }

    #[test]
    fn test_paused_world_does_not_move() {
        let mut world = PhysicsWorld::new();
        let h = world
            .add_rigid_body(RigidBody::dynamic(1.0, Sphere::new(0.5)).with_position(Vec3::Y))
            .unwrap();
        world.pause().unwrap();
        world.step(0.1).unwrap();
        assert_eq!(world.body(h).unwrap().position(), Vec3::Y);
        assert_eq!(world.advance(1.0).unwrap(), 0);
        world.resume().unwrap();
        world.step(0.1).unwrap();
        assert!(world.body(h).unwrap().position().y < 1.0);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut world = PhysicsWorld::new();
        let h = world.add_rigid_body(RigidBody::fixed(Sphere::new(1.0))).unwrap();
        assert!(world.remove_rigid_body(h).unwrap().is_some());
        assert!(world.remove_rigid_body(h).unwrap().is_none());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_re_adding_registered_body_is_noop() {
        let mut world = PhysicsWorld::new();
        let h = world.add_rigid_body(RigidBody::fixed(Sphere::new(1.0))).unwrap();
        let copy = world.body(h).unwrap().clone();
        assert_eq!(world.add_rigid_body(copy).unwrap(), h);
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_rejects_negative_mass() {
        let mut world = PhysicsWorld::new();
        let err = world
            .add_rigid_body(RigidBody::dynamic(-1.0, Sphere::new(1.0)))
            .unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidParameters(_)));
    }

    #[test]
    fn test_advance_caps_sub_steps() {
        let mut world = zero_g_world();
        let dt = world.config().time_step;
        assert_eq!(world.advance(dt * 2.5).unwrap(), 2);
        assert!((world.accumulated_time() - dt * 0.5).abs() < 1e-5);
        // Far more than max_sub_steps worth of time
        assert_eq!(world.advance(1.0).unwrap(), world.config().max_sub_steps);
        assert!(world.accumulated_time() < dt);
    }

    #[test]
    fn test_raycast_picks_closest_and_respects_mask() {
        let mut world = zero_g_world();
        let near = world
            .add_rigid_body(
                RigidBody::fixed(Cuboid::new(Vec3::splat(0.5)))
                    .with_position(Vec3::new(3.0, 0.0, 0.0))
                    .with_groups(CollisionGroups::SENSOR, CollisionGroups::ALL),
            )
            .unwrap();
        let far = world
            .add_rigid_body(
                RigidBody::fixed(Sphere::new(0.5)).with_position(Vec3::new(6.0, 0.0, 0.0)),
            )
            .unwrap();

        let hit = world
            .raycast(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), CollisionGroups::ALL)
            .unwrap()
            .unwrap();
        assert_eq!(hit.object, near.into());
        assert!((hit.distance - 2.5).abs() < 1e-5);
        assert!((hit.fraction - 0.25).abs() < 1e-5);
        assert_eq!(hit.normal, Vec3::NEG_X);

        let hit = world
            .raycast(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), CollisionGroups::STATIC)
            .unwrap()
            .unwrap();
        assert_eq!(hit.object, far.into());

        assert!(world
            .raycast(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), CollisionGroups::ALL)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_sphere_cast_negative_radius() {
        let world = PhysicsWorld::new();
        let err = world.sphere_cast(Vec3::ZERO, -1.0, CollisionGroups::ALL).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidParameters(_)));
    }

    #[test]
    fn test_box_cast_uses_rotation() {
        let mut world = zero_g_world();
        let h = world
            .add_rigid_body(
                RigidBody::fixed(Sphere::new(0.1)).with_position(Vec3::new(1.3, 0.0, 0.0)),
            )
            .unwrap();
        let thin = Vec3::new(0.1, 1.0, 1.5);
        let upright = world
            .box_cast(Vec3::ZERO, thin, Quat::IDENTITY, CollisionGroups::ALL)
            .unwrap();
        assert!(upright.is_empty());
        let turned = world
            .box_cast(
                Vec3::ZERO,
                thin,
                Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
                CollisionGroups::ALL,
            )
            .unwrap();
        assert_eq!(turned, vec![CollisionObjectHandle::from(h)]);
    }

    #[test]
    fn test_disposed_world_rejects_everything() {
        let mut world = PhysicsWorld::new();
        world.dispose().unwrap();
        let unsupported =
            |r: PhysicsResult<()>| matches!(r, Err(PhysicsError::UnsupportedOperation(_)));
        assert!(unsupported(world.step(0.1)));
        assert!(unsupported(world.pause()));
        assert!(unsupported(world.dispose()));
        assert!(matches!(
            world.add_rigid_body(RigidBody::default()),
            Err(PhysicsError::UnsupportedOperation(_))
        ));
        assert!(world.raycast(Vec3::ZERO, Vec3::X, CollisionGroups::ALL).is_err());
    }

    #[test]
    fn test_reset_clears_collections() {
        let mut world = PhysicsWorld::new();
        world.add_rigid_body(RigidBody::default()).unwrap();
        world
            .add_collision_object(GhostObject::with_shape(Sphere::new(1.0), Vec3::ZERO))
            .unwrap();
        world.step(0.01).unwrap();
        world.reset().unwrap();
        assert_eq!(world.collision_object_count(), 0);
        assert_eq!(world.step_count(), 0);
        assert!(world.step(0.01).is_ok());
    }

    #[test]
    fn test_constraint_needs_registered_bodies() {
        use crate::physics::constraints::PointToPoint;
        let mut world = PhysicsWorld::new();
        let a = world.add_rigid_body(RigidBody::default()).unwrap();
        let missing = BodyHandle(99);
        let joint = Constraint::new(a, Some(missing), PointToPoint::new(Vec3::ZERO, Vec3::ZERO));
        assert!(world.add_constraint(joint).is_err());
        let joint = Constraint::new(a, Some(a), PointToPoint::new(Vec3::ZERO, Vec3::ZERO));
        assert!(world.add_constraint(joint).is_err());
    }
}
