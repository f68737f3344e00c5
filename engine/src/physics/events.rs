//! Contact reporting
//!
//! Pair detection in [`PhysicsWorld::step`](super::PhysicsWorld::step) builds a
//! [`CollisionContact`] for every overlapping pair and hands it to the
//! registered sinks:
//!
//! - solid pairs go to the single [`CollisionCallback`] and every collision listener
//! - pairs involving a trigger go to trigger-enter listeners (once, when the
//!   overlap begins) and trigger-exit listeners (once, when it ends)

use glam::Vec3;

use super::object::CollisionObjectHandle;

/// One overlapping pair found during a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionContact {
    /// First object of the pair (registration order)
    pub object_a: CollisionObjectHandle,
    /// Second object of the pair
    pub object_b: CollisionObjectHandle,
    /// World-space point midway through the overlap
    pub point: Vec3,
    /// Unit normal pointing from A towards B
    pub normal: Vec3,
    /// Overlap depth of the bounding spheres (m)
    pub penetration_depth: f32,
    /// Impulse applied to separate the pair. Contacts are reported only, so always 0.
    pub impulse: f32,
}

impl CollisionContact {
    /// Whether `handle` is one side of this contact.
    pub fn involves(&self, handle: impl Into<CollisionObjectHandle>) -> bool {
        let handle = handle.into();
        self.object_a == handle || self.object_b == handle
    }

    /// The object on the other side from `handle`, if `handle` is part of the pair.
    pub fn other(&self, handle: impl Into<CollisionObjectHandle>) -> Option<CollisionObjectHandle> {
        let handle = handle.into();
        if self.object_a == handle {
            Some(self.object_b)
        } else if self.object_b == handle {
            Some(self.object_a)
        } else {
            None
        }
    }
}

/// Structured contact sink; a world holds at most one.
pub trait CollisionCallback {
    /// Called once per solid overlapping pair per step.
    fn on_contact_added(&mut self, contact: &CollisionContact);
}

impl<F: FnMut(&CollisionContact)> CollisionCallback for F {
    fn on_contact_added(&mut self, contact: &CollisionContact) {
        self(contact)
    }
}

/// Ad-hoc listener closure.
pub type ContactListener = Box<dyn FnMut(&CollisionContact)>;
