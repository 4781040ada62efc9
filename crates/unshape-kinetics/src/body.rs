//! Bodies and the arena that owns them.
//!
//! A body is the single owner of the state a collider reads and the resolver
//! writes: the particle (position, velocity, mass) plus rotation and scale.
//! Colliders and force registrations refer to bodies by [`BodyHandle`].

use glam::Vec3;

use crate::error::PhysicsError;
use crate::math::Transform;
use crate::particle::Particle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a body in a [`BodySet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyHandle(pub(crate) usize);

impl BodyHandle {
    /// The raw index into the owning set.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A particle with an orientation and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    /// Linear state and mass.
    pub particle: Particle,
    /// Rotation about X, Y and Z in radians.
    pub rotation: Vec3,
    /// Scale along each axis.
    pub scale: Vec3,
}

impl Body {
    /// Creates an unrotated, unit-scale body.
    pub fn new(particle: Particle) -> Self {
        Self {
            particle,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    /// Sets the rotation.
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Current world transform.
    pub fn transform(&self) -> Transform {
        Transform::new(self.particle.position, self.rotation, self.scale)
    }
}

impl From<Particle> for Body {
    fn from(particle: Particle) -> Self {
        Self::new(particle)
    }
}

/// Append-only storage for bodies.
#[derive(Clone, Debug, Default)]
pub struct BodySet {
    bodies: Vec<Body>,
}

impl BodySet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a body and returns its handle.
    pub fn insert(&mut self, body: impl Into<Body>) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len());
        self.bodies.push(body.into());
        handle
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Returns true if the set holds no bodies.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Returns true if `handle` refers to a body in this set.
    pub fn contains(&self, handle: BodyHandle) -> bool {
        handle.0 < self.bodies.len()
    }

    /// Get a body by handle.
    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle.0)
    }

    /// Get a mutable body by handle.
    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle.0)
    }

    /// Get a body or fail with [`PhysicsError::UnknownBody`].
    pub fn try_get(&self, handle: BodyHandle) -> Result<&Body, PhysicsError> {
        self.get(handle).ok_or(PhysicsError::UnknownBody(handle))
    }

    /// Borrow two distinct bodies mutably at once.
    pub fn pair_mut(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
    ) -> Result<(&mut Body, &mut Body), PhysicsError> {
        if a == b {
            return Err(PhysicsError::SameBody(a));
        }
        let len = self.bodies.len();
        for handle in [a, b] {
            if handle.0 >= len {
                return Err(PhysicsError::UnknownBody(handle));
            }
        }

        if a.0 < b.0 {
            let (left, right) = self.bodies.split_at_mut(b.0);
            Ok((&mut left[a.0], &mut right[0]))
        } else {
            let (left, right) = self.bodies.split_at_mut(a.0);
            Ok((&mut right[0], &mut left[b.0]))
        }
    }

    /// Iterate over handles and bodies.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, body)| (BodyHandle(i), body))
    }

    /// Iterate over all bodies mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.bodies.iter_mut()
    }
}
