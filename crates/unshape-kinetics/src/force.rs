//! Force generators and the registry that applies them.
//!
//! Generators compute a force for one particle per tick; the registry pairs
//! bodies with generators and sums every contribution into the particles'
//! force accumulators before integration.

use std::fmt;

use glam::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::{BodyHandle, BodySet};
use crate::error::PhysicsError;
use crate::particle::Particle;

/// Newtonian gravitational constant in SI units.
pub const GRAVITATIONAL_CONSTANT: f32 = 6.674e-11;

/// Computes a force for a particle each tick.
pub trait ForceGenerator: Send + Sync + fmt::Debug {
    /// Returns the force to add to `particle` for a step of `dt` seconds.
    ///
    /// `bodies` gives read access to other bodies (e.g. a moving anchor).
    fn force(&self, particle: &Particle, bodies: &BodySet, dt: f32) -> Result<Vec3, PhysicsError>;
}

// ============================================================================
// Built-in Generators
// ============================================================================

/// Uniform gravitational acceleration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gravity {
    /// Acceleration vector (units per second squared).
    pub acceleration: Vec3,
}

impl Default for Gravity {
    fn default() -> Self {
        Self {
            acceleration: Vec3::new(0.0, -9.81, 0.0),
        }
    }
}

impl Gravity {
    /// Creates a gravity generator.
    pub fn new(acceleration: Vec3) -> Self {
        Self { acceleration }
    }
}

impl ForceGenerator for Gravity {
    fn force(&self, particle: &Particle, _: &BodySet, _: f32) -> Result<Vec3, PhysicsError> {
        if !particle.has_finite_mass() {
            return Ok(Vec3::ZERO);
        }
        Ok(self.acceleration * particle.mass())
    }
}

/// Where an anchored generator pulls toward.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Anchor {
    /// A fixed point in world space.
    Point(Vec3),
    /// The current position of another body.
    Body(BodyHandle),
}

impl Anchor {
    /// Resolves the anchor to a world position.
    pub fn position(&self, bodies: &BodySet) -> Result<Vec3, PhysicsError> {
        match *self {
            Anchor::Point(point) => Ok(point),
            Anchor::Body(handle) => Ok(bodies.try_get(handle)?.particle.position),
        }
    }
}

/// Inverse-square attraction toward an anchor of fixed mass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnchoredGravityWell {
    /// What the well is centred on.
    pub anchor: Anchor,
    /// Mass of the attracting body.
    pub anchor_mass: f32,
    /// Gravitational constant (defaults to the SI value).
    pub gravitational_constant: f32,
}

impl AnchoredGravityWell {
    /// Creates a well with the SI gravitational constant.
    pub fn new(anchor: Anchor, anchor_mass: f32) -> Self {
        Self {
            anchor,
            anchor_mass,
            gravitational_constant: GRAVITATIONAL_CONSTANT,
        }
    }

    /// Overrides the gravitational constant.
    pub fn with_constant(mut self, gravitational_constant: f32) -> Self {
        self.gravitational_constant = gravitational_constant;
        self
    }
}

impl ForceGenerator for AnchoredGravityWell {
    fn force(&self, particle: &Particle, bodies: &BodySet, _: f32) -> Result<Vec3, PhysicsError> {
        if !particle.has_finite_mass() {
            return Ok(Vec3::ZERO);
        }

        let to_anchor = self.anchor.position(bodies)? - particle.position;
        let distance_sq = to_anchor.length_squared();
        if distance_sq == 0.0 {
            return Ok(Vec3::ZERO);
        }

        let magnitude =
            self.gravitational_constant * particle.mass() * self.anchor_mass / distance_sq;
        Ok(to_anchor / distance_sq.sqrt() * magnitude)
    }
}

/// Hookean spring tied to a fixed world point.
///
/// The damping term opposes the displacement from the anchor, not the velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnchoredSpring {
    /// Fixed end of the spring.
    pub anchor: Vec3,
    /// Spring constant `k`.
    pub spring_constant: f32,
    /// Length at which the spring exerts no Hookean force.
    pub rest_length: f32,
    /// Coefficient applied to the displacement vector.
    pub damping: f32,
}

impl AnchoredSpring {
    /// Creates an undamped spring.
    pub fn new(anchor: Vec3, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            anchor,
            spring_constant,
            rest_length,
            damping: 0.0,
        }
    }

    /// Sets the damping coefficient.
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }
}

impl ForceGenerator for AnchoredSpring {
    fn force(&self, particle: &Particle, _: &BodySet, _: f32) -> Result<Vec3, PhysicsError> {
        let delta = particle.position - self.anchor;
        let stretch = delta.length() - self.rest_length;
        let hooke = -self.spring_constant * stretch * delta.normalize_or_zero();
        Ok(hooke - self.damping * delta)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Index of a generator in a [`ForceRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeneratorHandle(usize);

impl GeneratorHandle {
    /// The raw index into the owning registry.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single body/generator association.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForceRegistration {
    /// Body receiving the force.
    pub body: BodyHandle,
    /// Generator producing it.
    pub generator: GeneratorHandle,
}

/// Ordered many-to-many table of body/generator pairs.
#[derive(Debug, Default)]
pub struct ForceRegistry {
    generators: Vec<Box<dyn ForceGenerator>>,
    registrations: Vec<ForceRegistration>,
}

impl ForceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a generator and returns its handle.
    pub fn add_generator(&mut self, generator: impl ForceGenerator + 'static) -> GeneratorHandle {
        let handle = GeneratorHandle(self.generators.len());
        self.generators.push(Box::new(generator));
        handle
    }

    /// Get a generator by handle.
    pub fn generator(&self, handle: GeneratorHandle) -> Option<&dyn ForceGenerator> {
        self.generators.get(handle.0).map(|g| g.as_ref())
    }

    /// Associates `body` with `generator`. The body must exist in `bodies`.
    ///
    /// The same pair may be registered more than once; each registration applies.
    pub fn register(
        &mut self,
        bodies: &BodySet,
        body: BodyHandle,
        generator: GeneratorHandle,
    ) -> Result<(), PhysicsError> {
        if !bodies.contains(body) {
            return Err(PhysicsError::UnknownBody(body));
        }
        if generator.0 >= self.generators.len() {
            return Err(PhysicsError::UnknownGenerator(generator));
        }
        self.registrations.push(ForceRegistration { body, generator });
        Ok(())
    }

    /// Removes the first matching registration. Returns false if none matched.
    pub fn unregister(&mut self, body: BodyHandle, generator: GeneratorHandle) -> bool {
        let target = ForceRegistration { body, generator };
        match self.registrations.iter().position(|r| *r == target) {
            Some(index) => {
                self.registrations.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes every registration. Generators are kept.
    pub fn clear(&mut self) {
        self.registrations.clear();
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Registrations in application order.
    pub fn registrations(&self) -> &[ForceRegistration] {
        &self.registrations
    }

    /// Adds every registered generator's force to its body.
    ///
    /// All forces are computed before any is applied, so on error no
    /// accumulator has changed.
    pub fn update_forces(&self, bodies: &mut BodySet, dt: f32) -> Result<(), PhysicsError> {
        let view: &BodySet = bodies;
        let forces = self
            .registrations
            .iter()
            .map(|registration| {
                let generator = self
                    .generator(registration.generator)
                    .ok_or(PhysicsError::UnknownGenerator(registration.generator))?;
                let body = view.try_get(registration.body)?;
                Ok((registration.body, generator.force(&body.particle, view, dt)?))
            })
            .collect::<Result<Vec<_>, PhysicsError>>()?;

        for (handle, force) in forces {
            if let Some(body) = bodies.get_mut(handle) {
                body.particle.add_force(force);
            }
        }
        Ok(())
    }
}
