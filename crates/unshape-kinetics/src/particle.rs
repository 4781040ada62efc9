//! Point-mass particles and their integrator.

use glam::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point mass.
///
/// Mass is stored inverted so that immovable bodies are `inverse_mass == 0`
/// rather than an infinite mass.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Particle {
    /// Position in world space.
    pub position: Vec3,
    /// Velocity in units per second.
    pub velocity: Vec3,
    /// Constant acceleration (e.g. gravity applied without a generator).
    pub acceleration: Vec3,
    /// Velocity kept after one second (1 = no damping).
    pub damping: f32,
    /// Inverse mass (0 = immovable).
    inverse_mass: f32,
    /// Force accumulated since the last integration.
    force_accum: Vec3,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            damping: 1.0,
            inverse_mass: 1.0,
            force_accum: Vec3::ZERO,
        }
    }
}

impl Particle {
    /// Creates a particle of the given mass at `position`.
    ///
    /// A non-positive or infinite mass makes the particle immovable.
    pub fn new(position: Vec3, mass: f32) -> Self {
        let mut particle = Self {
            position,
            ..Default::default()
        };
        particle.set_mass(mass);
        particle
    }

    /// Creates an immovable particle.
    pub fn immovable(position: Vec3) -> Self {
        Self {
            position,
            inverse_mass: 0.0,
            ..Default::default()
        }
    }

    /// Sets the velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the constant acceleration.
    pub fn with_acceleration(mut self, acceleration: Vec3) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Sets the per-second damping factor.
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    /// Inverse mass (0 = immovable).
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Sets the inverse mass. Negative values are clamped to 0.
    pub fn set_inverse_mass(&mut self, inverse_mass: f32) {
        self.inverse_mass = inverse_mass.max(0.0);
    }

    /// Sets the mass. Non-positive or infinite mass makes the particle immovable.
    pub fn set_mass(&mut self, mass: f32) {
        self.inverse_mass = if mass > 0.0 && mass.is_finite() {
            1.0 / mass
        } else {
            0.0
        };
    }

    /// Mass, or `f32::INFINITY` for immovable particles.
    pub fn mass(&self) -> f32 {
        if self.inverse_mass == 0.0 {
            f32::INFINITY
        } else {
            1.0 / self.inverse_mass
        }
    }

    /// Returns true unless the particle is immovable.
    pub fn has_finite_mass(&self) -> bool {
        self.inverse_mass > 0.0
    }

    /// Force accumulated since the last integration.
    pub fn accumulated_force(&self) -> Vec3 {
        self.force_accum
    }

    /// Adds a force for the next integration.
    pub fn add_force(&mut self, force: Vec3) {
        self.force_accum += force;
    }

    /// Clears the accumulated force.
    pub fn clear_accumulator(&mut self) {
        self.force_accum = Vec3::ZERO;
    }

    /// Advances the particle by `dt` seconds.
    ///
    /// Position moves with the velocity from before this step, then the
    /// velocity picks up `acceleration + force * inverse_mass`, decays by
    /// `damping^dt`, and the force accumulator is cleared.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not positive.
    pub fn integrate(&mut self, dt: f32) {
        assert!(dt > 0.0, "integration step must be positive, got {dt}");

        self.position += self.velocity * dt;

        let acceleration = self.acceleration + self.force_accum * self.inverse_mass;
        self.velocity += acceleration * dt;
        self.velocity *= self.damping.powf(dt);

        self.clear_accumulator();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_conversions() {
        let p = Particle::new(Vec3::ZERO, 4.0);
        assert_eq!(p.inverse_mass(), 0.25);
        assert_eq!(p.mass(), 4.0);
        assert!(p.has_finite_mass());

        let wall = Particle::immovable(Vec3::ZERO);
        assert_eq!(wall.mass(), f32::INFINITY);
        assert!(!wall.has_finite_mass());

        assert_eq!(Particle::new(Vec3::ZERO, 0.0).inverse_mass(), 0.0);
    }

    #[test]
    fn test_negative_inverse_mass_clamped() {
        let mut p = Particle::default();
        p.set_inverse_mass(-2.0);
        assert_eq!(p.inverse_mass(), 0.0);
    }

    #[test]
    fn test_position_uses_previous_velocity() {
        let mut p = Particle::new(Vec3::ZERO, 1.0)
            .with_velocity(Vec3::X)
            .with_acceleration(Vec3::new(0.0, -10.0, 0.0));
        p.integrate(0.5);

        assert_eq!(p.position, Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(p.velocity, Vec3::new(1.0, -5.0, 0.0));
    }

    #[test]
    fn test_force_scaled_by_inverse_mass_and_cleared() {
        let mut p = Particle::new(Vec3::ZERO, 2.0);
        p.add_force(Vec3::new(4.0, 0.0, 0.0));
        p.integrate(1.0);

        assert_eq!(p.velocity, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(p.accumulated_force(), Vec3::ZERO);
    }

    #[test]
    fn test_damping_is_per_second() {
        let mut once = Particle::new(Vec3::ZERO, 1.0)
            .with_velocity(Vec3::X)
            .with_damping(0.5);
        once.integrate(1.0);

        let mut halves = once.clone().with_velocity(Vec3::X);
        halves.integrate(0.5);
        halves.integrate(0.5);

        assert!((once.velocity.x - 0.5).abs() < 1e-6);
        assert!((halves.velocity.x - 0.5).abs() < 1e-6, "v = {}", halves.velocity.x);
    }

    #[test]
    fn test_integrate_is_deterministic() {
        let mut p = Particle::new(Vec3::new(1.0, 2.0, 3.0), 3.0)
            .with_velocity(Vec3::new(-1.0, 0.5, 2.0))
            .with_acceleration(Vec3::new(0.0, -9.81, 0.0))
            .with_damping(0.9);
        p.add_force(Vec3::new(0.3, 0.1, -0.7));

        let mut a = p.clone();
        let mut b = p;
        a.integrate(1.0 / 60.0);
        b.integrate(1.0 / 60.0);
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic(expected = "integration step must be positive")]
    fn test_zero_step_panics() {
        Particle::default().integrate(0.0);
    }
}
