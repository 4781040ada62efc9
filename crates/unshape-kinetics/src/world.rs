//! Physics simulation world.
//!
//! Contains the `PhysicsWorld` container that drives one tick: accumulate
//! forces, integrate particles, then detect and resolve collisions until
//! nothing overlaps or the iteration cap is hit.

use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyHandle, BodySet};
use crate::error::PhysicsError;
use crate::force::{ForceGenerator, ForceRegistry, GeneratorHandle};
use crate::resolver::{
    ColliderHandle, CollisionResolver, MomentumExchange, PhysicsCollider, PositionCorrection,
};

/// Configuration for physics simulation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Physics {
    /// Time step used by [`PhysicsWorld::step`].
    pub dt: f32,
    /// Upper bound on detect/resolve passes per tick.
    pub max_resolution_iterations: u32,
    /// How penetration is split between colliding bodies.
    pub position_correction: PositionCorrection,
    /// How velocities are exchanged on impact.
    pub momentum_exchange: MomentumExchange,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            max_resolution_iterations: 10,
            position_correction: PositionCorrection::default(),
            momentum_exchange: MomentumExchange::default(),
        }
    }
}

impl Physics {
    /// Checks the time step and iteration cap.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        validate_timestep(self.dt)?;
        if self.max_resolution_iterations == 0 {
            return Err(PhysicsError::InvalidIterationCap);
        }
        Ok(())
    }
}

/// Backwards-compatible type alias.
pub type PhysicsConfig = Physics;

fn validate_timestep(dt: f32) -> Result<(), PhysicsError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidTimestep(dt))
    }
}

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Detect/resolve passes that found at least one collision.
    pub iterations: u32,
    /// Collisions resolved across all passes.
    pub collisions: usize,
    /// Whether the final check found nothing. False when the cap was hit.
    pub converged: bool,
}

/// The physics simulation world.
#[derive(Debug)]
pub struct PhysicsWorld {
    bodies: BodySet,
    forces: ForceRegistry,
    resolver: CollisionResolver,
    config: Physics,
}

impl PhysicsWorld {
    /// Create a new physics world.
    pub fn new(config: PhysicsConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        let resolver =
            CollisionResolver::with_policies(config.position_correction, config.momentum_exchange);
        Ok(Self {
            bodies: BodySet::new(),
            forces: ForceRegistry::new(),
            resolver,
            config,
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &Physics {
        &self.config
    }

    /// Add a body and return its handle.
    pub fn add_body(&mut self, body: impl Into<Body>) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Get a body by handle.
    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    /// Get a mutable body by handle.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    /// All bodies.
    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    /// Store a force generator.
    pub fn add_generator(&mut self, generator: impl ForceGenerator + 'static) -> GeneratorHandle {
        self.forces.add_generator(generator)
    }

    /// Apply a stored generator to a body every tick.
    pub fn register_force(
        &mut self,
        body: BodyHandle,
        generator: GeneratorHandle,
    ) -> Result<(), PhysicsError> {
        self.forces.register(&self.bodies, body, generator)
    }

    /// The force registry.
    pub fn forces(&self) -> &ForceRegistry {
        &self.forces
    }

    /// Mutable access to the force registry.
    pub fn forces_mut(&mut self) -> &mut ForceRegistry {
        &mut self.forces
    }

    /// Attach a collider to one of this world's bodies.
    pub fn add_collider(
        &mut self,
        collider: PhysicsCollider,
    ) -> Result<ColliderHandle, PhysicsError> {
        self.resolver.add_collider(&self.bodies, collider)
    }

    /// The collision resolver and its last tick's state.
    pub fn resolver(&self) -> &CollisionResolver {
        &self.resolver
    }

    /// Step the simulation forward by the configured time step.
    pub fn step(&mut self) -> Result<StepReport, PhysicsError> {
        self.step_by(self.config.dt)
    }

    /// Step the simulation forward by `dt`.
    pub fn step_by(&mut self, dt: f32) -> Result<StepReport, PhysicsError> {
        validate_timestep(dt)?;

        self.forces.update_forces(&mut self.bodies, dt)?;
        for body in self.bodies.iter_mut() {
            body.particle.integrate(dt);
        }

        self.resolver.reset();
        let mut report = StepReport::default();
        for _ in 0..self.config.max_resolution_iterations {
            self.resolver.prepare(&self.bodies)?;
            if !self.resolver.check() {
                report.converged = true;
                break;
            }
            report.iterations += 1;
            report.collisions += self.resolver.records().len();
            self.resolver.resolve(&mut self.bodies)?;
        }

        if !report.converged {
            // Residual overlap is carried into the next tick.
            debug!(
                cap = self.config.max_resolution_iterations,
                collisions = report.collisions,
                "resolution iteration cap reached"
            );
        }
        debug!(
            dt,
            bodies = self.bodies.len(),
            iterations = report.iterations,
            collisions = report.collisions,
            converged = report.converged,
            "physics step"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::{Anchor, AnchoredGravityWell, AnchoredSpring, Gravity};
    use crate::mesh::{BoundingSphere, SimpleMesh};
    use crate::particle::Particle;
    use glam::Vec3;

    fn cube_collider(body: BodyHandle) -> PhysicsCollider {
        PhysicsCollider::new(
            body,
            BoundingSphere::new(Vec3::ZERO, 1.0),
            SimpleMesh::cuboid(Vec3::splat(0.5)),
        )
    }

    #[test]
    fn test_default_config() {
        let config = Physics::default();
        assert_eq!(config.dt, 1.0 / 60.0);
        assert_eq!(config.max_resolution_iterations, 10);
        assert_eq!(config.position_correction, PositionCorrection::Split);
        assert_eq!(config.momentum_exchange, MomentumExchange::FullVelocity);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let zero_dt = Physics {
            dt: 0.0,
            ..Default::default()
        };
        assert_eq!(zero_dt.validate(), Err(PhysicsError::InvalidTimestep(0.0)));

        let no_iterations = Physics {
            max_resolution_iterations: 0,
            ..Default::default()
        };
        assert_eq!(
            PhysicsWorld::new(no_iterations).unwrap_err(),
            PhysicsError::InvalidIterationCap
        );

        let nan = Physics {
            dt: f32::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_json() {
        let json = r#"{ "max_resolution_iterations": 4, "position_correction": "InverseMass" }"#;
        let config: Physics = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_resolution_iterations, 4);
        assert_eq!(config.position_correction, PositionCorrection::InverseMass);
        assert_eq!(config.dt, Physics::default().dt);

        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<Physics>(&json).unwrap(), config);
    }

    #[test]
    fn test_step_by_rejects_bad_dt() {
        let mut world = PhysicsWorld::new(Physics::default()).unwrap();
        assert!(matches!(world.step_by(-1.0), Err(PhysicsError::InvalidTimestep(_))));
    }

    #[test]
    fn test_gravity_fall() {
        let mut world = PhysicsWorld::new(Physics::default()).unwrap();
        let ball = world.add_body(Particle::new(Vec3::new(0.0, 10.0, 0.0), 2.0));
        let gravity = world.add_generator(Gravity::default());
        world.register_force(ball, gravity).unwrap();

        for _ in 0..60 {
            let report = world.step().unwrap();
            assert!(report.converged);
            assert_eq!(report.collisions, 0);
        }

        let p = &world.body(ball).unwrap().particle;
        assert!(p.position.y < 10.0);
        assert!(p.velocity.y < -9.0, "v = {}", p.velocity);
        assert_eq!(p.accumulated_force(), Vec3::ZERO);
    }

    #[test]
    fn test_register_force_unknown_body() {
        let mut world = PhysicsWorld::new(Physics::default()).unwrap();
        let gravity = world.add_generator(Gravity::default());
        let ghost = BodyHandle(7);
        assert_eq!(
            world.register_force(ghost, gravity),
            Err(PhysicsError::UnknownBody(ghost))
        );
    }

    #[test]
    fn test_failed_step_does_not_accumulate() {
        let mut world = PhysicsWorld::new(Physics::default()).unwrap();
        let ball = world.add_body(Particle::new(Vec3::Y * 5.0, 3.0));
        let gravity = world.add_generator(Gravity::default());
        let lost = world.add_generator(AnchoredGravityWell::new(Anchor::Body(BodyHandle(9)), 1.0));
        world.register_force(ball, gravity).unwrap();
        world.register_force(ball, lost).unwrap();

        for _ in 0..3 {
            assert_eq!(world.step(), Err(PhysicsError::UnknownBody(BodyHandle(9))));
        }
        let p = &world.body(ball).unwrap().particle;
        assert_eq!(p.accumulated_force(), Vec3::ZERO);
        assert_eq!(p.position, Vec3::Y * 5.0);
    }

    #[test]
    fn test_step_separates_overlapping_cubes() {
        let mut world = PhysicsWorld::new(Physics::default()).unwrap();
        let a = world.add_body(Particle::new(Vec3::ZERO, 1.0));
        let b = world.add_body(Particle::new(Vec3::new(0.5, 0.0, 0.0), 1.0));
        world.add_collider(cube_collider(a)).unwrap();
        world.add_collider(cube_collider(b)).unwrap();

        let report = world.step().unwrap();
        assert_eq!(report.iterations, 1);
        assert_eq!(report.collisions, 1);
        assert!(report.converged);

        let gap = world.body(b).unwrap().particle.position.x
            - world.body(a).unwrap().particle.position.x;
        assert!((gap - 1.0).abs() < 1e-5, "gap = {gap}");
    }

    #[test]
    fn test_head_on_swap_velocities() {
        let mut world = PhysicsWorld::new(Physics::default()).unwrap();
        let a = world.add_body(Particle::new(Vec3::NEG_X * 0.5, 1.0).with_velocity(Vec3::X));
        let b = world.add_body(Particle::new(Vec3::X * 0.5, 1.0).with_velocity(Vec3::NEG_X));
        world.add_collider(cube_collider(a)).unwrap();
        world.add_collider(cube_collider(b)).unwrap();

        // Both advance 0.25 and overlap by 0.5; one pass pushes them back to touching.
        let report = world.step_by(0.25).unwrap();
        assert_eq!(report.collisions, 1);
        assert!(report.converged);
        assert_eq!(world.body(a).unwrap().particle.velocity, Vec3::NEG_X);
        assert_eq!(world.body(b).unwrap().particle.velocity, Vec3::X);
    }

    #[test]
    fn test_iteration_cap_reports_unconverged() {
        let config = Physics {
            max_resolution_iterations: 1,
            ..Default::default()
        };
        let mut world = PhysicsWorld::new(config).unwrap();
        // A middle cube squeezed between two others needs more than one pass.
        let bodies: Vec<_> = [-0.4, 0.0, 0.4]
            .into_iter()
            .map(|x| world.add_body(Particle::new(Vec3::new(x, 0.0, 0.0), 1.0)))
            .collect();
        for &body in &bodies {
            world.add_collider(cube_collider(body)).unwrap();
        }

        let report = world.step().unwrap();
        assert_eq!(report.iterations, 1);
        assert!(!report.converged);
    }

    #[test]
    fn test_spring_settles_toward_rest() {
        let mut world = PhysicsWorld::new(Physics::default()).unwrap();
        let bob = world.add_body(Particle::new(Vec3::new(3.0, 0.0, 0.0), 1.0).with_damping(0.01));
        let spring = world.add_generator(AnchoredSpring::new(Vec3::ZERO, 10.0, 1.0));
        world.register_force(bob, spring).unwrap();

        for _ in 0..600 {
            world.step().unwrap();
        }
        let x = world.body(bob).unwrap().particle.position.x;
        assert!((x - 1.0).abs() < 0.05, "x = {x}");
    }

    #[test]
    fn test_deterministic_replay() {
        let build = || {
            let mut world = PhysicsWorld::new(Physics::default()).unwrap();
            let gravity = world.add_generator(Gravity::default());
            let floor = world.add_body(Particle::immovable(Vec3::ZERO));
            world.add_collider(cube_collider(floor)).unwrap();
            for i in 0..3 {
                let start = Vec3::new(0.3 * i as f32, 1.5 + i as f32, 0.0);
                let body = world.add_body(Particle::new(start, 1.0));
                world.register_force(body, gravity).unwrap();
                world.add_collider(cube_collider(body)).unwrap();
            }
            world
        };

        let (mut first, mut second) = (build(), build());
        for _ in 0..120 {
            first.step().unwrap();
            second.step().unwrap();
        }
        for ((_, a), (_, b)) in first.bodies().iter().zip(second.bodies().iter()) {
            assert_eq!(a.particle.position, b.particle.position);
            assert_eq!(a.particle.velocity, b.particle.velocity);
        }
    }
}
