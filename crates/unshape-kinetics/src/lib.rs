//! Particle dynamics with separating-axis collision detection for resin.
//!
//! Provides a small rigid-particle simulation:
//! - `Particle` - point mass with damping and a force accumulator
//! - `ForceRegistry` - gravity, gravity wells and springs applied per tick
//! - `SimpleMesh` / `BoundingSphere` - convex collision shapes
//! - `CollisionResolver` - broadphase spheres, SAT narrowphase, penetration
//!   and momentum response
//! - `PhysicsWorld` - drives forces, integration and resolution each tick
//!
//! ```
//! use unshape_kinetics::{
//!     Gravity, Particle, Physics, PhysicsCollider, PhysicsWorld, SimpleMesh, Vec3,
//! };
//!
//! let mut world = PhysicsWorld::new(Physics::default()).unwrap();
//! let floor = world.add_body(Particle::immovable(Vec3::ZERO));
//! let ball = world.add_body(Particle::new(Vec3::new(0.0, 3.0, 0.0), 1.0));
//!
//! let gravity = world.add_generator(Gravity::default());
//! world.register_force(ball, gravity).unwrap();
//!
//! let cube = SimpleMesh::cuboid(Vec3::splat(0.5));
//! world.add_collider(PhysicsCollider::from_mesh(floor, cube.clone())).unwrap();
//! world.add_collider(PhysicsCollider::from_mesh(ball, cube)).unwrap();
//!
//! for _ in 0..60 {
//!     world.step().unwrap();
//! }
//! ```

pub mod body;
pub mod detect;
pub mod error;
pub mod force;
pub mod math;
pub mod mesh;
pub mod particle;
pub mod resolver;
pub mod sat;
pub mod world;

pub use glam::{Mat3, Mat4, Quat, Vec3, Vec4};

pub use body::{Body, BodyHandle, BodySet};
pub use detect::{
    CollisionResult, check_static_broadphase, simple_mesh_vs_simple_mesh, sphere_vs_simple_mesh,
    sphere_vs_sphere,
};
pub use error::PhysicsError;
pub use force::{
    Anchor, AnchoredGravityWell, AnchoredSpring, ForceGenerator, ForceRegistration, ForceRegistry,
    GRAVITATIONAL_CONSTANT, GeneratorHandle, Gravity,
};
pub use math::{Transform, normal_matrix};
pub use mesh::{AxisExtremes, BoundingSphere, FaceAxis, SimpleMesh};
pub use particle::Particle;
pub use resolver::{
    ColliderHandle, CollisionRecord, CollisionResolver, MomentumExchange, PhysicsCollider,
    PositionCorrection, TransformedCollider, momentum_collision_response,
};
pub use sat::{Overlap, Projection, overlap};
pub use world::{Physics, PhysicsConfig, PhysicsWorld, StepReport};
