//! Per-tick collision detection and resolution.
//!
//! [`CollisionResolver`] is driven in a fixed order each tick:
//!
//! 1. `reset` once, to snapshot every registered collider.
//! 2. `prepare` to rebuild world matrices and broadphase spheres.
//! 3. `check` to test every pair; returns whether anything collides.
//! 4. `resolve` to push colliding bodies apart and exchange momentum.
//!
//! Steps 2-4 repeat until `check` finds nothing or the caller's iteration
//! cap is reached. Calling out of order works on stale snapshots.

use glam::{Mat4, Vec3};
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::body::{BodyHandle, BodySet};
use crate::detect::{
    CollisionResult, check_static_broadphase, simple_mesh_vs_simple_mesh, sphere_vs_simple_mesh,
    sphere_vs_sphere,
};
use crate::error::PhysicsError;
use crate::mesh::{BoundingSphere, SimpleMesh};
use crate::particle::Particle;

/// How penetration is split between the two bodies of a collision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PositionCorrection {
    /// Each body moves half the depth, whatever its mass.
    #[default]
    Split,
    /// Bodies move in proportion to their inverse mass.
    InverseMass,
}

/// Which part of the velocities takes part in the elastic exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MomentumExchange {
    /// The 1-D formula applied to whole velocity vectors.
    #[default]
    FullVelocity,
    /// The 1-D formula applied to the components along the collision axis.
    AlongAxis,
}

/// Index of a collider in a [`CollisionResolver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColliderHandle(usize);

impl ColliderHandle {
    /// The raw index into the owning resolver.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Collision geometry attached to a body, in the body's local space.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsCollider {
    /// Body whose transform and velocity the collider uses.
    pub body: BodyHandle,
    /// Broadphase volume. Should enclose `narrowphase`.
    pub broadphase: BoundingSphere,
    /// Convex mesh for the narrowphase; sphere-only when `None`.
    pub narrowphase: Option<SimpleMesh>,
}

impl PhysicsCollider {
    /// A sphere-only collider.
    pub fn sphere(body: BodyHandle, broadphase: BoundingSphere) -> Self {
        Self {
            body,
            broadphase,
            narrowphase: None,
        }
    }

    /// A mesh collider with an explicit broadphase sphere.
    pub fn new(body: BodyHandle, broadphase: BoundingSphere, mesh: SimpleMesh) -> Self {
        Self {
            body,
            broadphase,
            narrowphase: Some(mesh),
        }
    }

    /// A mesh collider whose broadphase sphere encloses the mesh.
    pub fn from_mesh(body: BodyHandle, mesh: SimpleMesh) -> Self {
        Self::new(body, BoundingSphere::enclosing(&mesh), mesh)
    }
}

/// World-space snapshot of a collider for the current tick.
#[derive(Clone, Debug)]
pub struct TransformedCollider {
    /// Collider this snapshot was taken from.
    pub collider: ColliderHandle,
    /// Body the collider belongs to.
    pub body: BodyHandle,
    /// Local-to-world matrix from the last `prepare`.
    pub matrix: Mat4,
    /// World-space broadphase sphere.
    pub sphere: BoundingSphere,
    /// World-space narrowphase mesh, filled lazily.
    pub mesh: SimpleMesh,
    /// Whether `mesh` matches `matrix`.
    pub has_mesh_transformed: bool,
    has_narrowphase: bool,
}

impl TransformedCollider {
    fn new(handle: ColliderHandle, collider: &PhysicsCollider) -> Self {
        Self {
            collider: handle,
            body: collider.body,
            matrix: Mat4::IDENTITY,
            sphere: collider.broadphase,
            mesh: SimpleMesh::default(),
            has_mesh_transformed: false,
            has_narrowphase: collider.narrowphase.is_some(),
        }
    }
}

/// A colliding pair found by `check`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionRecord {
    /// Index of the first transformed collider.
    pub first: usize,
    /// Index of the second transformed collider.
    pub second: usize,
    /// Narrowphase outcome, relative to `first`.
    pub result: CollisionResult,
}

/// Registered colliders plus the per-tick snapshots and collision records.
#[derive(Clone, Debug, Default)]
pub struct CollisionResolver {
    colliders: Vec<PhysicsCollider>,
    transformed: Vec<TransformedCollider>,
    records: Vec<CollisionRecord>,
    /// Penetration split policy.
    pub position_correction: PositionCorrection,
    /// Velocity exchange policy.
    pub momentum_exchange: MomentumExchange,
}

impl CollisionResolver {
    /// Creates a resolver with the default policies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver with explicit policies.
    pub fn with_policies(correction: PositionCorrection, exchange: MomentumExchange) -> Self {
        Self {
            position_correction: correction,
            momentum_exchange: exchange,
            ..Self::default()
        }
    }

    /// Registers a collider. Its body must exist in `bodies`.
    pub fn add_collider(
        &mut self,
        bodies: &BodySet,
        collider: PhysicsCollider,
    ) -> Result<ColliderHandle, PhysicsError> {
        if !bodies.contains(collider.body) {
            return Err(PhysicsError::UnknownBody(collider.body));
        }
        let handle = ColliderHandle(self.colliders.len());
        self.colliders.push(collider);
        Ok(handle)
    }

    /// Registered colliders.
    pub fn colliders(&self) -> &[PhysicsCollider] {
        &self.colliders
    }

    /// Get a registered collider.
    pub fn collider(&self, handle: ColliderHandle) -> Option<&PhysicsCollider> {
        self.colliders.get(handle.0)
    }

    /// Snapshots from the last `reset`.
    pub fn transformed(&self) -> &[TransformedCollider] {
        &self.transformed
    }

    /// Collisions found by the last `check`.
    pub fn records(&self) -> &[CollisionRecord] {
        &self.records
    }

    /// Discards last tick's snapshots and takes fresh, untransformed ones.
    pub fn reset(&mut self) {
        self.transformed.clear();
        self.records.clear();
        self.transformed.extend(
            self.colliders
                .iter()
                .enumerate()
                .map(|(i, c)| TransformedCollider::new(ColliderHandle(i), c)),
        );
    }

    /// Drops old records and recomputes world matrices and broadphase spheres.
    pub fn prepare(&mut self, bodies: &BodySet) -> Result<(), PhysicsError> {
        self.records.clear();
        for snapshot in &mut self.transformed {
            let transform = bodies.try_get(snapshot.body)?.transform();
            let local = &self.colliders[snapshot.collider.0];

            snapshot.matrix = transform.matrix();
            snapshot.sphere = local
                .broadphase
                .transformed(&snapshot.matrix, transform.max_axis_scale());
        }
        Ok(())
    }

    /// Tests every pair of snapshots and records the colliding ones.
    ///
    /// Returns true if any pair collides.
    pub fn check(&mut self) -> bool {
        let mut found = false;
        let count = self.transformed.len();

        for i in 0..count {
            for j in (i + 1)..count {
                if self.transformed[i].body == self.transformed[j].body {
                    continue;
                }
                let (a, b) = (&self.transformed[i].sphere, &self.transformed[j].sphere);
                if !check_static_broadphase(a, b) {
                    continue;
                }

                ensure_mesh(&self.colliders, &mut self.transformed[i]);
                ensure_mesh(&self.colliders, &mut self.transformed[j]);

                let result = narrowphase(&self.transformed[i], &self.transformed[j]);
                if result.is_colliding {
                    trace!(
                        first = i,
                        second = j,
                        depth = result.distance,
                        axis = %result.axis,
                        "collision"
                    );
                    self.records.push(CollisionRecord {
                        first: i,
                        second: j,
                        result,
                    });
                    found = true;
                }
            }
        }

        found
    }

    /// Separates every recorded pair and exchanges their momentum.
    pub fn resolve(&mut self, bodies: &mut BodySet) -> Result<(), PhysicsError> {
        for record in &self.records {
            let handle_a = self.transformed[record.first].body;
            let handle_b = self.transformed[record.second].body;
            let (a, b) = bodies.pair_mut(handle_a, handle_b)?;

            let CollisionResult { axis, distance, .. } = record.result;
            let (share_a, share_b) = match self.position_correction {
                PositionCorrection::Split => (0.5, 0.5),
                PositionCorrection::InverseMass => {
                    let (ia, ib) = (a.particle.inverse_mass(), b.particle.inverse_mass());
                    let total = ia + ib;
                    if total > 0.0 {
                        (ia / total, ib / total)
                    } else {
                        (0.0, 0.0)
                    }
                }
            };
            a.particle.position -= axis * distance * share_a;
            b.particle.position += axis * distance * share_b;

            // Every collider on a moved body is stale, not only the pair's.
            for snapshot in &mut self.transformed {
                if snapshot.body == handle_a || snapshot.body == handle_b {
                    snapshot.has_mesh_transformed = false;
                }
            }

            exchange_momentum(&mut a.particle, &mut b.particle, axis, self.momentum_exchange);

            trace!(
                first = ?handle_a,
                second = ?handle_b,
                depth = distance,
                "resolved"
            );
        }
        Ok(())
    }
}

/// Transforms the snapshot's mesh once per tick.
fn ensure_mesh(colliders: &[PhysicsCollider], snapshot: &mut TransformedCollider) {
    if snapshot.has_mesh_transformed {
        return;
    }
    if let Some(mesh) = &colliders[snapshot.collider.0].narrowphase {
        mesh.transform_into(&snapshot.matrix, &mut snapshot.mesh);
    }
    snapshot.has_mesh_transformed = true;
}

fn narrowphase(a: &TransformedCollider, b: &TransformedCollider) -> CollisionResult {
    match (a.has_narrowphase, b.has_narrowphase) {
        (true, true) => simple_mesh_vs_simple_mesh(&a.mesh, &b.mesh),
        (false, true) => sphere_vs_simple_mesh(&a.sphere, &b.mesh),
        (true, false) => sphere_vs_simple_mesh(&b.sphere, &a.mesh).flip(),
        (false, false) => sphere_vs_sphere(&a.sphere, &b.sphere),
    }
}

/// One-dimensional elastic collision applied to whole velocity vectors.
///
/// Masses must be finite and positive; momentum and kinetic energy are
/// conserved exactly for head-on impacts.
pub fn momentum_collision_response(v1: Vec3, v2: Vec3, m1: f32, m2: f32) -> (Vec3, Vec3) {
    let total = m1 + m2;
    let out1 = v1 * ((m1 - m2) / total) + v2 * (2.0 * m2 / total);
    let out2 = v2 * ((m2 - m1) / total) + v1 * (2.0 * m1 / total);
    (out1, out2)
}

/// Elastic exchange that tolerates immovable bodies.
///
/// An immovable body keeps its velocity and the other reflects relative to
/// it, which is the limit of [`momentum_collision_response`] as one mass
/// grows without bound.
fn elastic_exchange(v1: Vec3, v2: Vec3, inverse_m1: f32, inverse_m2: f32) -> (Vec3, Vec3) {
    match (inverse_m1 > 0.0, inverse_m2 > 0.0) {
        (true, true) => momentum_collision_response(v1, v2, 1.0 / inverse_m1, 1.0 / inverse_m2),
        (false, true) => (v1, 2.0 * v1 - v2),
        (true, false) => (2.0 * v2 - v1, v2),
        (false, false) => (v1, v2),
    }
}

fn exchange_momentum(a: &mut Particle, b: &mut Particle, axis: Vec3, mode: MomentumExchange) {
    let (ia, ib) = (a.inverse_mass(), b.inverse_mass());
    match mode {
        MomentumExchange::FullVelocity => {
            let (va, vb) = elastic_exchange(a.velocity, b.velocity, ia, ib);
            a.velocity = va;
            b.velocity = vb;
        }
        MomentumExchange::AlongAxis => {
            let n = axis.normalize_or_zero();
            let along_a = n * a.velocity.dot(n);
            let along_b = n * b.velocity.dot(n);
            let (new_a, new_b) = elastic_exchange(along_a, along_b, ia, ib);
            a.velocity += new_a - along_a;
            b.velocity += new_b - along_b;
        }
    }
}
