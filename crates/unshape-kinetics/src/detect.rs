//! Broadphase and narrowphase collision tests.
//!
//! The narrowphase is a face-normal separating-axis test: only each shape's
//! own face normals are tried, never edge-edge cross products. Skewed boxes
//! can therefore be reported as colliding when an edge axis would separate
//! them.

use glam::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::mesh::{AxisExtremes, BoundingSphere, SimpleMesh};
use crate::sat::{overlap, Overlap, Projection};

/// Outcome of a narrowphase test.
///
/// `distance` follows [`Overlap::push`]: the first shape separates by moving
/// `-axis * distance`, the second by `+axis * distance`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollisionResult {
    /// Axis of minimum penetration (or the separating axis).
    pub axis: Vec3,
    /// Signed penetration depth along `axis`.
    pub distance: f32,
    /// Shapes meet or overlap.
    pub is_touching: bool,
    /// Shapes overlap with positive depth.
    pub is_colliding: bool,
    /// One projection contains the other on the chosen axis.
    pub is_contained: bool,
    /// Projections coincide on the chosen axis.
    pub is_match: bool,
}

impl CollisionResult {
    /// A result with no contact at all.
    pub fn separated(axis: Vec3) -> Self {
        Overlap {
            axis,
            push: 0.0,
            is_touching: false,
            is_overlapping: false,
            is_containing: false,
            is_exact_match: false,
        }
        .into()
    }

    /// The same result seen from the other shape.
    #[inline]
    pub fn flip(mut self) -> Self {
        self.distance = -self.distance;
        self
    }
}

impl From<Overlap> for CollisionResult {
    fn from(o: Overlap) -> Self {
        Self {
            axis: o.axis,
            distance: o.push,
            is_touching: o.is_touching,
            is_colliding: o.is_overlapping,
            is_contained: o.is_containing,
            is_match: o.is_exact_match,
        }
    }
}

/// Returns true if two spheres touch or overlap.
pub fn check_static_broadphase(a: &BoundingSphere, b: &BoundingSphere) -> bool {
    let reach = a.radius + b.radius;
    (b.center - a.center).length_squared() <= reach * reach
}

/// Result of scanning a set of candidate axes.
enum AxisSearch {
    /// Some axis separates the shapes.
    Separated(Overlap),
    /// Every axis touched; the shallowest one.
    Touching(Overlap),
    /// No axes to test.
    Empty,
}

/// Stops at the first separating axis, otherwise keeps the smallest `|push|`.
fn search_axes(candidates: impl IntoIterator<Item = Overlap>) -> AxisSearch {
    let mut best: Option<Overlap> = None;
    for candidate in candidates {
        if !candidate.is_touching {
            return AxisSearch::Separated(candidate);
        }
        if best.map_or(true, |b| candidate.push.abs() < b.push.abs()) {
            best = Some(candidate);
        }
    }
    match best {
        Some(o) => AxisSearch::Touching(o),
        None => AxisSearch::Empty,
    }
}

fn project_along(mesh: &SimpleMesh, axis: Vec3, cache: Option<AxisExtremes>) -> Projection {
    let mut projection = Projection::new(axis);
    match cache {
        Some(extremes) => projection.project_cached(mesh, extremes),
        None => {
            projection.project_mesh(mesh);
        }
    }
    projection
}

/// Overlaps along every face normal of `owner`, owner's interval first.
///
/// With `swapped`, push is negated so it stays relative to `other`, which is
/// the first shape of the pair.
fn face_axis_overlaps<'a>(
    owner: &'a SimpleMesh,
    other: &'a SimpleMesh,
    swapped: bool,
) -> impl Iterator<Item = Overlap> + 'a {
    owner.axes().iter().enumerate().map(move |(i, axis)| {
        let own = project_along(owner, axis.normal, axis.extremes);

        // The other mesh's cache is only usable when it has the very same
        // direction at the same slot.
        let other_cache = other
            .axes()
            .get(i)
            .filter(|a| a.normal == axis.normal)
            .and_then(|a| a.extremes);
        let theirs = project_along(other, axis.normal, other_cache);

        let mut o = overlap(&own, &theirs);
        if swapped {
            o.push = -o.push;
        }
        o
    })
}

/// Two-pass face-normal SAT between convex meshes in the same space.
pub fn simple_mesh_vs_simple_mesh(a: &SimpleMesh, b: &SimpleMesh) -> CollisionResult {
    if a.is_empty() || b.is_empty() {
        return CollisionResult::separated(Vec3::ZERO);
    }

    let first = match search_axes(face_axis_overlaps(a, b, false)) {
        AxisSearch::Separated(o) => return o.into(),
        AxisSearch::Touching(o) => Some(o),
        AxisSearch::Empty => None,
    };
    let second = match search_axes(face_axis_overlaps(b, a, true)) {
        AxisSearch::Separated(o) => return o.into(),
        AxisSearch::Touching(o) => Some(o),
        AxisSearch::Empty => None,
    };

    match (first, second) {
        (Some(x), Some(y)) if y.push.abs() < x.push.abs() => y.into(),
        (Some(x), _) => x.into(),
        (None, Some(y)) => y.into(),
        (None, None) => CollisionResult::separated(Vec3::ZERO),
    }
}

/// SAT between a sphere (first) and a convex mesh (second).
///
/// Axes are the mesh's face normals plus the direction from the sphere centre
/// to the closest mesh vertex.
pub fn sphere_vs_simple_mesh(sphere: &BoundingSphere, mesh: &SimpleMesh) -> CollisionResult {
    if mesh.is_empty() {
        return CollisionResult::separated(Vec3::ZERO);
    }

    let closest = mesh
        .vertices()
        .iter()
        .copied()
        .min_by(|p, q| {
            p.distance_squared(sphere.center)
                .total_cmp(&q.distance_squared(sphere.center))
        })
        .and_then(|v| (v - sphere.center).try_normalize());

    let face_axes = mesh.axes().iter().map(|a| (a.normal, a.extremes));
    let vertex_axis = closest.map(|axis| (axis, None));

    let overlaps = face_axes.chain(vertex_axis).map(|(axis, cache)| {
        let mut own = Projection::new(axis);
        own.project_sphere(sphere);
        let theirs = project_along(mesh, axis, cache);
        overlap(&own, &theirs)
    });

    match search_axes(overlaps) {
        AxisSearch::Separated(o) | AxisSearch::Touching(o) => o.into(),
        AxisSearch::Empty => CollisionResult::separated(Vec3::ZERO),
    }
}

/// SAT between two spheres along the line joining their centres.
pub fn sphere_vs_sphere(a: &BoundingSphere, b: &BoundingSphere) -> CollisionResult {
    let axis = (b.center - a.center).try_normalize().unwrap_or(Vec3::X);

    let mut pa = Projection::new(axis);
    pa.project_sphere(a);
    let mut pb = Projection::new(axis);
    pb.project_sphere(b);

    overlap(&pa, &pb).into()
}
