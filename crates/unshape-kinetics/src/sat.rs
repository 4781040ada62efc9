//! Separating-axis projection primitives.
//!
//! A [`Projection`] is the interval a shape covers along one axis. Two
//! projections on the same axis are classified by [`overlap`].

use glam::Vec3;

use crate::mesh::{AxisExtremes, BoundingSphere, SimpleMesh};

/// Interval covered by a shape along an axis, with the points that reach each end.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Axis projected onto.
    pub axis: Vec3,
    /// Smallest `dot(axis, p)` seen so far.
    pub min: f32,
    /// Largest `dot(axis, p)` seen so far.
    pub max: f32,
    /// Point achieving `min`.
    pub min_point: Vec3,
    /// Point achieving `max`.
    pub max_point: Vec3,
}

impl Projection {
    /// An empty projection onto `axis` (`min > max` until a point is added).
    pub fn new(axis: Vec3) -> Self {
        Self {
            axis,
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            min_point: Vec3::ZERO,
            max_point: Vec3::ZERO,
        }
    }

    /// Returns true until something has been projected.
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Widens the interval to include `point`.
    pub fn project_point(&mut self, point: Vec3) {
        let d = self.axis.dot(point);
        if d < self.min {
            self.min = d;
            self.min_point = point;
        }
        if d > self.max {
            self.max = d;
            self.max_point = point;
        }
    }

    /// Widens the interval to include a sphere.
    pub fn project_sphere(&mut self, sphere: &BoundingSphere) {
        let d = self.axis.dot(sphere.center);
        let r = sphere.radius.abs();
        if d - r < self.min {
            self.min = d - r;
            self.min_point = sphere.center - self.axis * r;
        }
        if d + r > self.max {
            self.max = d + r;
            self.max_point = sphere.center + self.axis * r;
        }
    }

    /// Widens the interval to include every vertex of `mesh`.
    ///
    /// Returns the indices of the vertices that set the mesh's own minimum and
    /// maximum, or `None` for a mesh without vertices.
    pub fn project_mesh(&mut self, mesh: &SimpleMesh) -> Option<AxisExtremes> {
        let mut extremes: Option<(usize, f32, usize, f32)> = None;
        for (i, &v) in mesh.vertices().iter().enumerate() {
            let d = self.axis.dot(v);
            extremes = Some(match extremes {
                None => (i, d, i, d),
                Some((lo, lo_d, hi, hi_d)) => {
                    let (lo, lo_d) = if d < lo_d { (i, d) } else { (lo, lo_d) };
                    let (hi, hi_d) = if d > hi_d { (i, d) } else { (hi, hi_d) };
                    (lo, lo_d, hi, hi_d)
                }
            });
        }

        let (min, _, max, _) = extremes?;
        self.project_point(mesh.vertices()[min]);
        self.project_point(mesh.vertices()[max]);
        Some(AxisExtremes { min, max })
    }

    /// Widens the interval using precomputed extremal vertices.
    ///
    /// The caller guarantees `extremes` was computed for this axis direction.
    pub fn project_cached(&mut self, mesh: &SimpleMesh, extremes: AxisExtremes) {
        self.project_point(mesh.vertices()[extremes.min]);
        self.project_point(mesh.vertices()[extremes.max]);
    }

    /// Length of the interval.
    pub fn length(&self) -> f32 {
        self.max - self.min
    }
}

/// How two projections on the same axis relate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlap {
    /// The shared axis.
    pub axis: Vec3,
    /// Signed penetration depth: the length of the shared span (zero unless
    /// overlapping).
    ///
    /// Positive means the first interval lies toward `-axis` of the second and
    /// should move that way; negative means the reverse.
    pub push: f32,
    /// Intervals meet or overlap.
    pub is_touching: bool,
    /// Intervals share a span of positive length.
    pub is_overlapping: bool,
    /// One interval lies within the other.
    pub is_containing: bool,
    /// Both ends coincide.
    pub is_exact_match: bool,
}

impl Overlap {
    fn separated(axis: Vec3) -> Self {
        Self {
            axis,
            push: 0.0,
            is_touching: false,
            is_overlapping: false,
            is_containing: false,
            is_exact_match: false,
        }
    }
}

/// Classifies two projections onto the same axis.
///
/// # Panics
///
/// Panics if the axes are not bit-identical or either interval has `min > max`.
/// Both indicate a logic error in the caller.
pub fn overlap(p1: &Projection, p2: &Projection) -> Overlap {
    assert!(
        p1.axis.to_array().map(f32::to_bits) == p2.axis.to_array().map(f32::to_bits),
        "projections on different axes: {} vs {}",
        p1.axis,
        p2.axis
    );
    assert!(
        p1.min <= p1.max && p2.min <= p2.max,
        "malformed projection: [{}, {}] vs [{}, {}]",
        p1.min,
        p1.max,
        p2.min,
        p2.max
    );

    let (a, b) = (p1, p2);
    let axis = a.axis;

    if a.max < b.min || b.max < a.min {
        return Overlap::separated(axis);
    }

    if a.max == b.min || b.max == a.min {
        return Overlap {
            is_touching: true,
            ..Overlap::separated(axis)
        };
    }

    // `a` is behind `b` when it clears by moving down no further than up.
    let down = a.max - b.min;
    let up = b.max - a.min;
    let span = a.max.min(b.max) - a.min.max(b.min);
    let push = if down <= up { span } else { -span };

    let a_in_b = b.min <= a.min && a.max <= b.max;
    let b_in_a = a.min <= b.min && b.max <= a.max;
    let partial = (a.min < b.min && b.min < a.max && a.max < b.max)
        || (b.min < a.min && a.min < b.max && b.max < a.max);

    if a_in_b || b_in_a {
        Overlap {
            axis,
            push,
            is_touching: true,
            is_overlapping: true,
            is_containing: true,
            is_exact_match: a.min == b.min && a.max == b.max,
        }
    } else if partial {
        Overlap {
            axis,
            push,
            is_touching: true,
            is_overlapping: true,
            is_containing: false,
            is_exact_match: false,
        }
    } else {
        unreachable!(
            "impossible projection overlap: [{}, {}] vs [{}, {}]",
            a.min, a.max, b.min, b.max
        )
    }
}
