//! Collision geometry.
//!
//! - `SimpleMesh` - convex polytope: vertices plus one axis per unique face direction
//! - `BoundingSphere` - broadphase volume

use glam::{Mat4, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;
use crate::math::normal_matrix;
use crate::sat::Projection;

/// Two face directions closer than this (in `1 - cos`) are merged.
const NORMAL_MERGE_TOLERANCE: f32 = 1e-5;

/// Indices of the vertices with the smallest and largest projection on an axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisExtremes {
    /// Vertex with the minimum dot product.
    pub min: usize,
    /// Vertex with the maximum dot product.
    pub max: usize,
}

/// An outward face normal and, optionally, its cached extremal vertices.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FaceAxis {
    /// Unit outward normal.
    pub normal: Vec3,
    /// Cached extremal vertex indices along `normal`.
    pub extremes: Option<AxisExtremes>,
}

impl FaceAxis {
    /// An axis without a cache.
    pub fn new(normal: Vec3) -> Self {
        Self {
            normal,
            extremes: None,
        }
    }
}

/// Convex polytope used by the narrowphase.
///
/// The extremal-vertex caches are only valid for the vertex list they were
/// computed from. [`SimpleMesh::transform_into`] keeps them valid by moving
/// normals with the inverse-transpose of the vertex transform.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimpleMesh {
    vertices: Vec<Vec3>,
    axes: Vec<FaceAxis>,
}

impl SimpleMesh {
    /// Creates a mesh from vertices and face normals, without caches.
    ///
    /// Normals are normalized; zero-length or non-finite normals are rejected.
    pub fn new(vertices: Vec<Vec3>, normals: Vec<Vec3>) -> Result<Self, PhysicsError> {
        let axes = normals.into_iter().map(FaceAxis::new).collect();
        Self::with_extremes(vertices, axes)
    }

    /// Creates a mesh from vertices and axes whose caches were computed elsewhere.
    pub fn with_extremes(
        vertices: Vec<Vec3>,
        mut axes: Vec<FaceAxis>,
    ) -> Result<Self, PhysicsError> {
        if vertices.is_empty() || axes.is_empty() {
            return Err(PhysicsError::EmptyMesh);
        }

        for (index, axis) in axes.iter_mut().enumerate() {
            let length = axis.normal.length();
            if !length.is_finite() || length == 0.0 {
                return Err(PhysicsError::InvalidNormal { index });
            }
            axis.normal /= length;

            if let Some(extremes) = axis.extremes {
                for vertex in [extremes.min, extremes.max] {
                    if vertex >= vertices.len() {
                        return Err(PhysicsError::ExtremeOutOfRange {
                            axis: index,
                            index: vertex,
                            vertex_count: vertices.len(),
                        });
                    }
                }
            }
        }

        Ok(Self { vertices, axes })
    }

    /// Axis-aligned box centred on the origin, with caches.
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents.abs();
        let mut vertices = Vec::with_capacity(8);
        for sx in [-1.0_f32, 1.0] {
            for sy in [-1.0_f32, 1.0] {
                for sz in [-1.0_f32, 1.0] {
                    vertices.push(Vec3::new(sx * h.x, sy * h.y, sz * h.z));
                }
            }
        }

        let axes = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z]
            .into_iter()
            .map(FaceAxis::new)
            .collect();

        let mut mesh = Self { vertices, axes };
        mesh.cache_extremes();
        mesh
    }

    /// Builds a mesh from a triangle list, with caches.
    ///
    /// One axis is kept per distinct face direction; coplanar triangles share
    /// an axis and degenerate triangles are ignored.
    pub fn from_triangles(
        vertices: Vec<Vec3>,
        triangles: &[[u32; 3]],
    ) -> Result<Self, PhysicsError> {
        let mut normals: Vec<Vec3> = Vec::new();

        for (t, tri) in triangles.iter().enumerate() {
            let mut corners = [Vec3::ZERO; 3];
            for (corner, &index) in corners.iter_mut().zip(tri) {
                let index = index as usize;
                *corner = *vertices.get(index).ok_or(PhysicsError::ExtremeOutOfRange {
                    axis: t,
                    index,
                    vertex_count: vertices.len(),
                })?;
            }

            let normal = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
            let Some(normal) = normal.try_normalize() else {
                continue;
            };

            let duplicate = normals
                .iter()
                .any(|n| n.dot(normal) > 1.0 - NORMAL_MERGE_TOLERANCE);
            if !duplicate {
                normals.push(normal);
            }
        }

        let mut mesh = Self::new(vertices, normals)?;
        mesh.cache_extremes();
        Ok(mesh)
    }

    /// Computes the extremal vertex of every axis from the current vertices.
    pub fn cache_extremes(&mut self) {
        for i in 0..self.axes.len() {
            let mut projection = Projection::new(self.axes[i].normal);
            let extremes = projection.project_mesh(self);
            self.axes[i].extremes = extremes;
        }
    }

    /// Drops every cached extremal index.
    pub fn clear_extremes(&mut self) {
        for axis in &mut self.axes {
            axis.extremes = None;
        }
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Face axes.
    pub fn axes(&self) -> &[FaceAxis] {
        &self.axes
    }

    /// Returns true for the default, unpopulated mesh.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Writes this mesh transformed by `matrix` into `out`, reusing its buffers.
    pub fn transform_into(&self, matrix: &Mat4, out: &mut SimpleMesh) {
        let normals = normal_matrix(matrix);

        out.vertices.clear();
        out.vertices
            .extend(self.vertices.iter().map(|v| matrix.transform_point3(*v)));

        out.axes.clear();
        out.axes.extend(self.axes.iter().map(|axis| FaceAxis {
            normal: (normals * axis.normal).normalize_or_zero(),
            extremes: axis.extremes,
        }));
    }

    /// Returns this mesh transformed by `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> SimpleMesh {
        let mut out = SimpleMesh::default();
        self.transform_into(matrix, &mut out);
        out
    }

    /// Centroid of the vertices.
    pub fn centroid(&self) -> Vec3 {
        if self.vertices.is_empty() {
            return Vec3::ZERO;
        }
        self.vertices.iter().copied().sum::<Vec3>() / self.vertices.len() as f32
    }
}

/// Sphere used for the broadphase.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingSphere {
    /// Centre.
    pub center: Vec3,
    /// Radius.
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a sphere.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere centred on the mesh centroid that contains every vertex.
    pub fn enclosing(mesh: &SimpleMesh) -> Self {
        let center = mesh.centroid();
        let radius = mesh
            .vertices()
            .iter()
            .map(|v| v.distance(center))
            .fold(0.0, f32::max);
        Self { center, radius }
    }

    /// Moves the centre by `matrix` and grows the radius by `max_axis_scale`.
    ///
    /// Conservative for non-uniform scale.
    pub fn transformed(&self, matrix: &Mat4, max_axis_scale: f32) -> Self {
        Self {
            center: matrix.transform_point3(self.center),
            radius: self.radius * max_axis_scale,
        }
    }
}
