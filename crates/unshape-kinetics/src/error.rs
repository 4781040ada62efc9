//! Error types for unshape-kinetics.

use thiserror::Error;

use crate::body::BodyHandle;
use crate::force::GeneratorHandle;

/// Errors that can occur while building or stepping a physics world.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// A body handle does not refer to a body in the set.
    #[error("unknown body: {0:?}")]
    UnknownBody(BodyHandle),

    /// Two distinct bodies were required but the same handle was given twice.
    #[error("body {0:?} cannot be paired with itself")]
    SameBody(BodyHandle),

    /// A force generator handle does not refer to a registered generator.
    #[error("unknown force generator: {0:?}")]
    UnknownGenerator(GeneratorHandle),

    /// A collision mesh needs at least one vertex and one face normal.
    #[error("collision mesh has no vertices or no face normals")]
    EmptyMesh,

    /// A face normal is zero-length or not finite.
    #[error("invalid face normal at index {index}")]
    InvalidNormal {
        /// Index of the offending normal.
        index: usize,
    },

    /// A cached extremal vertex index points past the vertex list.
    #[error("axis {axis}: extremal vertex {index} out of range ({vertex_count} vertices)")]
    ExtremeOutOfRange {
        /// Face axis whose cache is broken.
        axis: usize,
        /// The cached vertex index.
        index: usize,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Time steps must be positive and finite.
    #[error("invalid time step: {0}")]
    InvalidTimestep(f32),

    /// The resolution loop needs at least one iteration.
    #[error("resolution iteration cap must be at least 1")]
    InvalidIterationCap,
}
