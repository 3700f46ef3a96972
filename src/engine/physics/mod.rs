// Rigid-body physics: shapes, bodies, SAT collision, contact manifolds and the impulse solver

pub mod body;
pub mod collision;
pub mod debug;
pub mod manifold;
pub mod shape;
pub mod solver;
pub mod world;

pub use body::{BodyBuilder, MassProperties, RigidBody, TransformedShape, WorldGeometry};
pub use collision::{aabb_overlap, minimum_translation_vector};
pub use debug::{DebugRenderer, DebugVertex};
pub use manifold::{build_contacts, Contact, Manifold};
pub use shape::{Aabb, Circle, Polygon, Shape, ShapeKind};
pub use world::{step, BodyHandle, PhysicsWorld, StepConfig, StepStats};

use crate::core::math::Real;

/// Physics errors
///
/// Construction errors are reported when shapes and bodies are created so they
/// never reach the solver. Per-frame "no collision" outcomes are not errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    #[error("Polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("Polygon vertex {0} is not finite")]
    NonFiniteVertex(usize),

    #[error("Polygon edge starting at vertex {0} has zero length")]
    ZeroLengthEdge(usize),

    #[error("Polygon has zero area")]
    DegenerateArea,

    #[error("Polygon is not convex at vertex {0}")]
    NotConvex(usize),

    #[error("Circle radius must be positive and finite, got {0}")]
    InvalidRadius(Real),

    #[error("Density must be positive and finite, got {0}")]
    InvalidDensity(Real),

    #[error("Timestep must be positive and finite, got {0}")]
    InvalidTimestep(Real),

    #[error("Contact between bodies {body_a} and {body_b} has no effective mass")]
    ZeroEffectiveMass { body_a: usize, body_b: usize },

    #[error("Body not found: {0:?}")]
    BodyNotFound(BodyHandle),
}

/// Result alias for physics operations
pub type PhysicsResult<T> = Result<T, PhysicsError>;
