// Rusted Impulse: 2D rigid-body physics with SAT collision and a sequential impulse solver

pub mod core;
pub mod engine;
pub mod game;

pub use crate::core::math::{Real, Transform, Vector};
pub use crate::engine::physics::{
    step, BodyBuilder, BodyHandle, PhysicsError, PhysicsResult, PhysicsWorld, RigidBody, Shape,
    StepConfig, StepStats,
};
