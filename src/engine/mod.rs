// Engine modules: physics simulation and debug geometry

pub mod physics;
