// Physics world: step configuration, the per-frame pipeline and body ownership

use log::{debug, info, trace, warn};

use super::body::{RigidBody, TransformedShape};
use super::collision;
use super::manifold::{build_contacts, Manifold};
use super::solver;
use super::{PhysicsError, PhysicsResult};
use crate::core::math::{Real, Vector};

/// Body count above which the quadratic pair search becomes noticeably slow
pub const RECOMMENDED_MAX_BODIES: usize = 256;

/// Tunable parameters for one simulation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepConfig {
    /// Acceleration applied to every dynamic body
    pub gravity: Vector,
    /// Linear and angular drag coefficient
    pub drag: Real,
    /// Solver passes over all contacts
    pub iterations: usize,
    /// Whether penetration is corrected with a velocity bias
    pub positional_correction: bool,
    /// Fraction of the excess penetration removed per second (times 1/dt)
    pub bias_factor: Real,
    /// Penetration tolerated without correction (slop)
    pub allowed_penetration: Real,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            gravity: Vector::new(0.0, -9.8),
            drag: 0.7,
            iterations: 10,
            positional_correction: true,
            bias_factor: 0.2,
            allowed_penetration: 0.01,
        }
    }
}

impl StepConfig {
    pub fn gravity(mut self, x: Real, y: Real) -> Self {
        self.gravity = Vector::new(x, y);
        self
    }

    pub fn drag(mut self, drag: Real) -> Self {
        self.drag = drag;
        self
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn positional_correction(mut self, enabled: bool) -> Self {
        self.positional_correction = enabled;
        self
    }

    pub fn bias_factor(mut self, bias_factor: Real) -> Self {
        self.bias_factor = bias_factor;
        self
    }

    pub fn allowed_penetration(mut self, allowed_penetration: Real) -> Self {
        self.allowed_penetration = allowed_penetration;
        self
    }

    /// Bias factor actually used by the solver (zero when correction is off)
    pub fn effective_bias_factor(&self) -> Real {
        if self.positional_correction {
            self.bias_factor
        } else {
            0.0
        }
    }
}

/// Counters collected during one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Pairs considered after skipping static-static pairs
    pub pairs_tested: usize,
    /// Pairs rejected by the bounding-box test
    pub broad_phase_rejected: usize,
    /// Pairs that produced at least one contact
    pub manifolds: usize,
    pub contacts: usize,
}

/// Advance the simulation by `dt` seconds.
///
/// Runs velocity integration, pair search, contact generation, the impulse
/// solver and position integration in that order. Nothing is modified when
/// `dt` is rejected.
pub fn step(bodies: &mut [RigidBody], dt: Real, config: &StepConfig) -> PhysicsResult<StepStats> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(PhysicsError::InvalidTimestep(dt));
    }

    let mut stats = StepStats::default();

    solver::integrate_velocities(bodies, dt, config.gravity, config.drag);

    let mut manifolds = find_manifolds(bodies, &mut stats);

    let bias_factor = config.effective_bias_factor();
    for manifold in &mut manifolds {
        solver::prepare_contacts(bodies, manifold, dt, bias_factor, config.allowed_penetration)?;
    }

    solver::solve_contacts(bodies, &manifolds, config.iterations);
    solver::integrate_positions(bodies, dt);

    debug!(
        "Step dt={:.4}: {} pairs, {} rejected, {} manifolds, {} contacts",
        dt, stats.pairs_tested, stats.broad_phase_rejected, stats.manifolds, stats.contacts
    );
    Ok(stats)
}

/// Test every body pair `i < j` and collect the manifolds with contacts.
/// Expects the world-space shapes to be up to date.
fn find_manifolds(bodies: &[RigidBody], stats: &mut StepStats) -> Vec<Manifold> {
    let mut manifolds = Vec::new();

    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (a, b) = (&bodies[i], &bodies[j]);
            if a.is_static() && b.is_static() {
                continue;
            }
            stats.pairs_tested += 1;

            let (Some(shape_a), Some(shape_b)) =
                (a.cached_transformed_shape(), b.cached_transformed_shape())
            else {
                warn!("Bodies {} and {}: stale world shape, pair skipped", i, j);
                continue;
            };

            if !collision::aabb_overlap(&shape_a.aabb, &shape_b.aabb) {
                stats.broad_phase_rejected += 1;
                continue;
            }

            if let Some(manifold) = collide_pair(i, j, shape_a, shape_b) {
                trace!("Bodies {} and {}: {} contacts", i, j, manifold.contacts.len());
                stats.manifolds += 1;
                stats.contacts += manifold.contacts.len();
                manifolds.push(manifold);
            }
        }
    }
    manifolds
}

fn collide_pair(
    body_a: usize,
    body_b: usize,
    a: &TransformedShape,
    b: &TransformedShape,
) -> Option<Manifold> {
    let mtv = collision::intersect(a, b)?;
    let contacts = build_contacts(a, b, mtv);
    if contacts.is_empty() {
        return None;
    }
    Some(Manifold {
        body_a,
        body_b,
        contacts,
    })
}

/// Stable identifier of a body inside a [`PhysicsWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(u64);

/// Physics world that owns bodies and steps them with a fixed timestep
pub struct PhysicsWorld {
    config: StepConfig,
    timestep: Real,
    bodies: Vec<RigidBody>,
    handles: Vec<BodyHandle>,
    next_handle: u64,
    frame: u64,
    warned_body_count: bool,
}

impl PhysicsWorld {
    /// Create a new physics world with default settings
    pub fn new() -> Self {
        Self::with_config(StepConfig::default())
    }

    /// Create a new physics world with custom gravity
    pub fn with_gravity(gravity: Vector) -> Self {
        Self::with_config(StepConfig {
            gravity,
            ..StepConfig::default()
        })
    }

    pub fn with_config(config: StepConfig) -> Self {
        info!(
            "Physics world: gravity ({}, {}), {} solver iterations",
            config.gravity.x, config.gravity.y, config.iterations
        );
        Self {
            config,
            // Fixed timestep of 1/60 seconds (60 FPS)
            timestep: 1.0 / 60.0,
            bodies: Vec::new(),
            handles: Vec::new(),
            next_handle: 0,
            frame: 0,
            warned_body_count: false,
        }
    }

    /// Step the simulation forward by one timestep
    pub fn step(&mut self) -> PhysicsResult<StepStats> {
        let stats = step(&mut self.bodies, self.timestep, &self.config)?;
        self.frame += 1;
        Ok(stats)
    }

    /// Add a body and return its handle
    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.push(body);
        self.handles.push(handle);

        if self.bodies.len() > RECOMMENDED_MAX_BODIES && !self.warned_body_count {
            warn!(
                "{} bodies exceeds the recommended maximum of {}; pair search is quadratic",
                self.bodies.len(),
                RECOMMENDED_MAX_BODIES
            );
            self.warned_body_count = true;
        }
        debug!("Added body {:?} ({} total)", handle, self.bodies.len());
        handle
    }

    /// Remove a body, returning it if it existed
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let index = self.index_of(handle)?;
        self.handles.remove(index);
        debug!("Removed body {:?}", handle);
        Some(self.bodies.remove(index))
    }

    pub fn get_body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.index_of(handle).map(|i| &self.bodies[i])
    }

    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        match self.index_of(handle) {
            Some(index) => Some(&mut self.bodies[index]),
            None => None,
        }
    }

    /// Accumulate a force on a body for the next step, at `offset` from its centroid
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vector, offset: Vector) -> PhysicsResult<()> {
        let body = self
            .get_body_mut(handle)
            .ok_or(PhysicsError::BodyNotFound(handle))?;
        body.apply_force_at(force, offset);
        Ok(())
    }

    /// Apply an impulse to a body immediately, at `offset` from its centroid
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vector, offset: Vector) -> PhysicsResult<()> {
        let body = self
            .get_body_mut(handle)
            .ok_or(PhysicsError::BodyNotFound(handle))?;
        body.apply_impulse_at(impulse, offset);
        Ok(())
    }

    /// Topmost (most recently added) body containing a world-space point
    pub fn body_at_point(&self, point: Vector) -> Option<BodyHandle> {
        self.bodies
            .iter()
            .zip(&self.handles)
            .rev()
            .find(|(body, _)| body.contains_point(point))
            .map(|(_, handle)| *handle)
    }

    /// Bodies in insertion order
    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [RigidBody] {
        &mut self.bodies
    }

    /// Iterate bodies together with their handles
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.handles.iter().copied().zip(self.bodies.iter())
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut StepConfig {
        &mut self.config
    }

    /// Set gravity for the physics world
    pub fn set_gravity(&mut self, gravity: Vector) {
        self.config.gravity = gravity;
    }

    pub fn gravity(&self) -> Vector {
        self.config.gravity
    }

    /// Set the timestep for physics simulation
    pub fn set_timestep(&mut self, dt: Real) {
        self.timestep = dt;
    }

    pub fn timestep(&self) -> Real {
        self.timestep
    }

    /// Number of completed steps
    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.handles.iter().position(|&h| h == handle)
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
