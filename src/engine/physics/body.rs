// Rigid bodies: pose, velocity, mass properties and the world-space shape cache

use super::shape::{Aabb, Polygon, Shape, ShapeKind};
use super::{PhysicsError, PhysicsResult};
use crate::core::math::{cross, cross_scalar, pose_transform, Real, Transform, Vector};

/// Mass and rotational inertia together with their reciprocals.
///
/// An all-zero value stands for infinite mass: static bodies use it so that
/// impulses and forces have no effect on them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    pub mass: Real,
    pub inverse_mass: Real,
    pub rotational_inertia: Real,
    pub inverse_rotational_inertia: Real,
}

impl MassProperties {
    /// Infinite mass: every term zero
    pub const INFINITE: Self = Self {
        mass: 0.0,
        inverse_mass: 0.0,
        rotational_inertia: 0.0,
        inverse_rotational_inertia: 0.0,
    };

    /// Compute mass properties of a shape with uniform density
    pub fn from_shape(shape: &Shape, density: Real) -> Self {
        let mass = density * shape.area();
        let rotational_inertia = match shape.kind() {
            ShapeKind::Circle(circle) => 0.5 * mass * circle.radius * circle.radius,
            ShapeKind::Polygon(polygon) => polygon
                .edges()
                .map(|(a, b)| {
                    let tri_mass = density * 0.5 * cross(a, b).abs();
                    tri_mass * (a.length_squared() + b.length_squared() + a.dot(b)) / 6.0
                })
                .sum(),
        };

        Self {
            mass,
            inverse_mass: reciprocal(mass),
            rotational_inertia,
            inverse_rotational_inertia: reciprocal(rotational_inertia),
        }
    }
}

fn reciprocal(value: Real) -> Real {
    if value > 0.0 {
        1.0 / value
    } else {
        0.0
    }
}

/// World-space geometry of a transformed shape
#[derive(Debug, Clone, PartialEq)]
pub enum WorldGeometry {
    Circle { radius: Real },
    Polygon(Polygon),
}

/// Cached world-space version of a body's shape
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedShape {
    /// Model transform (local -> world)
    pub transform: Transform,
    /// World-space centroid
    pub centroid: Vector,
    /// World-space bounding box
    pub aabb: Aabb,
    pub geometry: WorldGeometry,
}

impl TransformedShape {
    /// Transform a local shape into world space for the given pose
    pub fn from_shape(shape: &Shape, position: Vector, rotation: Real) -> Self {
        let transform = pose_transform(position, rotation);
        let centroid = transform.transform_point2(Vector::ZERO);

        let (aabb, geometry) = match shape.kind() {
            ShapeKind::Circle(circle) => (
                Aabb::from_circle(centroid, circle.radius),
                WorldGeometry::Circle {
                    radius: circle.radius,
                },
            ),
            ShapeKind::Polygon(polygon) => {
                let world = polygon.transformed(&transform);
                (Aabb::from_points(world.vertices()), WorldGeometry::Polygon(world))
            }
        };

        Self {
            transform,
            centroid,
            aabb,
            geometry,
        }
    }

    /// Circle radius, if this is a circle
    pub fn radius(&self) -> Option<Real> {
        match self.geometry {
            WorldGeometry::Circle { radius } => Some(radius),
            WorldGeometry::Polygon(_) => None,
        }
    }

    /// World-space polygon, if this is a polygon
    pub fn polygon(&self) -> Option<&Polygon> {
        match &self.geometry {
            WorldGeometry::Polygon(polygon) => Some(polygon),
            WorldGeometry::Circle { .. } => None,
        }
    }
}

/// A rigid body owning one shape.
///
/// Pose setters invalidate the world-space shape cache; it is rebuilt lazily by
/// [`RigidBody::ensure_transformed_shape`].
#[derive(Debug, Clone)]
pub struct RigidBody {
    position: Vector,
    rotation: Real,
    linear_velocity: Vector,
    angular_velocity: Real,
    force: Vector,
    torque: Real,
    mass: MassProperties,
    intrinsic_mass: MassProperties,
    is_static: bool,
    shape: Shape,
    transformed: TransformedShape,
    dirty: bool,
}

impl RigidBody {
    /// Create a body at the origin. Mass is `density * area` and is kept for the
    /// lifetime of the body, even while it is static.
    pub fn new(shape: Shape, density: Real, is_static: bool) -> PhysicsResult<Self> {
        if !density.is_finite() || density <= 0.0 {
            return Err(PhysicsError::InvalidDensity(density));
        }

        let intrinsic_mass = MassProperties::from_shape(&shape, density);
        let transformed = TransformedShape::from_shape(&shape, Vector::ZERO, 0.0);

        Ok(Self {
            position: Vector::ZERO,
            rotation: 0.0,
            linear_velocity: Vector::ZERO,
            angular_velocity: 0.0,
            force: Vector::ZERO,
            torque: 0.0,
            mass: if is_static {
                MassProperties::INFINITE
            } else {
                intrinsic_mass
            },
            intrinsic_mass,
            is_static,
            shape,
            transformed,
            dirty: false,
        })
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    pub fn set_position(&mut self, position: Vector) {
        self.position = position;
        self.dirty = true;
    }

    /// Move the body by an offset
    pub fn translate(&mut self, offset: Vector) {
        self.set_position(self.position + offset);
    }

    /// Rotation in radians, counter-clockwise
    pub fn rotation(&self) -> Real {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Real) {
        self.rotation = rotation;
        self.dirty = true;
    }

    pub fn linear_velocity(&self) -> Vector {
        self.linear_velocity
    }

    /// Set the linear velocity. Ignored for static bodies.
    pub fn set_linear_velocity(&mut self, velocity: Vector) {
        if !self.is_static {
            self.linear_velocity = velocity;
        }
    }

    pub fn angular_velocity(&self) -> Real {
        self.angular_velocity
    }

    /// Set the angular velocity. Ignored for static bodies.
    pub fn set_angular_velocity(&mut self, angular_velocity: Real) {
        if !self.is_static {
            self.angular_velocity = angular_velocity;
        }
    }

    /// Velocity of a point at `offset` from the centroid
    pub fn velocity_at(&self, offset: Vector) -> Vector {
        self.linear_velocity + cross_scalar(self.angular_velocity, offset)
    }

    /// Accumulated force for this frame
    pub fn force(&self) -> Vector {
        self.force
    }

    /// Accumulated torque for this frame
    pub fn torque(&self) -> Real {
        self.torque
    }

    /// Effective mass; zero while static
    pub fn mass(&self) -> Real {
        self.mass.mass
    }

    pub fn inverse_mass(&self) -> Real {
        self.mass.inverse_mass
    }

    pub fn rotational_inertia(&self) -> Real {
        self.mass.rotational_inertia
    }

    pub fn inverse_rotational_inertia(&self) -> Real {
        self.mass.inverse_rotational_inertia
    }

    /// Effective mass properties (all zero while static)
    pub fn mass_properties(&self) -> MassProperties {
        self.mass
    }

    /// Mass properties computed at construction, regardless of the static flag
    pub fn intrinsic_mass_properties(&self) -> MassProperties {
        self.intrinsic_mass
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Switch between static and dynamic.
    ///
    /// Becoming static zeroes velocities and accumulators. Becoming dynamic
    /// restores the mass computed at construction. Setting the current value
    /// does nothing.
    pub fn set_static(&mut self, is_static: bool) {
        if self.is_static == is_static {
            return;
        }

        self.is_static = is_static;
        if is_static {
            self.linear_velocity = Vector::ZERO;
            self.angular_velocity = 0.0;
            self.clear_accumulators();
            self.mass = MassProperties::INFINITE;
        } else {
            self.mass = self.intrinsic_mass;
        }
    }

    /// The local-space shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Accumulate a force through the centroid (no torque)
    pub fn apply_force(&mut self, force: Vector) {
        self.apply_force_at(force, Vector::ZERO);
    }

    /// Accumulate a force applied at `offset` from the centroid (world orientation)
    pub fn apply_force_at(&mut self, force: Vector, offset: Vector) {
        if self.is_static {
            return;
        }
        self.force += force;
        self.torque += cross(offset, force);
    }

    /// Accumulate a pure torque
    pub fn apply_torque(&mut self, torque: Real) {
        if !self.is_static {
            self.torque += torque;
        }
    }

    /// Apply an impulse through the centroid
    pub fn apply_impulse(&mut self, impulse: Vector) {
        self.apply_impulse_at(impulse, Vector::ZERO);
    }

    /// Apply an impulse at `offset` from the centroid (world orientation)
    pub fn apply_impulse_at(&mut self, impulse: Vector, offset: Vector) {
        if self.is_static {
            return;
        }
        self.linear_velocity += impulse * self.mass.inverse_mass;
        self.angular_velocity += cross(offset, impulse) * self.mass.inverse_rotational_inertia;
    }

    /// Reset the force and torque accumulators
    pub fn clear_accumulators(&mut self) {
        self.force = Vector::ZERO;
        self.torque = 0.0;
    }

    /// Whether the world-space cache is stale
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Force the world-space cache to be rebuilt on next access
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Rebuild the world-space shape if the pose changed, then return it
    pub fn ensure_transformed_shape(&mut self) -> &TransformedShape {
        if self.dirty {
            self.transformed = TransformedShape::from_shape(&self.shape, self.position, self.rotation);
            self.dirty = false;
        }
        &self.transformed
    }

    /// The world-space shape, only if the cache is up to date
    pub fn cached_transformed_shape(&self) -> Option<&TransformedShape> {
        (!self.dirty).then_some(&self.transformed)
    }

    /// Whether a world-space point lies inside the body's shape
    pub fn contains_point(&self, world_point: Vector) -> bool {
        let local = pose_transform(self.position, self.rotation)
            .inverse()
            .transform_point2(world_point);
        self.shape.contains_local_point(local)
    }
}

/// Builder for creating rigid bodies with common configurations
pub struct BodyBuilder {
    shape: Shape,
    is_static: bool,
    density: Real,
    position: Vector,
    rotation: Real,
    linvel: Vector,
    angvel: Real,
}

impl BodyBuilder {
    /// Create a new dynamic body (affected by forces and collisions)
    pub fn new_dynamic(shape: Shape) -> Self {
        Self {
            shape,
            is_static: false,
            density: 1.0,
            position: Vector::ZERO,
            rotation: 0.0,
            linvel: Vector::ZERO,
            angvel: 0.0,
        }
    }

    /// Create a new static body (completely immovable)
    pub fn new_static(shape: Shape) -> Self {
        Self {
            is_static: true,
            ..Self::new_dynamic(shape)
        }
    }

    /// Set the initial position of the body
    pub fn position(mut self, x: Real, y: Real) -> Self {
        self.position = Vector::new(x, y);
        self
    }

    /// Set the initial position and rotation
    pub fn position_rotation(mut self, x: Real, y: Real, angle: Real) -> Self {
        self.position = Vector::new(x, y);
        self.rotation = angle;
        self
    }

    /// Set the initial linear velocity
    pub fn linvel(mut self, x: Real, y: Real) -> Self {
        self.linvel = Vector::new(x, y);
        self
    }

    /// Set the initial angular velocity (radians per second)
    pub fn angvel(mut self, angvel: Real) -> Self {
        self.angvel = angvel;
        self
    }

    /// Set density (mass is density times shape area)
    pub fn density(mut self, density: Real) -> Self {
        self.density = density;
        self
    }

    /// Build the rigid body
    pub fn build(self) -> PhysicsResult<RigidBody> {
        let mut body = RigidBody::new(self.shape, self.density, self.is_static)?;
        body.set_position(self.position);
        body.set_rotation(self.rotation);
        body.set_linear_velocity(self.linvel);
        body.set_angular_velocity(self.angvel);
        body.ensure_transformed_shape();
        Ok(body)
    }
}

/// Common rigid body configurations for demo scenes
pub mod presets {
    use super::*;

    /// Static floor or wall (box shape), given full width and height
    pub fn platform_body(x: Real, y: Real, width: Real, height: Real) -> PhysicsResult<RigidBody> {
        let shape = Shape::rect(width / 2.0, height / 2.0)?.with_color(0x42f5d7);
        BodyBuilder::new_static(shape).position(x, y).build()
    }

    /// Dynamic box
    pub fn crate_body(x: Real, y: Real, half_size: Real, density: Real) -> PhysicsResult<RigidBody> {
        let shape = Shape::rect(half_size, half_size)?;
        BodyBuilder::new_dynamic(shape)
            .position(x, y)
            .density(density)
            .build()
    }

    /// Dynamic circle
    pub fn ball_body(x: Real, y: Real, radius: Real, density: Real) -> PhysicsResult<RigidBody> {
        let shape = Shape::circle(radius)?;
        BodyBuilder::new_dynamic(shape)
            .position(x, y)
            .density(density)
            .build()
    }

    /// Small fast circle
    pub fn projectile_body(x: Real, y: Real, vel_x: Real, vel_y: Real) -> PhysicsResult<RigidBody> {
        let shape = Shape::circle(0.2)?.with_color(0xed37d8);
        BodyBuilder::new_dynamic(shape)
            .position(x, y)
            .linvel(vel_x, vel_y)
            .density(10.0)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn dynamic_box() -> RigidBody {
        RigidBody::new(Shape::rect(1.0, 1.0).unwrap(), 2.0, false).unwrap()
    }

    #[test]
    fn test_circle_mass_properties() {
        let body = RigidBody::new(Shape::circle(1.0).unwrap(), 2.0, false).unwrap();
        assert_abs_diff_eq!(body.mass(), 2.0 * PI, epsilon = 1e-12);
        assert_abs_diff_eq!(body.rotational_inertia(), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(body.inverse_mass(), 1.0 / (2.0 * PI), epsilon = 1e-12);
    }

    #[test]
    fn test_box_inertia_matches_closed_form() {
        let body = dynamic_box();
        let mass = body.mass();
        assert_abs_diff_eq!(mass, 8.0, epsilon = 1e-12);
        // m (w² + h²) / 12 with w = h = 2
        assert_abs_diff_eq!(body.rotational_inertia(), mass * 8.0 / 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_density() {
        let shape = Shape::circle(1.0).unwrap();
        assert_eq!(
            RigidBody::new(shape.clone(), 0.0, false).unwrap_err(),
            PhysicsError::InvalidDensity(0.0)
        );
        assert!(RigidBody::new(shape, Real::NAN, true).is_err());
    }

    #[test]
    fn test_static_body_has_infinite_mass() {
        let body = RigidBody::new(Shape::rect(1.0, 1.0).unwrap(), 1.0, true).unwrap();
        assert!(body.is_static());
        assert_eq!(body.mass_properties(), MassProperties::INFINITE);
        assert!(body.intrinsic_mass_properties().mass > 0.0);
    }

    #[test]
    fn test_set_static_round_trip() {
        let mut body = dynamic_box();
        let before = body.mass_properties();
        body.set_linear_velocity(Vector::new(3.0, -1.0));
        body.set_angular_velocity(2.0);
        body.apply_force(Vector::new(1.0, 1.0));

        body.set_static(true);
        assert_eq!(body.linear_velocity(), Vector::ZERO);
        assert_eq!(body.angular_velocity(), 0.0);
        assert_eq!(body.force(), Vector::ZERO);
        assert_eq!(body.inverse_mass(), 0.0);

        // Idempotent: setting the same value changes nothing
        body.set_static(true);
        assert!(body.is_static());

        body.set_static(false);
        assert_eq!(body.mass_properties(), before);

        body.set_linear_velocity(Vector::new(0.5, 0.0));
        body.set_static(false);
        assert_eq!(body.linear_velocity(), Vector::new(0.5, 0.0));
    }

    #[test]
    fn test_forces_are_ignored_on_static_bodies() {
        let mut body = dynamic_box();
        body.set_static(true);
        body.apply_force_at(Vector::new(10.0, 0.0), Vector::new(0.0, 1.0));
        body.apply_impulse_at(Vector::new(10.0, 0.0), Vector::new(0.0, 1.0));

        assert_eq!(body.force(), Vector::ZERO);
        assert_eq!(body.torque(), 0.0);
        assert_eq!(body.linear_velocity(), Vector::ZERO);
        assert_eq!(body.angular_velocity(), 0.0);
    }

    #[test]
    fn test_apply_force_at_offset_generates_torque() {
        let mut body = dynamic_box();
        body.apply_force(Vector::new(1.0, 0.0));
        assert_eq!(body.torque(), 0.0);

        body.apply_force_at(Vector::new(0.0, 2.0), Vector::new(1.0, 0.0));
        assert_eq!(body.force(), Vector::new(1.0, 2.0));
        assert_eq!(body.torque(), 2.0);

        body.clear_accumulators();
        assert_eq!(body.force(), Vector::ZERO);
        assert_eq!(body.torque(), 0.0);
    }

    #[test]
    fn test_apply_impulse_at_offset() {
        let mut body = dynamic_box();
        let impulse = Vector::new(0.0, 4.0);
        let offset = Vector::new(1.0, 0.0);
        body.apply_impulse_at(impulse, offset);

        assert_abs_diff_eq!(body.linear_velocity().y, 4.0 / body.mass(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            body.angular_velocity(),
            4.0 * body.inverse_rotational_inertia(),
            epsilon = 1e-12
        );
        let point_velocity = body.velocity_at(offset);
        assert!(point_velocity.y > body.linear_velocity().y);
    }

    #[test]
    fn test_pose_changes_mark_cache_dirty() {
        let mut body = dynamic_box();
        assert!(!body.is_dirty());
        assert!(body.cached_transformed_shape().is_some());

        body.set_position(Vector::new(5.0, 0.0));
        assert!(body.is_dirty());
        assert!(body.cached_transformed_shape().is_none());

        let centroid = body.ensure_transformed_shape().centroid;
        assert_eq!(centroid, Vector::new(5.0, 0.0));
        assert!(!body.is_dirty());
    }

    #[test]
    fn test_ensure_transformed_shape_is_idempotent() {
        let mut body = dynamic_box();
        body.set_position(Vector::new(1.0, 2.0));
        body.set_rotation(0.3);

        let first = body.ensure_transformed_shape().clone();
        let second = body.ensure_transformed_shape().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_transformed_polygon_is_rotated() {
        let shape = Shape::rect(2.0, 1.0).unwrap();
        let mut body = BodyBuilder::new_dynamic(shape)
            .position_rotation(10.0, 0.0, FRAC_PI_2)
            .build()
            .unwrap();

        let transformed = body.ensure_transformed_shape();
        let aabb = transformed.aabb;
        assert_abs_diff_eq!(aabb.center.x, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(aabb.half_extents.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(aabb.half_extents.y, 2.0, epsilon = 1e-12);

        let polygon = transformed.polygon().unwrap();
        // The bottom normal (0, -1) turns into (1, 0)
        assert_abs_diff_eq!(polygon.normals()[0].x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(polygon.normals()[0].y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_contains_point() {
        let shape = Shape::rect(2.0, 0.5).unwrap();
        let body = BodyBuilder::new_static(shape)
            .position_rotation(0.0, 5.0, FRAC_PI_2)
            .build()
            .unwrap();

        assert!(body.contains_point(Vector::new(0.0, 6.5)));
        assert!(!body.contains_point(Vector::new(1.5, 5.0)));
    }

    #[test]
    fn test_presets() {
        let floor = presets::platform_body(10.0, -10.0, 200.0, 0.4).unwrap();
        assert!(floor.is_static());
        assert_eq!(floor.shape().color(), 0x42f5d7);

        let bullet = presets::projectile_body(-10.0, -5.0, 40.0, 0.0).unwrap();
        assert!(!bullet.is_static());
        assert_eq!(bullet.linear_velocity(), Vector::new(40.0, 0.0));
        assert!(bullet.shape().is_circle());
    }
}
