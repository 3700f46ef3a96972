// Semi-implicit Euler integration and the sequential impulse contact solver

use super::body::RigidBody;
use super::manifold::Manifold;
use super::{PhysicsError, PhysicsResult};
use crate::core::math::{clamp_magnitude, clamp_unit, Real, Vector};

/// Integrate forces, gravity and drag into velocities, then refresh the
/// world-space shapes used by collision detection.
///
/// Drag subtracts `clamp_magnitude(v, 1) * drag * dt`: it grows with speed up to
/// unit speed and stays constant beyond that.
pub fn integrate_velocities(bodies: &mut [RigidBody], dt: Real, gravity: Vector, drag: Real) {
    for body in bodies.iter_mut() {
        if !body.is_static() {
            let acceleration = body.force() * body.inverse_mass() + gravity;
            let mut velocity = body.linear_velocity() + acceleration * dt;
            let mut angular_velocity = body.angular_velocity()
                + body.torque() * body.inverse_rotational_inertia() * dt;

            velocity -= clamp_magnitude(velocity, 1.0) * drag * dt;
            angular_velocity -= clamp_unit(angular_velocity) * drag * dt;

            body.set_linear_velocity(velocity);
            body.set_angular_velocity(angular_velocity);
        }
        body.ensure_transformed_shape();
    }
}

/// Precompute lever arms, effective mass and Baumgarte bias for a manifold.
///
/// A contact without effective mass means two immovable bodies reached the
/// solver, which the pair filter rules out; it is reported as an error.
pub fn prepare_contacts(
    bodies: &[RigidBody],
    manifold: &mut Manifold,
    dt: Real,
    bias_factor: Real,
    allowed_penetration: Real,
) -> PhysicsResult<()> {
    let a = &bodies[manifold.body_a];
    let b = &bodies[manifold.body_b];

    for contact in &mut manifold.contacts {
        contact.r1 = contact.position - a.position();
        contact.r2 = contact.position - b.position();

        let rn1 = contact.r1.dot(contact.normal);
        let rn2 = contact.r2.dot(contact.normal);
        let k = a.inverse_mass()
            + b.inverse_mass()
            + a.inverse_rotational_inertia() * (contact.r1.length_squared() - rn1 * rn1)
            + b.inverse_rotational_inertia() * (contact.r2.length_squared() - rn2 * rn2);

        if !(k.is_finite() && k > 0.0) {
            return Err(PhysicsError::ZeroEffectiveMass {
                body_a: manifold.body_a,
                body_b: manifold.body_b,
            });
        }

        contact.inverse_effective_mass = 1.0 / k;
        contact.bias = -bias_factor / dt * (allowed_penetration - contact.penetration_depth).min(0.0);
    }
    Ok(())
}

/// Run `iterations` Gauss-Seidel passes over every contact.
///
/// Each contact impulse is clamped to be non-negative: contacts push, never pull.
pub fn solve_contacts(bodies: &mut [RigidBody], manifolds: &[Manifold], iterations: usize) {
    for _ in 0..iterations {
        for manifold in manifolds {
            let (a, b) = pair_mut(bodies, manifold.body_a, manifold.body_b);

            for contact in &manifold.contacts {
                let relative_velocity = b.velocity_at(contact.r2) - a.velocity_at(contact.r1);
                let velocity_along_normal = relative_velocity.dot(contact.normal);

                let j = (contact.inverse_effective_mass * (-velocity_along_normal + contact.bias))
                    .max(0.0);
                let impulse = contact.normal * j;

                a.apply_impulse_at(-impulse, contact.r1);
                b.apply_impulse_at(impulse, contact.r2);
            }
        }
    }
}

/// Integrate velocities into poses and reset the force accumulators.
/// Moved bodies have their world-space shape invalidated.
pub fn integrate_positions(bodies: &mut [RigidBody], dt: Real) {
    for body in bodies.iter_mut() {
        if !body.is_static() {
            body.set_position(body.position() + body.linear_velocity() * dt);
            body.set_rotation(body.rotation() + body.angular_velocity() * dt);
        }
        body.clear_accumulators();
    }
}

/// Borrow two distinct bodies mutably
fn pair_mut(bodies: &mut [RigidBody], i: usize, j: usize) -> (&mut RigidBody, &mut RigidBody) {
    debug_assert_ne!(i, j, "a body cannot collide with itself");
    if i < j {
        let (low, high) = bodies.split_at_mut(j);
        (&mut low[i], &mut high[0])
    } else {
        let (low, high) = bodies.split_at_mut(i);
        (&mut high[0], &mut low[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::manifold::Contact;
    use crate::engine::physics::shape::Shape;
    use approx::assert_abs_diff_eq;

    fn ball(x: Real, y: Real) -> RigidBody {
        let mut body = RigidBody::new(Shape::circle(1.0).unwrap(), 1.0, false).unwrap();
        body.set_position(Vector::new(x, y));
        body
    }

    #[test]
    fn test_gravity_without_drag() {
        let mut bodies = vec![ball(0.0, 0.0)];
        integrate_velocities(&mut bodies, 0.5, Vector::new(0.0, -10.0), 0.0);
        assert_eq!(bodies[0].linear_velocity(), Vector::new(0.0, -5.0));
        assert!(!bodies[0].is_dirty());
    }

    #[test]
    fn test_drag_uses_clamped_velocity() {
        let mut bodies = vec![ball(0.0, 0.0), ball(5.0, 0.0)];
        bodies[0].set_linear_velocity(Vector::new(0.5, 0.0));
        bodies[1].set_linear_velocity(Vector::new(10.0, 0.0));
        bodies[1].set_angular_velocity(-4.0);

        integrate_velocities(&mut bodies, 0.1, Vector::ZERO, 1.0);

        // Below unit speed drag is proportional to velocity
        assert_abs_diff_eq!(bodies[0].linear_velocity().x, 0.5 - 0.05, epsilon = 1e-12);
        // Above it the clamped direction is used
        assert_abs_diff_eq!(bodies[1].linear_velocity().x, 10.0 - 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(bodies[1].angular_velocity(), -4.0 + 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_force_and_torque_integration() {
        let mut bodies = vec![ball(0.0, 0.0)];
        bodies[0].apply_force_at(Vector::new(0.0, 2.0), Vector::new(1.0, 0.0));
        let inverse_mass = bodies[0].inverse_mass();
        let inverse_inertia = bodies[0].inverse_rotational_inertia();

        integrate_velocities(&mut bodies, 1.0, Vector::ZERO, 0.0);
        assert_abs_diff_eq!(bodies[0].linear_velocity().y, 2.0 * inverse_mass, epsilon = 1e-12);
        assert_abs_diff_eq!(bodies[0].angular_velocity(), 2.0 * inverse_inertia, epsilon = 1e-12);

        integrate_positions(&mut bodies, 1.0);
        assert_eq!(bodies[0].force(), Vector::ZERO);
        assert_eq!(bodies[0].torque(), 0.0);
        assert!(bodies[0].is_dirty());
    }

    #[test]
    fn test_static_bodies_do_not_move() {
        let mut floor = RigidBody::new(Shape::rect(5.0, 0.5).unwrap(), 1.0, true).unwrap();
        floor.set_position(Vector::new(0.0, -1.0));
        let mut bodies = vec![floor];

        integrate_velocities(&mut bodies, 0.1, Vector::new(0.0, -9.8), 0.7);
        integrate_positions(&mut bodies, 0.1);
        assert_eq!(bodies[0].position(), Vector::new(0.0, -1.0));
        assert_eq!(bodies[0].linear_velocity(), Vector::ZERO);
    }

    #[test]
    fn test_prepare_contacts() {
        let bodies = vec![ball(0.0, 0.0), ball(1.9, 0.0)];
        let mut manifold = Manifold {
            body_a: 0,
            body_b: 1,
            contacts: vec![Contact::new(Vector::new(1.0, 0.0), Vector::X, 0.1)],
        };

        prepare_contacts(&bodies, &mut manifold, 0.1, 0.2, 0.01).unwrap();
        let contact = manifold.contacts[0];
        assert_eq!(contact.r1, Vector::new(1.0, 0.0));
        assert_abs_diff_eq!(contact.r2.x, -0.9, epsilon = 1e-12);

        // Lever arms are parallel to the normal: only linear terms remain
        let k = bodies[0].inverse_mass() + bodies[1].inverse_mass();
        assert_abs_diff_eq!(contact.inverse_effective_mass, 1.0 / k, epsilon = 1e-12);
        assert_abs_diff_eq!(contact.bias, 0.2 / 0.1 * 0.09, epsilon = 1e-12);
    }

    #[test]
    fn test_shallow_contacts_have_no_bias() {
        let bodies = vec![ball(0.0, 0.0), ball(1.995, 0.0)];
        let mut manifold = Manifold {
            body_a: 0,
            body_b: 1,
            contacts: vec![Contact::new(Vector::new(1.0, 0.0), Vector::X, 0.005)],
        };
        prepare_contacts(&bodies, &mut manifold, 0.1, 0.2, 0.01).unwrap();
        assert_eq!(manifold.contacts[0].bias, 0.0);
    }

    #[test]
    fn test_two_static_bodies_have_no_effective_mass() {
        let shape = Shape::rect(1.0, 1.0).unwrap();
        let bodies = vec![
            RigidBody::new(shape.clone(), 1.0, true).unwrap(),
            RigidBody::new(shape, 1.0, true).unwrap(),
        ];
        let mut manifold = Manifold {
            body_a: 0,
            body_b: 1,
            contacts: vec![Contact::new(Vector::ZERO, Vector::Y, 0.1)],
        };
        assert_eq!(
            prepare_contacts(&bodies, &mut manifold, 0.1, 0.2, 0.01),
            Err(PhysicsError::ZeroEffectiveMass { body_a: 0, body_b: 1 })
        );
    }

    #[test]
    fn test_solver_only_pushes() {
        // Bodies already separating: no impulse is applied
        let mut bodies = vec![ball(0.0, 0.0), ball(1.9, 0.0)];
        bodies[0].set_linear_velocity(Vector::new(-1.0, 0.0));
        bodies[1].set_linear_velocity(Vector::new(1.0, 0.0));
        let mut manifold = Manifold {
            body_a: 0,
            body_b: 1,
            contacts: vec![Contact::new(Vector::new(1.0, 0.0), Vector::X, 0.1)],
        };
        prepare_contacts(&bodies, &mut manifold, 0.1, 0.0, 0.01).unwrap();

        solve_contacts(&mut bodies, &[manifold], 5);
        assert_eq!(bodies[0].linear_velocity(), Vector::new(-1.0, 0.0));
        assert_eq!(bodies[1].linear_velocity(), Vector::new(1.0, 0.0));
    }

    #[test]
    fn test_pair_mut_in_either_order() {
        let mut bodies = vec![ball(0.0, 0.0), ball(3.0, 0.0), ball(6.0, 0.0)];
        let (a, b) = pair_mut(&mut bodies, 2, 0);
        assert_eq!(a.position().x, 6.0);
        assert_eq!(b.position().x, 0.0);
    }
}
