// Math utilities and helper functions

use glam::{DAffine2, DVec2};

/// Scalar type used throughout the simulation
pub type Real = f64;

/// 2D vector type used throughout the simulation
pub type Vector = DVec2;

/// Affine 2D transform (rotation + translation)
pub type Transform = DAffine2;

/// 2D cross product (perp-dot), the z component of the 3D cross product
#[inline]
pub fn cross(a: Vector, b: Vector) -> Real {
    a.perp_dot(b)
}

/// Cross product of a scalar angular velocity with a vector (ω × r)
#[inline]
pub fn cross_scalar(s: Real, v: Vector) -> Vector {
    Vector::new(-s * v.y, s * v.x)
}

/// Clamp the length of a vector to at most `max`
#[inline]
pub fn clamp_magnitude(v: Vector, max: Real) -> Vector {
    let len_sq = v.length_squared();
    if len_sq > max * max {
        v * (max / len_sq.sqrt())
    } else {
        v
    }
}

/// Clamp a scalar to [-1, 1], the scalar counterpart of `clamp_magnitude(v, 1)`
#[inline]
pub fn clamp_unit(value: Real) -> Real {
    value.clamp(-1.0, 1.0)
}

/// Build the model transform for a pose
#[inline]
pub fn pose_transform(position: Vector, rotation: Real) -> Transform {
    DAffine2::from_angle_translation(rotation, position)
}

/// Check if two values are approximately equal
#[inline]
pub fn approx_equal(a: Real, b: Real, epsilon: Real) -> bool {
    (a - b).abs() < epsilon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross() {
        assert_eq!(cross(Vector::X, Vector::Y), 1.0);
        assert_eq!(cross(Vector::Y, Vector::X), -1.0);
        assert_eq!(cross(Vector::new(2.0, 0.0), Vector::new(4.0, 0.0)), 0.0);
    }

    #[test]
    fn test_cross_scalar_is_perpendicular() {
        let r = Vector::new(3.0, -2.0);
        let v = cross_scalar(1.5, r);
        assert_eq!(v.dot(r), 0.0);
        assert_eq!(v, Vector::new(3.0, 4.5));
    }

    #[test]
    fn test_clamp_magnitude() {
        let short = Vector::new(0.3, 0.4);
        assert_eq!(clamp_magnitude(short, 1.0), short);

        let long = clamp_magnitude(Vector::new(30.0, 40.0), 1.0);
        assert!(approx_equal(long.length(), 1.0, 1e-12));
        assert!(approx_equal(long.x, 0.6, 1e-12));
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(-7.0), -1.0);
        assert_eq!(clamp_unit(3.0), 1.0);
    }

    #[test]
    fn test_pose_transform() {
        let t = pose_transform(Vector::new(1.0, 2.0), std::f64::consts::FRAC_PI_2);
        let p = t.transform_point2(Vector::X);
        assert!(approx_equal(p.x, 1.0, 1e-12));
        assert!(approx_equal(p.y, 3.0, 1e-12));
    }

    #[test]
    fn test_approx_equal() {
        assert!(approx_equal(1.0, 1.00001, 0.0001));
        assert!(!approx_equal(1.0, 1.1, 0.01));
    }
}
