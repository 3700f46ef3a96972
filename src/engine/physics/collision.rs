// Broad-phase AABB rejection and the Separating Axis Theorem narrow phase

use super::body::{TransformedShape, WorldGeometry};
use super::shape::{Aabb, Polygon};
use crate::core::math::{Real, Vector};

/// Added to every SAT penetration so resolved shapes end up a hair apart
/// instead of being reported as overlapping again due to rounding.
pub const PENETRATION_BIAS: Real = 1e-10;

/// Translation vectors (and axes) shorter than this carry no usable direction
pub const DEGENERATE_EPSILON: Real = 1e-14;

/// Broad-phase test: per-axis `|center_a - center_b| <= half_a + half_b`
#[inline]
pub fn aabb_overlap(a: &Aabb, b: &Aabb) -> bool {
    a.overlaps(b)
}

/// Whether a translation vector is too short (or not finite) to define a normal
#[inline]
pub fn is_degenerate(mtv: Vector) -> bool {
    !mtv.is_finite() || mtv.length_squared() < DEGENERATE_EPSILON * DEGENERATE_EPSILON
}

/// Broad phase followed by SAT. Degenerate results count as no collision.
pub fn intersect(a: &TransformedShape, b: &TransformedShape) -> Option<Vector> {
    if !aabb_overlap(&a.aabb, &b.aabb) {
        return None;
    }
    minimum_translation_vector(a, b).filter(|&mtv| !is_degenerate(mtv))
}

/// Smallest translation that separates `b` from `a`, or `None` if they don't overlap.
///
/// The result always points from `a` towards `b` (its dot product with the
/// centroid difference is non-negative).
pub fn minimum_translation_vector(a: &TransformedShape, b: &TransformedShape) -> Option<Vector> {
    let mtv = match (&a.geometry, &b.geometry) {
        (WorldGeometry::Circle { radius: ra }, WorldGeometry::Circle { radius: rb }) => {
            circle_vs_circle(a.centroid, *ra, b.centroid, *rb)
        }
        (WorldGeometry::Polygon(polygon), WorldGeometry::Circle { radius }) => {
            polygon_vs_circle(polygon, b.centroid, *radius)
        }
        (WorldGeometry::Circle { radius }, WorldGeometry::Polygon(polygon)) => {
            polygon_vs_circle(polygon, a.centroid, *radius)
        }
        (WorldGeometry::Polygon(pa), WorldGeometry::Polygon(pb)) => polygon_vs_polygon(pa, pb),
    }?;

    if mtv.dot(b.centroid - a.centroid) < 0.0 {
        Some(-mtv)
    } else {
        Some(mtv)
    }
}

fn circle_vs_circle(ca: Vector, ra: Real, cb: Vector, rb: Real) -> Option<Vector> {
    let d = cb - ca;
    let reach = ra + rb;
    let dist_sq = d.length_squared();
    if dist_sq >= reach * reach {
        return None;
    }

    let dist = dist_sq.sqrt();
    if dist == 0.0 {
        // Concentric: any direction works, pick a fixed one
        return Some(Vector::X * reach);
    }
    Some(d / dist * (reach - dist))
}

fn polygon_vs_polygon(a: &Polygon, b: &Polygon) -> Option<Vector> {
    let axes = a.normals().iter().chain(b.normals()).copied();
    separating_axes(
        axes,
        |axis| Interval::of_points(a.vertices(), axis),
        |axis| Interval::of_points(b.vertices(), axis),
    )
}

fn polygon_vs_circle(polygon: &Polygon, center: Vector, radius: Real) -> Option<Vector> {
    // Voronoi axis: from the closest vertex to the circle center
    let closest = polygon
        .vertices()
        .iter()
        .copied()
        .min_by(|p, q| {
            p.distance_squared(center)
                .total_cmp(&q.distance_squared(center))
        })?;

    let axes = polygon
        .normals()
        .iter()
        .copied()
        .chain(std::iter::once(center - closest));
    separating_axes(
        axes,
        |axis| Interval::of_points(polygon.vertices(), axis),
        |axis| Interval::of_circle(center, radius, axis),
    )
}

/// Projection of a shape onto an axis
#[derive(Debug, Clone, Copy, PartialEq)]
struct Interval {
    min: Real,
    max: Real,
}

impl Interval {
    fn of_points(points: &[Vector], axis: Vector) -> Self {
        points.iter().fold(
            Self {
                min: Real::INFINITY,
                max: Real::NEG_INFINITY,
            },
            |acc, p| {
                let d = p.dot(axis);
                Self {
                    min: acc.min.min(d),
                    max: acc.max.max(d),
                }
            },
        )
    }

    fn of_circle(center: Vector, radius: Real, axis: Vector) -> Self {
        let c = center.dot(axis);
        let r = radius * axis.length();
        Self {
            min: c - r,
            max: c + r,
        }
    }

    /// Overlap length in axis units, or `None` if the intervals are disjoint.
    /// When one interval contains the other, the shorter exit distance is added.
    fn overlap(&self, other: &Interval) -> Option<Real> {
        let overlap = self.max.min(other.max) - self.min.max(other.min);
        if overlap < 0.0 {
            return None;
        }

        let contains = (self.min <= other.min && self.max >= other.max)
            || (other.min <= self.min && other.max >= self.max);
        if contains {
            let exit = (self.min - other.min).abs().min((self.max - other.max).abs());
            Some(overlap + exit)
        } else {
            Some(overlap)
        }
    }
}

/// Test every candidate axis; early out on the first separating one.
///
/// Axes need not be unit length: overlaps are divided by the axis length to
/// compare them in world units and the result is scaled by the squared length.
fn separating_axes<I, A, B>(axes: I, project_a: A, project_b: B) -> Option<Vector>
where
    I: IntoIterator<Item = Vector>,
    A: Fn(Vector) -> Interval,
    B: Fn(Vector) -> Interval,
{
    let mut best: Option<(Real, Vector)> = None;

    for axis in axes {
        let len_sq = axis.length_squared();
        if len_sq < DEGENERATE_EPSILON * DEGENERATE_EPSILON {
            continue;
        }

        let overlap = project_a(axis).overlap(&project_b(axis))?;
        let len = len_sq.sqrt();
        let depth = overlap / len;
        if best.map_or(true, |(best_depth, _)| depth < best_depth) {
            let mtv = axis * ((overlap + PENETRATION_BIAS * len) / len_sq);
            best = Some((depth, mtv));
        }
    }

    best.map(|(_, mtv)| mtv)
}
