// Contact manifold generation: reference/incident edges and segment clipping

use super::body::{TransformedShape, WorldGeometry};
use super::collision::is_degenerate;
use super::shape::Polygon;
use crate::core::math::{Real, Vector};

/// A single contact point between two bodies.
///
/// Created by the manifold builder each frame; the solver fills in the
/// constraint terms (`r1`, `r2`, `inverse_effective_mass`, `bias`) before
/// iterating. Contacts never outlive the frame that produced them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// World-space contact point
    pub position: Vector,
    /// Unit normal pointing from body A towards body B
    pub normal: Vector,
    /// Overlap along the normal (non-negative while penetrating)
    pub penetration_depth: Real,
    /// Contact point relative to body A's centroid
    pub r1: Vector,
    /// Contact point relative to body B's centroid
    pub r2: Vector,
    /// Reciprocal of the effective mass along the normal
    pub inverse_effective_mass: Real,
    /// Baumgarte velocity bias
    pub bias: Real,
}

impl Contact {
    pub fn new(position: Vector, normal: Vector, penetration_depth: Real) -> Self {
        Self {
            position,
            normal,
            penetration_depth,
            r1: Vector::ZERO,
            r2: Vector::ZERO,
            inverse_effective_mass: 0.0,
            bias: 0.0,
        }
    }
}

/// All contacts between one pair of bodies for this frame
#[derive(Debug, Clone, PartialEq)]
pub struct Manifold {
    pub body_a: usize,
    pub body_b: usize,
    pub contacts: Vec<Contact>,
}

/// Edge of a polygon chosen to take part in clipping
#[derive(Debug, Clone, Copy, PartialEq)]
struct Feature {
    start: Vector,
    end: Vector,
    /// Vertex furthest along the search direction
    max_vertex: Vector,
}

impl Feature {
    fn direction(&self) -> Vector {
        (self.end - self.start).normalize_or_zero()
    }
}

/// Build the contacts for two overlapping shapes given the MTV from `a` to `b`.
///
/// Returns 0, 1 or 2 contacts sharing the MTV direction as their normal.
pub fn build_contacts(a: &TransformedShape, b: &TransformedShape, mtv: Vector) -> Vec<Contact> {
    if is_degenerate(mtv) {
        return Vec::new();
    }

    let depth = mtv.length();
    let normal = mtv / depth;

    match (&a.geometry, &b.geometry) {
        (WorldGeometry::Circle { radius }, _) => {
            vec![Contact::new(a.centroid + normal * *radius, normal, depth)]
        }
        // The normal points from A into B, so B's surface facing A is behind its center
        (_, WorldGeometry::Circle { radius }) => {
            vec![Contact::new(b.centroid - normal * *radius, normal, depth)]
        }
        (WorldGeometry::Polygon(pa), WorldGeometry::Polygon(pb)) => polygon_contacts(pa, pb, normal),
    }
}

fn polygon_contacts(a: &Polygon, b: &Polygon, normal: Vector) -> Vec<Contact> {
    let edge_a = best_edge(a, normal);
    let edge_b = best_edge(b, -normal);

    // The edge most perpendicular to the normal becomes the reference face
    let (reference, incident) =
        if edge_a.direction().dot(normal).abs() < edge_b.direction().dot(normal).abs() {
            (edge_a, edge_b)
        } else {
            (edge_b, edge_a)
        };

    clip_incident(&reference, &incident)
        .into_iter()
        .map(|(position, depth)| Contact::new(position, normal, depth))
        .collect()
}

/// Find the edge furthest along `direction` that is most perpendicular to it.
///
/// The returned edge keeps the polygon's counter-clockwise order.
fn best_edge(polygon: &Polygon, direction: Vector) -> Feature {
    let vertices = polygon.vertices();
    let count = vertices.len();

    let mut index = 0;
    let mut max_projection = Real::NEG_INFINITY;
    for (i, v) in vertices.iter().enumerate() {
        let projection = v.dot(direction);
        if projection > max_projection {
            max_projection = projection;
            index = i;
        }
    }

    let vertex = vertices[index];
    let next = vertices[(index + 1) % count];
    let prev = vertices[(index + count - 1) % count];

    // Both point towards the furthest vertex
    let from_next = (vertex - next).normalize_or_zero();
    let from_prev = (vertex - prev).normalize_or_zero();

    if from_next.dot(direction) < from_prev.dot(direction) {
        Feature {
            start: vertex,
            end: next,
            max_vertex: vertex,
        }
    } else {
        Feature {
            start: prev,
            end: vertex,
            max_vertex: vertex,
        }
    }
}

/// Clip the incident edge against the side planes of the reference edge and
/// keep the points lying behind the reference face, paired with their depth.
fn clip_incident(reference: &Feature, incident: &Feature) -> Vec<(Vector, Real)> {
    let ref_dir = reference.direction();

    let start_offset = ref_dir.dot(reference.start);
    let clipped = clip_segment(incident.start, incident.end, -ref_dir, -start_offset);
    if clipped.len() < 2 {
        return Vec::new();
    }

    let end_offset = ref_dir.dot(reference.end);
    let clipped = clip_segment(clipped[0], clipped[1], ref_dir, end_offset);
    if clipped.len() < 2 {
        return Vec::new();
    }

    // Counter-clockwise edges have their interior on the left
    let inward = ref_dir.perp();
    let face_depth = inward.dot(reference.max_vertex);

    clipped
        .into_iter()
        .map(|p| (p, inward.dot(p) - face_depth))
        .filter(|&(_, depth)| depth >= 0.0)
        .collect()
}

/// Keep the segment end points with `dot(p, n) <= offset`; if the segment
/// crosses the plane, add the intersection point.
fn clip_segment(p1: Vector, p2: Vector, n: Vector, offset: Real) -> Vec<Vector> {
    let mut clipped = Vec::with_capacity(2);
    let d1 = p1.dot(n) - offset;
    let d2 = p2.dot(n) - offset;

    if d1 <= 0.0 {
        clipped.push(p1);
    }
    if d2 <= 0.0 {
        clipped.push(p2);
    }

    if d1 * d2 < 0.0 {
        let u = d1 / (d1 - d2);
        clipped.push(p1 + (p2 - p1) * u);
    }
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::collision::minimum_translation_vector;
    use crate::engine::physics::shape::Shape;
    use approx::assert_abs_diff_eq;

    fn placed(shape: Shape, x: Real, y: Real, rotation: Real) -> TransformedShape {
        TransformedShape::from_shape(&shape, Vector::new(x, y), rotation)
    }

    fn contacts_between(a: &TransformedShape, b: &TransformedShape) -> Vec<Contact> {
        let mtv = minimum_translation_vector(a, b).expect("shapes should overlap");
        build_contacts(a, b, mtv)
    }

    #[test]
    fn test_clip_segment() {
        let p1 = Vector::new(-1.0, 0.0);
        let p2 = Vector::new(3.0, 0.0);

        let clipped = clip_segment(p1, p2, Vector::X, 1.0);
        assert_eq!(clipped, vec![p1, Vector::new(1.0, 0.0)]);

        let both = clip_segment(p1, p2, Vector::X, 5.0);
        assert_eq!(both, vec![p1, p2]);

        let none = clip_segment(p1, p2, Vector::X, -2.0);
        assert!(none.is_empty());
    }

    #[test]
    fn test_best_edge_keeps_winding() {
        let shape = Shape::rect(1.0, 1.0).unwrap();
        let square = placed(shape, 0.0, 0.0, 0.0);
        let edge = best_edge(square.polygon().unwrap(), Vector::Y);

        assert_eq!(edge.start, Vector::new(1.0, 1.0));
        assert_eq!(edge.end, Vector::new(-1.0, 1.0));
        assert_eq!(edge.max_vertex, Vector::new(1.0, 1.0));
    }

    #[test]
    fn test_box_resting_on_floor_has_two_contacts() {
        let floor = placed(Shape::rect(5.0, 0.5).unwrap(), 0.0, 0.0, 0.0);
        let crate_box = placed(Shape::rect(0.5, 0.5).unwrap(), 1.0, 0.9, 0.0);

        let contacts = contacts_between(&floor, &crate_box);
        assert_eq!(contacts.len(), 2);
        for contact in &contacts {
            assert_abs_diff_eq!(contact.normal.y, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(contact.penetration_depth, 0.1, epsilon = 1e-9);
            assert_abs_diff_eq!(contact.position.y, 0.5, epsilon = 1e-9);
        }

        let mut xs: Vec<Real> = contacts.iter().map(|c| c.position.x).collect();
        xs.sort_by(|a, b| a.total_cmp(b));
        assert_abs_diff_eq!(xs[0], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(xs[1], 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_touching_boxes_keep_zero_depth_contacts() {
        let floor = placed(Shape::rect(5.0, 0.5).unwrap(), 0.0, 0.0, 0.0);
        let crate_box = placed(Shape::rect(0.5, 0.5).unwrap(), 0.0, 1.0, 0.0);

        let contacts = contacts_between(&floor, &crate_box);
        assert_eq!(contacts.len(), 2);
        for contact in &contacts {
            assert_abs_diff_eq!(contact.penetration_depth, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_tilted_box_touches_with_one_corner() {
        let angle: Real = 0.1;
        let floor = placed(Shape::rect(5.0, 0.5).unwrap(), 0.0, 0.0, 0.0);
        let center_y = 0.45 + 0.5 * (angle.sin() + angle.cos());
        let crate_box = placed(Shape::rect(0.5, 0.5).unwrap(), 0.0, center_y, angle);

        let contacts = contacts_between(&floor, &crate_box);
        assert_eq!(contacts.len(), 1);
        assert_abs_diff_eq!(contacts[0].penetration_depth, 0.05, epsilon = 1e-9);
        assert_abs_diff_eq!(contacts[0].position.y, 0.45, epsilon = 1e-9);
        assert!(contacts[0].position.x < 0.0);
    }

    #[test]
    fn test_circle_contacts() {
        let ball = placed(Shape::circle(1.0).unwrap(), 0.0, 1.4, 0.0);
        let floor = placed(Shape::rect(5.0, 0.5).unwrap(), 0.0, 0.0, 0.0);

        // Polygon first: the contact sits on the circle surface facing the floor
        let contacts = contacts_between(&floor, &ball);
        assert_eq!(contacts.len(), 1);
        assert_abs_diff_eq!(contacts[0].position.y, 0.4, epsilon = 1e-9);
        assert_abs_diff_eq!(contacts[0].penetration_depth, 0.1, epsilon = 1e-9);
        assert_abs_diff_eq!(contacts[0].normal.y, 1.0, epsilon = 1e-12);

        // Circle first: same point, opposite normal
        let contacts = contacts_between(&ball, &floor);
        assert_eq!(contacts.len(), 1);
        assert_abs_diff_eq!(contacts[0].position.y, 0.4, epsilon = 1e-9);
        assert_abs_diff_eq!(contacts[0].normal.y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_mtv_yields_no_contacts() {
        let a = placed(Shape::rect(1.0, 1.0).unwrap(), 0.0, 0.0, 0.0);
        let b = placed(Shape::rect(1.0, 1.0).unwrap(), 0.0, 0.5, 0.0);
        assert!(build_contacts(&a, &b, Vector::ZERO).is_empty());
        assert!(build_contacts(&a, &b, Vector::new(Real::NAN, 1.0)).is_empty());
    }
}
