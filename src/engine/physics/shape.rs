// Collision shapes described in local space

use rand::seq::SliceRandom;
use rand::Rng;

use super::{PhysicsError, PhysicsResult};
use crate::core::math::{cross, Real, Transform, Vector};

/// Default display color for new shapes (0xRRGGBB)
pub const DEFAULT_COLOR: u32 = 0x4254f5;

/// Polygons whose area is below this fraction of their squared extent are flat
const AREA_EPSILON: Real = 1e-9;

/// Edges shorter than this fraction of the polygon extent are rejected
const EDGE_EPSILON: Real = 1e-9;

/// Axis-aligned bounding box stored as center and half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vector,
    pub half_extents: Vector,
}

impl Aabb {
    /// Create a box from its center and half extents
    pub fn new(center: Vector, half_extents: Vector) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Smallest box enclosing all points. Returns a zero box for an empty slice.
    pub fn from_points(points: &[Vector]) -> Self {
        let Some(&first) = points.first() else {
            return Self::new(Vector::ZERO, Vector::ZERO);
        };
        let (min, max) = points
            .iter()
            .fold((first, first), |(min, max), &p| (min.min(p), max.max(p)));
        Self::from_min_max(min, max)
    }

    /// Box enclosing a circle
    pub fn from_circle(center: Vector, radius: Real) -> Self {
        Self::new(center, Vector::splat(radius))
    }

    /// Build from corner points
    pub fn from_min_max(min: Vector, max: Vector) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }

    /// Lower-left corner
    pub fn min(&self) -> Vector {
        self.center - self.half_extents
    }

    /// Upper-right corner
    pub fn max(&self) -> Vector {
        self.center + self.half_extents
    }

    /// Per-axis overlap test. Touching boxes count as overlapping.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        d.x <= reach.x && d.y <= reach.y
    }

    /// Whether a point lies inside or on the box
    pub fn contains(&self, point: Vector) -> bool {
        let d = (point - self.center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y
    }
}

/// A circle centered at the local origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub radius: Real,
}

/// A convex polygon with counter-clockwise vertices and outward edge normals
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vector>,
    normals: Vec<Vector>,
}

impl Polygon {
    fn from_vertices(vertices: Vec<Vector>) -> Self {
        let count = vertices.len();
        let normals = (0..count)
            .map(|i| edge_normal(vertices[i], vertices[(i + 1) % count]))
            .collect();
        Self { vertices, normals }
    }

    /// Vertices in counter-clockwise order
    pub fn vertices(&self) -> &[Vector] {
        &self.vertices
    }

    /// Outward unit normal per edge; `normals()[i]` belongs to `edge(i)`
    pub fn normals(&self) -> &[Vector] {
        &self.normals
    }

    /// Number of vertices (and edges)
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Edge `i` runs from vertex `i` to vertex `i + 1`, wrapping around
    pub fn edge(&self, i: usize) -> (Vector, Vector) {
        let count = self.vertices.len();
        (self.vertices[i % count], self.vertices[(i + 1) % count])
    }

    /// All edges in winding order
    pub fn edges(&self) -> impl Iterator<Item = (Vector, Vector)> + '_ {
        (0..self.vertices.len()).map(move |i| self.edge(i))
    }

    /// Apply a rigid transform to vertices and normals
    pub fn transformed(&self, transform: &Transform) -> Polygon {
        Polygon {
            vertices: self
                .vertices
                .iter()
                .map(|&v| transform.transform_point2(v))
                .collect(),
            normals: self
                .normals
                .iter()
                .map(|&n| transform.transform_vector2(n))
                .collect(),
        }
    }

    /// Point-in-convex-polygon test; points on the boundary are inside
    pub fn contains_point(&self, point: Vector) -> bool {
        self.vertices
            .iter()
            .zip(&self.normals)
            .all(|(&v, &n)| n.dot(point - v) <= 0.0)
    }
}

/// Outward normal of the edge `a -> b` for counter-clockwise winding.
///
/// This is the right-hand perpendicular of the travel direction: `(d.y, -d.x)`.
/// SAT axes, best-edge selection and impulse directions all rely on it.
pub fn edge_normal(a: Vector, b: Vector) -> Vector {
    let d = b - a;
    Vector::new(d.y, -d.x).normalize_or_zero()
}

/// Signed area via the shoelace formula; positive for counter-clockwise winding
pub fn shoelace_area(vertices: &[Vector]) -> Real {
    let count = vertices.len();
    (0..count)
        .map(|i| 0.5 * cross(vertices[i], vertices[(i + 1) % count]))
        .sum()
}

/// Area-weighted centroid of the triangle fan spanned from the origin
pub fn polygon_centroid(vertices: &[Vector]) -> Vector {
    let count = vertices.len();
    let mut weighted = Vector::ZERO;
    let mut area = 0.0;
    for i in 0..count {
        let (a, b) = (vertices[i], vertices[(i + 1) % count]);
        let tri_area = 0.5 * cross(a, b);
        area += tri_area;
        weighted += (a + b) / 3.0 * tri_area;
    }
    weighted / area
}

/// Geometry of a shape
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Circle(Circle),
    Polygon(Polygon),
}

/// Immutable local-space collision shape.
///
/// Polygons are recentered at construction so their centroid sits on the local
/// origin, which makes rotating about the origin the same as rotating about the
/// center of mass.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    kind: ShapeKind,
    area: Real,
    local_aabb: Aabb,
    color: u32,
}

impl Shape {
    /// Create a circle shape
    pub fn circle(radius: Real) -> PhysicsResult<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PhysicsError::InvalidRadius(radius));
        }

        Ok(Self {
            kind: ShapeKind::Circle(Circle { radius }),
            area: std::f64::consts::PI * radius * radius,
            local_aabb: Aabb::from_circle(Vector::ZERO, radius),
            color: DEFAULT_COLOR,
        })
    }

    /// Create a convex polygon shape.
    ///
    /// Clockwise input is accepted and reversed. Fewer than three vertices,
    /// non-finite coordinates, repeated vertices, flat or concave outlines are
    /// rejected.
    pub fn polygon(vertices: &[Vector]) -> PhysicsResult<Self> {
        if vertices.len() < 3 {
            return Err(PhysicsError::TooFewVertices(vertices.len()));
        }
        if let Some(i) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(PhysicsError::NonFiniteVertex(i));
        }

        let mut vertices = vertices.to_vec();
        let extent = Aabb::from_points(&vertices).half_extents.max_element() * 2.0;
        let mut area = shoelace_area(&vertices);
        if extent <= 0.0 || area.abs() <= AREA_EPSILON * extent * extent {
            return Err(PhysicsError::DegenerateArea);
        }
        if area < 0.0 {
            vertices.reverse();
            area = -area;
        }

        let count = vertices.len();
        let min_edge = EDGE_EPSILON * extent;
        for i in 0..count {
            let edge = vertices[(i + 1) % count] - vertices[i];
            if edge.length_squared() <= min_edge * min_edge {
                return Err(PhysicsError::ZeroLengthEdge(i));
            }
        }
        for i in 0..count {
            let a = vertices[(i + 1) % count] - vertices[i];
            let b = vertices[(i + 2) % count] - vertices[(i + 1) % count];
            if cross(a, b) < -AREA_EPSILON * extent * extent {
                return Err(PhysicsError::NotConvex((i + 1) % count));
            }
        }
        // Left turns alone admit self-intersecting stars; every vertex must
        // also lie behind every edge.
        for i in 0..count {
            let start = vertices[i];
            let edge = vertices[(i + 1) % count] - start;
            if vertices
                .iter()
                .any(|&v| cross(edge, v - start) < -AREA_EPSILON * extent * extent)
            {
                return Err(PhysicsError::NotConvex(i));
            }
        }

        let centroid = polygon_centroid(&vertices);
        for v in &mut vertices {
            *v -= centroid;
        }

        let local_aabb = Aabb::from_points(&vertices);
        Ok(Self {
            kind: ShapeKind::Polygon(Polygon::from_vertices(vertices)),
            area,
            local_aabb,
            color: DEFAULT_COLOR,
        })
    }

    /// Create a centered rectangle from its half extents
    pub fn rect(half_width: Real, half_height: Real) -> PhysicsResult<Self> {
        Self::polygon(&[
            Vector::new(-half_width, -half_height),
            Vector::new(half_width, -half_height),
            Vector::new(half_width, half_height),
            Vector::new(-half_width, half_height),
        ])
    }

    /// Set the display color (0xRRGGBB)
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn area(&self) -> Real {
        self.area
    }

    pub fn local_aabb(&self) -> Aabb {
        self.local_aabb
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    pub fn is_circle(&self) -> bool {
        matches!(self.kind, ShapeKind::Circle(_))
    }

    /// Whether a point given in the shape's local space is inside it
    pub fn contains_local_point(&self, point: Vector) -> bool {
        match &self.kind {
            ShapeKind::Circle(circle) => point.length_squared() <= circle.radius * circle.radius,
            ShapeKind::Polygon(polygon) => polygon.contains_point(point),
        }
    }
}

/// Generate the vertices of a random convex polygon with `n` vertices (Valtr's algorithm).
///
/// The result is counter-clockwise and fits in the unit square.
pub fn random_convex_polygon<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<Vector> {
    if n < 3 {
        return Vec::new();
    }

    let mut xs: Vec<Real> = (0..n).map(|_| rng.gen::<Real>()).collect();
    let mut ys: Vec<Real> = (0..n).map(|_| rng.gen::<Real>()).collect();
    xs.sort_by(|a, b| a.total_cmp(b));
    ys.sort_by(|a, b| a.total_cmp(b));

    let x_steps = random_chains(rng, &xs);
    let mut y_steps = random_chains(rng, &ys);
    y_steps.shuffle(rng);

    let mut steps: Vec<Vector> = x_steps
        .into_iter()
        .zip(y_steps)
        .map(|(x, y)| Vector::new(x, y))
        .collect();
    steps.sort_by(|a, b| a.y.atan2(a.x).total_cmp(&b.y.atan2(b.x)));

    let mut vertex = Vector::ZERO;
    let mut lowest = Vector::ZERO;
    let mut vertices = Vec::with_capacity(n);
    for step in steps {
        vertices.push(vertex);
        vertex += step;
        lowest = lowest.min(vertex);
    }

    let shift = Vector::new(xs[0], ys[0]) - lowest;
    vertices.iter().map(|&v| v + shift).collect()
}

/// Split sorted coordinates into two random chains and return their signed steps
fn random_chains<R: Rng + ?Sized>(rng: &mut R, sorted: &[Real]) -> Vec<Real> {
    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
    let mut steps = Vec::with_capacity(sorted.len());
    let (mut last_top, mut last_bottom) = (min, min);

    for &t in &sorted[1..sorted.len() - 1] {
        if rng.gen_bool(0.5) {
            steps.push(t - last_top);
            last_top = t;
        } else {
            steps.push(last_bottom - t);
            last_bottom = t;
        }
    }
    steps.push(max - last_top);
    steps.push(last_bottom - max);
    steps
}
