// Debug geometry: line-list outlines of bodies ready for upload to a GPU buffer

use super::body::{RigidBody, TransformedShape, WorldGeometry};
use super::shape::{Aabb, Polygon};
use crate::core::math::{Real, Transform, Vector};

const CIRCLE_SEGMENTS: usize = 16;
const NORMAL_LENGTH: Real = 0.5;
const AABB_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.3];
const NORMAL_COLOR: [f32; 4] = [1.0, 0.9, 0.1, 0.8];

/// Vertex of the debug line list (position + RGBA color)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DebugVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Convert a packed `0xRRGGBB` color into normalized RGBA
pub fn color_to_rgba(color: u32, alpha: f32) -> [f32; 4] {
    let channel = |shift: u32| ((color >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0), alpha]
}

/// Builds outlines of bodies as an indexed line list.
/// Static bodies are drawn translucent.
#[derive(Debug, Default)]
pub struct DebugRenderer {
    vertices: Vec<DebugVertex>,
    indices: Vec<u32>,
    enabled: bool,
    draw_aabbs: bool,
    draw_normals: bool,
}

impl DebugRenderer {
    /// Create a new debug renderer (disabled by default)
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable debug geometry
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Also outline each body's bounding box
    pub fn set_draw_aabbs(&mut self, draw_aabbs: bool) {
        self.draw_aabbs = draw_aabbs;
    }

    /// Also draw polygon edge normals
    pub fn set_draw_normals(&mut self, draw_normals: bool) {
        self.draw_normals = draw_normals;
    }

    /// Rebuild the geometry for the current body poses.
    /// Refreshes stale world-space shapes on the way.
    pub fn prepare(&mut self, bodies: &mut [RigidBody]) {
        self.vertices.clear();
        self.indices.clear();

        if !self.enabled {
            return;
        }

        for body in bodies.iter_mut() {
            let alpha = if body.is_static() { 0.5 } else { 0.9 };
            let color = color_to_rgba(body.shape().color(), alpha);
            let shape = body.ensure_transformed_shape();

            self.draw_shape(shape, color);
            if self.draw_aabbs {
                self.draw_aabb(&shape.aabb);
            }
        }
    }

    pub fn vertices(&self) -> &[DebugVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertex data as raw bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as raw bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    fn draw_shape(&mut self, shape: &TransformedShape, color: [f32; 4]) {
        match &shape.geometry {
            WorldGeometry::Circle { radius } => {
                self.draw_circle(&shape.transform, *radius, color);
            }
            WorldGeometry::Polygon(polygon) => {
                self.draw_loop(polygon.vertices(), color);
                if self.draw_normals {
                    self.draw_polygon_normals(polygon);
                }
            }
        }
    }

    /// Circle outline plus a radius line showing the rotation
    fn draw_circle(&mut self, transform: &Transform, radius: Real, color: [f32; 4]) {
        let points: Vec<Vector> = (0..CIRCLE_SEGMENTS)
            .map(|i| {
                let angle = (i as Real / CIRCLE_SEGMENTS as Real) * std::f64::consts::TAU;
                transform.transform_point2(Vector::new(angle.cos(), angle.sin()) * radius)
            })
            .collect();
        self.draw_loop(&points, color);

        let center = transform.transform_point2(Vector::ZERO);
        let rim = transform.transform_point2(Vector::new(radius, 0.0));
        self.draw_line(center, rim, color);
    }

    fn draw_aabb(&mut self, aabb: &Aabb) {
        let (min, max) = (aabb.min(), aabb.max());
        let corners = [min, Vector::new(max.x, min.y), max, Vector::new(min.x, max.y)];
        self.draw_loop(&corners, AABB_COLOR);
    }

    fn draw_polygon_normals(&mut self, polygon: &Polygon) {
        for (i, normal) in polygon.normals().iter().enumerate() {
            let (a, b) = polygon.edge(i);
            let midpoint = (a + b) * 0.5;
            self.draw_line(midpoint, midpoint + *normal * NORMAL_LENGTH, NORMAL_COLOR);
        }
    }

    /// Closed outline through `points`
    fn draw_loop(&mut self, points: &[Vector], color: [f32; 4]) {
        let start_idx = self.vertices.len() as u32;
        let count = points.len() as u32;

        for point in points {
            self.push_vertex(*point, color);
        }
        for i in 0..count {
            self.indices.push(start_idx + i);
            self.indices.push(start_idx + (i + 1) % count);
        }
    }

    fn draw_line(&mut self, from: Vector, to: Vector, color: [f32; 4]) {
        let start_idx = self.vertices.len() as u32;
        self.push_vertex(from, color);
        self.push_vertex(to, color);
        self.indices.push(start_idx);
        self.indices.push(start_idx + 1);
    }

    fn push_vertex(&mut self, point: Vector, color: [f32; 4]) {
        self.vertices.push(DebugVertex {
            position: [point.x as f32, point.y as f32],
            color,
        });
    }
}
