//! Collision primitives for the reference broad-phase
//!
//! Blocks are axis-aligned boxes; bombs, actors and pickups are circles.
//! Rays report the entry distance, or zero when they start inside a shape.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Collider geometry, centered on the owning entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Axis-aligned box with the given half extents
    Box { half: Vec2 },
    /// Circle with the given radius
    Circle { radius: f32 },
}

impl Shape {
    /// Does a point lie inside (or on) the shape placed at `center`?
    pub fn contains_point(&self, center: Vec2, point: Vec2) -> bool {
        match *self {
            Shape::Box { half } => {
                let d = (point - center).abs();
                d.x <= half.x && d.y <= half.y
            }
            Shape::Circle { radius } => point.distance_squared(center) <= radius * radius,
        }
    }

    /// Distance from a point to the shape's surface (zero when inside)
    pub fn distance_to_point(&self, center: Vec2, point: Vec2) -> f32 {
        match *self {
            Shape::Box { half } => {
                let d = (point - center).abs() - half;
                d.max(Vec2::ZERO).length()
            }
            Shape::Circle { radius } => (point.distance(center) - radius).max(0.0),
        }
    }

    /// Does a circle overlap the shape? Touching counts as overlap.
    pub fn overlaps_circle(&self, center: Vec2, circle_center: Vec2, circle_radius: f32) -> bool {
        self.distance_to_point(center, circle_center) <= circle_radius
    }

    /// Gap between this shape and a circle (negative never reported; zero when overlapping)
    pub fn gap_to_circle(&self, center: Vec2, circle_center: Vec2, circle_radius: f32) -> f32 {
        (self.distance_to_point(center, circle_center) - circle_radius).max(0.0)
    }

    /// Signed distance from a point to the surface (negative inside)
    pub fn signed_distance(&self, center: Vec2, point: Vec2) -> f32 {
        match *self {
            Shape::Box { half } => {
                let d = (point - center).abs() - half;
                d.max(Vec2::ZERO).length() + d.x.max(d.y).min(0.0)
            }
            Shape::Circle { radius } => point.distance(center) - radius,
        }
    }

    /// How far a circle sinks into the shape (zero when apart)
    pub fn penetration(&self, center: Vec2, circle_center: Vec2, circle_radius: f32) -> f32 {
        (circle_radius - self.signed_distance(center, circle_center)).max(0.0)
    }

    /// Cast a ray against the shape.
    ///
    /// `dir` must be normalized. Returns the entry distance along the ray if
    /// it is within `max_distance`.
    pub fn raycast(&self, center: Vec2, origin: Vec2, dir: Vec2, max_distance: f32) -> Option<f32> {
        let t = match *self {
            Shape::Box { half } => ray_box(origin, dir, center - half, center + half)?,
            Shape::Circle { radius } => ray_circle(origin, dir, center, radius)?,
        };
        (t <= max_distance).then_some(t)
    }
}

/// Slab test against an AABB; returns the entry distance (zero if inside)
fn ray_box(origin: Vec2, dir: Vec2, min: Vec2, max: Vec2) -> Option<f32> {
    let mut t_enter = 0.0f32;
    let mut t_exit = f32::INFINITY;

    for axis in 0..2 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < 1e-8 {
            // Parallel to this slab: must already be inside it
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    Some(t_enter)
}

/// Ray against a circle; returns the entry distance (zero if inside)
fn ray_circle(origin: Vec2, dir: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let to_origin = origin - center;
    let c = to_origin.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let b = to_origin.dot(dir);
    if b > 0.0 {
        // Outside and pointing away
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    Some(-b - disc.sqrt())
}
