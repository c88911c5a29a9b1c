use bevy::color::Color;
use bevy::math::Vec2;
use std::collections::{vec_deque, VecDeque};

use crate::surface::Surface;

/// Maximum number of past positions a body remembers.
pub const TRAIL_CAPACITY: usize = 1000;

pub const TRAIL_COLOR: Color = Color::srgb(1.0, 1.0, 1.0);
pub const TRAIL_WIDTH: f32 = 1.0;
pub const INNER_RING_COLOR: Color = Color::srgb(1.0, 109.0 / 255.0, 11.0 / 255.0);
pub const OUTER_RING_COLOR: Color = Color::srgb(1.0, 1.0, 1.0);
pub const RING_WIDTH: f32 = 4.0;

/// Bounded FIFO of positions, oldest first.
#[derive(Clone, Debug)]
pub struct Trail {
    points: VecDeque<Vec2>,
}

impl Default for Trail {
    fn default() -> Self {
        Self {
            points: VecDeque::with_capacity(TRAIL_CAPACITY),
        }
    }
}

impl Trail {
    pub fn push(&mut self, p: Vec2) {
        if self.points.len() == TRAIL_CAPACITY {
            self.points.pop_front();
        }
        self.points.push_back(p);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Vec2> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<Vec2> {
        self.points.back().copied()
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub mass: f32,
    pub radius: f32,
    pub color: Color,
    pub is_static: bool,
    pub pos: Vec2,
    pub vel: Vec2,
    pub acc: Vec2,
    pub trail: Trail,
}

impl Body {
    pub fn new(pos: Vec2, mass: f32, radius: f32, color: Color) -> Self {
        Self {
            mass,
            radius,
            color,
            is_static: false,
            pos,
            vel: Vec2::ZERO,
            acc: Vec2::ZERO,
            trail: Trail::default(),
        }
    }

    /// An anchor: still a gravity source and collision target, but never moves.
    pub fn new_static(pos: Vec2, mass: f32, radius: f32, color: Color) -> Self {
        Self {
            is_static: true,
            ..Self::new(pos, mass, radius, color)
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn momentum(&self) -> Vec2 {
        self.vel * self.mass
    }

    pub fn apply_force(&mut self, force: Vec2) {
        if !self.is_static {
            self.acc += force / self.mass;
        }
    }

    /// Semi-implicit Euler: velocity first, then position from the new velocity.
    ///
    /// Acceleration is cleared and a trail point recorded even for static
    /// bodies, so an anchor's trail is the same point repeated.
    pub fn integrate(&mut self, dt: f32) {
        if !self.is_static {
            self.vel += self.acc * dt;
            self.pos += self.vel * dt;
        }
        self.acc = Vec2::ZERO;
        self.trail.push(self.pos);
    }

    pub fn render<S: Surface>(&self, surface: &mut S) {
        if self.trail.len() > 1 {
            surface.polyline(self.trail.iter().copied(), TRAIL_COLOR, TRAIL_WIDTH);
        }
        if self.is_static {
            surface.circle_outline(self.pos, self.radius + 2.0, INNER_RING_COLOR, RING_WIDTH);
            surface.circle_outline(self.pos, self.radius + 10.0, OUTER_RING_COLOR, RING_WIDTH);
        }
        surface.fill_circle(self.pos, self.radius, self.color);
    }
}
