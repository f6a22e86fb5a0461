//! Physics collaborator contract and a built-in kinematic world
//!
//! The gameplay core never integrates motion or detects contacts itself. It
//! talks to a [`PhysicsWorld`], which owns body positions/velocities, applies
//! wrap regions, and reports collision-start pairs once per step.
//!
//! [`KinematicWorld`] is a small headless implementation: explicit Euler
//! integration with air friction, circle/oriented-rectangle narrow phase, and
//! no collision response. Hosts with a real engine implement the trait instead.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::AIR_FRICTION;

/// Opaque handle to a body owned by a physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Collision geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Rectangle centered on the body position, rotated by the body angle
    Rect { width: f32, height: f32 },
}

impl Shape {
    /// Half extents of the axis-aligned box enclosing the shape at `angle`
    pub fn aabb_half_extents(&self, angle: f32) -> Vec2 {
        match *self {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Rect { width, height } => {
                let (sin, cos) = angle.sin_cos();
                let (hw, hh) = (width / 2.0, height / 2.0);
                Vec2::new(
                    cos.abs() * hw + sin.abs() * hh,
                    sin.abs() * hw + cos.abs() * hh,
                )
            }
        }
    }
}

/// Axis-aligned rectangular region (field bounds, wrap regions)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Bounds from the origin to `size`
    pub fn from_size(size: Vec2) -> Self {
        Self::new(Vec2::ZERO, size)
    }

    /// Grow (or shrink, for negative margins) on every side
    pub fn expanded(&self, margin: f32) -> Self {
        Self::new(self.min - Vec2::splat(margin), self.max + Vec2::splat(margin))
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Everything needed to create a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub shape: Shape,
    /// Collision group, see [`groups_can_collide`]
    pub group: i32,
    /// Teleport to the opposite edge after fully leaving this region
    pub wrap: Option<Bounds>,
}

impl BodyDesc {
    pub fn circle(pos: Vec2, radius: f32) -> Self {
        Self::new(pos, Shape::Circle { radius })
    }

    pub fn rect(pos: Vec2, width: f32, height: f32) -> Self {
        Self::new(pos, Shape::Rect { width, height })
    }

    fn new(pos: Vec2, shape: Shape) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            angle: 0.0,
            shape,
            group: 0,
            wrap: None,
        }
    }

    pub fn with_group(mut self, group: i32) -> Self {
        self.group = group;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_wrap(mut self, wrap: Bounds) -> Self {
        self.wrap = Some(wrap);
        self
    }
}

/// A body living in a [`KinematicWorld`]
#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub shape: Shape,
    pub group: i32,
    pub wrap: Option<Bounds>,
}

impl Body {
    fn from_desc(id: BodyId, desc: BodyDesc) -> Self {
        Self {
            id,
            pos: desc.pos,
            vel: desc.vel,
            angle: desc.angle,
            shape: desc.shape,
            group: desc.group,
            wrap: desc.wrap,
        }
    }

    /// Apply the wrap region, if any
    fn wrap(&mut self) {
        let Some(region) = self.wrap else {
            return;
        };
        let half = self.shape.aabb_half_extents(self.angle);

        if self.pos.x - half.x > region.max.x {
            self.pos.x = region.min.x - half.x;
        } else if self.pos.x + half.x < region.min.x {
            self.pos.x = region.max.x + half.x;
        }

        if self.pos.y - half.y > region.max.y {
            self.pos.y = region.min.y - half.y;
        } else if self.pos.y + half.y < region.min.y {
            self.pos.y = region.max.y + half.y;
        }
    }
}

/// A pair of bodies that started touching during a step (`a < b`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    pub a: BodyId,
    pub b: BodyId,
}

impl CollisionPair {
    pub fn new(x: BodyId, y: BodyId) -> Self {
        if x <= y { Self { a: x, b: y } } else { Self { a: y, b: x } }
    }

    pub fn involves(&self, id: BodyId) -> bool {
        self.a == id || self.b == id
    }
}

/// Group filtering: bodies sharing a non-zero group collide only if the group
/// is positive. Any other combination collides.
#[inline]
pub fn groups_can_collide(a: i32, b: i32) -> bool {
    if a == b && a != 0 { a > 0 } else { true }
}

/// Exact overlap test between two posed shapes (touching edges do not count)
pub fn shapes_overlap(
    pos_a: Vec2,
    angle_a: f32,
    shape_a: &Shape,
    pos_b: Vec2,
    angle_b: f32,
    shape_b: &Shape,
) -> bool {
    match (*shape_a, *shape_b) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            pos_a.distance_squared(pos_b) < (ra + rb) * (ra + rb)
        }
        (Shape::Circle { radius }, Shape::Rect { width, height }) => {
            circle_rect_overlap(pos_a, radius, pos_b, angle_b, Vec2::new(width, height) / 2.0)
        }
        (Shape::Rect { width, height }, Shape::Circle { radius }) => {
            circle_rect_overlap(pos_b, radius, pos_a, angle_a, Vec2::new(width, height) / 2.0)
        }
        (Shape::Rect { width: wa, height: ha }, Shape::Rect { width: wb, height: hb }) => {
            rect_rect_overlap(
                pos_a,
                angle_a,
                Vec2::new(wa, ha) / 2.0,
                pos_b,
                angle_b,
                Vec2::new(wb, hb) / 2.0,
            )
        }
    }
}

fn circle_rect_overlap(center: Vec2, radius: f32, rect_pos: Vec2, rect_angle: f32, half: Vec2) -> bool {
    // Work in the rectangle's local frame
    let local = Vec2::from_angle(-rect_angle).rotate(center - rect_pos);
    let closest = local.clamp(-half, half);
    local.distance_squared(closest) < radius * radius
}

/// Separating axis test for two oriented rectangles
fn rect_rect_overlap(pa: Vec2, angle_a: f32, ha: Vec2, pb: Vec2, angle_b: f32, hb: Vec2) -> bool {
    let (ax, bx) = (Vec2::from_angle(angle_a), Vec2::from_angle(angle_b));
    let axes = [ax, ax.perp(), bx, bx.perp()];
    let delta = pb - pa;

    axes.iter().all(|axis| {
        let ra = ha.x * axis.dot(ax).abs() + ha.y * axis.dot(ax.perp()).abs();
        let rb = hb.x * axis.dot(bx).abs() + hb.y * axis.dot(bx.perp()).abs();
        delta.dot(*axis).abs() < ra + rb
    })
}

/// Operations the gameplay core consumes from a physics/render collaborator
pub trait PhysicsWorld {
    /// Allocate a fresh collision group. Non-colliding groups suppress
    /// contacts between their own members.
    fn next_group(&mut self, non_colliding: bool) -> i32;

    fn add_body(&mut self, desc: BodyDesc) -> BodyId;

    /// Returns false if the body was not present
    fn remove_body(&mut self, id: BodyId) -> bool;

    fn contains(&self, id: BodyId) -> bool;

    fn body_count(&self) -> usize;

    fn position(&self, id: BodyId) -> Option<Vec2>;

    fn velocity(&self, id: BodyId) -> Option<Vec2>;

    fn angle(&self, id: BodyId) -> Option<f32>;

    fn set_velocity(&mut self, id: BodyId, vel: Vec2);

    fn set_angle(&mut self, id: BodyId, angle: f32);

    /// Would `probe` (not yet in the world) overlap the live body `other`?
    fn narrow_phase_collides(&self, probe: &BodyDesc, other: BodyId) -> bool;

    /// Advance by `dt` seconds and return the pairs that started touching
    fn step(&mut self, dt: f32) -> Vec<CollisionPair>;

    /// Stop stepping for good (runner and renderer stopped)
    fn halt(&mut self);

    fn is_halted(&self) -> bool;
}

/// Headless [`PhysicsWorld`] with straight-line motion and contact reporting
#[derive(Debug, Clone)]
pub struct KinematicWorld {
    /// Live bodies (sorted by id for determinism)
    bodies: Vec<Body>,
    next_id: u32,
    next_colliding_group: i32,
    next_non_colliding_group: i32,
    /// Fraction of velocity lost each step
    air_friction: f32,
    /// Pairs touching at the end of the previous step
    touching: BTreeSet<CollisionPair>,
    halted: bool,
}

impl Default for KinematicWorld {
    fn default() -> Self {
        Self::new(AIR_FRICTION)
    }
}

impl KinematicWorld {
    pub fn new(air_friction: f32) -> Self {
        Self {
            bodies: Vec::new(),
            next_id: 1,
            next_colliding_group: 1,
            next_non_colliding_group: -1,
            air_friction,
            touching: BTreeSet::new(),
            halted: false,
        }
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &self.bodies[i])
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &mut self.bodies[i])
    }

    /// Teleport a body (test and host convenience)
    pub fn set_position(&mut self, id: BodyId, pos: Vec2) {
        if let Some(body) = self.body_mut(id) {
            body.pos = pos;
        }
    }

    fn touching_pairs(&self) -> BTreeSet<CollisionPair> {
        let mut pairs = BTreeSet::new();
        for (i, a) in self.bodies.iter().enumerate() {
            for b in &self.bodies[i + 1..] {
                if groups_can_collide(a.group, b.group)
                    && shapes_overlap(a.pos, a.angle, &a.shape, b.pos, b.angle, &b.shape)
                {
                    pairs.insert(CollisionPair::new(a.id, b.id));
                }
            }
        }
        pairs
    }
}

impl PhysicsWorld for KinematicWorld {
    fn next_group(&mut self, non_colliding: bool) -> i32 {
        if non_colliding {
            let group = self.next_non_colliding_group;
            self.next_non_colliding_group -= 1;
            group
        } else {
            let group = self.next_colliding_group;
            self.next_colliding_group += 1;
            group
        }
    }

    fn add_body(&mut self, desc: BodyDesc) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        // Ids are monotonic, so pushing keeps the list sorted
        self.bodies.push(Body::from_desc(id, desc));
        id
    }

    fn remove_body(&mut self, id: BodyId) -> bool {
        match self.bodies.binary_search_by_key(&id, |b| b.id) {
            Ok(index) => {
                self.bodies.remove(index);
                self.touching.retain(|pair| !pair.involves(id));
                true
            }
            Err(_) => false,
        }
    }

    fn contains(&self, id: BodyId) -> bool {
        self.body(id).is_some()
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn position(&self, id: BodyId) -> Option<Vec2> {
        self.body(id).map(|b| b.pos)
    }

    fn velocity(&self, id: BodyId) -> Option<Vec2> {
        self.body(id).map(|b| b.vel)
    }

    fn angle(&self, id: BodyId) -> Option<f32> {
        self.body(id).map(|b| b.angle)
    }

    fn set_velocity(&mut self, id: BodyId, vel: Vec2) {
        if let Some(body) = self.body_mut(id) {
            body.vel = vel;
        }
    }

    fn set_angle(&mut self, id: BodyId, angle: f32) {
        if let Some(body) = self.body_mut(id) {
            body.angle = angle;
        }
    }

    fn narrow_phase_collides(&self, probe: &BodyDesc, other: BodyId) -> bool {
        self.body(other).is_some_and(|b| {
            shapes_overlap(probe.pos, probe.angle, &probe.shape, b.pos, b.angle, &b.shape)
        })
    }

    fn step(&mut self, dt: f32) -> Vec<CollisionPair> {
        if self.halted {
            return Vec::new();
        }

        let damping = 1.0 - self.air_friction;
        for body in &mut self.bodies {
            body.vel *= damping;
            body.pos += body.vel * dt;
            body.wrap();
        }

        let now = self.touching_pairs();
        let started: Vec<CollisionPair> = now.difference(&self.touching).copied().collect();
        self.touching = now;

        if !started.is_empty() {
            log::trace!("{} collision(s) started", started.len());
        }
        started
    }

    fn halt(&mut self) {
        self.halted = true;
    }

    fn is_halted(&self) -> bool {
        self.halted
    }
}
