use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::grid::VoxelGrid;

/// Shrinks the cell range so a face lying exactly on a grid line does not
/// pull in the neighbouring cell.
pub const CELL_EPSILON: f32 = 1e-5;
const SNAP_EPSILON: f32 = 1e-4;
const MIN_AXIS_MOVE_SQ: f32 = 1e-6;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    pub fn from_center(center: Vec3, dims: Vec3) -> Self {
        let half = dims * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn from_cell(cell: IVec3) -> Self {
        let min = cell.as_vec3();
        Self {
            min,
            max: min + Vec3::ONE,
        }
    }

    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Inclusive range of grid cells the box overlaps.
    pub fn cell_range(&self) -> (IVec3, IVec3) {
        let lo = (self.min + Vec3::splat(CELL_EPSILON)).floor().as_ivec3();
        let hi = (self.max - Vec3::splat(CELL_EPSILON)).floor().as_ivec3();
        (lo, hi)
    }
}

pub fn collides(grid: &VoxelGrid, aabb: &AABB) -> bool {
    let (lo, hi) = aabb.cell_range();
    for y in lo.y..=hi.y {
        for z in lo.z..=hi.z {
            for x in lo.x..=hi.x {
                if grid.is_solid(IVec3::new(x, y, z)) {
                    return true;
                }
            }
        }
    }
    false
}

/// Top face of the highest solid cell the box overlaps. Layers above the
/// world ceiling are never ground.
pub fn highest_solid_top(grid: &VoxelGrid, aabb: &AABB) -> Option<f32> {
    let (lo, hi) = aabb.cell_range();
    let top_layer = hi.y.min(grid.dims().height - 1);
    (lo.y..=top_layer).rev().find_map(|y| {
        let layer_solid = (lo.z..=hi.z)
            .any(|z| (lo.x..=hi.x).any(|x| grid.is_solid(IVec3::new(x, y, z))));
        layer_solid.then_some((y + 1) as f32)
    })
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_jump_strength")]
    pub jump_strength: f32,
    #[serde(default = "default_terminal_velocity")]
    pub terminal_velocity: f32,
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            jump_strength: default_jump_strength(),
            terminal_velocity: default_terminal_velocity(),
            move_speed: default_move_speed(),
        }
    }
}

fn default_gravity() -> f32 {
    25.0
}

fn default_jump_strength() -> f32 {
    9.0
}

fn default_terminal_velocity() -> f32 {
    50.0
}

fn default_move_speed() -> f32 {
    5.0
}

/// An axis-aligned box positioned by its center.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Body {
    pub center: Vec3,
    pub velocity: Vec3,
    pub dims: Vec3,
    pub on_ground: bool,
}

impl Body {
    pub fn new(center: Vec3, dims: Vec3) -> Self {
        Self {
            center,
            velocity: Vec3::ZERO,
            dims,
            on_ground: false,
        }
    }

    pub fn aabb(&self) -> AABB {
        AABB::from_center(self.center, self.dims)
    }

    pub fn feet(&self) -> f32 {
        self.center.y - self.dims.y * 0.5
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VerticalOutcome {
    Airborne,
    Landed,
    HitCeiling,
}

pub fn step_vertical(
    body: &mut Body,
    grid: &VoxelGrid,
    dt: f32,
    gravity: f32,
    terminal_velocity: f32,
) -> VerticalOutcome {
    body.velocity.y -= gravity * dt;
    body.velocity.y = body.velocity.y.max(-terminal_velocity);

    let mut next = body.center;
    next.y += body.velocity.y * dt;
    let next_box = AABB::from_center(next, body.dims);

    if !collides(grid, &next_box) {
        body.center = next;
        body.on_ground = false;
        return VerticalOutcome::Airborne;
    }

    if body.velocity.y <= 0.0 {
        let feet = highest_solid_top(grid, &next_box)
            .unwrap_or_else(|| (next_box.min.y + SNAP_EPSILON).floor() + 1.0);
        let mut snapped = body.center;
        snapped.y = feet + body.dims.y * 0.5;
        // A snap that would still overlap terrain leaves the body in place.
        if !collides(grid, &AABB::from_center(snapped, body.dims)) {
            body.center = snapped;
        }
        body.velocity.y = 0.0;
        body.on_ground = true;
        VerticalOutcome::Landed
    } else {
        body.velocity.y = 0.0;
        VerticalOutcome::HitCeiling
    }
}

/// Normalized movement request; `forward` is positive away from the viewer
/// and `strafe` is positive to the right.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct MoveIntent {
    pub strafe: f32,
    pub forward: f32,
}

impl MoveIntent {
    pub fn is_idle(&self) -> bool {
        self.strafe == 0.0 && self.forward == 0.0
    }
}

pub fn horizontal_move(
    intent: MoveIntent,
    forward: Vec3,
    right: Vec3,
    speed: f32,
    dt: f32,
) -> Vec3 {
    if intent.is_idle() {
        return Vec3::ZERO;
    }

    let flat_forward = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
    let flat_right = Vec3::new(right.x, 0.0, right.z).normalize_or_zero();
    let dir = flat_forward * intent.forward + flat_right * intent.strafe;
    dir.normalize_or_zero() * speed * dt
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SlideOutcome {
    Idle,
    Moved,
    Slid { x: bool, z: bool },
    Blocked,
}

/// Applies a horizontal displacement. A blocked move falls back to its X and
/// Z components, in that order.
pub fn slide(body: &mut Body, grid: &VoxelGrid, delta: Vec3) -> SlideOutcome {
    let delta = Vec3::new(delta.x, 0.0, delta.z);
    if delta == Vec3::ZERO {
        return SlideOutcome::Idle;
    }

    let full = body.center + delta;
    if !collides(grid, &AABB::from_center(full, body.dims)) {
        body.center = full;
        return SlideOutcome::Moved;
    }

    let mut try_axis = |step: Vec3| {
        if step.length_squared() <= MIN_AXIS_MOVE_SQ {
            return false;
        }
        let candidate = body.center + step;
        if collides(grid, &AABB::from_center(candidate, body.dims)) {
            return false;
        }
        body.center = candidate;
        true
    };

    let x = try_axis(Vec3::new(delta.x, 0.0, 0.0));
    let z = try_axis(Vec3::new(0.0, 0.0, delta.z));
    if x || z {
        SlideOutcome::Slid { x, z }
    } else {
        SlideOutcome::Blocked
    }
}

#[derive(Debug, Copy, Clone)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Face {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Face {
    pub fn normal_ivec3(&self) -> IVec3 {
        match self {
            Face::PosX => IVec3::X,
            Face::NegX => IVec3::NEG_X,
            Face::PosY => IVec3::Y,
            Face::NegY => IVec3::NEG_Y,
            Face::PosZ => IVec3::Z,
            Face::NegZ => IVec3::NEG_Z,
        }
    }

    /// Face crossed when stepping along `axis` in direction `step`.
    fn entered(axis: usize, step: i32) -> Self {
        match (axis, step > 0) {
            (0, true) => Face::NegX,
            (0, false) => Face::PosX,
            (1, true) => Face::NegY,
            (1, false) => Face::PosY,
            (_, true) => Face::NegZ,
            (_, false) => Face::PosZ,
        }
    }
}

/// Grid traversal in the order a ray crosses the cells. The first item is
/// the origin cell, which has no entry face.
#[derive(Debug, Copy, Clone)]
pub struct RaycastIter {
    cell: IVec3,
    step: IVec3,
    t_max: Vec3,
    t_delta: Vec3,
    max_distance: f32,
    started: bool,
    finished: bool,
}

impl RaycastIter {
    fn new(ray: &Ray, max_distance: f32) -> Self {
        let cell = ray.origin.floor().as_ivec3();
        let mut step = IVec3::ZERO;
        let mut t_max = Vec3::splat(f32::INFINITY);
        let mut t_delta = Vec3::splat(f32::INFINITY);

        for axis in 0..3 {
            let d = ray.direction[axis];
            if d == 0.0 {
                continue;
            }
            step[axis] = if d > 0.0 { 1 } else { -1 };
            let boundary = if d > 0.0 {
                cell[axis] as f32 + 1.0
            } else {
                cell[axis] as f32
            };
            t_max[axis] = (boundary - ray.origin[axis]) / d;
            t_delta[axis] = 1.0 / d.abs();
        }

        Self {
            cell,
            step,
            t_max,
            t_delta,
            max_distance: max_distance.max(0.0),
            started: false,
            finished: false,
        }
    }
}

impl Iterator for RaycastIter {
    type Item = (IVec3, Option<Face>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if !self.started {
            self.started = true;
            return Some((self.cell, None));
        }

        let axis = if self.t_max.x <= self.t_max.y && self.t_max.x <= self.t_max.z {
            0
        } else if self.t_max.y <= self.t_max.z {
            1
        } else {
            2
        };

        let distance = self.t_max[axis];
        if !distance.is_finite() || distance > self.max_distance {
            self.finished = true;
            return None;
        }

        self.cell[axis] += self.step[axis];
        self.t_max[axis] += self.t_delta[axis];
        Some((self.cell, Some(Face::entered(axis, self.step[axis]))))
    }
}

pub fn raycast_blocks(
    ray: &Ray,
    max_distance: f32,
) -> impl Iterator<Item = (IVec3, Option<Face>)> {
    RaycastIter::new(ray, max_distance)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockHit {
    pub cell: IVec3,
    pub face: Face,
}

impl BlockHit {
    pub fn normal(&self) -> IVec3 {
        self.face.normal_ivec3()
    }

    /// The empty cell in front of the hit face.
    pub fn adjacent(&self) -> IVec3 {
        self.cell + self.normal()
    }
}

/// First non-air block in the world along the ray. The origin cell and
/// out-of-bounds cells are never targeted.
pub fn target_block(
    grid: &VoxelGrid,
    origin: Vec3,
    direction: Vec3,
    reach: f32,
) -> Option<BlockHit> {
    let direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO {
        return None;
    }

    raycast_blocks(&Ray { origin, direction }, reach).find_map(|(cell, face)| {
        let face = face?;
        grid.get(cell)
            .is_some_and(|block| !block.is_air())
            .then_some(BlockHit { cell, face })
    })
}
