use cubelet_shared::grid::VoxelGrid;
use cubelet_shared::physics::{
    horizontal_move, slide, step_vertical, Body, MoveIntent, PhysicsParams, SlideOutcome,
    VerticalOutcome, AABB,
};
use glam::Vec3;
use tracing::debug;

use crate::camera::Camera;

/// Eye height above the body center, as a fraction of body height.
const EYE_OFFSET_FACTOR: f32 = 0.4;

#[derive(Debug, Clone)]
pub struct Player {
    pub body: Body,
    pub params: PhysicsParams,
}

impl Player {
    pub fn new(eye: Vec3, dims: Vec3, params: PhysicsParams) -> Self {
        let center = eye - Vec3::Y * dims.y * EYE_OFFSET_FACTOR;
        Self {
            body: Body::new(center, dims),
            params,
        }
    }

    pub fn eye_position(&self) -> Vec3 {
        self.body.center + Vec3::Y * self.body.dims.y * EYE_OFFSET_FACTOR
    }

    pub fn aabb(&self) -> AABB {
        self.body.aabb()
    }

    pub fn on_ground(&self) -> bool {
        self.body.on_ground
    }

    pub fn update(
        &mut self,
        dt: f32,
        locked: bool,
        intent: MoveIntent,
        jump: bool,
        camera: &Camera,
        grid: &VoxelGrid,
    ) {
        if !locked {
            self.settle(dt, grid);
            return;
        }

        if jump && self.body.on_ground {
            self.body.velocity.y = self.params.jump_strength;
            self.body.on_ground = false;
        }

        let vertical = step_vertical(
            &mut self.body,
            grid,
            dt,
            self.params.gravity,
            self.params.terminal_velocity,
        );
        if vertical == VerticalOutcome::HitCeiling {
            debug!("Player bumped a ceiling");
        }

        let delta = horizontal_move(
            intent,
            camera.flat_forward(),
            camera.flat_right(),
            self.params.move_speed,
            dt,
        );
        if let SlideOutcome::Blocked = slide(&mut self.body, grid, delta) {
            debug!("Player movement blocked");
        }
    }

    /// Without pointer lock the player only finishes falling, more gently.
    fn settle(&mut self, dt: f32, grid: &VoxelGrid) {
        if self.body.on_ground {
            self.body.velocity.y = 0.0;
            return;
        }
        step_vertical(
            &mut self.body,
            grid,
            dt,
            self.params.gravity * 0.5,
            self.params.jump_strength,
        );
    }
}
