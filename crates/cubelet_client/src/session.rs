use std::fmt;

use cubelet_core::events::EventSender;
use cubelet_shared::block::{register_default_blocks, BlockId, BlockRegistry};
use cubelet_shared::grid::VoxelGrid;
use cubelet_shared::inventory::{Hotbar, HotbarSlotView, Inventory};
use cubelet_shared::physics::{target_block, BlockHit, AABB};
use cubelet_shared::worldgen::{generate_flat, WorldGenOptions};
use glam::{IVec3, Vec3};
use tracing::{debug, info, warn};

use crate::camera::Camera;
use crate::input::{InputState, Key};
use crate::materials::{AtlasStatus, MaterialCache};
use crate::player::Player;
use crate::scene::BlockScene;
use crate::settings::GameSettings;

/// Keeps the spawned head below the world ceiling.
const SPAWN_HEADROOM: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerLock {
    Locked,
    Unlocked,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PointerLockChanged { locked: bool },
    TargetChanged { target: Option<IVec3> },
    HotbarSelected { index: usize, block: Option<BlockId> },
    BlockBroken { pos: IVec3, block: BlockId },
    BlockPlaced { pos: IVec3, block: BlockId, remaining: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    NotLocked,
    NoTarget,
    EmptySlot,
    OutOfBlocks(BlockId),
    OutOfBounds(IVec3),
    Occupied(IVec3),
    IntersectsPlayer(IVec3),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLocked => write!(f, "pointer is not locked"),
            Self::NoTarget => write!(f, "no block targeted"),
            Self::EmptySlot => write!(f, "selected hotbar slot is empty"),
            Self::OutOfBlocks(block) => write!(f, "no {block:?} left in the inventory"),
            Self::OutOfBounds(pos) => write!(f, "cell {pos} is outside the world"),
            Self::Occupied(pos) => write!(f, "cell {pos} is already occupied"),
            Self::IntersectsPlayer(pos) => write!(f, "cell {pos} overlaps the player"),
        }
    }
}

impl std::error::Error for EditError {}

pub struct GameSession {
    registry: BlockRegistry,
    grid: VoxelGrid,
    player: Player,
    camera: Camera,
    input: InputState,
    inventory: Inventory,
    hotbar: Hotbar,
    materials: MaterialCache,
    scene: BlockScene,
    target: Option<BlockHit>,
    pointer: PointerLock,
    reach: f32,
    mouse_sensitivity: f32,
    events: EventSender<GameEvent>,
}

impl GameSession {
    pub fn new(settings: &GameSettings, atlas: AtlasStatus, events: EventSender<GameEvent>) -> Self {
        let registry = register_default_blocks();
        let mut grid = VoxelGrid::new(settings.world);
        generate_flat(
            &mut grid,
            WorldGenOptions {
                sample_tree: settings.sample_tree,
            },
        );

        let mut materials = MaterialCache::new(atlas);
        let mut scene = BlockScene::new();
        scene.rebuild(&grid, &registry, &mut materials);
        if scene.is_empty() {
            warn!("Generated world has no visible blocks");
        }

        let dims = settings.player_dims();
        let eye = spawn_eye(&grid, dims);
        let player = Player::new(eye, dims, settings.physics);
        info!(x = eye.x, y = eye.y, z = eye.z, "Player spawned");

        Self {
            registry,
            grid,
            player,
            camera: Camera::new(eye),
            input: InputState::default(),
            inventory: Inventory::default_starting(),
            hotbar: Hotbar::default(),
            materials,
            scene,
            target: None,
            pointer: PointerLock::Unlocked,
            reach: settings.reach,
            mouse_sensitivity: settings.mouse_sensitivity,
            events,
        }
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn materials(&self) -> &MaterialCache {
        &self.materials
    }

    pub fn scene(&self) -> &BlockScene {
        &self.scene
    }

    pub fn target(&self) -> Option<BlockHit> {
        self.target
    }

    pub fn pointer_lock(&self) -> PointerLock {
        self.pointer
    }

    pub fn is_locked(&self) -> bool {
        self.pointer == PointerLock::Locked
    }

    pub fn hotbar_view(&self) -> Vec<HotbarSlotView> {
        self.hotbar.view(&self.inventory, &self.registry)
    }

    pub fn lock(&mut self) {
        self.set_pointer(PointerLock::Locked);
    }

    pub fn unlock(&mut self) {
        self.set_pointer(PointerLock::Unlocked);
    }

    fn set_pointer(&mut self, pointer: PointerLock) {
        if self.pointer == pointer {
            return;
        }
        self.pointer = pointer;
        let locked = pointer == PointerLock::Locked;
        info!(locked, "Pointer lock changed");
        self.publish(GameEvent::PointerLockChanged { locked });
    }

    pub fn frame(&mut self, dt: f32) {
        if self.input.was_just_pressed(Key::Escape) {
            self.unlock();
        }
        let locked = self.is_locked();

        if locked {
            self.camera
                .update_look(self.input.mouse_delta, self.mouse_sensitivity);
            if let Some(digit) = self.input.just_pressed_digit() {
                self.select_hotbar_key(digit);
            }
        }

        self.camera.position = self.player.eye_position();
        self.retarget();

        if self.input.consume_left_click() {
            if let Err(err) = self.break_target() {
                debug!("Break ignored: {err}");
            }
        }
        if self.input.consume_right_click() {
            if let Err(err) = self.place_at_target() {
                debug!("Placement rejected: {err}");
            }
        }

        let intent = self.input.move_intent();
        let jump = self.input.jump_requested();
        self.player
            .update(dt, locked, intent, jump, &self.camera, &self.grid);
        self.camera.position = self.player.eye_position();

        self.input.clear_frame();
    }

    fn select_hotbar_key(&mut self, digit: u8) {
        if !self.hotbar.select_key(digit) {
            return;
        }
        let index = self.hotbar.selected_index();
        let block = self.hotbar.selected_block();
        debug!(index, "Hotbar slot selected");
        self.publish(GameEvent::HotbarSelected { index, block });
    }

    fn retarget(&mut self) {
        let next = if self.is_locked() {
            target_block(
                &self.grid,
                self.camera.position,
                self.camera.forward(),
                self.reach,
            )
        } else {
            None
        };
        self.set_target(next);
    }

    fn set_target(&mut self, next: Option<BlockHit>) {
        let changed = self.target.map(|hit| hit.cell) != next.map(|hit| hit.cell);
        self.target = next;
        if changed {
            self.publish(GameEvent::TargetChanged {
                target: next.map(|hit| hit.cell),
            });
        }
    }

    pub fn break_target(&mut self) -> Result<(IVec3, BlockId), EditError> {
        if !self.is_locked() {
            return Err(EditError::NotLocked);
        }
        let hit = self.target.ok_or(EditError::NoTarget)?;
        let block = self
            .grid
            .set(hit.cell, BlockId::AIR)
            .ok_or(EditError::OutOfBounds(hit.cell))?;
        self.scene.remove(hit.cell);

        let overflow = self.inventory.add(block, 1);
        if overflow > 0 {
            debug!("Stack of {} is full", self.registry.name(block));
        }
        self.set_target(None);

        info!(
            "Broke {} at {}",
            self.registry.name(block),
            hit.cell
        );
        self.publish(GameEvent::BlockBroken {
            pos: hit.cell,
            block,
        });
        Ok((hit.cell, block))
    }

    pub fn place_at_target(&mut self) -> Result<IVec3, EditError> {
        if !self.is_locked() {
            return Err(EditError::NotLocked);
        }
        let hit = self.target.ok_or(EditError::NoTarget)?;
        let block = self.hotbar.selected_block().ok_or(EditError::EmptySlot)?;
        if self.inventory.count(block) == 0 {
            return Err(EditError::OutOfBlocks(block));
        }

        let pos = hit.adjacent();
        match self.grid.get(pos) {
            None => return Err(EditError::OutOfBounds(pos)),
            Some(existing) if !existing.is_air() => return Err(EditError::Occupied(pos)),
            Some(_) => {}
        }
        if AABB::from_cell(pos).intersects(&self.player.aabb()) {
            return Err(EditError::IntersectsPlayer(pos));
        }

        self.grid.set(pos, block);
        self.scene
            .insert(pos, block, &self.registry, &mut self.materials);
        self.inventory.take_one(block);
        let remaining = self.inventory.count(block);

        info!("Placed {} at {pos}, {remaining} left", self.registry.name(block));
        self.publish(GameEvent::BlockPlaced {
            pos,
            block,
            remaining,
        });
        Ok(pos)
    }

    fn publish(&self, event: GameEvent) {
        if self.events.send(event).is_err() {
            debug!("Game event dropped, no listener");
        }
    }
}

/// Above the middle of the world, with the head kept inside it.
fn spawn_eye(grid: &VoxelGrid, player_dims: Vec3) -> Vec3 {
    let dims = grid.dims();
    let eye_offset = player_dims.y * 0.4;
    let highest_eye = dims.height as f32 - player_dims.y * 0.5 + eye_offset - SPAWN_HEADROOM;
    Vec3::new(
        dims.width as f32 / 2.0,
        (dims.height as f32 / 2.0 + 3.0).min(highest_eye),
        dims.depth as f32 / 2.0,
    )
}

#[cfg(test)]
mod tests {
    use cubelet_core::events::{channel, EventReceiver};
    use cubelet_shared::block::BlockId;
    use cubelet_shared::grid::WorldDims;
    use cubelet_shared::physics::Face;
    use glam::{IVec3, Vec2, Vec3};

    use super::{EditError, GameEvent, GameSession, PointerLock};
    use crate::input::{FrameButtons, Key};
    use crate::materials::AtlasStatus;
    use crate::settings::GameSettings;

    const DT: f32 = 1.0 / 60.0;

    /// Odd sizes put the spawn column in the middle of a cell.
    fn settled_session() -> (GameSession, EventReceiver<GameEvent>) {
        let settings = GameSettings {
            world: WorldDims::new(17, 8, 17),
            ..GameSettings::default()
        };
        let (tx, rx) = channel();
        let mut session = GameSession::new(&settings, AtlasStatus::Loaded, tx);
        for _ in 0..120 {
            session.frame(DT);
        }
        (session, rx)
    }

    fn look_down(session: &mut GameSession) {
        session.input_mut().add_mouse_delta(Vec2::new(0.0, 10_000.0));
        session.frame(DT);
    }

    #[test]
    fn spawns_above_the_center_and_settles_on_the_grass() {
        let settings = GameSettings::default();
        let (tx, _rx) = channel();
        let session = GameSession::new(&settings, AtlasStatus::Loaded, tx);
        assert!((session.camera().position - Vec3::new(8.0, 7.0, 8.0)).length() < 1e-5);
        assert_eq!(session.pointer_lock(), PointerLock::Unlocked);
        assert_eq!(session.scene().len(), session.grid().count_non_air());

        let (session, _rx) = settled_session();
        assert!(session.player().on_ground());
        assert!((session.player().body.feet() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn spawn_is_lowered_to_keep_the_head_inside_a_short_world() {
        let settings = GameSettings {
            world: WorldDims::new(17, 6, 17),
            ..GameSettings::default()
        };
        let (tx, _rx) = channel();
        let mut session = GameSession::new(&settings, AtlasStatus::Loaded, tx);

        // Centered spawn would be y = 6; the head caps it at 5.81.
        assert!((session.camera().position.y - 5.81).abs() < 1e-4);
        assert!(session.player().aabb().max.y < 6.0);

        for _ in 0..120 {
            session.frame(DT);
        }
        assert!(session.player().on_ground());
        assert!((session.player().body.feet() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn tall_player_in_a_low_world_stays_inside_it() {
        let settings = GameSettings {
            world: WorldDims::new(16, 4, 16),
            player_size: [0.6, 2.5, 0.6],
            ..GameSettings::default()
        }
        .sanitize();
        let (tx, _rx) = channel();
        let mut session = GameSession::new(&settings, AtlasStatus::Loaded, tx);
        session.lock();

        for _ in 0..120 {
            session.frame(DT);
            assert!(session.player().aabb().max.y <= 4.0 + 1e-4);
        }
        assert!(session.player().on_ground());
        assert!((session.player().body.feet() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn lock_changes_are_published_once() {
        let (mut session, rx) = settled_session();
        rx.drain();

        session.lock();
        session.lock();
        session.input_mut().press_key(Key::Escape);
        session.frame(DT);

        assert_eq!(session.pointer_lock(), PointerLock::Unlocked);
        let lock_events: Vec<GameEvent> = rx
            .drain()
            .into_iter()
            .filter(|event| matches!(event, GameEvent::PointerLockChanged { .. }))
            .collect();
        assert_eq!(
            lock_events,
            vec![
                GameEvent::PointerLockChanged { locked: true },
                GameEvent::PointerLockChanged { locked: false },
            ]
        );
    }

    #[test]
    fn looking_down_targets_the_block_underfoot() {
        let (mut session, _rx) = settled_session();
        session.lock();
        look_down(&mut session);

        let hit = session.target().expect("ground in reach");
        assert_eq!(hit.cell, IVec3::new(8, 2, 8));
        assert_eq!(hit.face, Face::PosY);

        session.unlock();
        session.frame(DT);
        assert!(session.target().is_none());
    }

    #[test]
    fn breaking_moves_the_block_into_the_inventory() {
        let (mut session, rx) = settled_session();
        session.lock();
        look_down(&mut session);
        rx.drain();

        session.input_mut().click(FrameButtons::LEFT_CLICK);
        session.frame(DT);

        let cell = IVec3::new(8, 2, 8);
        assert_eq!(session.grid().get(cell), Some(BlockId::AIR));
        assert!(session.scene().get(cell).is_none());
        assert_eq!(session.inventory.count(BlockId::GRASS), 21);
        assert!(rx.drain().contains(&GameEvent::BlockBroken {
            pos: cell,
            block: BlockId::GRASS,
        }));
    }

    #[test]
    fn placing_inside_the_player_is_rejected() {
        let (mut session, _rx) = settled_session();
        session.lock();
        look_down(&mut session);

        assert_eq!(
            session.place_at_target(),
            Err(EditError::IntersectsPlayer(IVec3::new(8, 3, 8)))
        );
        assert_eq!(session.inventory.count(BlockId::GRASS), 20);
    }

    #[test]
    fn placing_against_a_wall_uses_the_selected_block() {
        let (mut session, rx) = settled_session();
        session.grid.set(IVec3::new(8, 4, 5), BlockId::STONE);
        session.lock();
        session.input_mut().press_key(Key::Digit(4));
        session.frame(DT);
        rx.drain();

        session.input_mut().click(FrameButtons::RIGHT_CLICK);
        session.frame(DT);

        let placed = IVec3::new(8, 4, 6);
        assert_eq!(session.grid().get(placed), Some(BlockId::WOOD));
        assert_eq!(
            session.scene().get(placed).map(|instance| instance.block),
            Some(BlockId::WOOD)
        );
        assert_eq!(session.inventory.count(BlockId::WOOD), 9);
        assert!(rx.drain().contains(&GameEvent::BlockPlaced {
            pos: placed,
            block: BlockId::WOOD,
            remaining: 9,
        }));
        assert_eq!(session.hotbar_view()[3].quantity, 9);
        assert!(session.hotbar_view()[3].selected);
    }

    #[test]
    fn edits_need_lock_target_and_stock() {
        let (mut session, _rx) = settled_session();
        assert_eq!(session.break_target(), Err(EditError::NotLocked));

        session.lock();
        session.frame(DT);
        assert_eq!(session.target(), None);
        assert_eq!(session.place_at_target(), Err(EditError::NoTarget));

        look_down(&mut session);
        while session.inventory.take_one(BlockId::GRASS) {}
        assert_eq!(
            session.place_at_target(),
            Err(EditError::OutOfBlocks(BlockId::GRASS))
        );
    }

    #[test]
    fn unlocked_clicks_do_nothing() {
        let (mut session, _rx) = settled_session();
        let blocks = session.grid().count_non_air();

        session.input_mut().click(FrameButtons::LEFT_CLICK | FrameButtons::RIGHT_CLICK);
        session.frame(DT);

        assert_eq!(session.grid().count_non_air(), blocks);
        assert_eq!(session.inventory.count(BlockId::GRASS), 20);
    }

    #[test]
    fn walking_into_the_stone_steps_slides_past() {
        let (mut session, _rx) = settled_session();
        session.lock();
        // Face -X, then walk toward the low corner where the steps are.
        session.camera.yaw = std::f32::consts::FRAC_PI_2;
        session.input_mut().press_key(Key::W);
        session.input_mut().press_key(Key::D);
        for _ in 0..240 {
            session.frame(DT);
        }

        let body = session.player().body;
        assert!(session.player().on_ground());
        assert!(body.aabb().min.x > -1e-4 && body.aabb().min.z > -1e-4);
        assert!(body.feet() >= 3.0 - 1e-4);
    }
}
