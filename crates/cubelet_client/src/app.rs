use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use cubelet_core::clock::FrameClock;
use cubelet_core::events;
use cubelet_shared::block::BlockId;
use cubelet_shared::inventory::HotbarSlotView;
use glam::{IVec3, Vec3};
use tracing::{debug, info, warn};

use crate::materials::AtlasStatus;
use crate::script::{InputScript, ScriptError};
use crate::session::{GameEvent, GameSession, PointerLock};
use crate::settings::{GameSettings, DEFAULT_SETTINGS_FILE};

pub const FIXED_DT: f32 = 1.0 / 60.0;
const FPS_LOG_INTERVAL: u64 = 60;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub settings_path: PathBuf,
    pub script_path: Option<PathBuf>,
    /// Defaults to the length of the script.
    pub frame_limit: Option<u64>,
    /// Pace frames to wall-clock time and step by the measured delta.
    pub realtime: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(DEFAULT_SETTINGS_FILE),
            script_path: None,
            frame_limit: None,
            realtime: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames: u64,
    pub eye: Vec3,
    pub on_ground: bool,
    pub pointer: PointerLock,
    pub target: Option<(IVec3, BlockId)>,
    pub world_blocks: usize,
    pub blocks_broken: u32,
    pub blocks_placed: u32,
    pub scene_instances: usize,
    pub materials: usize,
    pub atlas: AtlasStatus,
    pub hotbar: Vec<HotbarSlotView>,
    pub fps: Option<f32>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames:    {}", self.frames)?;
        writeln!(
            f,
            "eye:       ({:.2}, {:.2}, {:.2})",
            self.eye.x, self.eye.y, self.eye.z
        )?;
        writeln!(f, "on ground: {}", self.on_ground)?;
        writeln!(f, "pointer:   {:?}", self.pointer)?;
        match self.target {
            Some((cell, block)) => writeln!(f, "target:    {cell} ({block:?})")?,
            None => writeln!(f, "target:    none")?,
        }
        writeln!(
            f,
            "edits:     {} broken, {} placed, {} blocks in world",
            self.blocks_broken, self.blocks_placed, self.world_blocks
        )?;
        writeln!(
            f,
            "scene:     {} instances, {} materials ({:?} atlas)",
            self.scene_instances, self.materials, self.atlas
        )?;
        let slots: Vec<String> = self
            .hotbar
            .iter()
            .map(|slot| {
                let marker = if slot.selected { "*" } else { " " };
                format!("{marker}{} x{}", slot.label, slot.quantity)
            })
            .collect();
        writeln!(f, "hotbar:    [{}]", slots.join(" |"))?;
        match self.fps {
            Some(fps) => write!(f, "fps:       {fps:.1}"),
            None => write!(f, "fps:       n/a"),
        }
    }
}

pub fn run(config: &RunConfig) -> Result<RunSummary, ScriptError> {
    let settings = GameSettings::load_or_create(&config.settings_path);
    let script = match &config.script_path {
        Some(path) => InputScript::load(path)?,
        None => InputScript::builtin()?,
    };

    let atlas = probe_atlas(Path::new(&settings.atlas_path));
    let (event_tx, event_rx) = events::channel();
    let mut session = GameSession::new(&settings, atlas, event_tx);

    let inputs = script.frames();
    let frame_limit = config.frame_limit.unwrap_or(script.total_frames());
    info!(frames = frame_limit, realtime = config.realtime, "Simulation starting");

    let mut clock = FrameClock::new(Instant::now());
    let mut blocks_broken = 0;
    let mut blocks_placed = 0;

    for frame in 0..frame_limit {
        if let Some(input) = usize::try_from(frame).ok().and_then(|i| inputs.get(i)) {
            input.apply(&mut session);
        }

        let measured = clock.tick(Instant::now());
        let dt = if config.realtime { measured } else { FIXED_DT };
        session.frame(dt);

        for event in event_rx.drain() {
            match event {
                GameEvent::BlockBroken { .. } => blocks_broken += 1,
                GameEvent::BlockPlaced { .. } => blocks_placed += 1,
                GameEvent::TargetChanged { target } => debug!(?target, "Target changed"),
                GameEvent::HotbarSelected { index, block } => {
                    info!(index, ?block, "Hotbar selection changed");
                }
                GameEvent::PointerLockChanged { .. } => {}
            }
        }

        if (frame + 1) % FPS_LOG_INTERVAL == 0 {
            if let Some(fps) = clock.fps() {
                debug!(fps, "Frame rate");
            }
        }

        if config.realtime {
            thread::sleep(Duration::from_secs_f32(FIXED_DT));
        }
    }

    Ok(RunSummary {
        frames: frame_limit,
        eye: session.camera().position,
        on_ground: session.player().on_ground(),
        pointer: session.pointer_lock(),
        target: session.target().and_then(|hit| {
            session
                .scene()
                .get(hit.cell)
                .map(|instance| (hit.cell, instance.block))
        }),
        world_blocks: session.grid().count_non_air(),
        blocks_broken,
        blocks_placed,
        scene_instances: session.scene().len(),
        materials: session.materials().len(),
        atlas: session.materials().atlas_status(),
        hotbar: session.hotbar_view(),
        fps: clock.fps(),
    })
}

fn probe_atlas(path: &Path) -> AtlasStatus {
    if path.is_file() {
        info!("Using block atlas {}", path.display());
        AtlasStatus::Loaded
    } else {
        warn!("Block atlas {} not found", path.display());
        AtlasStatus::Missing
    }
}
