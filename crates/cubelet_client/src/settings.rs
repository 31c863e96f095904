use std::fs;
use std::io;
use std::path::Path;

use cubelet_shared::grid::WorldDims;
use cubelet_shared::physics::PhysicsParams;
use cubelet_shared::worldgen::ground_level;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";

const MIN_WORLD_SIZE: i32 = 4;
const MAX_WORLD_SIZE: i32 = 256;
const MIN_MOUSE_SENSITIVITY: f32 = 0.0001;
const MAX_MOUSE_SENSITIVITY: f32 = 0.05;
const MIN_REACH: f32 = 1.0;
const MAX_REACH: f32 = 32.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    #[serde(default = "default_player_size")]
    pub player_size: [f32; 3],
    #[serde(default = "default_reach")]
    pub reach: f32,
    #[serde(default = "default_mouse_sensitivity")]
    pub mouse_sensitivity: f32,
    #[serde(default)]
    pub sample_tree: bool,
    #[serde(default = "default_atlas_path")]
    pub atlas_path: String,
    // TOML tables must follow plain values.
    #[serde(default)]
    pub world: WorldDims,
    #[serde(default)]
    pub physics: PhysicsParams,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            world: WorldDims::default(),
            physics: PhysicsParams::default(),
            player_size: default_player_size(),
            reach: default_reach(),
            mouse_sensitivity: default_mouse_sensitivity(),
            sample_tree: false,
            atlas_path: default_atlas_path(),
        }
    }
}

impl GameSettings {
    pub fn sanitize(mut self) -> Self {
        self.world.width = self.world.width.clamp(MIN_WORLD_SIZE, MAX_WORLD_SIZE);
        self.world.height = self.world.height.clamp(MIN_WORLD_SIZE, MAX_WORLD_SIZE);
        self.world.depth = self.world.depth.clamp(MIN_WORLD_SIZE, MAX_WORLD_SIZE);

        let physics = &mut self.physics;
        physics.gravity = physics.gravity.clamp(0.0, 200.0);
        physics.jump_strength = physics.jump_strength.clamp(0.0, 50.0);
        physics.terminal_velocity = physics.terminal_velocity.clamp(1.0, 500.0);
        physics.move_speed = physics.move_speed.clamp(0.0, 50.0);

        // The body has to fit through a one-block gap sideways.
        self.player_size[0] = self.player_size[0].clamp(0.1, 0.98);
        // Standing on the grass, the head must stay below the world ceiling.
        let headroom = (self.world.height - ground_level(self.world) - 1) as f32;
        self.player_size[1] = self.player_size[1].clamp(0.1, 3.0).min(headroom);
        self.player_size[2] = self.player_size[2].clamp(0.1, 0.98);

        self.reach = self.reach.clamp(MIN_REACH, MAX_REACH);
        self.mouse_sensitivity = self
            .mouse_sensitivity
            .clamp(MIN_MOUSE_SENSITIVITY, MAX_MOUSE_SENSITIVITY);
        self
    }

    pub fn player_dims(&self) -> Vec3 {
        Vec3::from_array(self.player_size)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let parsed = toml::from_str::<Self>(&contents).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to deserialize settings: {e}"),
            )
        })?;
        Ok(parsed.sanitize())
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let settings = self.clone().sanitize();
        let serialized = toml::to_string_pretty(&settings).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to serialize settings: {e}"),
            )
        })?;
        fs::write(path, serialized)
    }

    /// Missing or unreadable files are replaced with the defaults.
    pub fn load_or_create(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to load settings from {}: {err}", path.display());
                }
                let settings = Self::default();
                if let Err(save_err) = settings.save(path) {
                    warn!(
                        "Failed to write default settings to {}: {save_err}",
                        path.display()
                    );
                }
                settings
            }
        }
    }
}

fn default_player_size() -> [f32; 3] {
    [0.6, 1.8, 0.6]
}

fn default_reach() -> f32 {
    7.0
}

fn default_mouse_sensitivity() -> f32 {
    0.002
}

fn default_atlas_path() -> String {
    "atlas.png".to_string()
}
