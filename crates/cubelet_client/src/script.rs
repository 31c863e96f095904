use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::Deserialize;

use crate::input::{FrameButtons, Key};
use crate::session::{GameSession, PointerLock};

const BUILTIN_WALKTHROUGH: &str = include_str!("../../../demos/walkthrough.toml");

#[derive(Debug, Deserialize)]
struct ScriptFile {
    #[serde(default, rename = "step")]
    steps: Vec<StepEntry>,
}

#[derive(Debug, Deserialize)]
struct StepEntry {
    #[serde(default = "default_frames")]
    frames: u32,
    #[serde(default)]
    keys: Vec<String>,
    /// Mouse movement applied on every frame of the step.
    #[serde(default)]
    look: Option<[f32; 2]>,
    #[serde(default)]
    click: Option<ClickButton>,
    #[serde(default)]
    lock: bool,
    #[serde(default)]
    unlock: bool,
    #[serde(default)]
    select: Option<u8>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ClickButton {
    Left,
    Right,
}

fn default_frames() -> u32 {
    1
}

#[derive(Debug)]
pub enum ScriptError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        source: toml::de::Error,
    },
    EmptyStep {
        step: usize,
    },
    UnknownKey {
        step: usize,
        name: String,
    },
    InvalidSelect {
        step: usize,
        slot: u8,
    },
    ConflictingLock {
        step: usize,
    },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read input script {}: {source}", path.display())
            }
            Self::Parse { source } => write!(f, "failed to parse input script: {source}"),
            Self::EmptyStep { step } => write!(f, "step {step} runs for zero frames"),
            Self::UnknownKey { step, name } => write!(f, "step {step} presses unknown key {name:?}"),
            Self::InvalidSelect { step, slot } => {
                write!(f, "step {step} selects hotbar slot {slot}, expected 1-9")
            }
            Self::ConflictingLock { step } => {
                write!(f, "step {step} both locks and unlocks the pointer")
            }
        }
    }
}

impl std::error::Error for ScriptError {}

/// Input for one simulated frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub pointer: Option<PointerLock>,
    pub release: Vec<Key>,
    pub press: Vec<Key>,
    pub look: Vec2,
    pub buttons: FrameButtons,
}

impl FrameInput {
    pub fn apply(&self, session: &mut GameSession) {
        match self.pointer {
            Some(PointerLock::Locked) => session.lock(),
            Some(PointerLock::Unlocked) => session.unlock(),
            None => {}
        }

        let input = session.input_mut();
        for key in &self.release {
            input.release_key(*key);
        }
        for key in &self.press {
            input.press_key(*key);
        }
        input.add_mouse_delta(self.look);
        input.click(self.buttons);
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    frames: u32,
    keys: Vec<Key>,
    look: Vec2,
    buttons: FrameButtons,
    pointer: Option<PointerLock>,
}

/// Scripted input played back one frame at a time. Keys are held for the
/// whole step; clicks, lock changes and slot selection happen on its first
/// frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InputScript {
    steps: Vec<Step>,
}

impl InputScript {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let source = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source)
    }

    pub fn builtin() -> Result<Self, ScriptError> {
        Self::from_toml(BUILTIN_WALKTHROUGH)
    }

    pub fn from_toml(source: &str) -> Result<Self, ScriptError> {
        let file: ScriptFile =
            toml::from_str(source).map_err(|source| ScriptError::Parse { source })?;
        let steps = file
            .steps
            .into_iter()
            .enumerate()
            .map(|(index, entry)| compile_step(index + 1, entry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    pub fn total_frames(&self) -> u64 {
        self.steps.iter().map(|step| u64::from(step.frames)).sum()
    }

    pub fn frames(&self) -> Vec<FrameInput> {
        let mut frames = Vec::new();
        let mut held: Vec<Key> = Vec::new();

        for step in &self.steps {
            for frame in 0..step.frames {
                let mut input = FrameInput {
                    look: step.look,
                    ..FrameInput::default()
                };
                if frame == 0 {
                    input.pointer = step.pointer;
                    input.release = std::mem::take(&mut held);
                    input.press = step.keys.clone();
                    input.buttons = step.buttons;
                    held = step.keys.clone();
                }
                frames.push(input);
            }
        }

        frames
    }
}

fn compile_step(step: usize, entry: StepEntry) -> Result<Step, ScriptError> {
    if entry.frames == 0 {
        return Err(ScriptError::EmptyStep { step });
    }
    if entry.lock && entry.unlock {
        return Err(ScriptError::ConflictingLock { step });
    }

    let mut keys = entry
        .keys
        .iter()
        .map(|name| {
            Key::from_name(name).ok_or_else(|| ScriptError::UnknownKey {
                step,
                name: name.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(slot) = entry.select {
        if !(1..=9).contains(&slot) {
            return Err(ScriptError::InvalidSelect { step, slot });
        }
        keys.push(Key::Digit(slot));
    }

    let buttons = match entry.click {
        Some(ClickButton::Left) => FrameButtons::LEFT_CLICK,
        Some(ClickButton::Right) => FrameButtons::RIGHT_CLICK,
        None => FrameButtons::empty(),
    };

    let pointer = if entry.lock {
        Some(PointerLock::Locked)
    } else if entry.unlock {
        Some(PointerLock::Unlocked)
    } else {
        None
    };

    Ok(Step {
        frames: entry.frames,
        keys,
        look: entry.look.map(Vec2::from_array).unwrap_or(Vec2::ZERO),
        buttons,
        pointer,
    })
}
