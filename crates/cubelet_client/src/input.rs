use std::collections::HashSet;

use bitflags::bitflags;
use cubelet_shared::physics::MoveIntent;
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Escape,
    /// Number row, 1 through 9.
    Digit(u8),
}

impl Key {
    /// Accepts DOM `key`/`code` style names ("w", "KeyW", "ArrowUp", " ",
    /// "Space", "Spacebar", "Digit3", "3", "Escape").
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "w" | "W" | "KeyW" => Self::W,
            "a" | "A" | "KeyA" => Self::A,
            "s" | "S" | "KeyS" => Self::S,
            "d" | "D" | "KeyD" => Self::D,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            " " | "Space" | "Spacebar" => Self::Space,
            "Escape" | "Esc" => Self::Escape,
            other => {
                let digit = other.strip_prefix("Digit").unwrap_or(other);
                match digit.parse::<u8>() {
                    Ok(n @ 1..=9) => Self::Digit(n),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrameButtons: u8 {
        const LEFT_CLICK  = 0b0000_0001;
        const RIGHT_CLICK = 0b0000_0010;
    }
}

impl Default for FrameButtons {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Default)]
pub struct InputState {
    pressed_keys: HashSet<Key>,
    /// Keys that went down this frame.
    just_pressed: HashSet<Key>,
    pub mouse_delta: Vec2,
    buttons: FrameButtons,
}

impl InputState {
    pub fn press_key(&mut self, key: Key) {
        if self.pressed_keys.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn release_key(&mut self, key: Key) {
        self.pressed_keys.remove(&key);
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn was_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    /// First number key pressed this frame.
    pub fn just_pressed_digit(&self) -> Option<u8> {
        (1..=9).find(|n| self.just_pressed.contains(&Key::Digit(*n)))
    }

    pub fn add_mouse_delta(&mut self, delta: Vec2) {
        self.mouse_delta += delta;
    }

    pub fn click(&mut self, buttons: FrameButtons) {
        self.buttons |= buttons;
    }

    pub fn consume_left_click(&mut self) -> bool {
        self.consume(FrameButtons::LEFT_CLICK)
    }

    pub fn consume_right_click(&mut self) -> bool {
        self.consume(FrameButtons::RIGHT_CLICK)
    }

    fn consume(&mut self, button: FrameButtons) -> bool {
        let value = self.buttons.contains(button);
        self.buttons.remove(button);
        value
    }

    pub fn clear_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.buttons = FrameButtons::empty();
        self.just_pressed.clear();
    }

    /// Opposite keys held together cancel out rather than the later one winning.
    pub fn move_intent(&self) -> MoveIntent {
        let axis = |positive: bool, negative: bool| match (positive, negative) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };

        let forward = axis(
            self.is_pressed(Key::W) || self.is_pressed(Key::ArrowUp),
            self.is_pressed(Key::S) || self.is_pressed(Key::ArrowDown),
        );
        let strafe = axis(
            self.is_pressed(Key::D) || self.is_pressed(Key::ArrowRight),
            self.is_pressed(Key::A) || self.is_pressed(Key::ArrowLeft),
        );
        MoveIntent { strafe, forward }
    }

    pub fn jump_requested(&self) -> bool {
        self.is_pressed(Key::Space)
    }
}
