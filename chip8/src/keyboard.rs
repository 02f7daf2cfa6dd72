use sdl2::keyboard::Keycode;

use chip8_core::{KeySource, Keys};

use crate::keymap::keymap;

/// Tracks which keypad keys are held, as reported by SDL key events
#[derive(Debug, Default)]
pub struct Keyboard {
    pressed: Keys,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pressed status of the keypad key bound to `keycode`, if any
    pub fn key_down(&mut self, keycode: Keycode) {
        if let Some(key) = keymap(keycode) {
            self.pressed[key] = true;
        }
    }

    /// Unset the pressed status of the keypad key bound to `keycode`, if any
    pub fn key_up(&mut self, keycode: Keycode) {
        if let Some(key) = keymap(keycode) {
            self.pressed[key] = false;
        }
    }
}

impl KeySource for Keyboard {
    fn keys(&mut self) -> Keys {
        self.pressed
    }
}
