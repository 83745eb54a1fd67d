//! Keyboard snapshot: the scene asks "is this key down right now" and
//! nothing else. No callback registration.

use std::collections::HashSet;

use winit::event::ElementState;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Currently-pressed physical keys, updated from window events.
#[derive(Debug, Default)]
pub struct InputState {
    pressed: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match state {
            ElementState::Pressed => {
                self.pressed.insert(code);
            }
            ElementState::Released => {
                self.pressed.remove(&code);
            }
        }
    }

    #[inline]
    pub fn is_pressed(&self, code: KeyCode) -> bool {
        self.pressed.contains(&code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_press_and_release() {
        let mut input = InputState::new();
        assert!(!input.is_pressed(KeyCode::KeyW));

        input.handle_key(PhysicalKey::Code(KeyCode::KeyW), ElementState::Pressed);
        assert!(input.is_pressed(KeyCode::KeyW));
        // Repeat presses are idempotent.
        input.handle_key(PhysicalKey::Code(KeyCode::KeyW), ElementState::Pressed);
        assert!(input.is_pressed(KeyCode::KeyW));

        input.handle_key(PhysicalKey::Code(KeyCode::KeyW), ElementState::Released);
        assert!(!input.is_pressed(KeyCode::KeyW));
    }

    #[test]
    fn unidentified_keys_are_ignored() {
        let mut input = InputState::new();
        input.handle_key(
            PhysicalKey::Unidentified(winit::keyboard::NativeKeyCode::Unidentified),
            ElementState::Pressed,
        );
        assert!(!input.is_pressed(KeyCode::KeyW));
    }
}
