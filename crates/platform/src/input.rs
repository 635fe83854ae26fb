//! Keyboard state tracking.

use std::collections::HashSet;

use winit::event::ElementState;
use winit::keyboard::PhysicalKey;

pub use winit::keyboard::KeyCode;

/// Keys held down, plus the keys whose state changed since the last
/// [`end_frame`](InputState::end_frame).
#[derive(Debug, Default)]
pub struct InputState {
    pressed_keys: HashSet<KeyCode>,
    just_pressed_keys: HashSet<KeyCode>,
    just_released_keys: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a winit keyboard event. Keys without a `KeyCode` are ignored.
    pub fn on_keyboard(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match state {
            ElementState::Pressed => self.on_key_pressed(code),
            ElementState::Released => self.on_key_released(code),
        }
    }

    /// Auto-repeat presses do not count as a new press.
    pub fn on_key_pressed(&mut self, key: KeyCode) {
        if self.pressed_keys.insert(key) {
            self.just_pressed_keys.insert(key);
        }
    }

    pub fn on_key_released(&mut self, key: KeyCode) {
        if self.pressed_keys.remove(&key) {
            self.just_released_keys.insert(key);
        }
    }

    /// Clears the per-frame sets. Call once per rendered frame.
    pub fn end_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.just_released_keys.clear();
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    pub fn is_key_just_released(&self, key: KeyCode) -> bool {
        self.just_released_keys.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_sets_pressed_and_just_pressed() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::Escape);

        assert!(input.is_key_pressed(KeyCode::Escape));
        assert!(input.is_key_just_pressed(KeyCode::Escape));
        assert!(!input.is_key_pressed(KeyCode::Space));
    }

    #[test]
    fn test_end_frame_keeps_held_keys() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyW);
        input.end_frame();

        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(!input.is_key_just_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_repeat_press_is_not_just_pressed() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyA);
        input.end_frame();
        input.on_key_pressed(KeyCode::KeyA);

        assert!(!input.is_key_just_pressed(KeyCode::KeyA));
    }

    #[test]
    fn test_release() {
        let mut input = InputState::new();
        input.on_key_released(KeyCode::KeyA);
        assert!(!input.is_key_just_released(KeyCode::KeyA));

        input.on_key_pressed(KeyCode::KeyA);
        input.on_key_released(KeyCode::KeyA);
        assert!(!input.is_key_pressed(KeyCode::KeyA));
        assert!(input.is_key_just_released(KeyCode::KeyA));

        input.end_frame();
        assert!(!input.is_key_just_released(KeyCode::KeyA));
    }

    #[test]
    fn test_on_keyboard_maps_element_state() {
        let mut input = InputState::new();
        input.on_keyboard(PhysicalKey::Code(KeyCode::Escape), ElementState::Pressed);
        assert!(input.is_key_just_pressed(KeyCode::Escape));

        input.on_keyboard(PhysicalKey::Code(KeyCode::Escape), ElementState::Released);
        assert!(!input.is_key_pressed(KeyCode::Escape));
    }
}
