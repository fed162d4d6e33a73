use crate::action::Action;
use crate::bindings::KeyBindings;
use firstlight_camera::Movement;
use std::collections::HashSet;
use winit::keyboard::KeyCode;

/// Set of keys currently held down.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key transition. Returns the bound action on a fresh press.
    pub fn handle_key(
        &mut self,
        bindings: &KeyBindings,
        key: KeyCode,
        pressed: bool,
    ) -> Option<Action> {
        if pressed {
            let fresh = self.held.insert(key);
            if fresh {
                return bindings.action(key);
            }
        } else {
            self.held.remove(&key);
        }
        None
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// True if any held key is bound to `action`.
    pub fn action_held(&self, bindings: &KeyBindings, action: Action) -> bool {
        self.held
            .iter()
            .any(|key| bindings.action(*key) == Some(action))
    }

    /// Fold every held movement key into one bitset for this tick.
    pub fn movement(&self, bindings: &KeyBindings) -> Movement {
        self.held
            .iter()
            .filter_map(|key| bindings.action(*key))
            .fold(Movement::empty(), |acc, action| acc | action.movement())
    }

    /// Forget every held key, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

/// Blend factor between the two cube textures, kept in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixControl {
    value: f32,
}

impl Default for MixControl {
    fn default() -> Self {
        Self::new(0.2)
    }
}

impl MixControl {
    pub fn new(value: f32) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Move the value by `delta_time` per second held. Raising wins when both are held.
    pub fn update(&mut self, raise: bool, lower: bool, delta_time: f32) {
        if raise {
            self.value = (self.value + delta_time).min(1.0);
        } else if lower {
            self.value = (self.value - delta_time).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn held_keys_fold_into_movement() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        input.handle_key(&bindings, KeyCode::KeyW, true);
        input.handle_key(&bindings, KeyCode::KeyD, true);
        input.handle_key(&bindings, KeyCode::KeyE, true);
        assert_eq!(
            input.movement(&bindings),
            Movement::FORWARD | Movement::RIGHT | Movement::ROLL_RIGHT
        );

        input.handle_key(&bindings, KeyCode::KeyD, false);
        assert_eq!(
            input.movement(&bindings),
            Movement::FORWARD | Movement::ROLL_RIGHT
        );
    }

    #[test]
    fn press_reports_action_once() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        assert_eq!(
            input.handle_key(&bindings, KeyCode::Escape, true),
            Some(Action::Close)
        );
        // Key repeat while held is not a fresh press.
        assert_eq!(input.handle_key(&bindings, KeyCode::Escape, true), None);
        assert_eq!(input.handle_key(&bindings, KeyCode::Escape, false), None);
    }

    #[test]
    fn unbound_keys_do_not_move() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        input.handle_key(&bindings, KeyCode::KeyZ, true);
        assert!(input.is_held(KeyCode::KeyZ));
        assert!(input.movement(&bindings).is_empty());
    }

    #[test]
    fn clear_releases_everything() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        input.handle_key(&bindings, KeyCode::KeyW, true);
        input.handle_key(&bindings, KeyCode::ArrowUp, true);
        assert!(input.action_held(&bindings, Action::RaiseMix));
        input.clear();
        assert!(input.movement(&bindings).is_empty());
        assert!(!input.action_held(&bindings, Action::RaiseMix));
    }

    #[test]
    fn mix_value_stays_in_unit_range() {
        let mut mix = MixControl::default();
        assert_relative_eq!(mix.value(), 0.2);
        for _ in 0..200 {
            mix.update(true, false, 0.016);
        }
        assert_eq!(mix.value(), 1.0);
        for _ in 0..200 {
            mix.update(false, true, 0.016);
        }
        assert_eq!(mix.value(), 0.0);
    }

    #[test]
    fn raise_wins_over_lower() {
        let mut mix = MixControl::new(0.5);
        mix.update(true, true, 0.25);
        assert_relative_eq!(mix.value(), 0.75);
    }
}
