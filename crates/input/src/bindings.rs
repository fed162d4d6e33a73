use crate::action::Action;
use firstlight_camera::Movement;
use std::collections::HashMap;
use winit::keyboard::KeyCode;

/// Physical key to action table.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<KeyCode, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings.bind(KeyCode::KeyW, Action::Move(Movement::FORWARD));
        bindings.bind(KeyCode::KeyS, Action::Move(Movement::BACKWARD));
        bindings.bind(KeyCode::KeyA, Action::Move(Movement::LEFT));
        bindings.bind(KeyCode::KeyD, Action::Move(Movement::RIGHT));
        bindings.bind(KeyCode::Space, Action::Move(Movement::UP));
        bindings.bind(KeyCode::ShiftLeft, Action::Move(Movement::DOWN));
        bindings.bind(KeyCode::KeyQ, Action::Move(Movement::ROLL_LEFT));
        bindings.bind(KeyCode::KeyE, Action::Move(Movement::ROLL_RIGHT));
        bindings.bind(KeyCode::ArrowUp, Action::RaiseMix);
        bindings.bind(KeyCode::ArrowDown, Action::LowerMix);
        bindings.bind(KeyCode::Escape, Action::Close);
        bindings
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Bind `key` to `action`, replacing any earlier binding for that key.
    pub fn bind(&mut self, key: KeyCode, action: Action) -> Option<Action> {
        let previous = self.map.insert(key, action);
        if let Some(old) = previous {
            tracing::debug!(?key, ?old, new = ?action, "key rebound");
        }
        previous
    }

    pub fn unbind(&mut self, key: KeyCode) -> Option<Action> {
        self.map.remove(&key)
    }

    pub fn action(&self, key: KeyCode) -> Option<Action> {
        self.map.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
