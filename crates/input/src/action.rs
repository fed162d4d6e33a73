use firstlight_camera::Movement;

/// A high-level action a key can be bound to.
///
/// The driver and camera consume actions, never raw input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Contribute movement bits while the key is held.
    Move(Movement),
    /// Raise the texture mix value while held.
    RaiseMix,
    /// Lower the texture mix value while held.
    LowerMix,
    /// Ask the window to close.
    Close,
}

impl Action {
    /// Movement bits this action contributes, empty for non-movement actions.
    pub fn movement(self) -> Movement {
        match self {
            Action::Move(movement) => movement,
            _ => Movement::empty(),
        }
    }
}
