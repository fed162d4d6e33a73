//! Desktop input mapped to camera movement and driver actions.
//!
//! Key state is polled once per tick and folded into a [`Movement`] bitset;
//! cursor positions become look deltas through a [`MouseTracker`].
//!
//! # Invariants
//! - The camera never sees raw key codes, only actions.
//! - The first cursor sample after (re)capture produces no motion.

pub mod action;
pub mod bindings;
pub mod mouse;
pub mod state;

pub use action::Action;
pub use bindings::KeyBindings;
pub use firstlight_camera::Movement;
pub use mouse::{MouseTracker, ScrollRouter};
pub use state::{InputState, MixControl};
