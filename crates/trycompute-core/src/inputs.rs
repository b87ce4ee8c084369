//! Keyboard input from the windowing layer to the application.

/// A keyboard key, independent of the windowing library.
///
/// The runtime maps winit's physical key codes onto this enum. Only Escape has
/// a binding; everything else arrives as [`Key::Other`] and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    /// Any other key, carrying a backend-specific code for logging.
    Other(u32),
}

/// What the application does in response to a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Ask the window to close.
    CloseWindow,
}

/// A key-down event as delivered by the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDown {
    pub key: Key,
    /// Auto-repeat events generated while the key is held.
    pub repeat: bool,
}

impl KeyDown {
    pub fn new(key: Key) -> Self {
        Self { key, repeat: false }
    }

    pub fn repeated(key: Key) -> Self {
        Self { key, repeat: true }
    }
}

/// Translate a key press into an action, if the key is bound.
///
/// Held-key repeats are not presses, so they never map to an action.
pub fn action_for(event: KeyDown) -> Option<InputAction> {
    if event.repeat {
        return None;
    }

    match event.key {
        Key::Escape => Some(InputAction::CloseWindow),
        Key::Other(_) => None,
    }
}
