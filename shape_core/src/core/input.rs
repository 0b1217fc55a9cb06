//! Input events delivered to the orchestrator

use std::collections::HashMap;
use std::fmt;

/// A pressed or released key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Tab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    /// Function key F1..F12
    F(u8),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(' ') => write!(f, "space"),
            Key::Char(c) => write!(f, "'{}'", c),
            Key::F(n) => write!(f, "F{}", n),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPressed(Key),
    KeyReleased(Key),
    PointerMoved { x: f32, y: f32 },
    PointerPressed { x: f32, y: f32, button: u8 },
    PointerReleased { x: f32, y: f32, button: u8 },
    Resized { width: u32, height: u32 },
}

/// Actions the orchestrator performs itself instead of forwarding the key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedAction {
    TogglePause,
}

/// Keys intercepted by the orchestrator
#[derive(Debug, Clone)]
pub struct ReservedKeys {
    bindings: HashMap<Key, ReservedAction>,
}

impl Default for ReservedKeys {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(Key::Char(' '), ReservedAction::TogglePause);
        Self { bindings }
    }
}

impl ReservedKeys {
    pub fn action_for(&self, key: Key) -> Option<ReservedAction> {
        self.bindings.get(&key).copied()
    }

    pub fn is_reserved(&self, key: Key) -> bool {
        self.bindings.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = (&Key, &ReservedAction)> {
        self.bindings.iter()
    }
}
