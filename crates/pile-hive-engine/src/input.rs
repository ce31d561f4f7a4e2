//! Platform-independent key representation

/// A key, independent of the terminal or windowing layer that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),

    // Navigation
    Left,
    Right,
    Up,
    Down,
    Home,
    End,

    // Special keys
    Enter,
    Backspace,
    Delete,
    Escape,
    Tab,
}

/// Modifier state. `mod_key` is the platform command key (Ctrl or Cmd).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub mod_key: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        mod_key: false,
        shift: false,
        alt: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// `mod` + key
    pub fn command(key: Key) -> Self {
        Self::new(
            key,
            Modifiers {
                mod_key: true,
                ..Modifiers::NONE
            },
        )
    }

    /// `mod` + `shift` + key
    pub fn command_shift(key: Key) -> Self {
        Self::new(
            key,
            Modifiers {
                mod_key: true,
                shift: true,
                alt: false,
            },
        )
    }

    /// The character this event types into the document, if any
    pub fn typed_char(&self) -> Option<char> {
        match self.key {
            Key::Char(c) if !self.modifiers.mod_key && !self.modifiers.alt => Some(c),
            _ => None,
        }
    }

    /// True for `mod+<c>` with the given shift state, ignoring letter case
    pub fn is_shortcut(&self, c: char, shift: bool) -> bool {
        match self.key {
            Key::Char(k) => {
                self.modifiers.mod_key
                    && self.modifiers.shift == shift
                    && k.eq_ignore_ascii_case(&c)
            }
            _ => false,
        }
    }
}
