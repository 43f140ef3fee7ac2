//! Key mapping for terminal input
//!
//! Converts discrete key presses into the character sequences a remote
//! shell expects.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, ModifierKeyCode};

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        if mods.intersects(KeyModifiers::SUPER | KeyModifiers::META) {
            result |= Modifiers::META;
        }
        result
    }
}

/// A modifier key pressed on its own
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifierKey {
    Shift,
    Control,
    Alt,
    Meta,
}

/// Key identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Tab,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Function(u8),
    Modifier(ModifierKey),
    /// Anything the encoder has no mapping for
    Other,
}

/// One key-press event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// A key with no modifiers held
    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::empty())
    }

    /// Whether the host should skip its own handling of this key
    /// (scrolling for arrows, focus traversal for Tab).
    pub fn suppresses_default(&self) -> bool {
        matches!(
            self.key,
            Key::Tab | Key::ArrowUp | Key::ArrowDown | Key::ArrowLeft | Key::ArrowRight
        )
    }
}

impl From<&KeyEvent> for KeyPress {
    fn from(event: &KeyEvent) -> Self {
        let key = match event.code {
            KeyCode::Char(ch) => Key::Char(ch),
            KeyCode::Enter => Key::Enter,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Tab => Key::Tab,
            KeyCode::Esc => Key::Escape,
            KeyCode::Up => Key::ArrowUp,
            KeyCode::Down => Key::ArrowDown,
            KeyCode::Left => Key::ArrowLeft,
            KeyCode::Right => Key::ArrowRight,
            KeyCode::F(n) => Key::Function(n),
            KeyCode::Modifier(code) => match code {
                ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => {
                    Key::Modifier(ModifierKey::Shift)
                }
                ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => {
                    Key::Modifier(ModifierKey::Control)
                }
                ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => {
                    Key::Modifier(ModifierKey::Alt)
                }
                _ => Key::Modifier(ModifierKey::Meta),
            },
            _ => Key::Other,
        };
        Self::new(key, Modifiers::from(event.modifiers))
    }
}

/// Key mapper for converting key presses to output sequences
pub struct KeyMapper;

impl KeyMapper {
    /// Encode a key press. `None` means nothing should be sent.
    pub fn encode(press: &KeyPress) -> Option<String> {
        let mods = press.modifiers;

        match press.key {
            Key::Enter => Some("\r".to_string()),
            Key::Backspace => Some("\x7f".to_string()),
            Key::Tab => Some("\t".to_string()),
            Key::ArrowUp => Some(Self::arrow_key('A')),
            Key::ArrowDown => Some(Self::arrow_key('B')),
            Key::ArrowRight => Some(Self::arrow_key('C')),
            Key::ArrowLeft => Some(Self::arrow_key('D')),
            Key::Char(ch) => Self::map_char(ch, mods),
            _ => None,
        }
    }

    /// Map a printable character with modifiers
    fn map_char(ch: char, mods: Modifiers) -> Option<String> {
        if ch.is_control() {
            return None;
        }

        // Ctrl + letter = control character
        if mods.contains(Modifiers::CTRL) && ch.is_ascii_alphabetic() {
            let ctrl_code = ch.to_ascii_uppercase() as u8 - 64;
            return Some((ctrl_code as char).to_string());
        }

        // Alt + key = ESC + key
        if mods.contains(Modifiers::ALT) {
            return Some(format!("\x1b{}", ch));
        }

        if mods.intersects(Modifiers::CTRL | Modifiers::META) {
            return None;
        }

        Some(ch.to_string())
    }

    /// Arrow key sequence
    fn arrow_key(key: char) -> String {
        format!("\x1b[{}", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(key: Key, mods: Modifiers) -> Option<String> {
        KeyMapper::encode(&KeyPress::new(key, mods))
    }

    #[test]
    fn test_char_keys() {
        // Normal character
        assert_eq!(encode(Key::Char('a'), Modifiers::empty()), Some("a".to_string()));
        assert_eq!(encode(Key::Char('A'), Modifiers::SHIFT), Some("A".to_string()));

        // Ctrl+C
        assert_eq!(encode(Key::Char('c'), Modifiers::CTRL), Some("\x03".to_string()));
        assert_eq!(encode(Key::Char('A'), Modifiers::CTRL), Some("\x01".to_string()));
        assert_eq!(encode(Key::Char('z'), Modifiers::CTRL), Some("\x1a".to_string()));

        // Alt+x
        assert_eq!(encode(Key::Char('x'), Modifiers::ALT), Some("\x1bx".to_string()));
    }

    #[test]
    fn test_unmapped_combinations() {
        assert_eq!(encode(Key::Char('1'), Modifiers::CTRL), None);
        assert_eq!(encode(Key::Char('v'), Modifiers::META), None);
        assert_eq!(encode(Key::Modifier(ModifierKey::Shift), Modifiers::SHIFT), None);
        assert_eq!(encode(Key::Function(5), Modifiers::empty()), None);
        assert_eq!(encode(Key::Escape, Modifiers::empty()), None);
        assert_eq!(encode(Key::Other, Modifiers::empty()), None);
    }

    #[test]
    fn test_special_keys() {
        assert_eq!(encode(Key::Enter, Modifiers::empty()), Some("\r".to_string()));
        assert_eq!(encode(Key::Backspace, Modifiers::empty()), Some("\x7f".to_string()));
        assert_eq!(encode(Key::Tab, Modifiers::empty()), Some("\t".to_string()));
    }

    #[test]
    fn test_arrow_keys() {
        assert_eq!(encode(Key::ArrowUp, Modifiers::empty()), Some("\x1b[A".to_string()));
        assert_eq!(encode(Key::ArrowDown, Modifiers::empty()), Some("\x1b[B".to_string()));
        assert_eq!(encode(Key::ArrowRight, Modifiers::empty()), Some("\x1b[C".to_string()));
        assert_eq!(encode(Key::ArrowLeft, Modifiers::CTRL), Some("\x1b[D".to_string()));
    }

    #[test]
    fn test_suppresses_default() {
        assert!(KeyPress::plain(Key::Tab).suppresses_default());
        assert!(KeyPress::plain(Key::ArrowLeft).suppresses_default());
        assert!(!KeyPress::plain(Key::Enter).suppresses_default());
        assert!(!KeyPress::plain(Key::Char('a')).suppresses_default());
    }

    #[test]
    fn test_from_crossterm_event() {
        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let press = KeyPress::from(&event);
        assert_eq!(press, KeyPress::new(Key::Char('c'), Modifiers::CTRL));

        let event = KeyEvent::new(
            KeyCode::Modifier(ModifierKeyCode::LeftShift),
            KeyModifiers::SHIFT,
        );
        assert_eq!(KeyMapper::encode(&KeyPress::from(&event)), None);

        let event = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(KeyPress::from(&event).key, Key::ArrowUp);
    }
}
