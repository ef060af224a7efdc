use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Keyboard keys a logical control can be bound to.
///
/// The canonical string form of a key is its variant name; `Display` and
/// `FromStr` are inverse, which is what the binding labels rely on.
/// Enumeration order is the order in which a capture scans for pressed keys.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    EnumIter,
    Display,
    EnumString,
)]
pub enum Key {
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    WinLeft,
    WinRight,
    Menu,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Space,
    Tab,
    BackSpace,
    Insert,
    Delete,
    PageUp,
    PageDown,
    Home,
    End,
    CapsLock,
    ScrollLock,
    PrintScreen,
    Pause,
    NumLock,
    Keypad0,
    Keypad1,
    Keypad2,
    Keypad3,
    Keypad4,
    Keypad5,
    Keypad6,
    Keypad7,
    Keypad8,
    Keypad9,
    KeypadDivide,
    KeypadMultiply,
    KeypadSubtract,
    KeypadAdd,
    KeypadDecimal,
    KeypadEnter,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Number0,
    Number1,
    Number2,
    Number3,
    Number4,
    Number5,
    Number6,
    Number7,
    Number8,
    Number9,
    Tilde,
    Minus,
    Plus,
    BracketLeft,
    BracketRight,
    Semicolon,
    Quote,
    Comma,
    Period,
    Slash,
    BackSlash,
    #[default]
    Unbound,
}

impl Key {
    /// Keys a keyboard capture may report, in scan order.
    ///
    /// `Escape` is reserved for cancelling a capture and `Unbound` is not a
    /// physical key, so neither is ever reported.
    pub fn capturable() -> impl Iterator<Item = Key> {
        Key::iter().filter(|key| !matches!(key, Key::Unbound | Key::Escape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn display_and_parse_use_variant_names() {
        assert_eq!(Key::BackSpace.to_string(), "BackSpace");
        assert_eq!(Key::from_str("Minus").unwrap(), Key::Minus);
        assert_eq!(Key::from_str("Unbound").unwrap(), Key::Unbound);
        assert!(Key::from_str("Axis0").is_err());
    }

    #[test]
    fn capturable_skips_escape_and_unbound() {
        let keys: Vec<Key> = Key::capturable().collect();
        assert!(!keys.contains(&Key::Escape));
        assert!(!keys.contains(&Key::Unbound));
        assert_eq!(keys.first(), Some(&Key::ShiftLeft));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Key::KeypadEnter).unwrap();
        assert_eq!(json, "\"KeypadEnter\"");
    }
}
