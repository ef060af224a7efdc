//! Feeds egui's per-frame keyboard and pointer state into the [`DeviceHub`].
//!
//! egui does not tell the left and right modifier keys apart, so modifiers
//! are reported as their left variant. The window keyboard is published as
//! keyboard 1.

use std::collections::BTreeSet;

use eframe::egui;

use crate::controller::device_poller::{DeviceHub, KeyboardState, MouseState};
use crate::hid::Key;

pub const WINDOW_KEYBOARD_INDEX: usize = 1;

pub fn map_key(key: egui::Key) -> Option<Key> {
    use eframe::egui::Key as E;
    let mapped = match key {
        E::ArrowUp => Key::Up,
        E::ArrowDown => Key::Down,
        E::ArrowLeft => Key::Left,
        E::ArrowRight => Key::Right,
        E::Enter => Key::Enter,
        E::Escape => Key::Escape,
        E::Space => Key::Space,
        E::Tab => Key::Tab,
        E::Backspace => Key::BackSpace,
        E::Insert => Key::Insert,
        E::Delete => Key::Delete,
        E::PageUp => Key::PageUp,
        E::PageDown => Key::PageDown,
        E::Home => Key::Home,
        E::End => Key::End,
        E::F1 => Key::F1,
        E::F2 => Key::F2,
        E::F3 => Key::F3,
        E::F4 => Key::F4,
        E::F5 => Key::F5,
        E::F6 => Key::F6,
        E::F7 => Key::F7,
        E::F8 => Key::F8,
        E::F9 => Key::F9,
        E::F10 => Key::F10,
        E::F11 => Key::F11,
        E::F12 => Key::F12,
        E::F13 => Key::F13,
        E::F14 => Key::F14,
        E::F15 => Key::F15,
        E::F16 => Key::F16,
        E::F17 => Key::F17,
        E::F18 => Key::F18,
        E::F19 => Key::F19,
        E::F20 => Key::F20,
        E::F21 => Key::F21,
        E::F22 => Key::F22,
        E::F23 => Key::F23,
        E::F24 => Key::F24,
        E::A => Key::A,
        E::B => Key::B,
        E::C => Key::C,
        E::D => Key::D,
        E::E => Key::E,
        E::F => Key::F,
        E::G => Key::G,
        E::H => Key::H,
        E::I => Key::I,
        E::J => Key::J,
        E::K => Key::K,
        E::L => Key::L,
        E::M => Key::M,
        E::N => Key::N,
        E::O => Key::O,
        E::P => Key::P,
        E::Q => Key::Q,
        E::R => Key::R,
        E::S => Key::S,
        E::T => Key::T,
        E::U => Key::U,
        E::V => Key::V,
        E::W => Key::W,
        E::X => Key::X,
        E::Y => Key::Y,
        E::Z => Key::Z,
        E::Num0 => Key::Number0,
        E::Num1 => Key::Number1,
        E::Num2 => Key::Number2,
        E::Num3 => Key::Number3,
        E::Num4 => Key::Number4,
        E::Num5 => Key::Number5,
        E::Num6 => Key::Number6,
        E::Num7 => Key::Number7,
        E::Num8 => Key::Number8,
        E::Num9 => Key::Number9,
        E::Backtick => Key::Tilde,
        E::Minus => Key::Minus,
        E::Plus | E::Equals => Key::Plus,
        E::OpenBracket => Key::BracketLeft,
        E::CloseBracket => Key::BracketRight,
        E::Semicolon => Key::Semicolon,
        E::Comma => Key::Comma,
        E::Period => Key::Period,
        E::Slash => Key::Slash,
        E::Backslash => Key::BackSlash,
        _ => return None,
    };
    Some(mapped)
}

pub fn keyboard_state(input: &egui::InputState) -> KeyboardState {
    let mut pressed: BTreeSet<Key> = input.keys_down.iter().copied().filter_map(map_key).collect();
    if input.modifiers.shift {
        pressed.insert(Key::ShiftLeft);
    }
    if input.modifiers.ctrl {
        pressed.insert(Key::ControlLeft);
    }
    if input.modifiers.alt {
        pressed.insert(Key::AltLeft);
    }
    KeyboardState { pressed }
}

pub fn mouse_state(input: &egui::InputState) -> MouseState {
    MouseState {
        left: input.pointer.button_down(egui::PointerButton::Primary),
        right: input.pointer.button_down(egui::PointerButton::Secondary),
        middle: input.pointer.button_down(egui::PointerButton::Middle),
    }
}

/// Publishes this frame's window input.
pub fn publish(ctx: &egui::Context, hub: &DeviceHub) {
    let (keyboard, mouse) = ctx.input(|input| (keyboard_state(input), mouse_state(input)));
    hub.update_keyboard(WINDOW_KEYBOARD_INDEX, keyboard);
    hub.update_mouse(mouse);
}
