//! Field accessors linking logical controls to config struct members.

use super::controls::LogicalControl;
use crate::hid::{ControllerConfig, ControllerInputId, Key, KeyboardConfig};

/// Keyboard field bound to `control`, `None` for analog stick axes.
pub fn keyboard_slot(config: &mut KeyboardConfig, control: LogicalControl) -> Option<&mut Key> {
    use LogicalControl::*;
    let left = &mut config.left_joycon;
    let right = &mut config.right_joycon;
    let slot = match control {
        LeftStickUp => &mut left.stick_up,
        LeftStickDown => &mut left.stick_down,
        LeftStickLeft => &mut left.stick_left,
        LeftStickRight => &mut left.stick_right,
        LeftStickButton => &mut left.stick_button,
        DpadUp => &mut left.dpad_up,
        DpadDown => &mut left.dpad_down,
        DpadLeft => &mut left.dpad_left,
        DpadRight => &mut left.dpad_right,
        Minus => &mut left.button_minus,
        L => &mut left.button_l,
        ZL => &mut left.button_zl,
        LeftSL => &mut left.button_sl,
        LeftSR => &mut left.button_sr,
        RightStickUp => &mut right.stick_up,
        RightStickDown => &mut right.stick_down,
        RightStickLeft => &mut right.stick_left,
        RightStickRight => &mut right.stick_right,
        RightStickButton => &mut right.stick_button,
        A => &mut right.button_a,
        B => &mut right.button_b,
        X => &mut right.button_x,
        Y => &mut right.button_y,
        Plus => &mut right.button_plus,
        R => &mut right.button_r,
        ZR => &mut right.button_zr,
        RightSL => &mut right.button_sl,
        RightSR => &mut right.button_sr,
        LeftStickX | LeftStickY | RightStickX | RightStickY => return None,
    };
    Some(slot)
}

/// Controller field bound to `control`, `None` for digital stick directions.
pub fn controller_slot(
    config: &mut ControllerConfig,
    control: LogicalControl,
) -> Option<&mut ControllerInputId> {
    use LogicalControl::*;
    let left = &mut config.left_joycon;
    let right = &mut config.right_joycon;
    let slot = match control {
        LeftStickX => &mut left.stick_x,
        LeftStickY => &mut left.stick_y,
        LeftStickButton => &mut left.stick_button,
        DpadUp => &mut left.dpad_up,
        DpadDown => &mut left.dpad_down,
        DpadLeft => &mut left.dpad_left,
        DpadRight => &mut left.dpad_right,
        Minus => &mut left.button_minus,
        L => &mut left.button_l,
        ZL => &mut left.button_zl,
        LeftSL => &mut left.button_sl,
        LeftSR => &mut left.button_sr,
        RightStickX => &mut right.stick_x,
        RightStickY => &mut right.stick_y,
        RightStickButton => &mut right.stick_button,
        A => &mut right.button_a,
        B => &mut right.button_b,
        X => &mut right.button_x,
        Y => &mut right.button_y,
        Plus => &mut right.button_plus,
        R => &mut right.button_r,
        ZR => &mut right.button_zr,
        RightSL => &mut right.button_sl,
        RightSR => &mut right.button_sr,
        LeftStickUp | LeftStickDown | LeftStickLeft | LeftStickRight | RightStickUp
        | RightStickDown | RightStickLeft | RightStickRight => return None,
    };
    Some(slot)
}

/// Invert flag of a stick axis control.
pub fn invert_slot(config: &mut ControllerConfig, control: LogicalControl) -> Option<&mut bool> {
    match control {
        LogicalControl::LeftStickX => Some(&mut config.left_joycon.invert_stick_x),
        LogicalControl::LeftStickY => Some(&mut config.left_joycon.invert_stick_y),
        LogicalControl::RightStickX => Some(&mut config.right_joycon.invert_stick_x),
        LogicalControl::RightStickY => Some(&mut config.right_joycon.invert_stick_y),
        _ => None,
    }
}
