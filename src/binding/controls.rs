use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::hid::ControllerType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoyconSide {
    Left,
    Right,
}

/// Which device class a control row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlGroup {
    /// Digital stick directions, only shown for keyboards
    KeyboardStick,
    /// Analog stick axes, only shown for controllers
    ControllerStick,
    /// SL/SR, shown for single Joy-Cons of the matching side
    SideButton,
    Common,
}

/// A logical input of the emulated controller, independent of the physical
/// device bound to it.
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
    EnumIter,
    Display,
)]
pub enum LogicalControl {
    LeftStickUp,
    LeftStickDown,
    LeftStickLeft,
    LeftStickRight,
    LeftStickX,
    LeftStickY,
    LeftStickButton,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Minus,
    L,
    ZL,
    LeftSL,
    LeftSR,
    RightStickUp,
    RightStickDown,
    RightStickLeft,
    RightStickRight,
    RightStickX,
    RightStickY,
    RightStickButton,
    A,
    B,
    X,
    Y,
    Plus,
    R,
    ZR,
    RightSL,
    RightSR,
}

impl LogicalControl {
    pub fn all() -> impl Iterator<Item = LogicalControl> {
        LogicalControl::iter()
    }

    pub fn side(&self) -> JoyconSide {
        use LogicalControl::*;
        match self {
            LeftStickUp | LeftStickDown | LeftStickLeft | LeftStickRight | LeftStickX
            | LeftStickY | LeftStickButton | DpadUp | DpadDown | DpadLeft | DpadRight | Minus
            | L | ZL | LeftSL | LeftSR => JoyconSide::Left,
            _ => JoyconSide::Right,
        }
    }

    pub fn group(&self) -> ControlGroup {
        use LogicalControl::*;
        match self {
            LeftStickUp | LeftStickDown | LeftStickLeft | LeftStickRight | RightStickUp
            | RightStickDown | RightStickLeft | RightStickRight => ControlGroup::KeyboardStick,
            LeftStickX | LeftStickY | RightStickX | RightStickY => ControlGroup::ControllerStick,
            LeftSL | LeftSR | RightSL | RightSR => ControlGroup::SideButton,
            _ => ControlGroup::Common,
        }
    }

    /// Row label in the binding window
    pub fn label(&self) -> &'static str {
        use LogicalControl::*;
        match self {
            LeftStickUp | RightStickUp => "Stick Up",
            LeftStickDown | RightStickDown => "Stick Down",
            LeftStickLeft | RightStickLeft => "Stick Left",
            LeftStickRight | RightStickRight => "Stick Right",
            LeftStickX | RightStickX => "Stick X Axis",
            LeftStickY | RightStickY => "Stick Y Axis",
            LeftStickButton | RightStickButton => "Stick Button",
            DpadUp => "D-Pad Up",
            DpadDown => "D-Pad Down",
            DpadLeft => "D-Pad Left",
            DpadRight => "D-Pad Right",
            Minus => "-",
            Plus => "+",
            L => "L",
            ZL => "ZL",
            R => "R",
            ZR => "ZR",
            LeftSL | RightSL => "SL",
            LeftSR | RightSR => "SR",
            A => "A",
            B => "B",
            X => "X",
            Y => "Y",
        }
    }

    /// Whether a row is used by the given device class and controller type.
    pub fn is_visible(&self, keyboard: bool, controller_type: Option<ControllerType>) -> bool {
        match self.group() {
            ControlGroup::KeyboardStick => keyboard,
            ControlGroup::ControllerStick => !keyboard,
            ControlGroup::SideButton => matches!(
                (self.side(), controller_type),
                (JoyconSide::Left, Some(ControllerType::JoyconLeft))
                    | (JoyconSide::Right, Some(ControllerType::JoyconRight))
            ),
            ControlGroup::Common => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_buttons_follow_joycon_role() {
        let left = Some(ControllerType::JoyconLeft);
        let right = Some(ControllerType::JoyconRight);
        let pair = Some(ControllerType::JoyconPair);

        assert!(LogicalControl::LeftSL.is_visible(true, left));
        assert!(!LogicalControl::RightSL.is_visible(true, left));
        assert!(LogicalControl::RightSR.is_visible(false, right));
        assert!(!LogicalControl::LeftSR.is_visible(false, right));
        for control in [
            LogicalControl::LeftSL,
            LogicalControl::LeftSR,
            LogicalControl::RightSL,
            LogicalControl::RightSR,
        ] {
            assert!(!control.is_visible(true, pair));
        }
    }

    #[test]
    fn stick_rows_follow_device_class() {
        assert!(LogicalControl::LeftStickUp.is_visible(true, None));
        assert!(!LogicalControl::LeftStickUp.is_visible(false, None));
        assert!(LogicalControl::RightStickX.is_visible(false, None));
        assert!(!LogicalControl::RightStickX.is_visible(true, None));
        assert!(LogicalControl::A.is_visible(true, None));
    }

    #[test]
    fn every_control_belongs_to_one_side() {
        let left = LogicalControl::all()
            .filter(|c| c.side() == JoyconSide::Left)
            .count();
        assert_eq!(left, 16);
        assert_eq!(LogicalControl::all().count(), 32);
    }
}
