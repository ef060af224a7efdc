use serde::{Deserialize, Serialize};

use super::{ControllerInputId, ControllerType, HatDirection, PlayerIndex};

/// Left Joy-Con side of a controller mapping
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct NpadControllerLeft {
    pub stick_x: ControllerInputId,
    pub invert_stick_x: bool,
    pub stick_y: ControllerInputId,
    pub invert_stick_y: bool,
    pub stick_button: ControllerInputId,
    pub button_minus: ControllerInputId,
    pub button_l: ControllerInputId,
    pub button_zl: ControllerInputId,
    pub button_sl: ControllerInputId,
    pub button_sr: ControllerInputId,
    pub dpad_up: ControllerInputId,
    pub dpad_down: ControllerInputId,
    pub dpad_left: ControllerInputId,
    pub dpad_right: ControllerInputId,
}

/// Right Joy-Con side of a controller mapping
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct NpadControllerRight {
    pub stick_x: ControllerInputId,
    pub invert_stick_x: bool,
    pub stick_y: ControllerInputId,
    pub invert_stick_y: bool,
    pub stick_button: ControllerInputId,
    pub button_a: ControllerInputId,
    pub button_b: ControllerInputId,
    pub button_x: ControllerInputId,
    pub button_y: ControllerInputId,
    pub button_plus: ControllerInputId,
    pub button_r: ControllerInputId,
    pub button_zr: ControllerInputId,
    pub button_sl: ControllerInputId,
    pub button_sr: ControllerInputId,
}

/// Gamepad based input configuration for one player slot
///
/// Deadzones and the trigger threshold are fractions in `[0, 1]`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub index: usize,
    pub controller_type: ControllerType,
    pub player_index: PlayerIndex,
    pub deadzone_left: f32,
    pub deadzone_right: f32,
    pub trigger_threshold: f32,
    pub left_joycon: NpadControllerLeft,
    pub right_joycon: NpadControllerRight,
}

impl ControllerConfig {
    /// Baseline mapping offered as the "Default" controller profile.
    ///
    /// Laid out for an Xbox style pad as enumerated by the gamepad poller.
    pub fn default_profile() -> Self {
        use ControllerInputId::{Axis, Button, Hat, Unbound};

        Self {
            index: 0,
            controller_type: ControllerType::ProController,
            player_index: PlayerIndex::Player1,
            deadzone_left: 0.1,
            deadzone_right: 0.1,
            trigger_threshold: 0.5,
            left_joycon: NpadControllerLeft {
                stick_x: Axis(0),
                invert_stick_x: false,
                stick_y: Axis(1),
                invert_stick_y: false,
                stick_button: Button(8),
                button_minus: Button(6),
                button_l: Button(4),
                button_zl: Axis(2),
                button_sl: Unbound,
                button_sr: Unbound,
                dpad_up: Hat(0, HatDirection::Up),
                dpad_down: Hat(0, HatDirection::Down),
                dpad_left: Hat(0, HatDirection::Left),
                dpad_right: Hat(0, HatDirection::Right),
            },
            right_joycon: NpadControllerRight {
                stick_x: Axis(3),
                invert_stick_x: false,
                stick_y: Axis(4),
                invert_stick_y: false,
                stick_button: Button(9),
                button_a: Button(1),
                button_b: Button(0),
                button_x: Button(3),
                button_y: Button(2),
                button_plus: Button(7),
                button_r: Button(5),
                button_zr: Axis(5),
                button_sl: Unbound,
                button_sr: Unbound,
            },
        }
    }
}
