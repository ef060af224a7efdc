use serde::{Deserialize, Serialize};

use super::{ControllerType, Key, PlayerIndex};

/// Index used by keyboard configs that listen to every attached keyboard.
pub const ALL_KEYBOARDS_INDEX: usize = 0;

/// Left Joy-Con side of a keyboard mapping
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct NpadKeyboardLeft {
    pub stick_up: Key,
    pub stick_down: Key,
    pub stick_left: Key,
    pub stick_right: Key,
    pub stick_button: Key,
    pub dpad_up: Key,
    pub dpad_down: Key,
    pub dpad_left: Key,
    pub dpad_right: Key,
    pub button_minus: Key,
    pub button_l: Key,
    pub button_zl: Key,
    pub button_sl: Key,
    pub button_sr: Key,
}

/// Right Joy-Con side of a keyboard mapping
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct NpadKeyboardRight {
    pub stick_up: Key,
    pub stick_down: Key,
    pub stick_left: Key,
    pub stick_right: Key,
    pub stick_button: Key,
    pub button_a: Key,
    pub button_b: Key,
    pub button_x: Key,
    pub button_y: Key,
    pub button_plus: Key,
    pub button_r: Key,
    pub button_zr: Key,
    pub button_sl: Key,
    pub button_sr: Key,
}

/// Keyboard based input configuration for one player slot
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct KeyboardConfig {
    /// Keyboard index, `ALL_KEYBOARDS_INDEX` for every keyboard
    pub index: usize,
    pub controller_type: ControllerType,
    pub player_index: PlayerIndex,
    pub left_joycon: NpadKeyboardLeft,
    pub right_joycon: NpadKeyboardRight,
}

impl KeyboardConfig {
    /// Baseline mapping offered as the "Default" keyboard profile.
    pub fn default_profile() -> Self {
        Self {
            index: ALL_KEYBOARDS_INDEX,
            controller_type: ControllerType::JoyconPair,
            player_index: PlayerIndex::Player1,
            left_joycon: NpadKeyboardLeft {
                stick_up: Key::W,
                stick_down: Key::S,
                stick_left: Key::A,
                stick_right: Key::D,
                stick_button: Key::F,
                dpad_up: Key::Up,
                dpad_down: Key::Down,
                dpad_left: Key::Left,
                dpad_right: Key::Right,
                button_minus: Key::Minus,
                button_l: Key::E,
                button_zl: Key::Q,
                button_sl: Key::Unbound,
                button_sr: Key::Unbound,
            },
            right_joycon: NpadKeyboardRight {
                stick_up: Key::I,
                stick_down: Key::K,
                stick_left: Key::J,
                stick_right: Key::L,
                stick_button: Key::H,
                button_a: Key::Z,
                button_b: Key::X,
                button_x: Key::C,
                button_y: Key::V,
                button_plus: Key::Plus,
                button_r: Key::U,
                button_zr: Key::O,
                button_sl: Key::Unbound,
                button_sr: Key::Unbound,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_matches_baseline_layout() {
        let config = KeyboardConfig::default_profile();
        let left = &config.left_joycon;
        let right = &config.right_joycon;

        assert_eq!(
            [left.stick_up, left.stick_down, left.stick_left, left.stick_right],
            [Key::W, Key::S, Key::A, Key::D]
        );
        assert_eq!(left.stick_button, Key::F);
        assert_eq!(
            [left.dpad_up, left.dpad_down, left.dpad_left, left.dpad_right],
            [Key::Up, Key::Down, Key::Left, Key::Right]
        );
        assert_eq!(left.button_minus, Key::Minus);
        assert_eq!(left.button_l, Key::E);
        assert_eq!(left.button_zl, Key::Q);

        assert_eq!(
            [right.button_a, right.button_b, right.button_x, right.button_y],
            [Key::Z, Key::X, Key::C, Key::V]
        );
        assert_eq!(right.button_plus, Key::Plus);
        assert_eq!(right.button_r, Key::U);
        assert_eq!(right.button_zr, Key::O);

        for side_button in [left.button_sl, left.button_sr, right.button_sl, right.button_sr] {
            assert_eq!(side_button, Key::Unbound);
        }
    }

    #[test]
    fn missing_fields_fall_back_to_unbound() {
        let side: NpadKeyboardLeft = serde_json::from_str(r#"{ "stick_up": "W" }"#).unwrap();
        assert_eq!(side.stick_up, Key::W);
        assert_eq!(side.button_zl, Key::Unbound);
    }
}
