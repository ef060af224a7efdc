//! # Input configuration data model
//!
//! Types describing how one emulated player slot is driven: either by a
//! keyboard (`KeyboardConfig`) or by a gamepad (`ControllerConfig`). Both are
//! carried in the global configuration document and in saved profiles through
//! the tagged `InputConfig` union.
//!
//! Every binding has a canonical string form (`W`, `Button3`, `Hat0Up`,
//! `Unbound`). The binding dialog edits those strings and parses them back
//! when a configuration is built.

pub mod controller_config;
pub mod controller_input;
pub mod key;
pub mod keyboard_config;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub use controller_config::{ControllerConfig, NpadControllerLeft, NpadControllerRight};
pub use controller_input::{ControllerInputId, HatDirection, ParseInputIdError};
pub use key::Key;
pub use keyboard_config::{
    KeyboardConfig, NpadKeyboardLeft, NpadKeyboardRight, ALL_KEYBOARDS_INDEX,
};

/// Emulated player slot
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
pub enum PlayerIndex {
    #[default]
    Player1,
    Player2,
    Player3,
    Player4,
    Player5,
    Player6,
    Player7,
    Player8,
    Handheld,
}

/// Emulated controller form factor
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    Display,
    EnumString,
)]
pub enum ControllerType {
    #[default]
    ProController,
    JoyconLeft,
    JoyconRight,
    JoyconPair,
    Handheld,
}

impl ControllerType {
    /// Label shown in the controller type selector
    pub fn label(&self) -> &'static str {
        match self {
            ControllerType::ProController => "Pro Controller",
            ControllerType::JoyconLeft => "Joy-Con (L)",
            ControllerType::JoyconRight => "Joy-Con (R)",
            ControllerType::JoyconPair => "Joy-Con Pair",
            ControllerType::Handheld => "Handheld",
        }
    }
}

/// Input configuration of a single player slot
///
/// Serialized with an explicit `"type"` tag so stored profiles decode in one
/// pass and never get mistaken for the other device class.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputConfig {
    Keyboard(KeyboardConfig),
    Controller(ControllerConfig),
}

impl InputConfig {
    pub fn index(&self) -> usize {
        match self {
            InputConfig::Keyboard(config) => config.index,
            InputConfig::Controller(config) => config.index,
        }
    }

    pub fn controller_type(&self) -> ControllerType {
        match self {
            InputConfig::Keyboard(config) => config.controller_type,
            InputConfig::Controller(config) => config.controller_type,
        }
    }

    pub fn player_index(&self) -> PlayerIndex {
        match self {
            InputConfig::Keyboard(config) => config.player_index,
            InputConfig::Controller(config) => config.player_index,
        }
    }

    pub fn set_player_index(&mut self, player: PlayerIndex) {
        match self {
            InputConfig::Keyboard(config) => config.player_index = player,
            InputConfig::Controller(config) => config.player_index = player,
        }
    }

    pub fn is_keyboard(&self) -> bool {
        matches!(self, InputConfig::Keyboard(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_read_through_both_variants() {
        let keyboard = InputConfig::Keyboard(KeyboardConfig::default_profile());
        assert_eq!(keyboard.index(), 0);
        assert_eq!(keyboard.controller_type(), ControllerType::JoyconPair);
        assert_eq!(keyboard.player_index(), PlayerIndex::Player1);
        assert!(keyboard.is_keyboard());

        let mut controller = InputConfig::Controller(ControllerConfig::default_profile());
        controller.set_player_index(PlayerIndex::Player3);
        assert_eq!(controller.controller_type(), ControllerType::ProController);
        assert_eq!(controller.player_index(), PlayerIndex::Player3);
        assert!(!controller.is_keyboard());
    }

    #[test]
    fn tagged_json_shape() {
        let config = InputConfig::Keyboard(KeyboardConfig::default_profile());
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["type"], "keyboard");
        assert_eq!(value["controller_type"], "JoyconPair");
        assert_eq!(value["left_joycon"]["stick_up"], "W");

        let controller = InputConfig::Controller(ControllerConfig::default_profile());
        let value = serde_json::to_value(&controller).unwrap();
        assert_eq!(value["type"], "controller");
        assert_eq!(value["left_joycon"]["dpad_up"], "Hat0Up");
    }

    #[test]
    fn untagged_document_is_rejected() {
        let mut value =
            serde_json::to_value(InputConfig::Keyboard(KeyboardConfig::default_profile())).unwrap();
        value.as_object_mut().unwrap().remove("type");

        assert!(serde_json::from_value::<InputConfig>(value).is_err());
    }

    #[test]
    fn player_index_parses_variant_names() {
        assert_eq!("Handheld".parse::<PlayerIndex>().unwrap(), PlayerIndex::Handheld);
        assert_eq!(PlayerIndex::Player4.to_string(), "Player4");
    }
}
