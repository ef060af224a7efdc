use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

/// Direction of a hat (directional pad) switch.
///
/// Enumeration order is the capture priority: Up beats Down beats Left beats
/// Right when several directions are active at once.
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
    EnumString,
)]
pub enum HatDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Physical controller input a logical control can be bound to.
///
/// Serialized and displayed in its canonical form: `Unbound`, `Button{n}`,
/// `Axis{n}` or `Hat{n}{Up|Down|Left|Right}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ControllerInputId {
    #[default]
    Unbound,
    Button(u8),
    Axis(u8),
    Hat(u8, HatDirection),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a controller input identifier")]
pub struct ParseInputIdError(pub String);

impl fmt::Display for ControllerInputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerInputId::Unbound => write!(f, "Unbound"),
            ControllerInputId::Button(n) => write!(f, "Button{}", n),
            ControllerInputId::Axis(n) => write!(f, "Axis{}", n),
            ControllerInputId::Hat(n, direction) => write!(f, "Hat{}{}", n, direction),
        }
    }
}

impl FromStr for ControllerInputId {
    type Err = ParseInputIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseInputIdError(s.to_string());

        if s == "Unbound" {
            return Ok(ControllerInputId::Unbound);
        }
        if let Some(rest) = s.strip_prefix("Button") {
            return parse_index(rest)
                .map(ControllerInputId::Button)
                .ok_or_else(invalid);
        }
        if let Some(rest) = s.strip_prefix("Axis") {
            return parse_index(rest)
                .map(ControllerInputId::Axis)
                .ok_or_else(invalid);
        }
        if let Some(rest) = s.strip_prefix("Hat") {
            let split = rest
                .find(|c: char| !c.is_ascii_digit())
                .ok_or_else(invalid)?;
            let (index, direction) = rest.split_at(split);
            let index = parse_index(index).ok_or_else(invalid)?;
            let direction = HatDirection::from_str(direction).map_err(|_| invalid())?;
            return Ok(ControllerInputId::Hat(index, direction));
        }

        Err(invalid())
    }
}

// Digits only, no sign or leading '+'.
fn parse_index(digits: &str) -> Option<u8> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl From<ControllerInputId> for String {
    fn from(id: ControllerInputId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ControllerInputId {
    type Error = ParseInputIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_strings() {
        assert_eq!(ControllerInputId::Button(12).to_string(), "Button12");
        assert_eq!(ControllerInputId::Axis(3).to_string(), "Axis3");
        assert_eq!(
            ControllerInputId::Hat(0, HatDirection::Left).to_string(),
            "Hat0Left"
        );
        assert_eq!(ControllerInputId::Unbound.to_string(), "Unbound");
    }

    #[test]
    fn parses_canonical_strings() {
        assert_eq!(
            "Hat2Down".parse::<ControllerInputId>().unwrap(),
            ControllerInputId::Hat(2, HatDirection::Down)
        );
        assert_eq!(
            "Button0".parse::<ControllerInputId>().unwrap(),
            ControllerInputId::Button(0)
        );
        assert_eq!(
            "Axis5".parse::<ControllerInputId>().unwrap(),
            ControllerInputId::Axis(5)
        );
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "Button", "Button-1", "Axis+2", "Hat0", "Hat0Diagonal", "HatUp", "W"] {
            assert!(bad.parse::<ControllerInputId>().is_err(), "{bad} parsed");
        }
    }

    #[test]
    fn serializes_through_canonical_string() {
        let json = serde_json::to_string(&ControllerInputId::Hat(1, HatDirection::Right)).unwrap();
        assert_eq!(json, "\"Hat1Right\"");
        let back: ControllerInputId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ControllerInputId::Hat(1, HatDirection::Right));
    }
}
