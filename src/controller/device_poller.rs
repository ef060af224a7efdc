use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::hid::{HatDirection, Key, ALL_KEYBOARDS_INDEX};

/// Highest physical keyboard index offered to the user.
pub const MAX_KEYBOARDS: usize = 20;

/// Pressed keys of one keyboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardState {
    pub pressed: BTreeSet<Key>,
}

impl KeyboardState {
    pub fn is_key_down(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn is_any_key_down(&self) -> bool {
        !self.pressed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseState {
    pub left: bool,
    pub right: bool,
    pub middle: bool,
}

impl MouseState {
    pub fn is_any_button_down(&self) -> bool {
        self.left || self.right || self.middle
    }
}

/// Snapshot of one gamepad
///
/// Buttons and axes are index ordered; axis values lie in `-1.0..=1.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoystickState {
    pub name: String,
    pub buttons: Vec<bool>,
    pub axes: Vec<f32>,
    pub hats: Vec<BTreeSet<HatDirection>>,
}

impl JoystickState {
    pub fn is_hat_active(&self, hat: usize, direction: HatDirection) -> bool {
        self.hats
            .get(hat)
            .is_some_and(|directions| directions.contains(&direction))
    }
}

/// Read side of the device poller, used by input captures and device
/// enumeration.
pub trait InputSource: Send + Sync {
    /// Keyboard state; index `ALL_KEYBOARDS_INDEX` is the union of every keyboard.
    fn keyboard(&self, index: usize) -> KeyboardState;
    fn mouse(&self) -> MouseState;
    fn joystick(&self, index: usize) -> Option<JoystickState>;
    /// Connected physical keyboards, `1..=MAX_KEYBOARDS`
    fn keyboards(&self) -> Vec<usize>;
    /// Connected gamepads as `(index, name)`
    fn joysticks(&self) -> Vec<(usize, String)>;
}

#[derive(Debug, Default)]
struct HubState {
    keyboards: BTreeMap<usize, KeyboardState>,
    mouse: MouseState,
    joysticks: BTreeMap<usize, JoystickState>,
}

/// Process wide device state.
///
/// The UI thread writes keyboard and mouse snapshots every frame, the gamepad
/// poller thread writes joystick snapshots. Uses a blocking lock because both
/// writers are plain threads and readers only copy small snapshots out.
#[derive(Debug, Default)]
pub struct DeviceHub {
    state: RwLock<HubState>,
}

impl DeviceHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HubState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HubState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the state of physical keyboard `index` (1-based).
    pub fn update_keyboard(&self, index: usize, state: KeyboardState) {
        if index == ALL_KEYBOARDS_INDEX || index > MAX_KEYBOARDS {
            debug!("Ignoring keyboard update for index {}", index);
            return;
        }
        self.write().keyboards.insert(index, state);
    }

    pub fn update_mouse(&self, state: MouseState) {
        self.write().mouse = state;
    }

    pub fn update_joystick(&self, index: usize, state: JoystickState) {
        self.write().joysticks.insert(index, state);
    }

    pub fn remove_joystick(&self, index: usize) {
        if self.write().joysticks.remove(&index).is_some() {
            debug!("Gamepad {} removed from device hub", index);
        }
    }
}

impl InputSource for DeviceHub {
    fn keyboard(&self, index: usize) -> KeyboardState {
        let state = self.read();
        if index == ALL_KEYBOARDS_INDEX {
            let pressed = state
                .keyboards
                .values()
                .flat_map(|keyboard| keyboard.pressed.iter().copied())
                .collect();
            return KeyboardState { pressed };
        }
        state.keyboards.get(&index).cloned().unwrap_or_default()
    }

    fn mouse(&self) -> MouseState {
        self.read().mouse
    }

    fn joystick(&self, index: usize) -> Option<JoystickState> {
        self.read().joysticks.get(&index).cloned()
    }

    fn keyboards(&self) -> Vec<usize> {
        self.read().keyboards.keys().copied().collect()
    }

    fn joysticks(&self) -> Vec<(usize, String)> {
        self.read()
            .joysticks
            .iter()
            .map(|(index, state)| (*index, state.name.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(keys: &[Key]) -> KeyboardState {
        KeyboardState {
            pressed: keys.iter().copied().collect(),
        }
    }

    #[test]
    fn all_keyboards_is_union() {
        let hub = DeviceHub::new();
        hub.update_keyboard(1, keys(&[Key::A]));
        hub.update_keyboard(2, keys(&[Key::B]));

        let union = hub.keyboard(ALL_KEYBOARDS_INDEX);
        assert!(union.is_key_down(Key::A));
        assert!(union.is_key_down(Key::B));
        assert!(!hub.keyboard(1).is_key_down(Key::B));
        assert_eq!(hub.keyboards(), vec![1, 2]);
    }

    #[test]
    fn out_of_range_keyboards_are_ignored() {
        let hub = DeviceHub::new();
        hub.update_keyboard(0, keys(&[Key::A]));
        hub.update_keyboard(MAX_KEYBOARDS + 1, keys(&[Key::A]));

        assert!(hub.keyboards().is_empty());
        assert!(!hub.keyboard(ALL_KEYBOARDS_INDEX).is_any_key_down());
    }

    #[test]
    fn joysticks_enumerate_by_index() {
        let hub = DeviceHub::new();
        hub.update_joystick(
            3,
            JoystickState {
                name: "Pad".into(),
                ..Default::default()
            },
        );
        hub.update_joystick(1, JoystickState::default());

        let listed: Vec<usize> = hub.joysticks().into_iter().map(|(i, _)| i).collect();
        assert_eq!(listed, vec![1, 3]);

        hub.remove_joystick(3);
        assert!(hub.joystick(3).is_none());
    }
}
