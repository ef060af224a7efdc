use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use tracing::{debug, info, warn};

use super::controls::LogicalControl;
use super::slots::{controller_slot, invert_slot, keyboard_slot};
use crate::controller::capture::{CaptureOutcome, CaptureReport, CaptureRequest, CaptureTarget};
use crate::controller::device_poller::{InputSource, MAX_KEYBOARDS};
use crate::hid::{
    ControllerConfig, ControllerInputId, ControllerType, InputConfig, Key, KeyboardConfig,
    PlayerIndex, ALL_KEYBOARDS_INDEX,
};
use crate::persistence::{ConfigError, ConfigPortal, DeviceClass, ProfileEntry, ProfileError, ProfileStore};

pub const UNBOUND_LABEL: &str = "Unbound";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputDevice {
    Disabled,
    /// Keyboard index, `ALL_KEYBOARDS_INDEX` for every keyboard
    Keyboard(usize),
    Controller(usize),
}

impl InputDevice {
    pub fn class(&self) -> Option<DeviceClass> {
        match self {
            InputDevice::Disabled => None,
            InputDevice::Keyboard(_) => Some(DeviceClass::Keyboard),
            InputDevice::Controller(_) => Some(DeviceClass::Controller),
        }
    }

    fn of(config: &InputConfig) -> Self {
        match config {
            InputConfig::Keyboard(keyboard) => InputDevice::Keyboard(keyboard.index),
            InputConfig::Controller(controller) => InputDevice::Controller(controller.index),
        }
    }
}

/// One entry of the device selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOption {
    pub device: InputDevice,
    pub label: String,
    pub connected: bool,
}

impl DeviceOption {
    fn connected(device: InputDevice, label: String) -> Self {
        Self {
            device,
            label,
            connected: true,
        }
    }
}

impl fmt::Display for DeviceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.connected {
            write!(f, "{}", self.label)
        } else {
            write!(f, "{} (disconnected)", self.label)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("'{label}' is not a valid binding for {control}")]
    InvalidBinding {
        control: LogicalControl,
        label: String,
    },

    #[error("No controller type selected")]
    MissingControllerType,

    #[error("{field} must be between 0 and 1, got {value}")]
    OutOfRange { field: &'static str, value: f32 },

    #[error("No input device selected")]
    DeviceDisabled,

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// User intent coming from the binding window
#[derive(Debug, Clone, PartialEq)]
pub enum DialogAction {
    RefreshDevices,
    SelectDevice(InputDevice),
    SelectControllerType(ControllerType),
    BeginCapture(LogicalControl),
    CaptureFinished(CaptureReport),
    SetInvert(LogicalControl, bool),
    SetDeadzoneLeft(f32),
    SetDeadzoneRight(f32),
    SetTriggerThreshold(f32),
    SelectProfile(usize),
    LoadProfile,
    SaveProfile(String),
    RemoveProfile,
    DeleteProfileConfirmed,
    DeleteProfileCancelled,
    Save,
    Close,
}

/// What the window has to do after an action
#[derive(Debug, Clone, PartialEq)]
pub enum DialogEffect {
    None,
    StartCapture(CaptureRequest),
    CancelCapture,
    ConfirmDelete { name: String },
    ShowError(String),
    Saved,
    Closed,
}

/// Collaborators the dialog reads from and writes to
pub struct DialogContext<'a> {
    pub portal: &'a mut ConfigPortal,
    pub store: &'a ProfileStore,
    pub source: &'a dyn InputSource,
}

/// Toolkit independent state of the controller binding window of one player.
#[derive(Debug, Clone)]
pub struct BindingDialog {
    player: PlayerIndex,
    original: Option<InputConfig>,
    devices: Vec<DeviceOption>,
    device: InputDevice,
    controller_type: Option<ControllerType>,
    labels: BTreeMap<LogicalControl, String>,
    inverted: BTreeSet<LogicalControl>,
    deadzone_left: f32,
    deadzone_right: f32,
    trigger_threshold: f32,
    profiles: Vec<ProfileEntry>,
    selected_profile: Option<usize>,
    capturing: Option<LogicalControl>,
    pending_delete: Option<ProfileEntry>,
}

impl BindingDialog {
    /// Opens the dialog for `player`, preselecting the device of its current
    /// configuration.
    pub fn open(player: PlayerIndex, ctx: &mut DialogContext<'_>) -> Self {
        let original = ctx.portal.input_config(player).cloned();
        let mut dialog = Self {
            player,
            device: original.as_ref().map(InputDevice::of).unwrap_or(InputDevice::Disabled),
            controller_type: original.as_ref().map(InputConfig::controller_type),
            original,
            devices: Vec::new(),
            labels: BTreeMap::new(),
            inverted: BTreeSet::new(),
            deadzone_left: 0.0,
            deadzone_right: 0.0,
            trigger_threshold: 0.0,
            profiles: Vec::new(),
            selected_profile: None,
            capturing: None,
            pending_delete: None,
        };

        dialog.refresh_devices(ctx.source);
        dialog.clear_values();
        if dialog.device != InputDevice::Disabled {
            dialog.reload_profiles(ctx.store);
            if let Some(original) = dialog.original.clone() {
                dialog.set_values(&original);
            }
        }

        info!("Opened binding dialog for {} on {:?}", player, dialog.device);
        dialog
    }

    pub fn update(&mut self, action: DialogAction, ctx: &mut DialogContext<'_>) -> DialogEffect {
        debug!("Binding dialog {}: {:?}", self.player, action);
        match action {
            DialogAction::RefreshDevices => {
                self.refresh_devices(ctx.source);
                DialogEffect::None
            }
            DialogAction::SelectDevice(device) => self.select_device(device, ctx.store),
            DialogAction::SelectControllerType(controller_type) => {
                self.controller_type = Some(controller_type);
                DialogEffect::None
            }
            DialogAction::BeginCapture(control) => self.begin_capture(control),
            DialogAction::CaptureFinished(report) => {
                self.finish_capture(report);
                DialogEffect::None
            }
            DialogAction::SetInvert(control, inverted) => {
                if matches!(
                    control,
                    LogicalControl::LeftStickX
                        | LogicalControl::LeftStickY
                        | LogicalControl::RightStickX
                        | LogicalControl::RightStickY
                ) {
                    if inverted {
                        self.inverted.insert(control);
                    } else {
                        self.inverted.remove(&control);
                    }
                }
                DialogEffect::None
            }
            DialogAction::SetDeadzoneLeft(value) => {
                self.deadzone_left = value;
                DialogEffect::None
            }
            DialogAction::SetDeadzoneRight(value) => {
                self.deadzone_right = value;
                DialogEffect::None
            }
            DialogAction::SetTriggerThreshold(value) => {
                self.trigger_threshold = value;
                DialogEffect::None
            }
            DialogAction::SelectProfile(index) => {
                if index < self.profiles.len() {
                    self.selected_profile = Some(index);
                }
                DialogEffect::None
            }
            DialogAction::LoadProfile => {
                self.load_profile(ctx.store);
                DialogEffect::None
            }
            DialogAction::SaveProfile(name) => self.save_profile(&name, ctx.store),
            DialogAction::RemoveProfile => self.request_delete(),
            DialogAction::DeleteProfileConfirmed => self.delete_profile(ctx.store),
            DialogAction::DeleteProfileCancelled => {
                self.pending_delete = None;
                DialogEffect::None
            }
            DialogAction::Save => self.save(ctx.portal),
            DialogAction::Close => {
                self.capturing = None;
                DialogEffect::Closed
            }
        }
    }

    fn refresh_devices(&mut self, source: &dyn InputSource) {
        let mut devices = vec![
            DeviceOption::connected(InputDevice::Disabled, "Disabled".to_string()),
            DeviceOption::connected(
                InputDevice::Keyboard(ALL_KEYBOARDS_INDEX),
                "All keyboards".to_string(),
            ),
        ];
        devices.extend(
            source
                .keyboards()
                .into_iter()
                .filter(|index| (1..=MAX_KEYBOARDS).contains(index))
                .map(|index| {
                    DeviceOption::connected(
                        InputDevice::Keyboard(index),
                        format!("Keyboard/{}", index),
                    )
                }),
        );
        devices.extend(source.joysticks().into_iter().map(|(index, name)| {
            DeviceOption::connected(
                InputDevice::Controller(index),
                format!("Controller/{} ({})", index, name),
            )
        }));

        if !devices.iter().any(|option| option.device == self.device) {
            let label = match self.device {
                InputDevice::Keyboard(index) => format!("Keyboard/{}", index),
                InputDevice::Controller(index) => format!("Controller/{}", index),
                InputDevice::Disabled => "Disabled".to_string(),
            };
            debug!("Configured device {} is not connected", label);
            devices.push(DeviceOption {
                device: self.device,
                label,
                connected: false,
            });
        }

        self.devices = devices;
    }

    fn select_device(&mut self, device: InputDevice, store: &ProfileStore) -> DialogEffect {
        let was_capturing = self.capturing.take().is_some();
        self.device = device;
        self.pending_delete = None;
        self.clear_values();

        if device == InputDevice::Disabled {
            self.profiles.clear();
            self.selected_profile = None;
        } else {
            self.reload_profiles(store);
        }

        if was_capturing {
            DialogEffect::CancelCapture
        } else {
            DialogEffect::None
        }
    }

    fn clear_values(&mut self) {
        self.labels = LogicalControl::all()
            .map(|control| (control, UNBOUND_LABEL.to_string()))
            .collect();
        self.inverted.clear();
        self.deadzone_left = 0.0;
        self.deadzone_right = 0.0;
        self.trigger_threshold = 0.0;
    }

    fn set_values(&mut self, config: &InputConfig) {
        match (config, self.device.class()) {
            (InputConfig::Keyboard(keyboard), Some(DeviceClass::Keyboard)) => {
                let mut keyboard = keyboard.clone();
                self.controller_type = Some(keyboard.controller_type);
                for control in LogicalControl::all() {
                    if let Some(key) = keyboard_slot(&mut keyboard, control) {
                        self.labels.insert(control, key.to_string());
                    }
                }
            }
            (InputConfig::Controller(controller), Some(DeviceClass::Controller)) => {
                let mut controller = controller.clone();
                self.controller_type = Some(controller.controller_type);
                self.inverted.clear();
                for control in LogicalControl::all() {
                    if let Some(id) = controller_slot(&mut controller, control) {
                        self.labels.insert(control, id.to_string());
                    }
                    if invert_slot(&mut controller, control).is_some_and(|inverted| *inverted) {
                        self.inverted.insert(control);
                    }
                }
                self.deadzone_left = controller.deadzone_left;
                self.deadzone_right = controller.deadzone_right;
                self.trigger_threshold = controller.trigger_threshold;
            }
            (config, class) => {
                debug!(
                    "Ignoring {:?} configuration for device class {:?}",
                    DeviceClass::of(config),
                    class
                );
            }
        }
    }

    fn begin_capture(&mut self, control: LogicalControl) -> DialogEffect {
        if self.capturing.is_some() {
            debug!("Capture already running, ignoring {}", control);
            return DialogEffect::None;
        }

        let target = match self.device {
            InputDevice::Disabled => return DialogEffect::None,
            InputDevice::Keyboard(index) => CaptureTarget::Keyboard { index },
            InputDevice::Controller(index) => CaptureTarget::Controller {
                index,
                trigger_threshold: self.trigger_threshold,
            },
        };

        self.capturing = Some(control);
        DialogEffect::StartCapture(CaptureRequest { control, target })
    }

    fn finish_capture(&mut self, report: CaptureReport) {
        if self.capturing != Some(report.control) {
            debug!("Dropping stale capture report for {}", report.control);
            return;
        }
        self.capturing = None;

        if let CaptureOutcome::Bound(binding) = report.outcome {
            self.labels.insert(report.control, binding.to_string());
        }
    }

    fn reload_profiles(&mut self, store: &ProfileStore) {
        self.selected_profile = None;
        let Some(class) = self.device.class() else {
            self.profiles.clear();
            return;
        };
        match store.list(class) {
            Ok(profiles) => self.profiles = profiles,
            Err(e) => {
                warn!("Failed to list profiles: {}", e);
                self.profiles = vec![ProfileEntry::Default];
            }
        }
    }

    fn load_profile(&mut self, store: &ProfileStore) {
        let (Some(class), Some(index)) = (self.device.class(), self.selected_profile) else {
            return;
        };
        let Some(entry) = self.profiles.get(index).cloned() else {
            return;
        };

        match store.load(class, &entry) {
            Ok(config) => {
                info!("Loaded profile {}", entry);
                self.set_values(&config);
            }
            Err(ProfileError::Missing(path)) => {
                warn!("Profile {} vanished, dropping it from the list", path.display());
                self.profiles.remove(index);
                self.selected_profile = None;
            }
            Err(e) => {
                warn!("Profile {} not applied: {}", entry, e);
            }
        }
    }

    fn save_profile(&mut self, name: &str, store: &ProfileStore) -> DialogEffect {
        if self.device == InputDevice::Disabled {
            return DialogEffect::None;
        }
        let config = match self.build_config() {
            Ok(config) => config,
            Err(e) => return DialogEffect::ShowError(invalid_fields_message(&e)),
        };

        match store.save(name, &config) {
            Ok(saved) => {
                self.reload_profiles(store);
                self.selected_profile = self.profiles.iter().position(|entry| *entry == saved);
                DialogEffect::None
            }
            Err(ProfileError::InvalidName(_)) => DialogEffect::ShowError(
                "The file name contains invalid characters. Please try again.".to_string(),
            ),
            Err(e) => DialogEffect::ShowError(e.to_string()),
        }
    }

    fn request_delete(&mut self) -> DialogEffect {
        if self.device == InputDevice::Disabled {
            return DialogEffect::None;
        }
        let Some(entry) = self.selected_profile.and_then(|index| self.profiles.get(index)) else {
            return DialogEffect::None;
        };
        if entry.is_default() {
            return DialogEffect::None;
        }

        let name = entry.to_string();
        self.pending_delete = Some(entry.clone());
        DialogEffect::ConfirmDelete { name }
    }

    fn delete_profile(&mut self, store: &ProfileStore) -> DialogEffect {
        let (Some(entry), Some(class)) = (self.pending_delete.take(), self.device.class()) else {
            return DialogEffect::None;
        };

        let effect = match store.delete(class, &entry) {
            Ok(()) | Err(ProfileError::Missing(_)) => DialogEffect::None,
            Err(e) => DialogEffect::ShowError(e.to_string()),
        };
        self.reload_profiles(store);
        effect
    }

    /// Builds the configuration described by the current fields.
    pub fn build_config(&self) -> Result<InputConfig, DialogError> {
        let controller_type = self.controller_type.ok_or(DialogError::MissingControllerType)?;

        match self.device {
            InputDevice::Disabled => Err(DialogError::DeviceDisabled),
            InputDevice::Keyboard(index) => {
                let mut keyboard = KeyboardConfig::default_profile();
                keyboard.index = index;
                keyboard.controller_type = controller_type;
                keyboard.player_index = self.player;
                for control in LogicalControl::all() {
                    if let Some(slot) = keyboard_slot(&mut keyboard, control) {
                        *slot = self.parse_label::<Key>(control)?;
                    }
                }
                Ok(InputConfig::Keyboard(keyboard))
            }
            InputDevice::Controller(index) => {
                let mut controller = ControllerConfig::default_profile();
                controller.index = index;
                controller.controller_type = controller_type;
                controller.player_index = self.player;
                controller.deadzone_left = unit_range("Left deadzone", self.deadzone_left)?;
                controller.deadzone_right = unit_range("Right deadzone", self.deadzone_right)?;
                controller.trigger_threshold =
                    unit_range("Trigger threshold", self.trigger_threshold)?;
                for control in LogicalControl::all() {
                    if let Some(slot) = controller_slot(&mut controller, control) {
                        *slot = self.parse_label::<ControllerInputId>(control)?;
                    }
                    if let Some(inverted) = invert_slot(&mut controller, control) {
                        *inverted = self.inverted.contains(&control);
                    }
                }
                Ok(InputConfig::Controller(controller))
            }
        }
    }

    fn parse_label<T: FromStr>(&self, control: LogicalControl) -> Result<T, DialogError> {
        let label = self.label(control);
        label.parse().map_err(|_| DialogError::InvalidBinding {
            control,
            label: label.to_string(),
        })
    }

    fn save(&mut self, portal: &mut ConfigPortal) -> DialogEffect {
        let built = match self.device {
            InputDevice::Disabled => None,
            _ => match self.build_config() {
                Ok(config) => Some(config),
                Err(e) => return DialogEffect::ShowError(invalid_fields_message(&e)),
            },
        };

        let player = self.player;
        let configs = portal.input_configs_mut();
        let existing = configs
            .iter()
            .position(|config| config.player_index() == player);

        match (built, existing) {
            (None, Some(position)) => {
                info!("Removing input configuration of {}", player);
                configs.remove(position);
            }
            (None, None) => {}
            (Some(config), Some(position)) => {
                info!("Replacing input configuration of {}", player);
                configs[position] = config;
            }
            (Some(config), None) => {
                info!("Adding input configuration for {}", player);
                configs.push(config);
            }
        }
        self.original = portal.input_config(player).cloned();

        match portal.save() {
            Ok(()) => DialogEffect::Saved,
            Err(e) => DialogEffect::ShowError(DialogError::from(e).to_string()),
        }
    }

    pub fn player(&self) -> PlayerIndex {
        self.player
    }

    pub fn devices(&self) -> &[DeviceOption] {
        &self.devices
    }

    pub fn device(&self) -> InputDevice {
        self.device
    }

    pub fn controller_type(&self) -> Option<ControllerType> {
        self.controller_type
    }

    pub fn label(&self, control: LogicalControl) -> &str {
        self.labels
            .get(&control)
            .map(String::as_str)
            .unwrap_or(UNBOUND_LABEL)
    }

    pub fn is_inverted(&self, control: LogicalControl) -> bool {
        self.inverted.contains(&control)
    }

    pub fn deadzone_left(&self) -> f32 {
        self.deadzone_left
    }

    pub fn deadzone_right(&self) -> f32 {
        self.deadzone_right
    }

    pub fn trigger_threshold(&self) -> f32 {
        self.trigger_threshold
    }

    pub fn profiles(&self) -> &[ProfileEntry] {
        &self.profiles
    }

    pub fn selected_profile(&self) -> Option<usize> {
        self.selected_profile
    }

    pub fn capturing(&self) -> Option<LogicalControl> {
        self.capturing
    }

    /// Whether the binding rows and tuning widgets are shown at all
    pub fn shows_settings(&self) -> bool {
        self.device != InputDevice::Disabled
    }

    pub fn is_control_visible(&self, control: LogicalControl) -> bool {
        match self.device.class() {
            None => false,
            Some(class) => control.is_visible(class == DeviceClass::Keyboard, self.controller_type),
        }
    }

    /// Deadzones and trigger threshold only apply to controllers
    pub fn shows_tuning(&self) -> bool {
        matches!(self.device, InputDevice::Controller(_))
    }
}

fn unit_range(field: &'static str, value: f32) -> Result<f32, DialogError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DialogError::OutOfRange { field, value })
    }
}

fn invalid_fields_message(error: &DialogError) -> String {
    format!(
        "Some fields entered were invalid and therefore your config was not saved.\n{}",
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::capture::Binding;
    use crate::controller::device_poller::{DeviceHub, JoystickState, KeyboardState};
    use crate::hid::HatDirection;
    use crate::persistence::config_portal::CONFIG_FILE_NAME;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _tmp: TempDir,
        portal: ConfigPortal,
        store: ProfileStore,
        hub: DeviceHub,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempdir().unwrap();
            let portal =
                ConfigPortal::load_or_create(None, tmp.path().join(CONFIG_FILE_NAME)).unwrap();
            let store = ProfileStore::new(tmp.path());
            let hub = DeviceHub::new();
            hub.update_keyboard(1, KeyboardState::default());
            hub.update_joystick(
                0,
                JoystickState {
                    name: "Test Pad".to_string(),
                    ..Default::default()
                },
            );
            Self {
                _tmp: tmp,
                portal,
                store,
                hub,
            }
        }

        fn ctx(&mut self) -> DialogContext<'_> {
            DialogContext {
                portal: &mut self.portal,
                store: &self.store,
                source: &self.hub,
            }
        }
    }

    fn bound(control: LogicalControl, binding: Binding) -> DialogAction {
        DialogAction::CaptureFinished(CaptureReport {
            control,
            outcome: CaptureOutcome::Bound(binding),
        })
    }

    #[test]
    fn opens_with_existing_keyboard_config() {
        let mut fx = Fixture::new();
        let dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());

        assert_eq!(dialog.device(), InputDevice::Keyboard(0));
        assert_eq!(dialog.controller_type(), Some(ControllerType::JoyconPair));
        assert_eq!(dialog.label(LogicalControl::LeftStickUp), "W");
        assert_eq!(dialog.label(LogicalControl::LeftStickX), UNBOUND_LABEL);
        assert_eq!(dialog.profiles(), &[ProfileEntry::Default]);
    }

    #[test]
    fn device_list_contains_fixed_and_connected_entries() {
        let mut fx = Fixture::new();
        let dialog = BindingDialog::open(PlayerIndex::Player2, &mut fx.ctx());

        let labels: Vec<String> = dialog.devices().iter().map(|d| d.to_string()).collect();
        assert_eq!(
            labels,
            vec!["Disabled", "All keyboards", "Keyboard/1", "Controller/0 (Test Pad)"]
        );
        assert_eq!(dialog.device(), InputDevice::Disabled);
        assert!(!dialog.shows_settings());
    }

    #[test]
    fn disconnected_configured_device_is_listed() {
        let mut fx = Fixture::new();
        let mut pad = ControllerConfig::default_profile();
        pad.index = 5;
        pad.player_index = PlayerIndex::Player2;
        fx.portal.input_configs_mut().push(InputConfig::Controller(pad));

        let dialog = BindingDialog::open(PlayerIndex::Player2, &mut fx.ctx());
        let last = dialog.devices().last().unwrap();
        assert_eq!(last.device, InputDevice::Controller(5));
        assert!(!last.connected);
        assert_eq!(dialog.label(LogicalControl::A), "Button1");
        assert_eq!(dialog.trigger_threshold(), 0.5);
    }

    #[test]
    fn visibility_follows_device_and_type() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        assert!(dialog.is_control_visible(LogicalControl::LeftStickUp));
        assert!(!dialog.is_control_visible(LogicalControl::LeftStickX));
        assert!(!dialog.shows_tuning());
        assert!(!dialog.is_control_visible(LogicalControl::LeftSL));

        dialog.update(
            DialogAction::SelectControllerType(ControllerType::JoyconLeft),
            &mut fx.ctx(),
        );
        assert!(dialog.is_control_visible(LogicalControl::LeftSL));
        assert!(!dialog.is_control_visible(LogicalControl::RightSL));

        dialog.update(DialogAction::SelectDevice(InputDevice::Controller(0)), &mut fx.ctx());
        assert!(dialog.shows_tuning());
        assert!(dialog.is_control_visible(LogicalControl::LeftStickX));
        assert!(!dialog.is_control_visible(LogicalControl::LeftStickUp));
    }

    #[test]
    fn changing_device_clears_values_and_cancels_capture() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        let effect = dialog.update(DialogAction::BeginCapture(LogicalControl::A), &mut fx.ctx());
        assert!(matches!(effect, DialogEffect::StartCapture(_)));

        let effect = dialog.update(
            DialogAction::SelectDevice(InputDevice::Controller(0)),
            &mut fx.ctx(),
        );
        assert_eq!(effect, DialogEffect::CancelCapture);
        assert_eq!(dialog.capturing(), None);
        assert_eq!(dialog.label(LogicalControl::LeftStickUp), UNBOUND_LABEL);
        assert_eq!(dialog.deadzone_left(), 0.0);
    }

    #[test]
    fn capture_latch_blocks_second_trigger() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());

        let first = dialog.update(DialogAction::BeginCapture(LogicalControl::A), &mut fx.ctx());
        assert_eq!(
            first,
            DialogEffect::StartCapture(CaptureRequest {
                control: LogicalControl::A,
                target: CaptureTarget::Keyboard { index: 0 },
            })
        );
        let second = dialog.update(DialogAction::BeginCapture(LogicalControl::B), &mut fx.ctx());
        assert_eq!(second, DialogEffect::None);
        assert_eq!(dialog.capturing(), Some(LogicalControl::A));
    }

    #[test]
    fn bound_capture_writes_canonical_label() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        dialog.update(DialogAction::SelectDevice(InputDevice::Controller(0)), &mut fx.ctx());

        dialog.update(DialogAction::BeginCapture(LogicalControl::DpadUp), &mut fx.ctx());
        dialog.update(
            bound(
                LogicalControl::DpadUp,
                Binding::Controller(ControllerInputId::Hat(0, HatDirection::Up)),
            ),
            &mut fx.ctx(),
        );

        assert_eq!(dialog.label(LogicalControl::DpadUp), "Hat0Up");
        assert_eq!(dialog.capturing(), None);
    }

    #[test]
    fn cancelled_capture_keeps_previous_label() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());

        for control in LogicalControl::all() {
            let before = dialog.label(control).to_string();
            dialog.update(DialogAction::BeginCapture(control), &mut fx.ctx());
            dialog.update(
                DialogAction::CaptureFinished(CaptureReport {
                    control,
                    outcome: CaptureOutcome::Cancelled,
                }),
                &mut fx.ctx(),
            );
            assert_eq!(dialog.label(control), before);
            assert_eq!(dialog.capturing(), None);
        }
    }

    #[test]
    fn stale_report_is_ignored() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        dialog.update(bound(LogicalControl::A, Binding::Key(Key::M)), &mut fx.ctx());
        assert_eq!(dialog.label(LogicalControl::A), "Z");
    }

    #[test]
    fn save_replaces_entry_in_place() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        dialog.update(DialogAction::BeginCapture(LogicalControl::A), &mut fx.ctx());
        dialog.update(bound(LogicalControl::A, Binding::Key(Key::Space)), &mut fx.ctx());

        assert_eq!(dialog.update(DialogAction::Save, &mut fx.ctx()), DialogEffect::Saved);

        let configs = &fx.portal.config().hid.input_config;
        assert_eq!(configs.len(), 1);
        match &configs[0] {
            InputConfig::Keyboard(keyboard) => assert_eq!(keyboard.right_joycon.button_a, Key::Space),
            other => panic!("unexpected {:?}", other),
        }

        let on_disk = ConfigPortal::load(fx.portal.path()).unwrap();
        assert_eq!(on_disk.hid.input_config, *configs);
    }

    #[test]
    fn save_appends_for_new_player() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player2, &mut fx.ctx());
        dialog.update(DialogAction::SelectDevice(InputDevice::Controller(0)), &mut fx.ctx());
        dialog.update(DialogAction::SelectProfile(0), &mut fx.ctx());
        dialog.update(DialogAction::LoadProfile, &mut fx.ctx());

        assert_eq!(dialog.update(DialogAction::Save, &mut fx.ctx()), DialogEffect::Saved);
        let configs = &fx.portal.config().hid.input_config;
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[1].player_index(), PlayerIndex::Player2);
        assert_eq!(configs[1].controller_type(), ControllerType::ProController);
    }

    #[test]
    fn disabled_save_removes_exactly_one_entry() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        dialog.update(DialogAction::SelectDevice(InputDevice::Disabled), &mut fx.ctx());

        assert_eq!(dialog.update(DialogAction::Save, &mut fx.ctx()), DialogEffect::Saved);
        assert!(fx.portal.config().hid.input_config.is_empty());

        let mut other = BindingDialog::open(PlayerIndex::Player3, &mut fx.ctx());
        assert_eq!(other.update(DialogAction::Save, &mut fx.ctx()), DialogEffect::Saved);
        assert!(fx.portal.config().hid.input_config.is_empty());
    }

    #[test]
    fn invalid_fields_abort_save() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        dialog.update(DialogAction::SelectDevice(InputDevice::Controller(0)), &mut fx.ctx());
        dialog.update(DialogAction::SetTriggerThreshold(1.5), &mut fx.ctx());

        let before = fx.portal.config().hid.input_config.clone();
        let effect = dialog.update(DialogAction::Save, &mut fx.ctx());
        assert!(matches!(effect, DialogEffect::ShowError(_)));
        assert_eq!(fx.portal.config().hid.input_config, before);
    }

    #[test]
    fn missing_controller_type_aborts_save() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player4, &mut fx.ctx());
        dialog.update(DialogAction::SelectDevice(InputDevice::Keyboard(1)), &mut fx.ctx());

        assert!(matches!(
            dialog.build_config(),
            Err(DialogError::MissingControllerType)
        ));
        let effect = dialog.update(DialogAction::Save, &mut fx.ctx());
        assert!(matches!(effect, DialogEffect::ShowError(_)));
        assert_eq!(fx.portal.config().hid.input_config.len(), 1);
    }

    #[test]
    fn profile_save_load_and_delete() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        dialog.update(DialogAction::BeginCapture(LogicalControl::ZL), &mut fx.ctx());
        dialog.update(bound(LogicalControl::ZL, Binding::Key(Key::Number1)), &mut fx.ctx());

        let effect = dialog.update(DialogAction::SaveProfile("Couch".into()), &mut fx.ctx());
        assert_eq!(effect, DialogEffect::None);
        assert_eq!(dialog.profiles().len(), 2);
        assert_eq!(dialog.selected_profile(), Some(1));

        // Reset to defaults, then load the saved profile back
        dialog.update(DialogAction::SelectProfile(0), &mut fx.ctx());
        dialog.update(DialogAction::LoadProfile, &mut fx.ctx());
        assert_eq!(dialog.label(LogicalControl::ZL), "Q");
        dialog.update(DialogAction::SelectProfile(1), &mut fx.ctx());
        dialog.update(DialogAction::LoadProfile, &mut fx.ctx());
        assert_eq!(dialog.label(LogicalControl::ZL), "Number1");

        let effect = dialog.update(DialogAction::RemoveProfile, &mut fx.ctx());
        assert_eq!(
            effect,
            DialogEffect::ConfirmDelete {
                name: "Couch".to_string()
            }
        );
        dialog.update(DialogAction::DeleteProfileConfirmed, &mut fx.ctx());
        assert_eq!(dialog.profiles(), &[ProfileEntry::Default]);
        assert!(!fx.store.dir(DeviceClass::Keyboard).join("Couch.json").exists());
    }

    #[test]
    fn default_profile_cannot_be_removed() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        assert_eq!(dialog.update(DialogAction::RemoveProfile, &mut fx.ctx()), DialogEffect::None);
        dialog.update(DialogAction::SelectProfile(0), &mut fx.ctx());
        assert_eq!(dialog.update(DialogAction::RemoveProfile, &mut fx.ctx()), DialogEffect::None);
    }

    #[test]
    fn invalid_profile_name_writes_nothing() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());

        let effect = dialog.update(DialogAction::SaveProfile("a/b".into()), &mut fx.ctx());
        assert!(matches!(effect, DialogEffect::ShowError(_)));
        let dir = fx.store.dir(DeviceClass::Keyboard);
        assert_eq!(fs::read_dir(dir).unwrap().count(), 0);
    }

    #[test]
    fn malformed_profile_leaves_fields_unchanged() {
        let mut fx = Fixture::new();
        let dir = fx.store.dir(DeviceClass::Keyboard);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("junk.json"), "{\"left_joycon\": 12}").unwrap();

        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        let labels_before: Vec<String> = LogicalControl::all()
            .map(|c| dialog.label(c).to_string())
            .collect();

        dialog.update(DialogAction::SelectProfile(1), &mut fx.ctx());
        let effect = dialog.update(DialogAction::LoadProfile, &mut fx.ctx());

        assert_eq!(effect, DialogEffect::None);
        let labels_after: Vec<String> = LogicalControl::all()
            .map(|c| dialog.label(c).to_string())
            .collect();
        assert_eq!(labels_before, labels_after);
        assert_eq!(dialog.profiles().len(), 2);
    }

    #[test]
    fn vanished_profile_is_dropped_from_list() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        dialog.update(DialogAction::SaveProfile("temp".into()), &mut fx.ctx());
        fs::remove_file(fx.store.dir(DeviceClass::Keyboard).join("temp.json")).unwrap();

        dialog.update(DialogAction::SelectProfile(1), &mut fx.ctx());
        dialog.update(DialogAction::LoadProfile, &mut fx.ctx());
        assert_eq!(dialog.profiles(), &[ProfileEntry::Default]);
        assert_eq!(dialog.selected_profile(), None);
    }

    #[test]
    fn controller_capture_carries_trigger_threshold() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        dialog.update(DialogAction::SelectDevice(InputDevice::Controller(0)), &mut fx.ctx());
        dialog.update(DialogAction::SetTriggerThreshold(0.8), &mut fx.ctx());

        let effect = dialog.update(DialogAction::BeginCapture(LogicalControl::ZR), &mut fx.ctx());
        assert_eq!(
            effect,
            DialogEffect::StartCapture(CaptureRequest {
                control: LogicalControl::ZR,
                target: CaptureTarget::Controller {
                    index: 0,
                    trigger_threshold: 0.8,
                },
            })
        );
    }

    #[test]
    fn inverted_axes_are_saved() {
        let mut fx = Fixture::new();
        let mut dialog = BindingDialog::open(PlayerIndex::Player1, &mut fx.ctx());
        dialog.update(DialogAction::SelectDevice(InputDevice::Controller(0)), &mut fx.ctx());
        dialog.update(DialogAction::SelectProfile(0), &mut fx.ctx());
        dialog.update(DialogAction::LoadProfile, &mut fx.ctx());
        dialog.update(DialogAction::SetInvert(LogicalControl::LeftStickY, true), &mut fx.ctx());
        dialog.update(DialogAction::SetInvert(LogicalControl::A, true), &mut fx.ctx());

        match dialog.build_config().unwrap() {
            InputConfig::Controller(controller) => {
                assert!(controller.left_joycon.invert_stick_y);
                assert!(!controller.left_joycon.invert_stick_x);
                assert_eq!(controller.player_index, PlayerIndex::Player1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
