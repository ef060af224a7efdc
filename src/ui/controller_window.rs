//! Controller binding window, one per player.
//!
//! Pure view over [`BindingDialog`]: every widget interaction becomes a
//! [`DialogAction`] that the shell feeds back through `BindingDialog::update`.

use eframe::egui::{self, Button, ComboBox, RichText, Slider, TextEdit, Ui};
use strum::IntoEnumIterator;

use super::common::{create_frame, UiColors};
use crate::binding::{BindingDialog, DialogAction, JoyconSide, LogicalControl};
use crate::controller::CaptureHandle;
use crate::hid::{ControllerType, PlayerIndex};

pub struct ControllerWindow {
    pub dialog: BindingDialog,
    /// Running capture started from this window
    pub capture: Option<CaptureHandle>,
    profile_name: String,
}

impl ControllerWindow {
    pub fn new(dialog: BindingDialog) -> Self {
        Self {
            dialog,
            capture: None,
            profile_name: String::new(),
        }
    }

    pub fn player(&self) -> PlayerIndex {
        self.dialog.player()
    }

    /// Stops the capture of this window, if any.
    pub fn cancel_capture(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.cancel();
        }
    }

    pub fn render(&mut self, ctx: &egui::Context) -> Vec<DialogAction> {
        let mut actions = Vec::new();
        let mut open = true;

        egui::Window::new(format!("Controller Settings - {}", self.player()))
            .id(egui::Id::new(("controller_window", self.player())))
            .open(&mut open)
            .default_width(640.0)
            .show(ctx, |ui| {
                self.render_device_row(ui, &mut actions);
                if !self.dialog.shows_settings() {
                    ui.label("Input disabled for this player.");
                } else {
                    self.render_profiles(ui, &mut actions);
                    ui.separator();
                    ui.columns(2, |columns| {
                        self.render_side(&mut columns[0], JoyconSide::Left, &mut actions);
                        self.render_side(&mut columns[1], JoyconSide::Right, &mut actions);
                    });
                    if self.dialog.shows_tuning() {
                        ui.separator();
                        self.render_tuning(ui, &mut actions);
                    }
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        actions.push(DialogAction::Save);
                    }
                    if ui.button("Close").clicked() {
                        actions.push(DialogAction::Close);
                    }
                });
            });

        if !open {
            actions.push(DialogAction::Close);
        }
        actions
    }

    fn render_device_row(&self, ui: &mut Ui, actions: &mut Vec<DialogAction>) {
        ui.horizontal(|ui| {
            let current = self
                .dialog
                .devices()
                .iter()
                .find(|option| option.device == self.dialog.device())
                .map(|option| option.to_string())
                .unwrap_or_default();

            ComboBox::from_label("Input device")
                .selected_text(current)
                .show_ui(ui, |ui| {
                    for option in self.dialog.devices() {
                        let text = if option.connected {
                            RichText::new(option.to_string())
                        } else {
                            RichText::new(option.to_string()).color(UiColors::INACTIVE)
                        };
                        if ui
                            .selectable_label(option.device == self.dialog.device(), text)
                            .clicked()
                        {
                            actions.push(DialogAction::SelectDevice(option.device));
                        }
                    }
                });
            if ui.button("Refresh").clicked() {
                actions.push(DialogAction::RefreshDevices);
            }
        });

        if !self.dialog.shows_settings() {
            return;
        }
        let selected = self
            .dialog
            .controller_type()
            .map(|controller_type| controller_type.label())
            .unwrap_or("Select a controller type");
        ComboBox::from_label("Controller type")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                for controller_type in ControllerType::iter() {
                    let active = self.dialog.controller_type() == Some(controller_type);
                    if ui.selectable_label(active, controller_type.label()).clicked() {
                        actions.push(DialogAction::SelectControllerType(controller_type));
                    }
                }
            });
    }

    fn render_profiles(&mut self, ui: &mut Ui, actions: &mut Vec<DialogAction>) {
        ui.horizontal(|ui| {
            let selected = self
                .dialog
                .selected_profile()
                .and_then(|index| self.dialog.profiles().get(index))
                .map(|entry| entry.to_string())
                .unwrap_or_default();
            ComboBox::from_label("Profile")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for (index, entry) in self.dialog.profiles().iter().enumerate() {
                        let active = self.dialog.selected_profile() == Some(index);
                        if ui.selectable_label(active, entry.to_string()).clicked() {
                            actions.push(DialogAction::SelectProfile(index));
                        }
                    }
                });
            if ui.button("Load").clicked() {
                actions.push(DialogAction::LoadProfile);
            }
            if ui.button("Remove").clicked() {
                actions.push(DialogAction::RemoveProfile);
            }
        });
        ui.horizontal(|ui| {
            ui.add(TextEdit::singleline(&mut self.profile_name).hint_text("Profile name"));
            if ui.button("Save profile").clicked() {
                actions.push(DialogAction::SaveProfile(self.profile_name.trim().to_string()));
            }
        });
    }

    fn render_side(&self, ui: &mut Ui, side: JoyconSide, actions: &mut Vec<DialogAction>) {
        let title = match side {
            JoyconSide::Left => "Left Joy-Con",
            JoyconSide::Right => "Right Joy-Con",
        };
        create_frame(UiColors::INNER_BG, UiColors::BORDER).show(ui, |ui| {
            ui.heading(title);
            egui::Grid::new(("bindings", side as u8))
                .num_columns(3)
                .show(ui, |ui| {
                    for control in LogicalControl::all()
                        .filter(|control| control.side() == side)
                        .filter(|control| self.dialog.is_control_visible(*control))
                    {
                        self.render_control(ui, control, actions);
                        ui.end_row();
                    }
                });
        });
    }

    fn render_control(&self, ui: &mut Ui, control: LogicalControl, actions: &mut Vec<DialogAction>) {
        ui.label(control.label());

        let capturing = self.dialog.capturing() == Some(control);
        let button = if capturing {
            Button::new(RichText::new("Press an input...").color(UiColors::ACTIVE))
        } else {
            Button::new(self.dialog.label(control))
        };
        if ui.add_sized([140.0, 20.0], button).clicked() {
            actions.push(DialogAction::BeginCapture(control));
        }

        if matches!(
            control,
            LogicalControl::LeftStickX
                | LogicalControl::LeftStickY
                | LogicalControl::RightStickX
                | LogicalControl::RightStickY
        ) {
            let mut inverted = self.dialog.is_inverted(control);
            if ui.checkbox(&mut inverted, "Invert").changed() {
                actions.push(DialogAction::SetInvert(control, inverted));
            }
        } else {
            ui.label("");
        }
    }

    fn render_tuning(&self, ui: &mut Ui, actions: &mut Vec<DialogAction>) {
        let mut deadzone_left = self.dialog.deadzone_left();
        if ui
            .add(Slider::new(&mut deadzone_left, 0.0..=1.0).text("Left deadzone"))
            .changed()
        {
            actions.push(DialogAction::SetDeadzoneLeft(deadzone_left));
        }

        let mut deadzone_right = self.dialog.deadzone_right();
        if ui
            .add(Slider::new(&mut deadzone_right, 0.0..=1.0).text("Right deadzone"))
            .changed()
        {
            actions.push(DialogAction::SetDeadzoneRight(deadzone_right));
        }

        let mut trigger_threshold = self.dialog.trigger_threshold();
        if ui
            .add(Slider::new(&mut trigger_threshold, 0.0..=1.0).text("Trigger threshold"))
            .changed()
        {
            actions.push(DialogAction::SetTriggerThreshold(trigger_threshold));
        }
    }
}
