//! Shared UI pieces: colors, frames and the modal dialogs.

use std::path::Path;
use std::process::Command;

use eframe::egui::{self, Align2, Color32, Frame, RichText, Stroke};

use crate::hid::PlayerIndex;

pub struct UiColors;

impl UiColors {
    pub const INNER_BG: Color32 = Color32::from_rgb(25, 25, 25);
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);
    /// Capturing button and connected devices
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);
    /// Errors and disconnected devices
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);
}

pub fn create_frame(bg_color: Color32, border_color: Color32) -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, border_color))
        .fill(bg_color)
        .inner_margin(4)
        .outer_margin(2)
}

/// Blocking dialogs shown on top of everything else
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    Error { message: String },
    ConfirmDelete { player: PlayerIndex, name: String },
    About,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalChoice {
    Confirmed,
    Declined,
}

/// Renders `modal`; returns the choice once the user made one.
pub fn show_modal(ctx: &egui::Context, modal: &Modal) -> Option<ModalChoice> {
    let title = match modal {
        Modal::Error { .. } => "Error",
        Modal::ConfirmDelete { .. } => "Delete profile",
        Modal::About => "About",
    };
    let mut choice = None;

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| match modal {
            Modal::Error { message } => {
                ui.label(RichText::new("An error has occurred").color(UiColors::INACTIVE));
                ui.label(message);
                if ui.button("OK").clicked() {
                    choice = Some(ModalChoice::Confirmed);
                }
            }
            Modal::ConfirmDelete { name, .. } => {
                ui.label(format!("Deleting profile \"{}\"", name));
                ui.label("This action is irreversible, are you sure you want to continue?");
                ui.horizontal(|ui| {
                    if ui.button("Yes").clicked() {
                        choice = Some(ModalChoice::Confirmed);
                    }
                    if ui.button("No").clicked() {
                        choice = Some(ModalChoice::Declined);
                    }
                });
            }
            Modal::About => {
                ui.heading(env!("CARGO_PKG_NAME"));
                ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                ui.label("Desktop frontend for a Nintendo Switch emulation core.");
                ui.hyperlink_to("Amiibo API", "https://www.amiiboapi.com");
                if ui.button("Close").clicked() {
                    choice = Some(ModalChoice::Confirmed);
                }
            }
        });

    choice
}

/// Command showing `path` in the platform file manager.
pub fn file_manager_command(path: &Path) -> Command {
    let program = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    let mut command = Command::new(program);
    command.arg(path);
    command
}
