//! Settings window
//!
//! Edits a draft copy of the configuration document. Numeric fields are typed
//! as text and only parsed when saving; one bad field aborts the whole save.

use std::path::PathBuf;

use eframe::egui::{self, ComboBox, ScrollArea, TextEdit, Ui};
use strum::IntoEnumIterator;

use crate::persistence::{AudioBackend, Configuration, Region, SortColumn, SystemLanguage};

const RES_SCALES: [(i32, &str); 5] = [
    (1, "Native (720p/1080p)"),
    (2, "2x (1440p/2160p)"),
    (3, "3x (2160p/3240p)"),
    (4, "4x (2880p/4320p)"),
    (-1, "Custom"),
];

const ANISOTROPY: [(f32, &str); 5] = [
    (-1.0, "Auto (set by game)"),
    (2.0, "2x"),
    (4.0, "4x"),
    (8.0, "8x"),
    (16.0, "16x"),
];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SettingsFormError {
    #[error("{field}: '{text}' is not a valid number")]
    InvalidNumber { field: &'static str, text: String },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOutcome {
    Save,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct SettingsWindow {
    draft: Configuration,
    time_offset_text: String,
    res_scale_custom_text: String,
    new_game_dir: String,
}

impl SettingsWindow {
    pub fn open(config: &Configuration) -> Self {
        Self {
            draft: config.clone(),
            time_offset_text: config.system.system_time_offset.to_string(),
            res_scale_custom_text: config.graphics.res_scale_custom.to_string(),
            new_game_dir: String::new(),
        }
    }

    pub fn add_game_dir(&mut self, dir: PathBuf) -> bool {
        if dir.as_os_str().is_empty() || self.draft.ui.game_dirs.contains(&dir) {
            return false;
        }
        self.draft.ui.game_dirs.push(dir);
        true
    }

    pub fn remove_game_dir(&mut self, index: usize) {
        if index < self.draft.ui.game_dirs.len() {
            self.draft.ui.game_dirs.remove(index);
        }
    }

    /// The configuration to store, with the text fields parsed.
    pub fn build(&self) -> Result<Configuration, SettingsFormError> {
        let mut config = self.draft.clone();

        config.system.system_time_offset = self
            .time_offset_text
            .trim()
            .parse()
            .map_err(|_| SettingsFormError::InvalidNumber {
                field: "System time offset",
                text: self.time_offset_text.clone(),
            })?;

        let custom: f32 = self
            .res_scale_custom_text
            .trim()
            .parse()
            .map_err(|_| SettingsFormError::InvalidNumber {
                field: "Custom resolution scale",
                text: self.res_scale_custom_text.clone(),
            })?;
        if !(custom.is_finite() && custom > 0.0) {
            return Err(SettingsFormError::NotPositive {
                field: "Custom resolution scale",
            });
        }
        config.graphics.res_scale_custom = custom;

        Ok(config)
    }

    pub fn render(&mut self, ctx: &egui::Context) -> Option<SettingsOutcome> {
        let mut outcome = None;
        let mut open = true;

        egui::Window::new("Settings")
            .open(&mut open)
            .default_size([520.0, 560.0])
            .show(ctx, |ui| {
                ScrollArea::vertical().max_height(480.0).show(ui, |ui| {
                    ui.collapsing("General", |ui| self.render_general(ui));
                    ui.collapsing("Input", |ui| {
                        ui.checkbox(&mut self.draft.hid.enable_keyboard, "Enable guest keyboard");
                    });
                    ui.collapsing("System", |ui| self.render_system(ui));
                    ui.collapsing("Graphics", |ui| self.render_graphics(ui));
                    ui.collapsing("Logging", |ui| self.render_logging(ui));
                });

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        outcome = Some(SettingsOutcome::Save);
                    }
                    if ui.button("Cancel").clicked() {
                        outcome = Some(SettingsOutcome::Cancel);
                    }
                });
            });

        if !open {
            outcome = Some(SettingsOutcome::Cancel);
        }
        outcome
    }

    fn render_general(&mut self, ui: &mut Ui) {
        ui.label("Game directories");
        let mut remove = None;
        for (index, dir) in self.draft.ui.game_dirs.iter().enumerate() {
            ui.horizontal(|ui| {
                ui.label(dir.display().to_string());
                if ui.small_button("Remove").clicked() {
                    remove = Some(index);
                }
            });
        }
        if let Some(index) = remove {
            self.remove_game_dir(index);
        }

        ui.horizontal(|ui| {
            ui.add(TextEdit::singleline(&mut self.new_game_dir).hint_text("Directory"));
            if ui.button("Add").clicked() {
                let dir = PathBuf::from(self.new_game_dir.trim());
                if self.add_game_dir(dir) {
                    self.new_game_dir.clear();
                }
            }
            if ui.button("Browse").clicked() {
                if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                    self.add_game_dir(dir);
                }
            }
        });

        ui.separator();
        ui.label("Game table columns");
        ui.horizontal_wrapped(|ui| {
            for column in SortColumn::iter() {
                let mut visible = self.draft.ui.gui_columns.is_visible(column);
                if ui.checkbox(&mut visible, column.header()).changed() {
                    self.draft.ui.gui_columns.toggle(column);
                }
            }
        });

        ui.checkbox(&mut self.draft.ui.enable_custom_theme, "Use custom theme");
        ui.add_enabled(
            self.draft.ui.enable_custom_theme,
            TextEdit::singleline(&mut self.draft.ui.custom_theme_path).hint_text("Theme path"),
        );
    }

    fn render_system(&mut self, ui: &mut Ui) {
        let system = &mut self.draft.system;

        ComboBox::from_label("System language")
            .selected_text(system.language.to_string())
            .show_ui(ui, |ui| {
                for language in SystemLanguage::iter() {
                    ui.selectable_value(&mut system.language, language, language.to_string());
                }
            });
        ComboBox::from_label("Region")
            .selected_text(system.region.to_string())
            .show_ui(ui, |ui| {
                for region in Region::iter() {
                    ui.selectable_value(&mut system.region, region, region.to_string());
                }
            });
        ComboBox::from_label("Audio backend")
            .selected_text(system.audio_backend.to_string())
            .show_ui(ui, |ui| {
                for backend in AudioBackend::iter() {
                    ui.selectable_value(&mut system.audio_backend, backend, backend.to_string());
                }
            });

        ui.horizontal(|ui| {
            ui.label("Time zone");
            ui.text_edit_singleline(&mut system.time_zone);
        });
        ui.horizontal(|ui| {
            ui.label("System time offset (seconds)");
            ui.text_edit_singleline(&mut self.time_offset_text);
        });

        ui.checkbox(&mut system.enable_docked_mode, "Docked mode");
        ui.checkbox(&mut system.enable_multicore_scheduling, "Multicore scheduling");
        ui.checkbox(&mut system.enable_ptc, "Profiled persistent translation cache");
        ui.checkbox(&mut system.enable_fs_integrity_checks, "Filesystem integrity checks");
        ui.checkbox(&mut system.ignore_missing_services, "Ignore missing services");
    }

    fn render_graphics(&mut self, ui: &mut Ui) {
        let graphics = &mut self.draft.graphics;

        let scale_label = RES_SCALES
            .iter()
            .find(|(scale, _)| *scale == graphics.res_scale)
            .map(|(_, label)| *label)
            .unwrap_or("Custom");
        ComboBox::from_label("Resolution scale")
            .selected_text(scale_label)
            .show_ui(ui, |ui| {
                for (scale, label) in RES_SCALES {
                    ui.selectable_value(&mut graphics.res_scale, scale, label);
                }
            });
        ui.add_enabled_ui(graphics.res_scale == -1, |ui| {
            ui.horizontal(|ui| {
                ui.label("Custom scale");
                ui.text_edit_singleline(&mut self.res_scale_custom_text);
            });
        });

        let anisotropy_label = ANISOTROPY
            .iter()
            .find(|(level, _)| *level == graphics.max_anisotropy)
            .map(|(_, label)| *label)
            .unwrap_or("Auto (set by game)");
        ComboBox::from_label("Anisotropic filtering")
            .selected_text(anisotropy_label)
            .show_ui(ui, |ui| {
                for (level, label) in ANISOTROPY {
                    ui.selectable_value(&mut graphics.max_anisotropy, level, label);
                }
            });

        ui.horizontal(|ui| {
            ui.label("Shader dump path");
            ui.text_edit_singleline(&mut graphics.shaders_dump_path);
        });
        ui.checkbox(&mut graphics.enable_vsync, "VSync");
    }

    fn render_logging(&mut self, ui: &mut Ui) {
        let logger = &mut self.draft.logger;
        ui.checkbox(&mut logger.enable_file_log, "Log to file");
        ui.checkbox(&mut logger.enable_debug, "Debug logs");
        ui.checkbox(&mut logger.enable_stub, "Stub logs");
        ui.checkbox(&mut logger.enable_info, "Info logs");
        ui.checkbox(&mut logger.enable_warn, "Warning logs");
        ui.checkbox(&mut logger.enable_error, "Error logs");
        ui.checkbox(&mut logger.enable_guest, "Guest logs");
        ui.checkbox(&mut logger.enable_fs_access_log, "Filesystem access logs");
    }
}
