//! # Shell User Interface
//!
//! eframe application around the game library and the input configuration.
//!
//! ```text
//! background tasks ──► UiDispatcher ──► inbox ──┐
//!                                               ▼
//! egui input ──► DeviceHub          ShellUI::update (UI thread)
//!                                    ├─ game table
//!                                    ├─ controller windows ──► BindingDialog
//!                                    ├─ settings / amiibo windows
//!                                    └─ modals
//! ```
//!
//! The UI thread is the only writer of the configuration document. Work that
//! blocks (directory scans, HTTP, the core process, input capture) runs
//! elsewhere and reports back through the dispatcher inbox, which is drained
//! at the start of every frame.

pub mod amiibo_window;
pub mod common;
pub mod controller_window;
pub mod game_table;
pub mod input_bridge;
pub mod settings_window;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Local;
use eframe::egui;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::amiibo::{self, AmiiboClient, AMIIBO_CACHE_FILE};
use crate::binding::{BindingDialog, DialogAction, DialogContext, DialogEffect};
use crate::config::ShellSettings;
use crate::controller::capture::{CaptureOutcome, CaptureReport};
use crate::controller::{spawn_capture, DeviceHub, InputSource};
use crate::dispatch::{ShellMessage, UiDispatcher};
use crate::hid::PlayerIndex;
use crate::library::{spawn_scan, EmulationCore, LaunchError, LaunchRequest, MetadataStore, GAME_EXTENSIONS};
use crate::persistence::{ColumnSort, ConfigPortal, ProfileStore, SortColumn};
use crate::shutdown::ShutdownHooks;

use self::amiibo_window::{AmiiboOutcome, AmiiboWindow};
use self::common::{file_manager_command, show_modal, Modal, ModalChoice};
use self::controller_window::ControllerWindow;
use self::game_table::{GameTable, TableEvent};
use self::settings_window::{SettingsOutcome, SettingsWindow};

const CAPTURE_REPAINT: Duration = Duration::from_millis(16);

/// Long lived collaborators created in `main`
pub struct ShellServices {
    pub portal: Arc<Mutex<ConfigPortal>>,
    pub store: ProfileStore,
    pub metadata: MetadataStore,
    pub hub: Arc<DeviceHub>,
    pub settings: ShellSettings,
    pub core: Option<Arc<dyn EmulationCore>>,
    pub amiibo: AmiiboClient,
    pub hooks: ShutdownHooks,
}

pub fn lock_portal(portal: &Mutex<ConfigPortal>) -> MutexGuard<'_, ConfigPortal> {
    portal.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ShellUI {
    services: ShellServices,
    dispatcher: UiDispatcher,
    inbox: mpsc::UnboundedReceiver<ShellMessage>,
    table: GameTable,
    controllers: BTreeMap<PlayerIndex, ControllerWindow>,
    settings_window: Option<SettingsWindow>,
    amiibo_window: Option<AmiiboWindow>,
    modal: Option<Modal>,
    running_title: Option<PathBuf>,
    /// Token of the capture in flight, cancelled by the shutdown hooks
    active_capture: Arc<Mutex<Option<CancellationToken>>>,
    status: String,
}

impl ShellUI {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        services: ShellServices,
        dispatcher: UiDispatcher,
        inbox: mpsc::UnboundedReceiver<ShellMessage>,
        startup_title: Option<PathBuf>,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        let dispatcher = dispatcher.with_repaint(cc.egui_ctx.clone());

        let active_capture: Arc<Mutex<Option<CancellationToken>>> = Arc::default();
        let hook_capture = active_capture.clone();
        services.hooks.register("cancel capture", move || {
            let slot = hook_capture.try_lock().ok().and_then(|mut slot| slot.take());
            if let Some(token) = slot {
                token.cancel();
            }
        });
        // try_lock: the panic may have happened while the UI held the lock
        let hook_portal = services.portal.clone();
        services.hooks.register("flush configuration", move || {
            match hook_portal.try_lock() {
                Ok(portal) => {
                    if let Err(e) = portal.save() {
                        error!("Failed to flush configuration: {}", e);
                    }
                }
                Err(_) => warn!("Configuration locked, skipping flush"),
            }
        });

        let mut shell = Self {
            services,
            dispatcher,
            inbox,
            table: GameTable::default(),
            controllers: BTreeMap::new(),
            settings_window: None,
            amiibo_window: None,
            modal: None,
            running_title: None,
            active_capture,
            status: String::new(),
        };

        shell.rescan();
        if let Some(path) = startup_title {
            shell.launch(path);
        }
        shell
    }

    fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.modal = Some(Modal::Error { message });
    }

    fn save_config(&mut self) {
        let result = lock_portal(&self.services.portal).save();
        if let Err(e) = result {
            self.show_error(e.to_string());
        }
    }

    fn column_sort(&self) -> ColumnSort {
        lock_portal(&self.services.portal).config().ui.column_sort
    }

    fn rescan(&mut self) {
        let dirs = lock_portal(&self.services.portal).config().ui.game_dirs.clone();
        match spawn_scan(dirs, self.services.metadata.snapshot(), self.dispatcher.clone()) {
            Ok(_) => self.table.set_loading(),
            Err(e) => self.show_error(e.to_string()),
        }
    }

    fn launch(&mut self, path: PathBuf) {
        if let Some(running) = &self.running_title {
            let message = format!(
                "{} is still running. Close it before starting another title.",
                running.display()
            );
            self.show_error(message);
            return;
        }

        let controllers = lock_portal(&self.services.portal).controller_assignments();
        let result = self
            .services
            .core
            .clone()
            .ok_or(LaunchError::NoCoreConfigured)
            .and_then(|core| {
                let request = LaunchRequest::new(path.clone(), controllers)?;
                core.launch(request, self.dispatcher.clone())
            });
        if let Err(e) = result {
            self.show_error(e.to_string());
            return;
        }

        match self.services.metadata.record_start(&path, Local::now()) {
            Ok(meta) => self.table.apply_metadata(&path, &meta),
            Err(e) => warn!("Failed to record launch of {}: {}", path.display(), e),
        }
        self.status = format!("Running {}", path.display());
        self.running_title = Some(path);
    }

    fn stop_title(&mut self) {
        let Some(core) = self.services.core.clone() else {
            return;
        };
        match core.stop() {
            Ok(()) => self.status = "Stopping emulation".to_string(),
            Err(e) => self.show_error(e.to_string()),
        }
    }

    fn open_data_folder(&mut self) {
        let dir = self.services.settings.base_dir();
        let result = std::fs::create_dir_all(&dir)
            .and_then(|()| file_manager_command(&dir).spawn().map(|_| ()));
        if let Err(e) = result {
            self.show_error(format!("Failed to open {}: {}", dir.display(), e));
        }
    }

    fn drain_inbox(&mut self) {
        while let Ok(message) = self.inbox.try_recv() {
            match message {
                ShellMessage::Capture(report) => self.handle_capture_report(report),
                ShellMessage::LibraryLoaded(entries) => {
                    let sort = self.column_sort();
                    self.status = format!("{} games loaded", entries.len());
                    self.table.set_entries(entries, sort);
                }
                ShellMessage::AmiiboLoaded(entries) => {
                    if let Some(window) = &mut self.amiibo_window {
                        window.set_entries(entries);
                    }
                }
                ShellMessage::TitleExited { path, played } => {
                    self.running_title = None;
                    self.status = format!("{} exited", path.display());
                    match self.services.metadata.record_session(&path, played) {
                        Ok(meta) => self.table.apply_metadata(&path, &meta),
                        Err(e) => warn!("Failed to record play time: {}", e),
                    }
                }
                ShellMessage::TitleFailed { path, error } => {
                    self.running_title = None;
                    self.show_error(format!("{} stopped unexpectedly: {}", path.display(), error));
                }
            }
        }
    }

    fn capture_owner(&self) -> Option<PlayerIndex> {
        self.controllers
            .iter()
            .find(|(_, window)| window.capture.is_some())
            .map(|(player, _)| *player)
    }

    fn clear_active_capture(&self) {
        *self
            .active_capture
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn handle_capture_report(&mut self, report: CaptureReport) {
        let owner = self
            .controllers
            .iter_mut()
            .find(|(_, window)| {
                window
                    .capture
                    .as_ref()
                    .is_some_and(|capture| capture.control() == report.control)
            })
            .map(|(player, window)| {
                window.capture = None;
                *player
            });

        match owner {
            Some(player) => {
                self.clear_active_capture();
                self.apply_dialog_action(player, DialogAction::CaptureFinished(report));
            }
            None => debug!("Dropping capture report nobody waits for: {:?}", report),
        }
    }

    fn open_controller_window(&mut self, player: PlayerIndex) {
        if self.controllers.contains_key(&player) {
            return;
        }
        let dialog = {
            let mut portal = lock_portal(&self.services.portal);
            let mut ctx = DialogContext {
                portal: &mut portal,
                store: &self.services.store,
                source: self.services.hub.as_ref(),
            };
            BindingDialog::open(player, &mut ctx)
        };
        self.controllers.insert(player, ControllerWindow::new(dialog));
    }

    fn close_controller_window(&mut self, player: PlayerIndex) {
        if let Some(mut window) = self.controllers.remove(&player) {
            if window.capture.is_some() {
                self.clear_active_capture();
            }
            window.cancel_capture();
        }
    }

    fn apply_dialog_action(&mut self, player: PlayerIndex, action: DialogAction) {
        if matches!(action, DialogAction::BeginCapture(_))
            && self.capture_owner().is_some_and(|owner| owner != player)
        {
            debug!("Another player is capturing, ignoring {:?}", action);
            return;
        }

        let Some(window) = self.controllers.get_mut(&player) else {
            return;
        };
        let effect = {
            let mut portal = lock_portal(&self.services.portal);
            let mut ctx = DialogContext {
                portal: &mut portal,
                store: &self.services.store,
                source: self.services.hub.as_ref(),
            };
            window.dialog.update(action, &mut ctx)
        };
        self.handle_effect(player, effect);
    }

    fn handle_effect(&mut self, player: PlayerIndex, effect: DialogEffect) {
        match effect {
            DialogEffect::None => {}
            DialogEffect::StartCapture(request) => {
                let source: Arc<dyn InputSource> = self.services.hub.clone();
                let spawned = spawn_capture(
                    request,
                    source,
                    self.dispatcher.clone(),
                    self.services.settings.capture_poll_interval(),
                );
                match spawned {
                    Ok(handle) => {
                        *self
                            .active_capture
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner) = Some(handle.token());
                        if let Some(window) = self.controllers.get_mut(&player) {
                            window.capture = Some(handle);
                        }
                    }
                    Err(e) => {
                        self.show_error(e.to_string());
                        let report = CaptureReport {
                            control: request.control,
                            outcome: CaptureOutcome::Cancelled,
                        };
                        self.apply_dialog_action(player, DialogAction::CaptureFinished(report));
                    }
                }
            }
            DialogEffect::CancelCapture => {
                if let Some(window) = self.controllers.get_mut(&player) {
                    window.cancel_capture();
                }
                self.clear_active_capture();
            }
            DialogEffect::ConfirmDelete { name } => {
                self.modal = Some(Modal::ConfirmDelete { player, name });
            }
            DialogEffect::ShowError(message) => self.show_error(message),
            DialogEffect::Saved => {
                info!("Input configuration of {} saved", player);
                self.status = format!("Input configuration of {} saved", player);
                self.close_controller_window(player);
            }
            DialogEffect::Closed => self.close_controller_window(player),
        }
    }

    fn open_amiibo_window(&mut self) {
        if self.amiibo_window.is_some() {
            return;
        }
        let cache = self.services.settings.base_dir().join(AMIIBO_CACHE_FILE);
        match amiibo::spawn_load(self.services.amiibo.clone(), cache, self.dispatcher.clone()) {
            Ok(_) => self.amiibo_window = Some(AmiiboWindow::loading()),
            Err(e) => self.show_error(e.to_string()),
        }
    }

    fn set_column_sort(&mut self, sort: ColumnSort) {
        lock_portal(&self.services.portal).set_column_sort(sort);
        self.save_config();
        self.table.resort(sort);
    }

    fn toggle_column(&mut self, column: SortColumn) {
        lock_portal(&self.services.portal)
            .config_mut()
            .ui
            .gui_columns
            .toggle(column);
        self.save_config();
    }

    fn apply_settings(&mut self, window: SettingsWindow) {
        let config = match window.build() {
            Ok(config) => config,
            Err(e) => {
                self.settings_window = Some(window);
                self.show_error(format!(
                    "Some fields entered were invalid and therefore your settings were not saved.\n{}",
                    e
                ));
                return;
            }
        };

        let dirs_changed = {
            let mut portal = lock_portal(&self.services.portal);
            let changed = portal.config().ui.game_dirs != config.ui.game_dirs;
            portal.replace(config);
            changed
        };
        self.save_config();
        self.table.resort(self.column_sort());
        if dirs_changed {
            self.rescan();
        }
    }

    fn render_menu(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Load Application from File").clicked() {
                        ui.close_menu();
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Switch executables", &GAME_EXTENSIONS)
                            .pick_file()
                        {
                            self.launch(path);
                        }
                    }
                    if ui.button("Load Unpacked Game").clicked() {
                        ui.close_menu();
                        if let Some(path) = rfd::FileDialog::new().pick_folder() {
                            self.launch(path);
                        }
                    }
                    if ui
                        .add_enabled(self.running_title.is_some(), egui::Button::new("Stop Emulation"))
                        .clicked()
                    {
                        ui.close_menu();
                        self.stop_title();
                    }
                    ui.separator();
                    if ui.button("Open Data Folder").clicked() {
                        ui.close_menu();
                        self.open_data_folder();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ui.close_menu();
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Options", |ui| {
                    if ui.button("Settings").clicked() {
                        ui.close_menu();
                        let window = SettingsWindow::open(lock_portal(&self.services.portal).config());
                        self.settings_window = Some(window);
                    }
                    ui.menu_button("Configure Controllers", |ui| {
                        for player in PlayerIndex::iter() {
                            if ui.button(player.to_string()).clicked() {
                                ui.close_menu();
                                self.open_controller_window(player);
                            }
                        }
                    });
                    ui.menu_button("Columns", |ui| {
                        let columns = lock_portal(&self.services.portal).config().ui.gui_columns.clone();
                        for column in SortColumn::iter() {
                            let mut visible = columns.is_visible(column);
                            if ui.checkbox(&mut visible, column.header()).changed() {
                                self.toggle_column(column);
                            }
                        }
                    });
                });

                ui.menu_button("Tools", |ui| {
                    if ui.button("Refresh Game List").clicked() {
                        ui.close_menu();
                        self.rescan();
                    }
                    if ui.button("Scan Amiibo").clicked() {
                        ui.close_menu();
                        self.open_amiibo_window();
                    }
                });

                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        ui.close_menu();
                        self.modal = Some(Modal::About);
                    }
                });
            });
        });
    }

    fn render_windows(&mut self, ctx: &egui::Context) {
        let mut pending = Vec::new();
        for (player, window) in self.controllers.iter_mut() {
            for action in window.render(ctx) {
                pending.push((*player, action));
            }
        }
        for (player, action) in pending {
            self.apply_dialog_action(player, action);
        }

        if let Some(mut window) = self.settings_window.take() {
            match window.render(ctx) {
                Some(SettingsOutcome::Save) => self.apply_settings(window),
                Some(SettingsOutcome::Cancel) => debug!("Settings discarded"),
                None => self.settings_window = Some(window),
            }
        }

        if let Some(mut window) = self.amiibo_window.take() {
            match window.render(ctx) {
                Some(AmiiboOutcome::Scan(id)) => {
                    info!("Amiibo {} scanned", id);
                    self.status = format!("Amiibo {} scanned", id);
                }
                Some(AmiiboOutcome::Cancel) => {}
                None => self.amiibo_window = Some(window),
            }
        }
    }

    fn render_modal(&mut self, ctx: &egui::Context) {
        let Some(modal) = self.modal.clone() else {
            return;
        };
        let Some(choice) = show_modal(ctx, &modal) else {
            return;
        };
        self.modal = None;

        if let Modal::ConfirmDelete { player, .. } = modal {
            let action = match choice {
                ModalChoice::Confirmed => DialogAction::DeleteProfileConfirmed,
                ModalChoice::Declined => DialogAction::DeleteProfileCancelled,
            };
            self.apply_dialog_action(player, action);
        }
    }
}

impl eframe::App for ShellUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        input_bridge::publish(ctx, &self.services.hub);
        self.drain_inbox();

        self.render_menu(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status.as_str());
                if let Some(running) = &self.running_title {
                    ui.separator();
                    ui.label(format!("Running: {}", running.display()));
                }
            });
        });

        let columns = lock_portal(&self.services.portal).config().ui.gui_columns.clone();
        let sort = self.column_sort();
        let event = egui::CentralPanel::default()
            .show(ctx, |ui| self.table.render(ui, &columns, sort))
            .inner;
        match event {
            Some(TableEvent::Launch(path)) => self.launch(path),
            Some(TableEvent::SetFavorite(path, favorite)) => {
                match self.services.metadata.set_favorite(&path, favorite) {
                    Ok(meta) => self.table.apply_metadata(&path, &meta),
                    Err(e) => self.show_error(e.to_string()),
                }
            }
            Some(TableEvent::Sort(sort)) => self.set_column_sort(sort),
            None => {}
        }

        self.render_windows(ctx);
        self.render_modal(ctx);

        if self.capture_owner().is_some() {
            ctx.request_repaint_after(CAPTURE_REPAINT);
        }
    }
}
