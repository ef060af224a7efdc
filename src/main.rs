pub mod amiibo;
pub mod binding;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod hid;
pub mod library;
pub mod persistence;
pub mod shutdown;
pub mod ui;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::amiibo::AmiiboClient;
use crate::config::ShellSettings;
use crate::controller::{ControllerHandle, ControllerSettings, DeviceHub};
use crate::dispatch::UiDispatcher;
use crate::library::{CommandCore, EmulationCore, MetadataStore};
use crate::persistence::{ConfigPortal, ProfileStore};
use crate::shutdown::{install_panic_hook, ShutdownHooks};
use crate::ui::{ShellServices, ShellUI};

#[derive(Parser, Debug)]
#[command(name = "joyshell", version, about = "Game library and controller configuration shell")]
struct Args {
    /// Title to start right after the window opens
    rom: Option<PathBuf>,

    /// Shell settings file (defaults to the user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log at debug level regardless of the settings file
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(ShellSettings::default_path);
    let settings = ShellSettings::load(&settings_path).await?;
    let level = if args.debug {
        Level::DEBUG
    } else {
        settings.level()?
    };
    setup(level)?;

    let hooks = ShutdownHooks::new();
    install_panic_hook(hooks.clone());

    let base = settings.base_dir();
    info!("Using data directory {}", base.display());
    let portal = Arc::new(Mutex::new(ConfigPortal::open(&base)?));

    let hub = Arc::new(DeviceHub::new());
    let controller_settings = ControllerSettings {
        poll_interval_ms: settings.gamepad_poll_interval_ms,
    };
    match ControllerHandle::spawn(Some(controller_settings), hub.clone()) {
        Ok(handle) => {
            let token = handle.token();
            hooks.register("stop gamepad poller", move || token.cancel());
        }
        Err(e) => warn!("Gamepad support disabled: {}", e),
    }

    let core: Option<Arc<dyn EmulationCore>> = match settings.core_command.clone() {
        Some(program) => {
            info!("Using core {}", program.display());
            Some(Arc::new(CommandCore::new(program, settings.core_args.clone())))
        }
        None => {
            warn!(
                "No core_command in {}, titles cannot be started",
                settings_path.display()
            );
            None
        }
    };

    let services = ShellServices {
        portal,
        store: ProfileStore::new(base.clone()),
        metadata: MetadataStore::open(&base),
        hub,
        amiibo: AmiiboClient::new(&settings.amiibo_api_url),
        settings,
        core,
        hooks: hooks.clone(),
    };
    let (dispatcher, inbox) = UiDispatcher::channel();

    info!("Starting UI");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("joyshell")
            .with_inner_size([1280.0, 760.0]),
        ..Default::default()
    };

    let startup_title = args.rom;
    let result = eframe::run_native(
        "joyshell",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(ShellUI::new(
                cc,
                services,
                dispatcher,
                inbox,
                startup_title,
            )))
        }),
    );

    hooks.run_all();
    result.map_err(|e| eyre!("UI stopped with an error: {}", e))?;
    info!("Shutdown complete");
    Ok(())
}

fn setup(level: Level) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env(level);
    Ok(())
}

fn setup_logging_env(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
