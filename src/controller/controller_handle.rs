//! Gamepad poller
//!
//! Owns the gilrs context on a dedicated thread and mirrors every connected
//! gamepad into the [`DeviceHub`] as an index ordered [`JoystickState`].
//!
//! ```text
//! gilrs ──► gamepad-poller thread ──► DeviceHub ──► InputCapture / device list
//! ```

use std::collections::BTreeSet;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gilrs::{Axis, Button, EventType, Gamepad, Gilrs};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::device_poller::{DeviceHub, JoystickState};
use crate::hid::HatDirection;

/// Button order exposed as `Button0..Button10`.
pub const BUTTON_ORDER: [Button; 11] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::Mode,
];

#[derive(Clone, Debug)]
pub struct ControllerSettings {
    /// Delay between two gamepad snapshots
    pub poll_interval_ms: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 4,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Failed to initialize gamepad backend: {0}")]
    InitializationError(String),

    #[error("Gamepad poller thread could not be started: {0}")]
    ThreadError(#[from] std::io::Error),
}

/// Handle to the running gamepad poller
///
/// Dropping the handle does not stop the thread; call [`ControllerHandle::stop`]
/// or cancel the token returned by [`ControllerHandle::token`].
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    token: CancellationToken,
}

impl ControllerHandle {
    /// Starts the poller thread and waits until the gamepad backend is up.
    ///
    /// # Errors
    ///
    /// * [`ControllerError::InitializationError`] if gilrs cannot be created
    /// * [`ControllerError::ThreadError`] if the thread cannot be spawned
    pub fn spawn(
        settings: Option<ControllerSettings>,
        hub: Arc<DeviceHub>,
    ) -> Result<Self, ControllerError> {
        let settings = settings.unwrap_or_default();
        info!("Starting gamepad poller with settings: {:?}", settings);

        let token = CancellationToken::new();
        let thread_token = token.clone();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<Result<(), String>>(1);

        thread::Builder::new()
            .name("gamepad-poller".to_string())
            .spawn(move || {
                // gilrs contexts are bound to the thread that created them
                let gilrs = match Gilrs::new() {
                    Ok(gilrs) => {
                        let _ = ready_tx.send(Ok(()));
                        gilrs
                    }
                    Err(e) => {
                        error!("Failed to initialize gilrs: {}", e);
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                poll_loop(gilrs, hub, settings, thread_token);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("Gamepad poller running");
                Ok(Self { token })
            }
            Ok(Err(e)) => Err(ControllerError::InitializationError(e)),
            Err(_) => Err(ControllerError::InitializationError(
                "poller thread exited during startup".to_string(),
            )),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn stop(&self) {
        debug!("Stopping gamepad poller");
        self.token.cancel();
    }
}

fn poll_loop(
    mut gilrs: Gilrs,
    hub: Arc<DeviceHub>,
    settings: ControllerSettings,
    token: CancellationToken,
) {
    let interval = Duration::from_millis(settings.poll_interval_ms.max(1));

    for (id, gamepad) in gilrs.gamepads() {
        info!("Found gamepad [{}] {}", usize::from(id), gamepad.name());
    }

    while !token.is_cancelled() {
        while let Some(event) = gilrs.next_event() {
            let index = usize::from(event.id);
            match event.event {
                EventType::Connected => {
                    info!("Gamepad {} connected", index);
                }
                EventType::Disconnected => {
                    warn!("Gamepad {} disconnected", index);
                    hub.remove_joystick(index);
                }
                _ => {}
            }
        }

        for (id, gamepad) in gilrs.gamepads() {
            if gamepad.is_connected() {
                hub.update_joystick(usize::from(id), snapshot(&gamepad));
            }
        }

        thread::sleep(interval);
    }

    info!("Gamepad poller stopped");
}

fn snapshot(gamepad: &Gamepad<'_>) -> JoystickState {
    let buttons = BUTTON_ORDER
        .iter()
        .map(|button| gamepad.is_pressed(*button))
        .collect();

    let axes = vec![
        gamepad.value(Axis::LeftStickX),
        gamepad.value(Axis::LeftStickY),
        analog_trigger(gamepad, Button::LeftTrigger2, Axis::LeftZ),
        gamepad.value(Axis::RightStickX),
        gamepad.value(Axis::RightStickY),
        analog_trigger(gamepad, Button::RightTrigger2, Axis::RightZ),
    ];

    let mut hat = BTreeSet::new();
    for (button, direction) in [
        (Button::DPadUp, HatDirection::Up),
        (Button::DPadDown, HatDirection::Down),
        (Button::DPadLeft, HatDirection::Left),
        (Button::DPadRight, HatDirection::Right),
    ] {
        if gamepad.is_pressed(button) {
            hat.insert(direction);
        }
    }

    JoystickState {
        name: gamepad.name().to_string(),
        buttons,
        axes,
        hats: vec![hat],
    }
}

// Analog triggers report either as a button value or as a Z axis.
fn analog_trigger(gamepad: &Gamepad<'_>, button: Button, axis: Axis) -> f32 {
    match gamepad.button_data(button) {
        Some(data) => data.value(),
        None => gamepad.value(axis).max(0.0),
    }
}
