//! Input capture
//!
//! Detects the next physical input on the selected device so it can be bound
//! to a logical control. Modelled as a typestate machine:
//!
//! ```text
//! Idle ──start──► Capturing ──step──► Bound
//!                     │  ▲
//!                     │  └── Pending
//!                     └─────step/cancel──► Cancelled
//! ```
//!
//! [`spawn_capture`] drives the machine on the tokio runtime with a bounded
//! poll interval and a [`CancellationToken`]. There is no timeout: a capture
//! ends on a match, on cancellation input (mouse button, Escape, or any key
//! while capturing a controller), or when the token is cancelled. The result
//! reaches the UI only through the [`UiDispatcher`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use statum::{machine, state};
use strum::IntoEnumIterator;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::device_poller::{InputSource, JoystickState, KeyboardState, MouseState};
use crate::binding::LogicalControl;
use crate::dispatch::{ShellMessage, UiDispatcher};
use crate::hid::{ControllerInputId, HatDirection, Key, ALL_KEYBOARDS_INDEX};

/// Axis values at or below this never bind, whatever the trigger threshold.
pub const AXIS_CAPTURE_FLOOR: f32 = 0.5;

/// Identifier produced by a successful capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Key(Key),
    Controller(ControllerInputId),
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Key(key) => write!(f, "{}", key),
            Binding::Controller(id) => write!(f, "{}", id),
        }
    }
}

/// Device a capture listens on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureTarget {
    Keyboard { index: usize },
    Controller { index: usize, trigger_threshold: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    pub control: LogicalControl,
    pub target: CaptureTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Bound(Binding),
    Cancelled,
}

/// Final message of a capture, posted to the UI inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureReport {
    pub control: LogicalControl,
    pub outcome: CaptureOutcome,
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No async runtime available to run the capture: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

#[state]
#[derive(Debug, Clone)]
pub enum CaptureState {
    Idle,
    Capturing,
    Bound,
    Cancelled,
}

#[machine]
pub struct InputCapture<S: CaptureState> {
    request: CaptureRequest,
    source: Arc<dyn InputSource>,
    binding: Option<Binding>,
    polls: u64,
}

impl<S: CaptureState> InputCapture<S> {
    pub fn control(&self) -> LogicalControl {
        self.request.control
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }
}

/// Result of one poll iteration
pub enum CaptureStep {
    Pending(InputCapture<Capturing>),
    Bound(InputCapture<Bound>),
    Cancelled(InputCapture<Cancelled>),
}

impl InputCapture<Idle> {
    pub fn create(request: CaptureRequest, source: Arc<dyn InputSource>) -> Self {
        Self::new(request, source, None, 0)
    }

    pub fn start(self) -> InputCapture<Capturing> {
        debug!(
            "Capturing {} on {:?}",
            self.request.control, self.request.target
        );
        self.transition()
    }
}

impl InputCapture<Capturing> {
    /// Runs one poll iteration against the input source.
    pub fn step(mut self) -> CaptureStep {
        self.polls += 1;

        let all_keyboards = self.source.keyboard(ALL_KEYBOARDS_INDEX);
        let mouse = self.source.mouse();
        if cancel_requested(&self.request.target, &all_keyboards, &mouse) {
            return CaptureStep::Cancelled(self.cancel());
        }

        let found = match self.request.target {
            CaptureTarget::Keyboard { index } => {
                let keyboard = if index == ALL_KEYBOARDS_INDEX {
                    all_keyboards
                } else {
                    self.source.keyboard(index)
                };
                match_keyboard(&keyboard).map(Binding::Key)
            }
            CaptureTarget::Controller {
                index,
                trigger_threshold,
            } => self
                .source
                .joystick(index)
                .and_then(|joystick| match_controller(&joystick, trigger_threshold))
                .map(Binding::Controller),
        };

        match found {
            Some(binding) => {
                self.binding = Some(binding);
                CaptureStep::Bound(self.transition())
            }
            None => CaptureStep::Pending(self),
        }
    }

    pub fn cancel(self) -> InputCapture<Cancelled> {
        debug!("Capture of {} cancelled", self.request.control);
        self.transition()
    }
}

impl InputCapture<Bound> {
    pub fn binding(&self) -> Option<Binding> {
        self.binding
    }

    pub fn into_report(self) -> CaptureReport {
        let outcome = match self.binding {
            Some(binding) => CaptureOutcome::Bound(binding),
            None => CaptureOutcome::Cancelled,
        };
        CaptureReport {
            control: self.request.control,
            outcome,
        }
    }
}

impl InputCapture<Cancelled> {
    pub fn into_report(self) -> CaptureReport {
        CaptureReport {
            control: self.request.control,
            outcome: CaptureOutcome::Cancelled,
        }
    }
}

/// Mouse buttons always cancel. Escape cancels a keyboard capture, any key
/// cancels a controller capture.
pub fn cancel_requested(
    target: &CaptureTarget,
    all_keyboards: &KeyboardState,
    mouse: &MouseState,
) -> bool {
    if mouse.is_any_button_down() {
        return true;
    }
    match target {
        CaptureTarget::Keyboard { .. } => all_keyboards.is_key_down(Key::Escape),
        CaptureTarget::Controller { .. } => all_keyboards.is_any_key_down(),
    }
}

/// First pressed key in enumeration order.
pub fn match_keyboard(keyboard: &KeyboardState) -> Option<Key> {
    Key::capturable().find(|key| keyboard.is_key_down(*key))
}

/// Buttons in index order, then axes, then hats.
pub fn match_controller(joystick: &JoystickState, trigger_threshold: f32) -> Option<ControllerInputId> {
    if let Some(index) = joystick.buttons.iter().position(|pressed| *pressed) {
        if let Ok(index) = u8::try_from(index) {
            return Some(ControllerInputId::Button(index));
        }
    }

    if let Some(index) = joystick
        .axes
        .iter()
        .position(|value| *value > AXIS_CAPTURE_FLOOR && *value > trigger_threshold)
    {
        if let Ok(index) = u8::try_from(index) {
            return Some(ControllerInputId::Axis(index));
        }
    }

    for (index, directions) in joystick.hats.iter().enumerate() {
        let Ok(index) = u8::try_from(index) else {
            break;
        };
        if let Some(direction) = HatDirection::iter().find(|d| directions.contains(d)) {
            return Some(ControllerInputId::Hat(index, direction));
        }
    }

    None
}

/// Handle to a running capture task
#[derive(Debug)]
pub struct CaptureHandle {
    control: LogicalControl,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl CaptureHandle {
    pub fn control(&self) -> LogicalControl {
        self.control
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Starts a capture on the current tokio runtime.
///
/// Exactly one [`ShellMessage::Capture`] is posted when the capture ends,
/// including when it ends through [`CaptureHandle::cancel`].
pub fn spawn_capture(
    request: CaptureRequest,
    source: Arc<dyn InputSource>,
    dispatcher: UiDispatcher,
    poll_interval: Duration,
) -> Result<CaptureHandle, CaptureError> {
    let runtime = tokio::runtime::Handle::try_current()?;
    let token = CancellationToken::new();
    let task_token = token.clone();
    let poll_interval = poll_interval.max(Duration::from_millis(1));

    let task = runtime.spawn(async move {
        let mut capture = InputCapture::create(request, source).start();
        let mut ticker = time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let report = loop {
            tokio::select! {
                _ = task_token.cancelled() => break capture.cancel().into_report(),
                _ = ticker.tick() => match capture.step() {
                    CaptureStep::Pending(next) => capture = next,
                    CaptureStep::Bound(bound) => break bound.into_report(),
                    CaptureStep::Cancelled(cancelled) => break cancelled.into_report(),
                },
            }
        };

        info!("Capture finished: {:?}", report);
        dispatcher.post(ShellMessage::Capture(report));
    });

    Ok(CaptureHandle {
        control: request.control,
        token,
        task,
    })
}
