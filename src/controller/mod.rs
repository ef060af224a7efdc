//! Controller subsystem
//!
//! 1. [`device_poller`] - shared keyboard, mouse and gamepad state
//! 2. [`controller_handle`] - gilrs backed gamepad poller thread
//! 3. [`capture`] - input capture state machine used by the binding dialog
//!
//! ```text
//! gilrs ──► ControllerHandle ─┐
//!                             ├──► DeviceHub ──► InputCapture ──► UiDispatcher
//! egui input (per frame) ─────┘
//! ```

pub mod capture;
pub mod controller_handle;
pub mod device_poller;

pub use capture::{spawn_capture, Binding, CaptureHandle, CaptureReport, CaptureRequest};
pub use controller_handle::{ControllerHandle, ControllerSettings};
pub use device_poller::{DeviceHub, InputSource};
