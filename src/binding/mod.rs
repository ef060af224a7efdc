//! # Binding Module
//!
//! Everything the controller window needs to edit one player's input
//! configuration:
//!
//! - [`controls`]: the logical controls and when they are shown
//! - [`slots`]: mapping from a logical control to the config field it edits
//! - [`dialog`]: the [`BindingDialog`] reducer, independent of the toolkit

pub mod controls;
pub mod dialog;
pub mod slots;

pub use controls::{ControlGroup, JoyconSide, LogicalControl};
pub use dialog::{
    BindingDialog, DeviceOption, DialogAction, DialogContext, DialogEffect, DialogError,
    InputDevice, UNBOUND_LABEL,
};
