//! Application-level orchestration utilities.
//!
//! This module owns request execution (the controller task) and the
//! translation of request completions into session state changes. UI layers
//! call into this module to keep responsibilities separated.

mod completion;
mod controller;

pub use completion::{apply_event, AppliedEvent};
pub use controller::{run_controller, AppEvent, UiCommand};
