//! Reference model for model-based testing.
//!
//! The model is a deliberately naive greeter: a three-state authentication
//! enum, a flag for the pending autologin timer and a reset counter. It is
//! the oracle the real [`greeter_core::Greeter`] is checked against.

mod greeter;
pub mod operation;

pub use greeter::{FIXTURE_LANGUAGE, FIXTURE_USERS, ModelGreeter, ObservableState};
pub use operation::{LegacyTouch, Operation, OperationError, OperationResult};
