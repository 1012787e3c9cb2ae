//! Greeter Core
//!
//! Action-based state machine for a mock login-manager greeter. Lets theme
//! code run its login screen (prompt, respond, start a session, power
//! actions, autologin) without a display manager behind it.
//!
//! # Architecture
//!
//! The greeter is a pure state machine that:
//! - Receives events from the driver (theme calls, fetch completions, timer
//!   expiry)
//! - Produces actions for the driver to execute (fetch a dataset, arm a
//!   timer, show a prompt, end the session)
//! - Uses the `Environment` trait for time and randomness (deterministic
//!   testing)
//!
//! # Components
//!
//! - [`Greeter`]: Top-level state machine and the theme-facing surface
//! - [`AuthenticationController`]: Prompt/respond/session state machine and
//!   autologin bookkeeping
//! - [`DatasetLoader`]: Per-dataset load status and the readiness barrier
//! - [`PowerActionGateway`]: Capability checks for power actions
//! - [`LegacyPropertyBridge`]: Retired fields that fail on every touch
//! - [`contract`]: Argument arity/type checks run before every operation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod config;
pub mod contract;
pub mod dataset;
pub mod env;
pub mod error;
pub mod event;
mod greeter;
pub mod legacy;
pub mod power;
pub mod types;

pub use auth::{AuthState, AuthenticationController, AuthenticationSession, SIMULATED_PASSWORD};
pub use config::GreeterConfig;
pub use contract::{Operation, TypeTag};
pub use dataset::{
    Dataset, DatasetLoader, DatasetPayload, Datasets, FetchResponse, FetchResult, LoadStatus,
};
pub use env::Environment;
pub use error::GreeterError;
pub use event::{GreeterAction, GreeterEvent, MessageKind, PromptKind, Reply, TerminalEffect};
pub use greeter::{Greeter, GreeterSnapshot, PROPERTIES};
pub use legacy::{LegacyField, LegacyKind, LegacyMethod, LegacyPropertyBridge};
pub use power::{PowerAction, PowerActionGateway};
pub use types::{
    Account, AutologinConfig, Capability, CapabilityFlags, GUEST_USERNAME, LocaleOption,
    SessionOption,
};
