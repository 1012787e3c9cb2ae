//! Deterministic simulation harness for the mock greeter.
//!
//! Seeded implementations of the `Environment` and `DatasetSource` seams so
//! the runtime driver can be run under turmoil's virtual clock with
//! reproducible dataset latency and randomness.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference greeter. Operations are applied
//! to both the model and the real greeter, and their observable states are
//! compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_env;
pub mod sim_source;

pub use model::{ModelGreeter, ObservableState, Operation, OperationError, OperationResult};
pub use sim_env::SimEnv;
pub use sim_source::SimSource;
