//! Greeter mock runtime.
//!
//! Drives the `greeter-core` state machine with:
//! - Tokio for async tasks (dataset fetches, the autologin timer)
//! - System time and OS randomness
//! - Dataset files from a theme directory
//!
//! ## Architecture
//!
//! ```text
//! greeter-runtime
//!   ├─ SystemEnv          (production Environment impl)
//!   ├─ DatasetSource      (directory / in-memory datasets)
//!   ├─ Mock               (action executor around Greeter)
//!   ├─ ThemeHooks         (theme callbacks, terminal effect)
//!   └─ console            (greeter-mock command parsing)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod console;
mod driver;
mod error;
mod source;
mod system_env;
mod theme;

pub use driver::Mock;
pub use error::MockError;
pub use source::{DatasetSource, DirectorySource, MemorySource};
pub use system_env::SystemEnv;
pub use theme::{LoggingTheme, RecordingTheme, ThemeEvent, ThemeHooks};
