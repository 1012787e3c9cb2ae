//! Events fed into the greeter and actions it produces.

use std::{fmt, time::Duration};

use serde_json::Value;

use crate::dataset::{Dataset, Datasets, FetchResult};

/// Input to [`crate::Greeter::handle`].
#[derive(Debug, Clone)]
pub enum GreeterEvent {
    /// A theme called a public operation by name.
    Call {
        /// Operation name.
        name: String,
        /// Dynamic arguments.
        args: Vec<Value>,
    },

    /// A dataset fetch completed.
    DatasetFetched {
        /// Which dataset.
        dataset: Dataset,
        /// Generation the fetch was requested for.
        generation: u64,
        /// Response or transport failure.
        response: FetchResult,
    },

    /// The readiness barrier fired on a shared loader.
    DatasetsReady(Datasets),

    /// The autologin delay elapsed.
    AutologinTimerFired {
        /// Token the timer was armed with.
        token: u64,
    },
}

/// Kind of input a prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Visible text.
    Text,
    /// Hidden text.
    Password,
}

/// Severity of a message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Informational.
    Info,
    /// Error.
    Error,
}

/// The terminal effects that end the simulated greeter session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEffect {
    /// System hibernated.
    Hibernate,
    /// System restarted.
    Restart,
    /// System shut down.
    Shutdown,
    /// System suspended.
    Suspend,
    /// A user session was started.
    SessionStarted {
        /// Authenticated user.
        user: String,
        /// Session key that was started.
        session: String,
    },
}

impl fmt::Display for TerminalEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hibernate => f.write_str("System hibernated."),
            Self::Restart => f.write_str("System restarted."),
            Self::Shutdown => f.write_str("System shut down."),
            Self::Suspend => f.write_str("System suspended."),
            Self::SessionStarted { user, session } => {
                write!(f, "Started a {session} session for {user}.")
            },
        }
    }
}

/// Output of the greeter, executed by the driver in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GreeterAction {
    /// Ask the theme to prompt the user.
    ShowPrompt {
        /// Prompt text.
        text: String,
        /// Input kind.
        kind: PromptKind,
    },

    /// Ask the theme to show a message.
    ShowMessage {
        /// Message text.
        text: String,
        /// Severity.
        kind: MessageKind,
    },

    /// The pending user is authenticated.
    AuthenticationComplete,

    /// The autologin delay elapsed and autologin is proceeding.
    AutologinTimerExpired,

    /// All datasets are loaded and defaults are seeded.
    Ready {
        /// Number of accounts.
        num_users: usize,
    },

    /// Notify the user (the reference greeter shows an alert).
    Notify {
        /// Notice text.
        message: String,
    },

    /// Start fetching a dataset.
    FetchDataset {
        /// Which dataset.
        dataset: Dataset,
        /// Generation to report the completion for.
        generation: u64,
    },

    /// Schedule [`GreeterEvent::AutologinTimerFired`] after `delay`.
    ArmAutologin {
        /// Token to report back.
        token: u64,
        /// Delay.
        delay: Duration,
    },

    /// The timer armed with `token` is no longer wanted.
    CancelAutologinTimer {
        /// Token of the cancelled timer.
        token: u64,
    },

    /// The session ended; the greeter has been reset to its initial shape.
    Terminal(TerminalEffect),
}

/// Result of a public call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Return value (`null` for operations without one).
    pub value: Value,
    /// Actions for the driver.
    pub actions: Vec<GreeterAction>,
}

impl Reply {
    /// A reply carrying only actions.
    pub fn actions(actions: Vec<GreeterAction>) -> Self {
        Self { value: Value::Null, actions }
    }
}
