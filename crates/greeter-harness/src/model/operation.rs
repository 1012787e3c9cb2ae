//! Operations for model-based testing.
//!
//! Operations represent everything a theme (or the timer) can do to a
//! greeter. They are generated randomly by proptest and applied to both the
//! model and the real implementation.

use arbitrary::Arbitrary;
use greeter_core::{GreeterError, LegacyField, LegacyMethod, Operation as Call, PowerAction};

/// Usernames an operation can pick from. The last one has no account.
pub const CANDIDATE_USERS: [&str; 4] = ["alice", "bob", "carol", "mallory"];

/// Session keys an operation can pick from. The last one is not installed.
pub const CANDIDATE_SESSIONS: [&str; 3] = ["gnome", "xfce", "tty"];

/// Language names an operation can pick from.
pub const CANDIDATE_LANGUAGES: [&str; 3] = ["English", "Français", "Klingon"];

/// Operations that can be applied to a greeter.
///
/// Indices are reduced modulo the candidate tables, so every byte value is a
/// valid operation.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// `authenticate(username)`
    Authenticate {
        /// Index into [`CANDIDATE_USERS`].
        user: u8,
    },

    /// `authenticate_as_guest()`
    AuthenticateAsGuest,

    /// `respond(text)` with the right or a wrong password.
    Respond {
        /// Whether the response is the accepted password.
        correct: bool,
    },

    /// `cancel_authentication()`
    CancelAuthentication,

    /// `cancel_autologin()`
    CancelAutologin,

    /// `start_session(session)`
    StartSession {
        /// Index into [`CANDIDATE_SESSIONS`].
        session: u8,
    },

    /// One of the four power actions.
    Power {
        /// Index into [`PowerAction::ALL`].
        kind: u8,
    },

    /// `set_language(name)`
    SetLanguage {
        /// Index into [`CANDIDATE_LANGUAGES`].
        index: u8,
    },

    /// The most recently armed autologin timer elapses.
    ///
    /// Delivered even when the timer was cancelled or already fired, the way
    /// a late callback would be.
    FireAutologin,

    /// Read a retired field, write it, or call a retired method.
    TouchLegacy {
        /// Index into the retired fields followed by the retired methods.
        field: u8,
    },

    /// Call a public operation with one argument too many.
    BadArity {
        /// Index into [`greeter_core::Operation::ALL`].
        op: u8,
    },
}

impl Operation {
    /// Username picked by an `Authenticate`.
    pub fn user_name(index: u8) -> &'static str {
        CANDIDATE_USERS[usize::from(index) % CANDIDATE_USERS.len()]
    }

    /// Session key picked by a `StartSession`.
    pub fn session_key(index: u8) -> &'static str {
        CANDIDATE_SESSIONS[usize::from(index) % CANDIDATE_SESSIONS.len()]
    }

    /// Language picked by a `SetLanguage`.
    pub fn language_name(index: u8) -> &'static str {
        CANDIDATE_LANGUAGES[usize::from(index) % CANDIDATE_LANGUAGES.len()]
    }

    /// Power action picked by a `Power`.
    pub fn power_action(kind: u8) -> PowerAction {
        PowerAction::ALL[usize::from(kind) % PowerAction::ALL.len()]
    }

    /// Call picked by a `BadArity`.
    pub fn call(op: u8) -> Call {
        Call::ALL[usize::from(op) % Call::ALL.len()]
    }

    /// Retired surface picked by a `TouchLegacy`.
    pub fn legacy(field: u8) -> LegacyTouch {
        let fields = LegacyField::ALL.len();
        let index = usize::from(field) % (fields * 2 + LegacyMethod::ALL.len());

        if index < fields {
            LegacyTouch::Read(LegacyField::ALL[index])
        } else if index < fields * 2 {
            LegacyTouch::Write(LegacyField::ALL[index - fields])
        } else {
            LegacyTouch::Call(LegacyMethod::ALL[index - fields * 2])
        }
    }
}

/// A single touch of the retired surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyTouch {
    /// Read a retired field.
    Read(LegacyField),
    /// Write a retired field.
    Write(LegacyField),
    /// Call a retired method.
    Call(LegacyMethod),
}

/// Result of applying an operation.
///
/// Used to compare model and real system behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded.
    Ok,

    /// Operation failed with expected error.
    Error(OperationError),
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Check if operation failed.
    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }
}

impl<T> From<Result<T, GreeterError>> for OperationResult {
    fn from(result: Result<T, GreeterError>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(error) => Self::Error(OperationError::from(&error)),
        }
    }
}

/// Error kinds, without their payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Wrong argument count.
    Arity,
    /// Wrong argument type.
    Type,
    /// Capability not granted.
    CapabilityDenied,
    /// No such account.
    UnknownUser,
    /// Authentication already in progress.
    AlreadyAuthenticating,
    /// Nothing to respond to or log in.
    NotAuthenticating,
    /// Prompted but not authenticated.
    NotYetAuthenticated,
    /// Retired surface touched.
    Deprecation,
    /// Dataset failed to load.
    DatasetLoad,
    /// No such operation.
    UnknownOperation,
    /// No such property.
    UnknownProperty,
    /// Property is read-only.
    ReadOnlyProperty,
}

impl From<&GreeterError> for OperationError {
    fn from(error: &GreeterError) -> Self {
        match error {
            GreeterError::Arity { .. } => Self::Arity,
            GreeterError::Type { .. } => Self::Type,
            GreeterError::CapabilityDenied { .. } => Self::CapabilityDenied,
            GreeterError::UnknownUser { .. } => Self::UnknownUser,
            GreeterError::AlreadyAuthenticating { .. } => Self::AlreadyAuthenticating,
            GreeterError::NotAuthenticating => Self::NotAuthenticating,
            GreeterError::NotYetAuthenticated => Self::NotYetAuthenticated,
            GreeterError::Deprecation { .. } => Self::Deprecation,
            GreeterError::DatasetLoad { .. } => Self::DatasetLoad,
            GreeterError::UnknownOperation { .. } => Self::UnknownOperation,
            GreeterError::UnknownProperty { .. } => Self::UnknownProperty,
            GreeterError::ReadOnlyProperty { .. } => Self::ReadOnlyProperty,
        }
    }
}
