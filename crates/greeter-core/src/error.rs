//! Greeter error types.

use thiserror::Error;

use crate::{contract::TypeTag, dataset::Dataset, legacy::LegacyKind, types::Capability};

/// Errors from greeter operations.
///
/// Every variant except [`GreeterError::DatasetLoad`] indicates a bug in the
/// calling theme. Those abort the triggering call and leave all state
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GreeterError {
    /// Wrong number of arguments.
    #[error("incorrect number of arguments in call to '{operation}': expected {expected}, found {received}")]
    Arity {
        /// Operation that was called.
        operation: String,
        /// Expected argument count.
        expected: usize,
        /// Argument count received.
        received: usize,
    },

    /// An argument had the wrong type.
    #[error("argument {position} of '{operation}' is of a wrong type: expected '{expected}', found '{actual}'")]
    Type {
        /// Operation that was called.
        operation: String,
        /// 1-based argument position.
        position: usize,
        /// Expected type.
        expected: TypeTag,
        /// Type received.
        actual: TypeTag,
    },

    /// The simulated environment does not permit the action.
    #[error("capability denied: check the value of '{capability}' before calling this function")]
    CapabilityDenied {
        /// Missing capability.
        capability: Capability,
    },

    /// Username is not in the loaded accounts.
    #[error("invalid username: {username}")]
    UnknownUser {
        /// Username that was not found.
        username: String,
    },

    /// An authentication is already in progress.
    #[error("already authenticating {user}")]
    AlreadyAuthenticating {
        /// User currently being authenticated.
        user: String,
    },

    /// No authentication in progress.
    #[error("not in the authentication phase: call 'authenticate(username)' first")]
    NotAuthenticating,

    /// Prompted, but the response has not been accepted yet.
    #[error("no authenticated user to log in: call 'respond(text)' first")]
    NotYetAuthenticated,

    /// A retired field or method was touched.
    #[error("the {kind} '{name}' is deprecated, consider using '{replacement}' instead")]
    Deprecation {
        /// Field or method.
        kind: LegacyKind,
        /// Deprecated name.
        name: &'static str,
        /// Current equivalent.
        replacement: &'static str,
    },

    /// A dataset failed to load.
    #[error("{dataset} did not load correctly: {reason}")]
    DatasetLoad {
        /// Dataset that failed.
        dataset: Dataset,
        /// Description of the failure.
        reason: String,
    },

    /// No such operation.
    #[error("unknown operation: {name}")]
    UnknownOperation {
        /// Name that was called.
        name: String,
    },

    /// No such property.
    #[error("unknown property: {name}")]
    UnknownProperty {
        /// Name that was accessed.
        name: String,
    },

    /// Properties are read-only to theme code.
    #[error("property '{name}' is read-only")]
    ReadOnlyProperty {
        /// Name that was written.
        name: String,
    },
}

impl GreeterError {
    /// Returns true if the greeter keeps working normally after this error.
    ///
    /// Only dataset failures are recoverable: the affected dataset never
    /// becomes ready, everything else keeps answering calls.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::DatasetLoad { .. } => true,

            Self::Arity { .. }
            | Self::Type { .. }
            | Self::CapabilityDenied { .. }
            | Self::UnknownUser { .. }
            | Self::AlreadyAuthenticating { .. }
            | Self::NotAuthenticating
            | Self::NotYetAuthenticated
            | Self::Deprecation { .. }
            | Self::UnknownOperation { .. }
            | Self::UnknownProperty { .. }
            | Self::ReadOnlyProperty { .. } => false,
        }
    }

    /// Returns true for argument arity/type failures.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Arity { .. } | Self::Type { .. })
    }

    /// Short, stable name of the error kind (used in diagnostics).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Arity { .. } => "ArityError",
            Self::Type { .. } => "TypeError",
            Self::CapabilityDenied { .. } => "CapabilityDeniedError",
            Self::UnknownUser { .. } => "UnknownUserError",
            Self::AlreadyAuthenticating { .. } => "AlreadyAuthenticatingError",
            Self::NotAuthenticating => "NotAuthenticatingError",
            Self::NotYetAuthenticated => "NotYetAuthenticatedError",
            Self::Deprecation { .. } => "DeprecationError",
            Self::DatasetLoad { .. } => "DatasetLoadError",
            Self::UnknownOperation { .. } => "UnknownOperationError",
            Self::UnknownProperty { .. } => "UnknownPropertyError",
            Self::ReadOnlyProperty { .. } => "ReadOnlyPropertyError",
        }
    }
}
