//! Call contract checking.
//!
//! Theme code calls the greeter with dynamic (JSON) arguments. Before an
//! operation touches any state its arguments are checked against the
//! operation's signature. A failed check leaves the greeter untouched.

use std::fmt;

use serde_json::Value;

use crate::error::GreeterError;

/// Dynamic type of a call argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// JSON string
    String,
    /// JSON number
    Number,
    /// JSON boolean
    Boolean,
    /// JSON null
    Null,
    /// JSON array
    Array,
    /// JSON object
    Object,
}

impl TypeTag {
    /// Type tag of a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Null => Self::Null,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Lowercase name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check `args` against an expected arity and positional types.
///
/// Pure and stateless. Fails with [`GreeterError::Arity`] on a count
/// mismatch and with [`GreeterError::Type`] on the first positional
/// mismatch (positions are 1-based).
pub fn check(
    operation: &str,
    args: &[Value],
    expected_arity: usize,
    expected_types: &[TypeTag],
) -> Result<(), GreeterError> {
    if args.len() != expected_arity {
        return Err(GreeterError::Arity {
            operation: operation.to_string(),
            expected: expected_arity,
            received: args.len(),
        });
    }

    for (index, (arg, expected)) in args.iter().zip(expected_types).enumerate() {
        let actual = TypeTag::of(arg);
        if actual != *expected {
            return Err(GreeterError::Type {
                operation: operation.to_string(),
                position: index + 1,
                expected: *expected,
                actual,
            });
        }
    }

    Ok(())
}

/// Public operations theme code may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `authenticate(username)`
    Authenticate,
    /// `authenticate_as_guest()`
    AuthenticateAsGuest,
    /// `cancel_authentication()`
    CancelAuthentication,
    /// `cancel_autologin()`
    CancelAutologin,
    /// `respond(text)`
    Respond,
    /// `start_session(session)`
    StartSession,
    /// `hibernate()`
    Hibernate,
    /// `restart()`
    Restart,
    /// `shutdown()`
    Shutdown,
    /// `suspend()`
    Suspend,
    /// `set_language(language)`
    SetLanguage,
    /// `get_hint(name)`
    GetHint,
}

impl Operation {
    /// Every public operation.
    pub const ALL: [Self; 12] = [
        Self::Authenticate,
        Self::AuthenticateAsGuest,
        Self::CancelAuthentication,
        Self::CancelAutologin,
        Self::Respond,
        Self::StartSession,
        Self::Hibernate,
        Self::Restart,
        Self::Shutdown,
        Self::Suspend,
        Self::SetLanguage,
        Self::GetHint,
    ];

    /// Look up an operation by its theme-facing name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Theme-facing name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::AuthenticateAsGuest => "authenticate_as_guest",
            Self::CancelAuthentication => "cancel_authentication",
            Self::CancelAutologin => "cancel_autologin",
            Self::Respond => "respond",
            Self::StartSession => "start_session",
            Self::Hibernate => "hibernate",
            Self::Restart => "restart",
            Self::Shutdown => "shutdown",
            Self::Suspend => "suspend",
            Self::SetLanguage => "set_language",
            Self::GetHint => "get_hint",
        }
    }

    /// Positional argument types.
    pub fn signature(self) -> &'static [TypeTag] {
        match self {
            Self::Authenticate
            | Self::Respond
            | Self::StartSession
            | Self::SetLanguage
            | Self::GetHint => &[TypeTag::String],
            Self::AuthenticateAsGuest
            | Self::CancelAuthentication
            | Self::CancelAutologin
            | Self::Hibernate
            | Self::Restart
            | Self::Shutdown
            | Self::Suspend => &[],
        }
    }

    /// Check `args` against this operation's signature.
    pub fn check(self, args: &[Value]) -> Result<(), GreeterError> {
        let signature = self.signature();
        check(self.name(), args, signature.len(), signature)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_matching_arguments() {
        assert_eq!(check("respond", &[json!("password")], 1, &[TypeTag::String]), Ok(()));
        assert_eq!(check("suspend", &[], 0, &[]), Ok(()));
    }

    #[test]
    fn rejects_wrong_arity() {
        let result = check("respond", &[], 1, &[TypeTag::String]);
        assert_eq!(
            result,
            Err(GreeterError::Arity { operation: "respond".to_string(), expected: 1, received: 0 })
        );

        let result = Operation::Suspend.check(&[json!(true)]);
        assert!(matches!(result, Err(GreeterError::Arity { expected: 0, received: 1, .. })));
    }

    #[test]
    fn reports_first_mismatch_position() {
        let args = [json!("a"), json!(1), json!(null)];
        let result = check("f", &args, 3, &[TypeTag::String; 3]);

        assert_eq!(
            result,
            Err(GreeterError::Type {
                operation: "f".to_string(),
                position: 2,
                expected: TypeTag::String,
                actual: TypeTag::Number,
            })
        );
    }

    #[test]
    fn type_tags() {
        assert_eq!(TypeTag::of(&json!({})), TypeTag::Object);
        assert_eq!(TypeTag::of(&json!([1])), TypeTag::Array);
        assert_eq!(TypeTag::of(&json!(false)), TypeTag::Boolean);
        assert_eq!(TypeTag::of(&json!(null)), TypeTag::Null);
    }

    #[test]
    fn operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.name()), Some(op));
        }
        assert_eq!(Operation::from_name("login"), None);
    }
}
