//! Legacy surface.
//!
//! Fields and methods retired from the greeter API stay addressable only so
//! that stale theme code fails loudly. Every touch raises
//! [`GreeterError::Deprecation`] naming the replacement; nothing here ever
//! yields a value.

use std::{convert::Infallible, fmt};

use serde_json::Value;

use crate::error::GreeterError;

/// Whether a legacy name was a field or a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyKind {
    /// State field.
    Property,
    /// Callable.
    Method,
}

impl fmt::Display for LegacyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property => f.write_str("property"),
            Self::Method => f.write_str("method"),
        }
    }
}

/// Retired state fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyField {
    /// `default_language` (now `language`)
    DefaultLanguage,
    /// `default_layout` (now `layout`)
    DefaultLayout,
    /// `select_guest` (now `select_guest_hint`)
    SelectGuest,
    /// `select_user` (now `select_user_hint`)
    SelectUser,
    /// `timed_login_user` (now `autologin_user`)
    TimedLoginUser,
    /// `timed_login_delay` (now `autologin_timeout`)
    TimedLoginDelay,
}

impl LegacyField {
    /// The registry.
    pub const ALL: [Self; 6] = [
        Self::DefaultLanguage,
        Self::DefaultLayout,
        Self::SelectGuest,
        Self::SelectUser,
        Self::TimedLoginUser,
        Self::TimedLoginDelay,
    ];

    /// Look up a field by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Retired name.
    pub fn name(self) -> &'static str {
        match self {
            Self::DefaultLanguage => "default_language",
            Self::DefaultLayout => "default_layout",
            Self::SelectGuest => "select_guest",
            Self::SelectUser => "select_user",
            Self::TimedLoginUser => "timed_login_user",
            Self::TimedLoginDelay => "timed_login_delay",
        }
    }

    /// Current equivalent.
    pub fn replacement(self) -> &'static str {
        match self {
            Self::DefaultLanguage => "language",
            Self::DefaultLayout => "layout",
            Self::SelectGuest => "select_guest_hint",
            Self::SelectUser => "select_user_hint",
            Self::TimedLoginUser => "autologin_user",
            Self::TimedLoginDelay => "autologin_timeout",
        }
    }

    fn violation(self) -> GreeterError {
        deprecated(LegacyKind::Property, self.name(), self.replacement())
    }
}

/// Retired methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyMethod {
    /// `cancel_timed_login()`
    CancelTimedLogin,
    /// `start_authentication()`
    StartAuthentication,
    /// `login(user, session)`
    Login,
    /// `provide_secret(text)`
    ProvideSecret,
    /// `start_session_sync(session)`
    StartSessionSync,
}

impl LegacyMethod {
    /// The registry.
    pub const ALL: [Self; 5] = [
        Self::CancelTimedLogin,
        Self::StartAuthentication,
        Self::Login,
        Self::ProvideSecret,
        Self::StartSessionSync,
    ];

    /// Look up a method by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.name() == name)
    }

    /// Retired name.
    pub fn name(self) -> &'static str {
        match self {
            Self::CancelTimedLogin => "cancel_timed_login",
            Self::StartAuthentication => "start_authentication",
            Self::Login => "login",
            Self::ProvideSecret => "provide_secret",
            Self::StartSessionSync => "start_session_sync",
        }
    }

    /// Current equivalent.
    pub fn replacement(self) -> &'static str {
        match self {
            Self::CancelTimedLogin => "cancel_autologin",
            Self::StartAuthentication => "authenticate",
            Self::Login | Self::StartSessionSync => "start_session",
            Self::ProvideSecret => "respond",
        }
    }

    /// Calling a retired method always fails.
    pub fn call(self) -> GreeterError {
        deprecated(LegacyKind::Method, self.name(), self.replacement())
    }
}

fn deprecated(kind: LegacyKind, name: &'static str, replacement: &'static str) -> GreeterError {
    tracing::warn!(%kind, name, replacement, "deprecated {kind} '{name}' touched");
    GreeterError::Deprecation { kind, name, replacement }
}

/// Accessors for the retired fields.
///
/// Getters are typed `Result<Infallible, _>`: they cannot produce a value.
/// Setters discard their argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyPropertyBridge;

impl LegacyPropertyBridge {
    /// Read a retired field.
    pub fn read(&self, field: LegacyField) -> Result<Infallible, GreeterError> {
        Err(field.violation())
    }

    /// Write a retired field.
    pub fn write(&mut self, field: LegacyField, _value: Value) -> Result<(), GreeterError> {
        Err(field.violation())
    }

    /// `default_language`
    pub fn default_language(&self) -> Result<Infallible, GreeterError> {
        self.read(LegacyField::DefaultLanguage)
    }

    /// `default_language = value`
    pub fn set_default_language(&mut self, value: Value) -> Result<(), GreeterError> {
        self.write(LegacyField::DefaultLanguage, value)
    }

    /// `default_layout`
    pub fn default_layout(&self) -> Result<Infallible, GreeterError> {
        self.read(LegacyField::DefaultLayout)
    }

    /// `default_layout = value`
    pub fn set_default_layout(&mut self, value: Value) -> Result<(), GreeterError> {
        self.write(LegacyField::DefaultLayout, value)
    }

    /// `select_guest`
    pub fn select_guest(&self) -> Result<Infallible, GreeterError> {
        self.read(LegacyField::SelectGuest)
    }

    /// `select_guest = value`
    pub fn set_select_guest(&mut self, value: Value) -> Result<(), GreeterError> {
        self.write(LegacyField::SelectGuest, value)
    }

    /// `select_user`
    pub fn select_user(&self) -> Result<Infallible, GreeterError> {
        self.read(LegacyField::SelectUser)
    }

    /// `select_user = value`
    pub fn set_select_user(&mut self, value: Value) -> Result<(), GreeterError> {
        self.write(LegacyField::SelectUser, value)
    }

    /// `timed_login_user`
    pub fn timed_login_user(&self) -> Result<Infallible, GreeterError> {
        self.read(LegacyField::TimedLoginUser)
    }

    /// `timed_login_user = value`
    pub fn set_timed_login_user(&mut self, value: Value) -> Result<(), GreeterError> {
        self.write(LegacyField::TimedLoginUser, value)
    }

    /// `timed_login_delay`
    pub fn timed_login_delay(&self) -> Result<Infallible, GreeterError> {
        self.read(LegacyField::TimedLoginDelay)
    }

    /// `timed_login_delay = value`
    pub fn set_timed_login_delay(&mut self, value: Value) -> Result<(), GreeterError> {
        self.write(LegacyField::TimedLoginDelay, value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_language_points_to_language() {
        let bridge = LegacyPropertyBridge;
        let Err(err) = bridge.default_language();

        assert_eq!(err, GreeterError::Deprecation {
            kind: LegacyKind::Property,
            name: "default_language",
            replacement: "language",
        });
    }

    #[test]
    fn every_field_rejects_reads_and_writes() {
        let mut bridge = LegacyPropertyBridge;

        for field in LegacyField::ALL {
            let Err(read) = bridge.read(field);
            let write = bridge.write(field, json!("x"));

            assert!(matches!(read, GreeterError::Deprecation { name, .. } if name == field.name()));
            assert_eq!(write, Err(read));
        }
    }

    #[test]
    fn repeated_touches_keep_failing() {
        let mut bridge = LegacyPropertyBridge;
        for _ in 0..3 {
            assert!(bridge.set_timed_login_delay(json!(5)).is_err());
        }
    }

    #[test]
    fn legacy_methods_name_replacements() {
        let err = LegacyMethod::ProvideSecret.call();
        assert_eq!(
            err.to_string(),
            "the method 'provide_secret' is deprecated, consider using 'respond' instead"
        );

        assert_eq!(LegacyMethod::from_name("login"), Some(LegacyMethod::Login));
        assert_eq!(LegacyMethod::from_name("authenticate"), None);
    }

    #[test]
    fn field_lookup() {
        assert_eq!(LegacyField::from_name("select_user"), Some(LegacyField::SelectUser));
        assert_eq!(LegacyField::from_name("language"), None);
    }
}
