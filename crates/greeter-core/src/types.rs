//! Data model shared by the loader, the controller and theme code.
//!
//! Dataset entries deserialize from the JSON files a theme ships next to the
//! mock. Field aliases accept the camelCase spellings older themes used.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A user account shown on the login screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Login name.
    pub username: String,
    /// Human readable name.
    #[serde(default, alias = "displayName", alias = "real_name")]
    pub display_name: String,
    /// Avatar path, if the dataset provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Simulated "already logged in" flag.
    ///
    /// Assigned once when the datasets become ready.
    #[serde(default)]
    pub logged_in: bool,
    /// Simulated active session name.
    ///
    /// Assigned once when the datasets become ready.
    #[serde(default, alias = "activeSession")]
    pub session: Option<String>,
}

/// A language or keyboard layout entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleOption {
    /// Machine code (`en_US.utf8`, `us`).
    pub code: String,
    /// Display name.
    pub name: String,
}

/// A session type (desktop environment) a user may start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOption {
    /// Session key (`gnome`, `xfce`).
    pub key: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Privileged actions the simulated environment permits.
///
/// Fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityFlags {
    /// Hibernate is permitted.
    pub can_hibernate: bool,
    /// Restart is permitted.
    pub can_restart: bool,
    /// Shutdown is permitted.
    pub can_shutdown: bool,
    /// Suspend is permitted.
    pub can_suspend: bool,
    /// A guest account is available.
    pub has_guest_account: bool,
}

impl CapabilityFlags {
    /// Returns whether `capability` is granted.
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Hibernate => self.can_hibernate,
            Capability::Restart => self.can_restart,
            Capability::Shutdown => self.can_shutdown,
            Capability::Suspend => self.can_suspend,
            Capability::GuestAccount => self.has_guest_account,
        }
    }
}

/// A single capability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `can_hibernate`
    Hibernate,
    /// `can_restart`
    Restart,
    /// `can_shutdown`
    Shutdown,
    /// `can_suspend`
    Suspend,
    /// `has_guest_account`
    GuestAccount,
}

impl Capability {
    /// Name of the read-only property a theme should check first.
    pub fn flag_name(self) -> &'static str {
        match self {
            Self::Hibernate => "can_hibernate",
            Self::Restart => "can_restart",
            Self::Shutdown => "can_shutdown",
            Self::Suspend => "can_suspend",
            Self::GuestAccount => "has_guest_account",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag_name())
    }
}

/// Autologin settings.
///
/// `user` and `guest` are mutually exclusive. The default value is the
/// "cancelled" shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutologinConfig {
    /// User to log in automatically.
    pub user: Option<String>,
    /// Log in as guest automatically.
    pub guest: bool,
    /// Delay before the automatic login, in milliseconds.
    pub timeout_ms: u64,
}

impl AutologinConfig {
    /// Autologin for a named user.
    pub fn for_user(user: impl Into<String>, timeout_ms: u64) -> Self {
        Self { user: Some(user.into()), guest: false, timeout_ms }
    }

    /// Autologin for the guest account.
    pub fn for_guest(timeout_ms: u64) -> Self {
        Self { user: None, guest: true, timeout_ms }
    }

    /// Whether anything is configured to log in.
    pub fn is_configured(&self) -> bool {
        self.user.is_some() || self.guest
    }

    /// The account the timer logs in as.
    pub fn target(&self) -> Option<&str> {
        if self.guest { Some(GUEST_USERNAME) } else { self.user.as_deref() }
    }
}

/// Username used for guest authentication.
pub const GUEST_USERNAME: &str = "guest";
