//! Greeter construction parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::CapabilityFlags;

/// Configuration a greeter is constructed with.
///
/// Every field is optional when deserializing; the defaults describe a bare
/// greeter with no datasets, no autologin and no privileged actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreeterConfig {
    /// Request the four datasets at construction.
    pub autofill: bool,
    /// Autologin delay in seconds. `0` disables autologin.
    pub autologin_timeout_seconds: u64,
    /// Log in as guest instead of the first account when autologin fires.
    /// Implies a guest account.
    pub auto_guest: bool,
    /// Permitted privileged actions.
    pub capabilities: CapabilityFlags,
    /// Simulated host name.
    pub hostname: Option<String>,
    /// Whether the theme should hide the user list.
    pub hide_users: bool,
    /// Whether the greeter is acting as a lock screen.
    pub lock_hint: bool,
    /// User the theme should preselect.
    pub select_user_hint: Option<String>,
    /// Whether the theme should preselect the guest account.
    pub select_guest_hint: bool,
}

impl GreeterConfig {
    /// Capability flags after applying `auto_guest`.
    pub fn effective_capabilities(&self) -> CapabilityFlags {
        CapabilityFlags {
            has_guest_account: self.capabilities.has_guest_account || self.auto_guest,
            ..self.capabilities
        }
    }

    /// Autologin delay, or `None` when disabled.
    pub fn autologin_delay(&self) -> Option<Duration> {
        (self.autologin_timeout_seconds > 0)
            .then(|| Duration::from_secs(self.autologin_timeout_seconds))
    }

    /// Look up a hint by name.
    pub fn hint(&self, name: &str) -> Option<serde_json::Value> {
        use serde_json::Value;

        match name {
            "hide-users" | "hide_users" => Some(Value::Bool(self.hide_users)),
            "lock-screen" | "lock_hint" => Some(Value::Bool(self.lock_hint)),
            "select-guest" | "select_guest_hint" => Some(Value::Bool(self.select_guest_hint)),
            "select-user" | "select_user_hint" => self.select_user_hint.clone().map(Value::String),
            "has-guest-account" => {
                Some(Value::Bool(self.effective_capabilities().has_guest_account))
            },
            _ => None,
        }
    }
}
