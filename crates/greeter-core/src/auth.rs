//! Authentication state machine.
//!
//! ```text
//!            authenticate(u) / guest            respond("password")
//!   Idle ───────────────────────► Prompting(u) ───────────────────► Authenticated(u)
//!    ▲                              │    ▲  respond(other)                │
//!    │                              │    └──────┘                         │ start_session(s)
//!    │      cancel_authentication   │                                     ▼
//!    └──────────────────────────────┴──────────────────────────── SessionStarted(u, s)
//! ```
//!
//! The controller also owns the autologin timer bookkeeping. The driver does
//! the actual waiting; the controller only hands out tokens and decides
//! whether a fired token still counts.
//!
//! # Invariants
//!
//! - No prompt before `authenticate`
//! - No `respond` without a pending user
//! - A failed transition leaves the state unchanged
//! - A timer token is honoured at most once, and never after cancellation

use std::time::{Duration, Instant};

use crate::{
    error::GreeterError,
    event::{GreeterAction, MessageKind, PromptKind, TerminalEffect},
    types::{Account, AutologinConfig, Capability, CapabilityFlags, GUEST_USERNAME},
};

/// The single shared secret the simulated greeter accepts.
pub const SIMULATED_PASSWORD: &str = "password";

/// Authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Nobody is authenticating.
    #[default]
    Idle,
    /// Waiting for a response for `user`.
    Prompting {
        /// User being authenticated.
        user: String,
    },
    /// `user` passed authentication.
    Authenticated {
        /// Authenticated user.
        user: String,
    },
    /// A session was started. Transient: the greeter resets right after.
    SessionStarted {
        /// User the session belongs to.
        user: String,
        /// Session key.
        session: String,
    },
}

/// The authentication session of a greeter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationSession {
    state: AuthState,
}

impl AuthenticationSession {
    /// Current state.
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// User currently being (or already) authenticated.
    pub fn pending_user(&self) -> Option<&str> {
        match &self.state {
            AuthState::Prompting { user }
            | AuthState::Authenticated { user }
            | AuthState::SessionStarted { user, .. } => Some(user),
            AuthState::Idle => None,
        }
    }

    /// Whether an authentication is in progress.
    pub fn in_authentication(&self) -> bool {
        !matches!(self.state, AuthState::Idle)
    }

    /// Whether the pending user passed authentication.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated { .. } | AuthState::SessionStarted { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedTimer {
    token: u64,
    armed_at: Instant,
    delay: Duration,
}

/// Owns the [`AuthenticationSession`] and the autologin timer.
#[derive(Debug, Default)]
pub struct AuthenticationController {
    session: AuthenticationSession,
    autologin: AutologinConfig,
    armed: Option<ArmedTimer>,
    next_token: u64,
}

impl AuthenticationController {
    /// Create an idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// The authentication session.
    pub fn session(&self) -> &AuthenticationSession {
        &self.session
    }

    /// Current autologin configuration.
    pub fn autologin(&self) -> &AutologinConfig {
        &self.autologin
    }

    /// Time left before the armed autologin timer fires.
    pub fn autologin_remaining(&self, now: Instant) -> Option<Duration> {
        self.armed.map(|timer| timer.delay.saturating_sub(now.duration_since(timer.armed_at)))
    }

    /// Start authenticating `username`.
    pub fn authenticate(
        &mut self,
        username: &str,
        accounts: &[Account],
    ) -> Result<Vec<GreeterAction>, GreeterError> {
        self.ensure_idle()?;

        if !accounts.iter().any(|account| account.username == username) {
            return Err(GreeterError::UnknownUser { username: username.to_string() });
        }

        self.session.state = AuthState::Prompting { user: username.to_string() };
        tracing::debug!(user = username, "prompting for password");

        Ok(vec![GreeterAction::ShowPrompt {
            text: "Password:".to_string(),
            kind: PromptKind::Password,
        }])
    }

    /// Start authenticating the guest account.
    pub fn authenticate_as_guest(
        &mut self,
        capabilities: &CapabilityFlags,
    ) -> Result<Vec<GreeterAction>, GreeterError> {
        if !capabilities.allows(Capability::GuestAccount) {
            return Err(GreeterError::CapabilityDenied { capability: Capability::GuestAccount });
        }
        self.ensure_idle()?;

        self.session.state = AuthState::Prompting { user: GUEST_USERNAME.to_string() };
        Ok(vec![])
    }

    /// Answer the pending prompt.
    ///
    /// A wrong response is not an error: it produces an error message and
    /// leaves the state machine where it was.
    pub fn respond(&mut self, text: &str) -> Result<Vec<GreeterAction>, GreeterError> {
        let AuthState::Prompting { user } = &self.session.state else {
            return Err(GreeterError::NotAuthenticating);
        };

        if text != SIMULATED_PASSWORD {
            tracing::debug!(user = %user, "invalid password");
            return Ok(vec![GreeterAction::ShowMessage {
                text: "Invalid password".to_string(),
                kind: MessageKind::Error,
            }]);
        }

        let user = user.clone();
        tracing::info!(user = %user, "authentication complete");
        self.session.state = AuthState::Authenticated { user };

        Ok(vec![GreeterAction::AuthenticationComplete])
    }

    /// Abort any authentication. Valid from every state.
    pub fn cancel_authentication(&mut self) {
        if let Some(user) = self.session.pending_user() {
            tracing::debug!(user, "authentication cancelled");
        }
        self.session.state = AuthState::Idle;
    }

    /// Start `session` for the authenticated user.
    ///
    /// Returns the terminal effect; the caller is responsible for the reset
    /// that follows.
    pub fn start_session(&mut self, session: &str) -> Result<TerminalEffect, GreeterError> {
        let user = match &self.session.state {
            AuthState::Authenticated { user } => user.clone(),
            AuthState::Prompting { .. } => return Err(GreeterError::NotYetAuthenticated),
            AuthState::Idle | AuthState::SessionStarted { .. } => {
                return Err(GreeterError::NotAuthenticating);
            },
        };

        self.session.state =
            AuthState::SessionStarted { user: user.clone(), session: session.to_string() };

        Ok(TerminalEffect::SessionStarted { user, session: session.to_string() })
    }

    /// Install an autologin configuration and arm its timer.
    ///
    /// Any previously armed timer is cancelled first.
    pub fn arm_autologin(&mut self, config: AutologinConfig, now: Instant) -> Vec<GreeterAction> {
        let mut actions = self.disarm();

        if !config.is_configured() || config.timeout_ms == 0 {
            tracing::debug!("autologin not configured");
            return actions;
        }

        let token = self.next_token;
        self.next_token += 1;

        let delay = Duration::from_millis(config.timeout_ms);
        self.armed = Some(ArmedTimer { token, armed_at: now, delay });
        tracing::info!(target = ?config.target(), ?delay, token, "autologin armed");
        self.autologin = config;

        actions.push(GreeterAction::ArmAutologin { token, delay });
        actions
    }

    /// Cancel autologin. The authentication session is not affected.
    pub fn cancel_autologin(&mut self) -> Vec<GreeterAction> {
        self.autologin = AutologinConfig::default();
        self.disarm()
    }

    /// The timer armed with `token` elapsed.
    ///
    /// Stale tokens (cancelled, superseded, already fired) are ignored.
    /// Otherwise the configured target is authenticated directly, as if it
    /// had been prompted and answered correctly. A timer that expires during
    /// a manual authentication clears the autologin configuration.
    pub fn autologin_timer_fired(&mut self, token: u64) -> Vec<GreeterAction> {
        match self.armed {
            Some(timer) if timer.token == token => self.armed = None,
            _ => {
                tracing::debug!(token, "ignoring stale autologin timer");
                return vec![];
            },
        }

        let Some(target) = self.autologin.target().map(str::to_string) else {
            return vec![];
        };

        if self.session.in_authentication() {
            tracing::warn!(
                target = %target,
                "autologin timer expired during a manual authentication, skipping"
            );
            self.autologin = AutologinConfig::default();
            return vec![];
        }

        tracing::info!(user = %target, "autologin timer expired");
        self.session.state = AuthState::Authenticated { user: target };

        vec![GreeterAction::AutologinTimerExpired, GreeterAction::AuthenticationComplete]
    }

    /// Return to the initial shape, keeping the token counter so timers from
    /// before the reset stay stale.
    pub fn reset(&mut self) -> Vec<GreeterAction> {
        let actions = self.disarm();
        self.session = AuthenticationSession::default();
        self.autologin = AutologinConfig::default();
        actions
    }

    fn disarm(&mut self) -> Vec<GreeterAction> {
        match self.armed.take() {
            Some(timer) => {
                tracing::debug!(token = timer.token, "autologin timer disarmed");
                vec![GreeterAction::CancelAutologinTimer { token: timer.token }]
            },
            None => vec![],
        }
    }

    fn ensure_idle(&self) -> Result<(), GreeterError> {
        match self.session.pending_user() {
            Some(user) => Err(GreeterError::AlreadyAuthenticating { user: user.to_string() }),
            None => Ok(()),
        }
    }
}
