//! Reference greeter.
//!
//! Tracks only what a theme can observe, with the fixture datasets baked in:
//! the accounts are `alice`, `bob`, `carol`, the first language is
//! `English`. Loading is treated as instantaneous, so after every reset the
//! model is immediately ready again.

use greeter_core::{GUEST_USERNAME, GreeterConfig, PowerAction};

use super::operation::{Operation, OperationError, OperationResult};

/// Accounts in the fixture dataset, in file order.
pub const FIXTURE_USERS: [&str; 3] = ["alice", "bob", "carol"];

/// Name of the first fixture language.
pub const FIXTURE_LANGUAGE: &str = "English";

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// User being (or already) authenticated.
    pub authentication_user: Option<String>,
    /// Whether that user passed authentication.
    pub is_authenticated: bool,
    /// Reset counter.
    pub generation: u64,
    /// Selected language.
    pub language: Option<String>,
    /// Account the autologin timer would log in.
    pub autologin_target: Option<String>,
    /// Whether an autologin timer is pending.
    pub autologin_armed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ModelAuth {
    Idle,
    Prompting(String),
    Authenticated(String),
}

/// Model greeter - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelGreeter {
    config: GreeterConfig,
    auth: ModelAuth,
    generation: u64,
    language: Option<String>,
    autologin: Option<String>,
    armed: bool,
}

impl ModelGreeter {
    /// A loaded greeter for `config`.
    pub fn new(config: GreeterConfig) -> Self {
        let mut model = Self {
            config,
            auth: ModelAuth::Idle,
            generation: 0,
            language: None,
            autologin: None,
            armed: false,
        };
        model.load();
        model
    }

    /// Apply an operation and return the result.
    ///
    /// The result should match the real implementation's result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Authenticate { user } => self.authenticate(Operation::user_name(*user)),
            Operation::AuthenticateAsGuest => self.authenticate_as_guest(),
            Operation::Respond { correct } => self.respond(*correct),
            Operation::CancelAuthentication => {
                self.auth = ModelAuth::Idle;
                OperationResult::Ok
            },
            Operation::CancelAutologin => {
                self.autologin = None;
                self.armed = false;
                OperationResult::Ok
            },
            Operation::StartSession { .. } => self.start_session(),
            Operation::Power { kind } => self.power(Operation::power_action(*kind)),
            Operation::SetLanguage { index } => {
                self.language = Some(Operation::language_name(*index).to_string());
                OperationResult::Ok
            },
            Operation::FireAutologin => {
                self.fire_autologin();
                OperationResult::Ok
            },
            Operation::TouchLegacy { .. } => OperationResult::Error(OperationError::Deprecation),
            Operation::BadArity { .. } => OperationResult::Error(OperationError::Arity),
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        let (authentication_user, is_authenticated) = match &self.auth {
            ModelAuth::Idle => (None, false),
            ModelAuth::Prompting(user) => (Some(user.clone()), false),
            ModelAuth::Authenticated(user) => (Some(user.clone()), true),
        };

        ObservableState {
            authentication_user,
            is_authenticated,
            generation: self.generation,
            language: self.language.clone(),
            autologin_target: self.autologin.clone(),
            autologin_armed: self.armed,
        }
    }

    fn authenticate(&mut self, user: &str) -> OperationResult {
        if self.auth != ModelAuth::Idle {
            return OperationResult::Error(OperationError::AlreadyAuthenticating);
        }
        if !FIXTURE_USERS.contains(&user) {
            return OperationResult::Error(OperationError::UnknownUser);
        }

        self.auth = ModelAuth::Prompting(user.to_string());
        OperationResult::Ok
    }

    fn authenticate_as_guest(&mut self) -> OperationResult {
        if !self.config.effective_capabilities().has_guest_account {
            return OperationResult::Error(OperationError::CapabilityDenied);
        }
        if self.auth != ModelAuth::Idle {
            return OperationResult::Error(OperationError::AlreadyAuthenticating);
        }

        self.auth = ModelAuth::Prompting(GUEST_USERNAME.to_string());
        OperationResult::Ok
    }

    fn respond(&mut self, correct: bool) -> OperationResult {
        let ModelAuth::Prompting(user) = &self.auth else {
            return OperationResult::Error(OperationError::NotAuthenticating);
        };

        if correct {
            self.auth = ModelAuth::Authenticated(user.clone());
        }
        OperationResult::Ok
    }

    fn start_session(&mut self) -> OperationResult {
        match self.auth {
            ModelAuth::Authenticated(_) => {
                self.reset();
                OperationResult::Ok
            },
            ModelAuth::Prompting(_) => OperationResult::Error(OperationError::NotYetAuthenticated),
            ModelAuth::Idle => OperationResult::Error(OperationError::NotAuthenticating),
        }
    }

    fn power(&mut self, action: PowerAction) -> OperationResult {
        if !self.config.effective_capabilities().allows(action.capability()) {
            return OperationResult::Error(OperationError::CapabilityDenied);
        }

        self.reset();
        OperationResult::Ok
    }

    fn fire_autologin(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;

        if self.auth != ModelAuth::Idle {
            self.autologin = None;
        } else if let Some(target) = &self.autologin {
            self.auth = ModelAuth::Authenticated(target.clone());
        }
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.auth = ModelAuth::Idle;
        self.autologin = None;
        self.armed = false;
        self.load();
    }

    fn load(&mut self) {
        self.language = Some(FIXTURE_LANGUAGE.to_string());

        if self.config.autologin_timeout_seconds == 0 {
            return;
        }

        let target = if self.config.auto_guest { GUEST_USERNAME } else { FIXTURE_USERS[0] };
        self.autologin = Some(target.to_string());
        self.armed = true;
    }
}
