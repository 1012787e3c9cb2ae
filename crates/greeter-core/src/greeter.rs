//! Greeter state machine.
//!
//! The `Greeter` is the instance theme code talks to. It owns the
//! authentication controller, the power gateway, the dataset loader of the
//! current generation and the values derived when the datasets become ready.
//! Pure state machine: returns actions, the driver handles I/O.
//!
//! Every public operation, typed or dynamic, goes through [`Greeter::call`]:
//! the call is logged, legacy names are intercepted, the arguments are
//! checked against the operation's signature and only then is the operation
//! dispatched. A rejected call leaves the greeter unchanged.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::{
    auth::{AuthState, AuthenticationController},
    config::GreeterConfig,
    contract::{Operation, TypeTag},
    dataset::{Dataset, DatasetLoader, Datasets, FetchResult},
    env::Environment,
    error::GreeterError,
    event::{GreeterAction, GreeterEvent, Reply, TerminalEffect},
    legacy::{LegacyField, LegacyMethod, LegacyPropertyBridge},
    power::{PowerAction, PowerActionGateway},
    types::{Account, AutologinConfig, LocaleOption, SessionOption},
};

/// Read-only properties reachable through [`Greeter::property`].
pub const PROPERTIES: [&str; 26] = [
    "authentication_user",
    "autologin_guest",
    "autologin_timeout",
    "autologin_user",
    "can_hibernate",
    "can_restart",
    "can_shutdown",
    "can_suspend",
    "default_session",
    "has_guest_account",
    "hide_users",
    "hostname",
    "in_authentication",
    "is_authenticated",
    "language",
    "languages",
    "layout",
    "layouts",
    "lock_hint",
    "num_users",
    "select_guest_hint",
    "select_user_hint",
    "sessions",
    "users",
    "ready",
    "generation",
];

/// Values populated by the ready continuation.
#[derive(Debug, Clone, Default)]
struct Loaded {
    ready: bool,
    accounts: Vec<Account>,
    languages: Vec<LocaleOption>,
    layouts: Vec<LocaleOption>,
    sessions: Vec<SessionOption>,
    default_session: Option<String>,
    language: Option<String>,
    layout: Option<String>,
    num_users: usize,
}

/// Point-in-time view of a greeter, for consoles and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GreeterSnapshot {
    /// Current generation.
    pub generation: u64,
    /// Whether the ready continuation ran.
    pub ready: bool,
    /// User being authenticated.
    pub authentication_user: Option<String>,
    /// Whether an authentication is in progress.
    pub in_authentication: bool,
    /// Whether the pending user is authenticated.
    pub is_authenticated: bool,
    /// Number of accounts.
    pub num_users: usize,
    /// Selected language.
    pub language: Option<String>,
    /// Selected layout.
    pub layout: Option<String>,
    /// Default session.
    pub default_session: Option<String>,
    /// Autologin configuration.
    pub autologin: AutologinConfig,
}

/// Greeter state machine.
///
/// # Type Parameters
///
/// - `E`: Environment implementation for time/randomness
pub struct Greeter<E: Environment> {
    /// Construction parameters. Survive resets.
    config: GreeterConfig,

    /// Capability gate.
    power: PowerActionGateway,

    /// Authentication state and autologin timer.
    auth: AuthenticationController,

    /// Retired fields.
    legacy: LegacyPropertyBridge,

    /// Loader of the current generation, shared with fetch tasks.
    loader: Arc<DatasetLoader>,

    /// Bumped on every reset.
    generation: u64,

    loaded: Loaded,

    /// Environment for time/randomness.
    env: E,
}

impl<E: Environment> Greeter<E> {
    /// Create a greeter.
    ///
    /// Returns the initial actions: one [`GreeterAction::FetchDataset`] per
    /// dataset when `autofill` is set, nothing otherwise.
    pub fn new(env: E, config: GreeterConfig) -> (Self, Vec<GreeterAction>) {
        let power = PowerActionGateway::new(config.effective_capabilities());
        let mut greeter = Self {
            config,
            power,
            auth: AuthenticationController::new(),
            legacy: LegacyPropertyBridge,
            loader: Arc::new(DatasetLoader::new(0)),
            generation: 0,
            loaded: Loaded::default(),
            env,
        };

        let actions = greeter.request_datasets();
        (greeter, actions)
    }

    /// Process an event and return resulting actions.
    ///
    /// # Errors
    ///
    /// Returns `GreeterError` if a call is rejected or a dataset fails to
    /// load.
    pub fn handle(&mut self, event: GreeterEvent) -> Result<Vec<GreeterAction>, GreeterError> {
        match event {
            GreeterEvent::Call { name, args } => self.call(&name, &args).map(|reply| reply.actions),
            GreeterEvent::DatasetFetched { dataset, generation, response } => {
                self.dataset_fetched(dataset, generation, response)
            },
            GreeterEvent::DatasetsReady(datasets) => Ok(self.datasets_ready(datasets)),
            GreeterEvent::AutologinTimerFired { token } => {
                Ok(self.auth.autologin_timer_fired(token))
            },
        }
    }

    /// Call a public operation by name with dynamic arguments.
    ///
    /// # Errors
    ///
    /// - [`GreeterError::Deprecation`] for retired method names
    /// - [`GreeterError::UnknownOperation`] for names nobody ever defined
    /// - [`GreeterError::Arity`] / [`GreeterError::Type`] for bad arguments
    /// - whatever the operation itself rejects
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Reply, GreeterError> {
        let types: Vec<_> = args.iter().map(|arg| TypeTag::of(arg).as_str()).collect();
        tracing::info!(operation = name, argc = args.len(), ?types, "call");

        if let Some(method) = LegacyMethod::from_name(name) {
            return Err(method.call());
        }

        let Some(operation) = Operation::from_name(name) else {
            tracing::warn!(operation = name, "unknown operation");
            return Err(GreeterError::UnknownOperation { name: name.to_string() });
        };

        let result = operation.check(args).and_then(|()| self.dispatch(operation, args));
        if let Err(error) = &result {
            tracing::warn!(operation = name, kind = error.kind(), %error, "call rejected");
        }
        result
    }

    fn dispatch(&mut self, operation: Operation, args: &[Value]) -> Result<Reply, GreeterError> {
        // Signatures are checked; string arguments are present.
        let text = args.first().and_then(Value::as_str).unwrap_or_default();

        let actions = match operation {
            Operation::Authenticate => self.auth.authenticate(text, &self.loaded.accounts)?,
            Operation::AuthenticateAsGuest => {
                self.auth.authenticate_as_guest(self.power.capabilities())?
            },
            Operation::CancelAuthentication => {
                self.auth.cancel_authentication();
                vec![]
            },
            Operation::CancelAutologin => self.auth.cancel_autologin(),
            Operation::Respond => self.auth.respond(text)?,
            Operation::StartSession => {
                let effect = self.auth.start_session(text)?;
                if !self.loaded.sessions.iter().any(|session| session.key == text) {
                    tracing::warn!(session = text, "session is not in sessions.json");
                }
                self.terminate(effect)
            },
            Operation::Hibernate => self.power_action(PowerAction::Hibernate)?,
            Operation::Restart => self.power_action(PowerAction::Restart)?,
            Operation::Shutdown => self.power_action(PowerAction::Shutdown)?,
            Operation::Suspend => self.power_action(PowerAction::Suspend)?,
            Operation::SetLanguage => {
                self.loaded.language = Some(text.to_string());
                vec![]
            },
            Operation::GetHint => {
                let value = self.config.hint(text).unwrap_or(Value::Null);
                return Ok(Reply { value, actions: vec![] });
            },
        };

        Ok(Reply::actions(actions))
    }

    /// Begin authenticating `username`.
    ///
    /// # Errors
    ///
    /// See [`AuthenticationController::authenticate`].
    pub fn authenticate(&mut self, username: &str) -> Result<Vec<GreeterAction>, GreeterError> {
        self.call_actions(Operation::Authenticate, &[Value::from(username)])
    }

    /// Begin authenticating the guest account.
    ///
    /// # Errors
    ///
    /// `CapabilityDenied` without a guest account, `AlreadyAuthenticating`
    /// when not idle.
    pub fn authenticate_as_guest(&mut self) -> Result<Vec<GreeterAction>, GreeterError> {
        self.call_actions(Operation::AuthenticateAsGuest, &[])
    }

    /// Abort any authentication.
    ///
    /// # Errors
    ///
    /// Never fails for well-formed calls.
    pub fn cancel_authentication(&mut self) -> Result<Vec<GreeterAction>, GreeterError> {
        self.call_actions(Operation::CancelAuthentication, &[])
    }

    /// Cancel autologin.
    ///
    /// # Errors
    ///
    /// Never fails for well-formed calls.
    pub fn cancel_autologin(&mut self) -> Result<Vec<GreeterAction>, GreeterError> {
        self.call_actions(Operation::CancelAutologin, &[])
    }

    /// Answer the pending prompt.
    ///
    /// # Errors
    ///
    /// `NotAuthenticating` when nothing is prompting.
    pub fn respond(&mut self, text: &str) -> Result<Vec<GreeterAction>, GreeterError> {
        self.call_actions(Operation::Respond, &[Value::from(text)])
    }

    /// Start `session` for the authenticated user and reset.
    ///
    /// # Errors
    ///
    /// `NotAuthenticating` or `NotYetAuthenticated`.
    pub fn start_session(&mut self, session: &str) -> Result<Vec<GreeterAction>, GreeterError> {
        self.call_actions(Operation::StartSession, &[Value::from(session)])
    }

    /// Hibernate.
    ///
    /// # Errors
    ///
    /// `CapabilityDenied` unless `can_hibernate`.
    pub fn hibernate(&mut self) -> Result<Vec<GreeterAction>, GreeterError> {
        self.call_actions(Operation::Hibernate, &[])
    }

    /// Restart.
    ///
    /// # Errors
    ///
    /// `CapabilityDenied` unless `can_restart`.
    pub fn restart(&mut self) -> Result<Vec<GreeterAction>, GreeterError> {
        self.call_actions(Operation::Restart, &[])
    }

    /// Shut down.
    ///
    /// # Errors
    ///
    /// `CapabilityDenied` unless `can_shutdown`.
    pub fn shutdown(&mut self) -> Result<Vec<GreeterAction>, GreeterError> {
        self.call_actions(Operation::Shutdown, &[])
    }

    /// Suspend.
    ///
    /// # Errors
    ///
    /// `CapabilityDenied` unless `can_suspend`.
    pub fn suspend(&mut self) -> Result<Vec<GreeterAction>, GreeterError> {
        self.call_actions(Operation::Suspend, &[])
    }

    /// Select a language.
    ///
    /// # Errors
    ///
    /// Never fails for well-formed calls.
    pub fn set_language(&mut self, language: &str) -> Result<Vec<GreeterAction>, GreeterError> {
        self.call_actions(Operation::SetLanguage, &[Value::from(language)])
    }

    /// Look up a hint; `null` when it is not set.
    ///
    /// # Errors
    ///
    /// Never fails for well-formed calls.
    pub fn get_hint(&mut self, name: &str) -> Result<Value, GreeterError> {
        self.call(Operation::GetHint.name(), &[Value::from(name)]).map(|reply| reply.value)
    }

    fn call_actions(
        &mut self,
        operation: Operation,
        args: &[Value],
    ) -> Result<Vec<GreeterAction>, GreeterError> {
        self.call(operation.name(), args).map(|reply| reply.actions)
    }

    /// Read a property by name.
    ///
    /// # Errors
    ///
    /// [`GreeterError::Deprecation`] for retired fields,
    /// [`GreeterError::UnknownProperty`] otherwise.
    pub fn property(&self, name: &str) -> Result<Value, GreeterError> {
        if let Some(field) = LegacyField::from_name(name) {
            let Err(error) = self.legacy.read(field);
            return Err(error);
        }

        let caps = self.power.capabilities();
        let session = self.auth.session();
        let autologin = self.auth.autologin();

        let value = match name {
            "authentication_user" => to_value(session.pending_user()),
            "autologin_guest" => Value::Bool(autologin.guest),
            "autologin_timeout" => Value::from(autologin.timeout_ms),
            "autologin_user" => to_value(&autologin.user),
            "can_hibernate" => Value::Bool(caps.can_hibernate),
            "can_restart" => Value::Bool(caps.can_restart),
            "can_shutdown" => Value::Bool(caps.can_shutdown),
            "can_suspend" => Value::Bool(caps.can_suspend),
            "default_session" => to_value(&self.loaded.default_session),
            "has_guest_account" => Value::Bool(caps.has_guest_account),
            "hide_users" => Value::Bool(self.config.hide_users),
            "hostname" => to_value(&self.config.hostname),
            "in_authentication" => Value::Bool(session.in_authentication()),
            "is_authenticated" => Value::Bool(session.is_authenticated()),
            "language" => to_value(&self.loaded.language),
            "languages" => to_value(&self.loaded.languages),
            "layout" => to_value(&self.loaded.layout),
            "layouts" => to_value(&self.loaded.layouts),
            "lock_hint" => Value::Bool(self.config.lock_hint),
            "num_users" => Value::from(self.loaded.num_users),
            "select_guest_hint" => Value::Bool(self.config.select_guest_hint),
            "select_user_hint" => to_value(&self.config.select_user_hint),
            "sessions" => to_value(&self.loaded.sessions),
            "users" => to_value(&self.loaded.accounts),
            "ready" => Value::Bool(self.loaded.ready),
            "generation" => Value::from(self.generation),
            _ => {
                tracing::warn!(property = name, "unknown property");
                return Err(GreeterError::UnknownProperty { name: name.to_string() });
            },
        };

        Ok(value)
    }

    /// Write a property by name. Always fails.
    ///
    /// # Errors
    ///
    /// [`GreeterError::Deprecation`] for retired fields,
    /// [`GreeterError::ReadOnlyProperty`] for current ones,
    /// [`GreeterError::UnknownProperty`] otherwise.
    pub fn set_property(&mut self, name: &str, value: Value) -> Result<(), GreeterError> {
        if let Some(field) = LegacyField::from_name(name) {
            return self.legacy.write(field, value);
        }

        let error = if PROPERTIES.contains(&name) {
            GreeterError::ReadOnlyProperty { name: name.to_string() }
        } else {
            GreeterError::UnknownProperty { name: name.to_string() }
        };
        tracing::warn!(property = name, %error, "property write rejected");
        Err(error)
    }

    /// Accessors for the retired fields.
    pub fn legacy(&mut self) -> &mut LegacyPropertyBridge {
        &mut self.legacy
    }

    /// A fetch for `dataset` completed.
    ///
    /// Completions for an older generation are dropped. Returns the ready
    /// continuation's actions when this completion fired the barrier.
    ///
    /// # Errors
    ///
    /// [`GreeterError::DatasetLoad`] when the dataset failed.
    pub fn dataset_fetched(
        &mut self,
        dataset: Dataset,
        generation: u64,
        response: FetchResult,
    ) -> Result<Vec<GreeterAction>, GreeterError> {
        if generation != self.generation {
            tracing::debug!(%dataset, generation, current = self.generation, "stale fetch");
            return Ok(vec![]);
        }

        match self.loader.complete(dataset, response)? {
            Some(datasets) => Ok(self.datasets_ready(datasets)),
            None => Ok(vec![]),
        }
    }

    /// Run the ready continuation for `datasets`.
    ///
    /// Seeds the defaults, assigns every account a simulated login state and
    /// session, arms autologin when configured and announces readiness.
    /// Payloads from an older generation, or arriving before the current
    /// loader's barrier fired, are discarded.
    pub fn datasets_ready(&mut self, datasets: Datasets) -> Vec<GreeterAction> {
        if datasets.generation != self.generation
            || datasets.generation != self.loader.generation()
        {
            tracing::debug!(
                generation = datasets.generation,
                current = self.generation,
                "discarding stale readiness"
            );
            return vec![];
        }
        if !self.loader.has_fired() {
            tracing::warn!(generation = self.generation, "readiness before the barrier fired");
            return vec![];
        }
        if self.loaded.ready {
            return vec![];
        }

        let Datasets { mut accounts, languages, layouts, sessions, .. } = datasets;

        for account in &mut accounts {
            account.logged_in = self.env.random_bool();
            account.session = self
                .env
                .random_index(sessions.len())
                .and_then(|index| sessions.get(index))
                .map(|session| session.name.clone());
        }

        let num_users = accounts.len();
        self.loaded = Loaded {
            ready: true,
            default_session: sessions.first().map(|session| session.name.clone()),
            language: languages.first().map(|language| language.name.clone()),
            layout: layouts.first().map(|layout| layout.name.clone()),
            num_users,
            accounts,
            languages,
            layouts,
            sessions,
        };

        let mut actions = self.arm_autologin();
        tracing::info!(num_users, generation = self.generation, "greeter ready");
        actions.push(GreeterAction::Ready { num_users });
        actions
    }

    fn arm_autologin(&mut self) -> Vec<GreeterAction> {
        if self.config.autologin_delay().is_none() {
            return vec![];
        }

        let timeout_ms = self.config.autologin_timeout_seconds.saturating_mul(1000);
        let config = if self.config.auto_guest {
            AutologinConfig::for_guest(timeout_ms)
        } else if let Some(first) = self.loaded.accounts.first() {
            AutologinConfig::for_user(first.username.clone(), timeout_ms)
        } else {
            tracing::warn!("autologin configured but there are no accounts");
            return vec![];
        };

        self.auth.arm_autologin(config, self.env.now())
    }

    fn power_action(&mut self, action: PowerAction) -> Result<Vec<GreeterAction>, GreeterError> {
        let effect = self.power.authorize(action)?;
        Ok(self.terminate(effect))
    }

    /// Notify, emit the terminal effect and reset.
    fn terminate(&mut self, effect: TerminalEffect) -> Vec<GreeterAction> {
        tracing::info!(%effect, "terminal effect");
        let mut actions = vec![
            GreeterAction::Notify { message: effect.to_string() },
            GreeterAction::Terminal(effect),
        ];
        actions.extend(self.reset());
        actions
    }

    /// Return to the freshly constructed shape under a new generation.
    ///
    /// Authentication and autologin are discarded, the loaded values are
    /// cleared and, with `autofill`, the datasets are requested again.
    pub fn reset(&mut self) -> Vec<GreeterAction> {
        self.generation += 1;
        tracing::debug!(generation = self.generation, "greeter reset");

        let mut actions = self.auth.reset();
        self.loader = Arc::new(DatasetLoader::new(self.generation));
        self.loaded = Loaded::default();
        actions.extend(self.request_datasets());
        actions
    }

    fn request_datasets(&mut self) -> Vec<GreeterAction> {
        if !self.config.autofill {
            return vec![];
        }

        Dataset::ALL
            .into_iter()
            .filter(|&dataset| self.loader.request(dataset))
            .map(|dataset| GreeterAction::FetchDataset { dataset, generation: self.generation })
            .collect()
    }

    /// Loader of the current generation.
    pub fn loader(&self) -> Arc<DatasetLoader> {
        Arc::clone(&self.loader)
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the ready continuation ran for this generation.
    pub fn is_ready(&self) -> bool {
        self.loaded.ready
    }

    /// Construction parameters.
    pub fn config(&self) -> &GreeterConfig {
        &self.config
    }

    /// Authentication state.
    pub fn auth_state(&self) -> &AuthState {
        self.auth.session().state()
    }

    /// Autologin configuration.
    pub fn autologin(&self) -> &AutologinConfig {
        self.auth.autologin()
    }

    /// Accounts, with their simulated login state.
    pub fn users(&self) -> &[Account] {
        &self.loaded.accounts
    }

    /// Languages.
    pub fn languages(&self) -> &[LocaleOption] {
        &self.loaded.languages
    }

    /// Keyboard layouts.
    pub fn layouts(&self) -> &[LocaleOption] {
        &self.loaded.layouts
    }

    /// Sessions.
    pub fn sessions(&self) -> &[SessionOption] {
        &self.loaded.sessions
    }

    /// Number of accounts. `0` until ready.
    pub fn num_users(&self) -> usize {
        self.loaded.num_users
    }

    /// Selected language.
    pub fn language(&self) -> Option<&str> {
        self.loaded.language.as_deref()
    }

    /// Selected keyboard layout.
    pub fn layout(&self) -> Option<&str> {
        self.loaded.layout.as_deref()
    }

    /// Default session.
    pub fn default_session(&self) -> Option<&str> {
        self.loaded.default_session.as_deref()
    }

    /// Capture the observable state.
    pub fn snapshot(&self) -> GreeterSnapshot {
        let session = self.auth.session();
        GreeterSnapshot {
            generation: self.generation,
            ready: self.loaded.ready,
            authentication_user: session.pending_user().map(str::to_string),
            in_authentication: session.in_authentication(),
            is_authenticated: session.is_authenticated(),
            num_users: self.loaded.num_users,
            language: self.loaded.language.clone(),
            layout: self.loaded.layout.clone(),
            default_session: self.loaded.default_session.clone(),
            autologin: self.auth.autologin().clone(),
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, Instant},
    };

    use serde_json::json;

    use super::*;
    use crate::{dataset::FetchResponse, event::PromptKind, legacy::LegacyKind};

    #[derive(Clone, Default)]
    struct TestEnv {
        counter: Arc<AtomicU64>,
    }

    impl Environment for TestEnv {
        fn now(&self) -> Instant {
            Instant::now()
        }

        fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            std::future::ready(())
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let value = self.counter.fetch_add(1, Ordering::Relaxed);
            let bytes = value.to_be_bytes();
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = bytes[i % 8];
            }
        }
    }

    fn body(dataset: Dataset) -> FetchResponse {
        FetchResponse::ok(match dataset {
            Dataset::Accounts => r#"[{"username":"alice"},{"username":"bob"}]"#,
            Dataset::Languages => r#"[{"code":"en_US","name":"English"}]"#,
            Dataset::Layouts => r#"[{"code":"us","name":"English (US)"}]"#,
            Dataset::Sessions => {
                r#"[{"key":"gnome","name":"GNOME"},{"key":"xfce","name":"Xfce"}]"#
            },
        })
    }

    fn ready_greeter(config: GreeterConfig) -> (Greeter<TestEnv>, Vec<GreeterAction>) {
        let config = GreeterConfig { autofill: true, ..config };
        let (mut greeter, _) = Greeter::new(TestEnv::default(), config);

        let mut actions = vec![];
        for dataset in Dataset::ALL {
            actions.extend(greeter.dataset_fetched(dataset, 0, Ok(body(dataset))).unwrap());
        }
        (greeter, actions)
    }

    #[test]
    fn autofill_requests_all_datasets() {
        let config = GreeterConfig { autofill: true, ..GreeterConfig::default() };
        let (greeter, actions) = Greeter::new(TestEnv::default(), config);

        assert_eq!(actions.len(), 4);
        assert!(
            actions
                .iter()
                .all(|a| matches!(a, GreeterAction::FetchDataset { generation: 0, .. }))
        );
        assert!(!greeter.is_ready());
    }

    #[test]
    fn without_autofill_nothing_is_requested() {
        let (greeter, actions) = Greeter::new(TestEnv::default(), GreeterConfig::default());
        assert!(actions.is_empty());
        assert_eq!(greeter.num_users(), 0);
    }

    #[test]
    fn ready_seeds_defaults() {
        let (greeter, actions) = ready_greeter(GreeterConfig::default());

        assert_eq!(actions, vec![GreeterAction::Ready { num_users: 2 }]);
        assert_eq!(greeter.num_users(), 2);
        assert_eq!(greeter.default_session(), Some("GNOME"));
        assert_eq!(greeter.language(), Some("English"));
        assert_eq!(greeter.layout(), Some("English (US)"));

        for account in greeter.users() {
            let session = account.session.as_deref().unwrap();
            assert!(["GNOME", "Xfce"].contains(&session));
        }
    }

    #[test]
    fn ready_arms_autologin_for_first_user() {
        let config = GreeterConfig { autologin_timeout_seconds: 2, ..GreeterConfig::default() };
        let (greeter, actions) = ready_greeter(config);

        assert_eq!(actions, vec![
            GreeterAction::ArmAutologin { token: 0, delay: Duration::from_secs(2) },
            GreeterAction::Ready { num_users: 2 },
        ]);
        assert_eq!(greeter.autologin(), &AutologinConfig::for_user("alice", 2000));
    }

    #[test]
    fn auto_guest_arms_guest_autologin() {
        let config = GreeterConfig {
            autologin_timeout_seconds: 1,
            auto_guest: true,
            ..GreeterConfig::default()
        };
        let (greeter, _) = ready_greeter(config);

        assert_eq!(greeter.autologin(), &AutologinConfig::for_guest(1000));
        assert_eq!(greeter.property("has_guest_account").unwrap(), json!(true));
    }

    #[test]
    fn login_flow_starts_session_and_resets() {
        let (mut greeter, _) = ready_greeter(GreeterConfig::default());

        let actions = greeter.authenticate("alice").unwrap();
        assert!(matches!(&actions[..], [GreeterAction::ShowPrompt {
            kind: PromptKind::Password,
            ..
        }]));

        assert_eq!(greeter.respond("password").unwrap(), vec![
            GreeterAction::AuthenticationComplete
        ]);

        let actions = greeter.start_session("gnome").unwrap();
        let effect = TerminalEffect::SessionStarted {
            user: "alice".to_string(),
            session: "gnome".to_string(),
        };
        assert_eq!(actions[0], GreeterAction::Notify { message: effect.to_string() });
        assert_eq!(actions[1], GreeterAction::Terminal(effect));
        assert_eq!(
            actions[2..].iter().filter(|a| matches!(a, GreeterAction::FetchDataset { .. })).count(),
            4
        );

        assert_eq!(greeter.generation(), 1);
        assert_eq!(greeter.auth_state(), &AuthState::Idle);
        assert!(!greeter.is_ready());
        assert_eq!(greeter.num_users(), 0);
    }

    #[test]
    fn rejected_calls_leave_state_unchanged() {
        let (mut greeter, _) = ready_greeter(GreeterConfig::default());
        let before = greeter.snapshot();

        assert!(matches!(greeter.call("respond", &[]), Err(GreeterError::Arity { .. })));
        assert!(matches!(
            greeter.call("authenticate", &[json!(42)]),
            Err(GreeterError::Type { position: 1, .. })
        ));
        assert!(matches!(greeter.authenticate("mallory"), Err(GreeterError::UnknownUser { .. })));
        assert!(matches!(greeter.shutdown(), Err(GreeterError::CapabilityDenied { .. })));
        assert!(matches!(greeter.start_session("gnome"), Err(GreeterError::NotAuthenticating)));

        assert_eq!(greeter.snapshot(), before);
    }

    #[test]
    fn legacy_names_raise_deprecation() {
        let (mut greeter, _) = ready_greeter(GreeterConfig::default());

        let err = greeter.call("provide_secret", &[json!("password")]).unwrap_err();
        assert!(matches!(err, GreeterError::Deprecation { kind: LegacyKind::Method, .. }));

        let err = greeter.property("default_language").unwrap_err();
        assert!(matches!(err, GreeterError::Deprecation { replacement: "language", .. }));

        let err = greeter.set_property("timed_login_delay", json!(3)).unwrap_err();
        assert!(matches!(err, GreeterError::Deprecation { kind: LegacyKind::Property, .. }));

        let Err(err) = greeter.legacy().select_user();
        assert!(matches!(err, GreeterError::Deprecation { replacement: "select_user_hint", .. }));
    }

    #[test]
    fn properties_are_read_only() {
        let (mut greeter, _) = ready_greeter(GreeterConfig::default());

        assert_eq!(greeter.property("num_users").unwrap(), json!(2));
        assert_eq!(
            greeter.set_property("num_users", json!(5)),
            Err(GreeterError::ReadOnlyProperty { name: "num_users".to_string() })
        );
        assert_eq!(
            greeter.property("colour"),
            Err(GreeterError::UnknownProperty { name: "colour".to_string() })
        );
        assert!(matches!(
            greeter.call("fly", &[]),
            Err(GreeterError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn every_listed_property_is_readable() {
        let (greeter, _) = ready_greeter(GreeterConfig::default());
        for name in PROPERTIES {
            assert!(greeter.property(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn set_language_and_hints() {
        let config = GreeterConfig { hide_users: true, ..GreeterConfig::default() };
        let (mut greeter, _) = ready_greeter(config);

        greeter.set_language("Deutsch").unwrap();
        assert_eq!(greeter.language(), Some("Deutsch"));

        assert_eq!(greeter.get_hint("hide-users").unwrap(), json!(true));
        assert_eq!(greeter.get_hint("missing").unwrap(), Value::Null);
    }

    #[test]
    fn stale_generation_is_discarded() {
        let config = GreeterConfig { autofill: true, ..GreeterConfig::default() };
        let (mut greeter, _) = Greeter::new(TestEnv::default(), config);
        let old_loader = greeter.loader();

        greeter.reset();
        assert_eq!(greeter.generation(), 1);

        for dataset in Dataset::ALL {
            let actions = greeter.dataset_fetched(dataset, 0, Ok(body(dataset))).unwrap();
            assert!(actions.is_empty());
        }

        // A readiness payload from the old loader is also dropped.
        for dataset in Dataset::ALL {
            old_loader.complete(dataset, Ok(body(dataset))).ok();
        }
        let stale = Datasets {
            generation: 0,
            accounts: vec![],
            languages: vec![],
            layouts: vec![],
            sessions: vec![],
        };
        assert!(greeter.datasets_ready(stale).is_empty());
        assert!(!greeter.is_ready());
    }

    #[test]
    fn readiness_before_the_barrier_is_ignored() {
        let config = GreeterConfig { autofill: true, ..GreeterConfig::default() };
        let (mut greeter, _) = Greeter::new(TestEnv::default(), config);

        let early = Datasets {
            generation: 0,
            accounts: vec![],
            languages: vec![],
            layouts: vec![],
            sessions: vec![],
        };
        assert!(greeter.handle(GreeterEvent::DatasetsReady(early)).unwrap().is_empty());
        assert!(!greeter.is_ready());

        let mut actions = vec![];
        for dataset in Dataset::ALL {
            actions.extend(greeter.dataset_fetched(dataset, 0, Ok(body(dataset))).unwrap());
        }

        assert_eq!(actions, vec![GreeterAction::Ready { num_users: 2 }]);
        assert!(greeter.is_ready());
        assert_eq!(greeter.property("num_users").unwrap(), json!(2));
        assert_eq!(greeter.property("default_session").unwrap(), json!("GNOME"));
    }

    #[test]
    fn dataset_failure_stalls_readiness() {
        let config = GreeterConfig { autofill: true, ..GreeterConfig::default() };
        let (mut greeter, _) = Greeter::new(TestEnv::default(), config);

        let err = greeter
            .dataset_fetched(Dataset::Layouts, 0, Ok(FetchResponse::status(404)))
            .unwrap_err();
        assert!(err.is_recoverable());

        for dataset in [Dataset::Accounts, Dataset::Languages, Dataset::Sessions] {
            assert!(greeter.dataset_fetched(dataset, 0, Ok(body(dataset))).unwrap().is_empty());
        }
        assert!(!greeter.is_ready());
    }

    #[test]
    fn autologin_timer_authenticates() {
        let config = GreeterConfig { autologin_timeout_seconds: 1, ..GreeterConfig::default() };
        let (mut greeter, _) = ready_greeter(config);

        let actions = greeter.handle(GreeterEvent::AutologinTimerFired { token: 0 }).unwrap();
        assert_eq!(actions, vec![
            GreeterAction::AutologinTimerExpired,
            GreeterAction::AuthenticationComplete
        ]);
        assert_eq!(greeter.auth_state(), &AuthState::Authenticated { user: "alice".to_string() });
    }

    #[test]
    fn power_action_reset_cancels_autologin() {
        let config = GreeterConfig {
            autologin_timeout_seconds: 1,
            capabilities: crate::types::CapabilityFlags {
                can_restart: true,
                ..Default::default()
            },
            ..GreeterConfig::default()
        };
        let (mut greeter, _) = ready_greeter(config);

        let actions = greeter.restart().unwrap();
        assert_eq!(actions[0], GreeterAction::Notify { message: "System restarted.".to_string() });
        assert_eq!(actions[1], GreeterAction::Terminal(TerminalEffect::Restart));
        assert!(actions.contains(&GreeterAction::CancelAutologinTimer { token: 0 }));

        assert!(greeter.handle(GreeterEvent::AutologinTimerFired { token: 0 }).unwrap().is_empty());
        assert_eq!(greeter.autologin(), &AutologinConfig::default());
    }
}
