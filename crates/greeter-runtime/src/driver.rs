//! Tokio driver for the greeter state machine.
//!
//! `Mock` owns one [`Greeter`] behind an async mutex and executes the actions
//! it returns:
//!
//! ```text
//!   theme call ──► Mock::call ──► Greeter::call ──► actions
//!                                                     │
//!        ┌──────────────────┬─────────────────────────┼──────────────────┐
//!        ▼                  ▼                         ▼                  ▼
//!   FetchDataset       ArmAutologin          CancelAutologinTimer    theme hooks
//!   (spawn fetch)      (spawn timer)         (abort timer task)
//! ```
//!
//! Fetch tasks complete on the loader they were spawned for without taking
//! the greeter lock; only the completion that fires the readiness barrier
//! locks the greeter to run the ready continuation. A dataset failure is
//! logged and the greeter stays not ready.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use greeter_core::{
    Environment, Greeter, GreeterAction, GreeterConfig, GreeterError, GreeterEvent,
    GreeterSnapshot,
};
use serde_json::Value;
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};

use crate::{source::DatasetSource, theme::ThemeHooks};

struct Shared<E: Environment, S, T> {
    greeter: Mutex<Greeter<E>>,
    source: S,
    theme: T,
    env: E,
    /// Token and task of the armed autologin timer.
    timer: StdMutex<Option<(u64, JoinHandle<()>)>>,
    /// Generation that finished loading, `None` while not ready.
    ready: watch::Sender<Option<u64>>,
}

/// A running mock greeter.
///
/// Cheap to clone; clones drive the same greeter.
pub struct Mock<E: Environment, S: DatasetSource, T: ThemeHooks> {
    shared: Arc<Shared<E, S, T>>,
}

impl<E: Environment, S: DatasetSource, T: ThemeHooks> Clone for Mock<E, S, T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<E: Environment, S: DatasetSource, T: ThemeHooks> Mock<E, S, T> {
    /// Construct the greeter and start any dataset fetches.
    ///
    /// Must run inside a tokio runtime.
    pub async fn start(env: E, config: GreeterConfig, source: S, theme: T) -> Self {
        let (greeter, actions) = Greeter::new(env.clone(), config);
        let (ready, _) = watch::channel(None);

        let shared = Arc::new(Shared {
            greeter: Mutex::new(greeter),
            source,
            theme,
            env,
            timer: StdMutex::new(None),
            ready,
        });

        {
            let greeter = shared.greeter.lock().await;
            shared.execute(&greeter, actions);
        }

        Self { shared }
    }

    /// Call a public operation by name.
    ///
    /// # Errors
    ///
    /// Whatever the greeter rejects the call with.
    pub async fn call(&self, name: &str, args: &[Value]) -> Result<Value, GreeterError> {
        let mut greeter = self.shared.greeter.lock().await;
        let reply = greeter.call(name, args)?;
        self.shared.execute(&greeter, reply.actions);
        Ok(reply.value)
    }

    /// Read a property.
    ///
    /// # Errors
    ///
    /// `Deprecation` or `UnknownProperty`.
    pub async fn property(&self, name: &str) -> Result<Value, GreeterError> {
        self.shared.greeter.lock().await.property(name)
    }

    /// Write a property. Always fails.
    ///
    /// # Errors
    ///
    /// `Deprecation`, `ReadOnlyProperty` or `UnknownProperty`.
    pub async fn set_property(&self, name: &str, value: Value) -> Result<(), GreeterError> {
        self.shared.greeter.lock().await.set_property(name, value)
    }

    /// Observable state of the greeter.
    pub async fn snapshot(&self) -> GreeterSnapshot {
        self.shared.greeter.lock().await.snapshot()
    }

    /// Run `f` against the greeter.
    ///
    /// Actions `f` returns are executed before the lock is released.
    pub async fn with_greeter<R>(
        &self,
        f: impl FnOnce(&mut Greeter<E>) -> (R, Vec<GreeterAction>),
    ) -> R {
        let mut greeter = self.shared.greeter.lock().await;
        let (result, actions) = f(&mut greeter);
        self.shared.execute(&greeter, actions);
        result
    }

    /// Wait until the current generation has loaded all datasets.
    ///
    /// Returns the generation. Never returns while a dataset is failed.
    pub async fn wait_ready(&self) -> u64 {
        let mut rx = self.shared.ready.subscribe();
        match rx.wait_for(Option::is_some).await {
            Ok(generation) => (*generation).unwrap_or_default(),
            // The sender lives as long as `self`.
            Err(_) => 0,
        }
    }

    /// Whether the current generation is ready.
    pub fn is_ready(&self) -> bool {
        self.shared.ready.borrow().is_some()
    }

    /// Whether an autologin timer task is pending.
    pub fn autologin_pending(&self) -> bool {
        self.shared.timer().as_ref().is_some_and(|(_, task)| !task.is_finished())
    }

    /// The theme hooks.
    pub fn theme(&self) -> &T {
        &self.shared.theme
    }
}

impl<E: Environment, S: DatasetSource, T: ThemeHooks> Shared<E, S, T> {
    /// Feed an event from a background task.
    async fn dispatch(self: &Arc<Self>, event: GreeterEvent) {
        let mut greeter = self.greeter.lock().await;
        match greeter.handle(event) {
            Ok(actions) => self.execute(&greeter, actions),
            Err(e) => tracing::warn!(kind = e.kind(), "event rejected: {e}"),
        }
    }

    /// Execute greeter actions. Never awaits; long work is spawned.
    fn execute(self: &Arc<Self>, greeter: &Greeter<E>, actions: Vec<GreeterAction>) {
        for action in actions {
            match action {
                GreeterAction::FetchDataset { dataset, generation } => {
                    let loader = greeter.loader();
                    if loader.generation() != generation {
                        tracing::debug!(%dataset, generation, "skipping fetch for old generation");
                        continue;
                    }

                    let shared = Arc::clone(self);
                    tokio::spawn(async move {
                        let response = shared.source.fetch(dataset).await;
                        match loader.complete(dataset, response) {
                            Ok(Some(datasets)) => {
                                shared.dispatch(GreeterEvent::DatasetsReady(datasets)).await;
                            },
                            Ok(None) => {},
                            Err(e) => tracing::debug!(generation, "fetch task finished: {e}"),
                        }
                    });
                },

                GreeterAction::ArmAutologin { token, delay } => {
                    let shared = Arc::clone(self);
                    let task = tokio::spawn(async move {
                        shared.env.sleep(delay).await;
                        shared.dispatch(GreeterEvent::AutologinTimerFired { token }).await;
                    });

                    if let Some((old, previous)) = self.timer().replace((token, task)) {
                        tracing::debug!(token = old, "replacing autologin timer");
                        previous.abort();
                    }
                },

                GreeterAction::CancelAutologinTimer { token } => {
                    let mut timer = self.timer();
                    match timer.take() {
                        Some((armed, task)) if armed == token => task.abort(),
                        other => *timer = other,
                    }
                },

                GreeterAction::ShowPrompt { text, kind } => self.theme.show_prompt(&text, kind),
                GreeterAction::ShowMessage { text, kind } => self.theme.show_message(&text, kind),
                GreeterAction::AuthenticationComplete => self.theme.authentication_complete(),
                GreeterAction::AutologinTimerExpired => self.theme.autologin_timer_expired(),
                GreeterAction::Notify { message } => self.theme.notify(&message),

                GreeterAction::Ready { num_users } => {
                    self.ready.send_replace(Some(greeter.generation()));
                    self.theme.ready(num_users);
                },

                GreeterAction::Terminal(effect) => {
                    self.ready.send_replace(None);
                    self.theme.terminal(&effect);
                },
            }
        }
    }

    fn timer(&self) -> std::sync::MutexGuard<'_, Option<(u64, JoinHandle<()>)>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
