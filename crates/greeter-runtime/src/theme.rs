//! Theme-facing callbacks.
//!
//! The driver turns the greeter's theme actions into calls on a
//! [`ThemeHooks`] implementation. Every hook has a default that only logs,
//! so a theme implements the ones it cares about.

use std::sync::{Arc, Mutex, PoisonError};

use greeter_core::{MessageKind, PromptKind, TerminalEffect};

/// Callbacks a theme receives.
///
/// Hooks run while the driver holds the greeter; they must not block.
pub trait ThemeHooks: Send + Sync + 'static {
    /// Ask the user for input.
    fn show_prompt(&self, text: &str, kind: PromptKind) {
        tracing::info!(?kind, "prompt: {text}");
    }

    /// Show a message.
    fn show_message(&self, text: &str, kind: MessageKind) {
        match kind {
            MessageKind::Info => tracing::info!("message: {text}"),
            MessageKind::Error => tracing::warn!("message: {text}"),
        }
    }

    /// The pending user is authenticated.
    fn authentication_complete(&self) {
        tracing::info!("authentication complete");
    }

    /// The autologin delay elapsed.
    fn autologin_timer_expired(&self) {
        tracing::info!("autologin timer expired");
    }

    /// Datasets are loaded.
    fn ready(&self, num_users: usize) {
        tracing::info!(num_users, "ready");
    }

    /// User-visible notice.
    fn notify(&self, message: &str) {
        tracing::info!("notice: {message}");
    }

    /// The simulated session ended. The greeter has already been reset.
    fn terminal(&self, effect: &TerminalEffect) {
        tracing::info!(%effect, "terminal effect");
    }
}

/// Theme that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingTheme;

impl ThemeHooks for LoggingTheme {}

/// A hook invocation, as recorded by [`RecordingTheme`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeEvent {
    /// `show_prompt`
    Prompt(String, PromptKind),
    /// `show_message`
    Message(String, MessageKind),
    /// `authentication_complete`
    AuthenticationComplete,
    /// `autologin_timer_expired`
    AutologinTimerExpired,
    /// `ready`
    Ready(usize),
    /// `notify`
    Notify(String),
    /// `terminal`
    Terminal(TerminalEffect),
}

/// Theme that records every hook call. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingTheme {
    events: Arc<Mutex<Vec<ThemeEvent>>>,
}

impl RecordingTheme {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far.
    pub fn events(&self) -> Vec<ThemeEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&ThemeEvent) -> bool) -> usize {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.iter().filter(|e| predicate(e)).count()
    }

    fn record(&self, event: ThemeEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}

impl ThemeHooks for RecordingTheme {
    fn show_prompt(&self, text: &str, kind: PromptKind) {
        self.record(ThemeEvent::Prompt(text.to_string(), kind));
    }

    fn show_message(&self, text: &str, kind: MessageKind) {
        self.record(ThemeEvent::Message(text.to_string(), kind));
    }

    fn authentication_complete(&self) {
        self.record(ThemeEvent::AuthenticationComplete);
    }

    fn autologin_timer_expired(&self) {
        self.record(ThemeEvent::AutologinTimerExpired);
    }

    fn ready(&self, num_users: usize) {
        self.record(ThemeEvent::Ready(num_users));
    }

    fn notify(&self, message: &str) {
        self.record(ThemeEvent::Notify(message.to_string()));
    }

    fn terminal(&self, effect: &TerminalEffect) {
        self.record(ThemeEvent::Terminal(effect.clone()));
    }
}
