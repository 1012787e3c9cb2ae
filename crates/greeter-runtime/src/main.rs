//! Greeter mock console.
//!
//! # Usage
//!
//! ```bash
//! # Load datasets from ./json and log in interactively
//! greeter-mock --data-dir . --autofill
//!
//! # Autologin after five seconds, with guest and shutdown available
//! greeter-mock --autofill --autologin-timeout 5 --guest-account --can-shutdown
//! ```

use std::{io::Write, path::PathBuf};

use clap::Parser;
use greeter_core::{GreeterConfig, MessageKind, PromptKind, TerminalEffect};
use greeter_runtime::{
    DirectorySource, Mock, MockError, SystemEnv, ThemeHooks,
    console::{self, Command},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Mock login-manager greeter
#[derive(Parser, Debug)]
#[command(name = "greeter-mock")]
#[command(about = "Mock login-manager greeter for theme development")]
#[command(version)]
struct Args {
    /// Directory containing json/users.json, json/languages.json, ...
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Greeter configuration (JSON). Flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load the datasets at startup
    #[arg(long)]
    autofill: bool,

    /// Autologin delay in seconds (0 disables)
    #[arg(long)]
    autologin_timeout: Option<u64>,

    /// Autologin as guest (implies --guest-account)
    #[arg(long)]
    auto_guest: bool,

    /// Permit hibernate
    #[arg(long)]
    can_hibernate: bool,

    /// Permit restart
    #[arg(long)]
    can_restart: bool,

    /// Permit shutdown
    #[arg(long)]
    can_shutdown: bool,

    /// Permit suspend
    #[arg(long)]
    can_suspend: bool,

    /// Provide a guest account
    #[arg(long)]
    guest_account: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn greeter_config(&self) -> Result<GreeterConfig, MockError> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| MockError::Config(format!("{}: {e}", path.display())))?;
                serde_json::from_str(&text)?
            },
            None => GreeterConfig::default(),
        };

        config.autofill |= self.autofill;
        config.auto_guest |= self.auto_guest;
        if let Some(timeout) = self.autologin_timeout {
            config.autologin_timeout_seconds = timeout;
        }

        let caps = &mut config.capabilities;
        caps.can_hibernate |= self.can_hibernate;
        caps.can_restart |= self.can_restart;
        caps.can_shutdown |= self.can_shutdown;
        caps.can_suspend |= self.can_suspend;
        caps.has_guest_account |= self.guest_account;

        Ok(config)
    }
}

/// Writes theme callbacks to the console.
struct ConsoleTheme;

impl ConsoleTheme {
    fn line(text: std::fmt::Arguments<'_>) {
        Self::line_to(&mut std::io::stdout().lock(), text);
    }

    /// Write one callback line, logging instead of failing the hook.
    fn line_to(out: &mut impl Write, text: std::fmt::Arguments<'_>) -> bool {
        match writeln!(out, "{text}") {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%error, "failed to write theme callback to stdout");
                false
            },
        }
    }
}

impl ThemeHooks for ConsoleTheme {
    fn show_prompt(&self, text: &str, kind: PromptKind) {
        Self::line(format_args!("[prompt:{kind:?}] {text}"));
    }

    fn show_message(&self, text: &str, kind: MessageKind) {
        Self::line(format_args!("[message:{kind:?}] {text}"));
    }

    fn authentication_complete(&self) {
        Self::line(format_args!("[authentication complete]"));
    }

    fn autologin_timer_expired(&self) {
        Self::line(format_args!("[autologin timer expired]"));
    }

    fn ready(&self, num_users: usize) {
        Self::line(format_args!("[ready] {num_users} users"));
    }

    fn notify(&self, message: &str) {
        Self::line(format_args!("[notice] {message}"));
    }

    fn terminal(&self, effect: &TerminalEffect) {
        Self::line(format_args!("[reload] {effect}"));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = args.greeter_config()?;
    tracing::info!(
        data_dir = %args.data_dir.display(),
        autofill = config.autofill,
        "greeter mock starting"
    );

    let source = DirectorySource::new(&args.data_dir);
    let mock = Mock::start(SystemEnv::new(), config, source, ConsoleTheme).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = console::parse(&line) else {
            continue;
        };

        let output = match command {
            Command::Quit => break,
            Command::Help => console::HELP.to_string(),
            Command::State => serde_json::to_string_pretty(&mock.snapshot().await)?,
            Command::Get(name) => match mock.property(&name).await {
                Ok(value) => value.to_string(),
                Err(e) => MockError::from(e).to_string(),
            },
            Command::Set(name, value) => match mock.set_property(&name, value).await {
                Ok(()) => "ok".to_string(),
                Err(e) => MockError::from(e).to_string(),
            },
            Command::Call { name, args } => match mock.call(&name, &args).await {
                Ok(value) if value.is_null() => "ok".to_string(),
                Ok(value) => value.to_string(),
                Err(e) => MockError::from(e).to_string(),
            },
        };

        writeln!(std::io::stdout().lock(), "{output}")?;
    }

    tracing::info!("greeter mock exiting");
    Ok(())
}
