//! Fuzz target for the [`Greeter`] call surface
//!
//! Theme code can call anything with anything. None of it may corrupt the
//! authentication state machine.
//!
//! # Strategy
//!
//! - Call sequences: current, retired and unknown operation names
//! - Arguments: arbitrary counts and JSON types
//! - Dataset completions: fuzzed bodies, statuses and generations
//! - Timer events: arbitrary tokens, including stale and never-issued ones
//!
//! # Invariants
//!
//! - A rejected call leaves the observable state unchanged
//! - `is_authenticated` only after `respond("password")` or an issued timer
//! - Retired names never succeed
//! - `Ready` at most once per generation
//! - NEVER panic on malformed input

#![no_main]

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
    time::{Duration, Instant},
};

use arbitrary::Arbitrary;
use greeter_core::{
    Dataset, FetchResponse, Greeter, GreeterAction, GreeterConfig, GreeterEvent, LegacyField,
    LegacyMethod, Operation, SIMULATED_PASSWORD,
};
use libfuzzer_sys::fuzz_target;
use serde_json::{Value, json};

/// Counter-driven randomness; time never advances.
#[derive(Clone)]
struct FuzzEnv {
    start: Instant,
    counter: Arc<AtomicU8>,
}

impl greeter_core::Environment for FuzzEnv {
    fn now(&self) -> Instant {
        self.start
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        for byte in buffer {
            *byte = self.counter.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzArg {
    Null,
    Bool(bool),
    Number(i32),
    Text(String),
    Password,
    KnownUser(u8),
    List(Vec<u8>),
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzName {
    Current(u8),
    Retired(u8),
    Raw(String),
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzEvent {
    Call { name: FuzzName, args: Vec<FuzzArg> },
    Fetched { dataset: u8, generation_offset: u8, body: FuzzBody },
    TimerFired { token: u64 },
    ReadProperty { name: String },
    ReadRetired { field: u8 },
    WriteProperty { name: String, value: FuzzArg },
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzBody {
    Fixture,
    Status(u16),
    Transport,
    Raw(Vec<u8>),
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    autofill: bool,
    autologin_secs: u8,
    guest: bool,
    events: Vec<FuzzEvent>,
}

const USERS: [&str; 3] = ["alice", "bob", "carol"];

fn to_value(arg: &FuzzArg) -> Value {
    match arg {
        FuzzArg::Null => Value::Null,
        FuzzArg::Bool(b) => json!(b),
        FuzzArg::Number(n) => json!(n),
        FuzzArg::Text(s) => json!(s),
        FuzzArg::Password => json!(SIMULATED_PASSWORD),
        FuzzArg::KnownUser(i) => json!(USERS[usize::from(*i) % USERS.len()]),
        FuzzArg::List(items) => json!(items),
    }
}

fn name_of(name: &FuzzName) -> String {
    let name = match name {
        FuzzName::Current(i) => Operation::ALL[usize::from(*i) % Operation::ALL.len()].name(),
        FuzzName::Retired(i) => {
            LegacyMethod::ALL[usize::from(*i) % LegacyMethod::ALL.len()].name()
        },
        FuzzName::Raw(raw) => raw.as_str(),
    };
    name.to_string()
}

fn body_for(dataset: Dataset, body: &FuzzBody) -> Result<FetchResponse, String> {
    match body {
        FuzzBody::Fixture => Ok(FetchResponse::ok(match dataset {
            Dataset::Accounts => r#"[{"username":"alice"},{"username":"bob"},{"username":"carol"}]"#,
            Dataset::Languages => r#"[{"code":"en_US","name":"English"}]"#,
            Dataset::Layouts => r#"[{"code":"us","name":"English (US)"}]"#,
            Dataset::Sessions => r#"[{"key":"gnome","name":"GNOME"}]"#,
        })),
        FuzzBody::Status(code) => Ok(FetchResponse::status(*code)),
        FuzzBody::Transport => Err("connection reset".to_string()),
        FuzzBody::Raw(bytes) => Ok(FetchResponse::ok(bytes.clone())),
    }
}

fuzz_target!(|input: FuzzInput| {
    let config = GreeterConfig {
        autofill: input.autofill,
        autologin_timeout_seconds: u64::from(input.autologin_secs % 4),
        capabilities: greeter_core::CapabilityFlags {
            has_guest_account: input.guest,
            ..Default::default()
        },
        ..GreeterConfig::default()
    };
    let env = FuzzEnv { start: Instant::now(), counter: Arc::new(AtomicU8::new(0)) };
    let (mut greeter, _) = Greeter::new(env, config);

    let mut issued_tokens = HashSet::new();
    let mut ready_generations = HashSet::new();

    for event in input.events {
        let before = greeter.snapshot();

        let (result, password_sent, timer_token) = match &event {
            FuzzEvent::Call { name, args } => {
                let name = name_of(name);
                let args: Vec<Value> = args.iter().map(to_value).collect();
                let password = name == "respond"
                    && args.first().and_then(Value::as_str) == Some(SIMULATED_PASSWORD);
                let retired = LegacyMethod::from_name(&name).is_some();

                let result = greeter.call(&name, &args).map(|reply| reply.actions);
                if retired {
                    assert!(result.is_err(), "retired method {name} succeeded");
                }
                if result.is_err() {
                    assert_eq!(greeter.snapshot(), before, "rejected {name} changed state");
                }
                (result, password, None)
            },
            FuzzEvent::Fetched { dataset, generation_offset, body } => {
                let dataset = Dataset::ALL[usize::from(*dataset) % Dataset::ALL.len()];
                let generation =
                    greeter.generation().saturating_sub(u64::from(*generation_offset % 3));
                let result =
                    greeter.dataset_fetched(dataset, generation, body_for(dataset, body));
                (result, false, None)
            },
            FuzzEvent::TimerFired { token } => {
                let result = greeter.handle(GreeterEvent::AutologinTimerFired { token: *token });
                (result, false, Some(*token))
            },
            FuzzEvent::ReadProperty { name } => {
                let _ = greeter.property(name);
                (Ok(vec![]), false, None)
            },
            FuzzEvent::ReadRetired { field } => {
                let field = LegacyField::ALL[usize::from(*field) % LegacyField::ALL.len()];
                assert!(greeter.property(field.name()).is_err());
                assert!(greeter.set_property(field.name(), Value::Null).is_err());
                (Ok(vec![]), false, None)
            },
            FuzzEvent::WriteProperty { name, value } => {
                assert!(greeter.set_property(name, to_value(value)).is_err());
                assert_eq!(greeter.snapshot(), before);
                (Ok(vec![]), false, None)
            },
        };

        for action in result.unwrap_or_default() {
            match action {
                GreeterAction::ArmAutologin { token, .. } => {
                    assert!(issued_tokens.insert(token), "token {token} issued twice");
                },
                GreeterAction::Ready { .. } => {
                    let fresh = ready_generations.insert(greeter.generation());
                    assert!(fresh, "ready twice in generation {}", greeter.generation());
                },
                _ => {},
            }
        }

        let after = greeter.snapshot();
        if after.is_authenticated
            && !before.is_authenticated
            && after.generation == before.generation
        {
            let by_timer = timer_token.is_some_and(|token| issued_tokens.contains(&token));
            assert!(password_sent || by_timer, "authenticated without credentials: {event:?}");
        }
    }
});
