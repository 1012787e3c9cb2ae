//! Console command parsing for the `greeter-mock` binary.

use serde_json::Value;

/// One line of console input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `<operation> [args...]`
    Call {
        /// Operation name.
        name: String,
        /// Arguments.
        args: Vec<Value>,
    },
    /// `state`
    State,
    /// `get <property>`
    Get(String),
    /// `set <property> <value>`
    Set(String, Value),
    /// `help`
    Help,
    /// `quit` / `exit`
    Quit,
}

/// Parse a console line. Blank lines yield `None`.
///
/// Each argument is read as JSON when it parses, as a bare string otherwise,
/// so `respond password` and `respond "password"` are the same call.
pub fn parse(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let head = words.next()?;

    let command = match head {
        "state" => Command::State,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "get" => Command::Get(words.next().unwrap_or_default().to_string()),
        "set" => {
            let name = words.next().unwrap_or_default().to_string();
            let value = words.next().map_or(Value::Null, argument);
            Command::Set(name, value)
        },
        name => Command::Call { name: name.to_string(), args: words.map(argument).collect() },
    };

    Some(command)
}

fn argument(word: &str) -> Value {
    serde_json::from_str(word).unwrap_or_else(|_| Value::String(word.to_string()))
}

/// Console help text.
pub const HELP: &str = "\
commands:
  <operation> [args...]   call an operation (authenticate alice, respond password, ...)
  get <property>          read a property
  set <property> <value>  write a property
  state                   print the greeter state
  help                    this text
  quit                    leave";
