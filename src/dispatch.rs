//! The request/response contract shared by every script.
//!
//! A mode token picks one operation from a closed set, the remaining
//! arguments are read positionally, and the operation's result is written as
//! a single compact JSON line on stdout. Anything that goes wrong is reported
//! on stderr and the process exits with status 1, leaving stdout empty.

use std::io::{self, Write};
use std::process;
use std::str::FromStr;

use clap::Parser;
use serde_json::Value;

use crate::error::ScriptError;

/// Closed set of operations a script understands.
pub trait Mode: FromStr<Err = ScriptError> + Copy {
    fn as_str(self) -> &'static str;
}

/// Positional arguments that follow the mode token.
#[derive(Debug, Clone)]
pub struct Invocation {
    args: Vec<String>,
}

impl Invocation {
    /// argv index of the first argument after the mode token.
    const FIRST_POSITION: usize = 2;

    pub fn new(args: Vec<String>) -> Self {
        Self { args }
    }

    pub fn required(&self, index: usize, name: &'static str) -> Result<&str, ScriptError> {
        self.optional(index).ok_or(ScriptError::MissingArgument {
            position: index + Self::FIRST_POSITION,
            name,
        })
    }

    pub fn optional(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Parses an optional argument, falling back to `default` when absent.
    pub fn parsed_or<T>(&self, index: usize, name: &'static str, default: T) -> Result<T, ScriptError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(index) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|err| ScriptError::malformed(name, format!("'{raw}': {err}"))),
            None => Ok(default),
        }
    }
}

/// Writes the result as one JSON line. Non-ASCII text is kept literal.
pub fn emit(value: &Value) -> Result<(), ScriptError> {
    let line = render(value);
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}")
        .and_then(|()| stdout.flush())
        .map_err(ScriptError::Output)
}

pub fn render(value: &Value) -> String {
    value.to_string()
}

/// Parses CLI arguments, exiting with status 1 on usage errors.
///
/// Help and version requests go to stdout and exit 0.
pub fn parse_cli<C: Parser>() -> C {
    C::try_parse().unwrap_or_else(|err| {
        let code = if err.use_stderr() { 1 } else { 0 };
        let _ = err.print();
        process::exit(code);
    })
}

/// Reports a failed invocation on stderr and exits with status 1.
pub fn exit_on_error(result: Result<(), ScriptError>) {
    if let Err(err) = result {
        log::debug!("invocation failed: {err:?}");
        eprintln!("{err}");
        process::exit(1);
    }
}
