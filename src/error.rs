use std::fmt;
use std::io;

use crate::clients::service::ServiceError;

/// Every failure that ends an invocation with exit code 1.
#[derive(Debug)]
pub enum ScriptError {
    /// The first argument is not one of the program's modes.
    InvalidMode {
        mode: String,
        expected: &'static str,
    },
    /// A required positional argument is absent. `position` counts from
    /// the program name, so the first argument after the mode is 2.
    MissingArgument {
        position: usize,
        name: &'static str,
    },
    /// An argument is present but does not parse.
    MalformedInput {
        name: &'static str,
        detail: String,
    },
    /// The config file or an environment override is unusable.
    Config(String),
    Service(ServiceError),
    /// Writing the result line failed.
    Output(io::Error),
    /// Wraps a failure with the mode it happened in.
    Failed {
        mode: &'static str,
        source: Box<ScriptError>,
    },
}

impl ScriptError {
    pub fn malformed(name: &'static str, detail: impl fmt::Display) -> Self {
        Self::MalformedInput {
            name,
            detail: detail.to_string(),
        }
    }

    pub fn in_mode(self, mode: &'static str) -> Self {
        match self {
            already @ Self::Failed { .. } => already,
            other => Self::Failed {
                mode,
                source: Box::new(other),
            },
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMode { mode, expected } => {
                write!(f, "Invalid mode: {mode}. Use {expected}")
            }
            Self::MissingArgument { position, name } => {
                write!(f, "missing argument <{name}> at position {position}")
            }
            Self::MalformedInput { name, detail } => write!(f, "malformed <{name}>: {detail}"),
            Self::Config(message) => f.write_str(message),
            Self::Service(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to write result to stdout: {err}"),
            Self::Failed { mode, source } => write!(f, "Error in {mode}: {source}"),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            Self::Output(err) => Some(err),
            Self::Failed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<ServiceError> for ScriptError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err)
    }
}
