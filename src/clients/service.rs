use std::fmt;
use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;

/// Remote services the scripts talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Openai,
    DocumentOcr,
    TemplateOcr,
    Speech,
}

impl Service {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::DocumentOcr => "incizorlens",
            Self::TemplateOcr => "clova-ocr",
            Self::Speech => "google-tts",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure talking to one remote service.
#[derive(Debug)]
pub enum ServiceError {
    /// A required endpoint or credential variable is unset.
    MissingSetting {
        service: Service,
        key_env: &'static str,
    },
    /// None of several interchangeable credential variables is set.
    NoCredential {
        service: Service,
        candidates: &'static [&'static str],
    },
    /// A local input file could not be read.
    File {
        path: PathBuf,
        source: io::Error,
    },
    /// Transport failure: connect, timeout, TLS or reading the body.
    Request {
        service: Service,
        source: reqwest::Error,
    },
    /// Obtaining an access token from a service-account key failed.
    Auth {
        service: Service,
        source: gcp_auth::Error,
    },
    /// The service answered with a non-2xx status.
    Api {
        service: Service,
        status: StatusCode,
        body: String,
    },
    /// The reply decoded but carried nothing usable.
    EmptyResponse {
        service: Service,
    },
    /// The reply could not be decoded or broke an expected shape.
    InvalidResponse {
        service: Service,
        detail: String,
    },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting { key_env, .. } => {
                write!(f, "{key_env} is not set in the environment")
            }
            Self::NoCredential { candidates, .. } => {
                write!(f, "none of {} is set in the environment", alternatives(candidates))
            }
            Self::File { path, source } => {
                write!(f, "Failed to read '{}': {source}", path.display())
            }
            Self::Request { service, source } => write!(f, "{service} request failed: {source}"),
            Self::Auth { service, source } => {
                write!(f, "{service} authentication failed: {source}")
            }
            Self::Api {
                service,
                status,
                body,
            } => write!(f, "{service} API error {status}: {body}"),
            Self::EmptyResponse { service } => {
                write!(f, "{service} response did not contain any content")
            }
            Self::InvalidResponse { service, detail } => {
                write!(f, "{service} returned an unexpected response: {detail}")
            }
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request { source, .. } => Some(source),
            Self::File { source, .. } => Some(source),
            Self::Auth { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// `A, B or C`.
fn alternatives(names: &[&str]) -> String {
    match names.split_last() {
        Some((last, [])) => (*last).to_string(),
        Some((last, rest)) => format!("{} or {last}", rest.join(", ")),
        None => String::new(),
    }
}
