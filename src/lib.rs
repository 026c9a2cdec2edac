//! Command-line bridges between the bokja backend and third-party AI services.
//!
//! Every binary follows the same contract: a mode token plus positional
//! arguments in, exactly one line of JSON on stdout out, diagnostics on stderr
//! and exit code 1 on failure.

/// HTTP clients for the chat, OCR and speech services.
pub mod clients;
/// Per-program command implementations.
pub mod commands;
/// Layered configuration (defaults, TOML file, environment).
pub mod config;
/// Mode parsing, positional argument extraction and JSON emission.
pub mod dispatch;
/// Error types surfaced to the dispatcher.
pub mod error;
/// stderr logger setup.
pub mod logging;
/// Prompt text sent to the chat model.
pub mod prompts;
/// Medication report pre-processing.
pub mod report;

/// Version string shown by `--version` on every binary:
/// `<crate version> (<git describe>, built <unix seconds>)`.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BOKJA_REVISION"),
    ", built ",
    env!("BOKJA_BUILD_EPOCH"),
    ")"
);
