//! Thin HTTP clients for the remote services.
//!
//! Each client is built from its slice of [`crate::config::AppConfig`], sends
//! exactly one request, and reports failures as [`service::ServiceError`].

/// Chat-completions client (OpenAI-compatible).
pub mod chat;
pub(crate) mod http;
/// Prescription and medication-envelope OCR clients.
pub mod ocr;
/// Service identifiers and the shared error type.
pub mod service;
/// Google Cloud Text-to-Speech client.
pub mod speech;
/// Function-calling schema helpers.
pub mod tools;
