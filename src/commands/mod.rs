/// `bokja config` subcommands.
pub mod config;
/// Chat-model operations: match_meds, category, description, report_summary.
pub mod llm;
/// Prescription and envelope OCR.
pub mod ocr;
/// Text-to-speech.
pub mod tts;
