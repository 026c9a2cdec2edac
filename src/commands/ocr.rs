use std::fmt;
use std::path::Path;
use std::str::FromStr;

use clap::Args;
use serde_json::{Value, json};

use crate::clients::ocr::{DocumentOcrClient, OcrImage, TemplateOcrClient};
use crate::clients::service::ServiceError;
use crate::config::AppConfig;
use crate::dispatch::{self, Mode};
use crate::error::ScriptError;

#[derive(Debug, Args, Clone)]
pub struct OcrArgs {
    /// Image file to recognize
    #[arg(value_name = "IMAGE_FILE_PATH", allow_hyphen_values = true)]
    pub image_path: String,
    /// 1 = prescription (document OCR), 2 = medication envelope (template OCR)
    #[arg(value_name = "MODE", allow_hyphen_values = true)]
    pub mode: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    Prescription,
    Envelope,
}

impl Mode for OcrMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Prescription => "1",
            Self::Envelope => "2",
        }
    }
}

impl FromStr for OcrMode {
    type Err = ScriptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "1" => Ok(Self::Prescription),
            "2" => Ok(Self::Envelope),
            other => Err(ScriptError::InvalidMode {
                mode: other.to_string(),
                expected: "'1' or '2'",
            }),
        }
    }
}

impl OcrMode {
    fn label(self) -> &'static str {
        match self {
            Self::Prescription => "document OCR (mode 1)",
            Self::Envelope => "template OCR (mode 2)",
        }
    }
}

/// Runs OCR. Once the mode is valid, every failure (configuration included)
/// is reported in-band as `{"error": ...}`.
pub async fn run(args: OcrArgs) -> Result<(), ScriptError> {
    let mode: OcrMode = args.mode.parse()?;
    log::debug!("ocr mode={} image={}", mode.as_str(), args.image_path);
    let output = match AppConfig::load() {
        Ok(config) => recognize(mode, Path::new(&args.image_path), &config).await,
        Err(err) => failure(mode, &err),
    };
    dispatch::emit(&output)
}

pub async fn recognize(mode: OcrMode, image_path: &Path, config: &AppConfig) -> Value {
    match call(mode, image_path, config).await {
        Ok(body) => body,
        Err(err) => failure(mode, &err),
    }
}

fn failure(mode: OcrMode, err: &impl fmt::Display) -> Value {
    log::error!("Error in {}: {err}", mode.label());
    error_body(err)
}

async fn call(mode: OcrMode, image_path: &Path, config: &AppConfig) -> Result<Value, ServiceError> {
    let image = OcrImage::read(image_path)?;
    match mode {
        OcrMode::Prescription => {
            DocumentOcrClient::new(&config.document_ocr, config.timeout_secs)?
                .recognize(&image)
                .await
        }
        OcrMode::Envelope => {
            TemplateOcrClient::new(&config.template_ocr, config.timeout_secs)?
                .recognize(&image)
                .await
        }
    }
}

pub fn error_body(err: &impl fmt::Display) -> Value {
    json!({ "error": err.to_string() })
}
