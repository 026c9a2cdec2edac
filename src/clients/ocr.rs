use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::clients::http;
use crate::clients::service::{Service, ServiceError};
use crate::config::{
    DocumentOcrConfig, INCIZORLENS_API_KEY, INCIZORLENS_API_URL, NAVER_OCR_API_URL,
    NAVER_OCR_SECRET_KEY, TemplateOcrConfig,
};

const DOCUMENT_IMAGE_NAME: &str = "prescription_image";
const TEMPLATE_IMAGE_NAME: &str = "pharmacy_img";

/// Image file loaded for upload.
#[derive(Debug, Clone)]
pub struct OcrImage {
    pub path: PathBuf,
    /// Extension without the dot, sent as the vendor `format` field.
    pub format: String,
    /// File contents, uploaded unmodified.
    pub bytes: Vec<u8>,
}

impl OcrImage {
    pub fn read(path: &Path) -> Result<Self, ServiceError> {
        let bytes = fs::read(path).map_err(|source| ServiceError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            format: image_format(path),
            bytes,
        })
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("image.{}", self.format))
    }
}

/// File extension without the dot, `png` when there is none.
pub fn image_format(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "png".to_string())
}

/// Identifies one OCR request in vendor logs.
#[derive(Debug, Clone)]
pub struct RequestStamp {
    pub request_id: String,
    pub timestamp_ms: u128,
}

impl RequestStamp {
    pub fn now() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
        }
    }
}

/// JSON body for the document (prescription) OCR endpoint.
pub fn document_request(image: &OcrImage, stamp: &RequestStamp) -> Value {
    json!({
        "requestId": stamp.request_id,
        "version": "V2",
        "timestamp": stamp.timestamp_ms as u64,
        "images": [{
            "format": image.format,
            "name": DOCUMENT_IMAGE_NAME,
            "data": STANDARD.encode(&image.bytes),
        }],
    })
}

/// `message` part for the template (envelope) OCR endpoint.
pub fn template_message(format: &str, template_ids: &[i64], stamp: &RequestStamp) -> Value {
    json!({
        "images": [{
            "format": format,
            "name": TEMPLATE_IMAGE_NAME,
            "templateIds": template_ids,
        }],
        "requestId": stamp.request_id,
        "version": "V1",
        "timestamp": stamp.timestamp_ms as u64,
    })
}

/// Prescription OCR: base64 image embedded in a JSON body.
#[derive(Debug, Clone)]
pub struct DocumentOcrClient {
    http: Client,
    url: String,
    api_key: String,
}

impl DocumentOcrClient {
    pub fn new(config: &DocumentOcrConfig, timeout_secs: Option<u64>) -> Result<Self, ServiceError> {
        let service = Service::DocumentOcr;
        let url = config.url.clone().ok_or(ServiceError::MissingSetting {
            service,
            key_env: INCIZORLENS_API_URL,
        })?;
        let api_key = config
            .api_key
            .as_ref()
            .ok_or(ServiceError::MissingSetting {
                service,
                key_env: INCIZORLENS_API_KEY,
            })?
            .expose()
            .to_string();

        Ok(Self {
            http: http::build_client(service, timeout_secs)?,
            url,
            api_key,
        })
    }

    pub async fn recognize(&self, image: &OcrImage) -> Result<Value, ServiceError> {
        let service = Service::DocumentOcr;
        let payload = document_request(image, &RequestStamp::now());
        log::debug!(
            "{service} upload format={} bytes={}",
            image.format,
            image.bytes.len()
        );

        let request = self
            .http
            .post(&self.url)
            .header("X-API-KEY", &self.api_key)
            .json(&payload);
        let response = http::send(service, request).await?;
        http::read_json(service, response).await
    }
}

/// Envelope OCR: multipart upload matched against fixed templates.
#[derive(Debug, Clone)]
pub struct TemplateOcrClient {
    http: Client,
    url: String,
    secret: String,
    template_ids: Vec<i64>,
}

impl TemplateOcrClient {
    pub fn new(config: &TemplateOcrConfig, timeout_secs: Option<u64>) -> Result<Self, ServiceError> {
        let service = Service::TemplateOcr;
        let url = config.url.clone().ok_or(ServiceError::MissingSetting {
            service,
            key_env: NAVER_OCR_API_URL,
        })?;
        let secret = config
            .secret
            .as_ref()
            .ok_or(ServiceError::MissingSetting {
                service,
                key_env: NAVER_OCR_SECRET_KEY,
            })?
            .expose()
            .to_string();

        Ok(Self {
            http: http::build_client(service, timeout_secs)?,
            url,
            secret,
            template_ids: config.template_ids.clone(),
        })
    }

    pub async fn recognize(&self, image: &OcrImage) -> Result<Value, ServiceError> {
        let service = Service::TemplateOcr;
        let message = template_message(&image.format, &self.template_ids, &RequestStamp::now());
        log::debug!(
            "{service} upload format={} bytes={} templates={:?}",
            image.format,
            image.bytes.len(),
            self.template_ids
        );

        let form = Form::new()
            .text("message", message.to_string())
            .part("file", Part::bytes(image.bytes.clone()).file_name(image.file_name()));

        let request = self
            .http
            .post(&self.url)
            .header("X-OCR-SECRET", &self.secret)
            .multipart(form);
        let response = http::send(service, request).await?;
        http::read_json(service, response).await
    }
}
