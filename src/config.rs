use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ScriptError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4-0613";
pub const DEFAULT_TEMPLATE_ID: i64 = 39836;
pub const DEFAULT_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const INCIZORLENS_API_URL: &str = "INCIZORLENS_API_URL";
pub const INCIZORLENS_API_KEY: &str = "INCIZORLENS_API_KEY";
pub const NAVER_OCR_API_URL: &str = "NAVER_OCR_API_URL";
pub const NAVER_OCR_SECRET_KEY: &str = "NAVER_OCR_SECRET_KEY";
pub const GOOGLE_TTS_API_KEY: &str = "GOOGLE_TTS_API_KEY";
pub const GOOGLE_OAUTH_ACCESS_TOKEN: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Credential value that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Contents of `config.toml`. Credentials never live here.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Per-request timeout in seconds.
    pub timeout: Option<u64>,
    pub llm: Option<LlmFileConfig>,
    pub ocr: Option<OcrFileConfig>,
    pub tts: Option<TtsFileConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LlmFileConfig {
    pub model: Option<String>,
    /// OpenAI-compatible API root, without `/chat/completions`.
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct OcrFileConfig {
    /// Prescription (document) OCR endpoint.
    pub document_url: Option<String>,
    /// Medication-envelope (template) OCR endpoint.
    pub template_url: Option<String>,
    pub template_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TtsFileConfig {
    /// Full `text:synthesize` URL.
    pub url: Option<String>,
}

/// Where the non-secret settings came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Chat model settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// `OPENAI_API_KEY`, sent as a bearer token.
    pub api_key: Option<Secret>,
    pub base_url: String,
    pub model: String,
    /// Left out of the request when unset so the service default applies.
    pub temperature: Option<f32>,
}

/// Prescription OCR settings.
#[derive(Debug, Clone)]
pub struct DocumentOcrConfig {
    pub url: Option<String>,
    /// Sent as `X-API-KEY`.
    pub api_key: Option<Secret>,
}

/// Medication-envelope OCR settings.
#[derive(Debug, Clone)]
pub struct TemplateOcrConfig {
    pub url: Option<String>,
    /// Sent as `X-OCR-SECRET`.
    pub secret: Option<Secret>,
    /// Templates the envelope image is matched against.
    pub template_ids: Vec<i64>,
}

/// Text-to-speech settings. One credential is used, first match wins.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub url: String,
    /// Sent as `x-goog-api-key`.
    pub api_key: Option<Secret>,
    /// Pre-issued OAuth token, sent as a bearer token.
    pub access_token: Option<Secret>,
    /// Service-account key file exchanged for a token on each request.
    pub service_account: Option<PathBuf>,
}

/// Settings for one invocation, built once in `main` and passed down.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: ConfigSource,
    /// No timeout when unset.
    pub timeout_secs: Option<u64>,
    pub llm: LlmConfig,
    pub document_ocr: DocumentOcrConfig,
    pub template_ocr: TemplateOcrConfig,
    pub speech: SpeechConfig,
}

impl AppConfig {
    /// Reads the optional config file, then applies the process environment.
    pub fn load() -> Result<Self, ScriptError> {
        let (file, source) = load_file()?;
        Self::resolve(file, source, |key| env::var(key).ok())
    }

    /// Merges defaults, file values and environment values (highest wins).
    pub fn resolve<F>(file: FileConfig, source: ConfigSource, lookup: F) -> Result<Self, ScriptError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let secret = |key: &str| var(key).map(Secret);

        let llm_file = file.llm.unwrap_or_default();
        let ocr_file = file.ocr.unwrap_or_default();
        let tts_file = file.tts.unwrap_or_default();

        let timeout_secs = parse_env(&var, "BOKJA_TIMEOUT")?.or(file.timeout);
        let temperature = parse_env(&var, "BOKJA_LLM_TEMPERATURE")?.or(llm_file.temperature);
        let template_ids = match var("BOKJA_OCR_TEMPLATE_IDS") {
            Some(raw) => parse_id_list(&raw)?,
            None => ocr_file
                .template_ids
                .unwrap_or_else(|| vec![DEFAULT_TEMPLATE_ID]),
        };

        Ok(Self {
            source,
            timeout_secs,
            llm: LlmConfig {
                api_key: secret(OPENAI_API_KEY),
                base_url: var("OPENAI_BASE_URL")
                    .or(llm_file.base_url)
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                model: var("BOKJA_LLM_MODEL")
                    .or(llm_file.model)
                    .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
                temperature,
            },
            document_ocr: DocumentOcrConfig {
                url: var(INCIZORLENS_API_URL).or(ocr_file.document_url),
                api_key: secret(INCIZORLENS_API_KEY),
            },
            template_ocr: TemplateOcrConfig {
                url: var(NAVER_OCR_API_URL).or(ocr_file.template_url),
                secret: secret(NAVER_OCR_SECRET_KEY),
                template_ids,
            },
            speech: SpeechConfig {
                url: var("GOOGLE_TTS_API_URL")
                    .or(tts_file.url)
                    .unwrap_or_else(|| DEFAULT_TTS_URL.to_string()),
                api_key: secret(GOOGLE_TTS_API_KEY),
                access_token: secret(GOOGLE_OAUTH_ACCESS_TOKEN),
                service_account: var(GOOGLE_APPLICATION_CREDENTIALS).map(PathBuf::from),
            },
        })
    }

    /// Credential variables and whether each one is set.
    pub fn credential_report(&self) -> Vec<(&'static str, bool)> {
        vec![
            (OPENAI_API_KEY, self.llm.api_key.is_some()),
            (INCIZORLENS_API_URL, self.document_ocr.url.is_some()),
            (INCIZORLENS_API_KEY, self.document_ocr.api_key.is_some()),
            (NAVER_OCR_API_URL, self.template_ocr.url.is_some()),
            (NAVER_OCR_SECRET_KEY, self.template_ocr.secret.is_some()),
            (GOOGLE_TTS_API_KEY, self.speech.api_key.is_some()),
            (GOOGLE_OAUTH_ACCESS_TOKEN, self.speech.access_token.is_some()),
            (
                GOOGLE_APPLICATION_CREDENTIALS,
                self.speech.service_account.is_some(),
            ),
        ]
    }
}

fn parse_env<T, F>(var: &F, key: &str) -> Result<Option<T>, ScriptError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|err| ScriptError::Config(format!("Invalid {key} '{raw}': {err}")))
        })
        .transpose()
}

fn parse_id_list(raw: &str) -> Result<Vec<i64>, ScriptError> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>().map_err(|err| {
                ScriptError::Config(format!("Invalid BOKJA_OCR_TEMPLATE_IDS '{raw}': {err}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if ids.is_empty() {
        return Err(ScriptError::Config(
            "BOKJA_OCR_TEMPLATE_IDS does not contain any template id".to_string(),
        ));
    }
    Ok(ids)
}

fn load_file() -> Result<(FileConfig, ConfigSource), ScriptError> {
    let (path, explicit) = match config_path() {
        Some(found) => found,
        None => return Ok((FileConfig::default(), ConfigSource::Defaults)),
    };

    if !explicit && !path.exists() {
        return Ok((FileConfig::default(), ConfigSource::Defaults));
    }

    let raw = fs::read_to_string(&path).map_err(|err| {
        ScriptError::Config(format!(
            "Failed to read config file '{}': {err}",
            path.display()
        ))
    })?;
    let file = parse_file(&raw).map_err(|err| {
        ScriptError::Config(format!(
            "Failed to parse config file '{}': {err}",
            path.display()
        ))
    })?;

    Ok((file, ConfigSource::File(path)))
}

pub fn parse_file(raw: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(raw)
}

/// Returns the config path and whether the user named it explicitly.
fn config_path() -> Option<(PathBuf, bool)> {
    if let Ok(path) = env::var("BOKJA_CONFIG") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some((PathBuf::from(trimmed), true));
        }
    }

    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if !trimmed.is_empty() {
            return Some((PathBuf::from(trimmed).join("bokja").join("config.toml"), false));
        }
    }

    let home = env::var("HOME").ok()?;
    Some((
        PathBuf::from(home).join(".config").join("bokja").join("config.toml"),
        false,
    ))
}
