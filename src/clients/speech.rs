use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::clients::http;
use crate::clients::service::{Service, ServiceError};
use crate::config::{
    GOOGLE_APPLICATION_CREDENTIALS, GOOGLE_OAUTH_ACCESS_TOKEN, GOOGLE_TTS_API_KEY, SpeechConfig,
};

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Variables that can authorize a synthesis request, in order of precedence.
pub const SPEECH_CREDENTIALS: &[&str] = &[
    GOOGLE_TTS_API_KEY,
    GOOGLE_OAUTH_ACCESS_TOKEN,
    GOOGLE_APPLICATION_CREDENTIALS,
];

/// Synthesis input: plain text or SSML markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisInput {
    Text(String),
    Ssml(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    Mp3,
    Linear16,
}

impl AudioEncoding {
    /// `MP3` selects MP3; anything else falls back to LINEAR16.
    pub fn from_tag(tag: &str) -> Self {
        if tag == "MP3" { Self::Mp3 } else { Self::Linear16 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSelection {
    pub language_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    pub audio_encoding: AudioEncoding,
    pub speaking_rate: f64,
    pub pitch: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisRequest {
    pub input: SynthesisInput,
    pub voice: VoiceSelection,
    #[serde(rename = "audioConfig")]
    pub audio_config: AudioConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisResponse {
    #[serde(default)]
    audio_content: Option<String>,
}

#[derive(Clone)]
enum Credential {
    ApiKey(String),
    Bearer(String),
    /// Key file from `GOOGLE_APPLICATION_CREDENTIALS`, exchanged for a token per request.
    ServiceAccount(Arc<CustomServiceAccount>),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(***)"),
            Self::Bearer(_) => f.write_str("Bearer(***)"),
            Self::ServiceAccount(_) => f.write_str("ServiceAccount(***)"),
        }
    }
}

/// Google Cloud Text-to-Speech REST client.
#[derive(Debug, Clone)]
pub struct SpeechClient {
    http: Client,
    url: String,
    credential: Credential,
}

impl SpeechClient {
    pub fn new(config: &SpeechConfig, timeout_secs: Option<u64>) -> Result<Self, ServiceError> {
        let service = Service::Speech;
        let credential = match (&config.api_key, &config.access_token, &config.service_account) {
            (Some(key), _, _) => Credential::ApiKey(key.expose().to_string()),
            (None, Some(token), _) => Credential::Bearer(token.expose().to_string()),
            (None, None, Some(path)) => {
                let account = CustomServiceAccount::from_file(path)
                    .map_err(|source| ServiceError::Auth { service, source })?;
                Credential::ServiceAccount(Arc::new(account))
            }
            (None, None, None) => {
                return Err(ServiceError::NoCredential {
                    service,
                    candidates: SPEECH_CREDENTIALS,
                });
            }
        };

        Ok(Self {
            http: http::build_client(service, timeout_secs)?,
            url: config.url.clone(),
            credential,
        })
    }

    /// Returns the raw audio bytes.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, ServiceError> {
        let service = Service::Speech;
        log::debug!(
            "{service} request voice={} encoding={:?}",
            request.voice.name,
            request.audio_config.audio_encoding
        );

        let builder = self.http.post(&self.url).json(request);
        let builder = match &self.credential {
            Credential::ApiKey(key) => builder.header("x-goog-api-key", key),
            Credential::Bearer(token) => builder.bearer_auth(token),
            Credential::ServiceAccount(account) => {
                let token = account
                    .token(&[CLOUD_PLATFORM_SCOPE])
                    .await
                    .map_err(|source| ServiceError::Auth { service, source })?;
                builder.bearer_auth(token.as_str())
            }
        };
        let response = http::send(service, builder).await?;

        let body: SynthesisResponse = http::read_body(service, response).await?;
        let encoded = body
            .audio_content
            .filter(|content| !content.is_empty())
            .ok_or(ServiceError::EmptyResponse { service })?;

        STANDARD
            .decode(encoded.as_bytes())
            .map_err(|err| ServiceError::InvalidResponse {
                service,
                detail: format!("audioContent is not base64 ({err})"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use serde_json::json;

    fn speech_config(
        api_key: Option<&str>,
        access_token: Option<&str>,
        service_account: Option<&str>,
    ) -> SpeechConfig {
        SpeechConfig {
            url: "http://127.0.0.1:1/v1/text:synthesize".to_string(),
            api_key: api_key.map(|key| Secret::from(key.to_string())),
            access_token: access_token.map(|token| Secret::from(token.to_string())),
            service_account: service_account.map(Into::into),
        }
    }

    #[test]
    fn request_uses_google_field_names() {
        let request = SynthesisRequest {
            input: SynthesisInput::Ssml("<speak>hi</speak>".to_string()),
            voice: VoiceSelection {
                language_code: "ko-KR".to_string(),
                name: "ko-KR-Neural2-C".to_string(),
            },
            audio_config: AudioConfig {
                audio_encoding: AudioEncoding::Linear16,
                speaking_rate: 0.95,
                pitch: -2.0,
            },
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "input": { "ssml": "<speak>hi</speak>" },
                "voice": { "languageCode": "ko-KR", "name": "ko-KR-Neural2-C" },
                "audioConfig": { "audioEncoding": "LINEAR16", "speakingRate": 0.95, "pitch": -2.0 }
            })
        );
    }

    #[test]
    fn only_exact_mp3_tag_selects_mp3() {
        assert_eq!(AudioEncoding::from_tag("MP3"), AudioEncoding::Mp3);
        assert_eq!(AudioEncoding::from_tag("mp3"), AudioEncoding::Linear16);
        assert_eq!(AudioEncoding::from_tag("WAV"), AudioEncoding::Linear16);
    }

    #[test]
    fn api_key_wins_over_other_credentials() {
        let client = SpeechClient::new(
            &speech_config(Some("key"), Some("token"), Some("/no/such/key.json")),
            None,
        )
        .unwrap();
        assert!(matches!(client.credential, Credential::ApiKey(ref key) if key == "key"));

        let client = SpeechClient::new(&speech_config(None, Some("token"), None), None).unwrap();
        assert!(matches!(client.credential, Credential::Bearer(ref token) if token == "token"));
    }

    #[test]
    fn missing_credentials_name_every_accepted_variable() {
        let err = SpeechClient::new(&speech_config(None, None, None), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "none of GOOGLE_TTS_API_KEY, GOOGLE_OAUTH_ACCESS_TOKEN or \
             GOOGLE_APPLICATION_CREDENTIALS is set in the environment"
        );
    }

    #[test]
    fn unreadable_service_account_file_is_an_auth_error() {
        let err = SpeechClient::new(&speech_config(None, None, Some("/no/such/key.json")), None)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Auth { .. }));
        assert!(err.to_string().starts_with("google-tts authentication failed"));
    }

    #[test]
    fn credentials_are_redacted_in_debug_output() {
        let client = SpeechClient::new(&speech_config(Some("AIza-secret"), None, None), None).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("AIza-secret"));
        assert!(debug.contains("ApiKey(***)"));
    }
}
