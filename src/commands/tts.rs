use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Args;
use serde_json::{Value, json};

use crate::clients::speech::{
    AudioConfig, AudioEncoding, SpeechClient, SynthesisInput, SynthesisRequest, VoiceSelection,
};
use crate::config::AppConfig;
use crate::dispatch::{self, Invocation, Mode};
use crate::error::ScriptError;

pub const DEFAULT_LANGUAGE: &str = "ko-KR";
pub const DEFAULT_VOICE: &str = "ko-KR-Neural2-C";
pub const DEFAULT_ENCODING: &str = "MP3";
pub const DEFAULT_RATE: f64 = 0.95;
pub const DEFAULT_PITCH: f64 = 0.0;

#[derive(Debug, Args, Clone)]
pub struct TtsArgs {
    /// Operation: tts
    #[arg(value_name = "MODE", allow_hyphen_values = true)]
    pub mode: String,
    /// TEXT [LANGUAGE] [VOICE] [ENCODING] [RATE] [PITCH] [USE_SSML]
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsMode {
    Tts,
}

impl Mode for TtsMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Tts => "tts",
        }
    }
}

impl FromStr for TtsMode {
    type Err = ScriptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "tts" => Ok(Self::Tts),
            other => Err(ScriptError::InvalidMode {
                mode: other.to_string(),
                expected: "tts",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOptions {
    pub text: String,
    pub language_code: String,
    pub voice_name: String,
    /// Encoding argument as given; also the lowercase `format` tag source.
    pub encoding_tag: String,
    pub speaking_rate: f64,
    pub pitch: f64,
    pub use_ssml: bool,
}

impl SpeechOptions {
    pub fn from_invocation(invocation: &Invocation) -> Result<Self, ScriptError> {
        let text_or = |index: usize, default: &str| {
            invocation.optional(index).unwrap_or(default).to_string()
        };

        Ok(Self {
            text: invocation.required(0, "text")?.to_string(),
            language_code: text_or(1, DEFAULT_LANGUAGE),
            voice_name: text_or(2, DEFAULT_VOICE),
            encoding_tag: text_or(3, DEFAULT_ENCODING),
            speaking_rate: invocation.parsed_or(4, "speaking_rate", DEFAULT_RATE)?,
            pitch: invocation.parsed_or(5, "pitch", DEFAULT_PITCH)?,
            use_ssml: invocation
                .optional(6)
                .is_some_and(|flag| flag.to_lowercase() == "true"),
        })
    }

    pub fn format_tag(&self) -> String {
        self.encoding_tag.to_lowercase()
    }

    pub fn input(&self) -> SynthesisInput {
        if self.use_ssml {
            SynthesisInput::Ssml(ssml_text(&self.text, self.speaking_rate, self.pitch))
        } else {
            SynthesisInput::Text(self.text.clone())
        }
    }

    pub fn to_request(&self) -> SynthesisRequest {
        SynthesisRequest {
            input: self.input(),
            voice: VoiceSelection {
                language_code: self.language_code.clone(),
                name: self.voice_name.clone(),
            },
            audio_config: AudioConfig {
                audio_encoding: AudioEncoding::from_tag(&self.encoding_tag),
                speaking_rate: self.speaking_rate,
                pitch: self.pitch,
            },
        }
    }
}

/// Wraps text in a prosody element; pitch is added in whole semitones when
/// it is at least 0.1 away from zero.
pub fn ssml_text(text: &str, rate: f64, pitch: f64) -> String {
    let rate = decimal(rate);
    if pitch.abs() < 0.1 {
        format!("<speak><prosody rate=\"{rate}\">{text}</prosody></speak>")
    } else {
        let semitones = pitch.round_ties_even() as i64;
        format!("<speak><prosody rate=\"{rate}\" pitch=\"{semitones:+}st\">{text}</prosody></speak>")
    }
}

/// Float text that always keeps a decimal point (`1.0`, `0.95`).
fn decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

pub async fn run(args: TtsArgs) -> Result<(), ScriptError> {
    let mode: TtsMode = args.mode.parse()?;
    let invocation = Invocation::new(args.args);
    let output = match mode {
        TtsMode::Tts => synthesize(&invocation).await,
    }
    .map_err(|err| err.in_mode(mode.as_str()))?;
    dispatch::emit(&output)
}

async fn synthesize(invocation: &Invocation) -> Result<Value, ScriptError> {
    let options = SpeechOptions::from_invocation(invocation)?;
    let config = AppConfig::load()?;
    let client = SpeechClient::new(&config.speech, config.timeout_secs)?;
    let audio = client.synthesize(&options.to_request()).await?;
    log::info!(
        "tts synthesized {} bytes as {}",
        audio.len(),
        options.format_tag()
    );

    Ok(json!({
        "audio_base64": STANDARD.encode(&audio),
        "format": options.format_tag(),
    }))
}
