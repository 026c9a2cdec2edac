use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Args;
use serde_json::Value;

use crate::clients::chat::{ChatClient, ChatMessage};
use crate::clients::service::{Service, ServiceError};
use crate::clients::tools::{FunctionDefinition, FunctionParam, ParamType};
use crate::config::AppConfig;
use crate::dispatch::{self, Invocation, Mode};
use crate::error::ScriptError;
use crate::prompts;
use crate::report::ReportPayload;

#[derive(Debug, Args, Clone)]
pub struct LlmArgs {
    /// Operation: match_meds, category, description or report_summary
    #[arg(value_name = "MODE", allow_hyphen_values = true)]
    pub mode: String,
    /// Positional arguments for the operation
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmMode {
    MatchMeds,
    Category,
    Description,
    ReportSummary,
}

impl Mode for LlmMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MatchMeds => "match_meds",
            Self::Category => "category",
            Self::Description => "description",
            Self::ReportSummary => "report_summary",
        }
    }
}

impl FromStr for LlmMode {
    type Err = ScriptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "match_meds" => Ok(Self::MatchMeds),
            "category" => Ok(Self::Category),
            "description" => Ok(Self::Description),
            "report_summary" => Ok(Self::ReportSummary),
            other => Err(ScriptError::InvalidMode {
                mode: other.to_string(),
                expected: "match_meds, category, description or report_summary",
            }),
        }
    }
}

/// Validated arguments for one LLM operation.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmRequest {
    MatchMeds {
        ocr_names: Vec<Value>,
        ocr_names_json: String,
        db_meds_json: String,
    },
    Category {
        classifications_json: String,
    },
    Description {
        med_info: String,
        med_desc: String,
        warnings: String,
    },
    ReportSummary(ReportPayload),
}

impl LlmRequest {
    /// Reads and validates the positional arguments. No network access.
    pub fn from_invocation(mode: LlmMode, invocation: &Invocation) -> Result<Self, ScriptError> {
        match mode {
            LlmMode::MatchMeds => {
                let ocr_names = json_array(invocation.required(0, "ocr_names_json")?, "ocr_names_json")?;
                let db_meds = json_array(invocation.required(1, "db_meds_json")?, "db_meds_json")?;
                Ok(Self::MatchMeds {
                    ocr_names_json: compact(&ocr_names),
                    db_meds_json: compact(&db_meds),
                    ocr_names,
                })
            }
            LlmMode::Category => {
                let classifications = json_array(
                    invocation.required(0, "classifications_json")?,
                    "classifications_json",
                )?;
                Ok(Self::Category {
                    classifications_json: compact(&classifications),
                })
            }
            LlmMode::Description => Ok(Self::Description {
                med_info: invocation.required(0, "med_info")?.to_string(),
                med_desc: invocation.required(1, "med_desc")?.to_string(),
                warnings: invocation.required(2, "warnings_json")?.to_string(),
            }),
            LlmMode::ReportSummary => Ok(Self::ReportSummary(ReportPayload::decode(
                invocation.required(0, "report_payload")?,
            )?)),
        }
    }
}

pub async fn run(args: LlmArgs) -> Result<(), ScriptError> {
    let mode: LlmMode = args.mode.parse()?;
    let invocation = Invocation::new(args.args);
    let output = execute(mode, &invocation)
        .await
        .map_err(|err| err.in_mode(mode.as_str()))?;
    dispatch::emit(&output)
}

async fn execute(mode: LlmMode, invocation: &Invocation) -> Result<Value, ScriptError> {
    let request = LlmRequest::from_invocation(mode, invocation)?;
    let config = AppConfig::load()?;
    let client = ChatClient::new(&config.llm, config.timeout_secs)?;
    perform(&client, request).await
}

pub async fn perform(client: &ChatClient, request: LlmRequest) -> Result<Value, ScriptError> {
    match request {
        LlmRequest::MatchMeds {
            ocr_names,
            ocr_names_json,
            db_meds_json,
        } => {
            let ids = match_medicines(client, &ocr_names_json, &db_meds_json).await?;
            if ids.len() != ocr_names.len() {
                return Err(invalid_reply(format!(
                    "model returned {} ids for {} scanned names",
                    ids.len(),
                    ocr_names.len()
                )));
            }
            Ok(Value::from(ids))
        }
        LlmRequest::Category {
            classifications_json,
        } => {
            let reply = client
                .complete(&[
                    ChatMessage::system(prompts::CATEGORY_SYSTEM),
                    ChatMessage::user(prompts::category_user(&classifications_json)),
                ])
                .await?;
            Ok(Value::from(clean_label(&reply)))
        }
        LlmRequest::Description {
            med_info,
            med_desc,
            warnings,
        } => {
            let reply = client
                .complete(&[
                    ChatMessage::system(prompts::DESCRIPTION_SYSTEM),
                    ChatMessage::user(prompts::description_user(&med_info, &med_desc, &warnings)),
                ])
                .await?;
            Ok(Value::from(reply.trim()))
        }
        LlmRequest::ReportSummary(report) => {
            log::info!(
                "report_summary adherence={}% weeks={}",
                report.adherence_rate(),
                report.effects.len()
            );
            let reply = client
                .complete(&[
                    ChatMessage::system(prompts::REPORT_SYSTEM),
                    ChatMessage::user(prompts::report_user(&report)),
                ])
                .await?;
            Ok(Value::from(STANDARD.encode(reply.trim().as_bytes())))
        }
    }
}

async fn match_medicines(
    client: &ChatClient,
    ocr_names_json: &str,
    db_meds_json: &str,
) -> Result<Vec<i64>, ScriptError> {
    let function = FunctionDefinition::new(
        prompts::MATCH_FUNCTION_NAME,
        prompts::MATCH_FUNCTION_DESCRIPTION,
    )
    .with_param(
        FunctionParam::array_of("mdnos", ParamType::Integer).describe(prompts::MATCH_PARAM_DESCRIPTION),
    );

    let arguments = client
        .call_function(
            &[
                ChatMessage::system(prompts::MATCH_SYSTEM),
                ChatMessage::user(prompts::match_user(ocr_names_json, db_meds_json)),
            ],
            &function,
        )
        .await?;

    parse_mdnos(&arguments)
}

fn parse_mdnos(arguments: &Value) -> Result<Vec<i64>, ScriptError> {
    let items = arguments["mdnos"]
        .as_array()
        .ok_or_else(|| invalid_reply(format!("mdnos is not an array: {arguments}")))?;
    items
        .iter()
        .map(|item| {
            item.as_i64()
                .ok_or_else(|| invalid_reply(format!("mdnos contains a non-integer: {item}")))
        })
        .collect()
}

fn invalid_reply(detail: String) -> ScriptError {
    ScriptError::Service(ServiceError::InvalidResponse {
        service: Service::Openai,
        detail,
    })
}

/// Trims the reply and strips every double quote.
pub fn clean_label(reply: &str) -> String {
    reply.trim().replace('"', "")
}

fn json_array(raw: &str, name: &'static str) -> Result<Vec<Value>, ScriptError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(ScriptError::malformed(
            name,
            format!("expected a JSON array, got {other}"),
        )),
        Err(err) => Err(ScriptError::malformed(name, format!("not valid JSON ({err})"))),
    }
}

fn compact(items: &[Value]) -> String {
    Value::from(items.to_vec()).to_string()
}
