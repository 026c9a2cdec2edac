use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use crate::error::ScriptError;

/// Report data serialized by the backend for `report_summary`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct ReportPayload {
    #[serde(default)]
    pub hospital: Option<String>,
    /// Medication category label, as produced by the `category` mode.
    #[serde(default)]
    pub category: Option<String>,
    /// Doses per day.
    #[serde(default)]
    pub taken: Option<u32>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Doses planned over the whole course.
    #[serde(default)]
    pub total_cycle: Option<u32>,
    /// Doses due so far.
    #[serde(default)]
    pub cur_cycle: Option<u32>,
    /// Doses the patient recorded as taken.
    #[serde(default)]
    pub save_cycle: Option<u32>,
    /// Side effects grouped by week of the course.
    #[serde(default)]
    pub effects: Vec<EffectWeek>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EffectWeek {
    pub week: u32,
    #[serde(default)]
    pub effect_list: Vec<EffectItem>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EffectItem {
    /// Backend id of the effect; not used in the prompt.
    #[serde(default)]
    pub efno: Option<i64>,
    pub name: String,
    /// Times reported during the week.
    pub count: u32,
}

impl ReportPayload {
    /// Accepts base64-encoded JSON, or the JSON text itself.
    pub fn decode(raw: &str) -> Result<Self, ScriptError> {
        let trimmed = raw.trim();
        let json = if trimmed.starts_with('{') {
            trimmed.to_string()
        } else {
            let bytes = STANDARD
                .decode(trimmed)
                .map_err(|err| ScriptError::malformed("report_payload", format!("invalid base64 ({err})")))?;
            String::from_utf8(bytes)
                .map_err(|err| ScriptError::malformed("report_payload", format!("not UTF-8 ({err})")))?
        };

        serde_json::from_str(&json)
            .map_err(|err| ScriptError::malformed("report_payload", format!("invalid JSON ({err})")))
    }

    /// Recorded doses as a percentage of planned doses.
    pub fn adherence_rate(&self) -> u32 {
        adherence_rate(self.save_cycle.unwrap_or(0), self.total_cycle.unwrap_or(0))
    }

    /// One line per week listing reported side effects.
    pub fn weekly_effects(&self) -> String {
        if self.effects.is_empty() {
            return "기록된 부작용 없음".to_string();
        }

        self.effects
            .iter()
            .map(|week| {
                if week.effect_list.is_empty() {
                    format!("{}주차: 보고된 부작용 없음", week.week)
                } else {
                    let items = week
                        .effect_list
                        .iter()
                        .map(|item| format!("{} {}회", item.name, item.count))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{}주차: {items}", week.week)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `round(100 * observed / planned)`, half-to-even, and 0 when nothing was planned.
pub fn adherence_rate(observed: u32, planned: u32) -> u32 {
    if planned == 0 {
        return 0;
    }
    let ratio = 100.0 * f64::from(observed) / f64::from(planned);
    ratio.round_ties_even() as u32
}
