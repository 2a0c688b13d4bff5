use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    #[serde(deserialize_with = "string_or_number")]
    pub doc_id: String,
    pub src_lang: String,
    pub tgt_lang: String,
    pub tgt_system: String,
    pub score: f64,
    #[serde(default)]
    pub audio_path: Option<String>,
    #[serde(default)]
    pub tgt_text: Option<String>,
    #[serde(skip)]
    pub score_pred: BTreeMap<String, f64>,
}

impl Record {
    pub fn lang_pair(&self) -> String {
        format!("{}{}", self.src_lang, self.tgt_lang)
    }

    pub fn predicted(&self, metric: &str) -> Option<f64> {
        self.score_pred.get(metric).copied()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(value) => value,
        Raw::Number(value) => value.to_string(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct InputFingerprint {
    pub path: String,
    pub sha256: String,
    pub record_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricFingerprint {
    pub metric: String,
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageCell {
    pub lang: String,
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricSummaryEntry {
    pub metric: String,
    pub average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_missing_reason: Option<String>,
    pub languages: Vec<LanguageCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub report_version: u32,
    pub generated_at: String,
    pub input: InputFingerprint,
    pub metrics: Vec<MetricFingerprint>,
    pub system_statistic: String,
    pub segment_level: Vec<MetricSummaryEntry>,
    pub system_level: Vec<MetricSummaryEntry>,
}
