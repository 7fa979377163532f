//! Canonical analysis result and response normalization
//!
//! The analysis function has answered with three different object shapes
//! over time:
//! - `{ verdict, confidence, models: [{name, verdict, confidence}] }`
//! - `{ isAI, confidence, details: {device, authenticity, date} }`
//! - `{ verdict, score, platform, details, model_used }`
//!
//! All of them, plus the Hugging Face `[{label, score}]` array, reduce to
//! one [`AnalysisResult`].

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{VerifyError, VerifyResult};

/// Classification of the analyzed media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Real,
    AiGenerated,
    Unknown,
}

impl Verdict {
    /// Interpret a verdict string from the analysis function
    ///
    /// Anything that is not recognisably real or unknown counts as AI-generated.
    pub fn from_verdict_text(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "real" | "authentic" | "human" => Verdict::Real,
            "" | "unknown" | "uncertain" | "inconclusive" => Verdict::Unknown,
            _ => Verdict::AiGenerated,
        }
    }

    /// Interpret a classifier label: contains `fake` or `ai` means AI-generated
    pub fn from_classifier_label(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.contains("fake") || label.contains("ai") {
            Verdict::AiGenerated
        } else {
            Verdict::Real
        }
    }

    pub fn from_is_ai(is_ai: bool) -> Self {
        if is_ai {
            Verdict::AiGenerated
        } else {
            Verdict::Real
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Verdict::Real)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Real => "real",
            Verdict::AiGenerated => "ai_generated",
            Verdict::Unknown => "unknown",
        }
    }
}

/// One entry of the per-model breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFinding {
    pub name: String,
    pub verdict: Verdict,
    pub confidence: Option<u8>,
}

/// Capture metadata reported by the analysis function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaDetails {
    pub device: Option<String>,
    pub authenticity: Option<String>,
    pub date: Option<String>,
}

impl MediaDetails {
    pub fn is_empty(&self) -> bool {
        self.device.is_none() && self.authenticity.is_none() && self.date.is_none()
    }
}

/// Canonical analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub verdict: Verdict,
    /// Percentage 0..=100
    pub confidence: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<ModelFinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<MediaDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

impl AnalysisResult {
    pub fn new(verdict: Verdict, confidence: Option<u8>) -> Self {
        Self {
            verdict,
            confidence,
            models: Vec::new(),
            platform: None,
            details: None,
            model_used: None,
        }
    }

    /// Normalize a JSON object returned by the analysis function
    pub fn from_verdict_object(body: Value) -> VerifyResult<Self> {
        if !body.is_object() {
            return Err(VerifyError::MalformedResponse(format!(
                "expected JSON object, got {}",
                json_type_name(&body)
            )));
        }

        let wire: VerdictWire = serde_json::from_value(body)
            .map_err(|e| VerifyError::MalformedResponse(e.to_string()))?;

        let verdict = match (&wire.verdict, wire.is_ai) {
            (Some(text), _) => Verdict::from_verdict_text(text),
            (None, Some(is_ai)) => Verdict::from_is_ai(is_ai),
            (None, None) => {
                if let Some(message) = wire.error {
                    return Err(VerifyError::MalformedResponse(message));
                }
                Verdict::Unknown
            }
        };

        let confidence = wire
            .confidence
            .as_ref()
            .or(wire.score.as_ref())
            .and_then(percent_from_value);

        let models = wire
            .models
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(idx, m)| ModelFinding {
                name: m.name.unwrap_or_else(|| format!("Model {}", idx + 1)),
                verdict: m
                    .verdict
                    .as_deref()
                    .map(Verdict::from_verdict_text)
                    .unwrap_or(Verdict::Unknown),
                confidence: m.confidence.as_ref().and_then(percent_from_value),
            })
            .collect();

        let details = wire
            .details
            .map(|d| MediaDetails {
                device: d.device.as_ref().and_then(display_value),
                authenticity: d.authenticity.as_ref().and_then(display_value),
                date: d.date.as_ref().and_then(display_value),
            })
            .filter(|d| !d.is_empty());

        Ok(Self {
            verdict,
            confidence,
            models,
            platform: wire.platform,
            details,
            model_used: wire.model_used,
        })
    }

    /// Reduce a classifier `[{label, score}]` array
    ///
    /// The highest-scoring label decides the verdict; every label is kept
    /// in `models`, best first.
    pub fn from_label_scores(body: Value, model_id: Option<&str>) -> VerifyResult<Self> {
        let Value::Array(_) = body else {
            let detail = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("expected JSON array, got {}", json_type_name(&body)));
            return Err(VerifyError::MalformedResponse(detail));
        };

        let mut scores: Vec<LabelScore> = serde_json::from_value(body)
            .map_err(|e| VerifyError::MalformedResponse(e.to_string()))?;
        if scores.is_empty() {
            return Err(VerifyError::MalformedResponse("empty label list".to_string()));
        }

        scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let top = &scores[0];
        let mut result = Self::new(
            Verdict::from_classifier_label(&top.label),
            Some(percent_from_unit(top.score)),
        );
        result.models = scores
            .iter()
            .map(|s| ModelFinding {
                name: s.label.clone(),
                verdict: Verdict::from_classifier_label(&s.label),
                confidence: Some(percent_from_unit(s.score)),
            })
            .collect();
        result.model_used = model_id.map(str::to_string);

        Ok(result)
    }
}

/// One classifier output pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    /// Probability 0..1
    pub score: f64,
}

#[derive(Debug, Deserialize)]
struct VerdictWire {
    verdict: Option<String>,
    #[serde(rename = "isAI", alias = "is_ai")]
    is_ai: Option<bool>,
    confidence: Option<Value>,
    score: Option<Value>,
    models: Option<Vec<ModelWire>>,
    platform: Option<String>,
    details: Option<DetailsWire>,
    model_used: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelWire {
    name: Option<String>,
    verdict: Option<String>,
    confidence: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DetailsWire {
    device: Option<Value>,
    authenticity: Option<Value>,
    date: Option<Value>,
}

/// Probability 0..1 to a rounded percentage
pub fn percent_from_unit(score: f64) -> u8 {
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Percentage from a JSON number or numeric string like `"87%"`
fn percent_from_value(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
