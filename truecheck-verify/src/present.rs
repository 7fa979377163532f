//! Verdict presentation
//!
//! Pure mapping from [`AnalysisResult`] to a [`VerdictView`] and from
//! there to terminal text.

use std::fmt::Write as _;

use serde::Serialize;

use crate::result::{AnalysisResult, Verdict};

/// Placeholder shown while a request is pending
pub const PROGRESS_TEXT: &str = "Analyzing with AI models...";

/// Colour family of the verdict banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

/// One row of the per-model breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelRow {
    pub name: String,
    pub verdict: String,
    pub confidence_text: Option<String>,
}

/// Render-ready verdict card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerdictView {
    pub banner: String,
    pub icon: String,
    pub tone: Tone,
    pub confidence_text: Option<String>,
    pub models: Vec<ModelRow>,
    /// Labelled extra lines (platform, capture details, model used)
    pub details: Vec<(String, String)>,
}

impl VerdictView {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let (banner, icon, tone) = match result.verdict {
            Verdict::Real => ("Authentic", "✓", Tone::Positive),
            Verdict::AiGenerated => ("AI-Generated", "⚠", Tone::Negative),
            Verdict::Unknown => ("Inconclusive", "?", Tone::Neutral),
        };

        let models = result
            .models
            .iter()
            .map(|m| ModelRow {
                name: m.name.clone(),
                verdict: short_verdict(m.verdict).to_string(),
                confidence_text: m.confidence.map(|c| format!("{}%", c)),
            })
            .collect();

        let mut details = Vec::new();
        if let Some(platform) = &result.platform {
            details.push(("Platform".to_string(), platform.clone()));
        }
        if let Some(d) = &result.details {
            let labelled = [
                ("Device", &d.device),
                ("Authenticity", &d.authenticity),
                ("Date", &d.date),
            ];
            for (label, value) in labelled {
                if let Some(value) = value {
                    details.push((label.to_string(), value.clone()));
                }
            }
        }
        if let Some(model) = &result.model_used {
            details.push(("Model".to_string(), model.clone()));
        }

        Self {
            banner: banner.to_string(),
            icon: icon.to_string(),
            tone,
            confidence_text: result.confidence.map(|c| format!("Confidence: {}%", c)),
            models,
            details,
        }
    }
}

fn short_verdict(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Real => "real",
        Verdict::AiGenerated => "fake",
        Verdict::Unknown => "unknown",
    }
}

/// Plain-text verdict card
pub fn render_text(view: &VerdictView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Analysis Results");
    let _ = writeln!(out, "{} {}", view.icon, view.banner);
    if let Some(confidence) = &view.confidence_text {
        let _ = writeln!(out, "{}", confidence);
    }

    for (label, value) in &view.details {
        let _ = writeln!(out, "{}: {}", label, value);
    }

    if !view.models.is_empty() {
        let width = view.models.iter().map(|m| m.name.chars().count()).max().unwrap_or(0);
        let _ = writeln!(out, "Model Analysis:");
        for row in &view.models {
            match &row.confidence_text {
                Some(c) => {
                    let _ = writeln!(out, "  {:<width$}  {} ({})", row.name, row.verdict, c, width = width);
                }
                None => {
                    let _ = writeln!(out, "  {:<width$}  {}", row.name, row.verdict, width = width);
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{MediaDetails, ModelFinding};

    #[test]
    fn test_ai_verdict_card() {
        let mut result = AnalysisResult::new(Verdict::AiGenerated, Some(91));
        result.models = vec![
            ModelFinding {
                name: "fake".into(),
                verdict: Verdict::AiGenerated,
                confidence: Some(91),
            },
            ModelFinding {
                name: "real".into(),
                verdict: Verdict::Real,
                confidence: None,
            },
        ];

        let view = VerdictView::from_result(&result);
        assert_eq!(view.banner, "AI-Generated");
        assert_eq!(view.tone, Tone::Negative);
        assert_eq!(view.confidence_text.as_deref(), Some("Confidence: 91%"));

        let text = render_text(&view);
        assert_eq!(
            text,
            "Analysis Results\n⚠ AI-Generated\nConfidence: 91%\nModel Analysis:\n  fake  fake (91%)\n  real  real\n"
        );
    }

    #[test]
    fn test_real_verdict_without_confidence() {
        let view = VerdictView::from_result(&AnalysisResult::new(Verdict::Real, None));
        assert_eq!(view.icon, "✓");
        assert_eq!(view.tone, Tone::Positive);
        assert!(view.confidence_text.is_none());
        assert_eq!(render_text(&view), "Analysis Results\n✓ Authentic\n");
    }

    #[test]
    fn test_details_lines() {
        let mut result = AnalysisResult::new(Verdict::Unknown, Some(50));
        result.platform = Some("TikTok".into());
        result.details = Some(MediaDetails {
            device: Some("Pixel 8".into()),
            authenticity: None,
            date: Some("2024-05-02".into()),
        });
        result.model_used = Some("org/detector".into());

        let view = VerdictView::from_result(&result);
        assert_eq!(view.banner, "Inconclusive");
        assert_eq!(
            view.details,
            vec![
                ("Platform".to_string(), "TikTok".to_string()),
                ("Device".to_string(), "Pixel 8".to_string()),
                ("Date".to_string(), "2024-05-02".to_string()),
                ("Model".to_string(), "org/detector".to_string()),
            ]
        );
        assert!(render_text(&view).contains("Platform: TikTok\n"));
    }
}
