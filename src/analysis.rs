use serde::{Deserialize, Serialize};

/// Substituted for any section the provider response did not contain.
pub const PLACEHOLDER: &str = "Could not parse.";

const LABEL_TRANSCRIPTION: &str = "Transcription:";
const LABEL_TRANSLATION: &str = "Translation:";
const LABEL_SUMMARY: &str = "Summary:";

fn placeholder() -> String {
    PLACEHOLDER.to_owned()
}

/// The three-part outcome of one analysis run. Also serves as the JSON
/// schema the multimodal provider is asked to fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default = "placeholder")]
    pub transcription: String,
    #[serde(default = "placeholder")]
    pub translation: String,
    #[serde(default = "placeholder")]
    pub summary: String,
}

impl AnalysisResult {
    /// Normalize a raw model response. Tries the structured-output contract
    /// first (a JSON object, possibly fenced), then falls back to locating
    /// the fixed section labels in free text.
    pub fn from_response_text(text: &str) -> Self {
        let body = strip_code_fences(text);
        match serde_json::from_str::<AnalysisResult>(body) {
            Ok(parsed) => parsed,
            Err(_) => Self::from_labeled_text(text),
        }
    }

    /// Label-based fallback parser. Any label absent from `text` yields the
    /// placeholder string for that field.
    pub fn from_labeled_text(text: &str) -> Self {
        Self {
            transcription: section(text, LABEL_TRANSCRIPTION, Some(LABEL_TRANSLATION))
                .unwrap_or_else(placeholder),
            translation: section(text, LABEL_TRANSLATION, Some(LABEL_SUMMARY))
                .unwrap_or_else(placeholder),
            summary: section(text, LABEL_SUMMARY, None).unwrap_or_else(placeholder),
        }
    }

    /// Combined plain-text export with fixed separator headers.
    pub fn combined_export(&self) -> String {
        format!(
            "--- Transcription ---\n{}\n\n--- Translation ---\n{}\n\n--- Summary ---\n{}\n",
            self.transcription, self.translation, self.summary
        )
    }
}

/// Text following `label`, up to `next_label` (or the end). The line holding
/// the next label is dropped entirely so list numbering before it does not
/// leak into the previous section.
fn section(text: &str, label: &str, next_label: Option<&str>) -> Option<String> {
    let start = text.find(label)? + label.len();
    let rest = &text[start..];
    let end = next_label
        .and_then(|l| rest.find(l))
        .map(|i| rest[..i].rfind('\n').unwrap_or(i))
        .unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = match inner.find('\n') {
        Some(i) => &inner[i + 1..],
        None => inner,
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
