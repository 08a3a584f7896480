//! Parser for the model's free-text mapping suggestions.
//!
//! The mapping prompt asks for a four-line response:
//!
//! ```text
//! MAPPING: [target_account_code]
//! CONFIDENCE: [0-100]
//! REASONING: [brief explanation]
//! ALTERNATIVES: [comma-separated codes, or "None"]
//! ```
//!
//! The format is requested, not guaranteed, so this module is a decision
//! table of label -> extraction rule -> default rather than a grammar.
//! Parsing never fails: missing or mangled structure degrades to default
//! field values.

use once_cell::sync::Lazy;
use regex::Regex;

/// Target code used when the response has no parseable `MAPPING:` line.
pub const UNKNOWN_MAPPING: &str = "UNKNOWN";

const DEFAULT_REASONING: &str = "No reasoning provided";

static MAPPING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)MAPPING:\s*([^\n]+)").expect("mapping pattern compiles"));

static CONFIDENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CONFIDENCE:\s*(\d+)").expect("confidence pattern compiles"));

// The reasoning value may continue over multiple lines; it ends at the next
// recognized label or at the end of the text. The first line must be
// non-empty, like the single-line labels.
static REASONING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)REASONING:[ \t]*([^\n]+(?s:.*?))(?:\n[ \t]*(?:MAPPING|CONFIDENCE|ALTERNATIVES):|\z)")
        .expect("reasoning pattern compiles")
});

static ALTERNATIVES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ALTERNATIVES:\s*([^\n]+)").expect("alternatives pattern compiles"));

/// A mapping suggestion extracted from completion text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSuggestion {
    /// Suggested target account code, or [`UNKNOWN_MAPPING`].
    pub mapping: String,
    /// Clamped to [0, 100]; 0 when the response had no parseable confidence.
    pub confidence: u8,
    pub reasoning: String,
    /// Alternative codes with the "None" placeholder and empties filtered out.
    pub alternatives: Vec<String>,
    /// The unmodified completion text, kept for logging and diagnostics.
    pub raw: String,
}

/// Extracts a [`ParsedSuggestion`] from completion text.
pub fn parse_suggestion(text: &str) -> ParsedSuggestion {
    let mapping = MAPPING_RE
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| UNKNOWN_MAPPING.to_string());

    let confidence = CONFIDENCE_RE
        .captures(text)
        .map(|caps| clamp_confidence(&caps[1]))
        .unwrap_or(0);

    let reasoning = REASONING_RE
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| DEFAULT_REASONING.to_string());

    let alternatives = ALTERNATIVES_RE
        .captures(text)
        .map(|caps| {
            caps[1]
                .split(',')
                .map(str::trim)
                .filter(|alt| !alt.is_empty() && !alt.eq_ignore_ascii_case("none"))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    ParsedSuggestion {
        mapping,
        confidence,
        reasoning,
        alternatives,
        raw: text.to_string(),
    }
}

// The capture is all digits; anything above the scale (or too wide to parse)
// clamps to the top rather than escaping the [0, 100] invariant.
fn clamp_confidence(digits: &str) -> u8 {
    digits.parse::<u64>().map_or(100, |value| value.min(100)) as u8
}
