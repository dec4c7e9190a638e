//! JSON recovery from free-form model output
//!
//! The model is asked for a bare JSON object but routinely wraps it in prose,
//! uses typographic quotes, or leaves trailing commas. Recovery is bounded:
//! one strict parse, one repair pass, one retry.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("trailing comma pattern is valid"));

/// A JSON value recovered from raw text
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// The parsed object
    pub value: Value,
    /// Whether the repair pass was needed
    pub repaired: bool,
}

/// Recover the JSON object embedded in `raw`
///
/// Slices from the first `{` to the last `}`, parses strictly, and on failure
/// applies [`repair`] exactly once before a final strict parse.
pub fn extract_json(raw: &str) -> Result<Extracted> {
    let start = raw
        .find('{')
        .ok_or_else(|| Error::Extraction("missing opening brace".to_string()))?;
    let end = raw
        .rfind('}')
        .ok_or_else(|| Error::Extraction("missing closing brace".to_string()))?;
    if end < start {
        return Err(Error::Extraction(
            "closing brace precedes opening brace".to_string(),
        ));
    }

    let sliced = &raw[start..=end];
    match serde_json::from_str::<Value>(sliced) {
        Ok(value) => Ok(Extracted {
            value,
            repaired: false,
        }),
        Err(first) => {
            debug!(error = %first, "strict parse failed, applying repair pass");
            let repaired = repair(sliced);
            serde_json::from_str::<Value>(&repaired)
                .map(|value| Extracted {
                    value,
                    repaired: true,
                })
                .map_err(|e| Error::MalformedPlan {
                    reason: e.to_string(),
                    repaired,
                })
        }
    }
}

/// Single repair pass: straighten typographic double quotes and drop
/// trailing commas before `}` or `]`
pub fn repair(text: &str) -> String {
    let quotes = text.replace(['\u{201C}', '\u{201D}'], "\"");
    TRAILING_COMMA.replace_all(&quotes, "$1").into_owned()
}
