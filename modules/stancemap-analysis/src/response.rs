use ai_client::strip_code_blocks;
use serde_json::{Map, Value};
use stancemap_common::{Stance, StancePosition};
use tracing::warn;

/// The usable part of a model reply.
#[derive(Debug, Clone, Default)]
pub struct ParsedAnalysis {
    pub positions: Vec<StancePosition>,
    /// The model's own `dataContext`, when it sent one.
    pub data_context: Option<String>,
}

/// Parse a model reply.
///
/// Only malformed JSON is an error. A well-formed reply without
/// `countryPositions[0].countries` yields no positions, and individual
/// entries that do not look like stances are dropped with a warning.
pub fn parse_response(raw: &str) -> Result<ParsedAnalysis, serde_json::Error> {
    let value: Value = serde_json::from_str(strip_code_blocks(raw))?;

    let data_context = value
        .get("dataContext")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);

    let entries = value
        .get("countryPositions")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("countries"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut positions = Vec::new();
    for entry in entries {
        let Some(object) = entry.as_object() else {
            warn!(entry = %entry, "Dropping non-object country entry");
            continue;
        };
        for (code, body) in object {
            match stance_from(code, body) {
                Some(position) => positions.push(position),
                None => warn!(code = code.as_str(), "Dropping malformed stance"),
            }
        }
    }

    Ok(ParsedAnalysis {
        positions,
        data_context,
    })
}

fn stance_from(code: &str, body: &Value) -> Option<StancePosition> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return None;
    }
    let body = body.as_object()?;
    let exact_quote = body.get("exact_quote")?.as_str()?.to_string();

    Some(StancePosition {
        country_code: code,
        stance: Stance {
            summarised_stance_in_english: text(body, "summarised_stance_in_english"),
            exact_quote,
            relevance_to_topic: score(body, "relevance_to_topic"),
            clarity_of_stance: score(body, "clarity_of_stance"),
            verification: Default::default(),
            verified: false,
            source_timestamp: String::new(),
            source_url: String::new(),
            source_stale: false,
        },
    })
}

fn text(body: &Map<String, Value>, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Number or numeric string, clamped to `[0, 1]`; anything else is 0.
fn score(body: &Map<String, Value>, key: &str) -> f64 {
    let raw = match body.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    raw.filter(|v: &f64| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
        .unwrap_or(0.0)
}
