use std::collections::BTreeMap;

use ai_client::{prompt_schema, truncate_chars, CompletionRequest};
use schemars::JsonSchema;
use stancemap_common::{AnalyzerConfig, CountryContent, TopicDefinition};

// --- Response envelope (schema only; parsing is lenient, see `response`) ---

/// What the model must return for one topic.
#[derive(Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelEnvelope {
    /// Exactly one entry, for the topic being analyzed.
    pub country_positions: Vec<ModelTopic>,
}

#[derive(Debug, JsonSchema)]
pub struct ModelTopic {
    pub topic: String,
    /// One object per country, keyed by its 2-letter ISO code.
    pub countries: Vec<BTreeMap<String, ModelStance>>,
}

#[derive(Debug, JsonSchema)]
pub struct ModelStance {
    /// Exact quote in the original language, copied verbatim from the input.
    pub exact_quote: String,
    /// The country's stance, always in English.
    pub summarised_stance_in_english: String,
    /// 0-1: how relevant the quote is to the topic.
    pub relevance_to_topic: f64,
    /// 0-1: how clear and unambiguous the country's position is.
    pub clarity_of_stance: f64,
}

// --- Prompts ---

pub fn system_prompt(topic: &TopicDefinition) -> String {
    let name = &topic.name;
    let schema = serde_json::to_string_pretty(&prompt_schema::<ModelEnvelope>())
        .unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"You are a diplomatic analyst specializing in identifying clear positions expressed by countries on {name}. Your task is to analyze foreign ministry website content and identify SPECIFIC STANCES where countries express clear opinions on this topic ONLY.

Focus EXCLUSIVELY on finding specific stances related to {name}:
{description}

CRITICAL: Use EXACT quotes from the input text. Do NOT add trailing periods, punctuation, or modify the text in any way. Copy the text exactly as it appears in the source material.

Return ONLY valid JSON in this exact structure:
{{
  "countryPositions": [
    {{
      "topic": "{name}",
      "countries": [
        {{ "<2 digit ISO country code>": {{
          "exact_quote": "<exact quote in original language from input conveying their opinion>",
          "summarised_stance_in_english": "<stance always in english>",
          "relevance_to_topic": <0-1 score for how relevant the quote is to {name}>,
          "clarity_of_stance": <0-1 score for how clear/unambiguous the country's position is>
        }}}}
      ]
    }}
  ]
}}

JSON Schema of the response:
{schema}

Only include positions that are clearly related to {name}. Be specific and factual."#,
        description = topic.description,
    )
}

/// Every country's text as `--- <CODE> ---` sections, each cut to
/// `max_chars` characters.
pub fn user_prompt(countries: &[CountryContent], max_chars: usize) -> String {
    let sections: Vec<String> = countries
        .iter()
        .map(|c| format!("--- {} ---\n{}", c.code, truncate_chars(&c.raw_text, max_chars)))
        .collect();

    format!(
        "Analyze the following foreign ministry website content from {} countries:\n\n{}",
        countries.len(),
        sections.join("\n\n")
    )
}

pub fn build_request(
    topic: &TopicDefinition,
    countries: &[CountryContent],
    config: &AnalyzerConfig,
) -> CompletionRequest {
    CompletionRequest::new()
        .system(system_prompt(topic))
        .user(user_prompt(countries, config.max_chars_per_country))
        .temperature(config.temperature)
        .max_output_tokens(config.max_output_tokens)
        .json_output()
}
