use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::status::ProbeStatus;
use crate::topics::topic_slug;

// --- Countries ---

/// One row of the country CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRecord {
    pub name: String,
    pub code: String,
    pub ministry_url: String,
    pub http_status: String,
    pub robots_status: String,
}

impl CountryRecord {
    pub fn probe_status(&self) -> ProbeStatus {
        self.http_status.parse().unwrap_or(ProbeStatus::Empty)
    }

    /// Live (`200`) and holding an absolute http(s) URL.
    pub fn is_scrapable(&self) -> bool {
        !self.code.is_empty()
            && self.probe_status().is_ok()
            && self.ministry_url.starts_with("http")
    }
}

/// Visible text of one country's ministry homepage from one scrape run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryContent {
    pub code: String,
    pub raw_text: String,
    pub timestamp: String,
    pub source_url: String,
}

/// The `<code>.json` artifact written next to each scraped text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeMetadata {
    pub country: String,
    pub code: String,
    pub url: String,
    pub timestamp: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub content_length: usize,
    pub processing_time_ms: u64,
}

// --- Topics ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDefinition {
    pub name: String,
    pub description: String,
}

impl TopicDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn slug(&self) -> String {
        topic_slug(&self.name)
    }
}

// --- Verification ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteHalf {
    First,
    Last,
    Both,
}

/// How well an extracted quote was found in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verification {
    /// As returned by the model, before any check.
    #[default]
    Unverified,
    ExactMatch,
    PartialMatch(QuoteHalf),
    NoMatch,
    /// No scraped content for the country.
    NoData,
}

impl Verification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verification::Unverified => "unverified",
            Verification::ExactMatch => "exact_match",
            Verification::PartialMatch(QuoteHalf::First) => "partial_match_first_half",
            Verification::PartialMatch(QuoteHalf::Last) => "partial_match_last_half",
            Verification::PartialMatch(QuoteHalf::Both) => "partial_match_both_halves",
            Verification::NoMatch => "no_match",
            Verification::NoData => "no_data",
        }
    }

    /// Only an exact substring match counts as verified.
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::ExactMatch)
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "unverified" | "" => Verification::Unverified,
            "exact_match" => Verification::ExactMatch,
            "partial_match_first_half" => Verification::PartialMatch(QuoteHalf::First),
            "partial_match_last_half" => Verification::PartialMatch(QuoteHalf::Last),
            "partial_match_both_halves" => Verification::PartialMatch(QuoteHalf::Both),
            "no_match" => Verification::NoMatch,
            "no_data" => Verification::NoData,
            other => return Err(format!("unknown verification status: {other}")),
        })
    }
}

impl Serialize for Verification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Verification {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// --- Stances ---

/// A country's position on one topic, as stored in result files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stance {
    #[serde(default)]
    pub summarised_stance_in_english: String,
    #[serde(default)]
    pub exact_quote: String,
    #[serde(default)]
    pub relevance_to_topic: f64,
    #[serde(default)]
    pub clarity_of_stance: f64,
    #[serde(default)]
    pub verification: Verification,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub source_timestamp: String,
    #[serde(default)]
    pub source_url: String,
    /// Set when re-verification ran against content from a different scrape.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub source_stale: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StancePosition {
    pub country_code: String,
    pub stance: Stance,
}

impl StancePosition {
    /// Both scores at or above `threshold`.
    pub fn is_high_quality(&self, threshold: f64) -> bool {
        self.stance.relevance_to_topic >= threshold && self.stance.clarity_of_stance >= threshold
    }
}

/// Serde adapter for the `countries` list: each position is written as a
/// single-key object `{ "<CODE>": { ... } }`. Objects holding several codes
/// are accepted on read and split into one position per code.
pub mod country_map {
    use std::collections::BTreeMap;

    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{Stance, StancePosition};

    pub fn serialize<S: Serializer>(
        positions: &[StancePosition],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(positions.len()))?;
        for position in positions {
            let mut entry = BTreeMap::new();
            entry.insert(position.country_code.as_str(), &position.stance);
            seq.serialize_element(&entry)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<StancePosition>, D::Error> {
        let entries: Vec<BTreeMap<String, Stance>> = Vec::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .flat_map(|entry| {
                entry
                    .into_iter()
                    .map(|(country_code, stance)| StancePosition {
                        country_code,
                        stance,
                    })
            })
            .collect())
    }
}

// --- Results ---

/// One topic's analysis; written once and then treated as a cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicAnalysisResult {
    pub topic: String,
    #[serde(with = "country_map")]
    pub countries: Vec<StancePosition>,
    pub data_context: String,
    pub analysis_timestamp: String,
    pub source_data_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicPositions {
    pub topic: String,
    #[serde(with = "country_map")]
    pub countries: Vec<StancePosition>,
}

/// Every topic file folded into one document; what the dashboard loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedAnalysisResult {
    pub country_positions: Vec<TopicPositions>,
    pub data_context: String,
    pub analysis_timestamp: String,
    #[serde(default)]
    pub topic_analysis_files: Vec<String>,
}

impl CombinedAnalysisResult {
    /// Positions for `code` under the topic named `topic`.
    pub fn positions_for<'a>(
        &'a self,
        topic: &'a str,
        code: &'a str,
    ) -> impl Iterator<Item = &'a StancePosition> + 'a {
        self.country_positions
            .iter()
            .filter(move |t| t.topic == topic)
            .flat_map(|t| t.countries.iter())
            .filter(move |p| p.country_code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stance(quote: &str) -> Stance {
        Stance {
            summarised_stance_in_english: "Condemns the invasion".into(),
            exact_quote: quote.into(),
            relevance_to_topic: 0.9,
            clarity_of_stance: 0.85,
            verification: Verification::ExactMatch,
            verified: true,
            source_timestamp: "2025-06-28T10:00:00.000Z".into(),
            source_url: "https://www.example.com".into(),
            source_stale: false,
        }
    }

    #[test]
    fn countries_serialize_as_single_key_objects() {
        let result = TopicAnalysisResult {
            topic: "Ukraine Conflict".into(),
            countries: vec![StancePosition {
                country_code: "TL".into(),
                stance: stance("We condemn the invasion"),
            }],
            data_context: "ctx".into(),
            analysis_timestamp: "t1".into(),
            source_data_timestamp: "t0".into(),
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["countries"][0]["TL"]["verification"], "exact_match");
        assert_eq!(value["countries"][0]["TL"]["exact_quote"], "We condemn the invasion");
        assert_eq!(value["dataContext"], "ctx");
        assert_eq!(value["sourceDataTimestamp"], "t0");
        assert!(value["countries"][0]["TL"].get("source_stale").is_none());
    }

    #[test]
    fn multi_code_objects_split_into_positions() {
        let value = json!({
            "topic": "Iran",
            "countries": [
                { "FR": { "exact_quote": "a", "summarised_stance_in_english": "x" },
                  "DE": { "exact_quote": "b", "summarised_stance_in_english": "y" } }
            ],
            "dataContext": "",
            "analysisTimestamp": "",
            "sourceDataTimestamp": ""
        });

        let result: TopicAnalysisResult = serde_json::from_value(value).unwrap();
        let codes: Vec<_> = result.countries.iter().map(|p| p.country_code.as_str()).collect();
        assert_eq!(codes, vec!["DE", "FR"]);
        assert_eq!(result.countries[0].stance.verification, Verification::Unverified);
        assert_eq!(result.countries[0].stance.relevance_to_topic, 0.0);
    }

    #[test]
    fn verification_strings_round_trip() {
        for v in [
            Verification::ExactMatch,
            Verification::PartialMatch(QuoteHalf::First),
            Verification::PartialMatch(QuoteHalf::Last),
            Verification::PartialMatch(QuoteHalf::Both),
            Verification::NoMatch,
            Verification::NoData,
        ] {
            assert_eq!(v.as_str().parse::<Verification>().unwrap(), v);
        }
        assert!("fuzzy".parse::<Verification>().is_err());
    }

    #[test]
    fn scrapable_requires_200_and_http_url() {
        let mut record = CountryRecord {
            name: "Testland".into(),
            code: "TL".into(),
            ministry_url: "https://www.example.com".into(),
            http_status: "200".into(),
            robots_status: String::new(),
        };
        assert!(record.is_scrapable());

        record.http_status = "403".into();
        assert!(!record.is_scrapable());

        record.http_status = "200".into();
        record.ministry_url = "example.com".into();
        assert!(!record.is_scrapable());
    }
}
