//! Per-country map classification for each dashboard view.
//!
//! Status views colour a country by one CSV status column; topic views
//! highlight countries holding a clear, relevant stance on one topic.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use stancemap_common::{topic_slug, CombinedAnalysisResult, CountryRecord, StancePosition};

/// Both scores must reach this for a stance to be shown on a topic view.
pub const HIGH_QUALITY_THRESHOLD: f64 = 0.8;

/// Short view names the dashboard uses for its topic tabs.
const TOPIC_ALIASES: [(&str, &str); 5] = [
    ("ukraine", "Ukraine Conflict"),
    ("gaza", "Israel/Gaza Conflict"),
    ("iran", "Iran"),
    ("climate", "Climate Change"),
    ("rights", "Human Rights"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusView {
    Website,
    Robots,
    Statements,
}

impl StatusView {
    pub fn label(&self) -> &'static str {
        match self {
            StatusView::Website => "Website",
            StatusView::Robots => "Robots.txt",
            StatusView::Statements => "Statements.txt",
        }
    }

    /// The status string this view reads from a row.
    fn status_of<'a>(&self, record: &'a CountryRecord) -> &'a str {
        match self {
            StatusView::Website => &record.http_status,
            StatusView::Robots => &record.robots_status,
            // No statements files are published yet.
            StatusView::Statements => "404",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapView {
    Status(StatusView),
    /// Topic selected by alias or slug; resolved against the analysis.
    Topic(String),
}

impl MapView {
    /// Any key that is not a status view names a topic.
    pub fn from_key(key: &str) -> Self {
        let key = key.trim().to_ascii_lowercase();
        match key.as_str() {
            "website" => MapView::Status(StatusView::Website),
            "robots" => MapView::Status(StatusView::Robots),
            "statements" => MapView::Status(StatusView::Statements),
            other => MapView::Topic(other.to_string()),
        }
    }
}

impl FromStr for MapView {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(MapView::from_key(s))
    }
}

impl fmt::Display for MapView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapView::Status(StatusView::Website) => f.write_str("website"),
            MapView::Status(StatusView::Robots) => f.write_str("robots"),
            MapView::Status(StatusView::Statements) => f.write_str("statements"),
            MapView::Topic(key) => f.write_str(key),
        }
    }
}

/// Full topic name for a view key: an alias, or the slug of a topic present
/// in the analysis.
pub fn resolve_topic(key: &str, analysis: Option<&CombinedAnalysisResult>) -> Option<String> {
    if let Some((_, name)) = TOPIC_ALIASES.iter().find(|(alias, _)| *alias == key) {
        return Some(name.to_string());
    }
    analysis?
        .country_positions
        .iter()
        .find(|t| topic_slug(&t.topic) == key)
        .map(|t| t.topic.clone())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillClass {
    Available,
    Redirect,
    Blocked,
    NotFound,
    Error,
    Timeout,
    Other,
    Unknown,
    NoData,
    HighQuality,
}

impl FillClass {
    pub fn fill(&self) -> &'static str {
        match self {
            FillClass::Available => "#424242",
            FillClass::Redirect => "#616161",
            FillClass::Blocked => "#9E9E9E",
            FillClass::NotFound | FillClass::Error => "#BDBDBD",
            FillClass::Timeout | FillClass::Other | FillClass::Unknown => "#757575",
            FillClass::NoData => "#E4E5E9",
            FillClass::HighQuality => "#1B5E20",
        }
    }

    pub fn hover(&self) -> &'static str {
        match self {
            FillClass::Available => "#212121",
            FillClass::Redirect => "#424242",
            FillClass::Blocked => "#757575",
            FillClass::NotFound | FillClass::Error => "#9E9E9E",
            FillClass::Timeout | FillClass::Other | FillClass::Unknown => "#616161",
            FillClass::NoData => "#D6D6DA",
            FillClass::HighQuality => "#0D4E14",
        }
    }
}

pub fn classify_status(status: &str) -> FillClass {
    match status.trim() {
        "" => FillClass::Unknown,
        "200" => FillClass::Available,
        "301" | "302" => FillClass::Redirect,
        "403" => FillClass::Blocked,
        "404" => FillClass::NotFound,
        "TIMEOUT" => FillClass::Timeout,
        s if s.starts_with("ERROR_") => FillClass::Error,
        _ => FillClass::Other,
    }
}

/// One country's rendering on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryFill {
    pub code: String,
    pub name: String,
    pub class: FillClass,
    pub fill: &'static str,
    pub hover: &'static str,
    pub tooltip: String,
    /// Where a click goes; absent when the country is not clickable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl CountryFill {
    fn new(record: &CountryRecord, class: FillClass, tooltip: String, link: Option<String>) -> Self {
        Self {
            code: record.code.clone(),
            name: record.name.clone(),
            class,
            fill: class.fill(),
            hover: class.hover(),
            tooltip,
            link,
        }
    }
}

/// Ministry URL with `https://` added when it has no scheme.
pub fn ministry_link(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        None
    } else if url.starts_with("http") {
        Some(url.to_string())
    } else {
        Some(format!("https://{url}"))
    }
}

pub fn status_fill(record: &CountryRecord, view: StatusView) -> CountryFill {
    let name = &record.name;
    let label = view.label();
    let status = view.status_of(record).trim();
    let link = ministry_link(&record.ministry_url);

    let class = classify_status(status);
    let tooltip = match class {
        FillClass::Available => format!("{name} - {label} Available ({status}) - Click to visit"),
        FillClass::Redirect => format!("{name} - {label} Redirect ({status}) - Click to visit"),
        FillClass::Blocked => {
            format!("{name} - {label} Blocked ({status}) - May have bot protection")
        }
        FillClass::NotFound => format!("{name} - {label} Not Found ({status})"),
        FillClass::Error => format!("{name} - {label} Error ({status})"),
        FillClass::Timeout => format!("{name} - {label} Timeout - Click to try"),
        FillClass::Other => format!("{name} - {label} HTTP {status} - Click to visit"),
        _ => format!(
            "{name} - {label} Status Unknown - Click to visit Ministry of Foreign Affairs"
        ),
    };
    CountryFill::new(record, class, tooltip, link)
}

/// Highlight when any position on the topic is high quality; the first such
/// position supplies the tooltip.
pub fn topic_fill<'a>(
    record: &CountryRecord,
    positions: impl IntoIterator<Item = &'a StancePosition>,
) -> CountryFill {
    let name = &record.name;
    let positions: Vec<&StancePosition> = positions.into_iter().collect();

    if positions.is_empty() {
        return CountryFill::new(
            record,
            FillClass::NoData,
            format!("{name} - No position found on this topic"),
            None,
        );
    }

    match positions
        .iter()
        .find(|p| p.is_high_quality(HIGH_QUALITY_THRESHOLD))
    {
        Some(best) => CountryFill::new(
            record,
            FillClass::HighQuality,
            format!(
                "{name}\nStance: {}\nQuote: \"{}\"",
                best.stance.summarised_stance_in_english, best.stance.exact_quote
            ),
            ministry_link(&record.ministry_url),
        ),
        None => CountryFill::new(
            record,
            FillClass::NoData,
            format!("{name} - No high-quality position found on this topic"),
            None,
        ),
    }
}

/// Fills for every country in the CSV (first row per code). Topic views also
/// include countries that only appear in the analysis, named by code.
/// Returns `None` when a topic view names no known topic.
pub fn build_map(
    view: &MapView,
    records: &[CountryRecord],
    analysis: Option<&CombinedAnalysisResult>,
) -> Option<Vec<CountryFill>> {
    let mut seen = HashSet::new();
    let records: Vec<&CountryRecord> = records
        .iter()
        .filter(|r| !r.code.is_empty() && seen.insert(r.code.clone()))
        .collect();

    match view {
        MapView::Status(status) => Some(records.iter().map(|r| status_fill(r, *status)).collect()),
        MapView::Topic(key) => {
            let topic = resolve_topic(key, analysis)?;
            let mut fills: Vec<CountryFill> = records
                .iter()
                .map(|r| {
                    let positions = analysis
                        .map(|a| a.positions_for(&topic, &r.code).collect::<Vec<_>>())
                        .unwrap_or_default();
                    topic_fill(r, positions)
                })
                .collect();

            if let Some(analysis) = analysis {
                let mut extra: Vec<&str> = analysis
                    .country_positions
                    .iter()
                    .filter(|t| t.topic == topic)
                    .flat_map(|t| t.countries.iter().map(|p| p.country_code.as_str()))
                    .filter(|code| !seen.contains(*code))
                    .collect();
                extra.sort_unstable();
                extra.dedup();
                for code in extra {
                    let record = CountryRecord {
                        name: code.to_string(),
                        code: code.to_string(),
                        ministry_url: String::new(),
                        http_status: String::new(),
                        robots_status: String::new(),
                    };
                    fills.push(topic_fill(&record, analysis.positions_for(&topic, code)));
                }
            }
            Some(fills)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stancemap_common::{Stance, TopicPositions};

    fn record(name: &str, code: &str, url: &str, http: &str, robots: &str) -> CountryRecord {
        CountryRecord {
            name: name.into(),
            code: code.into(),
            ministry_url: url.into(),
            http_status: http.into(),
            robots_status: robots.into(),
        }
    }

    fn position(code: &str, relevance: f64, clarity: f64) -> StancePosition {
        StancePosition {
            country_code: code.into(),
            stance: Stance {
                summarised_stance_in_english: "Supports Ukraine".into(),
                exact_quote: "We stand with Ukraine".into(),
                relevance_to_topic: relevance,
                clarity_of_stance: clarity,
                verification: Default::default(),
                verified: false,
                source_timestamp: String::new(),
                source_url: String::new(),
                source_stale: false,
            },
        }
    }

    fn analysis(positions: Vec<StancePosition>) -> CombinedAnalysisResult {
        CombinedAnalysisResult {
            country_positions: vec![TopicPositions {
                topic: "Ukraine Conflict".into(),
                countries: positions,
            }],
            data_context: String::new(),
            analysis_timestamp: String::new(),
            topic_analysis_files: Vec::new(),
        }
    }

    #[test]
    fn status_classes_and_colours() {
        assert_eq!(classify_status("200"), FillClass::Available);
        assert_eq!(classify_status("301"), FillClass::Redirect);
        assert_eq!(classify_status("302"), FillClass::Redirect);
        assert_eq!(classify_status("403"), FillClass::Blocked);
        assert_eq!(classify_status("404"), FillClass::NotFound);
        assert_eq!(classify_status("ERROR_TLS"), FillClass::Error);
        assert_eq!(classify_status("TIMEOUT"), FillClass::Timeout);
        assert_eq!(classify_status("302_MAX_REDIRECTS"), FillClass::Other);
        assert_eq!(classify_status("DNS_ERROR"), FillClass::Other);
        assert_eq!(classify_status(""), FillClass::Unknown);

        assert_eq!(FillClass::Available.fill(), "#424242");
        assert_eq!(FillClass::Available.hover(), "#212121");
        assert_eq!(FillClass::HighQuality.hover(), "#0D4E14");
    }

    #[test]
    fn website_tooltip_and_link() {
        let r = record("Testland", "TL", "www.example.com", "200", "404");
        let fill = status_fill(&r, StatusView::Website);
        assert_eq!(fill.tooltip, "Testland - Website Available (200) - Click to visit");
        assert_eq!(fill.link.as_deref(), Some("https://www.example.com"));

        let robots = status_fill(&r, StatusView::Robots);
        assert_eq!(robots.class, FillClass::NotFound);
        assert_eq!(robots.tooltip, "Testland - Robots.txt Not Found (404)");
    }

    #[test]
    fn statements_view_is_always_not_found() {
        let r = record("Testland", "TL", "https://www.example.com", "200", "200");
        let fill = status_fill(&r, StatusView::Statements);
        assert_eq!(fill.class, FillClass::NotFound);
        assert_eq!(fill.tooltip, "Testland - Statements.txt Not Found (404)");
    }

    #[test]
    fn topic_view_needs_both_scores() {
        let r = record("Testland", "TL", "https://www.example.com", "200", "");
        let clear = position("TL", 0.8, 0.8);
        let vague = position("TL", 0.95, 0.79);

        let fill = topic_fill(&r, [&clear]);
        assert_eq!(fill.class, FillClass::HighQuality);
        assert_eq!(fill.fill, "#1B5E20");
        assert_eq!(
            fill.tooltip,
            "Testland\nStance: Supports Ukraine\nQuote: \"We stand with Ukraine\""
        );
        assert!(fill.link.is_some());

        let fill = topic_fill(&r, [&vague]);
        assert_eq!(fill.class, FillClass::NoData);
        assert_eq!(fill.tooltip, "Testland - No high-quality position found on this topic");
        assert!(fill.link.is_none());

        let fill = topic_fill(&r, Vec::<&StancePosition>::new());
        assert_eq!(fill.tooltip, "Testland - No position found on this topic");
    }

    #[test]
    fn views_parse_and_resolve() {
        assert_eq!("website".parse::<MapView>().unwrap(), MapView::Status(StatusView::Website));
        let data = analysis(vec![position("TL", 0.9, 0.9)]);
        assert_eq!(
            resolve_topic("ukraine", None).as_deref(),
            Some("Ukraine Conflict")
        );
        assert_eq!(
            resolve_topic("ukraine_conflict", Some(&data)).as_deref(),
            Some("Ukraine Conflict")
        );
        assert!(resolve_topic("tariffs", Some(&data)).is_none());
    }

    #[test]
    fn build_map_covers_csv_and_analysis_codes() {
        let records = vec![
            record("Testland", "TL", "https://www.example.com", "200", ""),
            record("Testland again", "TL", "https://dup.example", "404", ""),
            record("Otherland", "OL", "", "", ""),
        ];
        let data = analysis(vec![position("TL", 0.9, 0.9), position("ZZ", 0.9, 0.9)]);

        let website = build_map(&"website".parse().unwrap(), &records, Some(&data)).unwrap();
        assert_eq!(website.len(), 2);
        assert_eq!(website[1].class, FillClass::Unknown);
        assert!(website[1].link.is_none());

        let topic = build_map(&"ukraine".parse().unwrap(), &records, Some(&data)).unwrap();
        let classes: Vec<_> = topic.iter().map(|f| (f.code.as_str(), f.class)).collect();
        assert_eq!(
            classes,
            vec![
                ("TL", FillClass::HighQuality),
                ("OL", FillClass::NoData),
                ("ZZ", FillClass::HighQuality),
            ]
        );

        assert!(build_map(&"nonsense".parse().unwrap(), &records, Some(&data)).is_none());
    }
}
