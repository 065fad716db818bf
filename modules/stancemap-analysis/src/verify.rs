//! Quote verification: does the model's "exact" quote actually occur in the
//! page text it was given?
//!
//! Matching is a plain substring test. Case, whitespace and diacritics are
//! compared as they are.

use stancemap_common::{CountryContent, QuoteHalf, StancePosition, Verification};
use tracing::warn;

/// A quote half must be longer than this many characters to count as a
/// partial match.
pub const MIN_HALF_CHARS: usize = 10;

pub fn verify_quote(quote: &str, text: &str) -> Verification {
    if text.contains(quote) {
        return Verification::ExactMatch;
    }

    let half = quote.chars().count() / 2;
    let split = quote
        .char_indices()
        .nth(half)
        .map_or(quote.len(), |(idx, _)| idx);
    let (first, last) = quote.split_at(split);

    let first_hit = first.chars().count() > MIN_HALF_CHARS && text.contains(first);
    let last_hit = last.chars().count() > MIN_HALF_CHARS && text.contains(last);

    match (first_hit, last_hit) {
        (true, true) => Verification::PartialMatch(QuoteHalf::Both),
        (true, false) => Verification::PartialMatch(QuoteHalf::First),
        (false, true) => Verification::PartialMatch(QuoteHalf::Last),
        (false, false) => Verification::NoMatch,
    }
}

/// Check a position against its country's content and record where the text
/// came from. No content means `no_data` with empty source fields.
pub fn verify_position(position: &mut StancePosition, content: Option<&CountryContent>) {
    let stance = &mut position.stance;
    match content {
        None => {
            stance.verification = Verification::NoData;
            stance.source_timestamp = String::new();
            stance.source_url = String::new();
        }
        Some(content) => {
            stance.verification = verify_quote(&stance.exact_quote, &content.raw_text);
            stance.source_timestamp = content.timestamp.clone();
            stance.source_url = content.source_url.clone();
        }
    }
    stance.verified = stance.verification.is_verified();
}

/// Verify every position, looking content up by country code.
pub fn verify_all(positions: &mut [StancePosition], contents: &[CountryContent]) {
    for position in positions {
        let content = contents.iter().find(|c| c.code == position.country_code);
        verify_position(position, content);
    }
}

/// Re-run verification on a stored position. Returns whether the content
/// came from a different scrape than the one recorded on the position; such
/// positions are flagged `source_stale`.
pub fn reverify_position(position: &mut StancePosition, content: Option<&CountryContent>) -> bool {
    let recorded = position.stance.source_timestamp.clone();
    verify_position(position, content);

    let stale = match content {
        Some(content) => !recorded.is_empty() && recorded != content.timestamp,
        None => false,
    };
    if stale {
        warn!(
            code = position.country_code.as_str(),
            recorded = recorded.as_str(),
            current = position.stance.source_timestamp.as_str(),
            "Position was extracted from a different scrape"
        );
    }
    position.stance.source_stale = stale;
    stale
}
