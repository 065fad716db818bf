use std::path::Path;

use stancemap_common::{CountryContent, StanceMapError, Verification};
use tracing::info;

use crate::store::{read_topic, rewrite_topic};
use crate::verify::reverify_position;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverifySummary {
    pub positions: usize,
    pub verified: usize,
    pub no_data: usize,
    pub stale: usize,
}

/// Recompute every position's verification in an existing topic file from
/// `contents` and rewrite the file in place.
pub async fn reverify_file(
    path: &Path,
    contents: &[CountryContent],
) -> Result<ReverifySummary, StanceMapError> {
    let mut result = read_topic(path).await?;
    let mut summary = ReverifySummary::default();

    for position in &mut result.countries {
        let content = contents.iter().find(|c| c.code == position.country_code);
        if reverify_position(position, content) {
            summary.stale += 1;
        }
        summary.positions += 1;
        if position.stance.verified {
            summary.verified += 1;
        }
        if position.stance.verification == Verification::NoData {
            summary.no_data += 1;
        }
    }

    rewrite_topic(path, &result).await?;
    info!(
        path = %path.display(),
        positions = summary.positions,
        verified = summary.verified,
        no_data = summary.no_data,
        stale = summary.stale,
        "Topic file re-verified"
    );
    Ok(summary)
}
