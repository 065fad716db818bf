//! Jobs that keep the country CSV current: liveness probing, robots.txt
//! status, and a second pass over blocked rows.
//!
//! Each job edits a [`CountryTable`] in memory; the caller writes it back.

use stancemap_common::table::{
    COL_COUNTRY, COL_HTTP_STATUS, COL_LEGACY_DOMAIN, COL_LEGACY_WORKING, COL_MINISTRY_URL,
    COL_ROBOTS,
};
use stancemap_common::{CountryTable, ProbeStatus, Schedule, StanceMapError};
use tracing::info;

use crate::pool::TaskPool;
use crate::prober::{normalize_url, ProbeOutcome, UrlProber};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProbeSummary {
    /// Rows that had a URL and were requested.
    pub probed: usize,
    /// Rows whose URL was replaced after a redirect to a live page.
    pub updated_urls: usize,
    /// Rows that ended on `200`.
    pub live: usize,
}

struct RowJob {
    row: usize,
    country: String,
    url: String,
}

/// Normalize and probe every ministry URL, recording `http_response_code`.
///
/// Renames the legacy domain column and drops `url_working` first. Fails
/// before touching any row when no URL column exists.
pub async fn process_urls(
    table: &mut CountryTable,
    prober: &UrlProber,
    concurrency: usize,
) -> Result<ProbeSummary, StanceMapError> {
    if table.column(COL_MINISTRY_URL).is_none() && table.column(COL_LEGACY_DOMAIN).is_none() {
        return Err(StanceMapError::MissingColumn(format!(
            "{COL_LEGACY_DOMAIN} or {COL_MINISTRY_URL}"
        )));
    }
    table.rename_column(COL_LEGACY_DOMAIN, COL_MINISTRY_URL);
    table.remove_column(COL_LEGACY_WORKING);
    let url_col = table.require_column(COL_MINISTRY_URL)?;
    let status_col = table.ensure_column(COL_HTTP_STATUS);

    let mut jobs = Vec::new();
    for row in 0..table.len() {
        let url = normalize_url(table.get(row, url_col));
        table.set(row, url_col, url.as_str());
        if url.is_empty() {
            table.set(row, status_col, "");
            continue;
        }
        jobs.push(RowJob {
            row,
            country: table.value(row, COL_COUNTRY).to_string(),
            url,
        });
    }

    let outcomes = probe_rows(prober, jobs, concurrency).await;

    let mut summary = ProbeSummary::default();
    for (job, outcome) in outcomes {
        summary.probed += 1;
        if outcome.status.is_ok() {
            summary.live += 1;
        }
        if outcome.redirected_to_live_page() {
            table.set(job.row, url_col, outcome.final_url.as_str());
            summary.updated_urls += 1;
        }
        table.set(job.row, status_col, outcome.status.to_string());
    }

    info!(
        probed = summary.probed,
        live = summary.live,
        updated_urls = summary.updated_urls,
        "URL probing complete"
    );
    Ok(summary)
}

/// Record the robots.txt status of every site in a `robots_txt` column.
/// Returns how many rows were checked.
pub async fn check_robots(
    table: &mut CountryTable,
    prober: &UrlProber,
    concurrency: usize,
) -> Result<usize, StanceMapError> {
    let url_col = table.require_column(COL_MINISTRY_URL)?;
    let robots_col = table.ensure_column(COL_ROBOTS);

    let mut jobs = Vec::new();
    for row in 0..table.len() {
        let url = table.get(row, url_col).trim().to_string();
        if url.is_empty() {
            table.set(row, robots_col, "");
            continue;
        }
        jobs.push(RowJob {
            row,
            country: table.value(row, COL_COUNTRY).to_string(),
            url,
        });
    }

    let pool = TaskPool::new(concurrency, Schedule::Rolling);
    let statuses = pool
        .run(jobs, |job| async move {
            let status = prober.check_robots(&job.url).await;
            info!(
                country = job.country.as_str(),
                url = job.url.as_str(),
                %status,
                "Checked robots.txt"
            );
            (job, status)
        })
        .await;

    let checked = statuses.len();
    for (job, status) in statuses {
        table.set(job.row, robots_col, status.to_string());
    }
    info!(checked, "robots.txt check complete");
    Ok(checked)
}

/// Re-probe rows that came back `403` or `TIMEOUT`, typically with a prober
/// built from [`stancemap_common::ProbeConfig::blocked_retry`]. Returns how
/// many rows were retried; zero means the table is unchanged.
pub async fn retry_blocked(
    table: &mut CountryTable,
    prober: &UrlProber,
    concurrency: usize,
) -> Result<usize, StanceMapError> {
    let url_col = table.require_column(COL_MINISTRY_URL)?;
    let status_col = table.require_column(COL_HTTP_STATUS)?;

    let jobs: Vec<RowJob> = (0..table.len())
        .filter(|&row| {
            matches!(
                table.get(row, status_col).trim().parse::<ProbeStatus>(),
                Ok(ProbeStatus::Http(403)) | Ok(ProbeStatus::Timeout)
            )
        })
        .filter(|&row| !table.get(row, url_col).trim().is_empty())
        .map(|row| RowJob {
            row,
            country: table.value(row, COL_COUNTRY).to_string(),
            url: table.get(row, url_col).trim().to_string(),
        })
        .collect();

    if jobs.is_empty() {
        info!("No blocked URLs to retry");
        return Ok(0);
    }
    info!(count = jobs.len(), "Retrying blocked URLs with browser headers");

    let outcomes = probe_rows(prober, jobs, concurrency).await;
    let retried = outcomes.len();
    let mut recovered = 0;
    for (job, outcome) in outcomes {
        if outcome.status.is_ok() {
            recovered += 1;
        }
        if outcome.redirected_to_live_page() {
            table.set(job.row, url_col, outcome.final_url.as_str());
        }
        table.set(job.row, status_col, outcome.status.to_string());
    }

    info!(retried, recovered, "Blocked URL retry complete");
    Ok(retried)
}

async fn probe_rows(
    prober: &UrlProber,
    jobs: Vec<RowJob>,
    concurrency: usize,
) -> Vec<(RowJob, ProbeOutcome)> {
    let pool = TaskPool::new(concurrency, Schedule::Rolling);
    pool.run(jobs, |job| async move {
        let outcome = prober.probe(&job.url).await;
        info!(
            country = job.country.as_str(),
            url = job.url.as_str(),
            status = %outcome.status,
            final_url = outcome.final_url.as_str(),
            "Probed"
        );
        (job, outcome)
    })
    .await
}
