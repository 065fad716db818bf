use std::error::Error as StdError;
use std::io::ErrorKind;

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use stancemap_common::{ProbeConfig, ProbeStatus};
use tracing::debug;
use url::Url;

/// Turn a CSV domain cell into an absolute URL.
///
/// `example.com` → `https://www.example.com`, `www.example.com` →
/// `https://www.example.com`; values that already carry an http(s) scheme are
/// kept as they are.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }
    if trimmed.starts_with("www.") {
        return format!("https://{trimmed}");
    }
    format!("https://www.{trimmed}")
}

/// Resolve a `Location` header against the URL that produced it.
///
/// Absolute and protocol-relative values parse on their own; anything else is
/// joined to the current origin, with bare paths getting a leading `/`.
pub fn resolve_location(current: &Url, location: &str) -> Option<Url> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }
    if let Ok(absolute) = Url::parse(location) {
        return Some(absolute);
    }
    if location.starts_with("//") {
        return Url::parse(&format!("{}:{location}", current.scheme())).ok();
    }
    let origin = current.origin().ascii_serialization();
    if location.starts_with('/') {
        Url::parse(&format!("{origin}{location}")).ok()
    } else {
        Url::parse(&format!("{origin}/{location}")).ok()
    }
}

/// `scheme://host[:port]/robots.txt` for any URL on the site.
pub fn robots_url(site: &str) -> Option<String> {
    let parsed = Url::parse(site).ok()?;
    if !parsed.has_host() {
        return None;
    }
    Some(format!("{}/robots.txt", parsed.origin().ascii_serialization()))
}

/// Where a probe ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Last URL requested; equals the input when no redirect was followed.
    pub final_url: String,
    pub status: ProbeStatus,
    pub redirects: usize,
}

impl ProbeOutcome {
    fn new(final_url: impl Into<String>, status: ProbeStatus, redirects: usize) -> Self {
        Self {
            final_url: final_url.into(),
            status,
            redirects,
        }
    }

    /// A redirect chain that ended on a live page; the CSV keeps the new URL.
    pub fn redirected_to_live_page(&self) -> bool {
        self.redirects > 0 && self.status.is_ok()
    }
}

/// Liveness checker with manual redirect following.
pub struct UrlProber {
    client: reqwest::Client,
    max_redirects: usize,
}

impl UrlProber {
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        if config.browser_headers {
            headers = browser_headers();
        }
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .context("Failed to build probe HTTP client")?;

        Ok(Self {
            client,
            max_redirects: config.max_redirects,
        })
    }

    /// Probe one URL. Failures come back as a status, never as an error.
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        let url = url.trim();
        if url.is_empty() {
            return ProbeOutcome::new("", ProbeStatus::Empty, 0);
        }

        let mut current_str = url.to_string();
        let mut current = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => return ProbeOutcome::new(current_str, ProbeStatus::InvalidUrl, 0),
        };
        let mut redirects = 0;

        loop {
            let response = match self.client.get(current.clone()).send().await {
                Ok(response) => response,
                Err(e) => {
                    let status = classify_error(&e);
                    debug!(url = current_str.as_str(), error = %e, %status, "Probe failed");
                    return ProbeOutcome::new(current_str, status, redirects);
                }
            };

            let code = response.status().as_u16();
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            match location {
                Some(location) if matches!(code, 301 | 302 | 307 | 308) => {
                    if redirects >= self.max_redirects {
                        return ProbeOutcome::new(
                            current_str,
                            ProbeStatus::MaxRedirects(code),
                            redirects,
                        );
                    }
                    let Some(next) = resolve_location(&current, &location) else {
                        return ProbeOutcome::new(current_str, ProbeStatus::InvalidUrl, redirects);
                    };
                    redirects += 1;
                    debug!(from = current_str.as_str(), to = %next, code, "Following redirect");
                    current_str = next.to_string();
                    current = next;
                }
                _ => return ProbeOutcome::new(current_str, ProbeStatus::Http(code), redirects),
            }
        }
    }

    /// Status of `<origin>/robots.txt` for the site at `site`. A redirect is
    /// recorded as its own status code, not followed.
    pub async fn check_robots(&self, site: &str) -> ProbeStatus {
        if site.trim().is_empty() {
            return ProbeStatus::Empty;
        }
        let Some(url) = robots_url(site.trim()) else {
            return ProbeStatus::InvalidUrl;
        };
        match self.client.get(url.as_str()).send().await {
            Ok(response) => ProbeStatus::Http(response.status().as_u16()),
            Err(e) => {
                let status = classify_error(&e);
                debug!(url = url.as_str(), error = %e, %status, "robots.txt check failed");
                status
            }
        }
    }
}

/// Headers a desktop Chrome sends on a top-level navigation.
fn browser_headers() -> HeaderMap {
    let pairs = [
        (
            header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
        (header::ACCEPT_LANGUAGE, "en-US,en;q=0.9"),
        (header::ACCEPT_ENCODING, "gzip, deflate, br"),
        (header::DNT, "1"),
        (header::CONNECTION, "keep-alive"),
        (header::UPGRADE_INSECURE_REQUESTS, "1"),
        (header::CACHE_CONTROL, "max-age=0"),
    ];
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(name, HeaderValue::from_static(value));
    }
    for (name, value) in [
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-user", "?1"),
    ] {
        headers.insert(name, HeaderValue::from_static(value));
    }
    headers
}

/// Map a transport failure onto the CSV's categorical tags.
fn classify_error(err: &reqwest::Error) -> ProbeStatus {
    if err.is_timeout() {
        return ProbeStatus::Timeout;
    }
    if err.is_builder() {
        return ProbeStatus::InvalidUrl;
    }

    let mut io_kind = None;
    let mut chain = String::new();
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            match io.kind() {
                ErrorKind::ConnectionRefused => return ProbeStatus::ConnectionRefused,
                ErrorKind::TimedOut => return ProbeStatus::Timeout,
                kind => io_kind = Some(kind),
            }
        }
        chain.push_str(&e.to_string().to_lowercase());
        chain.push('\n');
        source = e.source();
    }

    if chain.contains("dns error")
        || chain.contains("failed to lookup address")
        || chain.contains("name or service not known")
        || chain.contains("no such host")
    {
        ProbeStatus::DnsError
    } else if chain.contains("connection refused") {
        ProbeStatus::ConnectionRefused
    } else if chain.contains("timed out") {
        ProbeStatus::Timeout
    } else if chain.contains("certificate") || chain.contains("tls") || chain.contains("handshake")
    {
        ProbeStatus::Error("TLS".into())
    } else if let Some(kind) = io_kind {
        ProbeStatus::Error(io_kind_code(kind))
    } else {
        ProbeStatus::Error("UNKNOWN".into())
    }
}

fn io_kind_code(kind: ErrorKind) -> String {
    match kind {
        ErrorKind::ConnectionReset => "ECONNRESET".into(),
        ErrorKind::ConnectionAborted => "ECONNABORTED".into(),
        ErrorKind::BrokenPipe => "EPIPE".into(),
        ErrorKind::UnexpectedEof => "EOF".into(),
        ErrorKind::AddrNotAvailable => "EADDRNOTAVAIL".into(),
        other => format!("{other:?}").to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_prefix_rules() {
        assert_eq!(normalize_url("example.com"), "https://www.example.com");
        assert_eq!(normalize_url("www.example.com"), "https://www.example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("https://mfa.gov.tl/en"), "https://mfa.gov.tl/en");
        assert_eq!(normalize_url("  example.com  "), "https://www.example.com");
        assert_eq!(normalize_url(""), "");
        assert_eq!(normalize_url("   "), "");
    }

    #[test]
    fn relative_locations_resolve_against_origin() {
        let current = Url::parse("https://www.example.com/deep/page?x=1").unwrap();
        assert_eq!(
            resolve_location(&current, "/en/home").unwrap().as_str(),
            "https://www.example.com/en/home"
        );
        assert_eq!(
            resolve_location(&current, "en/home").unwrap().as_str(),
            "https://www.example.com/en/home"
        );
        assert_eq!(
            resolve_location(&current, "//cdn.example.org/x").unwrap().as_str(),
            "https://cdn.example.org/x"
        );
        assert_eq!(
            resolve_location(&current, "http://other.example/").unwrap().as_str(),
            "http://other.example/"
        );
        assert!(resolve_location(&current, "  ").is_none());
    }

    #[test]
    fn robots_url_uses_origin() {
        assert_eq!(
            robots_url("https://www.example.com/en/home").as_deref(),
            Some("https://www.example.com/robots.txt")
        );
        assert_eq!(
            robots_url("http://127.0.0.1:8080/x").as_deref(),
            Some("http://127.0.0.1:8080/robots.txt")
        );
        assert!(robots_url("not a url").is_none());
    }

    #[test]
    fn browser_headers_cover_fetch_metadata() {
        let headers = browser_headers();
        assert_eq!(headers["sec-fetch-mode"], "navigate");
        assert_eq!(headers[header::UPGRADE_INSECURE_REQUESTS], "1");
        assert!(headers.contains_key(header::ACCEPT_LANGUAGE));
    }

    #[test]
    fn zero_timeout_prober_is_refused() {
        let config = ProbeConfig {
            timeout: std::time::Duration::ZERO,
            ..ProbeConfig::default()
        };
        assert!(UrlProber::new(&config).is_err());
    }

    #[tokio::test]
    async fn blank_and_invalid_inputs() {
        let prober = UrlProber::new(&ProbeConfig::default()).unwrap();
        let blank = prober.probe("  ").await;
        assert_eq!(blank.status, ProbeStatus::Empty);
        assert_eq!(blank.final_url, "");

        let invalid = prober.probe("https://exa mple.com").await;
        assert_eq!(invalid.status, ProbeStatus::InvalidUrl);
    }
}
