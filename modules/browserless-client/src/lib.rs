pub mod error;

pub use error::{BrowserlessError, Result};

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

/// Extra time allowed on top of the navigation timeout for Browserless to
/// queue the session and serialize the DOM.
const RESPONSE_GRACE: Duration = Duration::from_secs(15);

/// Options for a single `/content` render. Each call runs in its own
/// browser page, which Browserless closes when the response is sent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(rename = "setExtraHTTPHeaders", skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_headers: BTreeMap<String, String>,
    pub goto_options: GotoOptions,
    /// Extra fixed wait after navigation settles, for late client-side rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_timeout: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GotoOptions {
    pub wait_until: String,
    pub timeout: u64,
}

impl ContentRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            goto_options: GotoOptions {
                wait_until: "networkidle2".to_string(),
                timeout: 30_000,
            },
            wait_for_timeout: None,
        }
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.goto_options.timeout = timeout.as_millis() as u64;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.wait_for_timeout = (!delay.is_zero()).then(|| delay.as_millis() as u64);
        self
    }

    fn total_budget(&self) -> Duration {
        Duration::from_millis(self.goto_options.timeout + self.wait_for_timeout.unwrap_or(0))
            + RESPONSE_GRACE
    }
}

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| BrowserlessError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    /// Fetch fully-rendered HTML content for a URL via Browserless /content endpoint.
    pub async fn content(&self, request: &ContentRequest) -> Result<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let budget = request.total_budget();
        debug!(url = %request.url, budget_ms = budget.as_millis() as u64, "Browserless content request");

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .timeout(budget)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrowserlessError::Timeout(budget.as_millis() as u64)
                } else {
                    e.into()
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_request_serializes_browserless_shape() {
        let request = ContentRequest::new("https://www.example.com")
            .user_agent("Mozilla/5.0")
            .header("Accept-Language", "en-US,en;q=0.9")
            .navigation_timeout(Duration::from_secs(20))
            .settle_delay(Duration::from_millis(1500));

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["url"], "https://www.example.com");
        assert_eq!(value["userAgent"], "Mozilla/5.0");
        assert_eq!(value["setExtraHTTPHeaders"]["Accept-Language"], "en-US,en;q=0.9");
        assert_eq!(value["gotoOptions"]["waitUntil"], "networkidle2");
        assert_eq!(value["gotoOptions"]["timeout"], 20_000);
        assert_eq!(value["waitForTimeout"], 1500);
    }

    #[test]
    fn zero_settle_delay_is_omitted() {
        let request = ContentRequest::new("https://a.test").settle_delay(Duration::ZERO);
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("waitForTimeout").is_none());
        assert!(value.get("setExtraHTTPHeaders").is_none());
    }
}
