// Test mocks for the scrape pipeline.
//
// - MockRenderer (PageRenderer): HashMap-based URL→HTML, with optional
//   per-URL failures and a shared delay.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use stancemap_common::CountryRecord;

use crate::renderer::{PageRenderer, RenderOptions};

// ---------------------------------------------------------------------------
// MockRenderer
// ---------------------------------------------------------------------------

/// Returns registered HTML per URL; `Err` for failures and unregistered URLs.
/// Builder pattern: `.on_page()`, `.failing()`, `.with_delay()`.
pub struct MockRenderer {
    pages: HashMap<String, String>,
    failures: HashMap<String, String>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            failures: HashMap::new(),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn failing(mut self, url: &str, message: &str) -> Self {
        self.failures.insert(url.to_string(), message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// URLs rendered so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageRenderer for MockRenderer {
    async fn render(&self, url: &str, _options: &RenderOptions) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = self.failures.get(url) {
            bail!("{message}");
        }
        match self.pages.get(url) {
            Some(html) => Ok(html.clone()),
            None => bail!("MockRenderer: no page registered for {url}"),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A live country row, as the prober leaves it.
pub fn live_country(name: &str, code: &str, url: &str) -> CountryRecord {
    CountryRecord {
        name: name.to_string(),
        code: code.to_string(),
        ministry_url: url.to_string(),
        http_status: "200".to_string(),
        robots_status: String::new(),
    }
}

/// Minimal ministry homepage carrying `body` as its only visible text.
pub fn ministry_page(body: &str) -> String {
    format!(
        "<html><head><title>MFA</title><script>var x = 1;</script></head>\
         <body><main><p>{body}</p></main></body></html>"
    )
}
