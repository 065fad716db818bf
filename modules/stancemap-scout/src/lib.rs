pub mod aggregator;
pub mod maintenance;
pub mod pool;
pub mod prober;
pub mod renderer;
pub mod text;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use aggregator::{AggregateReport, Aggregator, CountryOutcome};
pub use pool::TaskPool;
pub use prober::{normalize_url, ProbeOutcome, UrlProber};
pub use renderer::{BrowserlessRenderer, ChromeRenderer, PageRenderer, RenderOptions};
