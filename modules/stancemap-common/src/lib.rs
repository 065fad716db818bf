pub mod artifacts;
pub mod config;
pub mod error;
pub mod status;
pub mod table;
pub mod time;
pub mod topics;
pub mod types;

pub use config::{AggregatorConfig, AnalyzerConfig, Paths, ProbeConfig, Schedule};
pub use error::StanceMapError;
pub use status::ProbeStatus;
pub use table::CountryTable;
pub use topics::{default_topics, topic_slug, validate_topics};
pub use types::*;
