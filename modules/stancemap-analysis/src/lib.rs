pub mod analyzer;
pub mod prompt;
pub mod response;
pub mod reverify;
pub mod store;
pub mod verify;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use analyzer::{AnalysisReport, TopicAnalyzer, TopicRun};
pub use reverify::{reverify_file, ReverifySummary};
pub use verify::{verify_position, verify_quote, MIN_HALF_CHARS};
