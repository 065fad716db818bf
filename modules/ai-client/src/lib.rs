pub mod error;
pub mod openai;
pub mod schema;
pub mod traits;
pub mod util;

pub use error::{AiError, Result};
pub use openai::OpenAi;
pub use schema::prompt_schema;
pub use traits::{ChatModel, Completion, CompletionRequest, Message, MessageRole, TokenUsage};
pub use util::{strip_code_blocks, truncate_chars};
