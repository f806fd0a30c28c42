//! sitebooks-categorize: model-backed transaction categorization with a
//! deterministic keyword fallback, plus the sequential batch runner.

pub mod batch;
pub mod categorizer;
pub mod completion;
pub mod prompt;
pub mod rules;

pub use batch::{BatchReport, DEFAULT_BATCH_SIZE, categorize_pending};
pub use categorizer::{Categorizer, CompletionSettings, parse_prediction, unparsed_reply};
pub use completion::{CompletionClient, CompletionError, CompletionRequest, OpenAiClient};
pub use prompt::build_prompt;
pub use rules::classify_by_rules;
