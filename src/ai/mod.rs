//! AI Integration Layer
//!
//! Model access, prompts and recovery of structured output.

pub mod prompt;
pub mod provider;
pub mod timeout;
pub mod validation;

pub use prompt::Prompt;
pub use provider::{
    LlmProvider, LlmResponse, OllamaProvider, OpenAiProvider, ResponseMetadata, ResponseTiming,
    SharedProvider, TokenUsage, create_provider,
};
pub use timeout::with_timeout;
pub use validation::{JsonRepairer, extract_json_list, extract_json_object};
