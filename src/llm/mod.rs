//! LLM client abstraction layer
//!
//! A small trait-based seam so the extractor can run against a real provider
//! (via genai) or a scripted mock in tests.

mod client;
mod error;
mod genai_client;
mod mock;
mod types;

pub use client::LLMClient;
pub use error::BackendError;
pub use genai_client::GenAIClient;
pub use mock::{MockLLMClient, MockResponse};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole, ToolCall, ToolDefinition};
