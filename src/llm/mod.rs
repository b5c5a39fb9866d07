//! LLM client abstraction layer
//!
//! Trait-based access to the remote analysis service so the real GenAI
//! client and the scripted mock can be used interchangeably.

mod client;
mod error;
mod genai_client;
mod mock;
mod types;

pub use client::LLMClient;
pub use error::BackendError;
pub use genai_client::GenAIClient;
pub use mock::{MockLLMClient, MockResponse};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
