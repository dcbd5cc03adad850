//! Gemini text generation: HTTP client, prompt construction, retry policy.

pub mod client;
pub mod prompt;
pub mod retry;

pub use client::{GeminiClient, GenerateText};
pub use prompt::build_prompt;
pub use retry::generate_with_retry;
