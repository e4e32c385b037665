//! OpenAI-backed collaborators.
//!
//! Only available with the `openai` feature.
//!
//! - [`OpenAIEmbeddingProvider`] calls `/v1/embeddings` through `reqwest`.
//! - [`OpenAICompletionService`] streams chat completions through `async-openai`.

mod completion;
mod embedding;

pub use completion::OpenAICompletionService;
pub use embedding::OpenAIEmbeddingProvider;

/// Default OpenAI REST endpoint.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
