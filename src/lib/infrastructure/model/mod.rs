//! Model infrastructure module
//!
//! # Structure
//! - `types` - completion request and error types
//! - `traits` - the `ModelProvider` seam
//! - `factory` - builds a provider from agent settings
//! - `clients` - OpenAI-compatible HTTP client

pub mod clients;
pub mod factory;
pub mod traits;
pub mod types;

pub use clients::OpenAIClient;
pub use factory::{OpenAIProviderFactory, ProviderFactory};
pub use traits::ModelProvider;
pub use types::{CompletionRequest, ModelError};
