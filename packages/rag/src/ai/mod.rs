//! Model provider implementations.
//!
//! Reference implementations of [`EmbeddingClient`](crate::traits::ai::EmbeddingClient)
//! and [`GenerationClient`](crate::traits::ai::GenerationClient). Callers can
//! use these directly or bring their own.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAIProvider;
