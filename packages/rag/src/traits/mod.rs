//! Core trait abstractions for the RAG library.
//!
//! These traits define the seams where applications plug in model
//! providers, vector stores and rerankers.

pub mod ai;
pub mod reranker;
pub mod store;
