//! Data types for the RAG pipeline.

pub mod chunk;
pub mod citation;
pub mod config;
pub mod conversation;
pub mod filter;
pub mod hit;
pub mod result;
