//! Vector store implementations.
//!
//! Available backends:
//! - `MemoryStore` - In-memory storage (tests and development)
//! - `QdrantStore` - Qdrant over REST
//!
//! Both evaluate the predicate produced by [`filter::to_native_filter`].

pub mod filter;
pub mod memory;
pub mod point;
pub mod qdrant;

pub use filter::{matches_payload, to_native_filter};
pub use memory::MemoryStore;
pub use point::point_id;
pub use qdrant::QdrantStore;
