//! Storage backends
//!
//! Implementations of the [`ObjectStore`](crate::core::ObjectStore)
//! capability interface: a thin S3 HTTP client for real buckets and an
//! in-memory store for tests.

pub mod memory;
pub mod s3;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;
