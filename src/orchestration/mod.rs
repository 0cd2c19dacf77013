//! Orchestration layer
//!
//! High-level workflows over the core components: the publish sequence and
//! the paginated version listing.

pub mod lister;
pub mod publisher;

pub use lister::{PublishedVersion, VersionLister, VersionListing};
pub use publisher::{ExistsDecision, PublishOptions, PublishOrchestrator, PublishReport};
