pub mod build;
pub mod core;
pub mod orchestration;
pub mod storage;

pub use build::{upload_archive, BuildStaging};
pub use self::core::*;
pub use orchestration::{
    PublishOptions, PublishOrchestrator, PublishReport, PublishedVersion, VersionLister,
    VersionListing,
};
pub use storage::{MemoryObjectStore, S3ObjectStore};
