//! Build layer
//!
//! Staging of a filtered project copy into the ephemeral build directory,
//! and the streaming tar+gzip upload path over it.

pub mod archive;
pub mod staging;

pub use archive::upload_archive;
pub use staging::BuildStaging;
