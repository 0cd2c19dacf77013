pub mod artifact;
pub mod config;
pub mod error;
pub mod manifest;
pub mod traits;

pub use artifact::*;
pub use config::*;
pub use error::*;
pub use manifest::*;
pub use traits::*;
