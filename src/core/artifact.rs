//! Artifact naming convention
//!
//! An artifact key encodes the package identity as `{name}-{version}.tgz`.
//! Listing recovers the identity with the inverse pattern; keys that do not
//! follow the convention are classified instead of aborting the listing.

use crate::core::manifest::PackageIdentity;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Inverse of the `{name}-{version}.tgz` convention. Names are limited
    /// to word characters and hyphens, versions to three dotted numeric
    /// components.
    static ref ARTIFACT_KEY_RE: Regex =
        Regex::new(r"^([\w-]+)-(\d+\.\d+\.\d+)\.tgz$").unwrap();
}

/// Classification of one listed key against a target package name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyClass {
    /// Key follows the convention and names the target package
    Matched { name: String, version: String },

    /// Key follows the convention but names a different package
    Ignored,

    /// Key does not follow the convention at all
    Malformed,
}

/// Derive the canonical remote object key for a package identity.
///
/// No shape validation happens here: a name containing characters outside
/// the inverse pattern produces a key that can be uploaded but will never
/// be recovered by [`parse_artifact_key`]. That asymmetry is inherited from
/// the naming convention itself.
pub fn artifact_key(identity: &PackageIdentity) -> String {
    format!("{}-{}.tgz", identity.name, identity.version)
}

/// Recover `(name, version)` from an artifact key, if it follows the
/// naming convention.
pub fn parse_artifact_key(key: &str) -> Option<(String, String)> {
    ARTIFACT_KEY_RE
        .captures(key)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

/// Classify a listed key against the package being queried
pub fn classify_key(key: &str, target_name: &str) -> KeyClass {
    match parse_artifact_key(key) {
        Some((name, version)) if name == target_name => KeyClass::Matched { name, version },
        Some(_) => KeyClass::Ignored,
        None => KeyClass::Malformed,
    }
}
