//! Storage provider enumeration.

use serde::{Deserialize, Serialize};

/// Where a blob physically lives.
///
/// The tag is persisted with every [`MediaRecord`](crate::MediaRecord) and
/// drives deletion routing, so it must name the backend that actually holds
/// the bytes.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::EnumString,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageProvider {
    /// Local transactional object store
    #[default]
    #[display("local")]
    Local,
    /// Large-media HTTP API backed by a CDN
    #[display("netlify")]
    Netlify,
    /// Hosted object-storage bucket
    #[display("supabase")]
    Supabase,
}

impl StorageProvider {
    /// Convert to string representation for ledger storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageProvider::Local => "local",
            StorageProvider::Netlify => "netlify",
            StorageProvider::Supabase => "supabase",
        }
    }

    /// True for backends reached over the network.
    pub fn is_remote(&self) -> bool {
        !matches!(self, StorageProvider::Local)
    }
}
