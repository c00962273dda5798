//! Backend connection settings.
//!
//! These are plain data; loading them from files and the environment is the
//! facade crate's job.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Settings for the large-media HTTP API.
///
/// # Example
///
/// ```toml
/// [netlify]
/// api_endpoint = "https://api.netlify.com/api/v1"
/// access_token = "nfp_..."
/// site_id = "3f9a..."
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct NetlifySettings {
    /// API base URL
    #[serde(default = "default_netlify_endpoint")]
    api_endpoint: String,
    /// Bearer token
    #[serde(default)]
    #[setters(strip_option, into)]
    access_token: Option<String>,
    /// Site identifier
    #[serde(default)]
    #[setters(strip_option, into)]
    site_id: Option<String>,
}

fn default_netlify_endpoint() -> String {
    "https://api.netlify.com/api/v1".to_string()
}

impl Default for NetlifySettings {
    fn default() -> Self {
        Self {
            api_endpoint: default_netlify_endpoint(),
            access_token: None,
            site_id: None,
        }
    }
}

impl NetlifySettings {
    /// Both credentials present and non-empty.
    pub fn is_configured(&self) -> bool {
        non_empty(&self.access_token) && non_empty(&self.site_id)
    }
}

/// Settings for the hosted bucket and the remote ledger table.
///
/// # Example
///
/// ```toml
/// [supabase]
/// url = "https://abcd.supabase.co"
/// anon_key = "eyJ..."
/// bucket = "media"
/// table = "cms_media"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct SupabaseSettings {
    /// Project base URL
    #[serde(default)]
    #[setters(strip_option, into)]
    url: Option<String>,
    /// API key sent as `apikey` and bearer token
    #[serde(default)]
    #[setters(strip_option, into)]
    anon_key: Option<String>,
    /// Bucket holding uploaded blobs
    #[serde(default = "default_bucket")]
    #[setters(into)]
    bucket: String,
    /// Ledger table name
    #[serde(default = "default_table")]
    #[setters(into)]
    table: String,
}

fn default_bucket() -> String {
    "media".to_string()
}

fn default_table() -> String {
    "cms_media".to_string()
}

impl Default for SupabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            bucket: default_bucket(),
            table: default_table(),
        }
    }
}

impl SupabaseSettings {
    /// Project URL and key present and non-empty.
    pub fn is_configured(&self) -> bool {
        non_empty(&self.url) && non_empty(&self.anon_key)
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
