//! Configuration loading.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults (local storage under the platform data directory)
//! 2. `medialib/medialib.toml` in the user config directory
//! 3. `medialib.toml` in the current directory
//! 4. `MEDIALIB_*` environment variables, `__` separating nested keys
//!    (`MEDIALIB_STORAGE_TYPE`, `MEDIALIB_NETLIFY__ACCESS_TOKEN`)
//!
//! # Example
//!
//! ```toml
//! storage_type = "supabase"
//! data_dir = "/var/lib/medialib"
//!
//! [netlify]
//! access_token = "nfp_..."
//! site_id = "3f9a..."
//!
//! [supabase]
//! url = "https://abcd.supabase.co"
//! anon_key = "eyJ..."
//! ```

use config::{Config, Environment, File};
use derive_getters::Getters;
use medialib_core::{NetlifySettings, StorageProvider, SupabaseSettings};
use medialib_error::{ConfigError, MediaResult};
use medialib_storage::{
    MediaLibrary, NetlifyLargeMedia, PostgrestLedger, SupabaseBucket,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

const APP_NAME: &str = "medialib";
const ENV_PREFIX: &str = "MEDIALIB";
const REDACTED: &str = "***";

/// Everything needed to construct a [`MediaLibrary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct MediaLibraryConfig {
    /// Backend used when an upload does not name one
    #[serde(default, deserialize_with = "deserialize_provider")]
    storage_type: StorageProvider,
    /// Directory holding the local object store and ledger snapshot
    #[serde(default = "default_data_dir")]
    #[setters(into)]
    data_dir: PathBuf,
    /// Large-media API settings
    #[serde(default)]
    netlify: NetlifySettings,
    /// Bucket and remote ledger settings
    #[serde(default)]
    supabase: SupabaseSettings,
}

impl Default for MediaLibraryConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageProvider::default(),
            data_dir: default_data_dir(),
            netlify: NetlifySettings::default(),
            supabase: SupabaseSettings::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Accepts provider names in any case so environment values like `Netlify`
/// work.
fn deserialize_provider<'de, D>(deserializer: D) -> Result<StorageProvider, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    StorageProvider::from_str(value.trim()).map_err(|_| {
        serde::de::Error::custom(format!(
            "unknown storage type '{}', expected local, netlify or supabase",
            value
        ))
    })
}

impl MediaLibraryConfig {
    /// Load from the standard files and the environment.
    ///
    /// A `.env` file in the current directory is read first.
    ///
    /// # Errors
    ///
    /// Fails on unreadable files or invalid values, including an unknown
    /// storage type.
    #[tracing::instrument]
    pub fn load() -> MediaResult<Self> {
        let _ = dotenvy::dotenv();
        debug!("Loading configuration: env > ./medialib.toml > user config dir > defaults");

        let mut builder = Config::builder();
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(APP_NAME).join("medialib.toml");
            builder = builder.add_source(File::from(user_config).required(false));
        }
        builder = builder
            .add_source(File::with_name(APP_NAME).required(false))
            .add_source(Self::environment());

        Self::finish(builder)
    }

    /// Load from one explicit file plus `environment`.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing or any value is invalid.
    pub fn from_sources(path: Option<&Path>, environment: Environment) -> MediaResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        Self::finish(builder.add_source(environment))
    }

    /// The `MEDIALIB_*` environment source.
    pub fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
    }

    fn finish(builder: config::ConfigBuilder<config::builder::DefaultState>) -> MediaResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        debug!(
            storage_type = %config.storage_type,
            data_dir = %config.data_dir.display(),
            netlify = config.netlify.is_configured(),
            supabase = config.supabase.is_configured(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Copy with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.netlify.access_token().is_some() {
            copy.netlify = copy.netlify.with_access_token(REDACTED);
        }
        if copy.supabase.anon_key().is_some() {
            copy.supabase = copy.supabase.with_anon_key(REDACTED);
        }
        copy
    }

    /// Build the library described by this configuration.
    ///
    /// Both remote backends are always registered so an unconfigured one
    /// fails fast and falls back. The remote ledger is attached only when the
    /// bucket project is configured.
    ///
    /// # Errors
    ///
    /// Fails when the local store or ledger snapshot cannot be opened.
    #[tracing::instrument(skip(self), fields(data_dir = %self.data_dir.display()))]
    pub async fn connect(&self) -> MediaResult<MediaLibrary> {
        let mut builder = MediaLibrary::builder(&self.data_dir)
            .default_provider(self.storage_type)
            .backend(Arc::new(NetlifyLargeMedia::new(self.netlify.clone())))
            .backend(Arc::new(SupabaseBucket::new(self.supabase.clone())));

        if self.supabase.is_configured() {
            builder = builder.remote_ledger(Arc::new(PostgrestLedger::new(&self.supabase)?));
        }

        let library = builder.build().await?;
        info!(default_provider = %self.storage_type, "Connected media library");
        Ok(library)
    }
}
