use std::{collections::HashMap, path::PathBuf, time::Duration};

use config::{Config as ConfigLib, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::rules::RulePolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub cache: CacheConfig,
    pub remote: RemoteConfig,
    pub rules: RulesConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the cached artifacts.
    pub folder: PathBuf,
    /// Freshness window for cached resources, in hours.
    pub update_window_hours: u64,
}

impl CacheConfig {
    pub fn update_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.update_window_hours as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_partial_series_countries")]
    pub partial_series_countries: Vec<String>,
    #[serde(default)]
    pub booster_recovery_kids: Vec<String>,
    #[serde(default = "default_restricted_products")]
    pub restricted_products: Vec<ProductRestriction>,
}

/// A medicinal product accepted only when administered in the listed countries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRestriction {
    pub product: String,
    pub countries: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            partial_series_countries: default_partial_series_countries(),
            booster_recovery_kids: Vec::new(),
            restricted_products: default_restricted_products(),
        }
    }
}

fn default_partial_series_countries() -> Vec<String> {
    vec!["IT".to_string()]
}

fn default_restricted_products() -> Vec<ProductRestriction> {
    vec![ProductRestriction {
        product: "Sputnik-V".to_string(),
        countries: vec!["SM".to_string()],
    }]
}

impl From<RulesConfig> for RulePolicy {
    fn from(config: RulesConfig) -> Self {
        RulePolicy {
            partial_series_countries: config.partial_series_countries.into_iter().collect(),
            booster_recovery_kids: config.booster_recovery_kids.into_iter().collect(),
            restricted_products: config
                .restricted_products
                .into_iter()
                .map(|r| (r.product, r.countries.into_iter().collect()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub interval_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_sources(None)
    }

    pub fn load_with_sources(
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigLib::builder()
            .set_default("cache.folder", ".cache")?
            .set_default("cache.update_window_hours", 24)?
            .set_default("remote.base_url", "https://get.dgc.gov.it/v1/dgc")?
            .set_default("remote.timeout_secs", 30)?
            .set_default("rules.partial_series_countries", vec!["IT"])?
            .set_default("rules.booster_recovery_kids", Vec::<String>::new())?
            .set_default("sync.interval_secs", 3600)?
            .add_source(File::with_name("config/settings").required(false));

        // Explicit overrides keep tests isolated from the process environment
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // Format: APP_CACHE__FOLDER, APP_REMOTE__BASE_URL
            builder = builder.add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("rules.partial_series_countries")
                    .with_list_parse_key("rules.booster_recovery_kids")
                    .try_parsing(true),
            );
        }

        builder.build()?.try_deserialize()
    }
}
