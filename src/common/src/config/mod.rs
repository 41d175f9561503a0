use std::path::Path;

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use once_cell::sync::OnceCell;

use sli_query::RequestOptions;
use sli_query::consts::{DEFAULT_RESOLUTION, DEFAULT_SLO_TIME_FRAME};

pub static CONFIG: OnceCell<Configuration> = OnceCell::new();

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "sliquery.toml";

/// Prefix of environment variables overriding the configuration.
pub const ENV_PREFIX: &str = "SLIQUERY__";

/// Settings applied when rendering API requests
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestConfig {
    /// Resolution sent when a metrics query does not carry one
    pub default_resolution: String,
    /// Time frame sent to the SLO endpoint
    pub slo_time_frame: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_resolution: DEFAULT_RESOLUTION.to_string(),
            slo_time_frame: DEFAULT_SLO_TIME_FRAME.to_string(),
        }
    }
}

impl From<&RequestConfig> for RequestOptions {
    fn from(config: &RequestConfig) -> Self {
        Self {
            default_resolution: config.default_resolution.clone(),
            slo_time_frame: config.slo_time_frame.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Configuration {
    /// Request rendering configuration
    pub request: RequestConfig,
}

impl Configuration {
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions::from(&self.request)
    }

    /// Load defaults, then `sliquery.toml`, then `SLIQUERY__` environment variables.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::load_from_path(DEFAULT_CONFIG_FILE)
    }

    /// Like [`Configuration::load`], reading the TOML file at `path` instead.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }
}
