use serde::Deserialize;

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "facewizard";
pub const ENV_PREFIX: &str = "FACEWIZARD";

pub const DEFAULT_ENDPOINT: &str = "https://westus.api.cognitive.microsoft.com/face/v1.0";

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Subscription key sent with every detection request.
    pub api_key: String,
    /// Base URL of the Face API, without the operation path.
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub window_width: f32,
    pub window_height: f32,
    /// Outline width of the face rectangles, in pixels.
    pub outline_thickness: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 30,
            window_width: 960.,
            window_height: 720.,
            outline_thickness: 2,
        }
    }
}

impl Config {
    /// Defaults, then `facewizard.{toml,json,..}` in the working directory, then
    /// `FACEWIZARD_*` environment variables (a `.env` file is loaded first).
    pub fn get() -> Result<Config> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!("ignoring unreadable .env file: {}", err);
            }
        }

        let builder = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX));

        Self::from_builder(builder)
    }

    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Config> {
        let config = builder.build()?.try_deserialize::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "api_key is not set (use {}_API_KEY or {}.toml)",
                ENV_PREFIX, CONFIG_FILE
            )));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "endpoint must be an http(s) url, got {:?}",
                self.endpoint
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "request_timeout_secs must be > 0".into(),
            ));
        }
        if self.outline_thickness == 0 {
            return Err(Error::InvalidConfig("outline_thickness must be > 0".into()));
        }
        Ok(())
    }
}
