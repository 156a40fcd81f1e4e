// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Configuration file handling.

use config::Config;
use log::warn;
use serde_with::{DurationSeconds, serde_as};
use std::env;
use std::time::Duration;
use url::Url;

/// Default configuration file.
pub const DEF_CONFIG_FILE: &str = "configuration.yaml";

pub const DEF_API_URL: &str = "https://api.octopus.energy";

/// Environment variable holding the Octopus Energy API key.
///
/// Takes precedence over the `octopus.api_key` configuration value.
pub const ENV_API_KEY: &str = "OE_API_KEY";

/// Environment variable to enable Kraken API message tracing.
///
/// Valid values: `true` or `1`.
///
/// **Attention:** this setting is only for debugging and exposes all data, including the API key!
pub const ENV_API_MSG_TRACING: &str = "OE_API_MSG_TRACING";

/// Minimal allowed polling interval of the intelligent settings.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Default, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub integration: IntegrationSettings,
    pub octopus: OctopusSettings,
    pub intelligent: IntelligentPollSettings,
}

#[derive(serde::Deserialize, serde::Serialize)]
pub struct IntegrationSettings {
    pub interface: String,
    pub http: WebServerSettings,
    /// Optional access token required in the `auth-token` header of REST requests.
    pub token: Option<String>,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            interface: "0.0.0.0".to_string(),
            http: WebServerSettings {
                enabled: true,
                port: 8000,
            },
            token: None,
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize)]
pub struct WebServerSettings {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Clone, serde::Deserialize, serde::Serialize)]
pub struct OctopusSettings {
    /// Base URL of the Octopus Energy API. The GraphQL endpoint is `{api_url}/v1/graphql/`.
    pub api_url: Url,
    api_key: String,
    /// Octopus Energy account number, e.g. `A-1234ABCD`.
    pub account_id: String,
    /// HTTP request timeout in seconds.
    pub request_timeout: u8,
}

impl Default for OctopusSettings {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEF_API_URL).expect("valid default API url"),
            api_key: "".to_string(),
            account_id: "".to_string(),
            request_timeout: 20,
        }
    }
}

impl OctopusSettings {
    /// Return the configured API key.
    ///
    /// The `OE_API_KEY` environment variable overrides the configuration file value.
    pub fn get_api_key(&self) -> String {
        env::var(ENV_API_KEY)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.api_key.clone())
    }

    pub fn set_api_key(&mut self, api_key: impl AsRef<str>) {
        self.api_key = api_key.as_ref().trim().to_string();
    }
}

#[serde_as]
#[derive(Clone, serde::Deserialize, serde::Serialize)]
pub struct IntelligentPollSettings {
    /// How often the intelligent settings are polled.
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "refresh_interval_sec")]
    pub refresh_interval: Duration,
}

impl Default for IntelligentPollSettings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60 * 5),
        }
    }
}

/// Load the configuration settings.
///
/// The application provides default values which can be overriden in the following order:
/// 1. Configuration settings in the read-only yaml configuration file specified in `filename`
/// 2. Environment variables with prefix `OE_` and `__` as nesting separator,
///    e.g. `OE_OCTOPUS__ACCOUNT_ID=A-1234ABCD`.
pub fn get_configuration(filename: Option<&str>) -> Result<Settings, config::ConfigError> {
    // default configuration
    let mut config = Config::builder().add_source(Config::try_from(&Settings::default())?);
    // read optional configuration file to override defaults
    if let Some(filename) = filename {
        config = config.add_source(config::File::with_name(filename));
    }

    let config = config
        .add_source(
            config::Environment::with_prefix("OE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings: Settings = config.try_deserialize()?;

    check_cfg_values(settings)
}

/// Verify that the Octopus Energy API url uses a supported scheme.
pub fn check_api_url(api_url: &Url) -> Result<(), config::ConfigError> {
    match api_url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(config::ConfigError::Message(format!(
            "invalid scheme in octopus.api_url: {scheme}. Valid: [http, https]"
        ))),
    }
}

fn check_cfg_values(mut settings: Settings) -> Result<Settings, config::ConfigError> {
    if settings.intelligent.refresh_interval < MIN_REFRESH_INTERVAL {
        warn!(
            "Intelligent refresh interval too short ({:?}), using minimum of {:?}",
            settings.intelligent.refresh_interval, MIN_REFRESH_INTERVAL
        );
        settings.intelligent.refresh_interval = MIN_REFRESH_INTERVAL;
    }

    if settings.octopus.request_timeout == 0 {
        warn!("Invalid request timeout, using default.");
        settings.octopus.request_timeout = OctopusSettings::default().request_timeout;
    }

    check_api_url(&settings.octopus.api_url)?;

    settings.octopus.account_id = settings.octopus.account_id.trim().to_string();
    if settings.octopus.account_id.is_empty() {
        return Err(config::ConfigError::Message(
            "octopus.account_id must be set".into(),
        ));
    }

    Ok(settings)
}
