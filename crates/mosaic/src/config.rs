use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use mosaic_assembly::{AssemblyConfig, MalformedFragmentPolicy};
use mosaic_fetch::GatewayOptions;
use mosaic_verify::Algorithm;
use serde::{Deserialize, Serialize};

/// Settings resolved from defaults, `mosaic.toml` and `MOSAIC_*` variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub assembly: AssemblySettings,
    pub gateway: GatewaySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblySettings {
    pub algorithm: String,
    pub malformed_fragments: MalformedFragmentPolicy,
    /// 0 disables the deadline.
    pub deadline_secs: u64,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default().name().to_string(),
            malformed_fragments: MalformedFragmentPolicy::default(),
            deadline_secs: AssemblyConfig::DEFAULT_DEADLINE.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub ipfs: String,
    pub swarm: String,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub request_timeout_secs: u64,
    pub max_content_length: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        let options = GatewayOptions::default();
        Self {
            ipfs: options.ipfs_gateway,
            swarm: options.swarm_gateway,
            max_retries: options.max_retries,
            retry_backoff_ms: options.retry_backoff.as_millis() as u64,
            request_timeout_secs: options.request_timeout.as_secs(),
            max_content_length: options.max_content_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directives, overridden by `RUST_LOG`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    pub const DEFAULT_FILE: &'static str = "mosaic.toml";
    pub const ENV_PREFIX: &'static str = "MOSAIC_";

    /// Layer defaults, the config file and the environment, in that order.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => bail!("config file {} does not exist", path.display()),
            Some(path) => Toml::file(path),
            None => Toml::file(Self::DEFAULT_FILE),
        };

        Figment::from(Serialized::defaults(Settings::default()))
            .merge(file)
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")
    }

    pub fn algorithm(&self) -> anyhow::Result<Algorithm> {
        parse_algorithm(&self.assembly.algorithm)
    }

    pub fn assembly_config(&self) -> anyhow::Result<AssemblyConfig> {
        Ok(AssemblyConfig::default()
            .algorithm(self.algorithm()?)
            .malformed_fragments(self.assembly.malformed_fragments)
            .deadline(deadline(self.assembly.deadline_secs)))
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        let gateway = &self.gateway;
        GatewayOptions::default()
            .ipfs_gateway(gateway.ipfs.as_str())
            .swarm_gateway(gateway.swarm.as_str())
            .max_retries(gateway.max_retries)
            .retry_backoff(Duration::from_millis(gateway.retry_backoff_ms))
            .request_timeout(Duration::from_secs(gateway.request_timeout_secs))
            .max_content_length(gateway.max_content_length)
    }
}

pub fn parse_algorithm(name: &str) -> anyhow::Result<Algorithm> {
    name.parse()
        .with_context(|| format!("unsupported digest algorithm '{name}'"))
}

/// Seconds to an optional deadline; 0 means none.
pub fn deadline(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
