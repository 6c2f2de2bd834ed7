use anyhow::{Context, Result};
use serde::Deserialize;

use crate::handler::upstream;

const fn _default_port() -> u16 {
    3000
}
const fn _default_metrics_port() -> u16 {
    3001
}
fn _default_upstream_referer() -> String {
    upstream::DEFAULT_REFERER.to_string()
}

/// Process configuration: an optional TOML file, overridden by the
/// `PORT`, `ALLOWED_HOSTS` and `UPSTREAM_REFERER` environment variables.
/// Built once at startup and never mutated afterwards.
#[derive(Deserialize, Clone, Debug)]
pub(crate) struct ProxyConfig {
    #[serde(default = "_default_port")]
    pub(crate) port: u16,
    #[serde(default = "_default_metrics_port")]
    pub(crate) metrics_port: u16,
    #[serde(default)]
    pub(crate) allowed_hosts: Vec<String>,
    #[serde(default = "_default_upstream_referer")]
    pub(crate) upstream_referer: String,
}

impl ProxyConfig {
    pub(crate) fn load(path: &str) -> Result<Self> {
        let mut config: ProxyConfig = match std::fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw)
                .with_context(|| format!("Couldn't parse config file {path}"))?,
            // A missing config file means all defaults; anything else is fatal.
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                toml::from_str("")?
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("Couldn't read config file {path}"))
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(
            std::env::var("PORT").ok(),
            std::env::var("ALLOWED_HOSTS").ok(),
            std::env::var("UPSTREAM_REFERER").ok(),
        )
    }

    fn apply_overrides(
        &mut self,
        port: Option<String>,
        hosts: Option<String>,
        referer: Option<String>,
    ) -> Result<()> {
        if let Some(port) = port {
            self.port = port
                .parse()
                .with_context(|| format!("Invalid PORT value \"{port}\""))?;
        }
        if let Some(hosts) = hosts {
            self.allowed_hosts.extend(split_hosts(&hosts));
        }
        if let Some(referer) = referer {
            self.upstream_referer = referer;
        }
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.upstream_referer).with_context(|| {
            format!(
                "upstream_referer \"{}\" is not an absolute URL",
                self.upstream_referer
            )
        })?;
        Ok(())
    }
}

/// Splits a comma-separated hostname list, dropping empty entries.
pub(crate) fn split_hosts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}
