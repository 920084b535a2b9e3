//! Configuration for the Aiwen IP lookup server.
//!
//! Configuration is read once at startup, either from the environment or from
//! a YAML file, validated, and then shared read-only behind an `Arc`.

use crate::address::AddressFamily;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment variable holding the provider API key.
pub const API_KEY_VAR: &str = "AIWEN_API_KEY";
/// Environment variable selecting the IPv4 location accuracy.
pub const IPV4_ACCURACY_VAR: &str = "AIWEN_IPV4_ACCURACY";
/// Environment variable selecting the IPv6 location accuracy.
pub const IPV6_ACCURACY_VAR: &str = "AIWEN_IPV6_ACCURACY";

/// Root configuration.
#[derive(Clone, Deserialize, Serialize)]
pub struct Config {
    /// Provider API key (supports ${ENV_VAR} syntax in files).
    pub api_key: String,

    /// Location accuracy per address family.
    #[serde(default)]
    pub accuracy: AccuracyConfig,

    /// Upstream endpoints and timeouts.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("accuracy", &self.accuracy)
            .field("upstream", &self.upstream)
            .finish()
    }
}

/// Requested precision of a location lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", rename_all = "lowercase")]
pub enum AccuracyTier {
    #[default]
    City,
    District,
    Street,
}

impl AccuracyTier {
    pub const ALL: [AccuracyTier; 3] = [
        AccuracyTier::City,
        AccuracyTier::District,
        AccuracyTier::Street,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccuracyTier::City => "city",
            AccuracyTier::District => "district",
            AccuracyTier::Street => "street",
        }
    }
}

impl fmt::Display for AccuracyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccuracyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        AccuracyTier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                format!(
                    "invalid accuracy '{}' (expected one of: city, district, street)",
                    value
                )
            })
    }
}

/// Blank values select the default tier, in files and variables alike.
impl TryFrom<String> for AccuracyTier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Ok(AccuracyTier::default());
        }
        value.parse()
    }
}

/// Per-family accuracy tiers.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AccuracyConfig {
    #[serde(default)]
    pub ipv4: AccuracyTier,

    #[serde(default)]
    pub ipv6: AccuracyTier,
}

/// Upstream provider settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Base URL of the IP intelligence API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// URL returning the caller's own address in a `data` field.
    #[serde(default = "default_self_ip_url")]
    pub self_ip_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            self_ip_url: default_self_ip_url(),
            timeout_ms: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.ipplus360.com".to_string()
}

fn default_self_ip_url() -> String {
    "https://www.ipuu.net/ipuu/user/getIP".to_string()
}

fn default_timeout() -> u64 {
    10_000
}

impl Config {
    /// Configuration with the given key and every other field defaulted.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            accuracy: AccuracyConfig::default(),
            upstream: UpstreamConfig::default(),
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow::anyhow!("{} environment variable is not set", API_KEY_VAR))?;

        let config = Config {
            api_key,
            accuracy: AccuracyConfig {
                ipv4: tier_from_var(&lookup, IPV4_ACCURACY_VAR)?,
                ipv6: tier_from_var(&lookup, IPV6_ACCURACY_VAR)?,
            },
            upstream: UpstreamConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse YAML, expanding ${VAR} references first.
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("api_key is empty (set {})", API_KEY_VAR);
        }

        if self.upstream.timeout_ms == 0 {
            anyhow::bail!("upstream.timeout_ms must be greater than zero");
        }

        for (field, url) in [
            ("upstream.base_url", &self.upstream.base_url),
            ("upstream.self_ip_url", &self.upstream.self_ip_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("{} must be an http(s) URL: {}", field, url);
            }
        }

        Ok(())
    }

    /// Location accuracy configured for an address family.
    pub fn tier_for(&self, family: AddressFamily) -> AccuracyTier {
        match family {
            AddressFamily::IPv4 => self.accuracy.ipv4,
            AddressFamily::IPv6 => self.accuracy.ipv6,
        }
    }

    /// Generate example configuration YAML.
    pub fn example() -> String {
        r#"# Aiwen IP MCP server configuration

# Provider API key
api_key: "${AIWEN_API_KEY}"

# Location accuracy per address family: city, district or street
accuracy:
  ipv4: city
  ipv6: city

# Upstream endpoints (defaults shown)
upstream:
  base_url: "https://api.ipplus360.com"
  self_ip_url: "https://www.ipuu.net/ipuu/user/getIP"
  timeout_ms: 10000
"#
        .to_string()
    }
}

fn tier_from_var<F>(lookup: &F, name: &str) -> anyhow::Result<AccuracyTier>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => {
            AccuracyTier::try_from(value).map_err(|e| anyhow::anyhow!("{}: {}", name, e))
        }
        None => Ok(AccuracyTier::default()),
    }
}

/// Expand environment variables in the format ${VAR_NAME}.
fn expand_env_vars(content: &str) -> anyhow::Result<String> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")?;
    let expanded = re.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_default()
    });
    Ok(expanded.into_owned())
}
