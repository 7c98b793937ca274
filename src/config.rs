//! Runtime configuration from the environment.
//!
//! A `.env` file in the working directory is loaded first when present, so
//! API keys can live outside the shell profile. Empty values count as unset.

use crate::capture::{OutputFormat, OutputSettings};

pub const DEFAULT_BASE_URL: &str = "https://api.ilovepdf.com";
pub const DEFAULT_TOOL: &str = "compressimage";
pub const DEFAULT_SERVER_SCHEME: &str = "https";

/// Everything the compression workflow needs to reach the service.
#[derive(Clone)]
pub struct CompressionConfig {
    pub public_key: Option<String>,
    /// Reserved; the workflow only signs in with the public key.
    pub secret_key: Option<String>,
    pub base_url: String,
    pub auth_url: String,
    pub tool: String,
    /// Prefixed to assigned work-server hosts that carry no scheme.
    pub server_scheme: String,
}

impl CompressionConfig {
    pub fn new(public_key: Option<String>, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            public_key,
            secret_key: None,
            auth_url: format!("{}/v1/auth", base_url),
            base_url,
            tool: DEFAULT_TOOL.to_string(),
            server_scheme: DEFAULT_SERVER_SCHEME.to_string(),
        }
    }

    /// Absolute URL on an assigned work server.
    pub fn server_url(&self, server: &str, path: &str) -> String {
        let server = server.trim_end_matches('/');
        if server.contains("://") {
            format!("{}{}", server, path)
        } else {
            format!("{}://{}{}", self.server_scheme, server, path)
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::new(None, DEFAULT_BASE_URL)
    }
}

impl std::fmt::Debug for CompressionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("CompressionConfig")
            .field("public_key", &redact(&self.public_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("base_url", &self.base_url)
            .field("auth_url", &self.auth_url)
            .field("tool", &self.tool)
            .field("server_scheme", &self.server_scheme)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub compression: CompressionConfig,
    pub output: OutputSettings,
}

impl Config {
    /// Loads `.env` (if any) and reads `SNIP_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::info!("[CONFIG] Loaded {}", path.display());
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = get("SNIP_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut compression = CompressionConfig::new(get("SNIP_PUBLIC_KEY"), &base_url);
        compression.secret_key = get("SNIP_SECRET_KEY");
        if let Some(auth_url) = get("SNIP_AUTH_URL") {
            compression.auth_url = auth_url;
        }
        if let Some(tool) = get("SNIP_TOOL") {
            compression.tool = tool;
        }
        if let Some(scheme) = get("SNIP_SERVER_SCHEME") {
            compression.server_scheme = scheme;
        }

        let defaults = OutputSettings::default();
        let output = OutputSettings {
            width: parse_dimension("SNIP_TARGET_WIDTH", get("SNIP_TARGET_WIDTH"), defaults.width)?,
            height: parse_dimension("SNIP_TARGET_HEIGHT", get("SNIP_TARGET_HEIGHT"), defaults.height)?,
            quality: parse_quality(get("SNIP_QUALITY"), defaults.quality)?,
            format: match get("SNIP_FORMAT") {
                Some(value) => OutputFormat::from_mime(&value).ok_or_else(|| ConfigError::Invalid {
                    var: "SNIP_FORMAT",
                    reason: "expected image/jpeg or image/png".to_string(),
                    value,
                })?,
                None => defaults.format,
            },
        };

        Ok(Self { compression, output })
    }
}

fn parse_dimension(var: &'static str, value: Option<String>, default: u32) -> Result<u32, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err(ConfigError::Invalid {
            var,
            value,
            reason: "must be positive".to_string(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}

fn parse_quality(value: Option<String>, default: f32) -> Result<f32, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.parse::<f32>() {
        Ok(q) if (0.0..=1.0).contains(&q) => Ok(q),
        Ok(_) => Err(ConfigError::Invalid {
            var: "SNIP_QUALITY",
            value,
            reason: "must be between 0.0 and 1.0".to_string(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            var: "SNIP_QUALITY",
            value,
            reason: e.to_string(),
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert!(config.compression.public_key.is_none());
        assert_eq!(config.compression.base_url, "https://api.ilovepdf.com");
        assert_eq!(config.compression.auth_url, "https://api.ilovepdf.com/v1/auth");
        assert_eq!(config.compression.tool, "compressimage");
        assert_eq!(config.output, OutputSettings::default());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("SNIP_PUBLIC_KEY", "project_public_abc"),
            ("SNIP_API_BASE_URL", "https://example.test/"),
            ("SNIP_TARGET_WIDTH", "1280"),
            ("SNIP_TARGET_HEIGHT", "720"),
            ("SNIP_QUALITY", "0.75"),
            ("SNIP_FORMAT", "image/png"),
        ])
        .unwrap();
        assert_eq!(config.compression.public_key.as_deref(), Some("project_public_abc"));
        assert_eq!(config.compression.auth_url, "https://example.test/v1/auth");
        assert_eq!((config.output.width, config.output.height), (1280, 720));
        assert_eq!(config.output.quality, 0.75);
        assert_eq!(config.output.format, OutputFormat::Png);
    }

    #[test]
    fn explicit_auth_url_wins() {
        let config = config_from(&[("SNIP_AUTH_URL", "https://auth.example.test/token")]).unwrap();
        assert_eq!(config.compression.auth_url, "https://auth.example.test/token");
    }

    #[test]
    fn blank_key_counts_as_unset() {
        let config = config_from(&[("SNIP_PUBLIC_KEY", "   ")]).unwrap();
        assert!(config.compression.public_key.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config_from(&[("SNIP_TARGET_WIDTH", "wide")]),
            Err(ConfigError::Invalid { var: "SNIP_TARGET_WIDTH", .. })
        ));
        assert!(matches!(
            config_from(&[("SNIP_TARGET_HEIGHT", "0")]),
            Err(ConfigError::Invalid { var: "SNIP_TARGET_HEIGHT", .. })
        ));
        assert!(matches!(
            config_from(&[("SNIP_QUALITY", "1.5")]),
            Err(ConfigError::Invalid { var: "SNIP_QUALITY", .. })
        ));
        assert!(matches!(
            config_from(&[("SNIP_FORMAT", "image/gif")]),
            Err(ConfigError::Invalid { var: "SNIP_FORMAT", .. })
        ));
    }

    #[test]
    fn server_url_adds_scheme_only_when_missing() {
        let config = CompressionConfig::default();
        assert_eq!(
            config.server_url("api8g.ilovepdf.com", "/v1/upload"),
            "https://api8g.ilovepdf.com/v1/upload"
        );
        assert_eq!(
            config.server_url("http://127.0.0.1:9000/", "/v1/upload"),
            "http://127.0.0.1:9000/v1/upload"
        );
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = CompressionConfig::new(Some("secret-public".to_string()), DEFAULT_BASE_URL);
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-public"));
        assert!(rendered.contains("<redacted>"));
    }
}
