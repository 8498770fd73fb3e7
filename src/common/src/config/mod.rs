use std::path::Path;
use std::time::Duration;
use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// Default Prometheus metric-name pattern used when a metric-name lookup
/// carries no `match[]` parameter.
pub const DEFAULT_METRIC_SELECTOR: &str = "(http|prometheus).*";

/// Result cap applied to the fallback metric-name lookup.
pub const DEFAULT_METRIC_SELECTOR_GCOUNT: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the Prometheus-compatible HTTP API binds to
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: String::from("0.0.0.0:9090"),
        }
    }
}

/// Connection settings for the Warp 10 backend
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the Warp 10 instance, without the `/api/v0` suffix
    pub endpoint: String,
    /// Upper bound for a single FIND request
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("http://127.0.0.1:8080"),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Cost-bounding policy for the discovery endpoints
///
/// The lookback bounds are kept as raw strings: they are parsed when the
/// discovery service is built so that a malformed value degrades to the
/// built-in defaults instead of failing configuration loading.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Metric-name regex queried when no `match[]` is supplied
    pub default_metric_selector: String,
    /// Maximum number of series returned for the fallback query
    pub default_result_cap: usize,
    /// Closest a `start` timestamp may be to now (e.g. `24h`)
    pub lookback_min: String,
    /// Furthest a `start` timestamp may reach into the past (e.g. `7d`)
    pub lookback_max: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            default_metric_selector: DEFAULT_METRIC_SELECTOR.to_string(),
            default_result_cap: DEFAULT_METRIC_SELECTOR_GCOUNT,
            lookback_min: String::from("24h"),
            lookback_max: String::from("7d"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Configuration {
    /// HTTP listener configuration
    pub server: ServerConfig,
    /// Warp 10 backend connection
    pub backend: BackendConfig,
    /// Discovery query policy
    pub discovery: DiscoveryConfig,
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error")
    }
}

impl Error for Configuration {}

impl Configuration {
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file("promwarp.toml"))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file(path))
    }

    fn figment(file: figment::providers::Data<Toml>) -> Result<Self, Box<figment::Error>> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(file)
            .merge(Env::prefixed("PROMWARP__").split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_configuration() {
        let config = Configuration::default();

        assert_eq!(config.server.listen_addr, "0.0.0.0:9090");
        assert_eq!(config.backend.endpoint, "http://127.0.0.1:8080");
        assert_eq!(config.backend.timeout, Duration::from_secs(30));
        assert_eq!(
            config.discovery.default_metric_selector,
            DEFAULT_METRIC_SELECTOR
        );
        assert_eq!(config.discovery.default_result_cap, 100);
        assert_eq!(config.discovery.lookback_min, "24h");
        assert_eq!(config.discovery.lookback_max, "7d");
    }

    #[test]
    fn test_configless_operation() {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .extract::<Configuration>()
            .unwrap();

        assert_eq!(config.discovery.default_result_cap, 100);
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "promwarp.toml",
                r#"
                [backend]
                endpoint = "http://warp10.internal:8080"
                timeout = "5s"

                [discovery]
                lookback_max = "3d"
                "#,
            )?;

            let config = Configuration::load().map_err(|e| e.to_string())?;
            assert_eq!(config.backend.endpoint, "http://warp10.internal:8080");
            assert_eq!(config.backend.timeout, Duration::from_secs(5));
            assert_eq!(config.discovery.lookback_max, "3d");
            // untouched keys keep their defaults
            assert_eq!(config.discovery.lookback_min, "24h");
            Ok(())
        });
    }

    #[test]
    fn test_env_var_override() {
        Jail::expect_with(|jail| {
            jail.set_env("PROMWARP__SERVER__LISTEN_ADDR", "127.0.0.1:19090");
            jail.set_env("PROMWARP__DISCOVERY__DEFAULT_RESULT_CAP", "25");

            let config = Configuration::load().map_err(|e| e.to_string())?;
            assert_eq!(config.server.listen_addr, "127.0.0.1:19090");
            assert_eq!(config.discovery.default_result_cap, 25);
            Ok(())
        });
    }

    #[test]
    fn test_malformed_lookback_is_kept_verbatim() {
        Jail::expect_with(|jail| {
            jail.set_env("PROMWARP__DISCOVERY__LOOKBACK_MIN", "not-a-duration");

            let config = Configuration::load().map_err(|e| e.to_string())?;
            assert_eq!(config.discovery.lookback_min, "not-a-duration");
            Ok(())
        });
    }
}
