use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::state::DEFAULT_MAX_PENDING_CHALLENGES;
use crate::primitives::parameters::MIN_GENERATED_BITS;
use crate::{GroupParameters, Result as CrateResult, SecureRng};

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Hostname or IP address to bind to.
    pub host: String,
    /// Port number to listen on.
    pub port: u16,
    /// Group parameter selection.
    pub group: GroupSettings,
    /// Challenge session lifetime.
    pub sessions: SessionSettings,
    /// Metrics exporter configuration.
    pub metrics: MetricsSettings,
}

impl ServerConfig {
    /// Converts host and port into a socket address.
    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Source of the group parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupPreset {
    /// RFC 5114 2048-bit group with a 256-bit subgroup.
    Rfc5114,
    /// Fixed 255-bit safe-prime group.
    #[serde(rename = "safe-prime-256")]
    SafePrime256,
    /// Freshly generated at startup.
    Generate,
    /// Decimal constants from the configuration.
    Custom,
}

/// Group parameter settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSettings {
    pub preset: GroupPreset,
    /// Modulus width for [`GroupPreset::Generate`].
    pub bits: u64,
    pub p: Option<String>,
    pub q: Option<String>,
    pub g: Option<String>,
    pub h: Option<String>,
}

impl GroupSettings {
    /// Builds and validates the configured parameters.
    pub fn build_parameters(&self) -> CrateResult<GroupParameters> {
        match self.preset {
            GroupPreset::Rfc5114 => GroupParameters::rfc5114(),
            GroupPreset::SafePrime256 => GroupParameters::safe_prime_256(),
            GroupPreset::Generate => GroupParameters::generate(self.bits, &mut SecureRng::new()),
            GroupPreset::Custom => GroupParameters::from_decimal(
                self.p.as_deref().unwrap_or_default(),
                self.q.as_deref().unwrap_or_default(),
                self.g.as_deref().unwrap_or_default(),
                self.h.as_deref().unwrap_or_default(),
            ),
        }
    }
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            preset: GroupPreset::Rfc5114,
            bits: 256,
            p: None,
            q: None,
            g: None,
            h: None,
        }
    }
}

/// Challenge session settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Seconds before an unanswered challenge expires.
    pub ttl_secs: u64,
    /// Seconds between expired-session sweeps.
    pub cleanup_interval_secs: u64,
    /// Maximum number of challenges awaiting a response.
    pub max_pending: usize,
}

impl SessionSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            cleanup_interval_secs: 60,
            max_pending: DEFAULT_MAX_PENDING_CHALLENGES,
        }
    }
}

/// Metrics exporter settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Whether metrics export is enabled.
    pub enabled: bool,
    /// Hostname or IP address for metrics server.
    pub host: String,
    /// Port number for metrics server.
    pub port: u16,
}

impl MetricsSettings {
    /// Converts host and port into a socket address for metrics server.
    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: 9090,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
            group: GroupSettings::default(),
            sessions: SessionSettings::default(),
            metrics: MetricsSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from `.env` file, TOML file, and environment variables.
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables with `SERVER_` prefix, `__` between nested keys
    /// 2. TOML configuration file (if exists)
    /// 3. `.env` file (if exists)
    /// 4. Built-in defaults
    ///
    /// The TOML file path can be set via `SERVER_CONFIG_PATH`; it defaults to
    /// `./config/server.toml` and is skipped if missing.
    ///
    /// # Environment Variable Examples
    /// ```bash
    /// SERVER_HOST=0.0.0.0
    /// SERVER_PORT=8080
    /// SERVER_GROUP__PRESET=generate
    /// SERVER_GROUP__BITS=512
    /// SERVER_SESSIONS__TTL_SECS=120
    /// SERVER_SESSIONS__MAX_PENDING=10000
    /// SERVER_METRICS__ENABLED=true
    /// ```
    ///
    /// # Errors
    /// Returns an error if the configuration is malformed or contains invalid values.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> figment::error::Result<Self> {
        use figment::providers::{Env, Format, Toml};
        use figment::Figment;

        // Attempt to load .env file (silently ignore if it doesn't exist)
        let _ = dotenvy::dotenv();

        let config_path = std::env::var("SERVER_CONFIG_PATH")
            .unwrap_or_else(|_| "config/server.toml".to_string());

        Figment::new()
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("SERVER_").ignore(&["CONFIG_PATH"]).split("__"))
            .extract()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error message naming the first unusable value.
    pub fn validate(&self) -> Result<(), String> {
        self.addr()
            .map_err(|e| format!("Invalid server address {}:{}: {e}", self.host, self.port))?;

        if self.metrics.enabled {
            self.metrics.addr().map_err(|e| {
                format!(
                    "Invalid metrics address {}:{}: {e}",
                    self.metrics.host, self.metrics.port
                )
            })?;
        }

        match self.group.preset {
            GroupPreset::Generate if self.group.bits < MIN_GENERATED_BITS => {
                return Err(format!(
                    "Group bits must be at least {MIN_GENERATED_BITS}, got {}",
                    self.group.bits
                ));
            }
            GroupPreset::Custom => {
                let group = &self.group;
                let constants = [("p", &group.p), ("q", &group.q), ("g", &group.g), ("h", &group.h)];
                for (name, value) in constants {
                    if value.is_none() {
                        return Err(format!("Custom group is missing '{name}'"));
                    }
                }
            }
            _ => {}
        }

        if self.sessions.ttl_secs == 0 {
            return Err("Session ttl_secs cannot be zero".to_string());
        }

        if self.sessions.cleanup_interval_secs == 0 {
            return Err("Session cleanup_interval_secs cannot be zero".to_string());
        }

        if self.sessions.max_pending == 0 {
            return Err("Session max_pending cannot be zero".to_string());
        }

        Ok(())
    }
}
