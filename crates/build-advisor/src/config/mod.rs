use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::builds::{OptimizerConfig, PriceTierBoundaries};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub catalog: CatalogConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let csv_path = env::var("CATALOG_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            catalog: CatalogConfig { csv_path },
            optimizer: load_optimizer()?,
        })
    }
}

fn load_optimizer() -> Result<OptimizerConfig, ConfigError> {
    let defaults = OptimizerConfig::default();
    let tiers = PriceTierBoundaries {
        budget_below: parse_var(
            "OPTIMIZER_TIER_BUDGET_BELOW",
            defaults.price_tiers.budget_below,
        )?,
        mid_range_below: parse_var(
            "OPTIMIZER_TIER_MID_RANGE_BELOW",
            defaults.price_tiers.mid_range_below,
        )?,
        high_end_below: parse_var(
            "OPTIMIZER_TIER_HIGH_END_BELOW",
            defaults.price_tiers.high_end_below,
        )?,
    };
    let ordered = tiers.budget_below < tiers.mid_range_below
        && tiers.mid_range_below < tiers.high_end_below;
    if !ordered {
        return Err(ConfigError::UnorderedPriceTiers);
    }

    let diversity_factor = parse_var("OPTIMIZER_DIVERSITY_FACTOR", defaults.diversity_factor)?;
    if !(0.0..=1.0).contains(&diversity_factor) {
        return Err(ConfigError::InvalidNumber {
            key: "OPTIMIZER_DIVERSITY_FACTOR",
            value: diversity_factor.to_string(),
        });
    }

    let timeout_ms = parse_var(
        "OPTIMIZER_EXPLANATION_TIMEOUT_MS",
        defaults.explanation_timeout.as_millis() as u64,
    )?;

    Ok(OptimizerConfig {
        shortlist_size: parse_var("OPTIMIZER_SHORTLIST_SIZE", defaults.shortlist_size)?,
        pool_size: parse_var("OPTIMIZER_POOL_SIZE", defaults.pool_size)?,
        diversity_factor,
        explanation_timeout: Duration::from_millis(timeout_ms),
        price_tiers: tiers,
    })
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidNumber { key, value: raw })
        }
        _ => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Colored output, enabled only for local development.
    pub ansi: bool,
}

/// Where the component catalog is loaded from. `None` uses the bundled sample.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub csv_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    UnorderedPriceTiers,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} has an invalid value: {value:?}")
            }
            ConfigError::UnorderedPriceTiers => write!(
                f,
                "price tier boundaries must increase from budget to high-end"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "CATALOG_CSV",
            "OPTIMIZER_SHORTLIST_SIZE",
            "OPTIMIZER_POOL_SIZE",
            "OPTIMIZER_DIVERSITY_FACTOR",
            "OPTIMIZER_EXPLANATION_TIMEOUT_MS",
            "OPTIMIZER_TIER_BUDGET_BELOW",
            "OPTIMIZER_TIER_MID_RANGE_BELOW",
            "OPTIMIZER_TIER_HIGH_END_BELOW",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.catalog.csv_path.is_none());
        assert_eq!(config.optimizer, OptimizerConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn optimizer_settings_come_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("OPTIMIZER_SHORTLIST_SIZE", "3");
        env::set_var("OPTIMIZER_DIVERSITY_FACTOR", "0.5");
        env::set_var("OPTIMIZER_EXPLANATION_TIMEOUT_MS", "250");
        env::set_var("OPTIMIZER_TIER_BUDGET_BELOW", "100");
        env::set_var("CATALOG_CSV", "data/parts.csv");

        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.optimizer.shortlist_size, 3);
        assert_eq!(config.optimizer.pool_size, 20);
        assert_eq!(config.optimizer.diversity_factor, 0.5);
        assert_eq!(config.optimizer.explanation_timeout, Duration::from_millis(250));
        assert_eq!(config.optimizer.price_tiers.budget_below, 100.0);
        assert_eq!(
            config.catalog.csv_path,
            Some(PathBuf::from("data/parts.csv"))
        );
    }

    #[test]
    fn malformed_number_names_the_variable() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("OPTIMIZER_POOL_SIZE", "lots");

        let err = AppConfig::load().expect_err("pool size must be numeric");
        reset_env();

        assert!(err.to_string().contains("OPTIMIZER_POOL_SIZE"));
    }

    #[test]
    fn out_of_range_diversity_factor_is_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("OPTIMIZER_DIVERSITY_FACTOR", "1.5");

        let result = AppConfig::load();
        reset_env();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber {
                key: "OPTIMIZER_DIVERSITY_FACTOR",
                ..
            })
        ));
    }

    #[test]
    fn price_tiers_must_increase() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("OPTIMIZER_TIER_MID_RANGE_BELOW", "500");

        let result = AppConfig::load();
        reset_env();

        assert!(matches!(result, Err(ConfigError::UnorderedPriceTiers)));
    }
}
