use crate::scoring::{ClampPolicy, MatchFormula, ScoringConfig, DEFAULT_LOOKUP_VALUE};
use crate::sources::{SourcePaths, DEFAULT_EXPRESSION_FILE, DEFAULT_PREFERENCE_FILE};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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

    pub fn label(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "5000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let data = DataConfig {
            dir: PathBuf::from(var_or("ADSCORE_DATA_DIR", ".")),
            preference_file: var_or("ADSCORE_PREFERENCE_FILE", DEFAULT_PREFERENCE_FILE),
            expression_file: var_or("ADSCORE_EXPRESSION_FILE", DEFAULT_EXPRESSION_FILE),
        };

        let formula_raw = var_or("ADSCORE_MATCH_FORMULA", MatchFormula::default().label());
        let formula = formula_raw
            .parse::<MatchFormula>()
            .map_err(|_| ConfigError::InvalidFormula { value: formula_raw })?;

        let default_raw = var_or("ADSCORE_DEFAULT_VALUE", &DEFAULT_LOOKUP_VALUE.to_string());
        let default_value = default_raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or(ConfigError::InvalidDefaultValue { value: default_raw })?;

        let clamp_raw = var_or("ADSCORE_CLAMP", ClampPolicy::default().label());
        let clamp = clamp_raw
            .parse::<ClampPolicy>()
            .map_err(|_| ConfigError::InvalidClamp { value: clamp_raw })?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data,
            scoring: ScoringConfig {
                formula,
                default_value,
                clamp,
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
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
}

/// Where the population and content tables live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub preference_file: String,
    pub expression_file: String,
}

impl DataConfig {
    pub fn source_paths(&self) -> SourcePaths {
        SourcePaths::new(
            self.dir.join(&self.preference_file),
            self.dir.join(&self.expression_file),
        )
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFormula { value: String },
    InvalidDefaultValue { value: String },
    InvalidClamp { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFormula { value } => write!(
                f,
                "ADSCORE_MATCH_FORMULA must be expression, preference or blended (got '{value}')"
            ),
            ConfigError::InvalidDefaultValue { value } => write!(
                f,
                "ADSCORE_DEFAULT_VALUE must be a finite number (got '{value}')"
            ),
            ConfigError::InvalidClamp { value } => {
                write!(f, "ADSCORE_CLAMP must be none or unit (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFormula { .. }
            | ConfigError::InvalidDefaultValue { .. }
            | ConfigError::InvalidClamp { .. } => None,
        }
    }
}
