use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::simulation::format::DEFAULT_SIGNATURE;
use crate::simulation::ProjectionConfig;

const DEFAULT_DATABASE_PATH: &str = "database/simulations.db";
const DEFAULT_SITE_URL: &str = "http://localhost:3000";

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
    pub storage: StorageConfig,
    pub projection: ProjectionConfig,
    pub messaging: MessagingConfig,
    /// CSV of region overrides applied on top of the standard rate table.
    pub rate_table_path: Option<PathBuf>,
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

        let storage = StorageConfig::from_env()?;
        let projection = projection_from_env()?;

        let messaging = MessagingConfig {
            site_url: non_empty_var("APP_SITE_URL")
                .unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            signature: non_empty_var("APP_MESSAGE_SIGNATURE")
                .unwrap_or_else(|| DEFAULT_SIGNATURE.to_string()),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage,
            projection,
            messaging,
            rate_table_path: non_empty_var("APP_RATE_TABLE").map(PathBuf::from),
        })
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where simulation results are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    Sqlite { path: PathBuf },
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend = env::var("APP_STORE").unwrap_or_else(|_| "memory".to_string());
        match backend.trim().to_ascii_lowercase().as_str() {
            "" | "memory" => Ok(Self::Memory),
            "sqlite" => {
                let path = non_empty_var("APP_DATABASE_PATH")
                    .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
                Ok(Self::Sqlite {
                    path: PathBuf::from(path),
                })
            }
            _ => Err(ConfigError::InvalidStore { value: backend }),
        }
    }
}

/// Text used in chat replies.
#[derive(Debug, Clone)]
pub struct MessagingConfig {
    pub site_url: String,
    pub signature: String,
}

fn projection_from_env() -> Result<ProjectionConfig, ConfigError> {
    let capacity_step = non_empty_var("APP_CAPACITY_STEP")
        .map(|raw| parse_percentage_like("APP_CAPACITY_STEP", &raw))
        .transpose()?;

    let expense_percent = match non_empty_var("APP_EXPENSE_PERCENT") {
        Some(raw) => parse_percentage_like("APP_EXPENSE_PERCENT", &raw)?,
        None => 0.0,
    };
    if expense_percent > 100.0 {
        return Err(ConfigError::InvalidNumber {
            variable: "APP_EXPENSE_PERCENT",
            value: expense_percent.to_string(),
        });
    }

    let include_cleaning = match non_empty_var("APP_CLEANING_COSTS") {
        Some(raw) => parse_flag("APP_CLEANING_COSTS", &raw)?,
        None => false,
    };

    Ok(ProjectionConfig {
        capacity_step,
        expense_percent,
        include_cleaning,
    })
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_percentage_like(variable: &'static str, raw: &str) -> Result<f64, ConfigError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber {
            variable,
            value: raw.to_string(),
        }),
    }
}

fn parse_flag(variable: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            variable,
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidStore {
        value: String,
    },
    InvalidNumber {
        variable: &'static str,
        value: String,
    },
    InvalidFlag {
        variable: &'static str,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidStore { value } => {
                write!(f, "APP_STORE must be `memory` or `sqlite`, got '{value}'")
            }
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{variable} must be a non-negative number, got '{value}'")
            }
            ConfigError::InvalidFlag { variable, value } => {
                write!(f, "{variable} must be true or false, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidStore { .. }
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
