use secrecy::SecretString;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEVELOPMENT_JWT_SECRET: &str = "rentease-development-secret";

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

/// Top-level configuration for the marketplace service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            auth: AuthConfig::from_env(environment)?,
            storage: StorageConfig {
                settings_path: non_empty_var("RENTEASE_SETTINGS_PATH").map(PathBuf::from),
                seed_path: non_empty_var("RENTEASE_SEED_PATH").map(PathBuf::from),
            },
        })
    }
}

/// Modular crypt form: `$2a$`, `$2b$` or `$2y$`, then the cost and 53 characters.
fn looks_like_bcrypt(hash: &str) -> bool {
    hash.len() == 60
        && ["$2a$", "$2b$", "$2y$"]
            .iter()
            .any(|prefix| hash.starts_with(prefix))
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
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

/// Log filter and formatting controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Token signing and the bootstrap administrator account.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,
    pub token_ttl_hours: i64,
    pub admin_email: String,
    /// bcrypt hash of the administrator password (`$2b$10$...`).
    pub admin_password_hash: Option<String>,
}

impl AuthConfig {
    fn from_env(environment: AppEnvironment) -> Result<Self, ConfigError> {
        let jwt_secret = match non_empty_var("RENTEASE_JWT_SECRET") {
            Some(secret) => SecretString::from(secret),
            None if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingJwtSecret)
            }
            None => SecretString::from(DEVELOPMENT_JWT_SECRET.to_string()),
        };

        let token_ttl_hours = match non_empty_var("RENTEASE_TOKEN_TTL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or(ConfigError::InvalidTokenTtl)?,
            None => 24,
        };

        let admin_password_hash = non_empty_var("RENTEASE_ADMIN_PASSWORD_HASH");
        if let Some(hash) = &admin_password_hash {
            if !looks_like_bcrypt(hash) {
                return Err(ConfigError::InvalidAdminPasswordHash);
            }
        }

        Ok(Self {
            jwt_secret,
            token_ttl_hours,
            admin_email: non_empty_var("RENTEASE_ADMIN_EMAIL")
                .unwrap_or_else(|| "admin@example.com".to_string()),
            admin_password_hash,
        })
    }
}

/// Optional on-disk locations for settings and seed listings.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub settings_path: Option<PathBuf>,
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTokenTtl,
    InvalidAdminPasswordHash,
    MissingJwtSecret,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTokenTtl => {
                write!(f, "RENTEASE_TOKEN_TTL_HOURS must be a positive integer")
            }
            ConfigError::MissingJwtSecret => {
                write!(f, "RENTEASE_JWT_SECRET is required in production")
            }
            ConfigError::InvalidAdminPasswordHash => {
                write!(f, "RENTEASE_ADMIN_PASSWORD_HASH must be a bcrypt hash")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTokenTtl
            | ConfigError::InvalidAdminPasswordHash
            | ConfigError::MissingJwtSecret => None,
        }
    }
}
