use crate::config::ConfigError;
use crate::marketplace::{PropertyId, PropertyValidationError, SettingsError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Settings(SettingsError),
    Data {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidListing {
        path: PathBuf,
        id: PropertyId,
        source: PropertyValidationError,
    },
    DuplicateListing {
        path: PathBuf,
        id: PropertyId,
    },
}

impl AppError {
    pub fn data(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Data {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_listing(
        path: impl Into<PathBuf>,
        id: PropertyId,
        source: PropertyValidationError,
    ) -> Self {
        Self::InvalidListing {
            path: path.into(),
            id,
            source,
        }
    }

    pub fn duplicate_listing(path: impl Into<PathBuf>, id: PropertyId) -> Self {
        Self::DuplicateListing {
            path: path.into(),
            id,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Settings(err) => write!(f, "settings error: {}", err),
            AppError::Data { path, source } => {
                write!(f, "invalid data in {}: {}", path.display(), source)
            }
            AppError::InvalidListing { path, id, source } => {
                write!(f, "listing {} in {} is invalid: {}", id, path.display(), source)
            }
            AppError::DuplicateListing { path, id } => {
                write!(f, "listing {} appears more than once in {}", id, path.display())
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Settings(err) => Some(err),
            AppError::Data { source, .. } => Some(source),
            AppError::InvalidListing { source, .. } => Some(source),
            AppError::DuplicateListing { .. } => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Data { .. }
            | AppError::InvalidListing { .. }
            | AppError::DuplicateListing { .. }
            | AppError::Settings(SettingsError::InvalidSchedule { .. }) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Settings(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<SettingsError> for AppError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}
