//! Error types for the Carta runtime.

use std::fmt;

use carta_geo::ProjectionError;

use crate::config::ConfigError;
use crate::fetch::FetchError;

/// The main error type for Carta runtime operations.
#[derive(Debug)]
pub enum CoreError {
    /// Configuration-related error.
    Config(ConfigError),
    /// Document fetch error.
    Fetch(FetchError),
    /// Content-document edit error.
    Edit(EditError),
    /// Projection-related error.
    Projection(ProjectionError),
    /// The object identifier does not name a live object.
    InvalidObjectId,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "Configuration error: {err}"),
            Self::Fetch(err) => write!(f, "Fetch error: {err}"),
            Self::Edit(err) => write!(f, "Edit error: {err}"),
            Self::Projection(err) => write!(f, "Projection error: {err}"),
            Self::InvalidObjectId => {
                write!(f, "Invalid or removed object identifier")
            }
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Fetch(err) => Some(err),
            Self::Edit(err) => Some(err),
            Self::Projection(err) => Some(err),
            Self::InvalidObjectId => None,
        }
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<FetchError> for CoreError {
    fn from(err: FetchError) -> Self {
        Self::Fetch(err)
    }
}

impl From<EditError> for CoreError {
    fn from(err: EditError) -> Self {
        Self::Edit(err)
    }
}

impl From<ProjectionError> for CoreError {
    fn from(err: ProjectionError) -> Self {
        Self::Projection(err)
    }
}

/// Content-document edit errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The object is not a model.
    NotAModel(String),
    /// The model has no content document yet.
    NoContent(String),
    /// The model's content is an opaque image, not a structured document.
    NotStructured(String),
    /// The model has no viewport extent attached.
    NoViewport(String),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAModel(id) => write!(f, "Object '{id}' is not a model"),
            Self::NoContent(id) => {
                write!(f, "Model '{id}' has no content document loaded")
            }
            Self::NotStructured(id) => {
                write!(f, "Model '{id}' holds opaque image content")
            }
            Self::NoViewport(id) => {
                write!(f, "Model '{id}' has no viewport extent attached")
            }
        }
    }
}

impl std::error::Error for EditError {}

/// A specialized Result type for Carta runtime operations.
pub type Result<T> = std::result::Result<T, CoreError>;
