//! Error handling for the student performance predictor
//!
//! A single error enum covers the serving path (feature mismatch and model
//! inference failures) plus the hosting concerns around it: artifact loading,
//! configuration, input validation and history persistence.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Main error type for the predictor
#[derive(Error, Debug)]
pub enum PredictError {
    /// Projected row width disagrees with what the scaler was fitted on.
    #[error("Feature mismatch: scaler expects {expected} features, schema provides {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    /// Classifier rejected the scaled row or answered outside its contract.
    #[error("Model inference failed: {message}")]
    ModelInference { message: String },

    #[error("Could not load artifact `{artifact}`: {message}")]
    Artifact { artifact: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database operation failed: {operation} - {source}")]
    Database {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Resource not found: {resource} - {id}")]
    NotFound { resource: String, id: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Result with PredictError
pub type PredictResult<T> = Result<T, PredictError>;

impl PredictError {
    /// Create a feature mismatch error
    pub fn feature_mismatch(expected: usize, actual: usize) -> Self {
        Self::FeatureMismatch { expected, actual }
    }

    /// Create a model inference error
    pub fn model_inference(message: impl Into<String>) -> Self {
        Self::ModelInference {
            message: message.into(),
        }
    }

    /// Create an artifact loading error
    pub fn artifact(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Artifact {
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create a database error
    pub fn database(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Database {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Display of this error followed by every source, joined with ": ".
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            // Some variants already print their source inline.
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = std::error::Error::source(cause);
        }
        message
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = match self {
            PredictError::Validation { .. } => StatusCode::BAD_REQUEST,
            PredictError::NotFound { .. } => StatusCode::NOT_FOUND,
            PredictError::FeatureMismatch { .. }
            | PredictError::ModelInference { .. }
            | PredictError::Artifact { .. }
            | PredictError::Config { .. }
            | PredictError::Io { .. }
            | PredictError::Serialization { .. }
            | PredictError::Database { .. }
            | PredictError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = axum::Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Convert from sled errors
impl From<sled::Error> for PredictError {
    fn from(err: sled::Error) -> Self {
        PredictError::database("sled_operation", err)
    }
}

/// Convert from figment errors
impl From<figment::Error> for PredictError {
    fn from(err: figment::Error) -> Self {
        PredictError::config(err.to_string())
    }
}

/// Convert from blocking task join errors
impl From<tokio::task::JoinError> for PredictError {
    fn from(err: tokio::task::JoinError) -> Self {
        PredictError::internal(format!("blocking task failed: {err}"))
    }
}
