//! Error handling for the pharmacy stock service
//!
//! Provides consistent error responses in French and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        message_fr: String,
    },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // External store errors
    #[error("Stock store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Stock load superseded by a newer load")]
    LoadSuperseded,

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the client should offer a retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::StoreUnavailable(_) | AppError::LoadSuperseded | AppError::DatabaseError(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation {
            field: errors.field_errors().keys().next().map(|f| f.to_string()),
            message: errors.to_string(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_fr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = self.is_retryable();
        let field = match &self {
            AppError::Validation { field, .. } => field.clone(),
            _ => None,
        };
        let (status, code, message_en, message_fr) = match &self {
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid token".to_string(),
                "Jeton invalide".to_string(),
            ),
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "INSUFFICIENT_PERMISSIONS",
                "You do not have permission to perform this action".to_string(),
                "Vous n'avez pas les droits pour effectuer cette action".to_string(),
            ),
            AppError::Unauthorized { message, message_fr } => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                message.clone(),
                message_fr.clone(),
            ),
            AppError::Validation { message, .. } => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                message.clone(),
                format!("Données invalides : {}", message),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{} not found", resource),
                format!("{} introuvable", resource),
            ),
            AppError::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                "Stock data could not be loaded. Please retry.".to_string(),
                "Impossible de charger les données de stock. Veuillez réessayer.".to_string(),
            ),
            AppError::LoadSuperseded => (
                StatusCode::CONFLICT,
                "LOAD_SUPERSEDED",
                "A newer stock load replaced this one".to_string(),
                "Un chargement plus récent a remplacé celui-ci".to_string(),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                format!("Configuration error: {}", msg),
                format!("Erreur de configuration : {}", msg),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
                "Une erreur de base de données est survenue".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred".to_string(),
                "Erreur interne du serveur".to_string(),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message_en,
                message_fr,
                field,
                retryable,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
