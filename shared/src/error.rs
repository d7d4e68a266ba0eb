//! Error types for the shared crate
//!
//! Standardized error types used across the marketplace core. The HTTP
//! layer maps these onto response codes; the core only deals in kinds.

use thiserror::Error;

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketErrorKind {
    /// Bad or missing references, illegal transition, invalid amounts (400)
    Validation,
    /// Actor lacks permission for the mutation or query scope (403)
    Authorization,
    /// Unknown order / user / seller / catalog item (404)
    NotFound,
    /// Storage collaborator failure (500)
    Storage,
}

impl MarketErrorKind {
    /// HTTP-equivalent status class for this kind
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Authorization => 403,
            Self::NotFound => 404,
            Self::Storage => 500,
        }
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "E0002",
            Self::Authorization => "E2001",
            Self::NotFound => "E0003",
            Self::Storage => "E9002",
        }
    }
}

impl std::fmt::Display for MarketErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Unified error type for the marketplace core
#[derive(Debug, Error)]
pub enum MarketError {
    /// Validation error
    #[error("{message}")]
    Validation { message: String },

    /// Permission denied
    #[error("Permission denied: {message}")]
    Authorization { message: String },

    /// Resource not found
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Storage error
    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl MarketError {
    // ========== Convenient constructors ==========

    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Create an Authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization { message: message.into() }
    }

    /// Create a NotFound error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage { message: message.into() }
    }

    // ========== Error inspection methods ==========

    /// Get the kind for this error
    pub fn kind(&self) -> MarketErrorKind {
        match self {
            Self::Validation { .. } => MarketErrorKind::Validation,
            Self::Authorization { .. } => MarketErrorKind::Authorization,
            Self::NotFound { .. } => MarketErrorKind::NotFound,
            Self::Storage { .. } => MarketErrorKind::Storage,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message } => message.clone(),
            Self::Authorization { message } => message.clone(),
            Self::NotFound { resource } => format!("{} not found", resource),
            Self::Storage { message } => message.clone(),
        }
    }
}

/// Result type for marketplace operations
pub type MarketResult<T> = Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(MarketError::validation("x").kind(), MarketErrorKind::Validation);
        assert_eq!(MarketError::authorization("x").kind(), MarketErrorKind::Authorization);
        assert_eq!(MarketError::not_found("Order").kind(), MarketErrorKind::NotFound);
        assert_eq!(MarketError::storage("x").kind(), MarketErrorKind::Storage);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(MarketErrorKind::Validation.status_code(), 400);
        assert_eq!(MarketErrorKind::Authorization.status_code(), 403);
        assert_eq!(MarketErrorKind::NotFound.status_code(), 404);
        assert_eq!(MarketErrorKind::Storage.status_code(), 500);
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(MarketError::not_found("Order").message(), "Order not found");
    }
}
