//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Unknown payment provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid Stripe API key format")]
    InvalidStripeKey,

    #[error("Invalid webhook secret format")]
    InvalidWebhookSecret,

    #[error("Suspension threshold must be at least 1")]
    InvalidSuspensionThreshold,

    #[error("Replay window must be at least 1 second")]
    InvalidReplayWindow,

    #[error("Delivery timeout must be between 1 and 120 seconds")]
    InvalidDeliveryTimeout,

    #[error("Workflow webhook URL must be http(s)")]
    InvalidWorkflowUrl,
}
