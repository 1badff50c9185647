//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, percentile within (0, 100])
//! - Check the provider endpoint parses as a URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let provider = &config.provider;

    if provider.name.trim().is_empty() {
        errors.push(ValidationError::new("provider.name", "must not be empty"));
    }
    if let Err(e) = url::Url::parse(&provider.endpoint) {
        errors.push(ValidationError::new(
            "provider.endpoint",
            format!("invalid URL '{}': {}", provider.endpoint, e),
        ));
    }
    if provider.rate_limit_per_sec == 0 {
        errors.push(ValidationError::new("provider.rate_limit_per_sec", "must be > 0"));
    }
    if provider.parallel_requests == 0 {
        errors.push(ValidationError::new("provider.parallel_requests", "must be > 0"));
    }
    if provider.average_processing_time_ms == 0 {
        errors.push(ValidationError::new(
            "provider.average_processing_time_ms",
            "must be > 0",
        ));
    }
    if provider.price.is_sign_negative() {
        errors.push(ValidationError::new("provider.price", "must not be negative"));
    }

    let latency = &config.latency;
    if latency.sample_capacity == 0 {
        errors.push(ValidationError::new("latency.sample_capacity", "must be > 0"));
    }
    if latency.histogram_buckets == 0 {
        errors.push(ValidationError::new("latency.histogram_buckets", "must be > 0"));
    }
    if !(latency.percentile > 0.0 && latency.percentile <= 100.0) {
        errors.push(ValidationError::new(
            "latency.percentile",
            format!("{} is outside (0, 100]", latency.percentile),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
