//! Error types and handling for the `TripCraft` library

use thiserror::Error;

/// Main error type for the `TripCraft` library
#[derive(Error, Debug)]
pub enum TripCraftError {
    /// Requested schedule dates violate the temporal precondition
    #[error("Invalid date: {message}")]
    InvalidDate { message: String },

    /// Transport or HTTP failure from the generation or routing services
    #[error("Upstream call failed (status: {status:?}): {body}")]
    Upstream { status: Option<u16>, body: String },

    /// The generation request was refused by the upstream content policy
    #[error("Generation blocked: {reason}")]
    SafetyBlocked { reason: String },

    /// Generation payload did not match the expected contract
    #[error("Malformed generation response: {message}")]
    MalformedResponse { message: String },

    /// Edit payload did not match the expected contract
    #[error("Invalid edit response: {message}")]
    InvalidEditResponse { message: String },

    /// Transport or HTTP failure from the place-resolution service
    #[error("Place resolution failed: {message}")]
    Resolution { message: String },

    /// Reverse geocoding matched none of the supported cities
    #[error("No supported city at ({lat}, {lng})")]
    CityNotFound { lat: f64, lng: f64 },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A pipeline stage failed; carries the failed stage and the cause
    #[error("Schedule pipeline failed at stage '{stage}': {source}")]
    Generation {
        stage: &'static str,
        #[source]
        source: Box<TripCraftError>,
    },
}

impl TripCraftError {
    /// Create a new invalid-date error
    pub fn invalid_date<S: Into<String>>(message: S) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Create a new upstream error carrying the status code and body
    pub fn upstream<S: Into<String>>(status: Option<u16>, body: S) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// Create a new safety-block error
    pub fn safety_blocked<S: Into<String>>(reason: S) -> Self {
        Self::SafetyBlocked {
            reason: reason.into(),
        }
    }

    /// Create a new malformed-response error
    pub fn malformed_response<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new invalid-edit-response error
    pub fn invalid_edit_response<S: Into<String>>(message: S) -> Self {
        Self::InvalidEditResponse {
            message: message.into(),
        }
    }

    /// Create a new resolution error
    pub fn resolution<S: Into<String>>(message: S) -> Self {
        Self::Resolution {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap a stage failure of the generation pipeline
    pub fn generation(stage: &'static str, source: TripCraftError) -> Self {
        Self::Generation {
            stage,
            source: Box::new(source),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripCraftError::InvalidDate { message } => {
                format!("Invalid date: {message}")
            }
            TripCraftError::Upstream { .. } | TripCraftError::Resolution { .. } => {
                "Unable to reach external services. Please try again later.".to_string()
            }
            TripCraftError::SafetyBlocked { .. } => {
                "The request was refused by the content policy.".to_string()
            }
            TripCraftError::MalformedResponse { .. }
            | TripCraftError::InvalidEditResponse { .. } => {
                "The generation service returned an unusable response.".to_string()
            }
            TripCraftError::CityNotFound { .. } => {
                "These coordinates are outside the supported cities.".to_string()
            }
            TripCraftError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TripCraftError::Generation { source, .. } => source.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let date_err = TripCraftError::invalid_date("starts in the past");
        assert!(matches!(date_err, TripCraftError::InvalidDate { .. }));

        let upstream_err = TripCraftError::upstream(Some(500), "boom");
        assert!(matches!(
            upstream_err,
            TripCraftError::Upstream {
                status: Some(500),
                ..
            }
        ));

        let config_err = TripCraftError::config("missing API key");
        assert!(matches!(config_err, TripCraftError::Config { .. }));
    }

    #[test]
    fn test_generation_wraps_source() {
        let err = TripCraftError::generation("draft", TripCraftError::safety_blocked("SAFETY"));
        assert!(err.to_string().contains("draft"));
        let TripCraftError::Generation { stage, source } = err else {
            panic!("expected a generation wrapper");
        };
        assert_eq!(stage, "draft");
        assert!(matches!(*source, TripCraftError::SafetyBlocked { .. }));
    }

    #[test]
    fn test_user_messages() {
        let upstream_err = TripCraftError::upstream(None, "timed out");
        assert!(upstream_err.user_message().contains("Unable to reach"));

        let wrapped = TripCraftError::generation("cost", TripCraftError::upstream(None, "x"));
        assert_eq!(wrapped.user_message(), upstream_err.user_message());

        let date_err = TripCraftError::invalid_date("too early");
        assert!(date_err.user_message().contains("too early"));
    }
}
