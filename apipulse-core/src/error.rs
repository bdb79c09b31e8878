use thiserror::Error;

/// Batch-level ingestion failures.
///
/// The `Display` text of each variant is the user-facing response message:
/// deliberately generic, never echoing raw input back. Event-level problems are
/// not errors; they are silent drops collected by the admission loop.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid request data.")]
    InvalidPayload,

    #[error("API key required.")]
    MissingApiKey,

    #[error("Too many requests.")]
    RateLimited,

    #[error("Payload contains no logged requests.")]
    EmptyBatch,

    #[error("Unsupported API framework.")]
    UnknownFramework,

    /// Every event in the batch was dropped by validation.
    #[error("Invalid request data.")]
    NoValidRequests,

    /// Storage-gateway failure. Detail lives in the wrapped string for
    /// diagnostic logging only; the caller sees the generic message.
    #[error("Invalid data.")]
    Storage(String),
}

impl IngestError {
    /// Map to HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            IngestError::RateLimited => 429,
            _ => 400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_maps_to_429() {
        assert_eq!(IngestError::RateLimited.status_code(), 429);
    }

    #[test]
    fn all_other_errors_map_to_400() {
        for err in [
            IngestError::InvalidPayload,
            IngestError::MissingApiKey,
            IngestError::EmptyBatch,
            IngestError::UnknownFramework,
            IngestError::NoValidRequests,
            IngestError::Storage("connection refused".into()),
        ] {
            assert_eq!(err.status_code(), 400);
        }
    }

    #[test]
    fn storage_error_display_never_leaks_detail() {
        let err = IngestError::Storage("password authentication failed for user".into());
        assert_eq!(err.to_string(), "Invalid data.");
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(IngestError::MissingApiKey.to_string(), "API key required.");
        assert_eq!(IngestError::RateLimited.to_string(), "Too many requests.");
        assert_eq!(
            IngestError::EmptyBatch.to_string(),
            "Payload contains no logged requests."
        );
        assert_eq!(
            IngestError::UnknownFramework.to_string(),
            "Unsupported API framework."
        );
    }
}
