use std::sync::Arc;

use thiserror::Error;

/// Errors raised while talking to the model service or the local store.
#[derive(Error, Debug)]
pub enum RadarError {
    #[error("No API key configured (set gemini.api_key or GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model returned an empty reply")]
    EmptyReply,

    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema violation: {field} - {message}")]
    Schema { field: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Request,
    Parse,
    Persistence,
}

pub type RadarResult<T> = Result<T, RadarError>;

/// Errors travel inside cloneable UI messages.
pub type SharedError = Arc<RadarError>;

impl RadarError {
    pub fn schema(field: impl Into<String>, message: impl Into<String>) -> Self {
        RadarError::Schema {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RadarError::MissingApiKey
            | RadarError::Network(_)
            | RadarError::Api { .. }
            | RadarError::EmptyReply => ErrorKind::Request,
            RadarError::Json(_) | RadarError::Schema { .. } => ErrorKind::Parse,
            RadarError::Storage(_) | RadarError::Io(_) => ErrorKind::Persistence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(RadarError::EmptyReply.kind(), ErrorKind::Request);
        assert_eq!(
            RadarError::Api { status: 503, message: "busy".into() }.kind(),
            ErrorKind::Request
        );
        assert_eq!(RadarError::schema("score", "out of range").kind(), ErrorKind::Parse);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(RadarError::from(json_err).kind(), ErrorKind::Parse);

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(RadarError::from(io_err).kind(), ErrorKind::Persistence);
    }

    #[test]
    fn test_schema_message() {
        let err = RadarError::schema("dataFreshness.score", "must be between 1 and 10");
        assert_eq!(
            err.to_string(),
            "Schema violation: dataFreshness.score - must be between 1 and 10"
        );
    }
}
