use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Setup-time failures. Nothing on the admission path returns these.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Config(_) => "config_error",
        }
    }
}

/// The assertion document could not be decoded. Folds to an untrusted record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("assertion is not valid utf-8")]
    Encoding,
    #[error("malformed assertion xml: {0}")]
    Xml(String),
    #[error("assertion attribute is missing its Name")]
    MissingName,
}

/// No host directory entry for either the hostname or the IP. Folds to deny.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host not found in directory: {hostname} / {ip}")]
pub struct NotFound {
    pub hostname: String,
    pub ip: String,
}

/// The attestation service could not produce an assertion. Folds to deny.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("attestation request failed: {0}")]
    Transport(String),
    #[error("attestation service returned {0}")]
    Status(u16),
    #[error("attestation response body unreadable: {0}")]
    Body(String),
}

/// The tag selection text is not a tag-name to value-list object. Folds to no match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tag selection: {0}")]
pub struct SelectionDecodeError(pub String);

#[cfg(test)]
mod tests {
    use super::{AppError, FetchError, NotFound};

    #[test]
    fn config_error_names_the_key() {
        let err =
            AppError::Config("missing required env var TRUST_ATTESTATION_SERVER".to_string());
        assert!(err.to_string().starts_with("configuration error"));
        assert!(err.to_string().contains("TRUST_ATTESTATION_SERVER"));
        assert_eq!(err.code(), "config_error");
    }

    #[test]
    fn invalid_input_code() {
        assert_eq!(
            AppError::InvalidInput("expected key=value".to_string()).code(),
            "invalid_input"
        );
    }

    #[test]
    fn not_found_reports_both_identifiers() {
        let err = NotFound {
            hostname: "compute-1".to_string(),
            ip: "10.0.0.7".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "host not found in directory: compute-1 / 10.0.0.7"
        );
    }

    #[test]
    fn fetch_status_names_the_code() {
        assert_eq!(
            FetchError::Status(503).to_string(),
            "attestation service returned 503"
        );
    }
}
