use thiserror::Error;

/// Outcome code of the last token or fetch operation.
///
/// `Ok` is the only success code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenStatus {
    Ok,
    Uninitialized,
    OutOfSpace,
    MissingCredentials,
    ParsingError,
    TransportInitFailed,
    TransferFailed,
    HttpStatusError,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has not been materialized.")]
    Uninitialized,

    #[error("Insufficient space: credentials are too long.")]
    OutOfSpace,

    #[error("Missing credentials.")]
    MissingCredentials,

    #[error("Token parsing error: unknown access token format.")]
    Parsing,

    #[error("HTTP client initialization failed: {0}")]
    TransportInit(String),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("HTTP status error: {status}")]
    HttpStatus { status: u16 },
}

impl TokenError {
    pub fn status(&self) -> TokenStatus {
        match self {
            TokenError::Uninitialized => TokenStatus::Uninitialized,
            TokenError::OutOfSpace => TokenStatus::OutOfSpace,
            TokenError::MissingCredentials => TokenStatus::MissingCredentials,
            TokenError::Parsing => TokenStatus::ParsingError,
            TokenError::TransportInit(_) => TokenStatus::TransportInitFailed,
            TokenError::TransferFailed(_) => TokenStatus::TransferFailed,
            TokenError::HttpStatus { .. } => TokenStatus::HttpStatusError,
        }
    }
}

pub type Result<T> = std::result::Result<T, TokenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(TokenError::OutOfSpace.status(), TokenStatus::OutOfSpace);
        assert_eq!(
            TokenError::HttpStatus { status: 503 }.status(),
            TokenStatus::HttpStatusError
        );
        assert_eq!(
            TokenError::TransferFailed("reset".into()).status(),
            TokenStatus::TransferFailed
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(TokenError::MissingCredentials.to_string(), "Missing credentials.");
        assert_eq!(
            TokenError::HttpStatus { status: 404 }.to_string(),
            "HTTP status error: 404"
        );
    }
}
