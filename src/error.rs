use thiserror::Error;

use crate::i18n::{message, Lang, Message};

/// Errors that can occur while talking to the recipe platform or managing client state
#[derive(Error, Debug)]
pub enum PortalError {
    /// Connection failure, DNS error or a body that could not be read
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The backend answered with a non-success status
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// The response body did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The backend reported `success: false`
    #[error("API error: {0}")]
    Api(String),

    /// Reading or writing the client-state store failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid wizard transition
    #[error("Wizard error: {0}")]
    Wizard(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl PortalError {
    /// Localized message shown to the user in place of the failed content.
    pub fn user_message(&self, lang: Lang) -> &'static str {
        let key = match self {
            PortalError::Timeout(_) => Message::TookTooLong,
            PortalError::Network(_) => Message::ConnectionFailed,
            PortalError::Status(_) | PortalError::Malformed(_) | PortalError::Api(_) => {
                Message::LoadFailed
            }
            PortalError::Storage(_) | PortalError::Wizard(_) | PortalError::Config(_) => {
                Message::SomethingWentWrong
            }
        };
        message(key, lang)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PortalError::Timeout(_))
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Malformed(err.to_string())
    }
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        PortalError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_has_distinct_message() {
        let timeout = PortalError::Timeout(90).user_message(Lang::En);
        let network = PortalError::Network("refused".to_string()).user_message(Lang::En);
        assert_ne!(timeout, network);
        assert!(timeout.contains("too long"));
    }

    #[test]
    fn test_messages_are_localized() {
        let err = PortalError::Status(500);
        assert_ne!(err.user_message(Lang::Ar), err.user_message(Lang::En));
        assert!(!err.user_message(Lang::Ar).is_empty());
    }
}
