use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a remote lookup (city search or forecast).
#[derive(Debug, Error)]
pub enum LookupError {
    /// Connectivity failure or the HTTP client's timeout elapsed.
    #[error("network error: {message}")]
    Network { message: String, timed_out: bool },

    /// The response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The provider answered with a non-success status.
    #[error("request failed with status {status}: {body}")]
    Api { status: StatusCode, body: String },

    /// Blank query; rejected before any request is made.
    #[error("query is empty")]
    EmptyQuery,
}

impl LookupError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LookupError::Api { status, .. } if *status == StatusCode::TOO_MANY_REQUESTS)
    }

    /// Short message suitable for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Network { timed_out: true, .. } => {
                "The weather service took too long to respond. Please try again.".to_string()
            }
            LookupError::Network { .. } => {
                "Unable to reach the weather service. Check your internet connection.".to_string()
            }
            LookupError::Decode(_) => {
                "The weather service returned an unexpected response.".to_string()
            }
            err if err.is_rate_limited() => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            LookupError::Api { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN =>
            {
                "The weather service rejected the API key. Run `weatherdex configure`.".to_string()
            }
            LookupError::Api { status, .. } => {
                format!("The weather service failed ({status}). Please try again later.")
            }
            LookupError::EmptyQuery => "Enter a city name to search.".to_string(),
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return LookupError::Decode(err.to_string());
        }
        LookupError::Network {
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::Decode(err.to_string())
    }
}

/// Failure of the local favorites store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("favorites I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("favorites file is corrupt: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_mentions_waiting() {
        let err = LookupError::Network {
            message: "operation timed out".into(),
            timed_out: true,
        };
        assert!(err.user_message().contains("too long"));
    }

    #[test]
    fn rate_limit_is_detected() {
        let err = LookupError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        };
        assert!(err.is_rate_limited());
        assert!(err.user_message().contains("Too many requests"));
    }

    #[test]
    fn every_message_is_non_empty() {
        let errors = [
            LookupError::Network { message: "dns".into(), timed_out: false },
            LookupError::Decode("eof".into()),
            LookupError::Api { status: StatusCode::UNAUTHORIZED, body: "bad key".into() },
            LookupError::Api { status: StatusCode::BAD_GATEWAY, body: String::new() },
            LookupError::EmptyQuery,
        ];
        for err in errors {
            assert!(!err.user_message().is_empty(), "{err:?}");
        }
    }

    #[test]
    fn serde_errors_become_decode_errors() {
        let err: LookupError = serde_json::from_str::<Vec<u8>>("{").unwrap_err().into();
        assert!(matches!(err, LookupError::Decode(_)));
    }
}
