use thiserror::Error;

/// Every failure the dashboard core can surface to a page or a form.
///
/// Load and submit paths never let these escape into a crash: page controllers
/// turn them into a [`crate::pages::Notice`] and forms into a failed outcome.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("session expired or missing credentials")]
    Unauthorized,

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Business error reported by the backend (`success: false`). The message is kept verbatim.
    #[error("{0}")]
    Server(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("document error: {0}")]
    Document(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DashboardError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Text shown in the error banner.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::Transport(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            DashboardError::Unauthorized => {
                "Your session has expired. Please sign in again.".to_string()
            }
            DashboardError::Validation { message, .. } => message.clone(),
            DashboardError::Server(message) => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DashboardError::Transport(_) | DashboardError::Decode(_))
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DashboardError::Decode(err.to_string())
        } else if err.status().map(|s| s.as_u16()) == Some(401) {
            DashboardError::Unauthorized
        } else {
            DashboardError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Decode(err.to_string())
    }
}

impl From<rusqlite::Error> for DashboardError {
    fn from(err: rusqlite::Error) -> Self {
        DashboardError::Storage(err.to_string())
    }
}

impl From<::config::ConfigError> for DashboardError {
    fn from(err: ::config::ConfigError) -> Self {
        DashboardError::Config(err.to_string())
    }
}

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        DashboardError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_shown_verbatim() {
        let err = DashboardError::Server("Product with this HSN already exists".to_string());
        assert_eq!(err.user_message(), "Product with this HSN already exists");
        assert!(!err.is_retryable());
    }

    #[test]
    fn auth_failure_has_its_own_message() {
        let auth = DashboardError::Unauthorized.user_message();
        let network = DashboardError::Transport("connection refused".into()).user_message();
        assert_ne!(auth, network);
        assert!(DashboardError::Transport("x".into()).is_retryable());
    }
}
