use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeonardoError {
    /// Bad user input, always caught before any network call is made.
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Network, HTTP status, or payload parse failure talking to the API.
    #[error("API error: {0}")]
    Remote(String),

    /// Polling gave up before the server reported a terminal status.
    #[error("Generation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Missing or unusable profile/credential state.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LeonardoError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LeonardoError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for LeonardoError {
    fn from(err: reqwest::Error) -> Self {
        LeonardoError::Remote(err.to_string())
    }
}

impl From<serde_json::Error> for LeonardoError {
    fn from(err: serde_json::Error) -> Self {
        LeonardoError::Remote(format!("malformed response: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, LeonardoError>;
