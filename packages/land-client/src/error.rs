use thiserror::Error;

pub type Result<T> = std::result::Result<T, LandError>;

#[derive(Debug, Error)]
pub enum LandError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Naver Land API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode article page: {0}")]
    Decode(#[from] serde_json::Error),
}

impl LandError {
    /// Whether the source rejected the credential (expired cookie or token).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, LandError::Api { status: 401 | 403, .. })
    }
}
