use crate::oauth::OAuthError;

#[derive(Debug, thiserror::Error)]
pub enum JobtrailError {
    #[error("Mail provider error: {0}")]
    Provider(String),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not authenticated with Google")]
    NotAuthenticated,
}

pub type Result<T> = std::result::Result<T, JobtrailError>;

impl From<OAuthError> for JobtrailError {
    fn from(e: OAuthError) -> Self {
        JobtrailError::Auth(e.to_string())
    }
}
