use thiserror::Error;

/// Run-level outcomes that callers need to tell apart.
///
/// Everything else (sheet, storage, network plumbing) travels as
/// `anyhow::Error` with context attached.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("no Naver API credentials configured (set NAVER_API_COOKIE_1 / NAVER_API_AUTHORIZATION_1)")]
    NoCredentials,

    #[error("a data collection run is already in progress")]
    RunInProgress,
}
