use chrono::{DateTime, Local, TimeZone};
use land_client::LandAuth;
use serde::Serialize;

/// Identifier of one real-estate complex (a "target" of collection).
pub type Target = String;

/// Source API credential bound to one worker for the duration of a run.
#[derive(Clone)]
pub struct Credential {
    pub id: String,
    pub auth_token: String,
    pub session_cookie: String,
}

impl Credential {
    pub fn new(
        id: impl Into<String>,
        auth_token: impl Into<String>,
        session_cookie: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            auth_token: auth_token.into(),
            session_cookie: session_cookie.into(),
        }
    }

    pub fn to_land_auth(&self) -> LandAuth {
        LandAuth {
            authorization: self.auth_token.clone(),
            cookie: self.session_cookie.clone(),
        }
    }
}

// Tokens and cookies never end up in logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("auth_token", &"<redacted>")
            .field("session_cookie", &"<redacted>")
            .finish()
    }
}

/// Date and time stamped on every listing collected in one run.
///
/// Captured once when the run starts so all rows of a run share one snapshot
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureStamp {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
}

impl CaptureStamp {
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            date: at.format("%Y-%m-%d").to_string(),
            time: at.format("%H:%M:%S").to_string(),
        }
    }
}
