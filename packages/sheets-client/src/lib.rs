//! Pure Google Sheets v4 values client.
//!
//! Authenticates as a service account (JWT-bearer grant) and exposes the three
//! value operations the collector needs: read a range, clear a range, append
//! rows.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheets_client::SheetsClient;
//!
//! let client = SheetsClient::from_key_file("google_auth.json").await?;
//! let range = client.get_values("spreadsheet-id", "complexes!E4:E").await?;
//! println!("{:?}", range.non_empty_cells());
//! ```

pub mod error;
pub mod types;

pub use error::{Result, SheetsError};
pub use types::{ServiceAccountKey, ValueRange};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Url;
use serde_json::Value;
use std::path::Path;
use tokio::sync::Mutex;
use types::{AppendBody, AssertionClaims, TokenResponse};

const BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Refresh the access token this long before it actually expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

pub struct SheetsClient {
    client: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
}

impl SheetsClient {
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SheetsError::InvalidKey(e.to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            key,
            encoding_key,
            token: Mutex::new(None),
        })
    }

    /// Load a service-account key file (the JSON downloaded from the console).
    pub async fn from_key_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let key: ServiceAccountKey = serde_json::from_str(&raw)?;
        Self::new(key)
    }

    /// Return a valid access token, minting a new one when the cached token is
    /// missing or about to expire.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) {
                return Ok(token.access_token.clone());
            }
        }

        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;

        let resp = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Token {
                status: status.as_u16(),
                message: body,
            });
        }

        let token: TokenResponse = resp.json().await?;
        tracing::debug!(expires_in = token.expires_in, "Minted Sheets access token");

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        });
        Ok(access_token)
    }

    /// Build `{BASE_URL}/{spreadsheet_id}/values/{range}{suffix}` with the
    /// range percent-encoded as a single path segment.
    fn values_url(spreadsheet_id: &str, range: &str, suffix: &str) -> Result<Url> {
        let mut url = Url::parse(BASE_URL)
            .map_err(|e| SheetsError::InvalidKey(format!("bad base url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidKey("base url cannot be a base".to_string()))?
            .push(spreadsheet_id)
            .push("values")
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp)
    }

    /// Read the values of an A1-notation range.
    pub async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<ValueRange> {
        let token = self.access_token().await?;
        let url = Self::values_url(spreadsheet_id, range, "")?;

        let resp = self.client.get(url).bearer_auth(token).send().await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    /// Clear every value in a range (formatting is kept).
    pub async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<()> {
        let token = self.access_token().await?;
        let url = Self::values_url(spreadsheet_id, range, ":clear")?;

        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Append rows after the table found at `range`, parsing values as if typed
    /// by a user (`USER_ENTERED`).
    pub async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<Value>],
    ) -> Result<()> {
        let token = self.access_token().await?;
        let mut url = Self::values_url(spreadsheet_id, range, ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&AppendBody { values: rows })
            .send()
            .await?;
        Self::check(resp).await?;

        tracing::debug!(range, rows = rows.len(), "Appended rows");
        Ok(())
    }
}
