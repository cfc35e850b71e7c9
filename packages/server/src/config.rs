use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::common::Credential;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Deployment mode (`DEV`, `PROD`, ...) selecting the `*_{MODE}` sheet variables.
    pub mode: String,
    pub google_sheet_id: String,
    pub complex_list_sheet: String,
    pub summary_sheet: String,
    pub google_auth_file: String,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    /// Six-field cron expression for scheduled runs (seconds first).
    pub collect_cron: Option<String>,
    /// One entry per worker, in numbering order.
    pub credentials: Vec<Credential>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let mode = env::var("MODE").unwrap_or_else(|_| "DEV".to_string());

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            google_sheet_id: env::var(format!("GOOGLE_SHEET_ID_{}", mode))
                .with_context(|| format!("GOOGLE_SHEET_ID_{} must be set", mode))?,
            complex_list_sheet: env::var(format!("GOOGLE_SHEET_COMPLEX_LIST_{}", mode))
                .unwrap_or_else(|_| "수도권_test".to_string()),
            summary_sheet: env::var(format!("GOOGLE_SHEET_SUMMARY_{}", mode))
                .unwrap_or_else(|_| "수집요약_test".to_string()),
            google_auth_file: env::var("GOOGLE_AUTH_FILE")
                .unwrap_or_else(|_| "google_auth.json".to_string()),
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").ok(),
            collect_cron: env::var("COLLECT_CRON").ok().filter(|s| !s.trim().is_empty()),
            credentials: credentials_from(|key| env::var(key).ok()),
            mode,
        })
    }
}

/// Collect numbered credentials (`NAVER_API_COOKIE_1` + `NAVER_API_AUTHORIZATION_1`,
/// `_2`, ...) until the first missing pair, falling back to the unnumbered
/// `NAVER_API_COOKIE` / `NAVER_API_AUTHORIZATION` pair when none are numbered.
pub fn credentials_from<F>(lookup: F) -> Vec<Credential>
where
    F: Fn(&str) -> Option<String>,
{
    let present = |key: &str| lookup(key).filter(|v| !v.is_empty());

    let mut credentials = Vec::new();
    for i in 1.. {
        let cookie = present(&format!("NAVER_API_COOKIE_{}", i));
        let authorization = present(&format!("NAVER_API_AUTHORIZATION_{}", i));
        match (cookie, authorization) {
            (Some(cookie), Some(authorization)) => credentials.push(Credential::new(
                format!("worker-{}", i),
                authorization,
                cookie,
            )),
            _ => break,
        }
    }

    if credentials.is_empty() {
        if let (Some(cookie), Some(authorization)) = (
            present("NAVER_API_COOKIE"),
            present("NAVER_API_AUTHORIZATION"),
        ) {
            credentials.push(Credential::new("worker-1", authorization, cookie));
        }
    }

    credentials
}
