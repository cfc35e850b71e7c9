//! Pure Naver Land REST API client.
//!
//! A minimal client for the complex-articles endpoint used by the Naver Land
//! web app. Fetches exactly one page per call; pagination and pacing are the
//! caller's responsibility.
//!
//! # Example
//!
//! ```rust,ignore
//! use land_client::{LandAuth, LandClient};
//!
//! let client = LandClient::new();
//! let auth = LandAuth { authorization: "Bearer ...".into(), cookie: "NNB=...".into() };
//!
//! let page = client.fetch_articles_page("12345", &auth, 1).await?;
//! for article in &page.article_list {
//!     println!("{}", article.deal_or_warrant_prc.as_deref().unwrap_or("-"));
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{LandError, Result};
pub use types::{Article, ArticlePage, LandAuth};

use reqwest::header;

const BASE_URL: &str = "https://new.land.naver.com";

/// Property types requested from the source: apartments, pre-sale rights,
/// redevelopment and reconstruction.
pub const REAL_ESTATE_TYPES: &str = "APT:PRE:ABYG:JGC";

/// Sort order requested from the source.
pub const ORDER: &str = "rank";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub struct LandClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for LandClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LandClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at a different host (local stubs, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch one page (1-based) of articles for a complex.
    ///
    /// An empty `tradeType` asks for every trade type; filtering happens on
    /// the caller's side. No retries are attempted here.
    pub async fn fetch_articles_page(
        &self,
        complex_no: &str,
        auth: &LandAuth,
        page: u32,
    ) -> Result<ArticlePage> {
        let url = format!("{}/api/articles/complex/{}", self.base_url, complex_no);
        let referer = format!("{}/complexes/{}", self.base_url, complex_no);
        let page_param = page.to_string();

        let resp = self
            .client
            .get(&url)
            .header(header::ACCEPT, "*/*")
            .header(
                header::ACCEPT_LANGUAGE,
                "ko,ko-KR;q=0.9,en-US;q=0.8,en;q=0.7",
            )
            .header(header::AUTHORIZATION, &auth.authorization)
            .header(header::COOKIE, &auth.cookie)
            .header(header::REFERER, referer)
            .header(header::USER_AGENT, USER_AGENT)
            .query(&[
                ("realEstateType", REAL_ESTATE_TYPES),
                ("tradeType", ""),
                ("page", page_param.as_str()),
                ("order", ORDER),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LandError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let page_data: ArticlePage = serde_json::from_str(&body)?;
        tracing::debug!(
            complex_no,
            page,
            articles = page_data.article_list.len(),
            more = page_data.is_more_data,
            "Fetched article page"
        );

        Ok(page_data)
    }
}
