//! Downloading free/busy documents.
//!
//! [`HttpFetcher`] understands http(s), webcal(s) (fetched over http(s)) and
//! local `file://` URLs. The whole fetch runs under one timeout.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, instrument};
use url::Url;

use crate::client::ResourceFetcher;
use crate::error::{MeetingError, MeetingResult};

const USER_SUB: &str = "%u";
const DOMAIN_SUB: &str = "%d";

/// Substitute `%u` (user part) and `%d` (domain) of `email` into `template`.
pub fn expand_template(template: &str, email: &str) -> String {
    let (user, domain) = email.split_once('@').unwrap_or((email, ""));
    template.replace(USER_SUB, user).replace(DOMAIN_SUB, domain)
}

/// Parse a free/busy URL, mapping webcal schemes onto http.
pub fn resolve_url(raw: &str) -> MeetingResult<Url> {
    let raw = raw.trim();
    let rewritten = match raw.split_once("://") {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("webcal") => format!("http://{rest}"),
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("webcals") => format!("https://{rest}"),
        _ => raw.to_string(),
    };

    let url = Url::parse(&rewritten).map_err(|e| MeetingError::UnsupportedUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" | "file" => Ok(url),
        _ => Err(MeetingError::UnsupportedUrl(raw.to_string())),
    }
}

pub struct HttpFetcher {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> MeetingResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("meetfb/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MeetingError::Fetch(e.to_string()))?;

        Ok(HttpFetcher { http, timeout })
    }

    async fn fetch_url(&self, url: Url) -> MeetingResult<String> {
        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| MeetingError::UnsupportedUrl(url.to_string()))?;
            return Ok(tokio::fs::read_to_string(path).await?);
        }

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MeetingError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MeetingError::Fetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response.text().await.map_err(|e| MeetingError::Fetch(e.to_string()))
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> MeetingResult<String> {
        let url = resolve_url(url)?;
        debug!(%url, "Fetching free/busy");

        timeout(self.timeout, self.fetch_url(url))
            .await
            .map_err(|_| MeetingError::FetchTimeout(self.timeout.as_secs()))?
    }
}
