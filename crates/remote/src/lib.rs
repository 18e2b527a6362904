use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

mod catalog;
mod playlists;

pub use catalog::CatalogClient;
pub use playlists::HttpPlaylists;

const USER_AGENT: &str = concat!("playbar/", env!("CARGO_PKG_VERSION"));
const BACKOFF_STEPS: [Duration; 4] = [
    Duration::from_secs(2),
    Duration::from_secs(5),
    Duration::from_secs(10),
    Duration::from_secs(30),
];

/// Thin JSON-over-HTTP client bound to the backend base URL.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid api base url {base_url}"))?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("{url} returned {status}: {body}"));
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("invalid json from {url}"))
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<()> {
        debug!(url, "POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("{url} returned {status}"));
        }
        Ok(())
    }
}

/// Stepped retry delay after failures; a success resets it.
#[derive(Debug)]
struct Backoff {
    idx: usize,
    next_retry_at: Instant,
}

impl Backoff {
    fn new() -> Self {
        Self {
            idx: 0,
            next_retry_at: Instant::now(),
        }
    }

    fn ready(&self, now: Instant) -> bool {
        now >= self.next_retry_at
    }

    fn schedule(&mut self, now: Instant) {
        let idx = self.idx.min(BACKOFF_STEPS.len() - 1);
        self.next_retry_at = now + BACKOFF_STEPS[idx];
        self.idx = (self.idx + 1).min(BACKOFF_STEPS.len() - 1);
    }

    fn reset(&mut self, now: Instant) {
        self.idx = 0;
        self.next_retry_at = now;
    }
}
