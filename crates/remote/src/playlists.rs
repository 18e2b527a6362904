use crate::{ApiClient, Backoff};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use playbar_core::{urls, Playlist};
use playbar_library::RemotePlaylists;
use std::sync::Mutex;
use std::time::Instant;

/// `GET`/`POST {base}/playlists`, full-collection replace.
pub struct HttpPlaylists {
    api: ApiClient,
    backoff: Mutex<Backoff>,
}

impl HttpPlaylists {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            backoff: Mutex::new(Backoff::new()),
        }
    }

    fn check_backoff(&self) -> Result<()> {
        let backoff = self
            .backoff
            .lock()
            .map_err(|_| anyhow!("backoff state poisoned"))?;
        if backoff.ready(Instant::now()) {
            Ok(())
        } else {
            Err(anyhow!("remote playlist backoff active"))
        }
    }

    fn record<T>(&self, result: Result<T>) -> Result<T> {
        if let Ok(mut backoff) = self.backoff.lock() {
            let now = Instant::now();
            match &result {
                Ok(_) => backoff.reset(now),
                Err(_) => backoff.schedule(now),
            }
        }
        result
    }
}

#[async_trait]
impl RemotePlaylists for HttpPlaylists {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_all(&self) -> Result<Vec<Playlist>> {
        self.check_backoff()?;
        let url = urls::playlists_url(self.api.base());
        let result = self.api.get_json::<Vec<Playlist>>(&url).await;
        self.record(result)
    }

    async fn replace_all(&self, playlists: &[Playlist]) -> Result<()> {
        self.check_backoff()?;
        let url = urls::playlists_url(self.api.base());
        let result = self.api.post_json(&url, playlists).await;
        self.record(result)
    }
}
