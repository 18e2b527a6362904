use crate::ApiClient;
use playbar_core::{urls, ArtistDetails, PlayerError, PlayerResult, Track};
use tracing::{info, warn};

/// Search and artist lookups against the backend catalog.
#[derive(Clone)]
pub struct CatalogClient {
    api: ApiClient,
}

impl CatalogClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Blank queries short-circuit to an empty result without a request.
    pub async fn search(&self, query: &str) -> PlayerResult<Vec<Track>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let url = urls::search_url(self.api.base(), query);
        let tracks: Vec<Track> = self
            .api
            .get_json(&url)
            .await
            .map_err(|err| PlayerError::TransientNetworkFailure(format!("{err:#}")))?;
        info!(query, results = tracks.len(), "search completed");
        Ok(tracks)
    }

    /// Best effort: any failure comes back as `None`.
    pub async fn artist_details(&self, song_title: &str) -> Option<ArtistDetails> {
        let url = urls::artist_details_url(self.api.base(), song_title);
        match self.api.get_json::<Option<ArtistDetails>>(&url).await {
            Ok(details) => details,
            Err(err) => {
                warn!(song_title, error = %err, "artist lookup failed");
                None
            }
        }
    }
}
