use anyhow::Result;
use async_trait::async_trait;
use playbar_core::Playlist;

/// Remote copy of the playlist collection. Writes replace the whole
/// collection; there is no incremental patch.
#[async_trait]
pub trait RemotePlaylists: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_all(&self) -> Result<Vec<Playlist>>;
    async fn replace_all(&self, playlists: &[Playlist]) -> Result<()>;
}

/// Used when remote sync is switched off: reads come back empty, writes succeed.
pub struct DisabledRemote;

#[async_trait]
impl RemotePlaylists for DisabledRemote {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn fetch_all(&self) -> Result<Vec<Playlist>> {
        Ok(Vec::new())
    }

    async fn replace_all(&self, _playlists: &[Playlist]) -> Result<()> {
        Ok(())
    }
}
