use playbar_core::{PlayerResult, Playlist, Track};
use std::future::Future;
use tokio::sync::watch;
use tracing::error;

pub mod local;
pub mod remote;
mod store;
mod sync;
#[cfg(test)]
mod testing;

pub use local::{FileStore, LocalStore, MemoryStore};
pub use remote::{DisabledRemote, RemotePlaylists};
pub use store::{PlaylistStore, Snapshot};
pub use sync::{LoadOutcome, PlaylistSync, RemoteFetch};

/// Playlist store with persistence wired in: every successful mutation is
/// handed to the synchronizer.
pub struct PlaylistLibrary {
    store: PlaylistStore,
    sync: PlaylistSync,
}

impl PlaylistLibrary {
    pub fn new(sync: PlaylistSync) -> Self {
        Self {
            store: PlaylistStore::new(),
            sync,
        }
    }

    pub async fn load(&mut self) -> LoadOutcome {
        self.sync.load(&mut self.store).await
    }

    /// Publishes the local copy; mutations are kept locally until
    /// `apply_remote` settles the load.
    pub fn load_local(&mut self) -> usize {
        self.sync.load_local(&mut self.store)
    }

    pub fn fetch_remote(&self) -> impl Future<Output = RemoteFetch> + Send + 'static {
        self.sync.fetch_remote()
    }

    pub fn apply_remote(&mut self, fetch: RemoteFetch) -> LoadOutcome {
        self.sync.apply_remote(&mut self.store, fetch)
    }

    pub fn is_loaded(&self) -> bool {
        self.sync.is_loaded()
    }

    pub fn playlists(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn get(&self, id: u64) -> Option<&Playlist> {
        self.store.get(id)
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.store.subscribe()
    }

    pub fn local(&self) -> &dyn LocalStore {
        self.sync.local().as_ref()
    }

    pub fn create(&mut self, name: &str) -> PlayerResult<Playlist> {
        let playlist = self.store.create(name)?;
        self.persist();
        Ok(playlist)
    }

    pub fn delete(&mut self, id: u64) -> PlayerResult<Playlist> {
        let removed = self.store.delete(id)?;
        self.persist();
        Ok(removed)
    }

    pub fn rename(&mut self, id: u64, name: &str) -> PlayerResult<()> {
        self.store.rename(id, name)?;
        self.persist();
        Ok(())
    }

    pub fn set_cover(&mut self, id: u64, cover: Option<String>) -> PlayerResult<()> {
        self.store.set_cover(id, cover)?;
        self.persist();
        Ok(())
    }

    pub fn add_track(&mut self, id: u64, track: Track) -> PlayerResult<bool> {
        let added = self.store.add_track(id, track)?;
        if added {
            self.persist();
        }
        Ok(added)
    }

    pub fn reorder(&mut self, id: u64, from: usize, to: usize) -> PlayerResult<()> {
        self.store.reorder(id, from, to)?;
        if from != to {
            self.persist();
        }
        Ok(())
    }

    fn persist(&mut self) {
        if let Err(err) = self.sync.persist(self.store.snapshot()) {
            error!(error = %err, "failed to persist playlists");
        }
    }
}
