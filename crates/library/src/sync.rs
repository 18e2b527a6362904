use crate::local::{read_playlists, write_playlists, LocalStore};
use crate::remote::RemotePlaylists;
use crate::store::{PlaylistStore, Snapshot};
use playbar_core::{PlayerError, PlayerResult, Playlist};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

const RETRY_STEPS: [Duration; 4] = [
    Duration::from_secs(2),
    Duration::from_secs(5),
    Duration::from_secs(10),
    Duration::from_secs(30),
];

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    RemoteApplied { playlists: usize },
    RemoteEmpty,
    RemoteFailed(String),
    RemoteTimedOut,
}

/// Result of the remote half of a load, produced off the caller's task.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteFetch {
    Fetched(Vec<Playlist>),
    Failed(String),
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Pending,
    LocalOnly,
    Loaded,
}

/// Keeps the local copy and the remote copy of the playlist collection in step
/// with the store. Remote wins on load when it has data; afterwards every
/// mutation is written locally and replicated remotely on a best-effort basis.
///
/// Remote writes go through one background writer that always sends the
/// newest snapshot, so a slow write can never land after a newer one.
pub struct PlaylistSync {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemotePlaylists>,
    load_timeout: Duration,
    state: LoadState,
    dirty: bool,
    writer: Option<watch::Sender<Snapshot>>,
}

impl PlaylistSync {
    pub fn new(
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemotePlaylists>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            local,
            remote,
            load_timeout,
            state: LoadState::Pending,
            dirty: false,
            writer: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn local(&self) -> &Arc<dyn LocalStore> {
        &self.local
    }

    /// Full load: local first, then the remote within the timeout.
    pub async fn load(&mut self, store: &mut PlaylistStore) -> LoadOutcome {
        self.load_local(store);
        let fetch = self.fetch_remote().await;
        self.apply_remote(store, fetch)
    }

    /// Publishes the local copy into `store`; returns how many playlists it held.
    pub fn load_local(&mut self, store: &mut PlaylistStore) -> usize {
        let local = read_playlists(self.local.as_ref());
        let count = local.len();
        store.replace_all(local);
        if self.state == LoadState::Pending {
            self.state = LoadState::LocalOnly;
        }
        info!(playlists = count, "published local playlists");
        count
    }

    pub fn fetch_remote(&self) -> impl Future<Output = RemoteFetch> + Send + 'static {
        let remote = Arc::clone(&self.remote);
        let timeout = self.load_timeout;
        async move {
            match tokio::time::timeout(timeout, remote.fetch_all()).await {
                Ok(Ok(playlists)) => RemoteFetch::Fetched(playlists),
                Ok(Err(err)) => RemoteFetch::Failed(format!("{err:#}")),
                Err(_) => RemoteFetch::TimedOut,
            }
        }
    }

    /// Finishes the load. Edits made while the fetch was pending are pushed to
    /// the remote unless the remote copy replaced them.
    pub fn apply_remote(&mut self, store: &mut PlaylistStore, fetch: RemoteFetch) -> LoadOutcome {
        let remote = self.remote.name();
        let outcome = match fetch {
            RemoteFetch::Fetched(playlists) if !playlists.is_empty() => {
                if self.dirty {
                    info!(remote, "remote playlists supersede edits made during load");
                }
                self.dirty = false;
                store.replace_all(playlists);
                let snapshot = store.snapshot();
                if let Err(err) = write_playlists(self.local.as_ref(), &snapshot) {
                    error!(error = %err, "failed to cache remote playlists locally");
                }
                info!(remote, playlists = snapshot.len(), "remote playlists applied");
                LoadOutcome::RemoteApplied {
                    playlists: snapshot.len(),
                }
            }
            RemoteFetch::Fetched(_) => {
                debug!(remote, "remote returned no playlists; keeping local");
                LoadOutcome::RemoteEmpty
            }
            RemoteFetch::Failed(err) => {
                warn!(remote, error = %err, "remote playlist fetch failed; keeping local");
                LoadOutcome::RemoteFailed(err)
            }
            RemoteFetch::TimedOut => {
                warn!(
                    remote,
                    timeout_ms = self.load_timeout.as_millis() as u64,
                    "remote playlist fetch timed out; keeping local"
                );
                LoadOutcome::RemoteTimedOut
            }
        };

        self.state = LoadState::Loaded;
        if std::mem::take(&mut self.dirty) {
            info!(remote, "replicating edits made during load");
            self.replicate(store.snapshot());
        }
        outcome
    }

    /// Writes `playlists` locally and queues them for the remote. Before the
    /// local copy is published nothing is written; until the remote load
    /// finishes only the local copy is.
    pub fn persist(&mut self, playlists: Snapshot) -> PlayerResult<()> {
        if self.state == LoadState::Pending {
            debug!("local playlists not loaded yet; skipping write");
            return Ok(());
        }

        write_playlists(self.local.as_ref(), &playlists)
            .map_err(|err| PlayerError::Storage(format!("{err:#}")))?;

        if self.state == LoadState::LocalOnly {
            debug!("remote load pending; deferring remote write");
            self.dirty = true;
            return Ok(());
        }
        self.replicate(playlists);
        Ok(())
    }

    fn replicate(&mut self, playlists: Snapshot) {
        match &self.writer {
            Some(writer) => {
                writer.send_replace(playlists);
            }
            None => {
                let (writer, pending) = watch::channel(playlists);
                tokio::spawn(run_writer(Arc::clone(&self.remote), pending));
                self.writer = Some(writer);
            }
        }
    }
}

/// Sends the newest pending snapshot, waits for the next one. A failed write is
/// retried after a stepped delay, or sooner when a newer snapshot arrives.
async fn run_writer(remote: Arc<dyn RemotePlaylists>, mut pending: watch::Receiver<Snapshot>) {
    let mut failures = 0usize;
    loop {
        let latest = Arc::clone(&*pending.borrow_and_update());
        match remote.replace_all(&latest).await {
            Ok(()) => {
                failures = 0;
                debug!(remote = remote.name(), playlists = latest.len(), "remote playlists replaced");
                if pending.changed().await.is_err() {
                    break;
                }
            }
            Err(err) => {
                let delay = RETRY_STEPS[failures.min(RETRY_STEPS.len() - 1)];
                failures += 1;
                warn!(
                    remote = remote.name(),
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "remote playlist write failed; will retry"
                );
                tokio::select! {
                    changed = pending.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
    debug!(remote = remote.name(), "remote playlist writer stopped");
}
