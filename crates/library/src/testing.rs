use crate::remote::RemotePlaylists;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use playbar_core::{Playlist, Track};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

pub(crate) fn playlist(id: u64, name: &str, track_ids: &[&str]) -> Playlist {
    let mut playlist = Playlist::new(id, name);
    playlist.tracks = track_ids.iter().map(|t| Track::new(*t, *t)).collect();
    playlist
}

/// Remote double: serves a canned fetch result and reports every successful
/// write on a channel.
pub(crate) struct RecordingRemote {
    fetch: std::result::Result<Vec<Playlist>, String>,
    delay: Option<Duration>,
    write_delays: Mutex<VecDeque<Duration>>,
    write_failures: AtomicUsize,
    writes: mpsc::UnboundedSender<Vec<Playlist>>,
}

impl RecordingRemote {
    pub(crate) fn returning(
        fetch: std::result::Result<Vec<Playlist>, String>,
    ) -> (Self, mpsc::UnboundedReceiver<Vec<Playlist>>) {
        let (writes, rx) = mpsc::unbounded_channel();
        (
            Self {
                fetch,
                delay: None,
                write_delays: Mutex::new(VecDeque::new()),
                write_failures: AtomicUsize::new(0),
                writes,
            },
            rx,
        )
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Latency of successive writes, in call order.
    pub(crate) fn with_write_delays(self, delays: &[Duration]) -> Self {
        if let Ok(mut queue) = self.write_delays.lock() {
            queue.extend(delays.iter().copied());
        }
        self
    }

    /// The next `count` writes fail.
    pub(crate) fn failing_writes(self, count: usize) -> Self {
        self.write_failures.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl RemotePlaylists for RecordingRemote {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn fetch_all(&self) -> Result<Vec<Playlist>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.fetch.clone().map_err(|e| anyhow!(e))
    }

    async fn replace_all(&self, playlists: &[Playlist]) -> Result<()> {
        let delay = self.write_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failed = self
            .write_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(anyhow!("remote unavailable"));
        }
        // receiver may be gone once a test stops listening
        self.writes.send(playlists.to_vec()).ok();
        Ok(())
    }
}
