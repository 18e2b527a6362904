use playbar_core::{PlayerError, PlayerResult, Playlist, Track};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::watch;

pub type Snapshot = Arc<Vec<Playlist>>;

/// Owns the playlist collection. Every mutation builds a new collection and
/// swaps it in whole, so a `Snapshot` held by a reader never changes under it.
pub struct PlaylistStore {
    current: Snapshot,
    publisher: watch::Sender<Snapshot>,
    last_id: u64,
}

impl PlaylistStore {
    pub fn new() -> Self {
        let current: Snapshot = Arc::new(Vec::new());
        let (publisher, _) = watch::channel(Arc::clone(&current));
        Self {
            current,
            publisher,
            last_id: 0,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.current)
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.publisher.subscribe()
    }

    pub fn get(&self, id: u64) -> Option<&Playlist> {
        self.current.iter().find(|p| p.id == id)
    }

    pub fn create(&mut self, name: &str) -> PlayerResult<Playlist> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlayerError::invalid("playlist name is empty"));
        }
        let playlist = Playlist::new(self.next_id(), name);
        let mut next = self.current.as_ref().clone();
        next.push(playlist.clone());
        self.publish(next);
        Ok(playlist)
    }

    pub fn delete(&mut self, id: u64) -> PlayerResult<Playlist> {
        let pos = self.position(id)?;
        let mut next = self.current.as_ref().clone();
        let removed = next.remove(pos);
        self.publish(next);
        Ok(removed)
    }

    pub fn rename(&mut self, id: u64, name: &str) -> PlayerResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlayerError::invalid("playlist name is empty"));
        }
        self.update(id, |p| p.name = name.to_string())
    }

    pub fn set_cover(&mut self, id: u64, cover: Option<String>) -> PlayerResult<()> {
        self.update(id, |p| p.cover_image = cover)
    }

    /// Returns `false` (and changes nothing) when the track is already present.
    pub fn add_track(&mut self, id: u64, track: Track) -> PlayerResult<bool> {
        let pos = self.position(id)?;
        if self.current[pos].contains(&track.id) {
            return Ok(false);
        }
        self.update(id, |p| p.tracks.push(track))?;
        Ok(true)
    }

    /// Moves the track at `from` so that it ends up at `to`.
    pub fn reorder(&mut self, id: u64, from: usize, to: usize) -> PlayerResult<()> {
        let pos = self.position(id)?;
        let len = self.current[pos].tracks.len();
        if from >= len || to >= len {
            return Err(PlayerError::invalid(format!(
                "reorder {from} -> {to} out of range for {len} tracks"
            )));
        }
        if from == to {
            return Ok(());
        }
        self.update(id, |p| {
            let track = p.tracks.remove(from);
            p.tracks.insert(to, track);
        })
    }

    /// Swaps in a whole collection (startup load). Duplicate track ids inside a
    /// playlist are dropped, first occurrence wins.
    pub fn replace_all(&mut self, playlists: Vec<Playlist>) {
        let next: Vec<Playlist> = playlists.into_iter().map(dedup_tracks).collect();
        self.last_id = next.iter().map(|p| p.id).max().unwrap_or(0).max(self.last_id);
        self.publish(next);
    }

    fn update(&mut self, id: u64, apply: impl FnOnce(&mut Playlist)) -> PlayerResult<()> {
        let pos = self.position(id)?;
        let mut edited = self.current[pos].clone();
        apply(&mut edited);
        let mut next = self.current.as_ref().clone();
        next[pos] = edited;
        self.publish(next);
        Ok(())
    }

    fn position(&self, id: u64) -> PlayerResult<usize> {
        self.current
            .iter()
            .position(|p| p.id == id)
            .ok_or(PlayerError::PlaylistNotFound(id))
    }

    fn publish(&mut self, next: Vec<Playlist>) {
        self.current = Arc::new(next);
        self.publisher.send_replace(Arc::clone(&self.current));
    }

    fn next_id(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.last_id = now.max(self.last_id + 1);
        self.last_id
    }
}

impl Default for PlaylistStore {
    fn default() -> Self {
        Self::new()
    }
}

fn dedup_tracks(mut playlist: Playlist) -> Playlist {
    let mut seen = HashSet::new();
    playlist.tracks.retain(|t| seen.insert(t.id.clone()));
    playlist
}

#[cfg(test)]
mod tests {
    use super::PlaylistStore;
    use playbar_core::{PlayerError, Playlist, Track};

    fn ids(store: &PlaylistStore, id: u64) -> Vec<String> {
        store
            .get(id)
            .unwrap()
            .tracks
            .iter()
            .map(|t| t.id.clone())
            .collect()
    }

    fn with_abc() -> (PlaylistStore, u64) {
        let mut store = PlaylistStore::new();
        let id = store.create("Mix").unwrap().id;
        for t in ["A", "B", "C"] {
            store.add_track(id, Track::new(t, t)).unwrap();
        }
        (store, id)
    }

    #[test]
    fn reorder_moves_track_to_target_index() {
        let (mut store, id) = with_abc();
        store.reorder(id, 0, 2).unwrap();
        assert_eq!(ids(&store, id), vec!["B", "C", "A"]);

        store.reorder(id, 2, 0).unwrap();
        assert_eq!(ids(&store, id), vec!["A", "B", "C"]);
    }

    #[test]
    fn reorder_same_index_is_noop_and_bounds_are_checked() {
        let (mut store, id) = with_abc();
        let before = store.snapshot();
        store.reorder(id, 1, 1).unwrap();
        assert!(std::sync::Arc::ptr_eq(&before, &store.snapshot()));

        assert!(matches!(
            store.reorder(id, 3, 0),
            Err(PlayerError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.reorder(id, 0, 3),
            Err(PlayerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn add_track_is_idempotent_by_id() {
        let (mut store, id) = with_abc();
        assert!(!store.add_track(id, Track::new("B", "B again")).unwrap());
        assert_eq!(ids(&store, id), vec!["A", "B", "C"]);
    }

    #[test]
    fn mutations_leave_earlier_snapshots_untouched() {
        let (mut store, id) = with_abc();
        let before = store.snapshot();
        store.rename(id, "Renamed").unwrap();
        store.reorder(id, 0, 1).unwrap();

        assert_eq!(before[0].name, "Mix");
        assert_eq!(before[0].tracks[0].id, "A");
        assert_eq!(store.get(id).unwrap().name, "Renamed");
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut store = PlaylistStore::new();
        let a = store.create("a").unwrap().id;
        let b = store.create("b").unwrap().id;
        assert!(b > a);
    }

    #[test]
    fn unknown_ids_and_blank_names_are_rejected() {
        let mut store = PlaylistStore::new();
        assert_eq!(store.delete(7), Err(PlayerError::PlaylistNotFound(7)));
        assert_eq!(
            store.add_track(7, Track::new("x", "x")),
            Err(PlayerError::PlaylistNotFound(7))
        );
        assert!(matches!(store.create("   "), Err(PlayerError::InvalidArgument(_))));
    }

    #[test]
    fn set_cover_and_delete() {
        let (mut store, id) = with_abc();
        store.set_cover(id, Some("cover.png".to_string())).unwrap();
        assert_eq!(store.get(id).unwrap().cover(), Some("cover.png"));

        let removed = store.delete(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn replace_all_drops_duplicate_tracks_and_notifies() {
        let mut store = PlaylistStore::new();
        let mut rx = store.subscribe();

        let mut playlist = Playlist::new(5, "Dupes");
        playlist.tracks = vec![Track::new("x", "1"), Track::new("x", "2"), Track::new("y", "3")];
        store.replace_all(vec![playlist]);

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen[0].tracks.len(), 2);
        assert_eq!(seen[0].tracks[0].title, "1");

        let created = store.create("next").unwrap();
        assert!(created.id > 5);
    }
}
