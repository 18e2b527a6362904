use playbar_core::{Direction, PlayerError, PlayerResult, Track};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_RESTART_THRESHOLD_SECS: f64 = 10.0;

/// Result of moving through the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The current index moved (possibly onto the same track for a 1-track queue).
    Moved(Track),
    /// Previous was pressed past the restart threshold: seek to zero, keep the index.
    Restart(Track),
}

impl Advance {
    pub fn track(&self) -> &Track {
        match self {
            Advance::Moved(t) | Advance::Restart(t) => t,
        }
    }
}

pub struct QueueManager {
    tracks: Vec<Track>,
    index: usize,
    shuffle: bool,
    restart_threshold: f64,
    rng: StdRng,
}

impl QueueManager {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            tracks: Vec::new(),
            index: 0,
            shuffle: false,
            restart_threshold: DEFAULT_RESTART_THRESHOLD_SECS,
            rng,
        }
    }

    pub fn set_restart_threshold(&mut self, seconds: f64) {
        self.restart_threshold = seconds.max(0.0);
    }

    /// Replaces the whole queue. Nothing changes when the arguments are rejected.
    pub fn load(&mut self, tracks: Vec<Track>, start_index: usize) -> PlayerResult<&Track> {
        if tracks.is_empty() {
            return Err(PlayerError::invalid("cannot queue an empty track list"));
        }
        if start_index >= tracks.len() {
            return Err(PlayerError::invalid(format!(
                "start index {start_index} out of range for {} tracks",
                tracks.len()
            )));
        }
        self.tracks = tracks;
        self.index = start_index;
        Ok(&self.tracks[self.index])
    }

    /// `elapsed` is the transport-reported position of the current track; it
    /// only matters for `Previous`.
    pub fn advance(
        &mut self,
        direction: Direction,
        shuffle: bool,
        elapsed: f64,
    ) -> PlayerResult<Advance> {
        let len = self.tracks.len();
        if len == 0 {
            return Err(PlayerError::EmptyQueue);
        }

        match direction {
            Direction::Next if shuffle => {
                if len > 1 {
                    // draw from len-1 slots and skip over the current one
                    let pick = self.rng.gen_range(0..len - 1);
                    self.index = if pick >= self.index { pick + 1 } else { pick };
                }
            }
            Direction::Next => {
                self.index = (self.index + 1) % len;
            }
            Direction::Previous => {
                if elapsed > self.restart_threshold {
                    return Ok(Advance::Restart(self.tracks[self.index].clone()));
                }
                self.index = (self.index + len - 1) % len;
            }
        }
        Ok(Advance::Moved(self.tracks[self.index].clone()))
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.index)
    }

    pub fn index(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            None
        } else {
            Some(self.index)
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Only affects future `Next` picks; the current track stays put.
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
    }
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}
