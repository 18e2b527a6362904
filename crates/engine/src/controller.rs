use crate::queue::{Advance, QueueManager};
use playbar_core::{Direction, PlaybackState, PlayerError, PlayerResult, Track, TransportState};
use playbar_transport::{TransportCommand, TransportEvent};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportPhase {
    Idle,
    Loading,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSchedule {
    Every(Duration),
    Stopped,
}

#[derive(Debug, Clone)]
pub struct ControllerOutput {
    pub commands: Vec<TransportCommand>,
    pub track_changed: Option<Track>,
    pub poll: PollSchedule,
    pub error: Option<PlayerError>,
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub poll_interval: Duration,
    pub restart_threshold: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            restart_threshold: Duration::from_secs(10),
        }
    }
}

pub struct TransportController {
    cfg: ControllerConfig,
    queue: QueueManager,
    phase: TransportPhase,
    state: TransportState,
    autoplay: bool,
    last_volume: u8,
}

impl TransportController {
    pub fn new(cfg: ControllerConfig) -> Self {
        Self::with_queue(cfg, QueueManager::new())
    }

    pub fn with_queue(cfg: ControllerConfig, mut queue: QueueManager) -> Self {
        queue.set_restart_threshold(cfg.restart_threshold.as_secs_f64());
        Self {
            cfg,
            queue,
            phase: TransportPhase::Idle,
            state: TransportState::default(),
            autoplay: true,
            last_volume: 100,
        }
    }

    pub fn phase(&self) -> TransportPhase {
        self.phase
    }

    pub fn state(&self) -> &TransportState {
        &self.state
    }

    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.queue.current()
    }

    pub fn poll_schedule(&self) -> PollSchedule {
        if self.phase == TransportPhase::Playing {
            PollSchedule::Every(self.cfg.poll_interval)
        } else {
            PollSchedule::Stopped
        }
    }

    /// Replaces the queue and starts loading `tracks[start_index]` with auto-play.
    pub fn load_queue(
        &mut self,
        tracks: Vec<Track>,
        start_index: usize,
    ) -> PlayerResult<ControllerOutput> {
        let track = self.queue.load(tracks, start_index)?.clone();
        info!(track_id = %track.id, queue_len = self.queue.len(), "queue replaced");
        Ok(self.begin_load(track))
    }

    pub fn advance(&mut self, direction: Direction) -> PlayerResult<ControllerOutput> {
        let shuffle = self.queue.shuffle();
        match self
            .queue
            .advance(direction, shuffle, self.state.current_time)?
        {
            Advance::Moved(track) => Ok(self.begin_load(track)),
            Advance::Restart(track) => {
                debug!(track_id = %track.id, "restarting current track");
                self.state.current_time = 0.0;
                Ok(self.output(vec![TransportCommand::Seek(0.0)]))
            }
        }
    }

    pub fn toggle_play(&mut self) -> PlayerResult<ControllerOutput> {
        match self.phase {
            TransportPhase::Playing => {
                self.enter_paused();
                Ok(self.output(vec![TransportCommand::Pause]))
            }
            TransportPhase::Paused => {
                self.enter_playing();
                Ok(self.output(vec![TransportCommand::Play]))
            }
            TransportPhase::Loading => {
                self.autoplay = !self.autoplay;
                debug!(autoplay = self.autoplay, "play intent changed while loading");
                Ok(self.output(Vec::new()))
            }
            TransportPhase::Idle => {
                let track = self.queue.current().cloned().ok_or(PlayerError::EmptyQueue)?;
                Ok(self.begin_load(track))
            }
        }
    }

    /// `fraction` of the known duration, in `[0, 1]`.
    pub fn seek_to(&mut self, fraction: f64) -> PlayerResult<ControllerOutput> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(PlayerError::invalid(format!(
                "seek fraction {fraction} outside [0, 1]"
            )));
        }
        if self.queue.is_empty() {
            return Err(PlayerError::EmptyQueue);
        }
        let seconds = fraction * self.state.duration;
        self.state.current_time = seconds;
        Ok(self.output(vec![TransportCommand::Seek(seconds)]))
    }

    pub fn set_volume(&mut self, volume: u8) -> ControllerOutput {
        let volume = volume.min(100);
        if volume > 0 {
            self.last_volume = volume;
        }
        self.state.volume = volume;
        self.output(vec![TransportCommand::SetVolume(volume)])
    }

    pub fn toggle_mute(&mut self) -> ControllerOutput {
        if self.state.volume > 0 {
            self.last_volume = self.state.volume;
            self.state.volume = 0;
        } else {
            self.state.volume = self.last_volume;
        }
        self.output(vec![TransportCommand::SetVolume(self.state.volume)])
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        let shuffle = !self.queue.shuffle();
        self.queue.set_shuffle(shuffle);
        shuffle
    }

    pub fn on_event(&mut self, event: TransportEvent) -> ControllerOutput {
        match event {
            TransportEvent::Ready { duration } => {
                if self.phase != TransportPhase::Loading {
                    debug!(phase = ?self.phase, "ignoring stale ready event");
                    return self.output(Vec::new());
                }
                self.state.duration = sanitize(duration);
                if self.autoplay {
                    self.enter_playing();
                    self.output(vec![TransportCommand::Play])
                } else {
                    self.enter_paused();
                    self.output(Vec::new())
                }
            }
            TransportEvent::StateChanged(PlaybackState::Playing) => {
                if self.phase == TransportPhase::Paused {
                    self.enter_playing();
                }
                self.output(Vec::new())
            }
            TransportEvent::StateChanged(PlaybackState::Paused) => {
                if self.phase == TransportPhase::Playing {
                    self.enter_paused();
                }
                self.output(Vec::new())
            }
            TransportEvent::StateChanged(PlaybackState::Ended) => {
                if !matches!(self.phase, TransportPhase::Playing | TransportPhase::Paused) {
                    debug!(phase = ?self.phase, "ignoring stale ended event");
                    return self.output(Vec::new());
                }
                let shuffle = self.queue.shuffle();
                match self.queue.advance(Direction::Next, shuffle, 0.0) {
                    Ok(step) => self.begin_load(step.track().clone()),
                    Err(err) => {
                        self.enter_idle();
                        let mut out = self.output(Vec::new());
                        out.error = Some(err);
                        out
                    }
                }
            }
            TransportEvent::Error(message) => {
                warn!(error = %message, "transport reported an error");
                self.enter_idle();
                let mut out = self.output(Vec::new());
                out.error = Some(PlayerError::Transport(message));
                out
            }
        }
    }

    /// Applies a polled position; returns whether it was accepted.
    pub fn on_position(&mut self, seconds: f64) -> bool {
        if self.phase != TransportPhase::Playing {
            return false;
        }
        let mut seconds = sanitize(seconds);
        if self.state.duration > 0.0 {
            seconds = seconds.min(self.state.duration);
        }
        self.state.current_time = seconds;
        true
    }

    pub fn shutdown(&mut self) -> ControllerOutput {
        self.enter_idle();
        self.output(Vec::new())
    }

    fn begin_load(&mut self, track: Track) -> ControllerOutput {
        self.phase = TransportPhase::Loading;
        self.autoplay = true;
        self.state.is_playing = false;
        self.state.current_time = 0.0;
        self.state.duration = track.duration_hint.map(sanitize).unwrap_or(0.0);
        let mut out = self.output(vec![TransportCommand::Load(track.id.clone())]);
        out.track_changed = Some(track);
        out
    }

    fn enter_playing(&mut self) {
        self.phase = TransportPhase::Playing;
        self.state.is_playing = true;
    }

    fn enter_paused(&mut self) {
        self.phase = TransportPhase::Paused;
        self.state.is_playing = false;
    }

    fn enter_idle(&mut self) {
        self.phase = TransportPhase::Idle;
        self.state.is_playing = false;
    }

    fn output(&self, commands: Vec<TransportCommand>) -> ControllerOutput {
        ControllerOutput {
            commands,
            track_changed: None,
            poll: self.poll_schedule(),
            error: None,
        }
    }
}

fn sanitize(seconds: f64) -> f64 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{ControllerConfig, PollSchedule, TransportController, TransportPhase};
    use crate::queue::QueueManager;
    use playbar_core::{Direction, PlaybackState, PlayerError, Track};
    use playbar_transport::{TransportCommand, TransportEvent};
    use std::time::Duration;

    fn controller() -> TransportController {
        TransportController::with_queue(ControllerConfig::default(), QueueManager::with_seed(1))
    }

    fn tracks(n: usize) -> Vec<Track> {
        (0..n)
            .map(|i| Track::new(format!("t{i}"), format!("Track {i}")))
            .collect()
    }

    fn playing(n: usize, start: usize) -> TransportController {
        let mut c = controller();
        c.load_queue(tracks(n), start).unwrap();
        c.on_event(TransportEvent::Ready { duration: 200.0 });
        assert_eq!(c.phase(), TransportPhase::Playing);
        c
    }

    #[test]
    fn load_queue_issues_load_and_plays_on_ready() {
        let mut c = controller();
        let out = c.load_queue(tracks(3), 1).unwrap();
        assert_eq!(out.commands, vec![TransportCommand::Load("t1".to_string())]);
        assert_eq!(out.track_changed.map(|t| t.id), Some("t1".to_string()));
        assert_eq!(out.poll, PollSchedule::Stopped);
        assert_eq!(c.phase(), TransportPhase::Loading);

        let out = c.on_event(TransportEvent::Ready { duration: 180.0 });
        assert_eq!(out.commands, vec![TransportCommand::Play]);
        assert_eq!(out.poll, PollSchedule::Every(Duration::from_millis(250)));
        assert_eq!(c.state().duration, 180.0);
        assert!(c.state().is_playing);
    }

    #[test]
    fn load_queue_rejects_bad_arguments_without_state_change() {
        let mut c = controller();
        assert!(matches!(
            c.load_queue(Vec::new(), 0),
            Err(PlayerError::InvalidArgument(_))
        ));
        assert!(matches!(
            c.load_queue(tracks(2), 2),
            Err(PlayerError::InvalidArgument(_))
        ));
        assert_eq!(c.phase(), TransportPhase::Idle);
    }

    #[test]
    fn toggle_pauses_and_resumes_polling() {
        let mut c = playing(2, 0);
        let out = c.toggle_play().unwrap();
        assert_eq!(out.commands, vec![TransportCommand::Pause]);
        assert_eq!(out.poll, PollSchedule::Stopped);

        let out = c.toggle_play().unwrap();
        assert_eq!(out.commands, vec![TransportCommand::Play]);
        assert!(matches!(out.poll, PollSchedule::Every(_)));
    }

    #[test]
    fn positions_apply_only_while_playing() {
        let mut c = controller();
        assert!(!c.on_position(3.0));

        let mut c = playing(1, 0);
        assert!(c.on_position(12.5));
        assert_eq!(c.state().current_time, 12.5);

        c.on_event(TransportEvent::StateChanged(PlaybackState::Paused));
        assert_eq!(c.poll_schedule(), PollSchedule::Stopped);
        assert!(!c.on_position(40.0));
        assert_eq!(c.state().current_time, 12.5);

        c.on_event(TransportEvent::StateChanged(PlaybackState::Playing));
        assert!(matches!(c.poll_schedule(), PollSchedule::Every(_)));
        assert!(c.on_position(13.0));
    }

    #[test]
    fn previous_restarts_after_threshold_without_reloading() {
        let mut c = playing(3, 1);
        c.on_position(42.0);
        let out = c.advance(Direction::Previous).unwrap();
        assert_eq!(out.commands, vec![TransportCommand::Seek(0.0)]);
        assert!(out.track_changed.is_none());
        assert_eq!(c.phase(), TransportPhase::Playing);
        assert_eq!(c.queue().index(), Some(1));
        assert_eq!(c.state().current_time, 0.0);

        c.on_position(4.0);
        let out = c.advance(Direction::Previous).unwrap();
        assert_eq!(out.commands, vec![TransportCommand::Load("t0".to_string())]);
        assert_eq!(c.phase(), TransportPhase::Loading);
    }

    #[test]
    fn ended_on_single_track_reloads_same_track() {
        let mut c = playing(1, 0);
        let out = c.on_event(TransportEvent::StateChanged(PlaybackState::Ended));
        assert_eq!(out.commands, vec![TransportCommand::Load("t0".to_string())]);
        assert_eq!(c.phase(), TransportPhase::Loading);

        let out = c.on_event(TransportEvent::Ready { duration: 200.0 });
        assert_eq!(out.commands, vec![TransportCommand::Play]);
        assert_eq!(c.phase(), TransportPhase::Playing);
    }

    #[test]
    fn ended_advances_to_next_track() {
        let mut c = playing(3, 2);
        let out = c.on_event(TransportEvent::StateChanged(PlaybackState::Ended));
        assert_eq!(out.track_changed.map(|t| t.id), Some("t0".to_string()));
    }

    #[test]
    fn seek_reflects_time_immediately_and_validates_fraction() {
        let mut c = playing(1, 0);
        let out = c.seek_to(0.25).unwrap();
        assert_eq!(out.commands, vec![TransportCommand::Seek(50.0)]);
        assert_eq!(c.state().current_time, 50.0);

        assert!(matches!(c.seek_to(1.5), Err(PlayerError::InvalidArgument(_))));
        assert!(matches!(c.seek_to(-0.1), Err(PlayerError::InvalidArgument(_))));
        assert!(matches!(c.seek_to(f64::NAN), Err(PlayerError::InvalidArgument(_))));
    }

    #[test]
    fn mute_restores_last_non_zero_volume() {
        let mut c = controller();
        let out = c.toggle_mute();
        assert_eq!(out.commands, vec![TransportCommand::SetVolume(0)]);
        let out = c.toggle_mute();
        assert_eq!(out.commands, vec![TransportCommand::SetVolume(100)]);

        c.set_volume(35);
        c.toggle_mute();
        assert_eq!(c.state().volume, 0);
        c.toggle_mute();
        assert_eq!(c.state().volume, 35);

        c.set_volume(0);
        c.toggle_mute();
        assert_eq!(c.state().volume, 35);
    }

    #[test]
    fn transport_error_returns_to_idle() {
        let mut c = playing(2, 0);
        let out = c.on_event(TransportEvent::Error("video unavailable".to_string()));
        assert_eq!(c.phase(), TransportPhase::Idle);
        assert_eq!(out.poll, PollSchedule::Stopped);
        assert!(matches!(out.error, Some(PlayerError::Transport(_))));

        let out = c.toggle_play().unwrap();
        assert_eq!(out.commands, vec![TransportCommand::Load("t0".to_string())]);
    }

    #[test]
    fn stale_ready_is_ignored() {
        let mut c = playing(2, 0);
        let out = c.on_event(TransportEvent::Ready { duration: 10.0 });
        assert!(out.commands.is_empty());
        assert_eq!(c.state().duration, 200.0);
    }

    #[test]
    fn ended_from_previous_track_does_not_skip_while_loading() {
        let mut c = playing(3, 0);
        c.advance(Direction::Next).unwrap();
        assert_eq!(c.phase(), TransportPhase::Loading);

        let out = c.on_event(TransportEvent::StateChanged(PlaybackState::Ended));
        assert!(out.commands.is_empty());
        assert!(out.track_changed.is_none());
        assert_eq!(c.queue().index(), Some(1));
        assert_eq!(c.phase(), TransportPhase::Loading);

        c.on_event(TransportEvent::Ready { duration: 90.0 });
        assert_eq!(c.phase(), TransportPhase::Playing);
        assert_eq!(c.current_track().map(|t| t.id.as_str()), Some("t1"));
    }

    #[test]
    fn toggle_while_loading_defers_to_paused() {
        let mut c = controller();
        c.load_queue(tracks(1), 0).unwrap();
        c.toggle_play().unwrap();
        let out = c.on_event(TransportEvent::Ready { duration: 60.0 });
        assert!(out.commands.is_empty());
        assert_eq!(c.phase(), TransportPhase::Paused);
    }

    #[test]
    fn empty_queue_actions_report_empty() {
        let mut c = controller();
        assert!(matches!(c.advance(Direction::Next), Err(PlayerError::EmptyQueue)));
        assert!(matches!(c.toggle_play(), Err(PlayerError::EmptyQueue)));
        assert!(matches!(c.seek_to(0.5), Err(PlayerError::EmptyQueue)));
    }

    #[test]
    fn shutdown_stops_polling() {
        let mut c = playing(1, 0);
        let out = c.shutdown();
        assert_eq!(out.poll, PollSchedule::Stopped);
        assert_eq!(c.phase(), TransportPhase::Idle);
    }
}
