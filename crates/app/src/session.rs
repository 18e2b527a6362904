use crate::poll::{PollTimer, TickSender};
use playbar_core::{Direction, PlayerError, PlayerResult, Track};
use playbar_engine::{ControllerOutput, TransportController};
use playbar_transport::{dispatch, TransportAdapter, TransportEvent};
use tracing::{debug, warn};

/// What the shell needs to surface after a controller step.
#[derive(Debug, Default, PartialEq)]
pub struct SessionUpdate {
    pub track_changed: Option<Track>,
    pub error: Option<PlayerError>,
}

/// Binds the controller to a live adapter and the poll timer.
pub struct PlaybackSession {
    controller: TransportController,
    adapter: Box<dyn TransportAdapter>,
    timer: PollTimer,
}

impl PlaybackSession {
    pub fn new(
        controller: TransportController,
        adapter: Box<dyn TransportAdapter>,
        ticks: TickSender,
    ) -> Self {
        Self {
            controller,
            adapter,
            timer: PollTimer::new(ticks),
        }
    }

    pub fn controller(&self) -> &TransportController {
        &self.controller
    }

    pub fn adapter_name(&self) -> &'static str {
        self.adapter.name()
    }

    pub fn is_polling(&self) -> bool {
        self.timer.is_running()
    }

    pub async fn load_queue(
        &mut self,
        tracks: Vec<Track>,
        start_index: usize,
    ) -> PlayerResult<SessionUpdate> {
        let out = self.controller.load_queue(tracks, start_index)?;
        Ok(self.apply(out).await)
    }

    pub async fn advance(&mut self, direction: Direction) -> PlayerResult<SessionUpdate> {
        let out = self.controller.advance(direction)?;
        Ok(self.apply(out).await)
    }

    pub async fn toggle_play(&mut self) -> PlayerResult<SessionUpdate> {
        let out = self.controller.toggle_play()?;
        Ok(self.apply(out).await)
    }

    pub async fn seek_to(&mut self, fraction: f64) -> PlayerResult<SessionUpdate> {
        let out = self.controller.seek_to(fraction)?;
        Ok(self.apply(out).await)
    }

    pub async fn set_volume(&mut self, volume: u8) -> SessionUpdate {
        let out = self.controller.set_volume(volume);
        self.apply(out).await
    }

    pub async fn toggle_mute(&mut self) -> SessionUpdate {
        let out = self.controller.toggle_mute();
        self.apply(out).await
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.controller.toggle_shuffle()
    }

    pub async fn handle_event(&mut self, event: TransportEvent) -> SessionUpdate {
        debug!(?event, "transport event");
        let out = self.controller.on_event(event);
        self.apply(out).await
    }

    /// Samples the adapter position for a tick of the live poll generation.
    pub async fn handle_tick(&mut self, generation: u64) -> bool {
        if !self.timer.is_current(generation) {
            return false;
        }
        match self.adapter.current_time().await {
            Ok(seconds) => self.controller.on_position(seconds),
            Err(err) => {
                debug!(error = %err, "position sample failed");
                false
            }
        }
    }

    pub fn shutdown(&mut self) {
        let out = self.controller.shutdown();
        self.timer.apply(out.poll);
    }

    async fn apply(&mut self, out: ControllerOutput) -> SessionUpdate {
        let mut update = SessionUpdate {
            track_changed: out.track_changed,
            error: out.error,
        };
        let mut poll = out.poll;
        for command in &out.commands {
            if let Err(err) = dispatch(self.adapter.as_mut(), command).await {
                warn!(adapter = self.adapter.name(), ?command, error = %err, "transport command failed");
                let failed = self
                    .controller
                    .on_event(TransportEvent::Error(format!("{err:#}")));
                poll = failed.poll;
                update.error = failed.error;
                break;
            }
        }
        self.timer.apply(poll);
        update
    }
}
