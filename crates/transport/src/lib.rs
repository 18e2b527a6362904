use anyhow::Result;
use async_trait::async_trait;
use playbar_core::{PlaybackState, SimulatedConfig};
use tokio::sync::mpsc;
use tracing::warn;

mod simulated;

pub use simulated::SimulatedTransport;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Ready { duration: f64 },
    StateChanged(PlaybackState),
    Error(String),
}

pub type EventSender = mpsc::UnboundedSender<TransportEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCommand {
    Load(String),
    Play,
    Pause,
    Seek(f64),
    SetVolume(u8),
}

/// Command side of an embedded player. Completion of a command says nothing
/// about player state; state arrives later as a [`TransportEvent`].
#[async_trait]
pub trait TransportAdapter: Send {
    fn name(&self) -> &'static str;
    async fn load(&mut self, track_id: &str) -> Result<()>;
    async fn play(&mut self) -> Result<()>;
    async fn pause(&mut self) -> Result<()>;
    async fn seek(&mut self, seconds: f64) -> Result<()>;
    async fn set_volume(&mut self, volume: u8) -> Result<()>;
    async fn current_time(&mut self) -> Result<f64>;
}

pub async fn dispatch(adapter: &mut dyn TransportAdapter, command: &TransportCommand) -> Result<()> {
    match command {
        TransportCommand::Load(id) => adapter.load(id).await,
        TransportCommand::Play => adapter.play().await,
        TransportCommand::Pause => adapter.pause().await,
        TransportCommand::Seek(seconds) => adapter.seek(*seconds).await,
        TransportCommand::SetVolume(volume) => adapter.set_volume(*volume).await,
    }
}

pub fn build_transport(
    kind: &str,
    events: EventSender,
    cfg: &SimulatedConfig,
) -> Box<dyn TransportAdapter> {
    match kind {
        "simulated" => Box::new(SimulatedTransport::new(events, cfg)),
        "null" => Box::new(NullTransport::new(events)),
        other => {
            warn!(kind = other, "unknown transport kind; falling back to null transport");
            Box::new(NullTransport::new(events))
        }
    }
}

pub struct NullTransport {
    events: EventSender,
}

impl NullTransport {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

#[async_trait]
impl TransportAdapter for NullTransport {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn load(&mut self, _track_id: &str) -> Result<()> {
        let _ = self.events.send(TransportEvent::Error(
            "no playback transport configured".to_string(),
        ));
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    async fn seek(&mut self, _seconds: f64) -> Result<()> {
        Ok(())
    }

    async fn set_volume(&mut self, _volume: u8) -> Result<()> {
        Ok(())
    }

    async fn current_time(&mut self) -> Result<f64> {
        Ok(0.0)
    }
}
