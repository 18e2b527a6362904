use crate::{EventSender, TransportAdapter, TransportEvent};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use playbar_core::{PlaybackState, SimulatedConfig};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// In-process stand-in for the embedded player. Every track lasts
/// `track_secs`; position follows the tokio clock while playing.
pub struct SimulatedTransport {
    events: EventSender,
    duration: f64,
    load_latency: Duration,
    loaded: Option<String>,
    base_position: f64,
    playing_since: Option<Instant>,
    volume: u8,
    ready_task: Option<JoinHandle<()>>,
    end_task: Option<JoinHandle<()>>,
}

impl SimulatedTransport {
    pub fn new(events: EventSender, cfg: &SimulatedConfig) -> Self {
        Self {
            events,
            duration: cfg.track_secs as f64,
            load_latency: Duration::from_millis(cfg.load_latency_ms),
            loaded: None,
            base_position: 0.0,
            playing_since: None,
            volume: 100,
            ready_task: None,
            end_task: None,
        }
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    fn position(&self) -> f64 {
        let running = self
            .playing_since
            .map(|since| since.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.base_position + running).min(self.duration)
    }

    fn cancel_end(&mut self) {
        if let Some(task) = self.end_task.take() {
            task.abort();
        }
    }

    fn schedule_end(&mut self) {
        self.cancel_end();
        let remaining = Duration::from_secs_f64((self.duration - self.position()).max(0.0));
        let events = self.events.clone();
        self.end_task = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let _ = events.send(TransportEvent::StateChanged(PlaybackState::Ended));
        }));
    }
}

#[async_trait]
impl TransportAdapter for SimulatedTransport {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn load(&mut self, track_id: &str) -> Result<()> {
        if let Some(task) = self.ready_task.take() {
            task.abort();
        }
        self.cancel_end();
        self.loaded = Some(track_id.to_string());
        self.base_position = 0.0;
        self.playing_since = None;

        let events = self.events.clone();
        let latency = self.load_latency;
        let duration = self.duration;
        self.ready_task = Some(tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            let _ = events.send(TransportEvent::Ready { duration });
        }));
        debug!(track_id, "simulated transport loading");
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        if self.loaded.is_none() {
            return Err(anyhow!("nothing loaded"));
        }
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
            self.schedule_end();
            let _ = self
                .events
                .send(TransportEvent::StateChanged(PlaybackState::Playing));
        }
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        if self.playing_since.is_some() {
            self.base_position = self.position();
            self.playing_since = None;
            self.cancel_end();
            let _ = self
                .events
                .send(TransportEvent::StateChanged(PlaybackState::Paused));
        }
        Ok(())
    }

    async fn seek(&mut self, seconds: f64) -> Result<()> {
        self.base_position = seconds.clamp(0.0, self.duration);
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
            self.schedule_end();
        }
        Ok(())
    }

    async fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.volume = volume.min(100);
        Ok(())
    }

    async fn current_time(&mut self) -> Result<f64> {
        Ok(self.position())
    }
}

impl Drop for SimulatedTransport {
    fn drop(&mut self) {
        if let Some(task) = self.ready_task.take() {
            task.abort();
        }
        self.cancel_end();
    }
}

#[cfg(test)]
mod tests {
    use super::SimulatedTransport;
    use crate::{event_channel, TransportAdapter, TransportEvent};
    use playbar_core::{PlaybackState, SimulatedConfig};
    use std::time::Duration;

    fn cfg() -> SimulatedConfig {
        SimulatedConfig {
            track_secs: 30,
            load_latency_ms: 100,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reports_ready_then_tracks_position_while_playing() {
        let (tx, mut rx) = event_channel();
        let mut player = SimulatedTransport::new(tx, &cfg());

        player.load("a").await.unwrap();
        assert_eq!(rx.recv().await, Some(TransportEvent::Ready { duration: 30.0 }));

        player.play().await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(TransportEvent::StateChanged(PlaybackState::Playing))
        );

        tokio::time::advance(Duration::from_secs(10)).await;
        let t = player.current_time().await.unwrap();
        assert!((t - 10.0).abs() < 1e-6);

        player.pause().await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        let t = player.current_time().await.unwrap();
        assert!((t - 10.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_ended_when_position_reaches_duration() {
        let (tx, mut rx) = event_channel();
        let mut player = SimulatedTransport::new(tx, &cfg());

        player.load("a").await.unwrap();
        let _ready = rx.recv().await;
        player.seek(28.0).await.unwrap();
        player.play().await.unwrap();
        let _playing = rx.recv().await;

        assert_eq!(
            rx.recv().await,
            Some(TransportEvent::StateChanged(PlaybackState::Ended))
        );
        assert!((player.current_time().await.unwrap() - 30.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn reload_cancels_pending_ready() {
        let (tx, mut rx) = event_channel();
        let mut player = SimulatedTransport::new(tx, &cfg());

        player.load("a").await.unwrap();
        player.load("b").await.unwrap();
        assert!(matches!(rx.recv().await, Some(TransportEvent::Ready { .. })));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn play_without_load_is_an_error() {
        let (tx, _rx) = event_channel();
        let mut player = SimulatedTransport::new(tx, &cfg());
        assert!(player.play().await.is_err());
        player.set_volume(140).await.unwrap();
        assert_eq!(player.volume(), 100);
    }
}
