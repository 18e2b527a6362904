use playbar_core::AppConfig;
use std::time::Duration;

mod controller;
mod gate;
mod queue;

pub use controller::{
    ControllerConfig, ControllerOutput, PollSchedule, TransportController, TransportPhase,
};
pub use gate::RequestGate;
pub use queue::{Advance, QueueManager};

impl ControllerConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(cfg.intervals.position_poll_ms.max(10)),
            restart_threshold: Duration::from_millis(cfg.intervals.restart_threshold_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ControllerConfig;
    use playbar_core::AppConfig;
    use std::time::Duration;

    #[test]
    fn config_converts_millisecond_intervals() {
        let mut app = AppConfig::default();
        app.intervals.position_poll_ms = 0;
        let cfg = ControllerConfig::from_app_config(&app);
        assert_eq!(cfg.poll_interval, Duration::from_millis(10));
        assert_eq!(cfg.restart_threshold, Duration::from_secs(10));
    }
}
