use playbar_engine::PollSchedule;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub type TickSender = mpsc::UnboundedSender<u64>;

/// Position-polling timer. At most one ticking task exists; each tick carries
/// the generation it was started under so ticks queued before a cancel can be
/// told apart from live ones.
pub struct PollTimer {
    ticks: TickSender,
    task: Option<JoinHandle<()>>,
    interval: Option<Duration>,
    generation: u64,
}

impl PollTimer {
    pub fn new(ticks: TickSender) -> Self {
        Self {
            ticks,
            task: None,
            interval: None,
            generation: 0,
        }
    }

    pub fn apply(&mut self, schedule: PollSchedule) {
        match schedule {
            PollSchedule::Every(every) => {
                if self.task.is_some() && self.interval == Some(every) {
                    return;
                }
                self.start(every);
            }
            PollSchedule::Stopped => self.cancel(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.task.is_some() && generation == self.generation
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.interval = None;
        self.generation += 1;
    }

    fn start(&mut self, every: Duration) {
        self.cancel();
        let generation = self.generation;
        let ticks = self.ticks.clone();
        self.interval = Some(every);
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                // first tick completes immediately
                interval.tick().await;
                if ticks.send(generation).is_err() {
                    break;
                }
            }
        }));
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::PollTimer;
    use playbar_engine::PollSchedule;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn ticks_while_running_and_goes_quiet_after_cancel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = PollTimer::new(tx);

        timer.apply(PollSchedule::Every(Duration::from_millis(250)));
        let generation = rx.recv().await.unwrap();
        assert!(timer.is_current(generation));
        assert_eq!(rx.recv().await, Some(generation));

        timer.apply(PollSchedule::Stopped);
        assert!(!timer.is_running());
        assert!(!timer.is_current(generation));

        tokio::time::advance(Duration::from_secs(2)).await;
        while let Ok(stale) = rx.try_recv() {
            assert!(!timer.is_current(stale));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restart_uses_a_new_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = PollTimer::new(tx);

        timer.apply(PollSchedule::Every(Duration::from_millis(250)));
        let first = rx.recv().await.unwrap();
        timer.apply(PollSchedule::Stopped);
        timer.apply(PollSchedule::Every(Duration::from_millis(250)));

        let mut next = rx.recv().await.unwrap();
        while next == first {
            next = rx.recv().await.unwrap();
        }
        assert!(timer.is_current(next));
    }

    #[tokio::test]
    async fn same_interval_keeps_existing_task() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut timer = PollTimer::new(tx);
        timer.apply(PollSchedule::Every(Duration::from_millis(100)));
        let before = timer.generation;
        timer.apply(PollSchedule::Every(Duration::from_millis(100)));
        assert_eq!(before, timer.generation);
    }

    #[tokio::test]
    async fn drop_aborts_the_task() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        {
            let mut timer = PollTimer::new(tx);
            timer.apply(PollSchedule::Every(Duration::from_millis(5)));
        }
        // sender lives in the aborted task only, so the channel closes
        while rx.recv().await.is_some() {}
    }
}
