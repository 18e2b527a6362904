/// Hands out monotonically increasing tokens; only the newest one is current.
/// Results that come back carrying an older token belong to a superseded
/// request and should be dropped.
#[derive(Debug, Default)]
pub struct RequestGate {
    latest: u64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.latest
    }

    /// Invalidates every outstanding token.
    pub fn cancel(&mut self) {
        self.latest += 1;
    }
}
