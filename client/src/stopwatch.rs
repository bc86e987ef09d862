/// Round timer over caller-supplied millisecond timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopwatch {
    started_at_ms: i64,
    stopped_at_ms: Option<i64>,
}

impl Stopwatch {
    pub fn started(now_ms: i64) -> Self {
        Self {
            started_at_ms: now_ms,
            stopped_at_ms: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.stopped_at_ms.is_none()
    }

    /// Whole seconds since start, frozen once stopped.
    pub fn elapsed_secs(&self, now_ms: i64) -> i64 {
        let end = self.stopped_at_ms.unwrap_or(now_ms);
        (end - self.started_at_ms).max(0) / 1000
    }

    /// No-op when already stopped.
    pub fn stop(&mut self, now_ms: i64) {
        if self.stopped_at_ms.is_none() {
            self.stopped_at_ms = Some(now_ms);
        }
    }

    pub fn reset(&mut self, now_ms: i64) {
        *self = Self::started(now_ms);
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
