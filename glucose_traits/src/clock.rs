use std::time::{SystemTime, UNIX_EPOCH};

/// Wall clock abstraction in epoch milliseconds.
///
/// - now_ms(): current time as milliseconds since the Unix epoch
/// - ms_since(): helper to compute elapsed milliseconds from an earlier timestamp
pub trait Clock {
    fn now_ms(&self) -> i64;

    /// Milliseconds elapsed since `epoch_ms`, saturating at 0 for future timestamps.
    fn ms_since(&self, epoch_ms: i64) -> i64 {
        self.now_ms().saturating_sub(epoch_ms).max(0)
    }
}

/// Default clock backed by `std::time::SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}
