pub mod clock;

pub use clock::{Clock, SystemClock};

/// Recent physical activity as seen by the phone.
///
/// Implementations are pure queries; whatever sensor plumbing keeps the
/// counters fresh lives outside the glucose pipeline.
pub trait ActivityMonitor {
    /// Steps counted during the last `minutes` minutes.
    fn recent_steps(&self, minutes: u32) -> u32;
    /// Whether the phone registered movement recently.
    fn phone_moved(&self) -> bool;
}

/// Activity source for setups without step counting or motion sensing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoActivity;

impl ActivityMonitor for NoActivity {
    fn recent_steps(&self, _minutes: u32) -> u32 {
        0
    }

    fn phone_moved(&self) -> bool {
        false
    }
}
