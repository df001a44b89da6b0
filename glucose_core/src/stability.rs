//! How long glucose has stayed inside a narrow band around its running mean.

use crate::config::StabilityCfg;
use crate::types::Reading;
use crate::util::whole_minutes_between;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StabilityWindow {
    /// Age of the oldest accepted sample (whole minutes).
    pub minutes: f64,
    /// Running mean over the accepted samples (mg/dL).
    pub average: f64,
}

/// Walk newest-first `data` backwards and extend the run while each sample
/// stays strictly inside `average * (1 ± band)`.
///
/// The run ends at the first out-of-band sample, or when the next usable
/// sample is more than `max_gap_min` minutes older than the last accepted one.
pub fn stability_window(data: &[Reading], cfg: &StabilityCfg) -> StabilityWindow {
    let Some(now) = data.first() else {
        return StabilityWindow::default();
    };

    let mut sum = now.recalculated;
    let mut average = sum;
    let mut accepted = 1usize;
    let mut minutes: i64 = 0;

    for then in data.iter().skip(1).filter(|r| r.is_usable()) {
        let age = whole_minutes_between(now.timestamp, then.timestamp);
        if age - minutes > cfg.max_gap_min {
            break;
        }
        let lo = average * (1.0 - cfg.band);
        let hi = average * (1.0 + cfg.band);
        if then.recalculated > lo && then.recalculated < hi {
            sum += then.recalculated;
            accepted += 1;
            average = sum / accepted as f64;
            minutes = age;
        } else {
            break;
        }
    }

    StabilityWindow {
        minutes: minutes as f64,
        average,
    }
}
