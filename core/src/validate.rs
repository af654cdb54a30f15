use chrono::{DateTime, Utc};

/// Sampling-steadiness gate. Paused or resumed recordings leave large
/// timestamp gaps that would corrupt pace and elevation figures, so a
/// session only passes when long gaps stay below a small tolerance.
#[derive(Debug, Clone)]
pub struct SteadinessConfig {
    /// A delta above this many seconds counts as a long gap.
    pub max_gap_s: f64,
    /// Accepted share of long gaps, in percent.
    pub tolerance_pct: f64,
}

impl Default for SteadinessConfig {
    fn default() -> Self {
        Self {
            max_gap_s: 16.0,
            tolerance_pct: 5.0,
        }
    }
}

/// True when the share of consecutive deltas above `max_gap_s` is within
/// tolerance. Timestamps must be sorted; sessions with fewer than two
/// samples are rejected outright.
pub fn is_steady_session(timestamps: &[DateTime<Utc>], cfg: &SteadinessConfig) -> bool {
    if timestamps.len() < 2 {
        return false;
    }

    let total = timestamps.len() - 1;
    let long_gaps = timestamps
        .windows(2)
        .filter(|w| {
            let delta_s = (w[1] - w[0]).num_milliseconds() as f64 / 1000.0;
            delta_s > cfg.max_gap_s
        })
        .count();

    let pct_long = (long_gaps as f64 / total as f64) * 100.0;
    pct_long <= cfg.tolerance_pct
}
