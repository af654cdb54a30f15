use crate::models::GranularSample;

/// Noise thresholds for the altitude channel. GPS altitude is jumpy;
/// these suppress single-sample spikes and sub-meter jitter before the
/// climb totals are summed.
#[derive(Debug, Clone)]
pub struct ElevationConfig {
    /// Per-sample altitude change is clamped to ± this many meters.
    pub clamp_m: f64,
    /// Changes smaller in magnitude than this are treated as noise.
    pub noise_floor_m: f64,
    /// Above this gain per kilometer the altitude channel is unreliable
    /// and the whole session reports zero climb.
    pub max_gain_per_km: f64,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            clamp_m: 5.0,
            noise_floor_m: 0.3,
            max_gain_per_km: 150.0,
        }
    }
}

/// Net climb and descent over one session, both nonnegative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElevationProfile {
    pub gain_m: f64,
    pub loss_m: f64,
}

/// Estimate climb/descent from one session's samples, sorted by time.
/// Degraded input degrades to zero output; this never fails.
pub fn elevation_profile(samples: &[GranularSample], cfg: &ElevationConfig) -> ElevationProfile {
    let mut alt: Vec<Option<f64>> = samples.iter().map(|s| s.altitude_m).collect();
    if alt.iter().all(Option::is_none) {
        return ElevationProfile::default();
    }

    interpolate_gaps(&mut alt);

    let mut gain = 0.0;
    let mut loss = 0.0;
    for w in alt.windows(2) {
        let (Some(a), Some(b)) = (w[0], w[1]) else {
            continue;
        };
        let mut d = (b - a).clamp(-cfg.clamp_m, cfg.clamp_m);
        if d.abs() < cfg.noise_floor_m {
            d = 0.0;
        }
        if d > 0.0 {
            gain += d;
        } else {
            loss -= d;
        }
    }

    // Implausible climb rate signals a broken altitude channel.
    let distance_km = samples
        .iter()
        .rev()
        .find_map(|s| s.distance_m)
        .unwrap_or(1000.0)
        / 1000.0;
    if distance_km > 0.0 && gain / distance_km > cfg.max_gain_per_km {
        return ElevationProfile::default();
    }

    ElevationProfile {
        gain_m: gain,
        loss_m: loss,
    }
}

/// Fill interior gaps linearly between known neighbors. Leading and
/// trailing gaps stay missing and are skipped by the diff pass.
fn interpolate_gaps(alt: &mut [Option<f64>]) {
    let mut last_known: Option<usize> = None;
    for i in 0..alt.len() {
        if alt[i].is_none() {
            continue;
        }
        if let Some(prev) = last_known {
            if i > prev + 1 {
                let a = alt[prev].unwrap_or_default();
                let b = alt[i].unwrap_or_default();
                let span = (i - prev) as f64;
                for (k, slot) in alt[prev + 1..i].iter_mut().enumerate() {
                    let frac = (k + 1) as f64 / span;
                    *slot = Some(a + (b - a) * frac);
                }
            }
        }
        last_known = Some(i);
    }
}
