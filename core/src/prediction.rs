use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveDateTime;
use log::{info, warn};
use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use regex::Regex;

use crate::elevation::{elevation_profile, ElevationConfig};
use crate::models::{GranularSample, PaceInterval, PositionStat, PredictionResult, SessionSummary};

/// Pace degradation per meter of mean climb: 1.5 % per 1000 m.
pub const CLIMB_PENALTY_PER_M: f64 = 0.015 / 1000.0;

/// The opening split closes at the first sample past this many meters.
const OPENING_SPLIT_M: f64 = 100.0;
/// A trailing remainder shorter than this is folded into the last split.
const MIN_CLOSING_M: f64 = 50.0;

/// Why a forecast could not be produced. These are expected input
/// shapes, reported as data rather than raised as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsufficientData {
    /// No sessions fall inside the target's distance band.
    NoSessions,
    /// Contributing sessions all lack a defined pace.
    NoPace,
    /// No per-kilometer splits could be reconstructed.
    NoIntervals,
}

impl fmt::Display for InsufficientData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSessions => write!(f, "no sessions available for this distance"),
            Self::NoPace => write!(f, "no session in the subset has a defined pace"),
            Self::NoIntervals => write!(f, "could not reconstruct per-kilometer paces"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PredictionOutcome {
    Forecast(PredictionResult),
    Insufficient(InsufficientData),
}

/// Forecast completion time for `target_km` from the sessions in its
/// distance band, adjusted for their mean elevation gain.
pub fn predict(
    target_km: f64,
    subset: &[SessionSummary],
    granular: &[GranularSample],
    elev_cfg: &ElevationConfig,
) -> PredictionOutcome {
    if subset.is_empty() {
        return PredictionOutcome::Insufficient(InsufficientData::NoSessions);
    }

    let by_session = group_by_session(granular);

    // Per-session climb. A missing granular match yields no estimate and
    // drops out of the mean; a flat or altitude-less session counts as 0.
    let mut gains: Vec<Option<f64>> = Vec::with_capacity(subset.len());
    for s in subset {
        match by_session.get(s.session_id.as_str()) {
            Some(samples) => gains.push(Some(elevation_profile(samples, elev_cfg).gain_m)),
            None => {
                warn!("no granular samples for session {}", s.session_id);
                gains.push(None);
            }
        }
    }

    let paces: Vec<f64> = subset.iter().filter_map(|s| s.pace_min_km).collect();
    if paces.is_empty() {
        return PredictionOutcome::Insufficient(InsufficientData::NoPace);
    }
    let baseline = paces.iter().sum::<f64>() / paces.len() as f64;

    let known_gains: Vec<f64> = gains.iter().flatten().copied().collect();
    let mean_gain = if known_gains.is_empty() {
        0.0
    } else {
        known_gains.iter().sum::<f64>() / known_gains.len() as f64
    };

    let adjusted = baseline * (1.0 + mean_gain * CLIMB_PENALTY_PER_M);
    let estimated = target_km * adjusted;

    let mut intervals = Vec::new();
    for s in subset {
        if let Some(samples) = by_session.get(s.session_id.as_str()) {
            intervals.extend(pace_intervals(&s.session_id, samples));
        }
    }
    if intervals.is_empty() {
        return PredictionOutcome::Insufficient(InsufficientData::NoIntervals);
    }

    // The trend series stops where the evidence does: never beyond the
    // longest contributing session, never beyond the target.
    let max_position = intervals
        .iter()
        .map(|i| i.position_km)
        .fold(f64::NEG_INFINITY, f64::max);
    let by_position = aggregate_positions(&intervals, target_km.min(max_position));

    info!(
        "{} sessions -> {} splits; adjusted pace {:.2} min/km for {:.1} km",
        subset.len(),
        intervals.len(),
        adjusted,
        target_km
    );

    PredictionOutcome::Forecast(PredictionResult {
        target_km,
        sessions_used: subset.len(),
        baseline_pace_min_km: baseline,
        mean_gain_m: mean_gain,
        adjusted_pace_min_km: adjusted,
        estimated_min: estimated,
        intervals,
        by_position,
    })
}

/// Reconstruct one session's splits from its cumulative samples: an
/// opening ~100 m split, one split per completed kilometer boundary, and
/// a closing partial split when at least 50 m remain.
pub fn pace_intervals(session_id: &str, samples: &[GranularSample]) -> Vec<PaceInterval> {
    let track: Vec<(f64, f64)> = samples
        .iter()
        .filter_map(|s| s.distance_m.map(|d| (d, s.elapsed_s)))
        .collect();
    if track.len() < 2 {
        return Vec::new();
    }

    let date = date_from_session_id(session_id).map(|dt| dt.date());
    let total_km = track[track.len() - 1].0 / 1000.0;
    let mut out = Vec::new();
    let mut prev_t = 0.0;
    let mut last_idx = 0usize;

    // Opening split.
    if let Some(idx) = track.iter().position(|&(d, _)| d >= OPENING_SPLIT_M) {
        let seg_d = track[idx].0 - track[0].0;
        if seg_d > 0.0 {
            out.push(PaceInterval {
                session_id: session_id.to_string(),
                date,
                position_km: 0.1,
                pace_min_km: pace_of(track[idx].1 - prev_t, seg_d),
                closing_split: false,
            });
            prev_t = track[idx].1;
            last_idx = idx;
        }
    }

    // One split per completed kilometer boundary. Boundaries already
    // covered by an earlier split are skipped.
    for km in 1..=total_km.floor() as usize {
        let Some(idx) = track.iter().position(|&(d, _)| d >= km as f64 * 1000.0) else {
            continue;
        };
        if idx <= last_idx {
            continue;
        }
        let seg_d = track[idx].0 - track[last_idx].0;
        if seg_d <= 0.0 {
            continue;
        }
        out.push(PaceInterval {
            session_id: session_id.to_string(),
            date,
            position_km: km as f64,
            pace_min_km: pace_of(track[idx].1 - prev_t, seg_d),
            closing_split: false,
        });
        prev_t = track[idx].1;
        last_idx = idx;
    }

    // Closing partial split: the session's true tail.
    let remaining = track[track.len() - 1].0 - track[last_idx].0;
    if remaining >= MIN_CLOSING_M {
        out.push(PaceInterval {
            session_id: session_id.to_string(),
            date,
            position_km: total_km,
            pace_min_km: pace_of(track[track.len() - 1].1 - prev_t, remaining),
            closing_split: true,
        });
    }

    out
}

/// Km position after the display rounding rule: whole kilometers except
/// the closing split and the short opening burst, which stay fractional.
pub fn rounded_position(interval: &PaceInterval) -> f64 {
    if interval.closing_split || interval.position_km <= 0.2 {
        interval.position_km
    } else {
        interval.position_km.round()
    }
}

/// Mean ± sample std of split pace per rounded position, up to `limit`.
pub fn aggregate_positions(intervals: &[PaceInterval], limit: f64) -> Vec<PositionStat> {
    let mut buckets: BTreeMap<OrderedFloat<f64>, Vec<f64>> = BTreeMap::new();
    for i in intervals {
        let pos = rounded_position(i);
        if pos <= limit {
            buckets.entry(OrderedFloat(pos)).or_default().push(i.pace_min_km);
        }
    }

    buckets
        .into_iter()
        .map(|(pos, paces)| {
            let n = paces.len() as f64;
            let mean = paces.iter().sum::<f64>() / n;
            let std = if paces.len() > 1 {
                let var = paces.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
                Some(var.sqrt())
            } else {
                None
            };
            PositionStat {
                position_km: pos.into_inner(),
                mean_pace_min_km: mean,
                std_pace_min_km: std,
            }
        })
        .collect()
}

/// Session file stems embed a `YYYY-MM-DD_HH-MM-SS-UTC` stamp.
pub fn date_from_session_id(session_id: &str) -> Option<NaiveDateTime> {
    static STAMP: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2})-UTC").unwrap());
    let m = STAMP.captures(session_id)?;
    NaiveDateTime::parse_from_str(&m[1], "%Y-%m-%d_%H-%M-%S").ok()
}

fn pace_of(seg_t_s: f64, seg_d_m: f64) -> f64 {
    (seg_t_s / seg_d_m) * 1000.0 / 60.0
}

fn group_by_session(granular: &[GranularSample]) -> HashMap<&str, Vec<GranularSample>> {
    let mut map: HashMap<&str, Vec<GranularSample>> = HashMap::new();
    for s in granular {
        map.entry(s.session_id.as_str()).or_default().push(s.clone());
    }
    for samples in map.values_mut() {
        samples.sort_by_key(|s| s.timestamp);
    }
    map
}
