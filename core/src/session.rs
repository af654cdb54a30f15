use std::collections::HashMap;

use crate::models::{GranularSample, SessionSummary};

/// Canonical race distances used to bucket sessions for prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaceTarget {
    FiveK,
    TenK,
    HalfMarathon,
    Marathon,
}

impl RaceTarget {
    pub const ALL: [RaceTarget; 4] = [
        RaceTarget::FiveK,
        RaceTarget::TenK,
        RaceTarget::HalfMarathon,
        RaceTarget::Marathon,
    ];

    pub fn distance_km(self) -> f64 {
        match self {
            RaceTarget::FiveK => 5.0,
            RaceTarget::TenK => 10.0,
            RaceTarget::HalfMarathon => 21.0975,
            RaceTarget::Marathon => 42.195,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RaceTarget::FiveK => "5K",
            RaceTarget::TenK => "10K",
            RaceTarget::HalfMarathon => "21K",
            RaceTarget::Marathon => "42K",
        }
    }
}

/// Band half-width around each target, as a fraction of the distance.
pub const TARGET_TOLERANCE: f64 = 0.10;

/// Fold granular samples into one summary row per session, keyed by
/// session id and ordered by first appearance. Pace is left undefined
/// for zero-distance sessions; callers must not divide through it.
pub fn session_summaries(granular: &[GranularSample]) -> Vec<SessionSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&GranularSample>> = HashMap::new();
    for s in granular {
        groups
            .entry(s.session_id.as_str())
            .or_insert_with(|| {
                order.push(s.session_id.as_str());
                Vec::new()
            })
            .push(s);
    }

    let mut out = Vec::with_capacity(order.len());
    for id in order {
        let mut samples = groups.remove(id).unwrap_or_default();
        if samples.is_empty() {
            continue;
        }
        samples.sort_by_key(|s| s.timestamp);

        let start = samples[0].timestamp;
        let distance_km = samples
            .iter()
            .rev()
            .find_map(|s| s.distance_m)
            .unwrap_or(0.0)
            / 1000.0;
        let duration_min = samples[samples.len() - 1].elapsed_s / 60.0;
        let pace_min_km = if distance_km > 0.0 {
            Some(duration_min / distance_km)
        } else {
            None
        };

        out.push(SessionSummary {
            session_id: id.to_string(),
            start,
            distance_km,
            duration_min,
            pace_min_km,
        });
    }
    out
}

/// True when a session's distance falls within the target's ±10 % band.
pub fn within_target_band(distance_km: f64, target: RaceTarget) -> bool {
    let d = target.distance_km();
    distance_km >= d * (1.0 - TARGET_TOLERANCE) && distance_km <= d * (1.0 + TARGET_TOLERANCE)
}

/// Sessions close enough to the target distance to inform its forecast.
pub fn target_subset(summaries: &[SessionSummary], target: RaceTarget) -> Vec<SessionSummary> {
    summaries
        .iter()
        .filter(|s| within_target_band(s.distance_km, target))
        .cloned()
        .collect()
}

/// All four race-distance subsets. Bands may overlap, so a session can
/// appear in more than one subset (or in none).
pub fn race_subsets(summaries: &[SessionSummary]) -> Vec<(RaceTarget, Vec<SessionSummary>)> {
    RaceTarget::ALL
        .iter()
        .map(|&t| (t, target_subset(summaries, t)))
        .collect()
}
