use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::archive::{MAX_SESSION_AGE_DAYS, MIN_SESSION_DISTANCE_M};
use crate::cluster::ClusterAnalysis;
use crate::models::{PredictionResult, SessionSummary};
use crate::validate::SteadinessConfig;

/// Decimal minutes as `m:ss` (5.25 -> "5:15").
pub fn format_pace(pace_min: f64) -> String {
    let total_s = (pace_min * 60.0).round() as i64;
    format!("{}:{:02}", total_s / 60, total_s % 60)
}

/// Decimal minutes as `h:mm:ss`.
pub fn format_hms(minutes: f64) -> String {
    let total_s = (minutes * 60.0).round() as i64;
    format!(
        "{}:{:02}:{:02}",
        total_s / 3600,
        (total_s % 3600) / 60,
        total_s % 60
    )
}

/// One line per cluster for the report and the question-answering
/// context.
pub fn cluster_digest(analysis: &ClusterAnalysis) -> String {
    if analysis.clusters.is_empty() {
        return "Training-type summary: no clusters with data.".to_string();
    }
    let mut lines = vec!["Training-type summary:".to_string()];
    for c in &analysis.clusters {
        lines.push(format!(
            "Cluster '{}': {} sessions, mean distance {:.1} km, mean pace {:.2} min/km.",
            c.label, c.sessions, c.mean_distance_km, c.mean_pace_min_km
        ));
    }
    lines.join("\n")
}

/// Distance covered per year and over the trailing twelve months, with
/// cumulative totals and the most/least active month.
pub fn monthly_distance_digest(summaries: &[SessionSummary], today: NaiveDate) -> String {
    if summaries.is_empty() {
        return "No sessions with dates available.".to_string();
    }

    let mut per_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    let mut per_month: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
    for s in summaries {
        let d = s.start.date();
        let y = per_year.entry(d.year()).or_default();
        y.0 += s.distance_km;
        y.1 += 1;
        let m = per_month.entry((d.year(), d.month())).or_default();
        m.0 += s.distance_km;
        m.1 += 1;
    }

    let mut lines = vec!["Annual summary:".to_string()];
    for (year, (km, sessions)) in &per_year {
        lines.push(format!("- {year}: {:.1} km ({sessions} sessions)", km));
    }

    let months = trailing_months(today, 12);
    lines.push(String::new());
    lines.push("Kilometers per month:".to_string());
    let mut cumulative = 0.0;
    let mut rows: Vec<((i32, u32), f64)> = Vec::with_capacity(months.len());
    for &(y, m) in &months {
        let (km, sessions) = per_month.get(&(y, m)).copied().unwrap_or((0.0, 0));
        cumulative += km;
        rows.push(((y, m), km));
        let label = if sessions == 1 { "session" } else { "sessions" };
        lines.push(format!(
            "- {y}-{m:02}: {km:.1} km ({sessions} {label}, cumulative: {cumulative:.1} km)"
        ));
    }

    let ((by, bm), best) = rows
        .iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .copied()
        .unwrap_or(((today.year(), today.month()), 0.0));
    lines.push(String::new());
    lines.push(format!("Most active month: {by}-{bm:02} ({best:.1} km)"));

    let empty: Vec<String> = rows
        .iter()
        .filter(|(_, km)| *km == 0.0)
        .map(|((y, m), _)| format!("{y}-{m:02}"))
        .collect();
    if empty.is_empty() {
        if let Some(((wy, wm), worst)) = rows.iter().min_by(|a, b| a.1.total_cmp(&b.1)).copied() {
            lines.push(format!("Least active month: {wy}-{wm:02} ({worst:.1} km)"));
        }
    } else {
        lines.push(format!("Least active month: {} (0.0 km)", empty.join(", ")));
    }

    lines.join("\n")
}

/// Plain-language statistics over the whole summary table.
pub fn sessions_digest(summaries: &[SessionSummary]) -> String {
    if summaries.is_empty() {
        return "No sessions recorded.".to_string();
    }

    let mut lines = vec![format!("Analyzed {} recorded sessions.", summaries.len())];

    let distances: Vec<f64> = summaries.iter().map(|s| s.distance_km).collect();
    let times: Vec<f64> = summaries.iter().map(|s| s.duration_min).collect();
    let paces: Vec<f64> = summaries.iter().filter_map(|s| s.pace_min_km).collect();

    lines.push(format!(
        "Distance: mean {:.2} km, min {:.2} km, max {:.2} km.",
        mean(&distances),
        min(&distances),
        max(&distances)
    ));
    lines.push(format!(
        "Time: mean {:.1} min, min {:.1} min, max {:.1} min.",
        mean(&times),
        min(&times),
        max(&times)
    ));
    if !paces.is_empty() {
        lines.push(format!(
            "Pace across all sessions: mean {:.2} min/km, min {:.2} min/km, max {:.2} min/km.",
            mean(&paces),
            min(&paces),
            max(&paces)
        ));
    }

    // Distance histogram with race-anchored edges, lower bound included.
    const EDGES: [(f64, f64, &str); 6] = [
        (0.0, 5.0, "0-5 km"),
        (5.0, 10.0, "5-10 km"),
        (10.0, 15.0, "10-15 km"),
        (15.0, 21.0, "15-21 km (half marathon)"),
        (21.0, 42.0, "21-42 km"),
        (42.0, f64::INFINITY, "marathon+"),
    ];
    let buckets: Vec<String> = EDGES
        .iter()
        .map(|&(lo, hi, label)| {
            let n = distances.iter().filter(|&&d| d >= lo && d < hi).count();
            format!("{label}: {n}")
        })
        .collect();
    lines.push(format!("Sessions per distance range: {}.", buckets.join(", ")));

    let mut dates: Vec<NaiveDate> = summaries.iter().map(|s| s.start.date()).collect();
    dates.sort();
    dates.dedup();
    lines.push(format!(
        "Sessions span {} to {}, across {} distinct training days.",
        dates[0],
        dates[dates.len() - 1],
        dates.len()
    ));

    // First-vs-last pace, chronological, with a stability band.
    let mut by_date: Vec<&SessionSummary> = summaries.iter().collect();
    by_date.sort_by_key(|s| s.start);
    if by_date.len() > 1 {
        if let (Some(first), Some(last)) = (
            by_date.iter().find_map(|s| s.pace_min_km),
            by_date.iter().rev().find_map(|s| s.pace_min_km),
        ) {
            let delta = last - first;
            if delta < -0.1 {
                lines.push("Pace is improving over time.".to_string());
            } else if delta > 0.1 {
                lines.push("Pace is worsening over time.".to_string());
            } else {
                lines.push("Pace is holding steady over time.".to_string());
            }
        }
    }

    lines.join("\n")
}

/// Scalar forecast plus the spread of the splits behind it.
pub fn prediction_digest(result: &PredictionResult) -> String {
    let paces: Vec<f64> = result.intervals.iter().map(|i| i.pace_min_km).collect();
    let mut text = format!(
        "Estimated time for {:.1} km: {} (h:m:s)\n",
        result.target_km,
        format_hms(result.estimated_min)
    );
    text.push_str(&format!(
        "Analyzed {} splits.\nMin split pace: {:.2} min/km.\nMax split pace: {:.2} min/km.\nMean split pace: {:.2} min/km.",
        paces.len(),
        min(&paces),
        max(&paces),
        mean(&paces)
    ));
    text
}

/// The single textual context the question-answering collaborator
/// consumes: filtering preamble plus every available digest, each part
/// passed in explicitly.
pub fn assemble_context(
    summaries: &[SessionSummary],
    clusters: Option<&ClusterAnalysis>,
    prediction: Option<&PredictionResult>,
    today: NaiveDate,
) -> String {
    let steadiness = SteadinessConfig::default();
    let preamble = format!(
        "Session filtering applied:\n\
         - Only sessions from the last {MAX_SESSION_AGE_DAYS} days.\n\
         - Sessions under {MIN_SESSION_DISTANCE_M:.0} meters were discarded.\n\
         - Sampling steadiness was enforced: at most {:.0}% of timestamp gaps above {:.0} seconds.",
        steadiness.tolerance_pct, steadiness.max_gap_s
    );

    let cluster_part = match clusters {
        Some(a) => cluster_digest(a),
        None => "Training-type summary: not run.".to_string(),
    };
    let prediction_part = match prediction {
        Some(p) => prediction_digest(p),
        None => "Race prediction: not run.".to_string(),
    };

    [
        preamble,
        cluster_part,
        monthly_distance_digest(summaries, today),
        sessions_digest(summaries),
        prediction_part,
    ]
    .join("\n\n")
}

/// The trailing `n` months ending at `today`'s month, oldest first.
fn trailing_months(today: NaiveDate, n: usize) -> Vec<(i32, u32)> {
    let mut months = Vec::with_capacity(n);
    let (mut y, mut m) = (today.year(), today.month());
    for _ in 0..n {
        months.push((y, m));
        if m == 1 {
            y -= 1;
            m = 12;
        } else {
            m -= 1;
        }
    }
    months.reverse();
    months
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn min(xs: &[f64]) -> f64 {
    xs.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(xs: &[f64]) -> f64 {
    xs.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
