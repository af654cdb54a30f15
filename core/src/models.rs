use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One raw record as it appears inside an archive entry's JSON array.
/// Everything except the timestamp is optional in real exports.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    /// Milliseconds since the Unix epoch, UTC.
    pub timestamp: Option<i64>,
    pub altitude: Option<f64>,
    /// Cumulative distance in meters.
    pub distance: Option<f64>,
    pub speed: Option<f64>,
    /// Cumulative elapsed time in milliseconds.
    pub duration: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One cleaned GPS reading within a session. Timestamps are local wall
/// clock (naive) once ingestion has resolved the session's timezone.
#[derive(Debug, Clone, Serialize)]
pub struct GranularSample {
    pub session_id: String,
    pub timestamp: NaiveDateTime,
    /// Elapsed seconds since session start, fixed at ingestion.
    pub elapsed_s: f64,
    /// Cumulative meters.
    pub distance_m: Option<f64>,
    pub altitude_m: Option<f64>,
}

/// Per-session totals emitted by ingestion (final cumulative values).
#[derive(Debug, Clone, Serialize)]
pub struct SessionTotals {
    pub session_id: String,
    pub distance_km: f64,
    pub duration_s: f64,
}

/// One aggregated row per valid session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    /// Local start time of the session.
    pub start: NaiveDateTime,
    pub distance_km: f64,
    pub duration_min: f64,
    /// min/km; None when the session covered zero distance.
    pub pace_min_km: Option<f64>,
}

/// One reconstructed kilometer (or partial) split within a session.
#[derive(Debug, Clone, Serialize)]
pub struct PaceInterval {
    pub session_id: String,
    /// Local date parsed from the filename-embedded stamp, when present.
    pub date: Option<NaiveDate>,
    /// Km mark; fractional for the opening ~100 m and the closing split.
    pub position_km: f64,
    pub pace_min_km: f64,
    /// Marks the session's closing partial split, which keeps its
    /// fractional position during per-km rounding.
    pub closing_split: bool,
}

/// Mean/spread of split paces at one rounded km position.
#[derive(Debug, Clone, Serialize)]
pub struct PositionStat {
    pub position_km: f64,
    pub mean_pace_min_km: f64,
    /// Sample standard deviation; None under two observations.
    pub std_pace_min_km: Option<f64>,
}

/// Scalar forecast plus the interval evidence behind it.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub target_km: f64,
    pub sessions_used: usize,
    pub baseline_pace_min_km: f64,
    pub mean_gain_m: f64,
    pub adjusted_pace_min_km: f64,
    pub estimated_min: f64,
    pub intervals: Vec<PaceInterval>,
    pub by_position: Vec<PositionStat>,
}

/// One row of the clustering summary table.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    pub label: &'static str,
    pub mean_distance_km: f64,
    pub mean_pace_min_km: f64,
    pub sessions: usize,
}

/// Session -> training-type mapping retained for later stages.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterAssignment {
    pub session_id: String,
    pub cluster_id: usize,
    pub label: &'static str,
}
