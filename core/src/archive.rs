use std::io::{Cursor, Read};
use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use zip::ZipArchive;

use crate::errors::IngestError;
use crate::metrics::METRICS;
use crate::models::{GranularSample, RawRecord, SessionTotals};
use crate::timezone::{localize, resolve_timezone};
use crate::validate::{is_steady_session, SteadinessConfig};

/// Session entries live under this subdirectory inside the export.
pub const GPS_DIR_MARKER: &str = "/GPS-data/";
/// Sessions shorter than this are GPS noise, not runs.
pub const MIN_SESSION_DISTANCE_M: f64 = 200.0;
/// Entries older than this are excluded from the analysis window.
pub const MAX_SESSION_AGE_DAYS: i64 = 365;

static DRIVE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").unwrap());

/// Where the zip archive comes from. The locator is a caller-supplied
/// value; there is no CLI surface here.
#[derive(Debug, Clone)]
pub enum ArchiveSource {
    /// A Google Drive share link (`…/d/<id>/…`).
    DriveUrl(String),
    /// The archive already in memory (e.g. a browser upload).
    Bytes(Vec<u8>),
    /// A local path to the archive file.
    Path(PathBuf),
}

/// Everything ingestion hands to the analysis stages: per-session totals,
/// the full granular table, and the discard bookkeeping.
#[derive(Debug, Clone)]
pub struct IngestOutput {
    pub totals: Vec<SessionTotals>,
    pub granular: Vec<GranularSample>,
    pub processed: usize,
    pub discarded_stale: usize,
    pub discarded_irregular: usize,
    pub discarded_short: usize,
}

/// Read a session archive, applying the age, distance and steadiness
/// filters, and localize every surviving session's timestamps.
///
/// Malformed sources and unparseable JSON are fatal; filtered sessions
/// are counted and skipped.
pub fn read_archive(
    source: ArchiveSource,
    steadiness: &SteadinessConfig,
) -> Result<IngestOutput, IngestError> {
    read_archive_at(source, steadiness, Utc::now().date_naive())
}

/// Like [`read_archive`] with an explicit "today" for the staleness
/// window, so the cutoff is testable.
pub fn read_archive_at(
    source: ArchiveSource,
    steadiness: &SteadinessConfig,
    today: NaiveDate,
) -> Result<IngestOutput, IngestError> {
    let bytes = fetch_bytes(source)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let entries: Vec<String> = archive
        .file_names()
        .filter(|n| n.contains(GPS_DIR_MARKER) && n.to_lowercase().ends_with(".json"))
        .map(str::to_string)
        .collect();

    let cutoff = today - Duration::days(MAX_SESSION_AGE_DAYS);
    let mut recent = Vec::new();
    let mut discarded_stale = 0usize;
    for name in entries {
        match entry_date(&name) {
            Some(d) if d >= cutoff => recent.push(name),
            _ => discarded_stale += 1,
        }
    }

    let mut totals = Vec::new();
    let mut granular: Vec<GranularSample> = Vec::new();
    let mut discarded_short = 0usize;
    let mut discarded_irregular = 0usize;

    for name in &recent {
        let mut buf = Vec::new();
        archive.by_name(name)?.read_to_end(&mut buf)?;

        let mut de = serde_json::Deserializer::from_slice(&buf);
        let records: Vec<RawRecord> =
            serde_path_to_error::deserialize(&mut de).map_err(|source| IngestError::Json {
                entry: name.clone(),
                source,
            })?;

        // The quality gates look at the raw payload before anything is
        // built: last cumulative distance first, sampling cadence second.
        let final_distance = records.last().and_then(|r| r.distance);
        match final_distance {
            Some(d) if d >= MIN_SESSION_DISTANCE_M => {}
            _ => {
                discarded_short += 1;
                continue;
            }
        }

        let session_id = session_id_of(name);
        let timed: Vec<(&RawRecord, DateTime<Utc>)> = records
            .iter()
            .filter_map(|r| {
                let ms = r.timestamp?;
                Utc.timestamp_millis_opt(ms).single().map(|ts| (r, ts))
            })
            .collect();

        let timestamps: Vec<DateTime<Utc>> = timed.iter().map(|(_, ts)| *ts).collect();
        if !is_steady_session(&timestamps, steadiness) {
            warn!("session {session_id}: irregular sampling, skipped");
            discarded_irregular += 1;
            continue;
        }

        let lat = timed.iter().find_map(|(r, _)| r.latitude);
        let lon = timed.iter().find_map(|(r, _)| r.longitude);
        let tz = resolve_timezone(lat, lon);

        let t0 = timestamps[0];
        let mut max_distance_m = 0.0f64;
        let mut max_elapsed_s = 0.0f64;
        for (rec, ts) in &timed {
            // Elapsed time is fixed here, in seconds: the export's own
            // duration field when present, the timestamp offset otherwise.
            let elapsed_s = rec
                .duration
                .map(|ms| ms / 1000.0)
                .unwrap_or_else(|| (*ts - t0).num_milliseconds() as f64 / 1000.0);
            if let Some(d) = rec.distance {
                max_distance_m = max_distance_m.max(d);
            }
            max_elapsed_s = max_elapsed_s.max(elapsed_s);

            granular.push(GranularSample {
                session_id: session_id.clone(),
                timestamp: localize(*ts, tz),
                elapsed_s,
                distance_m: rec.distance,
                altitude_m: rec.altitude,
            });
        }

        totals.push(SessionTotals {
            session_id,
            distance_km: max_distance_m / 1000.0,
            duration_s: max_elapsed_s,
        });
    }

    if totals.is_empty() {
        return Err(IngestError::NoValidSessions);
    }

    let processed = totals.len();
    METRICS.sessions_processed.inc_by(processed as u64);
    METRICS.discarded_stale.inc_by(discarded_stale as u64);
    METRICS.discarded_short.inc_by(discarded_short as u64);
    METRICS.discarded_irregular.inc_by(discarded_irregular as u64);
    info!(
        "archive ingested: {processed} sessions ({discarded_stale} stale, \
         {discarded_short} too short, {discarded_irregular} irregular)"
    );

    Ok(IngestOutput {
        totals,
        granular,
        processed,
        discarded_stale,
        discarded_irregular,
        discarded_short,
    })
}

fn fetch_bytes(source: ArchiveSource) -> Result<Vec<u8>, IngestError> {
    match source {
        ArchiveSource::Bytes(b) => Ok(b),
        ArchiveSource::Path(p) => Ok(std::fs::read(p)?),
        ArchiveSource::DriveUrl(url) => {
            let id = DRIVE_ID
                .captures(&url)
                .map(|c| c[1].to_string())
                .ok_or_else(|| {
                    IngestError::ArchiveFormat(format!("not a Drive share link: {url}"))
                })?;
            let download = format!("https://drive.google.com/uc?export=download&id={id}");
            info!("downloading archive {id}");

            let agent = ureq::AgentBuilder::new()
                .timeout(std::time::Duration::from_secs(60))
                .build();
            let resp = agent.get(&download).call()?;
            let mut buf = Vec::new();
            resp.into_reader().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Session files are named `YYYY-MM-DD_HH-MM-SS-UTC_<device>.json`; the
/// date prefix drives the staleness window. Unparseable names count as
/// stale rather than aborting the run.
fn entry_date(name: &str) -> Option<NaiveDate> {
    let file = name.rsplit('/').next()?;
    let prefix = file.split('_').next()?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Per-session identifier: the file stem with path and extension gone.
fn session_id_of(name: &str) -> String {
    let file = name.rsplit('/').next().unwrap_or(name);
    file.strip_suffix(".json")
        .or_else(|| file.strip_suffix(".JSON"))
        .unwrap_or(file)
        .to_string()
}
