//! PaceGraph core: extraction, clustering and pace prediction for
//! GPS-tracked running sessions.
//!
//! The pipeline is synchronous and value-driven: the archive reader
//! produces per-session totals plus the granular sample table, the
//! aggregator folds those into one summary row per session, and the
//! clustering and prediction engines consume the summaries (prediction
//! also re-reads the granular table for elevation and splits). Rendering,
//! report assembly and question answering live outside this crate and
//! consume the tables and digests produced here.

pub mod archive;
pub mod cluster;
pub mod elevation;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod prediction;
pub mod session;
pub mod summary;
pub mod timezone;
pub mod validate;

pub use archive::{read_archive, ArchiveSource, IngestOutput};
pub use cluster::{cluster_sessions, ClusterAnalysis, ClusterConfig, ClusterOutcome};
pub use elevation::{elevation_profile, ElevationConfig, ElevationProfile};
pub use errors::IngestError;
pub use models::{
    ClusterAssignment, ClusterSummary, GranularSample, PaceInterval, PositionStat,
    PredictionResult, SessionSummary, SessionTotals,
};
pub use prediction::{predict, InsufficientData, PredictionOutcome};
pub use session::{race_subsets, session_summaries, target_subset, RaceTarget};
pub use validate::{is_steady_session, SteadinessConfig};
