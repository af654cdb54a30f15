use chrono::{DateTime, Duration, TimeZone, Utc};

use pacegraph_core::validate::{is_steady_session, SteadinessConfig};

/// Timestamps starting at a fixed instant with the given gaps between
/// consecutive samples.
fn stamps(deltas_s: &[i64]) -> Vec<DateTime<Utc>> {
    let mut t = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
    let mut out = vec![t];
    for &d in deltas_s {
        t += Duration::seconds(d);
        out.push(t);
    }
    out
}

#[test]
fn steady_ten_second_cadence_is_accepted() {
    // 12 samples, 11 gaps of 10 s: zero gaps above the 16 s threshold.
    let ts = stamps(&[10; 11]);
    assert!(is_steady_session(&ts, &SteadinessConfig::default()));
}

#[test]
fn one_long_gap_out_of_eleven_is_rejected() {
    // One 40 s gap out of 11 is 9.1 %, above the 5 % tolerance.
    let mut deltas = vec![10i64; 11];
    deltas[5] = 40;
    let ts = stamps(&deltas);
    assert!(
        !is_steady_session(&ts, &SteadinessConfig::default()),
        "9.1% long gaps must fail the 5% tolerance"
    );
}

#[test]
fn acceptance_is_monotonic_in_threshold_and_tolerance() {
    let mut deltas = vec![10i64; 11];
    deltas[5] = 40;
    let ts = stamps(&deltas);

    let base = SteadinessConfig::default();
    assert!(!is_steady_session(&ts, &base));

    // Raising the gap threshold can only turn rejections into accepts.
    let wider_gap = SteadinessConfig {
        max_gap_s: 60.0,
        ..base.clone()
    };
    assert!(is_steady_session(&ts, &wider_gap));

    // Same for the tolerance percentage.
    let wider_tolerance = SteadinessConfig {
        tolerance_pct: 10.0,
        ..base
    };
    assert!(is_steady_session(&ts, &wider_tolerance));
}

#[test]
fn tolerance_boundary_is_inclusive() {
    // 1 long gap out of 20 is exactly 5 %.
    let mut deltas = vec![10i64; 20];
    deltas[0] = 40;
    let ts = stamps(&deltas);
    assert!(is_steady_session(&ts, &SteadinessConfig::default()));
}

#[test]
fn degenerate_sessions_are_rejected() {
    let none: Vec<DateTime<Utc>> = Vec::new();
    assert!(!is_steady_session(&none, &SteadinessConfig::default()));

    let single = stamps(&[]);
    assert_eq!(single.len(), 1);
    assert!(!is_steady_session(&single, &SteadinessConfig::default()));
}
