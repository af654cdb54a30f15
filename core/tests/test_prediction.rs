use chrono::{Duration, NaiveDate, NaiveDateTime};

use pacegraph_core::elevation::ElevationConfig;
use pacegraph_core::models::{GranularSample, SessionSummary};
use pacegraph_core::prediction::{
    aggregate_positions, date_from_session_id, pace_intervals, predict, rounded_position,
    InsufficientData, PredictionOutcome,
};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 6)
        .unwrap()
        .and_hms_opt(7, 30, 0)
        .unwrap()
}

/// One sample per km boundary at a constant pace (min/km), plus a start
/// sample at zero.
fn km_boundary_session(id: &str, km: usize, pace_min_km: f64) -> Vec<GranularSample> {
    (0..=km)
        .map(|i| {
            let elapsed_s = i as f64 * pace_min_km * 60.0;
            GranularSample {
                session_id: id.to_string(),
                timestamp: start() + Duration::milliseconds((elapsed_s * 1000.0) as i64),
                elapsed_s,
                distance_m: Some(i as f64 * 1000.0),
                altitude_m: None,
            }
        })
        .collect()
}

fn summary_of(id: &str, distance_km: f64, pace_min_km: f64) -> SessionSummary {
    SessionSummary {
        session_id: id.to_string(),
        start: start(),
        distance_km,
        duration_min: distance_km * pace_min_km,
        pace_min_km: Some(pace_min_km),
    }
}

#[test]
fn splits_cover_opening_kilometers_and_skip_consumed_boundaries() {
    let samples = km_boundary_session("run", 5, 5.0);
    let splits = pace_intervals("run", &samples);

    // The opening split consumes the whole first kilometer (the first
    // sample past 100 m is the 1 km boundary), so km 1 is skipped.
    let positions: Vec<f64> = splits.iter().map(|s| s.position_km).collect();
    assert_eq!(positions, vec![0.1, 2.0, 3.0, 4.0, 5.0]);
    for s in &splits {
        assert!((s.pace_min_km - 5.0).abs() < 1e-9, "steady pace expected");
        assert!(!s.closing_split);
    }
}

#[test]
fn trailing_remainder_becomes_a_closing_split() {
    let mut samples = km_boundary_session("run", 5, 5.0);
    // 300 m tail at the same pace.
    samples.push(GranularSample {
        session_id: "run".to_string(),
        timestamp: start() + Duration::seconds(1590),
        elapsed_s: 1590.0,
        distance_m: Some(5300.0),
        altitude_m: None,
    });

    let splits = pace_intervals("run", &samples);
    let last = splits.last().expect("closing split present");
    assert!(last.closing_split);
    assert!((last.position_km - 5.3).abs() < 1e-9);
    assert!((last.pace_min_km - 5.0).abs() < 1e-9);

    // Closing splits keep their fractional position through rounding.
    assert!((rounded_position(last) - 5.3).abs() < 1e-9);
}

#[test]
fn tails_under_fifty_meters_are_dropped() {
    let mut samples = km_boundary_session("run", 5, 5.0);
    samples.push(GranularSample {
        session_id: "run".to_string(),
        timestamp: start() + Duration::seconds(1510),
        elapsed_s: 1510.0,
        distance_m: Some(5040.0),
        altitude_m: None,
    });

    let splits = pace_intervals("run", &samples);
    assert!(
        splits.iter().all(|s| !s.closing_split),
        "40 m of tail is below the closing threshold"
    );
}

#[test]
fn sessions_with_under_two_distance_samples_yield_no_splits() {
    let samples = km_boundary_session("run", 5, 5.0)
        .into_iter()
        .map(|mut s| {
            s.distance_m = None;
            s
        })
        .collect::<Vec<_>>();
    assert!(pace_intervals("run", &samples).is_empty());
}

#[test]
fn fractional_positions_survive_aggregation_rounding() {
    let mut samples = km_boundary_session("run", 3, 6.0);
    samples.push(GranularSample {
        session_id: "run".to_string(),
        timestamp: start() + Duration::seconds(1278),
        elapsed_s: 1278.0,
        distance_m: Some(3550.0),
        altitude_m: None,
    });

    let splits = pace_intervals("run", &samples);
    let stats = aggregate_positions(&splits, 10.0);

    let positions: Vec<f64> = stats.iter().map(|s| s.position_km).collect();
    assert!(positions.contains(&0.1), "short opening burst stays fractional");
    assert!(positions.contains(&3.55), "closing split stays fractional");
    assert!(positions.iter().all(|&p| p <= 10.0));
}

#[test]
fn aggregation_reports_mean_and_sample_std_per_position() {
    let mut intervals = pace_intervals("a", &km_boundary_session("a", 3, 5.0));
    intervals.extend(pace_intervals("b", &km_boundary_session("b", 3, 6.0)));
    let stats = aggregate_positions(&intervals, 3.0);

    let at_two = stats
        .iter()
        .find(|s| (s.position_km - 2.0).abs() < 1e-9)
        .expect("km 2 aggregated");
    assert!((at_two.mean_pace_min_km - 5.5).abs() < 1e-9);
    // Sample std of {5.0, 6.0} is 1/sqrt(2).
    let std = at_two.std_pace_min_km.expect("two observations give a spread");
    assert!((std - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
}

#[test]
fn single_observation_has_no_spread() {
    let intervals = pace_intervals("a", &km_boundary_session("a", 2, 5.0));
    let stats = aggregate_positions(&intervals, 2.0);
    assert!(stats.iter().all(|s| s.std_pace_min_km.is_none()));
}

#[test]
fn aggregation_is_capped_at_the_shorter_of_target_and_longest_session() {
    let intervals = pace_intervals("a", &km_boundary_session("a", 8, 5.0));
    let stats = aggregate_positions(&intervals, 5.0_f64.min(8.0));
    assert!(stats.iter().all(|s| s.position_km <= 5.0));
}

#[test]
fn flat_ten_k_forecast_matches_hand_computation() {
    // Three 10 km sessions at 5.0/5.2/5.4 min/km with no climb:
    // baseline 5.2, no adjustment, 52 minutes for 10 km.
    let mut granular = Vec::new();
    let mut subset = Vec::new();
    for (i, pace) in [5.0, 5.2, 5.4].into_iter().enumerate() {
        let id = format!("10k-{i}");
        granular.extend(km_boundary_session(&id, 10, pace));
        subset.push(summary_of(&id, 10.0, pace));
    }

    let outcome = predict(10.0, &subset, &granular, &ElevationConfig::default());
    let PredictionOutcome::Forecast(result) = outcome else {
        panic!("expected a forecast");
    };

    assert_eq!(result.sessions_used, 3);
    assert!((result.baseline_pace_min_km - 5.2).abs() < 1e-9);
    assert_eq!(result.mean_gain_m, 0.0);
    assert!((result.adjusted_pace_min_km - 5.2).abs() < 1e-9);
    assert!((result.estimated_min - 52.0).abs() < 1e-9);
    assert!(!result.intervals.is_empty());
    assert!(!result.by_position.is_empty());
}

#[test]
fn mean_climb_degrades_the_forecast_pace() {
    // 1000 m of mean gain costs 1.5 % of pace.
    let id = "hilly";
    let mut granular = km_boundary_session(id, 10, 5.0);
    for (i, s) in granular.iter_mut().enumerate() {
        // +4 m per km boundary sample: 40 m of clean gain.
        s.altitude_m = Some(200.0 + i as f64 * 4.0);
    }
    let subset = vec![summary_of(id, 10.0, 5.0)];

    let PredictionOutcome::Forecast(result) =
        predict(10.0, &subset, &granular, &ElevationConfig::default())
    else {
        panic!("expected a forecast");
    };

    assert!((result.mean_gain_m - 40.0).abs() < 1e-9);
    let expected = 5.0 * (1.0 + 40.0 / 1000.0 * 0.015);
    assert!((result.adjusted_pace_min_km - expected).abs() < 1e-12);
}

#[test]
fn empty_subset_reports_no_sessions() {
    let outcome = predict(5.0, &[], &[], &ElevationConfig::default());
    match outcome {
        PredictionOutcome::Insufficient(reason) => {
            assert_eq!(reason, InsufficientData::NoSessions)
        }
        PredictionOutcome::Forecast(_) => panic!("nothing to forecast from"),
    }
}

#[test]
fn paceless_subset_reports_no_pace() {
    let mut s = summary_of("x", 0.0, 5.0);
    s.pace_min_km = None;
    let granular = km_boundary_session("x", 2, 5.0);
    match predict(5.0, &[s], &granular, &ElevationConfig::default()) {
        PredictionOutcome::Insufficient(reason) => assert_eq!(reason, InsufficientData::NoPace),
        PredictionOutcome::Forecast(_) => panic!("no pace, no forecast"),
    }
}

#[test]
fn missing_granular_data_reports_no_intervals() {
    let subset = vec![summary_of("ghost", 10.0, 5.0)];
    match predict(10.0, &subset, &[], &ElevationConfig::default()) {
        PredictionOutcome::Insufficient(reason) => {
            assert_eq!(reason, InsufficientData::NoIntervals)
        }
        PredictionOutcome::Forecast(_) => panic!("no samples, no splits"),
    }
}

#[test]
fn session_ids_carry_their_recording_date() {
    let dt = date_from_session_id("2025-03-14_08-30-00-UTC_12345").expect("stamp parses");
    assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
    assert!(date_from_session_id("notes.json").is_none());
}
