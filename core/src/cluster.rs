use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::models::{ClusterAssignment, ClusterSummary, SessionSummary};

/// Knobs for the training-type grouping. The defaults reproduce the
/// reference behavior (k swept 2..=7, ten seeded restarts per k).
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub k_min: usize,
    pub k_max: usize,
    /// Independent initializations per candidate k; best inertia wins.
    pub restarts: usize,
    pub max_iter: usize,
    /// Fixed RNG seed so identical input yields identical clusters.
    pub seed: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k_min: 2,
            k_max: 7,
            restarts: 10,
            max_iter: 300,
            seed: 42,
        }
    }
}

/// Grouping result. Fewer than three usable rows is an expected input
/// shape, reported as data, not as an error.
#[derive(Debug, Clone)]
pub enum ClusterOutcome {
    Insufficient { valid_rows: usize },
    Grouped(ClusterAnalysis),
}

#[derive(Debug, Clone)]
pub struct ClusterAnalysis {
    /// Chosen cluster count.
    pub k: usize,
    /// One row per cluster, ordered by cluster id.
    pub clusters: Vec<ClusterSummary>,
    /// Session -> training-type mapping for every clustered session.
    pub assignments: Vec<ClusterAssignment>,
}

/// Group sessions by (distance, pace) into a data-driven number of named
/// training-type clusters. Sessions without a defined pace are skipped.
pub fn cluster_sessions(summaries: &[SessionSummary], cfg: &ClusterConfig) -> ClusterOutcome {
    let rows: Vec<(&SessionSummary, [f64; 2])> = summaries
        .iter()
        .filter_map(|s| s.pace_min_km.map(|p| (s, [s.distance_km, p])))
        .collect();

    if rows.len() < 3 {
        return ClusterOutcome::Insufficient {
            valid_rows: rows.len(),
        };
    }

    let points: Vec<[f64; 2]> = rows.iter().map(|(_, p)| *p).collect();
    let scaled = standardize(&points);

    // Sweep candidate cluster counts; the silhouette score rewards
    // partitions that are simultaneously dense and well separated.
    let k_hi = cfg.k_max.min(rows.len() - 1);
    let mut best: Option<(usize, f64)> = None;
    for k in cfg.k_min..=k_hi {
        let fit = fit_kmeans(&scaled, k, cfg);
        let score = silhouette(&scaled, &fit.labels, k);
        debug!("k={k}: silhouette={score:.4}");
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((k, score));
        }
    }
    let Some((best_k, best_score)) = best else {
        return ClusterOutcome::Insufficient {
            valid_rows: rows.len(),
        };
    };
    info!(
        "clustering {} sessions into {best_k} groups (silhouette {best_score:.3})",
        rows.len()
    );

    let fit = fit_kmeans(&scaled, best_k, cfg);

    // Per-cluster means in the original feature space drive the naming,
    // so labels stay stable across arbitrary id orderings.
    let mut clusters = Vec::with_capacity(best_k);
    for id in 0..best_k {
        let members: Vec<&[f64; 2]> = points
            .iter()
            .zip(&fit.labels)
            .filter(|(_, &l)| l == id)
            .map(|(p, _)| p)
            .collect();
        if members.is_empty() {
            continue;
        }
        let n = members.len() as f64;
        let mean_distance_km = members.iter().map(|p| p[0]).sum::<f64>() / n;
        let mean_pace_min_km = members.iter().map(|p| p[1]).sum::<f64>() / n;
        clusters.push(ClusterSummary {
            cluster_id: id,
            label: training_type(mean_distance_km, mean_pace_min_km),
            mean_distance_km,
            mean_pace_min_km,
            sessions: members.len(),
        });
    }

    let assignments = rows
        .iter()
        .zip(&fit.labels)
        .map(|((s, _), &id)| ClusterAssignment {
            session_id: s.session_id.clone(),
            cluster_id: id,
            label: clusters
                .iter()
                .find(|c| c.cluster_id == id)
                .map(|c| c.label)
                .unwrap_or("Unclassified"),
        })
        .collect();

    ClusterOutcome::Grouped(ClusterAnalysis {
        k: best_k,
        clusters,
        assignments,
    })
}

/// Training-type name from a cluster's mean distance and mean pace.
/// Purely positional: re-running with different id orderings cannot
/// change what a cluster is called.
pub fn training_type(mean_distance_km: f64, mean_pace_min_km: f64) -> &'static str {
    if mean_distance_km < 3.0 {
        "Sprint / Very Short"
    } else if mean_distance_km < 6.0 {
        if mean_pace_min_km < 5.0 {
            "Short / Fast"
        } else {
            "Short / Easy"
        }
    } else if mean_distance_km < 10.0 {
        if mean_pace_min_km < 5.5 {
            "Medium / Fast"
        } else {
            "Medium / Moderate"
        }
    } else if mean_distance_km < 15.0 {
        if mean_pace_min_km < 5.5 {
            "10K / Tempo"
        } else {
            "10K / Base"
        }
    } else if mean_distance_km < 25.0 {
        if mean_pace_min_km < 6.0 {
            "Half Marathon / Tempo"
        } else {
            "Long / Steady"
        }
    } else if mean_pace_min_km < 6.0 {
        "Marathon / Race"
    } else {
        "Very Long / Recovery"
    }
}

/// Zero mean, unit variance per feature. Constant features pass through
/// unscaled so degenerate input cannot produce NaN coordinates.
fn standardize(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let n = points.len() as f64;
    let mut out = points.to_vec();
    for col in 0..2 {
        let mean = points.iter().map(|p| p[col]).sum::<f64>() / n;
        let var = points.iter().map(|p| (p[col] - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        let scale = if std > 0.0 { std } else { 1.0 };
        for p in &mut out {
            p[col] = (p[col] - mean) / scale;
        }
    }
    out
}

struct KmeansFit {
    labels: Vec<usize>,
    inertia: f64,
}

/// Best of `restarts` seeded k-means runs, by inertia.
fn fit_kmeans(points: &[[f64; 2]], k: usize, cfg: &ClusterConfig) -> KmeansFit {
    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
    let mut best: Option<KmeansFit> = None;
    for _ in 0..cfg.restarts {
        let fit = lloyd(points, k, cfg.max_iter, &mut rng);
        if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
            best = Some(fit);
        }
    }
    // k >= 1 and restarts >= 1 guarantee a fit.
    best.unwrap_or(KmeansFit {
        labels: vec![0; points.len()],
        inertia: 0.0,
    })
}

fn lloyd(points: &[[f64; 2]], k: usize, max_iter: usize, rng: &mut ChaCha8Rng) -> KmeansFit {
    let mut centroids = init_plusplus(points, k, rng);
    let mut labels = vec![0usize; points.len()];

    for _ in 0..max_iter {
        let mut changed = false;
        for (i, p) in points.iter().enumerate() {
            let nearest = nearest_centroid(p, &centroids);
            if labels[i] != nearest {
                labels[i] = nearest;
                changed = true;
            }
        }

        let mut sums = vec![[0.0f64; 2]; k];
        let mut counts = vec![0usize; k];
        for (p, &l) in points.iter().zip(&labels) {
            sums[l][0] += p[0];
            sums[l][1] += p[1];
            counts[l] += 1;
        }
        for (c, (sum, &count)) in centroids.iter_mut().zip(sums.iter().zip(&counts)) {
            if count > 0 {
                *c = [sum[0] / count as f64, sum[1] / count as f64];
            }
        }

        if !changed {
            break;
        }
    }

    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &l)| dist2(p, &centroids[l]))
        .sum();
    KmeansFit { labels, inertia }
}

/// k-means++ seeding: spread the initial centroids proportionally to
/// squared distance from the ones already chosen.
fn init_plusplus(points: &[[f64; 2]], k: usize, rng: &mut ChaCha8Rng) -> Vec<[f64; 2]> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    while centroids.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| dist2(p, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            // All remaining points coincide with a centroid.
            centroids.push(points[rng.gen_range(0..points.len())]);
            continue;
        }
        let mut draw = rng.gen::<f64>() * total;
        let mut chosen = points.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            draw -= w;
            if draw <= 0.0 {
                chosen = i;
                break;
            }
        }
        centroids.push(points[chosen]);
    }
    centroids
}

fn nearest_centroid(p: &[f64; 2], centroids: &[[f64; 2]]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = dist2(p, c);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

fn dist2(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// Mean silhouette coefficient over all points; higher means clusters
/// are dense and well separated. Singleton members score zero.
fn silhouette(points: &[[f64; 2]], labels: &[usize], k: usize) -> f64 {
    let n = points.len();
    if n == 0 {
        return 0.0;
    }
    let counts: Vec<usize> = (0..k).map(|c| labels.iter().filter(|&&l| l == c).count()).collect();

    let mut total = 0.0;
    for i in 0..n {
        let own = labels[i];
        if counts[own] <= 1 {
            continue; // contributes 0
        }

        let mut sums = vec![0.0f64; k];
        for j in 0..n {
            if i == j {
                continue;
            }
            sums[labels[j]] += dist2(&points[i], &points[j]).sqrt();
        }

        let a = sums[own] / (counts[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own && counts[c] > 0)
            .map(|c| sums[c] / counts[c] as f64)
            .fold(f64::INFINITY, f64::min);
        if b.is_finite() {
            let denom = a.max(b);
            if denom > 0.0 {
                total += (b - a) / denom;
            }
        }
    }
    total / n as f64
}
