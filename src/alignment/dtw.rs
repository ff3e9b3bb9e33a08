use crate::error::AlignError;
use crate::features::FeatureMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DtwAlgorithm {
    /// Full accumulated-cost matrix, O(n*m) time and space.
    Exact,
    /// Sakoe-Chiba band around the expected diagonal, O(n*delta).
    Margin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    Euclidean,
    Manhattan,
    /// 1 - normalized dot product; the metric classical MFCC aligners use.
    Cosine,
}

/// Minimum-cost monotonic alignment path between two feature sequences.
///
/// The path starts at (0, 0), ends at (n-1, m-1) and is non-decreasing in
/// both coordinates: both sequences represent the same utterance start to
/// end, so the alignment is closed on both sides.
///
/// In margin mode only a band of `delta` frames around the expected
/// diagonal is computed; a path that leaves the band in the optimal
/// solution degrades to a suboptimal-but-complete path, and a band too
/// narrow for the length-ratio skew of the inputs fails with
/// [`AlignError::NoValidPath`].
pub fn compute_path(
    real: &FeatureMatrix,
    synth: &FeatureMatrix,
    algorithm: DtwAlgorithm,
    delta: usize,
    distance: Distance,
) -> Result<Vec<(usize, usize)>, AlignError> {
    let n = real.num_frames();
    let m = synth.num_frames();
    if n == 0 {
        return Err(AlignError::empty_sequence("real feature matrix has zero frames"));
    }
    if m == 0 {
        return Err(AlignError::empty_sequence("synth feature matrix has zero frames"));
    }

    match algorithm {
        DtwAlgorithm::Exact => Ok(exact_path(real, synth, distance)),
        DtwAlgorithm::Margin => {
            if delta == 0 {
                return Err(AlignError::configuration("margin delta must be positive"));
            }
            let delta = delta.min(m);
            if m <= delta {
                // The band covers the whole synth sequence: exact is
                // equivalent and needs no center bookkeeping.
                tracing::debug!(m, delta, "band covers synth sequence, using exact dtw");
                return Ok(exact_path(real, synth, distance));
            }
            margin_path(real, synth, delta, distance)
        }
    }
}

/// Accumulated cost matrix of the exact algorithm, row-major n x m.
/// Exposed for diagnostics and tests.
pub fn accumulated_cost_matrix(
    real: &FeatureMatrix,
    synth: &FeatureMatrix,
    distance: Distance,
) -> Result<Vec<Vec<f64>>, AlignError> {
    let n = real.num_frames();
    let m = synth.num_frames();
    if n == 0 || m == 0 {
        return Err(AlignError::empty_sequence(
            "cannot accumulate costs over an empty feature matrix",
        ));
    }
    let acm = exact_acm(real, synth, distance);
    Ok(acm.chunks_exact(m).map(|row| row.to_vec()).collect())
}

fn exact_acm(real: &FeatureMatrix, synth: &FeatureMatrix, distance: Distance) -> Vec<f64> {
    let n = real.num_frames();
    let m = synth.num_frames();
    let dist = |i: usize, j: usize| local_distance(real.frame(i), synth.frame(j), distance);

    let mut acm = vec![0.0f64; n * m];
    acm[0] = dist(0, 0);
    for j in 1..m {
        acm[j] = acm[j - 1] + dist(0, j);
    }
    for i in 1..n {
        let row = i * m;
        acm[row] = acm[row - m] + dist(i, 0);
        for j in 1..m {
            let up = acm[row - m + j];
            let left = acm[row + j - 1];
            let diag = acm[row - m + j - 1];
            acm[row + j] = dist(i, j) + diag.min(up).min(left);
        }
    }
    acm
}

fn exact_path(real: &FeatureMatrix, synth: &FeatureMatrix, distance: Distance) -> Vec<(usize, usize)> {
    let n = real.num_frames();
    let m = synth.num_frames();
    tracing::debug!(n, m, "computing exact dtw path");
    let acm = exact_acm(real, synth, distance);

    let mut path = Vec::with_capacity(n + m);
    let mut i = n - 1;
    let mut j = m - 1;
    path.push((i, j));
    while i > 0 || j > 0 {
        if i == 0 {
            j -= 1;
        } else if j == 0 {
            i -= 1;
        } else {
            let diag = acm[(i - 1) * m + j - 1];
            let up = acm[(i - 1) * m + j];
            let left = acm[i * m + j - 1];
            // Fixed tie-break order: diagonal, then up (real advances),
            // then left (synth advances). The order determines boundary
            // placement in degenerate-cost regions.
            if diag <= up && diag <= left {
                i -= 1;
                j -= 1;
            } else if up <= left {
                i -= 1;
            } else {
                j -= 1;
            }
        }
        path.push((i, j));
    }
    path.reverse();
    path
}

fn margin_path(
    real: &FeatureMatrix,
    synth: &FeatureMatrix,
    delta: usize,
    distance: Distance,
) -> Result<Vec<(usize, usize)>, AlignError> {
    let n = real.num_frames();
    let m = synth.num_frames();
    tracing::debug!(n, m, delta, "computing banded dtw path");
    let dist = |i: usize, j: usize| local_distance(real.frame(i), synth.frame(j), distance);

    // Band start per row: delta cells centered on the expected diagonal,
    // clamped inside [0, m - delta]. Starts are non-decreasing.
    let half = delta / 2;
    let centers: Vec<usize> = (0..n)
        .map(|i| {
            let center = (m * i) / n;
            center.saturating_sub(half).min(m - delta)
        })
        .collect();

    if centers[n - 1] + delta < m {
        return Err(AlignError::no_valid_path(format!(
            "band of width {delta} cannot reach the terminal synth frame \
             (n = {n}, m = {m}); retry with exact mode or a larger margin"
        )));
    }

    let mut band = vec![f64::INFINITY; n * delta];
    band[0] = dist(0, 0);
    for j in 1..delta {
        band[j] = band[j - 1] + dist(0, j);
    }
    for i in 1..n {
        let offset = centers[i] - centers[i - 1];
        let row = i * delta;
        let prev = row - delta;
        let mut reachable = false;
        for j in 0..delta {
            let col = centers[i] + j;
            let dj = j + offset;
            let up = if dj < delta { band[prev + dj] } else { f64::INFINITY };
            let diag = if dj >= 1 && dj <= delta {
                band[prev + dj - 1]
            } else {
                f64::INFINITY
            };
            let left = if j > 0 { band[row + j - 1] } else { f64::INFINITY };
            let best = diag.min(up).min(left);
            if best.is_finite() {
                band[row + j] = best + dist(i, col);
                reachable = true;
            }
        }
        if !reachable {
            return Err(AlignError::no_valid_path(format!(
                "band of width {delta} leaves row {i} of {n} unreachable; \
                 retry with exact mode or a larger margin"
            )));
        }
    }
    if !band[(n - 1) * delta + (delta - 1)].is_finite() {
        return Err(AlignError::no_valid_path(format!(
            "terminal cell unreachable within band of width {delta}"
        )));
    }

    let mut path = Vec::with_capacity(n + m);
    let mut i = n - 1;
    let mut col = m - 1;
    path.push((i, col));
    while i > 0 || col > 0 {
        if i == 0 {
            col -= 1;
        } else if col == 0 {
            i -= 1;
        } else {
            let r_j = col - centers[i];
            let offset = centers[i] - centers[i - 1];
            let prev = (i - 1) * delta;
            let dj = r_j + offset;
            let up = if dj < delta { band[prev + dj] } else { f64::INFINITY };
            let diag = if dj >= 1 && dj <= delta {
                band[prev + dj - 1]
            } else {
                f64::INFINITY
            };
            let left = if r_j > 0 {
                band[i * delta + r_j - 1]
            } else {
                f64::INFINITY
            };
            if !diag.is_finite() && !up.is_finite() && !left.is_finite() {
                return Err(AlignError::no_valid_path(format!(
                    "no reachable predecessor at ({i}, {col}) within band of width {delta}"
                )));
            }
            // Same tie-break order as the exact algorithm.
            if diag <= up && diag <= left {
                i -= 1;
                col -= 1;
            } else if up <= left {
                i -= 1;
            } else {
                col -= 1;
            }
        }
        path.push((i, col));
    }
    path.reverse();
    Ok(path)
}

/// Local distance between two feature frames, skipping the log-energy
/// coefficient in row 0.
pub(crate) fn local_distance(a: &[f64], b: &[f64], distance: Distance) -> f64 {
    let a = &a[1..];
    let b = &b[1..];
    match distance {
        Distance::Euclidean => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt(),
        Distance::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
        Distance::Cosine => {
            let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
            let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
            1.0 - dot / (norm_a * norm_b).max(1e-12)
        }
    }
}
