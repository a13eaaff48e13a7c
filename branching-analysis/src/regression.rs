use branching_common::{EventKind, EventLogEntry, PopulationPoint};

/// Slope and intercept of an ordinary least-squares line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionFit {
    pub slope: f64,
    pub intercept: f64,
    /// Number of points the line was fitted to.
    pub points: usize,
}

/// Least squares of `ys` on `xs`. `None` with fewer than two points or no spread in `xs`.
pub fn least_squares(xs: &[f64], ys: &[f64]) -> Option<RegressionFit> {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return None;
    }
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }
    if sxx <= 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(RegressionFit { slope, intercept: mean_y - slope * mean_x, points: n })
}

/// Fits `ln(population) ~ time` over a population curve.
///
/// Curves with fewer than `min_points` points (never less than two), or
/// touching zero population, are excluded because the log transform is
/// undefined there.
pub fn fit_log_population(
    curve: &[PopulationPoint],
    min_points: usize,
) -> Option<RegressionFit> {
    if curve.len() < min_points.max(2) || curve.iter().any(|p| p.population <= 0) {
        return None;
    }
    let times: Vec<f64> = curve.iter().map(|p| p.time).collect();
    let logs: Vec<f64> = curve.iter().map(|p| (p.population as f64).ln()).collect();
    least_squares(&times, &logs)
}

/// Fits the first `limit` division times against `ln(k)`, `k = 1, 2, ...`.
///
/// For exponential growth at rate `r` the k-th division happens near
/// `ln(k) / r`, so the slope estimates the inverse growth rate.
pub fn fit_division_schedule(events: &[EventLogEntry], limit: usize) -> Option<RegressionFit> {
    let times: Vec<f64> = events
        .iter()
        .filter(|e| e.kind == EventKind::Division)
        .map(|e| e.time)
        .take(limit)
        .collect();
    let log_ranks: Vec<f64> = (1..=times.len()).map(|k| (k as f64).ln()).collect();
    least_squares(&log_ranks, &times)
}

/// Mean and sample standard deviation of a set of fits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSummary {
    pub count: usize,
    pub slope_mean: f64,
    pub slope_std: f64,
    pub intercept_mean: f64,
    pub intercept_std: f64,
}

pub fn summarize(fits: &[RegressionFit]) -> Option<FitSummary> {
    if fits.is_empty() {
        return None;
    }
    let (slope_mean, slope_std) = mean_std(fits.iter().map(|f| f.slope));
    let (intercept_mean, intercept_std) = mean_std(fits.iter().map(|f| f.intercept));
    Some(FitSummary { count: fits.len(), slope_mean, slope_std, intercept_mean, intercept_std })
}

fn mean_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count() as f64;
    let mean = values.clone().sum::<f64>() / n;
    if n < 2.0 {
        return (mean, 0.0);
    }
    let var = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}
