//! Small numeric helpers shared by the detectors and forecasters

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (Bessel's correction)
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Sample standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Population standard deviation
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Quantile with linear interpolation between order statistics, `q` in 0.0-1.0
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Calculate linear regression slope of values against their index
pub fn linear_regression_slope(values: &[f64]) -> f64 {
    linear_fit(values).0
}

/// Ordinary least squares of values against their index: (slope, intercept)
pub fn linear_fit(values: &[f64]) -> (f64, f64) {
    if values.len() < 2 {
        return (0.0, values.first().copied().unwrap_or(0.0));
    }
    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();
    let denom = n * sum_x2 - sum_x.powi(2);
    if denom.abs() < f64::EPSILON {
        return (0.0, sum_y / n);
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    (slope, intercept)
}

/// Centered moving average; positions without a full window are `None`.
/// Even periods use the 2×period weighting of classical decomposition.
pub fn centered_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    if period == 0 || n < period {
        return out;
    }
    let half = period / 2;
    if period % 2 == 1 {
        for (i, slot) in out.iter_mut().enumerate().take(n - half).skip(half) {
            *slot = Some(mean(&values[i - half..=i + half]));
        }
    } else {
        for (i, slot) in out.iter_mut().enumerate().take(n - half).skip(half) {
            let window = &values[i - half..=i + half];
            let inner: f64 = window[1..period].iter().sum();
            let edges = (window[0] + window[period]) / 2.0;
            *slot = Some((inner + edges) / period as f64);
        }
    }
    out
}
