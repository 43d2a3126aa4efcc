//! Small descriptive statistics helpers

/// Mean and population standard deviation of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

/// Describe a sample; `None` when it is empty
///
/// Uses the population standard deviation (divide by n).
pub fn describe(values: &[f64]) -> Option<Distribution> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Some(Distribution {
        count: values.len(),
        mean,
        std_dev: variance.sqrt(),
    })
}

/// Standard score of `value`; zero when the spread is zero
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev > 0.0 {
        (value - mean) / std_dev
    } else {
        0.0
    }
}
