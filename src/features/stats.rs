//! Small robust statistics shared by the feature extractors

/// Median of a slice (mean of the two central values for even lengths)
///
/// Returns `None` for an empty slice.
pub fn median(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) * 0.5)
    } else {
        Some(sorted[mid])
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f32>() / values.len() as f32)
}

/// Population standard deviation, `None` for an empty slice
pub fn std_dev(values: &[f32]) -> Option<f32> {
    let mu = mean(values)?;
    let var = values.iter().map(|&v| (v - mu) * (v - mu)).sum::<f32>() / values.len() as f32;
    Some(var.max(0.0).sqrt())
}

/// Clamp to [0, 1], mapping NaN to `fallback`
pub fn unit_clamp(value: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}
