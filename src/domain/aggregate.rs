// Reduction of a time series to the single reading shown on a polygon
use super::telemetry::{round_to_tenth, TimeSeries};

/// Upstream fills some gaps with a literal zero, so zero counts as missing.
/// A genuine 0.0 reading therefore never produces an update.
fn is_usable(sample: &Option<f64>) -> Option<f64> {
    match sample {
        Some(v) if v.is_finite() && *v != 0.0 => Some(*v),
        _ => None,
    }
}

/// Representative value of `series`, rounded to one decimal place
///
/// - Range mode with more than one sample: mean of the usable samples
/// - Point mode, or a single sample: the first sample
///
/// `None` means "no data": the caller keeps whatever the polygon showed before.
pub fn aggregate(series: &TimeSeries, is_range: bool) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    let values = series.values();

    let representative = if is_range && values.len() > 1 {
        let usable: Vec<f64> = values.iter().filter_map(is_usable).collect();
        if usable.is_empty() {
            return None;
        }
        usable.iter().sum::<f64>() / usable.len() as f64
    } else {
        is_usable(values.first()?)?
    };

    Some(round_to_tenth(representative))
}
