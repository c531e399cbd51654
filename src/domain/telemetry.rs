// Telemetry data domain models
use chrono::{DateTime, Utc};

/// An hourly temperature series as returned by a series source
///
/// `timestamps` and `values` always have the same length; a `None` value is a
/// sample the source reported without a reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<Option<f64>>,
}

impl TimeSeries {
    /// Build a series from parallel vectors, or `None` when their lengths differ
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<Option<f64>>) -> Option<Self> {
        if timestamps.len() != values.len() {
            return None;
        }
        Some(Self { timestamps, values })
    }

    pub fn from_samples(samples: impl IntoIterator<Item = (DateTime<Utc>, Option<f64>)>) -> Self {
        let (timestamps, values) = samples.into_iter().unzip();
        Self { timestamps, values }
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keep only samples whose timestamp falls inside `[start, end]`
    pub fn retain_between(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::from_samples(
            self.timestamps
                .into_iter()
                .zip(self.values)
                .filter(|(t, _)| *t >= start && *t <= end),
        )
    }
}

/// Round to one decimal place, the precision shown for every reading
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_new_rejects_mismatched_lengths() {
        assert!(TimeSeries::new(vec![at(0), at(1)], vec![Some(1.0)]).is_none());
        assert_eq!(TimeSeries::new(vec![at(0)], vec![None]).unwrap().len(), 1);
    }

    #[test]
    fn test_retain_between_is_inclusive() {
        let series = TimeSeries::from_samples((0..6).map(|h| (at(h), Some(h as f64))));
        let trimmed = series.retain_between(at(2), at(4));
        assert_eq!(trimmed.values(), &[Some(2.0), Some(3.0), Some(4.0)]);
        assert_eq!(trimmed.timestamps(), &[at(2), at(3), at(4)]);
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(18.37), 18.4);
        assert_eq!(round_to_tenth(18.34), 18.3);
        assert_eq!(round_to_tenth(-2.26), -2.3);
    }
}
