// Deterministic synthetic series used when the weather source is unreachable
use super::geometry::LatLng;
use super::telemetry::{round_to_tenth, TimeSeries};
use super::time_window::TimeWindow;
use chrono::Duration;
use std::f64::consts::TAU;

const BASELINE_FLOOR: f64 = 15.0;
const BASELINE_SPAN: f64 = 25.0;
const DIURNAL_AMPLITUDE: f64 = 4.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Temperature around which the synthetic day oscillates, 15.0..40.0
fn baseline(centroid: LatLng) -> f64 {
    BASELINE_FLOOR + (centroid.lat.abs() + centroid.lng.abs()) % BASELINE_SPAN
}

/// Phase shift of the daily cycle, so that regions east and west peak at different hours
fn phase(centroid: LatLng) -> f64 {
    centroid.lng.to_radians()
}

/// Synthetic hourly series for `centroid` covering the queried part of `window`
///
/// Values depend only on the centroid and the window length, so a polygon whose
/// fetch keeps failing keeps the same value and color between passes.
pub fn fallback_series(centroid: LatLng, window: &TimeWindow) -> TimeSeries {
    let (start, _) = window.query_bounds();
    let hours = window.query_hours().max(0);
    let base = baseline(centroid);
    let shift = phase(centroid);

    TimeSeries::from_samples((0..=hours).map(|hour| {
        let angle = TAU * hour as f64 / HOURS_PER_DAY + shift;
        let value = round_to_tenth(base + DIURNAL_AMPLITUDE * angle.sin());
        (start + Duration::hours(hour), Some(value))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregate::aggregate;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_one_sample_per_hour_inclusive() {
        let window = TimeWindow::new(at(1, 0), at(2, 0), true).unwrap();
        let series = fallback_series(LatLng::new(52.5, 13.4), &window);
        assert_eq!(series.len(), 25);
        assert_eq!(series.timestamps()[0], at(1, 0));
        assert_eq!(series.timestamps()[24], at(2, 0));
    }

    #[test]
    fn test_point_window_yields_single_sample() {
        let window = TimeWindow::new(at(1, 5), at(3, 5), false).unwrap();
        let series = fallback_series(LatLng::new(10.0, 20.0), &window);
        assert_eq!(series.len(), 1);
        assert_eq!(series.timestamps()[0], at(1, 5));
    }

    #[test]
    fn test_same_inputs_give_same_values() {
        let centroid = LatLng::new(-33.87, 151.21);
        let first = TimeWindow::new(at(1, 0), at(1, 12), true).unwrap();
        let shifted = TimeWindow::new(at(5, 3), at(5, 15), true).unwrap();

        let a = fallback_series(centroid, &first);
        let b = fallback_series(centroid, &first);
        let c = fallback_series(centroid, &shifted);
        assert_eq!(a, b);
        assert_eq!(a.values(), c.values());
    }

    #[test]
    fn test_values_are_rounded_and_never_read_as_missing() {
        let window = TimeWindow::new(at(1, 0), at(3, 0), true).unwrap();
        for centroid in [LatLng::new(0.0, 0.0), LatLng::new(89.9, -179.9), LatLng::new(12.3, 45.6)] {
            let series = fallback_series(centroid, &window);
            for value in series.values().iter().flatten() {
                assert_eq!(*value, round_to_tenth(*value));
                assert!(*value >= BASELINE_FLOOR - DIURNAL_AMPLITUDE);
                assert!(*value <= BASELINE_FLOOR + BASELINE_SPAN + DIURNAL_AMPLITUDE);
            }
            assert!(aggregate(&series, true).is_some());
        }
    }

    #[test]
    fn test_longest_window_is_bounded() {
        use crate::domain::time_window::MAX_WINDOW_HOURS;

        let start = at(1, 0);
        let window = TimeWindow::new(start, start + Duration::hours(MAX_WINDOW_HOURS), true).unwrap();
        let series = fallback_series(LatLng::new(1.0, 1.0), &window);
        assert_eq!(series.len(), MAX_WINDOW_HOURS as usize + 1);
    }

    #[test]
    fn test_cycle_repeats_daily() {
        let window = TimeWindow::new(at(1, 0), at(3, 0), true).unwrap();
        let series = fallback_series(LatLng::new(40.0, -3.7), &window);
        let values = series.values();
        assert_eq!(values[0], values[24]);
        assert_eq!(values[5], values[29]);
    }
}
