// Geometry domain model - coordinates and polygon centroids
use serde::{Deserialize, Serialize};

/// Minimum number of usable vertices for a drawable polygon
pub const MIN_POLYGON_VERTICES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Returned by `centroid` when no usable vertex exists
    pub const UNAVAILABLE: LatLng = LatLng { lat: 0.0, lng: 0.0 };

    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_unavailable(&self) -> bool {
        *self == Self::UNAVAILABLE
    }
}

/// A vertex is usable when it is exactly a pair of finite numbers
fn usable_vertex<P: AsRef<[f64]>>(point: &P) -> Option<(f64, f64)> {
    match point.as_ref() {
        [lat, lng] if lat.is_finite() && lng.is_finite() => Some((*lat, *lng)),
        _ => None,
    }
}

/// Count the vertices that would take part in a centroid
pub fn usable_vertex_count<P: AsRef<[f64]>>(points: &[P]) -> usize {
    points.iter().filter_map(usable_vertex).count()
}

/// Unweighted vertex average of a polygon ring
/// - Pairs that are not two finite numbers are ignored
/// - With no usable pair the result is `LatLng::UNAVAILABLE` (0,0), which callers
///   must read as "no centroid" rather than a point at the origin
pub fn centroid<P: AsRef<[f64]>>(points: &[P]) -> LatLng {
    let (count, lat_sum, lng_sum) = points
        .iter()
        .filter_map(usable_vertex)
        .fold((0usize, 0.0, 0.0), |(n, lat_acc, lng_acc), (lat, lng)| {
            (n + 1, lat_acc + lat, lng_acc + lng)
        });

    if count == 0 {
        tracing::debug!("centroid requested for a ring without usable vertices");
        return LatLng::UNAVAILABLE;
    }

    LatLng::new(lat_sum / count as f64, lng_sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid_of_empty_ring_is_sentinel() {
        let empty: Vec<[f64; 2]> = Vec::new();
        let c = centroid(&empty);
        assert_eq!(c, LatLng::new(0.0, 0.0));
        assert!(c.is_unavailable());
    }

    #[test]
    fn test_centroid_averages_each_axis() {
        let c = centroid(&[[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(c, LatLng::new(2.0, 3.0));
    }

    #[test]
    fn test_centroid_ignores_unusable_pairs() {
        let ring: Vec<Vec<f64>> = vec![
            vec![1.0, 2.0],
            vec![f64::NAN, 5.0],
            vec![3.0],
            vec![3.0, 4.0],
            vec![1.0, 2.0, 3.0],
            vec![f64::INFINITY, 0.0],
        ];
        assert_eq!(centroid(&ring), LatLng::new(2.0, 3.0));
        assert_eq!(usable_vertex_count(&ring), 2);
    }

    #[test]
    fn test_centroid_with_only_invalid_pairs_is_sentinel() {
        let ring: Vec<Vec<f64>> = vec![vec![f64::NAN, 1.0], vec![]];
        assert!(centroid(&ring).is_unavailable());
    }
}
