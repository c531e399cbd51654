// Polygon domain model
use super::color_rule::NEUTRAL_COLOR;
use super::geometry::{centroid, usable_vertex_count, LatLng, MIN_POLYGON_VERTICES};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Polygon {
    pub id: String,
    pub vertices: Vec<[f64; 2]>,
    pub data_source_id: String,
    #[serde(default)]
    pub current_value: Option<f64>,
    pub color: String,
    pub name: String,
}

impl Polygon {
    /// A freshly drawn polygon: new id, no reading yet, neutral color
    pub fn new(vertices: Vec<[f64; 2]>, data_source_id: String, sequence: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vertices,
            data_source_id,
            current_value: None,
            color: NEUTRAL_COLOR.to_string(),
            name: Self::format_name(sequence),
        }
    }

    fn format_name(sequence: u64) -> String {
        format!("Polygon {}", sequence)
    }

    /// At least three finite vertices; anything less is never rendered or aggregated
    pub fn is_valid(&self) -> bool {
        usable_vertex_count(&self.vertices) >= MIN_POLYGON_VERTICES
    }

    pub fn centroid(&self) -> LatLng {
        centroid(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_polygon_defaults() {
        let polygon = Polygon::new(vec![[0.0, 0.0], [0.0, 3.0], [3.0, 0.0]], "openmeteo".into(), 4);
        assert_eq!(polygon.name, "Polygon 4");
        assert_eq!(polygon.color, NEUTRAL_COLOR);
        assert!(polygon.current_value.is_none());
        assert!(polygon.is_valid());
        assert_eq!(polygon.centroid(), LatLng::new(1.0, 1.0));
    }

    #[test]
    fn test_validity_counts_usable_vertices() {
        let two = Polygon::new(vec![[0.0, 0.0], [1.0, 1.0]], "ds".into(), 1);
        assert!(!two.is_valid());

        let with_nan = Polygon::new(vec![[0.0, 0.0], [1.0, 1.0], [f64::NAN, 2.0]], "ds".into(), 1);
        assert!(!with_nan.is_valid());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Polygon::new(vec![], "ds".into(), 1);
        let b = Polygon::new(vec![], "ds".into(), 2);
        assert_ne!(a.id, b.id);
    }
}
