// Data source domain model
use super::color_rule::{ColorRule, RuleOperator};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DATA_SOURCE_ID: &str = "openmeteo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub id: String,
    pub name: String,
    pub field: String,
    pub endpoint: String,
    #[serde(default)]
    pub color_rules: Vec<ColorRule>,
}

impl DataSource {
    /// Hourly 2m air temperature from the Open-Meteo archive, with a cold-to-hot palette
    pub fn open_meteo_temperature() -> Self {
        use RuleOperator::*;

        Self {
            id: DEFAULT_DATA_SOURCE_ID.to_string(),
            name: "Open-Meteo Temperature".to_string(),
            field: "temperature_2m".to_string(),
            endpoint: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            color_rules: vec![
                ColorRule::new("1", LessThan, 0.0, "#096dd9"),
                ColorRule::new("2", LessThan, 10.0, "#1890ff"),
                ColorRule::new("3", LessThan, 20.0, "#13c2c2"),
                ColorRule::new("4", LessThan, 25.0, "#52c41a"),
                ColorRule::new("5", LessThan, 30.0, "#faad14"),
                ColorRule::new("6", GreaterOrEqual, 30.0, "#ff4d4f"),
            ],
        }
    }

    pub fn defaults() -> Vec<DataSource> {
        vec![Self::open_meteo_temperature()]
    }
}
