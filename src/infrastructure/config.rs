use crate::application::recompute_service::RecomputeSettings;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_URL_TEMPLATE: &str = "${endpoint}?latitude=${lat}&longitude=${lng}&start_date=${start_date}&end_date=${end_date}&hourly=${field}";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub weather: WeatherSettings,
    pub recompute: RecomputeConfig,
    pub state: StateSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherSettings {
    /// Request URL with `${endpoint}`, `${lat}`, `${lng}`, `${start_date}`, `${end_date}`
    /// and `${field}` placeholders; endpoint and field come from the active data source
    pub url_template: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecomputeConfig {
    pub debounce_ms: u64,
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateSettings {
    pub path: String,
}

impl AppConfig {
    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.server.host, self.server.port).parse()?)
    }
}

impl WeatherSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl From<&RecomputeConfig> for RecomputeSettings {
    fn from(config: &RecomputeConfig) -> Self {
        Self {
            quiet_period: Duration::from_millis(config.debounce_ms),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        }
    }
}

/// Defaults, then `config/app.*` if present, then `REGION_TELEMETRY__SECTION__KEY` variables
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("weather.url_template", DEFAULT_URL_TEMPLATE)?
        .set_default("weather.timeout_secs", 20)?
        .set_default("recompute.debounce_ms", 600)?
        .set_default("recompute.fetch_timeout_secs", 20)?
        .set_default("state.path", "data/dashboard.json")?
        .add_source(config::File::with_name("config/app").required(false))
        .add_source(
            config::Environment::with_prefix("REGION_TELEMETRY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace `${name}` placeholders in a template string
pub fn expand_template(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_template() {
        let mut vars = HashMap::new();
        vars.insert("lat".to_string(), "52.52".to_string());
        vars.insert("lng".to_string(), "13.4".to_string());

        let template = "https://example.test/v1?latitude=${lat}&longitude=${lng}&hourly=${field}";
        let result = expand_template(template, &vars);

        assert_eq!(result, "https://example.test/v1?latitude=52.52&longitude=13.4&hourly=${field}");
    }

    #[test]
    fn test_defaults_load_without_files() {
        let config = load_app_config().unwrap();
        assert!(config.weather.url_template.starts_with("${endpoint}?"));
        assert!(config.weather.url_template.contains("${start_date}"));

        let settings = RecomputeSettings::from(&config.recompute);
        assert!(settings.quiet_period >= Duration::from_millis(1));
    }
}
