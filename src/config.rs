/// Basin configuration loader - parses basin.toml
///
/// Separates basin geography and model artifact paths from code, making it
/// easy to point the service at a different basin or a retrained model set
/// without recompiling.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::model::River;

/// A latitude/longitude pair identifying one monitored location.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// One river gauge entry from basin.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct GaugeConfig {
    pub river: River,
    pub latitude: f64,
    pub longitude: f64,
}

impl GaugeConfig {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Paths to the three serialized model artifacts.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelPaths {
    pub rain: String,
    pub discharge: String,
    pub flood: String,
}

/// Root configuration structure for TOML parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct BasinConfig {
    /// Human-readable basin name (headline/title text only).
    pub name: String,

    /// The weather station coordinate for archive requests.
    pub station: Coordinate,

    /// The three river gauge coordinates for flood requests.
    #[serde(rename = "gauge")]
    pub gauges: Vec<GaugeConfig>,

    pub models: ModelPaths,
}

impl BasinConfig {
    /// Parses and validates a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        Self::parse(&contents)
    }

    /// Parses and validates TOML configuration text.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let config: BasinConfig =
            toml::from_str(contents).map_err(|e| format!("failed to parse basin config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        let coords =
            std::iter::once(self.station).chain(self.gauges.iter().map(|g| g.coordinate()));
        for c in coords {
            if !(-90.0..=90.0).contains(&c.latitude) || !(-180.0..=180.0).contains(&c.longitude) {
                return Err(format!(
                    "coordinate out of range: ({}, {})",
                    c.latitude, c.longitude
                ));
            }
        }

        for river in River::ALL {
            let count = self.gauges.iter().filter(|g| g.river == river).count();
            if count != 1 {
                return Err(format!(
                    "expected exactly one gauge for {}, found {}",
                    river, count
                ));
            }
        }
        Ok(())
    }

    /// The gauge coordinate for a river. `validate` guarantees one gauge
    /// per river, so the lookup cannot miss on a constructed config.
    pub fn gauge(&self, river: River) -> Coordinate {
        self.gauges
            .iter()
            .find(|g| g.river == river)
            .map(|g| g.coordinate())
            .unwrap_or(self.station)
    }
}

/// Loads basin configuration from `basin.toml` in the working directory.
///
/// # Panics
/// Panics if the configuration file is missing, malformed, or incomplete.
/// This is intentional - the service cannot operate without valid basin
/// geography and model paths.
pub fn load_config() -> BasinConfig {
    BasinConfig::from_path(Path::new("basin.toml"))
        .unwrap_or_else(|e| panic!("invalid basin.toml: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        name = "Test basin"

        [station]
        latitude = 24.80
        longitude = 92.35

        [[gauge]]
        river = "longai"
        latitude = 24.80
        longitude = 92.35

        [[gauge]]
        river = "kushiyara"
        latitude = 24.6266
        longitude = 91.7782

        [[gauge]]
        river = "singla"
        latitude = 24.68216
        longitude = 92.4457

        [models]
        rain = "models/rain_model.json"
        discharge = "models/discharge_model.json"
        flood = "models/flood_clf.json"
    "#;

    #[test]
    fn test_parse_sample_config() {
        let config = BasinConfig::parse(SAMPLE).expect("sample config should parse");
        assert_eq!(config.name, "Test basin");
        assert_eq!(config.gauges.len(), 3);
        assert_eq!(config.station.latitude, 24.80);
        assert_eq!(config.models.flood, "models/flood_clf.json");
    }

    #[test]
    fn test_gauge_lookup_by_river() {
        let config = BasinConfig::parse(SAMPLE).expect("should parse");
        let kushiyara = config.gauge(River::Kushiyara);
        assert_eq!(kushiyara.latitude, 24.6266);
        assert_eq!(kushiyara.longitude, 91.7782);
    }

    #[test]
    fn test_missing_gauge_is_rejected() {
        let truncated = SAMPLE.replace("river = \"singla\"", "river = \"kushiyara\"");
        let result = BasinConfig::parse(&truncated);
        assert!(
            result.is_err(),
            "config without a singla gauge must be rejected, got {:?}",
            result
        );
    }

    #[test]
    fn test_out_of_range_coordinate_is_rejected() {
        let bad = SAMPLE.replace("longitude = 92.35", "longitude = 292.35");
        assert!(BasinConfig::parse(&bad).is_err());
    }

    #[test]
    fn test_shipped_config_loads() {
        // cargo test runs with the crate root as the working directory.
        let config = load_config();
        assert_eq!(config.gauges.len(), 3, "basin.toml should list all three gauges");
    }
}
