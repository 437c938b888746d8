use crate::surface::MapView;
use crate::tracker::{Position, ScatterArea};
use serde::Deserialize;
use std::time::Duration;

/// Complete skytrack configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkytrackConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

/// HTTP/WebSocket server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Pending commands the event loop will buffer
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Response events buffered per viewer before it lags
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_bind() -> String {
    "0.0.0.0:4000".to_string()
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_event_capacity() -> usize {
    256
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            queue_capacity: default_queue_capacity(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Initial map view
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,
    #[serde(default = "default_center_lng")]
    pub center_lng: f64,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
    #[serde(default = "default_attribution")]
    pub attribution: String,
}

// Leiden, The Netherlands
fn default_center_lat() -> f64 {
    52.1518
}

fn default_center_lng() -> f64 {
    4.4811
}

fn default_zoom() -> u8 {
    12
}

fn default_tile_url() -> String {
    "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

fn default_attribution() -> String {
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
        .to_string()
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lng: default_center_lng(),
            zoom: default_zoom(),
            tile_url: default_tile_url(),
            attribution: default_attribution(),
        }
    }
}

impl MapConfig {
    pub fn center(&self) -> Position {
        Position::new(self.center_lat, self.center_lng)
    }

    pub fn view(&self) -> MapView {
        MapView {
            center: self.center(),
            zoom: self.zoom,
            tile_url: self.tile_url.clone(),
            attribution: self.attribution.clone(),
        }
    }
}

/// Rendering surface configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceConfig {
    /// How long to wait for the surface to become ready
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
    /// Draw commands buffered per viewer before it lags
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

fn default_ready_timeout_ms() -> u64 {
    5000
}

fn default_command_capacity() -> usize {
    4096
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: default_ready_timeout_ms(),
            command_capacity: default_command_capacity(),
        }
    }
}

impl SurfaceConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

/// Demo entities placed at startup and by `scatter_entities`
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Random planes to place at startup (0 disables)
    #[serde(default)]
    pub random_planes: usize,
    /// Width/height in degrees of the area around the map centre
    #[serde(default = "default_scatter_span")]
    pub scatter_span: f64,
    /// Largest `count` a `scatter_entities` event may ask for
    #[serde(default = "default_max_scatter")]
    pub max_scatter: usize,
}

fn default_scatter_span() -> f64 {
    0.2
}

fn default_max_scatter() -> usize {
    500
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            random_planes: 0,
            scatter_span: default_scatter_span(),
            max_scatter: default_max_scatter(),
        }
    }
}

impl SkytrackConfig {
    /// Area `scatter_entities` places random planes in
    pub fn scatter_area(&self) -> ScatterArea {
        ScatterArea::around(self.map.center(), self.demo.scatter_span)
    }

    /// Apply environment overrides, ignoring unparsable values, then
    /// validate the result.
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok());
        self.validate()
    }

    /// Reject values the runtime cannot start with
    pub fn validate(&self) -> anyhow::Result<()> {
        let capacities = [
            ("server.queue_capacity", self.server.queue_capacity),
            ("server.event_capacity", self.server.event_capacity),
            ("surface.command_capacity", self.surface.command_capacity),
        ];
        for (name, value) in capacities {
            if value == 0 {
                anyhow::bail!("{} must be greater than 0", name);
            }
        }
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SKYTRACK_BIND") {
            self.server.bind = v;
        }
        if let Some(v) = lookup("SKYTRACK_READY_TIMEOUT_MS") {
            if let Ok(n) = v.parse::<u64>() {
                self.surface.ready_timeout_ms = n;
            }
        }
        if let Some(v) = lookup("SKYTRACK_DEMO_PLANES") {
            if let Ok(n) = v.parse::<usize>() {
                self.demo.random_planes = n;
            }
        }
        if let Some(v) = lookup("SKYTRACK_QUEUE_CAPACITY") {
            if let Ok(n) = v.parse::<usize>() {
                self.server.queue_capacity = n;
            }
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> anyhow::Result<SkytrackConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: SkytrackConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SkytrackConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:4000");
        assert_eq!(config.map.center(), Position::new(52.1518, 4.4811));
        assert_eq!(config.map.zoom, 12);
        assert_eq!(config.surface.ready_timeout(), Duration::from_secs(5));
        assert_eq!(config.demo.random_planes, 0);
        assert_eq!(config.demo.max_scatter, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [server]
            bind = "127.0.0.1:9000"
            queue_capacity = 64

            [map]
            center_lat = 50.93
            center_lng = 6.96
            zoom = 13
            tile_url = "https://tiles.example.com/{z}/{x}/{y}.png"

            [surface]
            ready_timeout_ms = 250

            [demo]
            random_planes = 10
            scatter_span = 0.5
        "#;

        let config: SkytrackConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.server.queue_capacity, 64);
        assert_eq!(config.map.view().center, Position::new(50.93, 6.96));
        assert_eq!(config.map.zoom, 13);
        assert_eq!(config.surface.ready_timeout_ms, 250);
        assert_eq!(config.demo.random_planes, 10);
        assert_eq!(config.scatter_area().lat_span, 0.5);
    }

    #[test]
    fn test_partial_config() {
        // Missing sections and fields use defaults
        let toml = r#"
            [map]
            zoom = 8
        "#;

        let config: SkytrackConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.map.zoom, 8);
        assert_eq!(config.map.center_lat, 52.1518);
        assert_eq!(config.server.event_capacity, 256);
        assert_eq!(config.surface.command_capacity, 4096);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SKYTRACK_BIND", "127.0.0.1:1234"),
            ("SKYTRACK_READY_TIMEOUT_MS", "not-a-number"),
            ("SKYTRACK_DEMO_PLANES", "3"),
        ]);

        let mut config = SkytrackConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.bind, "127.0.0.1:1234");
        assert_eq!(config.surface.ready_timeout_ms, 5000); // Unparsable, kept
        assert_eq!(config.demo.random_planes, 3);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[demo]\nrandom_planes = 4").unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.demo.random_planes, 4);
    }

    #[test]
    fn test_load_config_rejects_zero_capacity() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[surface]\ncommand_capacity = 0").unwrap();

        let err = load_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("surface.command_capacity"));
    }

    #[test]
    fn test_env_override_zero_capacity_rejected() {
        let env: HashMap<&str, &str> = HashMap::from([("SKYTRACK_QUEUE_CAPACITY", "0")]);

        let mut config = SkytrackConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.queue_capacity, 0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.queue_capacity"));
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("/nonexistent/skytrack.toml").is_err());
    }
}
