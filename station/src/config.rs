use anyhow::Context;
use fmcwcore::RadarConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Auxiliary display link settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    pub port: String,
    pub baud_rate: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: "/dev/ttyUSB2".into(),
            baud_rate: 115_200,
        }
    }
}

/// Full station configuration: radar parameters plus the serial links.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub radar: RadarConfig,
    pub port_i: String,
    pub port_q: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    pub display: DisplayConfig,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            radar: RadarConfig::default(),
            port_i: "/dev/ttyUSB0".into(),
            port_q: "/dev/ttyUSB1".into(),
            baud_rate: 115_200,
            read_timeout_ms: 2_000,
            display: DisplayConfig::default(),
        }
    }
}

impl StationConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading station config {}", path_ref.display()))?;
        let config: StationConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing station config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_the_deployed_unit() {
        let config = StationConfig::default();
        assert_eq!(config.radar.samples_per_ramp, 256);
        assert_eq!(config.radar.n_samples, 400);
        assert_eq!(config.radar.queue_capacity, 5);
        assert_eq!(config.baud_rate, 115_200);
        assert!(config.display.enabled);
    }

    #[test]
    fn config_load_reads_yaml_with_partial_overrides() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"port_i: /dev/ttyACM0\nread_timeout_ms: 500\nradar:\n  sample_rate: 20000.0\n  samples_per_ramp: 128\n  bandwidth: 250000000.0\n  center_frequency: 24000000000.0\n  speed_of_light: 300000000.0\n  n_samples: 200\n  queue_capacity: 8\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let config = StationConfig::load(&path).unwrap();
        assert_eq!(config.port_i, "/dev/ttyACM0");
        assert_eq!(config.port_q, "/dev/ttyUSB1");
        assert_eq!(config.read_timeout(), Duration::from_millis(500));
        assert_eq!(config.radar.samples_per_ramp, 128);
        assert_eq!(config.radar.queue_capacity, 8);
    }
}
