//! Runtime configuration, loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! stock robot: phone `20:20:08:59:27:13`, speed 80, 2 s between iterations.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::bluetooth::MacAddress;
use crate::error::{Error, Result};
use crate::signal::SignalRange;

/// Upper bound for every `*_ms` setting (one hour)
pub const MAX_DURATION_MS: u64 = 3_600_000;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub phone: PhoneConfig,
    pub search: SearchConfig,
    pub signal: SignalConfig,
    pub crawler: CrawlerConfig,
    pub display: DisplayConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PhoneConfig {
    /// Bluetooth address of the phone to look for
    pub address: String,
    /// Discovery passes averaged into one reading
    pub scan_passes: usize,
    pub scan_timeout_ms: u64,
    /// HCI controller index handed to btmgmt
    pub hci_index: u16,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        PhoneConfig {
            address: "20:20:08:59:27:13".to_string(),
            scan_passes: 3,
            scan_timeout_ms: 12_000,
            hci_index: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    pub speed: u8,
    /// Forward steps taken while the signal keeps getting stronger
    pub forward_steps: u8,
    /// Anything closer than this (and further than 0) is an obstacle
    pub obstacle_cm: f32,
    pub interval_ms: u64,
    /// Undo each iteration's turn before the next scan
    pub resume_after_turn: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            speed: 80,
            forward_steps: 3,
            obstacle_cm: 15.0,
            interval_ms: 2_000,
            resume_after_turn: true,
        }
    }
}

impl SearchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignalConfig {
    pub window: usize,
    pub min_rssi: f32,
    pub max_rssi: f32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        let range = SignalRange::default();
        SignalConfig {
            window: crate::signal::DEFAULT_WINDOW,
            min_rssi: range.min_rssi,
            max_rssi: range.max_rssi,
        }
    }
}

impl SignalConfig {
    pub fn range(&self) -> SignalRange {
        SignalRange {
            min_rssi: self.min_rssi,
            max_rssi: self.max_rssi,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Serial device of the motion co-processor
    pub port: String,
    pub baud: u32,
    pub step_timeout_ms: u64,
    pub range_timeout_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        CrawlerConfig {
            port: "/dev/ttyACM0".to_string(),
            baud: crate::uart::DEFAULT_BAUD,
            step_timeout_ms: 3_000,
            range_timeout_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    pub i2c_bus: u8,
    pub address: u16,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            enabled: true,
            i2c_bus: crate::display::ssd1306::DEFAULT_BUS,
            address: crate::display::ssd1306::DEFAULT_ADDRESS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub command: String,
    pub args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        SpeechConfig {
            enabled: true,
            command: "espeak".to_string(),
            args: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn phone_address(&self) -> Result<MacAddress> {
        self.phone.address.parse()
    }

    pub fn validate(&self) -> Result<()> {
        self.phone_address()?;
        if self.signal.window == 0 {
            return Err(Error::InvalidConfig("signal.window must be at least 1".to_string()));
        }
        if self.signal.max_rssi <= self.signal.min_rssi {
            return Err(Error::InvalidConfig("signal.max_rssi must be above signal.min_rssi".to_string()));
        }
        if self.phone.scan_passes == 0 {
            return Err(Error::InvalidConfig("phone.scan_passes must be at least 1".to_string()));
        }
        if self.search.speed > 100 {
            return Err(Error::InvalidConfig("search.speed is a percentage (0-100)".to_string()));
        }

        let durations = [
            ("phone.scan_timeout_ms", self.phone.scan_timeout_ms),
            ("search.interval_ms", self.search.interval_ms),
            ("crawler.step_timeout_ms", self.crawler.step_timeout_ms),
            ("crawler.range_timeout_ms", self.crawler.range_timeout_ms),
        ];
        for (name, value) in durations {
            if value > MAX_DURATION_MS {
                return Err(Error::InvalidConfig(format!(
                    "{} must be at most {} ms",
                    name, MAX_DURATION_MS
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.search.speed, 80);
        assert_eq!(config.search.forward_steps, 3);
        assert_eq!(config.search.obstacle_cm, 15.0);
        assert_eq!(config.search.interval(), Duration::from_secs(2));
        assert_eq!(config.signal.window, 5);
        assert_eq!(config.phone.scan_passes, 3);
        assert_eq!(config.display.address, 0x3C);
        assert_eq!(config.phone_address().unwrap().to_string(), "20:20:08:59:27:13");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [phone]
            address = "aa:bb:cc:dd:ee:ff"

            [search]
            speed = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.phone.address, "aa:bb:cc:dd:ee:ff");
        assert_eq!(config.phone.scan_passes, 3);
        assert_eq!(config.search.speed, 60);
        assert_eq!(config.search.forward_steps, 3);
        assert_eq!(config.crawler.port, "/dev/ttyACM0");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Config::from_toml_str("[phone]\naddress = \"nope\"\n"),
            Err(Error::InvalidMac(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[signal]\nwindow = 0\n"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[signal]\nmin_rssi = -30.0\nmax_rssi = -90.0\n"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(Config::from_toml_str("[search]\nspeed = \"fast\"\n"), Err(Error::Config(_))));
    }

    #[test]
    fn test_huge_timeouts_rejected() {
        for text in [
            "[phone]\nscan_timeout_ms = 9223372036854775807\n",
            "[crawler]\nstep_timeout_ms = 3600001\n",
            "[crawler]\nrange_timeout_ms = 99999999999\n",
            "[search]\ninterval_ms = 10000000\n",
        ] {
            assert!(
                matches!(Config::from_toml_str(text), Err(Error::InvalidConfig(_))),
                "{}",
                text
            );
        }
        assert!(Config::from_toml_str("[crawler]\nstep_timeout_ms = 3600000\n").is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\ninterval_ms = 500\nresume_after_turn = false").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.search.interval(), Duration::from_millis(500));
        assert!(!config.search.resume_after_turn);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load(Path::new("/nonexistent/phonefind.toml")),
            Err(Error::Io(_))
        ));
    }
}
