use std::fs;
use std::path::Path;
use std::time::Duration;

use yaml_rust::{ Yaml, YamlLoader };

use crate::animator::Timings;
use crate::error::ConfigError;
use crate::poller::DEFAULT_POLL_INTERVAL;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_DISPLAY: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotConfig {
    pub name: String,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayConfig {
    pub endpoint: EndpointConfig,
    pub poll_interval: Duration,
    pub timings: Timings,
    pub slots: Vec<SlotConfig>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            endpoint: EndpointConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            poll_interval: DEFAULT_POLL_INTERVAL,
            timings: Timings::new(DEFAULT_DISPLAY),
            slots: default_slots(),
        }
    }
}

fn default_slots() -> Vec<SlotConfig> {
    [
        ("driver", "{driver_name} #{driver_number}"),
        ("team", "{driver_team}"),
        ("license", "{driver_license} | {driver_irating} iR"),
        ("incidents", "Incidents {driver_incidents}x (team {team_incidents}x)"),
        ("laps", "Lap {driver_laps}/{total_laps}"),
    ]
        .iter()
        .map(|(name, template)| SlotConfig { name: name.to_string(), template: template.to_string() })
        .collect()
}

impl OverlayConfig {
    pub fn load(path: &Path) -> Result<OverlayConfig, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        OverlayConfig::try_from(contents.as_str())
    }
}

impl TryFrom<&str> for OverlayConfig {
    type Error = ConfigError;

    fn try_from(str: &str) -> Result<Self, Self::Error> {
        let docs = YamlLoader::load_from_str(str)?;
        let defaults = OverlayConfig::default();
        let parsed = match docs.first() {
            Some(doc) => doc,
            None => return Ok(defaults),
        };

        let host = match &parsed["endpoint"]["host"] {
            Yaml::BadValue | Yaml::Null => defaults.endpoint.host,
            Yaml::String(host) if !host.trim().is_empty() => host.trim().to_string(),
            _ => return Err(ConfigError::Invalid("endpoint.host must be a non-empty string".to_string())),
        };

        let port = match &parsed["endpoint"]["port"] {
            Yaml::BadValue | Yaml::Null => defaults.endpoint.port,
            Yaml::Integer(port) => u16::try_from(*port).ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| ConfigError::Invalid(format!("endpoint.port {} is out of range", port)))?,
            _ => return Err(ConfigError::Invalid("endpoint.port must be an integer".to_string())),
        };

        let poll_interval = millis(&parsed["poll"]["interval_ms"], "poll.interval_ms", defaults.poll_interval)?;
        if poll_interval.is_zero() {
            return Err(ConfigError::Invalid("poll.interval_ms must be greater than zero".to_string()));
        }

        let animator = &parsed["animator"];
        let timings = Timings {
            display: millis(&animator["display_ms"], "animator.display_ms", defaults.timings.display)?,
            enter: millis(&animator["enter_ms"], "animator.enter_ms", defaults.timings.enter)?,
            exit: millis(&animator["exit_ms"], "animator.exit_ms", defaults.timings.exit)?,
        };

        let slots = match &parsed["slots"] {
            Yaml::BadValue | Yaml::Null => defaults.slots,
            Yaml::Array(entries) => entries.iter()
                .enumerate()
                .map(|(idx, entry)| slot(idx, entry))
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(ConfigError::Invalid("slots must be a list".to_string())),
        };
        if slots.is_empty() {
            return Err(ConfigError::Invalid("slots must not be empty".to_string()));
        }

        Ok(OverlayConfig {
            endpoint: EndpointConfig { host, port },
            poll_interval,
            timings,
            slots,
        })
    }
}

fn millis(node: &Yaml, key: &str, default: Duration) -> Result<Duration, ConfigError> {
    match node {
        Yaml::BadValue | Yaml::Null => Ok(default),
        Yaml::Integer(value) if *value >= 0 => Ok(Duration::from_millis(*value as u64)),
        _ => Err(ConfigError::Invalid(format!("{} must be a non-negative number of milliseconds", key))),
    }
}

fn slot(idx: usize, entry: &Yaml) -> Result<SlotConfig, ConfigError> {
    let template = entry["template"].as_str()
        .ok_or_else(|| ConfigError::Invalid(format!("slots[{}].template must be a string", idx)))?;
    let name = match &entry["name"] {
        Yaml::String(name) => name.clone(),
        Yaml::BadValue | Yaml::Null => format!("slot-{}", idx),
        _ => return Err(ConfigError::Invalid(format!("slots[{}].name must be a string", idx))),
    };

    Ok(SlotConfig { name, template: template.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = OverlayConfig::try_from("").unwrap();
        assert_eq!(config, OverlayConfig::default());
        assert_eq!(config.endpoint.port, 9000);
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.timings.enter, Duration::from_millis(600));
        assert_eq!(config.timings.exit, Duration::from_millis(800));
    }

    #[test]
    fn parses_full_document() {
        let config = OverlayConfig::try_from("
endpoint:
  host: 192.168.1.100
  port: 8000
poll:
  interval_ms: 2000
animator:
  display_ms: 4000
  enter_ms: 500
  exit_ms: 700
slots:
  - name: driver
    template: \"{driver_name}\"
  - template: \"Lap {driver_laps}\"
").unwrap();

        assert_eq!(config.endpoint, EndpointConfig { host: "192.168.1.100".to_string(), port: 8000 });
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.timings, Timings {
            display: Duration::from_millis(4000),
            enter: Duration::from_millis(500),
            exit: Duration::from_millis(700),
        });
        assert_eq!(config.slots, vec![
            SlotConfig { name: "driver".to_string(), template: "{driver_name}".to_string() },
            SlotConfig { name: "slot-1".to_string(), template: "Lap {driver_laps}".to_string() },
        ]);
    }

    #[test]
    fn rejects_bad_values() {
        for doc in [
            "endpoint:\n  port: 70000\n",
            "endpoint:\n  port: fast\n",
            "poll:\n  interval_ms: 0\n",
            "animator:\n  exit_ms: -5\n",
            "slots: []\n",
            "slots:\n  - name: nothing\n",
        ] {
            match OverlayConfig::try_from(doc) {
                Err(ConfigError::Invalid(_)) => {},
                other => panic!("expected invalid config for {:?}, got {:?}", doc, other),
            }
        }
    }

    #[test]
    fn reports_yaml_syntax_errors() {
        assert!(matches!(OverlayConfig::try_from("endpoint: [unclosed"), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = OverlayConfig::load(Path::new("/nonexistent/overlay.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
