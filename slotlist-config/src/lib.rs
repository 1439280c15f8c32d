#![allow(clippy::needless_return)]

use std::{path::Path, sync::Arc};

use slotlist_libs::{
    once_cell::sync::OnceCell,
    parking_lot::RwLock,
    thiserror, tracing,
    yaml_rust::{Yaml, YamlLoader},
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotListConfigError {
    #[error("global config not ready error")]
    NotReadyError,
    #[error("global config set error")]
    SetError,
    #[error("failed to open/read config file error: {0}")]
    ConfigFileError(String),
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

static SLOTLIST_CONFIG: OnceCell<Arc<RwLock<SlotListConfig>>> = OnceCell::new();

const SECTION: &str = "SlotListConfig";

fn read_yaml(content: &str) -> Result<Yaml, SlotListConfigError> {
    let yaml = YamlLoader::load_from_str(content)
        .map_err(|e| SlotListConfigError::ConfigFileError(format!("{:?}", e)))?;
    match yaml.into_iter().next() {
        Some(conf) => Ok(conf),
        None => Err(SlotListConfigError::ConfigFileError(String::from(
            "yaml file not include a yaml",
        ))),
    }
}

fn read_int(conf: &Yaml, key: &str, default: i64) -> Result<i64, SlotListConfigError> {
    let value = &conf[SECTION][key];
    if value.is_badvalue() {
        return Ok(default);
    }
    value
        .as_i64()
        .ok_or_else(|| SlotListConfigError::InvalidValue(format!("{} should be an integer", key)))
}

fn read_positive(
    conf: &Yaml,
    key: &str,
    default: i64,
    max: i64,
) -> Result<i64, SlotListConfigError> {
    let value = read_int(conf, key, default)?;
    if value <= 0 || value > max {
        return Err(SlotListConfigError::InvalidValue(format!(
            "{} should be in 1..={}, got {}",
            key, max, value
        )));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotListConfig {
    // slots per list
    pub capacity: u32,
    pub num_shards: usize,

    // random insert/remove rounds run by the demo after the walkthrough
    pub churn_rounds: usize,
    pub seed: u64,
}

impl Default for SlotListConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            num_shards: 1,
            churn_rounds: 0,
            seed: 42,
        }
    }
}

impl SlotListConfig {
    pub fn get() -> Result<Arc<RwLock<Self>>, SlotListConfigError> {
        let singleton = SLOTLIST_CONFIG.get();
        match singleton {
            Some(s) => Ok(s.clone()),
            None => Err(SlotListConfigError::NotReadyError),
        }
    }

    pub fn set(config_file: &Path) -> Result<(), SlotListConfigError> {
        let singleton = Self::from_yaml_file(config_file)?;
        Self::set_config(singleton)
    }

    pub fn set_config(singleton: Self) -> Result<(), SlotListConfigError> {
        tracing::info!("SlotListConfig parsed \n{:?}", singleton);
        let singleton = Arc::new(RwLock::new(singleton));
        let res = SLOTLIST_CONFIG.set(singleton);
        if res.is_err() {
            return Err(SlotListConfigError::SetError);
        }
        Ok(())
    }

    pub fn from_yaml_file(config_file: &Path) -> Result<Self, SlotListConfigError> {
        let content = std::fs::read_to_string(config_file)
            .map_err(|e| SlotListConfigError::ConfigFileError(format!("{:?}", e)))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, SlotListConfigError> {
        let conf = read_yaml(content)?;
        let default = Self::default();

        let capacity =
            read_positive(&conf, "capacity", default.capacity as i64, u32::MAX as i64)? as u32;
        let num_shards =
            read_positive(&conf, "num_shards", default.num_shards as i64, i64::MAX)? as usize;
        let churn_rounds = read_int(&conf, "churn_rounds", default.churn_rounds as i64)?;
        if churn_rounds < 0 {
            return Err(SlotListConfigError::InvalidValue(format!(
                "churn_rounds should not be negative, got {}",
                churn_rounds
            )));
        }
        let seed = read_int(&conf, "seed", default.seed as i64)? as u64;

        Ok(Self {
            capacity,
            num_shards,
            churn_rounds: churn_rounds as usize,
            seed,
        })
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_parse() {
        let conf = SlotListConfig::from_yaml_str(
            "SlotListConfig:\n  capacity: 64\n  num_shards: 4\n  churn_rounds: 1000\n  seed: 7\n",
        )
        .unwrap();
        assert_eq!(
            conf,
            SlotListConfig {
                capacity: 64,
                num_shards: 4,
                churn_rounds: 1000,
                seed: 7,
            }
        );
    }

    #[test]
    fn test_defaults() {
        let conf = SlotListConfig::from_yaml_str("SlotListConfig:\n  capacity: 3\n").unwrap();
        assert_eq!(conf.capacity, 3);
        assert_eq!(conf.num_shards, 1);
        assert_eq!(conf.churn_rounds, 0);
        assert_eq!(conf.seed, 42);

        let conf = SlotListConfig::from_yaml_str("Other: 1\n").unwrap();
        assert_eq!(conf, SlotListConfig::default());
    }

    #[test]
    fn test_invalid_values() {
        for content in &[
            "SlotListConfig:\n  capacity: 0\n",
            "SlotListConfig:\n  capacity: -5\n",
            "SlotListConfig:\n  capacity: 4294967296\n",
            "SlotListConfig:\n  capacity: ten\n",
            "SlotListConfig:\n  num_shards: 0\n",
            "SlotListConfig:\n  churn_rounds: -1\n",
        ] {
            assert!(matches!(
                SlotListConfig::from_yaml_str(content),
                Err(SlotListConfigError::InvalidValue(_))
            ));
        }
    }

    #[test]
    fn test_bad_files() {
        assert!(matches!(
            SlotListConfig::from_yaml_str(""),
            Err(SlotListConfigError::ConfigFileError(_))
        ));
        assert!(matches!(
            SlotListConfig::from_yaml_str("SlotListConfig: [unclosed\n"),
            Err(SlotListConfigError::ConfigFileError(_))
        ));
        assert!(matches!(
            SlotListConfig::from_yaml_file(Path::new("/nonexistent/slotlist.yml")),
            Err(SlotListConfigError::ConfigFileError(_))
        ));
    }

    #[test]
    fn test_singleton() {
        assert_eq!(
            SlotListConfig::get().unwrap_err(),
            SlotListConfigError::NotReadyError
        );

        let path = std::env::temp_dir().join(format!("slotlist-config-{}.yml", std::process::id()));
        std::fs::write(&path, "SlotListConfig:\n  capacity: 12\n").unwrap();
        SlotListConfig::set(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(SlotListConfig::get().unwrap().read().capacity, 12);
        assert_eq!(
            SlotListConfig::set_config(SlotListConfig::default()).unwrap_err(),
            SlotListConfigError::SetError
        );
    }
}
