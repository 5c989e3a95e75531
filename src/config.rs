use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, ensure};
use serde_derive::Deserialize;

use crate::advertisement::FilterCriteria;

/// https://bitbucket.org/bluetooth-SIG/public/src/main/assigned_numbers/company_identifiers/company_identifiers.yaml
pub const APPLE_COMPANY_ID: u16 = 0x004C;

const DEFAULT_MIN_RSSI: i16 = -60;
const DEFAULT_SCAN_DURATION_MILLIS: u64 = 5000;
const DEFAULT_RETRY_ATTEMPTS: u32 = 10;
const DEFAULT_RETRY_DELAY_MILLIS: u64 = 500;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct AppConfig {
    pub scan: Option<ScanConfig>,
    pub retry: Option<RetryConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ScanConfig {
    pub company_id: Option<u16>,
    pub min_rssi: Option<i16>,
    pub duration_millis: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    pub delay_millis: Option<u64>,
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: AppConfig = toml::de::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.retry_attempts() >= 1, "retry.attempts must be at least 1");
        ensure!(
            !self.scan_duration().is_zero(),
            "scan.duration_millis must be greater than 0"
        );
        Ok(())
    }

    pub fn criteria(&self) -> FilterCriteria {
        let scan = self.scan.clone().unwrap_or_default();
        FilterCriteria {
            company_id: scan.company_id.unwrap_or(APPLE_COMPANY_ID),
            min_rssi: scan.min_rssi.unwrap_or(DEFAULT_MIN_RSSI),
        }
    }

    pub fn scan_duration(&self) -> Duration {
        let millis = self
            .scan
            .as_ref()
            .and_then(|s| s.duration_millis)
            .unwrap_or(DEFAULT_SCAN_DURATION_MILLIS);
        Duration::from_millis(millis)
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry
            .as_ref()
            .and_then(|r| r.attempts)
            .unwrap_or(DEFAULT_RETRY_ATTEMPTS)
    }

    pub fn retry_delay(&self) -> Duration {
        let millis = self
            .retry
            .as_ref()
            .and_then(|r| r.delay_millis)
            .unwrap_or(DEFAULT_RETRY_DELAY_MILLIS);
        Duration::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config() {
        let config_str = r#"
            [scan]
            company_id = 76
            min_rssi = -70
            duration_millis = 3000

            [retry]
            attempts = 5
            delay_millis = 250
        "#;
        let config: AppConfig = toml::de::from_str(config_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.criteria().company_id, APPLE_COMPANY_ID);
        assert_eq!(config.criteria().min_rssi, -70);
        assert_eq!(config.scan_duration(), Duration::from_millis(3000));
        assert_eq!(config.retry_attempts(), 5);
        assert_eq!(config.retry_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::de::from_str("").unwrap();
        assert_eq!(config.criteria().company_id, 76);
        assert_eq!(config.criteria().min_rssi, -60);
        assert_eq!(config.retry_attempts(), 10);
        assert_eq!(config.retry_delay(), Duration::from_millis(500));
        assert_eq!(config.scan_duration(), Duration::from_secs(5));

        let partial: AppConfig = toml::de::from_str("[retry]\ndelay_millis = 0").unwrap();
        assert_eq!(partial.retry_attempts(), 10);
        assert_eq!(partial.retry_delay(), Duration::ZERO);
        assert!(partial.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let config: AppConfig = toml::de::from_str("[retry]\nattempts = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_scan_window() {
        let config: AppConfig = toml::de::from_str("[scan]\nduration_millis = 0").unwrap();
        assert!(config.validate().is_err());
    }
}
