use std::time::Duration;

use anyhow::Context as _;
use btleplug::api::{Central as _, Manager as _, Peripheral as _, PeripheralProperties, ScanFilter};
use btleplug::platform::{Adapter, Manager};
use futures::future::join_all;
use log::{debug, info, trace};

use crate::advertisement::AdvertisementRecord;

/// Produces one batch of advertisements per call.
pub trait AdvertisementSource {
    async fn discover(&self) -> anyhow::Result<Vec<AdvertisementRecord>>;
}

impl From<PeripheralProperties> for AdvertisementRecord {
    fn from(properties: PeripheralProperties) -> Self {
        AdvertisementRecord {
            address: properties.address.to_string(),
            rssi: properties.rssi,
            manufacturer_data: properties.manufacturer_data,
        }
    }
}

pub struct Scanner {
    adapter: Adapter,
    window: Duration,
}

impl Scanner {
    /// Uses the first Bluetooth adapter of the platform.
    pub async fn new(window: Duration) -> anyhow::Result<Self> {
        let manager = Manager::new()
            .await
            .context("connecting to the Bluetooth stack")?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .context("no Bluetooth adapter found")?;
        info!("Using Bluetooth adapter {}", adapter.adapter_info().await?);
        Ok(Scanner { adapter, window })
    }

    async fn collect(&self) -> anyhow::Result<Vec<AdvertisementRecord>> {
        tokio::time::sleep(self.window).await;
        let peripherals = self.adapter.peripherals().await?;
        let reads = join_all(peripherals.iter().map(|p| p.properties())).await;
        Ok(readable_records(reads))
    }
}

/// Keeps the peripherals whose properties could be read. A peripheral that
/// vanished mid-scan is skipped without failing the batch.
fn readable_records(
    reads: impl IntoIterator<Item = btleplug::Result<Option<PeripheralProperties>>>,
) -> Vec<AdvertisementRecord> {
    reads
        .into_iter()
        .filter_map(|read| match read {
            Ok(properties) => properties.map(AdvertisementRecord::from),
            Err(err) => {
                trace!("Skipping peripheral: {err}");
                None
            }
        })
        .collect()
}

impl AdvertisementSource for Scanner {
    async fn discover(&self) -> anyhow::Result<Vec<AdvertisementRecord>> {
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .context("starting scan")?;

        let records = self.collect().await;
        let stopped = self.adapter.stop_scan().await.context("stopping scan");

        let records = records?;
        stopped?;
        debug!("Scan saw {} devices", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn properties(rssi: i16, data: Vec<u8>) -> PeripheralProperties {
        PeripheralProperties {
            rssi: Some(rssi),
            manufacturer_data: HashMap::from([(0x004C, data)]),
            ..Default::default()
        }
    }

    #[test]
    fn test_failed_reads_do_not_drop_batch() {
        let reads = vec![
            Err(btleplug::Error::DeviceNotFound),
            Ok(Some(properties(-50, vec![0x07; 27]))),
            Ok(None),
            Err(btleplug::Error::NotConnected),
            Ok(Some(properties(-70, vec![0x01; 4]))),
        ];

        let records = readable_records(reads);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rssi, Some(-50));
        assert_eq!(records[0].manufacturer_data.get(&0x004C), Some(&vec![0x07; 27]));
        assert_eq!(records[1].rssi, Some(-70));
    }

    #[test]
    fn test_all_reads_failing_yields_empty_batch() {
        let reads = vec![
            Err(btleplug::Error::DeviceNotFound),
            Err(btleplug::Error::DeviceNotFound),
        ];
        assert!(readable_records(reads).is_empty());
    }
}
