use std::time::Duration;

use log::{debug, warn};

use crate::advertisement::{FilterCriteria, select_payload};
use crate::decoder::{DecodeError, RawPayload, decode};
use crate::retry::retry;
use crate::scanner::AdvertisementSource;
use crate::status::DeviceStatus;

pub struct Manager<S> {
    source: S,
    criteria: FilterCriteria,
    attempts: u32,
    delay: Duration,
}

impl<S: AdvertisementSource> Manager<S> {
    pub fn new(source: S, criteria: FilterCriteria, attempts: u32, delay: Duration) -> Self {
        Manager {
            source,
            criteria,
            attempts,
            delay,
        }
    }

    /// One scan followed by payload selection. A failed scan counts as an empty one.
    async fn scan_once(&self) -> Option<RawPayload> {
        match self.source.discover().await {
            Ok(records) => {
                debug!("Filtering {} advertisements", records.len());
                select_payload(&records, &self.criteria)
            }
            Err(err) => {
                warn!("Scan failed: {err:#}");
                None
            }
        }
    }

    /// Polls until a payload turns up or the attempts run out. `Ok(None)` means
    /// no device was found.
    pub async fn poll(&self) -> Result<Option<DeviceStatus>, DecodeError> {
        match retry(self.attempts, self.delay, || self.scan_once()).await {
            Some(payload) => decode(&payload).map(Some),
            None => Ok(None),
        }
    }
}
