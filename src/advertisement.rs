use std::collections::HashMap;

use log::{info, trace};

use crate::decoder::RawPayload;

/// A single advertisement observed during one discovery window.
#[derive(Clone, Debug, Default)]
pub struct AdvertisementRecord {
    pub address: String,
    pub rssi: Option<i16>,
    pub manufacturer_data: HashMap<u16, Vec<u8>>,
}

/// What an advertisement must carry to be decoded.
#[derive(Clone, Copy, Debug)]
pub struct FilterCriteria {
    pub company_id: u16,
    pub min_rssi: i16,
}

/// Returns the payload of the first record that passes the company, signal
/// strength and length checks, in scan order.
pub fn select_payload(
    records: &[AdvertisementRecord],
    criteria: &FilterCriteria,
) -> Option<RawPayload> {
    records.iter().find_map(|record| {
        let Some(data) = record.manufacturer_data.get(&criteria.company_id) else {
            trace!(
                "{}: no data for company 0x{:04x}",
                record.address, criteria.company_id
            );
            return None;
        };

        match record.rssi {
            Some(rssi) if rssi >= criteria.min_rssi => {}
            rssi => {
                trace!("{}: signal too weak ({:?})", record.address, rssi);
                return None;
            }
        }

        match RawPayload::from_bytes(data) {
            Ok(payload) => {
                info!("Selected payload from {}: {}", record.address, payload);
                Some(payload)
            }
            Err(err) => {
                trace!("{}: {}", record.address, err);
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPLE: u16 = 0x004C;

    fn criteria() -> FilterCriteria {
        FilterCriteria {
            company_id: APPLE,
            min_rssi: -60,
        }
    }

    fn record(
        address: &str,
        rssi: Option<i16>,
        company_id: u16,
        data: Vec<u8>,
    ) -> AdvertisementRecord {
        AdvertisementRecord {
            address: address.to_string(),
            rssi,
            manufacturer_data: HashMap::from([(company_id, data)]),
        }
    }

    #[test]
    fn test_selects_only_qualifying_record() {
        let records = vec![
            record("other-vendor", Some(-40), 0x0006, vec![0x11; 27]),
            record("too-weak", Some(-61), APPLE, vec![0x22; 27]),
            record("no-rssi", None, APPLE, vec![0x33; 27]),
            record("too-short", Some(-40), APPLE, vec![0x44; 26]),
            record("too-long", Some(-40), APPLE, vec![0x55; 28]),
            record("airpods", Some(-50), APPLE, vec![0x66; 27]),
        ];

        let payload = select_payload(&records, &criteria()).unwrap();
        assert_eq!(payload.as_str(), "66".repeat(27));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let records = vec![record("edge", Some(-60), APPLE, vec![0x01; 27])];
        assert!(select_payload(&records, &criteria()).is_some());
    }

    #[test]
    fn test_first_match_wins() {
        let records = vec![
            record("first", Some(-59), APPLE, vec![0xaa; 27]),
            record("second", Some(-30), APPLE, vec![0xbb; 27]),
        ];
        let payload = select_payload(&records, &criteria()).unwrap();
        assert_eq!(payload.as_str(), "aa".repeat(27));
    }

    #[test]
    fn test_no_qualifying_record() {
        assert!(select_payload(&[], &criteria()).is_none());

        let records = vec![
            record("far", Some(-80), APPLE, vec![0x01; 27]),
            record("farther", Some(-90), APPLE, vec![0x01; 27]),
        ];
        assert!(select_payload(&records, &criteria()).is_none());
    }

    #[test]
    fn test_records_are_left_untouched() {
        let records = vec![record("airpods", Some(-50), APPLE, vec![0x07; 27])];
        select_payload(&records, &criteria()).unwrap();
        assert_eq!(records[0].manufacturer_data.get(&APPLE), Some(&vec![0x07; 27]));
    }
}
