//! Decoder for the proximity pairing payload broadcast by AirPods.
//!
//! The payload is handled in its lowercase hex encoding: 27 bytes become 54
//! characters, and every field the decoder needs sits in a single character.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::status::{Components, DeviceStatus, Model};

/// Length of an encoded payload in hex characters (27 bytes).
pub const PAYLOAD_HEX_LEN: usize = 54;

const MODEL_INDEX: usize = 7;
const ORIENTATION_INDEX: usize = 10;
const RIGHT_BATTERY_INDEX: usize = 12;
const LEFT_BATTERY_INDEX: usize = 13;
const CHARGING_INDEX: usize = 14;
const CASE_BATTERY_INDEX: usize = 15;

const MASK_ORIENTATION: u8 = 0x02;
const MASK_CHARGING_LEFT: u8 = 0b001;
const MASK_CHARGING_RIGHT: u8 = 0b010;
const MASK_CHARGING_CASE: u8 = 0b100;

const MAX_BATTERY_DIGIT: u8 = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Payload length mismatch: expected {expected} hex characters, got {actual} bytes")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid hex digit {found:?} at index {index}")]
    InvalidHexDigit { index: usize, found: char },
}

/// A hex encoded proximity payload of exactly [`PAYLOAD_HEX_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload(String);

impl RawPayload {
    /// Encodes the raw manufacturer data, rejecting blobs of the wrong size.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        hex::encode(data).parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn char_at(&self, index: usize) -> char {
        char::from(self.0.as_bytes()[index])
    }

    fn digit_at(&self, index: usize) -> Result<u8, DecodeError> {
        let found = self.char_at(index);
        found
            .to_digit(16)
            .map(|digit| digit as u8)
            .ok_or(DecodeError::InvalidHexDigit { index, found })
    }
}

impl FromStr for RawPayload {
    type Err = DecodeError;

    /// Accepts any ASCII string of the right length; hex digits are checked when decoding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != PAYLOAD_HEX_LEN {
            return Err(DecodeError::InvalidLength {
                expected: PAYLOAD_HEX_LEN,
                actual: s.len(),
            });
        }
        if let Some((index, found)) = s.char_indices().find(|(_, c)| !c.is_ascii()) {
            return Err(DecodeError::InvalidHexDigit { index, found });
        }
        Ok(RawPayload(s.to_string()))
    }
}

impl fmt::Display for RawPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a battery digit to a percentage. Digits above ten carry no reading.
pub fn battery_level(digit: u8) -> Option<u8> {
    (digit <= MAX_BATTERY_DIGIT).then(|| digit * 10)
}

/// Whether the earbuds report their left and right halves swapped.
pub fn is_flipped(raw: &RawPayload) -> Result<bool, DecodeError> {
    Ok(raw.digit_at(ORIENTATION_INDEX)? & MASK_ORIENTATION == 0)
}

pub fn decode(raw: &RawPayload) -> Result<DeviceStatus, DecodeError> {
    let model = Model::from_digit(raw.char_at(MODEL_INDEX));

    let charge = Components {
        left: battery_level(raw.digit_at(LEFT_BATTERY_INDEX)?),
        right: battery_level(raw.digit_at(RIGHT_BATTERY_INDEX)?),
        case: battery_level(raw.digit_at(CASE_BATTERY_INDEX)?),
    };

    let flags = raw.digit_at(CHARGING_INDEX)?;
    let charging = Components {
        left: flags & MASK_CHARGING_LEFT != 0,
        right: flags & MASK_CHARGING_RIGHT != 0,
        case: flags & MASK_CHARGING_CASE != 0,
    };

    let flipped = is_flipped(raw)?;

    Ok(DeviceStatus {
        connected: true,
        model,
        charge: charge.oriented(flipped),
        charging: charging.oriented(flipped),
    })
}
