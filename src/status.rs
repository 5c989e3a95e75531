use std::fmt;

use serde::ser::{Serialize, SerializeStruct as _, Serializer};
use serde_derive::Serialize;

/// Earbud models recognised from the proximity pairing payload.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    #[serde(rename = "Airpods 1")]
    AirPods1,
    #[serde(rename = "Airpods 2")]
    AirPods2,
    #[serde(rename = "Airpods Pro")]
    AirPodsPro,
    #[serde(rename = "Airpods Max")]
    AirPodsMax,
    Unknown,
}

impl Model {
    /// Looks up the model from its hex digit. Only lowercase digits match.
    pub fn from_digit(digit: char) -> Self {
        match digit {
            '2' => Model::AirPods1,
            'f' => Model::AirPods2,
            'e' => Model::AirPodsPro,
            'a' => Model::AirPodsMax,
            _ => Model::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Model::AirPods1 => "Airpods 1",
            Model::AirPods2 => "Airpods 2",
            Model::AirPodsPro => "Airpods Pro",
            Model::AirPodsMax => "Airpods Max",
            Model::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per component: both earbuds and the case.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Components<T> {
    pub left: T,
    pub right: T,
    pub case: T,
}

impl<T> Components<T> {
    /// Exchanges the left and right values when `flipped`, leaving the case alone.
    pub fn oriented(self, flipped: bool) -> Self {
        if flipped {
            Components {
                left: self.right,
                right: self.left,
                case: self.case,
            }
        } else {
            self
        }
    }
}

/// Decoded battery and charging state of a pair of earbuds.
///
/// A battery level is a percentage in steps of ten, or `None` when the
/// payload carries no reliable reading for that component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub connected: bool,
    pub model: Model,
    pub charge: Components<Option<u8>>,
    pub charging: Components<bool>,
}

impl Serialize for DeviceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DeviceStatus", 6)?;
        state.serialize_field("connected", &self.connected)?;
        state.serialize_field("model", &self.model)?;
        state.serialize_field("charge", &self.charge)?;
        state.serialize_field("charging_left", &self.charging.left)?;
        state.serialize_field("charging_right", &self.charging.right)?;
        state.serialize_field("charging_case", &self.charging.case)?;
        state.end()
    }
}

/// Line printed when no device could be found.
#[derive(Serialize, Debug)]
pub struct Disconnected {
    connected: bool,
}

impl Default for Disconnected {
    fn default() -> Self {
        Disconnected { connected: false }
    }
}
