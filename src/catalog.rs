//! Static register catalog of the Wanas heat recovery unit
//!
//! Each sensor and switch the device exposes is described once here. The
//! descriptors are immutable; per-installation address and name overrides
//! live in [`crate::registers::RegisterMap`].

use crate::registers::{RegisterMap, RegisterSetting};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Device name shown for every entity
pub const DEVICE_NAME: &str = "Wanas Rekuperator";

/// Device manufacturer
pub const MANUFACTURER: &str = "Wanas";

/// How a raw 16-bit holding register is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegisterEncoding {
    /// Raw magnitude, 0..=65535
    Unsigned16,
    /// Two's complement, -32768..=32767
    Signed16,
}

/// Semantic classification of a sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SensorClass {
    /// Temperature measurement
    Temperature,
    /// Generic instantaneous measurement (airflow)
    Measurement,
    /// Device state or counter without a physical classification
    State,
}

/// Describes one read-only value of the device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub address: u16,
    pub encoding: RegisterEncoding,
    pub scale: Option<f64>,
    pub unit: Option<&'static str>,
    pub class: SensorClass,
}

/// Describes one on/off actuator of the device
///
/// The device is the source of truth: the switch is "on" whenever the
/// register at `verify_address` holds anything other than `off_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActuatorDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub write_address: u16,
    pub verify_address: u16,
    pub on_value: u16,
    pub off_value: u16,
}

const fn plain(key: &'static str, name: &'static str, address: u16) -> SensorDescriptor {
    SensorDescriptor {
        key,
        name,
        address,
        encoding: RegisterEncoding::Unsigned16,
        scale: None,
        unit: None,
        class: SensorClass::State,
    }
}

const fn signed(key: &'static str, name: &'static str, address: u16) -> SensorDescriptor {
    SensorDescriptor {
        key,
        name,
        address,
        encoding: RegisterEncoding::Signed16,
        scale: None,
        unit: None,
        class: SensorClass::State,
    }
}

const fn airflow(key: &'static str, name: &'static str, address: u16) -> SensorDescriptor {
    SensorDescriptor {
        key,
        name,
        address,
        encoding: RegisterEncoding::Unsigned16,
        scale: None,
        unit: Some("m³/h"),
        class: SensorClass::Measurement,
    }
}

const fn temperature(key: &'static str, name: &'static str, address: u16) -> SensorDescriptor {
    SensorDescriptor {
        key,
        name,
        address,
        encoding: RegisterEncoding::Signed16,
        scale: Some(0.1),
        unit: Some("°C"),
        class: SensorClass::Temperature,
    }
}

const fn switch(
    key: &'static str,
    name: &'static str,
    write_address: u16,
    verify_address: u16,
    on_value: u16,
) -> ActuatorDescriptor {
    ActuatorDescriptor {
        key,
        name,
        write_address,
        verify_address,
        on_value,
        off_value: 0,
    }
}

/// All sensors, in display order
pub static SENSORS: &[SensorDescriptor] = &[
    airflow("supply_airflow", "Wydatek nawiewu", 0),
    airflow("exhaust_airflow", "Wydatek wywiewu", 1),
    plain("supply_fan_speed", "Bieg nawiewu", 2),
    plain("exhaust_fan_speed", "Bieg wywiewu", 3),
    temperature("outdoor_temperature", "Temperatura zewnętrzna", 4),
    temperature("exhaust_temperature", "Temperatura wyrzutowa", 5),
    temperature("supply_temperature", "Temperatura nawiewu", 6),
    temperature("indoor_temperature", "Temperatura wewnątrz", 7),
    temperature("current_temperature", "Aktualna temperatura", 29),
    plain("bypass_state", "Stan bypass", 31),
    plain("humidifier_state", "Stan nawilżacza", 32),
    plain("heater_state", "Stan nagrzewnicy", 33),
    plain("cooler_state", "Stan chłodnicy", 34),
    plain("vacation_mode", "Tryb urlopowy", 35),
    SensorDescriptor {
        unit: Some("d"),
        ..plain("filter_replacement", "Wymiana filtra", 36)
    },
    SensorDescriptor {
        scale: Some(0.17),
        unit: Some("min"),
        ..signed("party_time", "Impreza (czas)", 45)
    },
    signed("fan_speed_1", "Bieg I", 46),
    signed("fan_speed_3", "Bieg III", 47),
    signed("hood_state", "Okap - stan", 48),
];

/// All switches, in display order
///
/// Fireplace and party are commanded and verified through the same register.
pub static ACTUATORS: &[ActuatorDescriptor] = &[
    switch("bypass", "Bypass", 39, 31, 1),
    switch("humidifier", "Nawilżacz", 40, 32, 1),
    switch("heater", "Nagrzewnica", 41, 33, 1),
    switch("cooler", "Chłodnica", 42, 34, 1),
    switch("vacation", "Urlop", 43, 35, 30),
    switch("fireplace", "Kominek", 44, 44, 180),
    switch("party", "Impreza", 45, 45, 720),
];

/// Find a sensor descriptor by key
pub fn sensor(key: &str) -> Option<&'static SensorDescriptor> {
    SENSORS.iter().find(|d| d.key == key)
}

/// Find a switch descriptor by key
pub fn actuator(key: &str) -> Option<&'static ActuatorDescriptor> {
    ACTUATORS.iter().find(|d| d.key == key)
}

/// Default register map seeded from the catalog
pub fn default_registers() -> RegisterMap {
    let mut regs = RegisterMap::default();
    for desc in SENSORS {
        regs.insert(
            format!("{}_address", desc.key),
            RegisterSetting::Address(desc.address),
        );
    }
    for desc in ACTUATORS {
        regs.insert(
            format!("{}_write_address", desc.key),
            RegisterSetting::Address(desc.write_address),
        );
        regs.insert(
            format!("{}_verify_address", desc.key),
            RegisterSetting::Address(desc.verify_address),
        );
    }
    regs
}
