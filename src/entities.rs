//! Entity views over the coordinator's snapshot
//!
//! One view per catalog descriptor. Views hold no state of their own: every
//! read goes to the latest published snapshot and every command goes through
//! [`PollCoordinator::write_register`].

use crate::catalog::{self, ActuatorDescriptor, SensorClass, SensorDescriptor};
use crate::codec::{self, SensorValue};
use crate::coordinator::PollCoordinator;
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

/// Current value of an entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityState {
    Sensor {
        value: Option<SensorValue>,
        unit: Option<&'static str>,
        class: SensorClass,
    },
    Switch {
        is_on: Option<bool>,
    },
}

/// Serializable summary of one entity
#[derive(Debug, Clone, Serialize)]
pub struct EntityReport {
    pub key: String,
    pub name: String,
    pub unique_id: String,
    pub device: &'static str,
    pub manufacturer: &'static str,
    pub available: bool,
    #[serde(flatten)]
    pub state: EntityState,
}

pub trait EntityView: Send + Sync {
    fn key(&self) -> &str;

    fn name(&self) -> &str;

    fn coordinator(&self) -> &PollCoordinator;

    fn state(&self) -> EntityState;

    /// `{device_id}_{key}`
    fn unique_id(&self) -> String {
        format!("{}_{}", self.coordinator().device_id(), self.key())
    }

    /// The most recent cycle succeeded and a snapshot exists
    fn available(&self) -> bool {
        let state = self.coordinator().state();
        state.last_update_success && state.data.is_some()
    }

    fn report(&self) -> EntityReport {
        EntityReport {
            key: self.key().to_string(),
            name: self.name().to_string(),
            unique_id: self.unique_id(),
            device: catalog::DEVICE_NAME,
            manufacturer: catalog::MANUFACTURER,
            available: self.available(),
            state: self.state(),
        }
    }
}

/// Read-only view of one sensor
pub struct SensorView {
    descriptor: &'static SensorDescriptor,
    name: String,
    address: u16,
    coordinator: Arc<PollCoordinator>,
}

impl SensorView {
    pub fn new(descriptor: &'static SensorDescriptor, coordinator: Arc<PollCoordinator>) -> Self {
        let registers = coordinator.registers();
        let name = registers.display_name(descriptor.key, descriptor.name);
        let address = registers.sensor_address(descriptor);
        Self {
            descriptor,
            name,
            address,
            coordinator,
        }
    }

    pub fn descriptor(&self) -> &'static SensorDescriptor {
        self.descriptor
    }

    /// Effective read address
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Decoded value, `None` before the first good cycle
    pub fn native_value(&self) -> Option<SensorValue> {
        let data = self.coordinator.data()?;
        codec::decode(
            data.get(self.address),
            self.descriptor.encoding,
            self.descriptor.scale,
        )
    }
}

impl EntityView for SensorView {
    fn key(&self) -> &str {
        self.descriptor.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn coordinator(&self) -> &PollCoordinator {
        &self.coordinator
    }

    fn state(&self) -> EntityState {
        EntityState::Sensor {
            value: self.native_value(),
            unit: self.descriptor.unit,
            class: self.descriptor.class,
        }
    }
}

/// On/off view of one actuator
pub struct ActuatorView {
    descriptor: &'static ActuatorDescriptor,
    name: String,
    write_address: u16,
    verify_address: u16,
    coordinator: Arc<PollCoordinator>,
}

impl ActuatorView {
    pub fn new(descriptor: &'static ActuatorDescriptor, coordinator: Arc<PollCoordinator>) -> Self {
        let registers = coordinator.registers();
        let name = registers.display_name(descriptor.key, descriptor.name);
        let write_address = registers.write_address(descriptor);
        let verify_address = registers.verify_address(descriptor);
        Self {
            descriptor,
            name,
            write_address,
            verify_address,
            coordinator,
        }
    }

    pub fn descriptor(&self) -> &'static ActuatorDescriptor {
        self.descriptor
    }

    pub fn write_address(&self) -> u16 {
        self.write_address
    }

    pub fn verify_address(&self) -> u16 {
        self.verify_address
    }

    /// State as reported by the device; unknown without a reading
    pub fn is_on(&self) -> Option<bool> {
        let raw = self.coordinator.data()?.get(self.verify_address)?;
        Some(raw != self.descriptor.off_value)
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.coordinator
            .write_register(self.write_address, self.descriptor.on_value)
            .await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.coordinator
            .write_register(self.write_address, self.descriptor.off_value)
            .await
    }
}

impl EntityView for ActuatorView {
    fn key(&self) -> &str {
        self.descriptor.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn coordinator(&self) -> &PollCoordinator {
        &self.coordinator
    }

    fn state(&self) -> EntityState {
        EntityState::Switch {
            is_on: self.is_on(),
        }
    }
}

/// Every entity of the device, built from the catalog
pub struct EntityRegistry {
    sensors: Vec<SensorView>,
    switches: Vec<ActuatorView>,
}

impl EntityRegistry {
    pub fn build(coordinator: &Arc<PollCoordinator>) -> Self {
        let sensors = catalog::SENSORS
            .iter()
            .map(|d| SensorView::new(d, coordinator.clone()))
            .collect();
        let switches = catalog::ACTUATORS
            .iter()
            .map(|d| ActuatorView::new(d, coordinator.clone()))
            .collect();
        Self { sensors, switches }
    }

    pub fn sensors(&self) -> &[SensorView] {
        &self.sensors
    }

    pub fn switches(&self) -> &[ActuatorView] {
        &self.switches
    }

    pub fn sensor(&self, key: &str) -> Option<&SensorView> {
        self.sensors.iter().find(|s| s.key() == key)
    }

    pub fn switch(&self, key: &str) -> Option<&ActuatorView> {
        self.switches.iter().find(|s| s.key() == key)
    }

    pub fn all(&self) -> impl Iterator<Item = &dyn EntityView> {
        self.sensors
            .iter()
            .map(|s| s as &dyn EntityView)
            .chain(self.switches.iter().map(|s| s as &dyn EntityView))
    }
}
