//! Effective register map
//!
//! A flat key/value map (`{sensor}_address`, `{switch}_write_address`,
//! `{switch}_verify_address`, `{key}_name`) seeded from the catalog and
//! overlaid with per-installation overrides. Built once at startup and never
//! mutated afterwards.

use crate::catalog::{self, ActuatorDescriptor, SensorDescriptor};
use crate::error::{Result, WanasError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single override value: a register address or a display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RegisterSetting {
    Address(u16),
    Name(String),
}

/// Map of register keys to their effective settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RegisterMap(BTreeMap<String, RegisterSetting>);

impl RegisterMap {
    /// Catalog defaults with `overrides` applied on top (override wins)
    pub fn effective(overrides: &RegisterMap) -> Self {
        let mut regs = catalog::default_registers();
        for (key, value) in &overrides.0 {
            regs.0.insert(key.clone(), value.clone());
        }
        regs
    }

    pub fn insert(&mut self, key: String, value: RegisterSetting) {
        self.0.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Integer address stored under `key`, if any
    pub fn address(&self, key: &str) -> Option<u16> {
        match self.0.get(key) {
            Some(RegisterSetting::Address(a)) => Some(*a),
            _ => None,
        }
    }

    /// Effective read address of a sensor
    pub fn sensor_address(&self, desc: &SensorDescriptor) -> u16 {
        self.address(&format!("{}_address", desc.key))
            .unwrap_or(desc.address)
    }

    /// Effective command address of a switch
    pub fn write_address(&self, desc: &ActuatorDescriptor) -> u16 {
        self.address(&format!("{}_write_address", desc.key))
            .unwrap_or(desc.write_address)
    }

    /// Effective state read-back address of a switch
    pub fn verify_address(&self, desc: &ActuatorDescriptor) -> u16 {
        self.address(&format!("{}_verify_address", desc.key))
            .unwrap_or(desc.verify_address)
    }

    /// Display name for `key`, falling back to `default`
    pub fn display_name(&self, key: &str, default: &str) -> String {
        match self.0.get(&format!("{}_name", key)) {
            Some(RegisterSetting::Name(n)) if !n.trim().is_empty() => n.clone(),
            _ => default.to_string(),
        }
    }

    /// Every integer address declared under an `*_address` key.
    ///
    /// `*_write_address` and `*_verify_address` are included since they also
    /// end in `_address`; duplicates are left for the planner to collapse.
    pub fn polled_addresses(&self) -> Vec<u16> {
        self.0
            .iter()
            .filter(|(k, _)| k.ends_with("_address"))
            .filter_map(|(_, v)| match v {
                RegisterSetting::Address(a) => Some(*a),
                RegisterSetting::Name(_) => None,
            })
            .collect()
    }

    /// Check that every key carries the value type its suffix implies
    pub fn validate(&self) -> Result<()> {
        for (key, value) in &self.0 {
            let field = format!("registers.{}", key);
            if key.ends_with("_address") {
                if !matches!(value, RegisterSetting::Address(_)) {
                    return Err(WanasError::validation(
                        field.as_str(),
                        "must be an integer register address",
                    ));
                }
            } else if key.ends_with("_name") {
                if !matches!(value, RegisterSetting::Name(_)) {
                    return Err(WanasError::validation(
                        field.as_str(),
                        "must be a display name string",
                    ));
                }
            } else {
                return Err(WanasError::validation(
                    field.as_str(),
                    "unrecognized key; expected *_address or *_name",
                ));
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, RegisterSetting)> for RegisterMap {
    fn from_iter<I: IntoIterator<Item = (String, RegisterSetting)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
