//! In-memory device used by unit tests

use crate::config::ConnectionConfig;
use crate::error::{Result, WanasError};
use crate::transport::{ModbusTransport, TransportFactory};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct DeviceState {
    registers: HashMap<u16, u16>,
    mirrors: HashMap<u16, u16>,
    epoch: u64,
    connects: usize,
    closes: usize,
    reads: Vec<(u16, u16)>,
    writes: Vec<(u16, u16)>,
    events: Vec<String>,
    in_flight: usize,
    max_in_flight: usize,
    refuse_connects: bool,
    read_exception: bool,
    read_transport_failure: bool,
    write_exception: bool,
    write_transport_failure: bool,
    delay: Option<Duration>,
}

/// Simulated register bank shared by every transport a factory hands out
#[derive(Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut DeviceState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut guard)
    }

    pub fn set(&self, address: u16, value: u16) {
        self.with(|s| s.registers.insert(address, value));
    }

    pub fn get(&self, address: u16) -> Option<u16> {
        self.with(|s| s.registers.get(&address).copied())
    }

    /// Writes to `write` also land in `verify`
    pub fn mirror(&self, write: u16, verify: u16) {
        self.with(|s| s.mirrors.insert(write, verify));
    }

    /// Invalidate every open transport, as a dropped socket would
    pub fn drop_links(&self) {
        self.with(|s| s.epoch += 1);
    }

    pub fn refuse_connects(&self, on: bool) {
        self.with(|s| s.refuse_connects = on);
    }

    pub fn fail_reads_with_exception(&self, on: bool) {
        self.with(|s| s.read_exception = on);
    }

    pub fn fail_reads_with_transport(&self, on: bool) {
        self.with(|s| s.read_transport_failure = on);
    }

    pub fn fail_writes_with_exception(&self, on: bool) {
        self.with(|s| s.write_exception = on);
    }

    pub fn fail_writes_with_transport(&self, on: bool) {
        self.with(|s| s.write_transport_failure = on);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.with(|s| s.delay = Some(delay));
    }

    pub fn connects(&self) -> usize {
        self.with(|s| s.connects)
    }

    pub fn closes(&self) -> usize {
        self.with(|s| s.closes)
    }

    pub fn reads(&self) -> Vec<(u16, u16)> {
        self.with(|s| s.reads.clone())
    }

    pub fn writes(&self) -> Vec<(u16, u16)> {
        self.with(|s| s.writes.clone())
    }

    pub fn events(&self) -> Vec<String> {
        self.with(|s| s.events.clone())
    }

    pub fn max_in_flight(&self) -> usize {
        self.with(|s| s.max_in_flight)
    }

    async fn begin(&self, label: String) {
        let delay = self.with(|s| {
            s.in_flight += 1;
            s.max_in_flight = s.max_in_flight.max(s.in_flight);
            s.events.push(format!("{label}:start"));
            s.delay
        });
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }

    fn end(&self, label: String) {
        self.with(|s| {
            s.in_flight -= 1;
            s.events.push(format!("{label}:end"));
        });
    }
}

pub struct MockTransport {
    device: MockDevice,
    epoch: Option<u64>,
}

#[async_trait::async_trait]
impl ModbusTransport for MockTransport {
    async fn connect(&mut self) -> Result<()> {
        let outcome = self.device.with(|s| {
            s.connects += 1;
            if s.refuse_connects {
                None
            } else {
                Some(s.epoch)
            }
        });
        match outcome {
            Some(epoch) => {
                self.epoch = Some(epoch);
                Ok(())
            }
            None => Err(WanasError::connect("mock", 502, "refused")),
        }
    }

    fn is_connected(&self) -> bool {
        let current = self.device.with(|s| s.epoch);
        self.epoch == Some(current)
    }

    async fn read_holding_registers(
        &mut self,
        _unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>> {
        if !self.is_connected() {
            return Err(WanasError::transport("not connected"));
        }
        let label = format!("read:{address}");
        self.device.begin(label.clone()).await;
        let result = self.device.with(|s| {
            s.reads.push((address, count));
            if s.read_transport_failure {
                s.epoch += 1;
                return Err(WanasError::transport("connection reset"));
            }
            if s.read_exception {
                return Err(WanasError::protocol(address, "IllegalDataAddress"));
            }
            Ok((address..address + count)
                .map(|a| s.registers.get(&a).copied().unwrap_or(0))
                .collect())
        });
        self.device.end(label);
        result
    }

    async fn write_register(&mut self, _unit_id: u8, address: u16, value: u16) -> Result<()> {
        if !self.is_connected() {
            return Err(WanasError::transport("not connected"));
        }
        let label = format!("write:{address}:{value}");
        self.device.begin(label.clone()).await;
        let result = self.device.with(|s| {
            s.writes.push((address, value));
            if s.write_transport_failure {
                s.epoch += 1;
                return Err(WanasError::transport("broken pipe"));
            }
            if s.write_exception {
                return Err(WanasError::protocol(address, "IllegalDataValue"));
            }
            s.registers.insert(address, value);
            if let Some(&verify) = s.mirrors.get(&address) {
                s.registers.insert(verify, value);
            }
            Ok(())
        });
        self.device.end(label);
        result
    }

    async fn close(&mut self) {
        if self.epoch.take().is_some() {
            self.device.with(|s| s.closes += 1);
        }
    }
}

pub struct MockFactory {
    device: MockDevice,
}

impl MockFactory {
    pub fn new(device: MockDevice) -> Self {
        Self { device }
    }
}

impl TransportFactory for MockFactory {
    fn create(&self, _config: &ConnectionConfig) -> Box<dyn ModbusTransport> {
        Box::new(MockTransport {
            device: self.device.clone(),
            epoch: None,
        })
    }
}
