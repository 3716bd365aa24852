//! Transport capability consumed by the connection manager
//!
//! The request/response primitive itself (framing, CRC, socket handling) lives
//! behind [`ModbusTransport`]; [`crate::modbus::ModbusClient`] is the
//! production implementation.

use crate::config::ConnectionConfig;
use crate::error::Result;

#[async_trait::async_trait]
pub trait ModbusTransport: Send {
    /// Establish the connection. Errors when the device cannot be reached.
    async fn connect(&mut self) -> Result<()>;

    /// Whether the transport believes its connection is usable
    fn is_connected(&self) -> bool;

    /// Read `count` holding registers starting at `address`.
    ///
    /// An exception response from the device is a `Protocol` error; any I/O
    /// failure is a `Transport` or `Timeout` error.
    async fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>>;

    /// Write a single holding register
    async fn write_register(&mut self, unit_id: u8, address: u16, value: u16) -> Result<()>;

    /// Close the connection; safe to call more than once
    async fn close(&mut self);
}

/// Builds fresh, unconnected transports for a connection configuration
pub trait TransportFactory: Send + Sync {
    fn create(&self, config: &ConnectionConfig) -> Box<dyn ModbusTransport>;
}

/// Factory for the tokio-modbus backed client
#[derive(Debug, Default, Clone, Copy)]
pub struct ModbusClientFactory;

impl TransportFactory for ModbusClientFactory {
    fn create(&self, config: &ConnectionConfig) -> Box<dyn ModbusTransport> {
        Box::new(crate::modbus::ModbusClient::new(config))
    }
}
