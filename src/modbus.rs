//! Modbus client for Wanas device communication
//!
//! Wraps a `tokio-modbus` client context behind [`ModbusTransport`]. The
//! three supported framings all run over a socket: MBAP over TCP, RTU over
//! a TCP stream (serial gateways) and MBAP over UDP datagrams.

use crate::config::{ConnectionConfig, Protocol};
use crate::error::{Result, WanasError};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::transport::ModbusTransport;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_modbus::client::{Context, rtu, tcp};
use tokio_modbus::prelude::*;

pub mod udp;

use udp::UdpStream;

/// Modbus client for a single Wanas unit
pub struct ModbusClient {
    /// Live client context, `None` while disconnected
    client: Option<Context>,

    /// Connection parameters
    config: ConnectionConfig,

    /// Connection timeout
    connection_timeout: Duration,

    /// Operation timeout
    operation_timeout: Duration,

    /// Logger
    logger: StructuredLogger,
}

impl ModbusClient {
    /// Create a new, unconnected Modbus client
    pub fn new(config: &ConnectionConfig) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("modbus").with_device(config.device_id()),
        );
        Self {
            client: None,
            config: config.clone(),
            connection_timeout: Duration::from_millis(config.connect_timeout_ms),
            operation_timeout: Duration::from_millis(config.operation_timeout_ms),
            logger,
        }
    }

    /// Endpoint as `host:port`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    async fn resolve(host: String, port: u16) -> Result<SocketAddr> {
        let mut addrs = tokio::net::lookup_host((host.as_str(), port))
            .await
            .map_err(|e| WanasError::connect(&host, port, format!("cannot resolve host: {}", e)))?;
        addrs
            .next()
            .ok_or_else(|| WanasError::connect(&host, port, "host resolved to no addresses"))
    }

    async fn open(protocol: Protocol, slave_id: u8, addr: SocketAddr) -> std::io::Result<Context> {
        let slave = Slave(slave_id);
        match protocol {
            Protocol::Tcp => {
                let stream = TcpStream::connect(addr).await?;
                stream.set_nodelay(true).ok();
                Ok(tcp::attach_slave(stream, slave))
            }
            Protocol::RtuOverTcp => {
                let stream = TcpStream::connect(addr).await?;
                stream.set_nodelay(true).ok();
                Ok(rtu::attach_slave(stream, slave))
            }
            Protocol::Udp => {
                let stream = UdpStream::connect(addr).await?;
                Ok(tcp::attach_slave(stream, slave))
            }
        }
    }

    /// Get client reference or error if not connected
    fn get_client(&mut self) -> Result<&mut Context> {
        self.client
            .as_mut()
            .ok_or_else(|| WanasError::transport("Not connected to Modbus device"))
    }

    /// Map the nested request outcome onto tagged errors.
    ///
    /// A transport-level failure leaves the context unusable, so it is
    /// dropped here and `is_connected` turns false.
    fn settle<T>(
        &mut self,
        op: &str,
        address: u16,
        outcome: std::result::Result<tokio_modbus::Result<T>, tokio::time::error::Elapsed>,
    ) -> Result<T> {
        match outcome {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(exception))) => {
                let error_msg = format!("{} rejected by device: {:?}", op, exception);
                self.logger.warn(&error_msg);
                Err(WanasError::protocol(address, error_msg))
            }
            Ok(Err(e)) => {
                let error_msg = format!("{} failed at register {}: {}", op, address, e);
                self.logger.error(&error_msg);
                self.client = None;
                Err(WanasError::transport(error_msg))
            }
            Err(_) => {
                let error_msg = format!("{} timeout at register {}", op, address);
                self.logger.error(&error_msg);
                self.client = None;
                Err(WanasError::timeout(error_msg))
            }
        }
    }
}

/// A reply with the wrong word count means request and response framing no
/// longer line up, so the stream cannot be trusted for the next request.
fn check_length(address: u16, count: u16, words: Vec<u16>) -> Result<Vec<u16>> {
    if words.len() == usize::from(count) {
        Ok(words)
    } else {
        Err(WanasError::transport(format!(
            "Read at register {} expected {} registers, device returned {}",
            address,
            count,
            words.len()
        )))
    }
}

#[async_trait::async_trait]
impl ModbusTransport for ModbusClient {
    async fn connect(&mut self) -> Result<()> {
        self.logger.info(&format!(
            "Connecting to Modbus device at {} ({})",
            self.endpoint(),
            self.config.protocol
        ));

        let addr = Self::resolve(self.config.host.clone(), self.config.port).await?;
        let open = Self::open(self.config.protocol, self.config.slave_id, addr);

        match timeout(self.connection_timeout, open).await {
            Ok(Ok(client)) => {
                self.client = Some(client);
                self.logger.info("Successfully connected to Modbus device");
                Ok(())
            }
            Ok(Err(e)) => {
                let error_msg = format!("Failed to connect to Modbus device: {}", e);
                self.logger.error(&error_msg);
                Err(WanasError::connect(&self.config.host, self.config.port, e.to_string()))
            }
            Err(_) => {
                self.logger.error("Connection timeout");
                Err(WanasError::connect(
                    &self.config.host,
                    self.config.port,
                    "connection timeout",
                ))
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>> {
        let timeout_duration = self.operation_timeout;

        self.logger.debug(&format!(
            "Reading {} registers from address {} on unit {}",
            count, address, unit_id
        ));

        let client = self.get_client()?;
        client.set_slave(Slave(unit_id));
        let outcome = timeout(timeout_duration, client.read_holding_registers(address, count)).await;
        let response = self.settle("Read", address, outcome)?;

        self.logger.trace(&format!(
            "Read {} registers: {:?}",
            response.len(),
            response
        ));
        check_length(address, count, response).inspect_err(|e| {
            self.logger.error(&e.to_string());
            self.client = None;
        })
    }

    async fn write_register(&mut self, unit_id: u8, address: u16, value: u16) -> Result<()> {
        let timeout_duration = self.operation_timeout;

        self.logger.debug(&format!(
            "Writing value {} to register {} on unit {}",
            value, address, unit_id
        ));

        let client = self.get_client()?;
        client.set_slave(Slave(unit_id));
        let outcome = timeout(timeout_duration, client.write_single_register(address, value)).await;
        self.settle("Write", address, outcome)?;

        self.logger.debug("Successfully wrote single register");
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut client) = self.client.take() {
            self.logger.info("Disconnecting from Modbus device");
            if let Err(e) = client.disconnect().await {
                self.logger.warn(&format!("Error disconnecting from Modbus device: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modbus_client_creation() {
        let config = ConnectionConfig::default();
        let client = ModbusClient::new(&config);
        assert!(!client.is_connected());
        assert_eq!(client.endpoint(), format!("{}:502", config.host));
    }

    #[tokio::test]
    async fn test_read_without_connect_is_transport_error() {
        let mut client = ModbusClient::new(&ConnectionConfig::default());
        let err = client.read_holding_registers(1, 0, 2).await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("Not connected"));
        let err = client.write_register(1, 39, 1).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_short_reply_is_transport_error() {
        assert_eq!(check_length(4, 3, vec![1, 2, 3]).unwrap(), vec![1, 2, 3]);
        let err = check_length(4, 3, vec![1, 2]).unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("expected 3 registers"));
        assert!(check_length(4, 1, vec![1, 2]).unwrap_err().is_transport());
    }

    #[test]
    fn test_connect_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}
        let mut client = ModbusClient::new(&ConnectionConfig::default());
        let fut = client.connect();
        assert_send(&fut);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut client = ModbusClient::new(&ConnectionConfig::default());
        client.close().await;
        client.close().await;
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_connect_refused_reports_endpoint() {
        // Grab a free port, then release it so nothing is listening there
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let config = ConnectionConfig {
            host: "127.0.0.1".to_string(),
            port,
            protocol: Protocol::Tcp,
            connect_timeout_ms: 500,
            ..Default::default()
        };
        let mut client = ModbusClient::new(&config);
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, WanasError::Connect { .. }));
        assert!(err.to_string().contains(&format!("127.0.0.1:{}", port)));
        assert!(!client.is_connected());
    }
}
