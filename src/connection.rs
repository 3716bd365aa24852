//! Connection lifecycle management
//!
//! Owns at most one live transport. Connections are opened lazily by
//! [`ConnectionManager::acquire`] and thrown away after transport failures;
//! there is no background reconnect loop, the next `acquire` starts over.

use crate::config::ConnectionConfig;
use crate::error::{Result, WanasError};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::transport::{ModbusTransport, TransportFactory};
use std::sync::Arc;

pub struct ConnectionManager {
    config: ConnectionConfig,
    factory: Arc<dyn TransportFactory>,
    connection: Option<Box<dyn ModbusTransport>>,
    logger: StructuredLogger,
}

impl ConnectionManager {
    pub fn new(config: &ConnectionConfig, factory: Arc<dyn TransportFactory>) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("connection").with_device(config.device_id()),
        );
        Self {
            config: config.clone(),
            factory,
            connection: None,
            logger,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Whether a connection is held and reports itself healthy
    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| c.is_connected())
    }

    /// Return the live connection, opening a fresh one if needed.
    ///
    /// On connect failure no handle is kept.
    pub async fn acquire(&mut self) -> Result<&mut dyn ModbusTransport> {
        if !self.is_connected() {
            if let Some(mut stale) = self.connection.take() {
                stale.close().await;
            }

            let mut fresh = self.factory.create(&self.config);
            if let Err(e) = fresh.connect().await {
                fresh.close().await;
                let err = match e {
                    WanasError::Connect { .. } => e,
                    other => WanasError::connect(
                        self.config.host.as_str(),
                        self.config.port,
                        other.to_string(),
                    ),
                };
                self.logger.warn(&err.to_string());
                return Err(err);
            }
            self.logger.debug("Connection established");
            self.connection = Some(fresh);
        }

        match self.connection.as_deref_mut() {
            Some(conn) => Ok(conn),
            None => Err(WanasError::transport("Connection unavailable")),
        }
    }

    /// Drop the current connection unconditionally after a transport error
    pub async fn release_on_error(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            self.logger
                .warn("Invalidating connection after transport error");
            conn.close().await;
        }
    }

    /// Graceful shutdown; no-op when nothing is connected
    pub async fn close(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            self.logger.info("Closing connection");
            conn.close().await;
        }
    }
}

/// Test a connection: connect, read register 0 once, always close.
pub async fn probe(config: &ConnectionConfig, factory: &dyn TransportFactory) -> Result<()> {
    let logger = get_logger_with_context(
        LogContext::new("probe").with_device(config.device_id()),
    );
    let mut transport = factory.create(config);
    let result = async {
        transport.connect().await.map_err(|e| match e {
            WanasError::Connect { .. } => e,
            other => WanasError::connect(config.host.as_str(), config.port, other.to_string()),
        })?;
        transport
            .read_holding_registers(config.slave_id, 0, 1)
            .await
            .map(|_| ())
    }
    .await;
    transport.close().await;

    match &result {
        Ok(()) => logger.info("Probe succeeded"),
        Err(e) => logger.error(&format!("Probe failed: {}", e)),
    }
    result
}
