//! Poll coordination
//!
//! The coordinator is the single authority over device I/O. Poll cycles,
//! out-of-cycle refreshes and switch writes all go through one async mutex,
//! so at most one conversation with the device is in flight at any time and
//! a write issued during a cycle queues behind it.
//!
//! Each conversation runs on a spawned task, so a caller that gives up
//! waiting (an HTTP client hanging up, a timeout) never cuts a request off
//! between send and reply.
//!
//! A cycle is all-or-nothing: the merged snapshot is published only when
//! every read block succeeded. A failed cycle keeps the previous snapshot
//! and flags the failure in [`PollState`].

use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::error::{Result, WanasError};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::planner::{self, ReadBlock};
use crate::registers::RegisterMap;
use crate::transport::TransportFactory;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

mod types;

pub use types::{PollState, Snapshot};


pub struct PollCoordinator {
    inner: Arc<Inner>,
}

/// State shared with the tasks that carry out device conversations
struct Inner {
    /// Effective register map, fixed for the coordinator's lifetime
    registers: RegisterMap,

    /// Read blocks computed once from `registers`
    plan: Vec<ReadBlock>,

    unit_id: u8,
    device_id: String,
    scan_interval: Duration,

    /// Serializes every device conversation
    connection: Mutex<ConnectionManager>,

    /// Published state
    state_tx: watch::Sender<Arc<PollState>>,

    logger: StructuredLogger,
}

impl PollCoordinator {
    pub fn new(config: &Config, factory: Arc<dyn TransportFactory>) -> Self {
        let device_id = config.connection.device_id();
        let logger = get_logger_with_context(
            LogContext::new("coordinator").with_device(device_id.clone()),
        );

        let registers = RegisterMap::effective(&config.registers);
        let plan = planner::plan(&registers.polled_addresses(), config.max_gap);
        logger.info(&format!(
            "Planned {} read block(s): {}",
            plan.len(),
            plan.iter()
                .map(|b| format!("{}+{}", b.start, b.count))
                .collect::<Vec<_>>()
                .join(", ")
        ));

        let (state_tx, _) = watch::channel(Arc::new(PollState::default()));

        Self {
            inner: Arc::new(Inner {
                registers,
                plan,
                unit_id: config.connection.slave_id,
                device_id,
                scan_interval: Duration::from_secs(config.scan_interval_secs.max(1)),
                connection: Mutex::new(ConnectionManager::new(&config.connection, factory)),
                state_tx,
                logger,
            }),
        }
    }

    pub fn registers(&self) -> &RegisterMap {
        &self.inner.registers
    }

    pub fn plan(&self) -> &[ReadBlock] {
        &self.inner.plan
    }

    /// Stable identifier of the polled device (`host:port:unit`)
    pub fn device_id(&self) -> &str {
        &self.inner.device_id
    }

    pub fn scan_interval(&self) -> Duration {
        self.inner.scan_interval
    }

    /// Current published state
    pub fn state(&self) -> Arc<PollState> {
        self.inner.state_tx.borrow().clone()
    }

    /// Latest snapshot, if any cycle has succeeded yet
    pub fn data(&self) -> Option<Arc<Snapshot>> {
        self.inner.state_tx.borrow().data.clone()
    }

    /// Receive every state publication
    pub fn subscribe(&self) -> watch::Receiver<Arc<PollState>> {
        self.inner.state_tx.subscribe()
    }

    /// Connection health without waiting for in-flight I/O; `None` while busy
    pub fn connection_status(&self) -> Option<bool> {
        self.inner
            .connection
            .try_lock()
            .ok()
            .map(|m| m.is_connected())
    }

    /// Initial refresh at startup
    pub async fn first_refresh(&self) -> Result<()> {
        self.inner.logger.info("Performing initial refresh");
        self.refresh().await
    }

    /// Run one poll cycle and publish its outcome.
    ///
    /// The cycle runs on its own task: dropping the returned future stops
    /// the wait, not the conversation, which still completes and publishes.
    pub async fn refresh(&self) -> Result<()> {
        let inner = self.inner.clone();
        join_device_task(tokio::spawn(async move { inner.refresh().await })).await
    }

    /// Write one holding register, then refresh out of cycle.
    ///
    /// Write failures go back to the caller; they are never retried. The
    /// follow-up refresh only updates published state, its failure does not
    /// fail the write. Like [`refresh`](Self::refresh), the write and its
    /// follow-up run to completion even if the caller stops waiting.
    pub async fn write_register(&self, address: u16, value: u16) -> Result<()> {
        let inner = self.inner.clone();
        join_device_task(tokio::spawn(async move {
            inner.write_register(address, value).await
        }))
        .await
    }

    /// Periodic poll loop; returns after a shutdown signal
    pub async fn run(self: Arc<Self>, mut shutdown_rx: mpsc::UnboundedReceiver<()>) {
        let period = self.inner.scan_interval;
        self.inner
            .logger
            .info(&format!("Starting poll loop every {} s", period.as_secs()));

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Outcome is published through the state channel
                    let _ = self.refresh().await;
                }
                _ = shutdown_rx.recv() => {
                    self.inner.logger.info("Shutdown requested");
                    break;
                }
            }
        }

        self.shutdown().await;
    }

    /// Wait for in-flight I/O to finish, then close the connection
    pub async fn shutdown(&self) {
        let mut manager = self.inner.connection.lock().await;
        manager.close().await;
    }
}

async fn join_device_task(task: JoinHandle<Result<()>>) -> Result<()> {
    task.await
        .map_err(|e| WanasError::transport(format!("device task aborted: {}", e)))?
}

impl Inner {
    /// The I/O lock is held through publication so cycles publish in order.
    async fn refresh(&self) -> Result<()> {
        let mut manager = self.connection.lock().await;
        let started = std::time::Instant::now();
        let result = self.fetch(&mut manager).await;

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let was_ok = {
            let previous = self.state_tx.borrow();
            previous.last_update_success || previous.total_polls == 0
        };
        let now = chrono::Utc::now();

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.state_tx.send_modify(|state| {
                    let mut next = (**state).clone();
                    next.data = Some(snapshot);
                    next.last_update_success = true;
                    next.last_error = None;
                    next.last_success_at = Some(now);
                    next.last_attempt_at = Some(now);
                    next.total_polls += 1;
                    next.last_poll_duration_ms = Some(duration_ms);
                    *state = Arc::new(next);
                });
                if !was_ok {
                    self.logger.info("Fetching data recovered");
                }
                self.logger
                    .debug(&format!("Poll cycle completed in {} ms", duration_ms));
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.state_tx.send_modify(|state| {
                    let mut next = (**state).clone();
                    next.last_update_success = false;
                    next.last_error = Some(message.clone());
                    next.last_attempt_at = Some(now);
                    next.total_polls += 1;
                    next.failed_polls += 1;
                    next.last_poll_duration_ms = Some(duration_ms);
                    *state = Arc::new(next);
                });
                if was_ok {
                    self.logger.error(&format!("Update failed: {}", message));
                } else {
                    self.logger.debug(&format!("Update still failing: {}", message));
                }
                Err(e)
            }
        }
    }

    /// Read every planned block; any failure aborts the whole cycle
    async fn fetch(&self, manager: &mut ConnectionManager) -> Result<Snapshot> {
        let mut snapshot = Snapshot::default();
        for block in &self.plan {
            let conn = manager.acquire().await?;
            let outcome = conn
                .read_holding_registers(self.unit_id, block.start, block.count)
                .await;
            match outcome {
                Ok(words) => snapshot.absorb(*block, &words),
                Err(e) => {
                    if e.is_transport() {
                        manager.release_on_error().await;
                    }
                    return Err(e);
                }
            }
        }
        Ok(snapshot)
    }

    async fn write_register(&self, address: u16, value: u16) -> Result<()> {
        {
            let mut manager = self.connection.lock().await;
            let conn = manager.acquire().await?;
            let outcome = conn.write_register(self.unit_id, address, value).await;
            if let Err(e) = outcome {
                if e.is_transport() {
                    manager.release_on_error().await;
                }
                self.logger.error(&format!(
                    "Error writing {} to register {}: {}",
                    value, address, e
                ));
                return Err(e);
            }
        }

        self.logger
            .info(&format!("Wrote {} to register {}", value, address));

        if let Err(e) = self.refresh().await {
            self.logger
                .warn(&format!("Refresh after write failed: {}", e));
        }
        Ok(())
    }
}
