use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wanas::config::{Config, ConnectionConfig};
use wanas::entities::{EntityRegistry, EntityView};
use wanas::error::{Result, WanasError};
use wanas::transport::{ModbusTransport, TransportFactory};
use wanas::PollCoordinator;

/// A device that can be unplugged; unplugging breaks every open link
#[derive(Default)]
struct Unit {
    registers: Mutex<HashMap<u16, u16>>,
    unplugged: AtomicBool,
    generation: AtomicUsize,
    connects: AtomicUsize,
}

impl Unit {
    fn unplug(&self) {
        self.unplugged.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn plug_in(&self) {
        self.unplugged.store(false, Ordering::SeqCst);
    }
}

struct Link {
    unit: Arc<Unit>,
    generation: Option<usize>,
}

#[async_trait::async_trait]
impl ModbusTransport for Link {
    async fn connect(&mut self) -> Result<()> {
        self.unit.connects.fetch_add(1, Ordering::SeqCst);
        if self.unit.unplugged.load(Ordering::SeqCst) {
            return Err(WanasError::connect("unit", 502, "no route to host"));
        }
        self.generation = Some(self.unit.generation.load(Ordering::SeqCst));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.generation == Some(self.unit.generation.load(Ordering::SeqCst))
    }

    async fn read_holding_registers(&mut self, _: u8, address: u16, count: u16) -> Result<Vec<u16>> {
        if !self.is_connected() {
            return Err(WanasError::transport("connection reset by peer"));
        }
        let regs = self.unit.registers.lock().unwrap();
        Ok((address..address + count)
            .map(|a| regs.get(&a).copied().unwrap_or(0))
            .collect())
    }

    async fn write_register(&mut self, _: u8, address: u16, value: u16) -> Result<()> {
        if !self.is_connected() {
            return Err(WanasError::transport("broken pipe"));
        }
        self.unit.registers.lock().unwrap().insert(address, value);
        Ok(())
    }

    async fn close(&mut self) {
        self.generation = None;
    }
}

struct UnitFactory(Arc<Unit>);

impl TransportFactory for UnitFactory {
    fn create(&self, _: &ConnectionConfig) -> Box<dyn ModbusTransport> {
        Box::new(Link {
            unit: self.0.clone(),
            generation: None,
        })
    }
}

fn setup() -> (Arc<Unit>, Arc<PollCoordinator>, EntityRegistry) {
    let unit = Arc::new(Unit::default());
    let coordinator = Arc::new(PollCoordinator::new(
        &Config::default(),
        Arc::new(UnitFactory(unit.clone())),
    ));
    let entities = EntityRegistry::build(&coordinator);
    (unit, coordinator, entities)
}

#[tokio::test]
async fn outage_keeps_last_values_and_recovers() {
    let (unit, coordinator, entities) = setup();
    unit.registers.lock().unwrap().insert(7, 224);
    coordinator.first_refresh().await.unwrap();

    let indoor = entities.sensor("indoor_temperature").unwrap();
    assert_eq!(indoor.native_value().unwrap().as_f64(), 22.4);
    assert!(indoor.available());

    unit.unplug();
    assert!(coordinator.refresh().await.is_err());
    assert!(coordinator.refresh().await.is_err());
    assert!(!indoor.available());
    assert_eq!(indoor.native_value().unwrap().as_f64(), 22.4);
    assert_eq!(coordinator.state().failed_polls, 2);

    unit.registers.lock().unwrap().insert(7, 230);
    unit.plug_in();
    coordinator.refresh().await.unwrap();
    assert!(indoor.available());
    assert_eq!(indoor.native_value().unwrap().as_f64(), 23.0);
    assert_eq!(unit.connects.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn write_while_unplugged_fails_without_retry() {
    let (unit, coordinator, entities) = setup();
    coordinator.first_refresh().await.unwrap();
    unit.unplug();

    let err = entities.switch("heater").unwrap().turn_on().await.unwrap_err();
    assert!(matches!(err, WanasError::Connect { .. }));
    assert_eq!(unit.registers.lock().unwrap().get(&41), None);
    assert_eq!(unit.connects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn reports_cover_every_entity() {
    let (_, coordinator, entities) = setup();
    coordinator.first_refresh().await.unwrap();
    let reports: Vec<_> = entities.all().map(|e| e.report()).collect();
    assert_eq!(reports.len(), 26);
    assert!(reports.iter().all(|r| r.available));
    assert!(
        reports
            .iter()
            .all(|r| r.unique_id.starts_with("192.168.1.100:502:1_"))
    );
}
