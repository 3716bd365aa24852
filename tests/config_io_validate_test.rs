use wanas::config::{Config, Protocol};
use wanas::registers::RegisterSetting;
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.connection.host = "10.0.0.5".to_string();
    cfg.connection.protocol = Protocol::Udp;
    cfg.registers.insert(
        "party_write_address".to_string(),
        RegisterSetting::Address(145),
    );

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.connection.host, "10.0.0.5");
    assert_eq!(loaded.connection.protocol, Protocol::Udp);
    assert_eq!(loaded.registers.address("party_write_address"), Some(145));
}

#[test]
fn partial_file_keeps_defaults() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        "connection:\n  host: gw.local\n  protocol: tcp\nregisters:\n  bypass_name: Obejście\n",
    )
    .unwrap();
    let cfg = Config::from_file(tmp.path()).unwrap();
    assert_eq!(cfg.connection.host, "gw.local");
    assert_eq!(cfg.connection.protocol, Protocol::Tcp);
    assert_eq!(cfg.connection.port, 502);
    assert_eq!(cfg.connection.slave_id, 1);
    assert_eq!(cfg.scan_interval_secs, 30);
    assert_eq!(cfg.max_gap, 3);
    assert_eq!(cfg.web.port, 8089);
    assert!(cfg.validate().is_ok());
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();
    cfg.connection.host.clear();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.connection.port = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.connection.operation_timeout_ms = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.scan_interval_secs = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.logging.level = "LOUD".to_string();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.registers.insert(
        "bypass_write_address".to_string(),
        RegisterSetting::Name("forty".to_string()),
    );
    assert!(cfg.validate().is_err());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}
