use wanas::catalog::{actuator, sensor};
use wanas::registers::{RegisterMap, RegisterSetting};

fn overrides(yaml: &str) -> RegisterMap {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn overrides_win_over_catalog() {
    let regs = RegisterMap::effective(&overrides(
        "outdoor_temperature_address: 104\nbypass_write_address: 139\n",
    ));
    assert_eq!(regs.sensor_address(sensor("outdoor_temperature").unwrap()), 104);
    assert_eq!(regs.write_address(actuator("bypass").unwrap()), 139);
    assert_eq!(regs.verify_address(actuator("bypass").unwrap()), 31);
    assert_eq!(regs.sensor_address(sensor("supply_temperature").unwrap()), 6);
}

#[test]
fn names_and_addresses_deserialize_by_type() {
    let map = overrides("heater_name: Grzałka\nheater_write_address: 41\n");
    assert_eq!(map.address("heater_write_address"), Some(41));
    assert_eq!(map.address("heater_name"), None);
    let mut expected = RegisterMap::default();
    expected.insert("heater_name".to_string(), RegisterSetting::Name("Grzałka".to_string()));
    expected.insert("heater_write_address".to_string(), RegisterSetting::Address(41));
    assert_eq!(map, expected);
    let regs = RegisterMap::effective(&map);
    assert_eq!(regs.display_name("heater", "Nagrzewnica"), "Grzałka");
    assert_eq!(regs.display_name("cooler", "Chłodnica"), "Chłodnica");
}

#[test]
fn blank_name_falls_back() {
    let regs = RegisterMap::effective(&overrides("bypass_name: '  '\n"));
    assert_eq!(regs.display_name("bypass", "Bypass"), "Bypass");
}

#[test]
fn extra_address_keys_are_polled() {
    let regs = RegisterMap::effective(&overrides("service_counter_address: 300\n"));
    assert!(regs.polled_addresses().contains(&300));
    assert!(regs.validate().is_ok());
}

#[test]
fn mistyped_values_fail_validation() {
    assert!(overrides("bypass_write_address: abc\n").validate().is_err());
    assert!(overrides("bypass_name: 12\n").validate().is_err());
    assert!(overrides("bypass_colour: red\n").validate().is_err());
}
