use wanas::catalog::{RegisterEncoding, sensor};
use wanas::codec::{SensorValue, decode, to_signed};

fn decode_for(key: &str, raw: u16) -> Option<SensorValue> {
    let d = sensor(key).unwrap();
    decode(Some(raw), d.encoding, d.scale)
}

#[test]
fn temperatures_are_signed_tenths() {
    assert_eq!(decode_for("outdoor_temperature", 100), Some(SensorValue::Float(10.0)));
    assert_eq!(decode_for("outdoor_temperature", 0xFFFF), Some(SensorValue::Float(-0.1)));
    assert_eq!(decode_for("indoor_temperature", 0xFF38), Some(SensorValue::Float(-20.0)));
}

#[test]
fn party_time_scales_and_rounds() {
    assert_eq!(decode_for("party_time", 720), Some(SensorValue::Float(122.4)));
    assert_eq!(decode_for("party_time", 1), Some(SensorValue::Float(0.2)));
    // 25 * 0.17 is exactly 4.25
    assert_eq!(decode_for("party_time", 25), Some(SensorValue::Float(4.2)));
}

#[test]
fn unscaled_values_stay_integers() {
    assert_eq!(decode_for("supply_airflow", 40000), Some(SensorValue::Integer(40000)));
    assert_eq!(decode_for("hood_state", 0xFFFE), Some(SensorValue::Integer(-2)));
    assert_eq!(decode_for("bypass_state", 0), Some(SensorValue::Integer(0)));
}

#[test]
fn missing_register_is_unknown() {
    assert_eq!(decode(None, RegisterEncoding::Signed16, Some(0.1)), None);
}

#[test]
fn sign_reinterpretation_edges() {
    assert_eq!(to_signed(0x7FFF), 32767);
    assert_eq!(to_signed(0x8000), -32768);
    assert_eq!(to_signed(0), 0);
}

#[test]
fn values_serialize_as_plain_numbers() {
    assert_eq!(serde_json::to_string(&SensorValue::Integer(3)).unwrap(), "3");
    assert_eq!(serde_json::to_string(&SensorValue::Float(21.5)).unwrap(), "21.5");
    assert_eq!(SensorValue::Float(-0.1).to_string(), "-0.1");
}
