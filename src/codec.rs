//! Raw register word decoding
//!
//! Snapshots hold raw words only; sign interpretation and scaling happen here,
//! at read time.

use crate::catalog::RegisterEncoding;
use serde::Serialize;

/// A decoded physical value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    /// Unscaled register content (sign-adjusted when signed)
    Integer(i32),
    /// Scaled value rounded to one decimal place
    Float(f64),
}

impl SensorValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            SensorValue::Integer(i) => f64::from(i),
            SensorValue::Float(f) => f,
        }
    }
}

impl std::fmt::Display for SensorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorValue::Integer(i) => write!(f, "{}", i),
            SensorValue::Float(v) => write!(f, "{:.1}", v),
        }
    }
}

/// Reinterpret a raw word as two's complement
pub const fn to_signed(raw: u16) -> i16 {
    raw as i16
}

/// Decode a raw word; `None` in gives `None` out, never zero.
///
/// With a scale the result is rounded to one decimal place whatever the
/// scale's magnitude; that is how the device reports its values.
pub fn decode(raw: Option<u16>, encoding: RegisterEncoding, scale: Option<f64>) -> Option<SensorValue> {
    let raw = raw?;
    let value = match encoding {
        RegisterEncoding::Signed16 => i32::from(to_signed(raw)),
        RegisterEncoding::Unsigned16 => i32::from(raw),
    };
    Some(match scale {
        Some(scale) => SensorValue::Float(round_one_decimal(f64::from(value) * scale)),
        None => SensorValue::Integer(value),
    })
}

/// Round the exact binary value to one decimal, ties to even.
///
/// `x * 10` would itself round, turning `25 * 0.17` (exactly 4.25) into 4.3.
/// The fixed-precision formatter works on the exact value instead.
fn round_one_decimal(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}
