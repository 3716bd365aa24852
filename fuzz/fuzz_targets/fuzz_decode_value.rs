#![no_main]
use libfuzzer_sys::fuzz_target;
use wanas::catalog::SENSORS;
use wanas::codec::decode;

fuzz_target!(|data: &[u8]| {
    for pair in data.chunks_exact(2) {
        let raw = u16::from_be_bytes([pair[0], pair[1]]);
        for desc in SENSORS {
            let value = decode(Some(raw), desc.encoding, desc.scale);
            assert!(value.is_some_and(|v| v.as_f64().is_finite()));
        }
    }
});
