#![no_main]
use libfuzzer_sys::fuzz_target;
use wanas::planner::{MAX_READ_COUNT, plan};

fuzz_target!(|data: &[u8]| {
    let Some((&gap, rest)) = data.split_first() else {
        return;
    };
    // Big-endian address pairs after the gap byte
    let addrs: Vec<u16> = rest
        .chunks_exact(2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .collect();

    let blocks = plan(&addrs, u16::from(gap));

    for a in &addrs {
        assert_eq!(blocks.iter().filter(|b| b.contains(*a)).count(), 1);
    }
    for b in &blocks {
        assert!(b.count >= 1 && b.count <= MAX_READ_COUNT);
    }
    for w in blocks.windows(2) {
        assert!(w[0].end() < w[1].start);
    }
});
