#![no_main]

use gs4_query::core::packet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Every datagram either decodes fully or is rejected; never a panic
    let _ = packet::decode(data);
});
