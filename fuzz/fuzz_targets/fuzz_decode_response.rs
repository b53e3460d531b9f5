#![no_main]

use aerospike_creds::protocol::decode_response;
use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut buf = BytesMut::from(data);

    // Several replies may arrive in one read.
    while !buf.is_empty() {
        match decode_response(&buf) {
            Ok((response, consumed)) => {
                assert!(consumed <= buf.len());
                let _ = response.session_ttl();
                let _ = buf.split_to(consumed);
            }
            Err(_) => break,
        }
    }
});
