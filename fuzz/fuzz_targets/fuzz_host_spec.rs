#![no_main]

use aerospike_creds::client::parse_hosts;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(spec) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(endpoints) = parse_hosts(spec) {
        assert_eq!(endpoints.len(), spec.split(',').count());
        for endpoint in &endpoints {
            let _ = endpoint.to_string();
        }
    }
});
