#![no_main]

use libfuzzer_sys::fuzz_target;
use tulip_ltl::spec::{parse_spec_config, spec_to_gr1c};

fuzz_target!(|data: &[u8]| {
    // Only checks for panics.
    if let Ok(input) = std::str::from_utf8(data)
        && let Ok(cfg) = parse_spec_config(input)
    {
        let _ = spec_to_gr1c(&cfg);
    }
});
