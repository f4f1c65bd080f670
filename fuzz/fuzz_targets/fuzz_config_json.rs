//! Fuzz target for JSON configuration parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pal_config::PalantirConfig;

fuzz_target!(|data: &str| {
    let _ = PalantirConfig::from_json_str(data);
});
