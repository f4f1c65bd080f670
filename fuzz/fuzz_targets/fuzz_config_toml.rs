//! Fuzz target for TOML configuration parsing.
//!
//! Parsing and validation should reject malformed input with an error, never
//! a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pal_config::PalantirConfig;

fuzz_target!(|data: &str| {
    if let Ok(config) = PalantirConfig::from_toml_str(data) {
        let _ = config.validate_for(100);
    }
});
