#![no_main]

use civgrid::GameConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Parsing arbitrary input must fail cleanly; accepted configs must round-trip
    if let Ok(config) = GameConfig::from_json_str(text) {
        let json = config.to_json_pretty().expect("valid config serializes");
        let again = GameConfig::from_json_str(&json).expect("serialized config parses");
        assert_eq!(config.grid_size, again.grid_size);
        assert_eq!(config.buildings, again.buildings);
    }
});
