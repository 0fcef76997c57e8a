#![no_main]

use ld2415h_codegen::codegen::Generator;
use ld2415h_codegen::config::ConfigLoader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(yaml) = std::str::from_utf8(data) else {
        return;
    };

    // Anything the validator accepts must also generate or fail cleanly.
    if let Ok(loaded) = ConfigLoader::with_defaults().load_from_str(yaml) {
        let _ = Generator::generate(&loaded.config);
    }
});
