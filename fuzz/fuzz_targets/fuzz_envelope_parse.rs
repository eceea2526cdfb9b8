#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Must not panic. Errors are fine.
        if let Ok(body) = factura::soap::parse_envelope(s) {
            let _ = factura::core::solicitar_messages(&body);
        }
    }
});
