#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parse → wrap in an envelope → parse must not panic at any step.
        if let Ok(tree) = factura::soap::parse_xml(s) {
            if let Ok(xml) = factura::soap::build_envelope("urn:fuzz", "Op", &tree) {
                let _ = factura::soap::parse_envelope(&xml);
            }
        }
    }
});
