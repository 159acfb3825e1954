#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    use kiln_png::kiln_core::options::DecoderOptions;

    for options in [DecoderOptions::new_fast(), DecoderOptions::new_safe()] {
        if let Ok(pixels) = kiln_png::decode(data, options) {
            // a successful decode is always a whole number of rgba pixels
            assert_eq!(pixels.len() % 4, 0);
        }
    }
});
