#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let options = kiln_inflate::DeflateOptions::default().set_limit(1 << 20);
    let mut decoder = kiln_inflate::DeflateDecoder::new_with_options(data, options);
    let _ = decoder.decode_zlib();
});
