#![no_main]

use std::io::Write;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 4 {
        let compression_level = flate2::Compression::new((data[0] % 10).into());
        let data = &data[1..];
        let mut e = flate2::write::ZlibEncoder::new(Vec::new(), compression_level);
        e.write_all(data).unwrap();
        let compressed = e.finish().unwrap();
        let options = kiln_inflate::DeflateOptions::default().set_limit(data.len());
        let mut decoder = kiln_inflate::DeflateDecoder::new_with_options(&compressed, options);
        let decoded = decoder
            .decode_zlib()
            .expect("Failed to decompress valid compressed data!");
        assert!(
            data == decoded,
            "The decompressed data doesn't match the original data!"
        );
    }
});
