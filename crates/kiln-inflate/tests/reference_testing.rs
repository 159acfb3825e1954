use std::io::Write;

use kiln_inflate::errors::DecodeErrorStatus;
use kiln_inflate::{DeflateDecoder, DeflateOptions};
use nanorand::Rng;

fn compress_zlib(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder =
        flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::new(level));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn compress_deflate(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder =
        flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::new(level));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Text-like data with plenty of repeats, so the encoder emits
/// dynamic blocks with long matches
fn repetitive_data(len: usize) -> Vec<u8> {
    let words: [&[u8]; 6] = [b"chunk ", b"filter ", b"paeth ", b"inflate ", b"\x00\x00\x00", b"ab"];
    let mut rng = nanorand::WyRand::new_seed(42);
    let mut out = Vec::with_capacity(len);

    while out.len() < len {
        out.extend_from_slice(words[rng.generate_range(0..words.len())]);
    }
    out.truncate(len);
    out
}

fn random_data(len: usize) -> Vec<u8> {
    let mut rng = nanorand::WyRand::new_seed(7);
    (0..len).map(|_| rng.generate::<u8>()).collect()
}

#[test]
fn test_similarity_across_levels() {
    let samples = [repetitive_data(100_000), random_data(50_000), vec![0; 70_000], vec![]];

    for sample in &samples {
        // level 0 produces stored blocks, 1 mostly fixed, higher levels dynamic
        for level in [0, 1, 6, 9] {
            let compressed = compress_zlib(sample, level);
            let mut decoder = DeflateDecoder::new(&compressed);
            let decoded = decoder.decode_zlib().unwrap();

            assert_eq!(&decoded, sample, "level {level} mismatch");
        }
    }
}

#[test]
fn test_raw_deflate() {
    let sample = repetitive_data(40_000);
    let compressed = compress_deflate(&sample, 9);

    let mut decoder = DeflateDecoder::new(&compressed);
    assert_eq!(decoder.decode_deflate().unwrap(), sample);
}

#[test]
fn test_truncation_never_panics() {
    let sample = repetitive_data(20_000);

    for level in [0, 1, 9] {
        let compressed = compress_zlib(&sample, level);

        for len in 0..compressed.len() {
            let mut decoder = DeflateDecoder::new(&compressed[..len]);
            assert!(
                decoder.decode_zlib().is_err(),
                "truncation to {len} bytes at level {level} decoded"
            );
        }
    }
}

#[test]
fn test_bad_adler() {
    let sample = repetitive_data(1000);
    let mut compressed = compress_zlib(&sample, 6);
    let last = compressed.len() - 1;
    compressed[last] ^= 0x55;

    let err = DeflateDecoder::new(&compressed).decode_zlib().unwrap_err();
    assert!(matches!(err.error, DecodeErrorStatus::MismatchedAdler(_, _)));
    // data is still handed back
    assert_eq!(err.data, sample);

    let options = DeflateOptions::default().set_confirm_checksum(false);
    let decoded = DeflateDecoder::new_with_options(&compressed, options)
        .decode_zlib()
        .unwrap();
    assert_eq!(decoded, sample);
}

#[test]
fn test_limit() {
    let sample = repetitive_data(10_000);
    let compressed = compress_zlib(&sample, 6);

    let options = DeflateOptions::default().set_limit(4000);
    let err = DeflateDecoder::new_with_options(&compressed, options)
        .decode_zlib()
        .unwrap_err();

    assert!(matches!(err.error, DecodeErrorStatus::OutputLimitExceeded(4000, _)));
    assert_eq!(err.data, &sample[..4000]);

    // exactly at the limit is fine
    let options = DeflateOptions::default().set_limit(sample.len());
    let decoded = DeflateDecoder::new_with_options(&compressed, options)
        .decode_zlib()
        .unwrap();
    assert_eq!(decoded, sample);
}

#[test]
fn test_bad_zlib_headers() {
    // compression method 7
    assert!(DeflateDecoder::new(&[0x77, 0x01, 0, 0]).decode_zlib().is_err());
    // fcheck not a multiple of 31
    assert!(DeflateDecoder::new(&[0x78, 0x9D, 0, 0]).decode_zlib().is_err());
    // preset dictionary
    assert!(DeflateDecoder::new(&[0x78, 0xBB, 0, 0, 0, 0]).decode_zlib().is_err());
    assert!(DeflateDecoder::new(&[0x78]).decode_zlib().is_err());
}
