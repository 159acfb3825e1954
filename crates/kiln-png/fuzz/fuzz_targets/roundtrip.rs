#![no_main]
use kiln_png::kiln_core::options::DecoderOptions;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some((raw, encoded)) = encode_png(data) {
        // single row inputs can be wider than the default width limit
        let options = DecoderOptions::default().set_max_width(usize::MAX);
        let decoded =
            kiln_png::decode(&encoded, options).expect("Failed to decode valid input data!");
        assert_eq!(raw, decoded);
    }
});

const METADATA_BYTES: usize = 2;

fn encode_png(data: &[u8]) -> Option<(&[u8], Vec<u8>)> {
    // the first bytes of the fuzzer input pick the encoding settings
    if data.len() <= METADATA_BYTES {
        return None;
    }
    let height = u32::from(data[0]);
    if height == 0 {
        return None;
    }
    let filter = png::FilterType::from_u8(data[1])?;

    let bytes_per_pixel = 4;
    let data = &data[METADATA_BYTES..];
    let width = data.len() as u32 / height / bytes_per_pixel;
    if width == 0 {
        return None;
    }
    let total_bytes = height.checked_mul(width)?.checked_mul(bytes_per_pixel)?;

    let data_to_encode = &data[..total_bytes as usize];
    let mut output: Vec<u8> = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut output, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_filter(filter);
        let mut writer = encoder.write_header().unwrap();
        writer
            .write_image_data(data_to_encode)
            .expect("Encoding failed");
    }
    Some((data_to_encode, output))
}
