//! Hand assembled png streams
#![allow(dead_code)]
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use kiln_png::calc_crc;

pub const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

pub fn chunk(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 12);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(data);

    let mut crc_data = tag.to_vec();
    crc_data.extend_from_slice(data);
    out.extend_from_slice(&calc_crc(&crc_data).to_be_bytes());
    out
}

pub fn ihdr(width: u32, height: u32, depth: u8, color: u8, interlace: u8) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[depth, color, 0, 0, interlace]);
    chunk(b"IHDR", &data)
}

pub fn zlib(raw: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw).unwrap();
    encoder.finish().unwrap()
}

/// Concatenate the signature and `chunks`
pub fn assemble(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = SIGNATURE.to_vec();
    for c in chunks {
        out.extend_from_slice(c);
    }
    out
}

/// A complete non interlaced image from already filtered scanlines
pub fn simple_png(width: u32, height: u32, depth: u8, color: u8, filtered: &[u8]) -> Vec<u8> {
    assemble(&[
        ihdr(width, height, depth, color, 0),
        chunk(b"IDAT", &zlib(filtered)),
        chunk(b"IEND", &[])
    ])
}

/// Prefix every `stride` bytes of `rows` with filter type zero
pub fn unfiltered(rows: &[u8], stride: usize) -> Vec<u8> {
    rows.chunks_exact(stride)
        .flat_map(|row| std::iter::once(0).chain(row.iter().copied()))
        .collect()
}

/// Split an RGBA8 image into the seven Adam7 passes, every scanline
/// stored with filter type zero
pub fn adam7_scanlines(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    const PASSES: [(usize, usize, usize, usize); 7] = [
        (0, 0, 8, 8),
        (4, 0, 8, 8),
        (0, 4, 4, 8),
        (2, 0, 4, 4),
        (0, 2, 2, 4),
        (1, 0, 2, 2),
        (0, 1, 1, 2)
    ];
    let mut out = Vec::new();

    for (x0, y0, dx, dy) in PASSES {
        for y in (y0..height).step_by(dy) {
            let xs: Vec<usize> = (x0..width).step_by(dx).collect();
            if xs.is_empty() {
                break;
            }
            out.push(0);
            for x in xs {
                let p = (y * width + x) * 4;
                out.extend_from_slice(&rgba[p..p + 4]);
            }
        }
    }
    out
}
