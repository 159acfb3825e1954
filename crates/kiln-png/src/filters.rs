/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Scanline de-filtering
//!
//! Every scanline starts with a filter byte followed by `stride` filtered bytes.
//! Rows are reconstructed top to bottom into one contiguous buffer, the row above
//! is borrowed from the part of the buffer already written.
use crate::enums::FilterMethod;
use crate::error::PngDecodeErrors;

/// Reverse the filters of `height` scanlines
///
/// - `data`: filtered scanlines, each `stride + 1` bytes long
/// - `out`: destination, receives `stride * height` bytes
/// - `components`: bytes per complete pixel, one for sub-byte depths
///
/// The row above the first row is treated as zeroes.
pub(crate) fn defilter_rows(
    data: &[u8], out: &mut [u8], stride: usize, height: usize, components: usize
) -> Result<(), PngDecodeErrors> {
    let in_stride = stride + 1;
    let expected = in_stride * height;

    if data.len() < expected {
        return Err(PngDecodeErrors::ShortData(expected, data.len()));
    }
    if out.len() < stride * height {
        return Err(PngDecodeErrors::TooSmallOutput(stride * height, out.len()));
    }

    for (row, in_row) in data.chunks_exact(in_stride).take(height).enumerate() {
        let filter_byte = in_row[0];
        let raw = &in_row[1..];

        let mut filter = FilterMethod::from_int(filter_byte)
            .ok_or(PngDecodeErrors::UnknownFilter(filter_byte, row))?;

        let (prev, rest) = out.split_at_mut(row * stride);
        let current = &mut rest[..stride];

        if row == 0 {
            // no row above, switch to variants that read zeroes for it
            filter = match filter {
                FilterMethod::Up => FilterMethod::None,
                FilterMethod::Average => FilterMethod::AvgFirst,
                // paeth(a, 0, 0) is always a
                FilterMethod::Paeth => FilterMethod::Sub,
                other => other
            };
            handle_row(filter, &[], raw, current, components);
        } else {
            let prev_row = &prev[(row - 1) * stride..];
            handle_row(filter, prev_row, raw, current, components);
        }
    }
    Ok(())
}

#[inline]
fn handle_row(
    filter: FilterMethod, prev_row: &[u8], raw: &[u8], current: &mut [u8], components: usize
) {
    match filter {
        FilterMethod::None => current.copy_from_slice(raw),
        FilterMethod::Sub => handle_sub(raw, current, components),
        FilterMethod::Up => handle_up(prev_row, raw, current),
        FilterMethod::Average => handle_avg(prev_row, raw, current, components),
        FilterMethod::Paeth => handle_paeth(prev_row, raw, current, components),
        FilterMethod::AvgFirst => handle_avg_first(raw, current, components)
    }
}

#[allow(clippy::manual_memcpy)]
pub fn handle_sub(raw: &[u8], current: &mut [u8], components: usize) {
    if current.len() < components || raw.len() < components {
        current.copy_from_slice(raw);
        return;
    }
    // leftmost pixel has nothing to its left
    for i in 0..components {
        current[i] = raw[i];
    }
    let end = current.len().min(raw.len());

    for i in components..end {
        let a = current[i - components];
        current[i] = raw[i].wrapping_add(a);
    }
}

pub fn handle_up(prev_row: &[u8], raw: &[u8], current: &mut [u8]) {
    for ((filt, recon), up) in raw.iter().zip(current).zip(prev_row) {
        *recon = (*filt).wrapping_add(*up)
    }
}

pub fn handle_avg(prev_row: &[u8], raw: &[u8], current: &mut [u8], components: usize) {
    let lead = components.min(current.len()).min(raw.len()).min(prev_row.len());

    for i in 0..lead {
        current[i] = raw[i].wrapping_add(prev_row[i] >> 1);
    }
    let end = current.len().min(raw.len()).min(prev_row.len());

    for i in components..end {
        let a = current[i - components];
        let b = prev_row[i];

        // floor((a + b) / 2) without widening
        let c = (a & b) + ((a ^ b) >> 1);

        current[i] = raw[i].wrapping_add(c);
    }
}

/// Average filter on the first scanline, where the row above is zero
pub fn handle_avg_first(raw: &[u8], current: &mut [u8], components: usize) {
    let lead = components.min(current.len()).min(raw.len());

    current[..lead].copy_from_slice(&raw[..lead]);

    let end = current.len().min(raw.len());

    for i in components..end {
        let avg = current[i - components] >> 1;
        current[i] = raw[i].wrapping_add(avg)
    }
}

pub fn handle_paeth(prev_row: &[u8], raw: &[u8], current: &mut [u8], components: usize) {
    let lead = components.min(current.len()).min(raw.len()).min(prev_row.len());

    // left and upper left are zero, predictor collapses to the byte above
    for i in 0..lead {
        current[i] = raw[i].wrapping_add(prev_row[i]);
    }
    let end = current.len().min(raw.len()).min(prev_row.len());

    for i in components..end {
        let paeth_res = paeth(
            current[i - components],
            prev_row[i],
            prev_row[i - components]
        );
        current[i] = raw[i].wrapping_add(paeth_res)
    }
}

/// The paeth predictor of left `a`, above `b` and upper left `c`
#[inline(always)]
pub fn paeth(a: u8, b: u8, c: u8) -> u8 {
    // branch free formulation from stb_image, equivalent to the
    // reference predictor which compares |p-a|, |p-b| and |p-c|
    let a = i32::from(a);
    let b = i32::from(b);
    let c = i32::from(c);
    let thresh = c * 3 - (a + b);
    let lo = if a < b { a } else { b };
    let hi = if a < b { b } else { a };

    let t0 = if hi <= thresh { lo } else { c };
    let t1 = if thresh <= lo { hi } else { t0 };
    t1 as u8
}

#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, PngDecodeErrors};
    use crate::filters::{defilter_rows, paeth};

    fn reference_paeth(a: u8, b: u8, c: u8) -> u8 {
        let p = i16::from(a) + i16::from(b) - i16::from(c);
        let pa = (p - i16::from(a)).abs();
        let pb = (p - i16::from(b)).abs();
        let pc = (p - i16::from(c)).abs();

        if pa <= pb && pa <= pc {
            a
        } else if pb <= pc {
            b
        } else {
            c
        }
    }

    /// Apply `filter` to `row` given the unfiltered row above
    fn filter_row(filter: u8, prev: &[u8], row: &[u8], bpp: usize) -> Vec<u8> {
        let mut out = vec![filter];

        for i in 0..row.len() {
            let a = if i >= bpp { row[i - bpp] } else { 0 };
            let b = prev[i];
            let c = if i >= bpp { prev[i - bpp] } else { 0 };

            let pred = match filter {
                0 => 0,
                1 => a,
                2 => b,
                3 => ((u16::from(a) + u16::from(b)) / 2) as u8,
                4 => reference_paeth(a, b, c),
                _ => unreachable!()
            };
            out.push(row[i].wrapping_sub(pred));
        }
        out
    }

    #[test]
    fn paeth_matches_reference() {
        for a in (0..=255_u8).step_by(5) {
            for b in (0..=255_u8).step_by(7) {
                for c in (0..=255_u8).step_by(3) {
                    assert_eq!(paeth(a, b, c), reference_paeth(a, b, c), "{a} {b} {c}");
                }
            }
        }
    }

    #[test]
    fn single_row_every_filter() {
        let row: Vec<u8> = (0..24_u8).map(|x| x.wrapping_mul(37).wrapping_add(200)).collect();
        let zeroes = vec![0; row.len()];

        for bpp in [1, 3, 4] {
            for filter in 0..5 {
                let filtered = filter_row(filter, &zeroes, &row, bpp);
                let mut out = vec![0; row.len()];

                defilter_rows(&filtered, &mut out, row.len(), 1, bpp).unwrap();
                assert_eq!(out, row, "filter {filter} bpp {bpp}");
            }
        }
    }

    #[test]
    fn rows_depend_on_defiltered_row_above() {
        let stride = 8;
        let rows: Vec<Vec<u8>> = (0..6_u8)
            .map(|r| (0..stride as u8).map(|x| x ^ (r * 41)).collect())
            .collect();

        let mut filtered = Vec::new();
        let mut prev = vec![0; stride];

        for (i, row) in rows.iter().enumerate() {
            filtered.extend(filter_row((i % 5) as u8, &prev, row, 2));
            prev.clone_from(row);
        }
        let mut out = vec![0; stride * rows.len()];

        defilter_rows(&filtered, &mut out, stride, rows.len(), 2).unwrap();
        assert_eq!(out, rows.concat());
    }

    #[test]
    fn unknown_filter_is_format_error() {
        let data = [0, 1, 2, 5, 1, 2];
        let mut out = [0; 4];
        let err = defilter_rows(&data, &mut out, 2, 2, 1).unwrap_err();

        assert!(matches!(err, PngDecodeErrors::UnknownFilter(5, 1)));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn short_input_is_rejected() {
        let mut out = [0; 4];
        let err = defilter_rows(&[0, 1, 2], &mut out, 2, 2, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Compression);
    }
}
