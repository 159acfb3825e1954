//! Conversion of de-filtered scanlines into RGBA8 pixels
use crate::constants::DEPTH_SCALE_TABLE;
use crate::enums::PngColor;
use crate::error::PngDecodeErrors;

/// Every legal color type and bit depth pairing, with the transparency
/// information that applies to it
///
/// Chosen once per image so the per pixel loops do not re-inspect the header.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum PixelLayout {
    /// Grayscale at 1, 2, 4 or 8 bits, the key is compared at native depth
    Gray { depth: u8, key: Option<u16> },
    Gray16 { key: Option<u16> },
    GrayAlpha8,
    GrayAlpha16,
    Rgb8 { key: Option<[u16; 3]> },
    Rgb16 { key: Option<[u16; 3]> },
    Rgba8,
    Rgba16,
    Indexed { depth: u8 }
}

impl PixelLayout {
    pub fn new(color: PngColor, depth: u8, key: Option<[u16; 3]>) -> Option<PixelLayout> {
        if !color.allows_depth(depth) {
            return None;
        }
        let layout = match (color, depth) {
            (PngColor::Luma, 16) => Self::Gray16 {
                key: key.map(|k| k[0])
            },
            (PngColor::Luma, _) => Self::Gray {
                depth,
                // only the low `depth` bits of the key are significant
                key: key.map(|k| k[0] & ((1_u16 << depth) - 1))
            },
            (PngColor::LumaA, 8) => Self::GrayAlpha8,
            (PngColor::LumaA, _) => Self::GrayAlpha16,
            (PngColor::RGB, 8) => Self::Rgb8 { key },
            (PngColor::RGB, _) => Self::Rgb16 { key },
            (PngColor::RGBA, 8) => Self::Rgba8,
            (PngColor::RGBA, _) => Self::Rgba16,
            (PngColor::Palette, _) => Self::Indexed { depth }
        };
        Some(layout)
    }
}

/// Unpack `depth` bit samples from `row`, most significant bits first
///
/// Only valid for depths 1, 2 and 4, the iterator yields every sample the
/// row holds including padding in the last byte.
fn unpack_samples(row: &[u8], depth: u8) -> impl Iterator<Item = u8> + '_ {
    let mask = (1_u8 << depth) - 1;
    let per_byte = 8 / depth;

    row.iter().flat_map(move |byte| {
        (1..=per_byte).map(move |k| (byte >> (8 - depth * k)) & mask)
    })
}

#[inline(always)]
fn be16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

pub(crate) struct SampleExpander<'p> {
    layout:  PixelLayout,
    palette: &'p [[u8; 4]]
}

impl<'p> SampleExpander<'p> {
    pub fn new(layout: PixelLayout, palette: &'p [[u8; 4]]) -> SampleExpander<'p> {
        SampleExpander { layout, palette }
    }

    /// Expand one de-filtered scanline into `out.len()` pixels
    ///
    /// `row` must hold at least `out.len()` pixels worth of samples.
    pub fn expand_row(&self, row: &[u8], out: &mut [[u8; 4]]) -> Result<(), PngDecodeErrors> {
        match self.layout {
            PixelLayout::Gray { depth: 8, key } => {
                for (px, &v) in out.iter_mut().zip(row) {
                    let alpha = if key == Some(u16::from(v)) { 0 } else { 255 };
                    *px = [v, v, v, alpha];
                }
            }
            PixelLayout::Gray { depth, key } => {
                let scale = DEPTH_SCALE_TABLE[usize::from(depth)];

                for (px, v) in out.iter_mut().zip(unpack_samples(row, depth)) {
                    let alpha = if key == Some(u16::from(v)) { 0 } else { 255 };
                    let g = v * scale;
                    *px = [g, g, g, alpha];
                }
            }
            PixelLayout::Gray16 { key } => {
                for (px, v) in out.iter_mut().zip(row.chunks_exact(2)) {
                    let alpha = if key == Some(be16(v)) { 0 } else { 255 };
                    *px = [v[0], v[0], v[0], alpha];
                }
            }
            PixelLayout::GrayAlpha8 => {
                for (px, v) in out.iter_mut().zip(row.chunks_exact(2)) {
                    *px = [v[0], v[0], v[0], v[1]];
                }
            }
            PixelLayout::GrayAlpha16 => {
                for (px, v) in out.iter_mut().zip(row.chunks_exact(4)) {
                    *px = [v[0], v[0], v[0], v[2]];
                }
            }
            PixelLayout::Rgb8 { key } => {
                let key = key.unwrap_or([u16::MAX; 3]);

                for (px, v) in out.iter_mut().zip(row.chunks_exact(3)) {
                    let sample = [u16::from(v[0]), u16::from(v[1]), u16::from(v[2])];
                    let alpha = if sample == key { 0 } else { 255 };
                    *px = [v[0], v[1], v[2], alpha];
                }
            }
            PixelLayout::Rgb16 { key } => {
                for (px, v) in out.iter_mut().zip(row.chunks_exact(6)) {
                    let sample = [be16(&v[0..]), be16(&v[2..]), be16(&v[4..])];
                    let alpha = if key == Some(sample) { 0 } else { 255 };
                    *px = [v[0], v[2], v[4], alpha];
                }
            }
            PixelLayout::Rgba8 => {
                for (px, v) in out.iter_mut().zip(row.chunks_exact(4)) {
                    px.copy_from_slice(v);
                }
            }
            PixelLayout::Rgba16 => {
                for (px, v) in out.iter_mut().zip(row.chunks_exact(8)) {
                    *px = [v[0], v[2], v[4], v[6]];
                }
            }
            PixelLayout::Indexed { depth: 8 } => {
                for (px, &index) in out.iter_mut().zip(row) {
                    *px = self.palette_entry(index)?;
                }
            }
            PixelLayout::Indexed { depth } => {
                for (px, index) in out.iter_mut().zip(unpack_samples(row, depth)) {
                    *px = self.palette_entry(index)?;
                }
            }
        }
        Ok(())
    }

    #[inline(always)]
    fn palette_entry(&self, index: u8) -> Result<[u8; 4], PngDecodeErrors> {
        self.palette
            .get(usize::from(index))
            .copied()
            .ok_or(PngDecodeErrors::PaletteIndexOutOfRange(
                index,
                self.palette.len()
            ))
    }
}

#[cfg(test)]
mod tests {
    use crate::enums::PngColor;
    use crate::error::{ErrorKind, PngDecodeErrors};
    use crate::expand::{unpack_samples, PixelLayout, SampleExpander};

    fn expand(layout: PixelLayout, palette: &[[u8; 4]], row: &[u8], width: usize) -> Vec<[u8; 4]> {
        let mut out = vec![[0; 4]; width];
        SampleExpander::new(layout, palette)
            .expand_row(row, &mut out)
            .unwrap();
        out
    }

    #[test]
    fn layout_rejects_illegal_depths() {
        assert!(PixelLayout::new(PngColor::RGB, 4, None).is_none());
        assert!(PixelLayout::new(PngColor::Palette, 16, None).is_none());
        assert_eq!(
            PixelLayout::new(PngColor::Luma, 2, Some([3, 3, 3])),
            Some(PixelLayout::Gray {
                depth: 2,
                key:   Some(3)
            })
        );
    }

    #[test]
    fn unpack_msb_first() {
        let samples: Vec<u8> = unpack_samples(&[0b1011_0010], 1).collect();
        assert_eq!(samples, [1, 0, 1, 1, 0, 0, 1, 0]);

        let samples: Vec<u8> = unpack_samples(&[0b1101_0010], 2).collect();
        assert_eq!(samples, [3, 1, 0, 2]);

        let samples: Vec<u8> = unpack_samples(&[0xA5], 4).collect();
        assert_eq!(samples, [0xA, 0x5]);
    }

    #[test]
    fn one_bit_gray() {
        let layout = PixelLayout::new(PngColor::Luma, 1, None).unwrap();
        let out = expand(layout, &[], &[0b1011_0010], 8);

        let expected: Vec<[u8; 4]> = [1, 0, 1, 1, 0, 0, 1, 0]
            .iter()
            .map(|&b| if b == 1 { [255, 255, 255, 255] } else { [0, 0, 0, 255] })
            .collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn sub_byte_scaling_and_padding() {
        let layout = PixelLayout::new(PngColor::Luma, 2, None).unwrap();
        // 3 pixels, padding bits in the last two slots
        let out = expand(layout, &[], &[0b1101_0011], 3);
        assert_eq!(out, [[0xFF, 0xFF, 0xFF, 255], [0x55, 0x55, 0x55, 255], [0, 0, 0, 255]]);

        let layout = PixelLayout::new(PngColor::Luma, 4, None).unwrap();
        let out = expand(layout, &[], &[0x7F], 2);
        assert_eq!(out, [[0x77, 0x77, 0x77, 255], [0xFF, 0xFF, 0xFF, 255]]);
    }

    #[test]
    fn gray_key_compared_at_native_depth() {
        let layout = PixelLayout::new(PngColor::Luma, 4, Some([0x7; 3])).unwrap();
        let out = expand(layout, &[], &[0x78], 2);
        assert_eq!(out[0], [0x77, 0x77, 0x77, 0]);
        assert_eq!(out[1], [0x88, 0x88, 0x88, 255]);

        // bits above the sample depth are ignored
        let layout = PixelLayout::new(PngColor::Luma, 1, Some([0x0101; 3])).unwrap();
        assert_eq!(layout, PixelLayout::Gray { depth: 1, key: Some(1) });
        let out = expand(layout, &[], &[0b1000_0000], 2);
        assert_eq!(out, [[0xFF, 0xFF, 0xFF, 0], [0, 0, 0, 255]]);

        let layout = PixelLayout::new(PngColor::Luma, 16, Some([0x1234; 3])).unwrap();
        let out = expand(layout, &[], &[0x12, 0x34, 0x12, 0x35], 2);
        assert_eq!(out, [[0x12, 0x12, 0x12, 0], [0x12, 0x12, 0x12, 255]]);
    }

    #[test]
    fn rgb_key_and_sixteen_bit_truncation() {
        let layout = PixelLayout::new(PngColor::RGB, 8, Some([1, 2, 3])).unwrap();
        let out = expand(layout, &[], &[1, 2, 3, 1, 2, 4], 2);
        assert_eq!(out, [[1, 2, 3, 0], [1, 2, 4, 255]]);

        let layout = PixelLayout::new(PngColor::RGBA, 16, None).unwrap();
        let out = expand(layout, &[], &[0xAB, 0xCD, 0x01, 0x02, 0x03, 0x04, 0x80, 0xFF], 1);
        assert_eq!(out, [[0xAB, 0x01, 0x03, 0x80]]);

        let layout = PixelLayout::new(PngColor::LumaA, 16, None).unwrap();
        let out = expand(layout, &[], &[0x10, 0x00, 0x20, 0x00], 1);
        assert_eq!(out, [[0x10, 0x10, 0x10, 0x20]]);
    }

    #[test]
    fn palette_with_transparency() {
        let palette = [[10, 20, 30, 255], [40, 50, 60, 255], [70, 80, 90, 0x80], [1, 2, 3, 255]];
        let layout = PixelLayout::new(PngColor::Palette, 2, None).unwrap();
        // indices 0, 1, 2, 3
        let out = expand(layout, &palette, &[0b0001_1011], 4);

        assert_eq!(out, palette);
    }

    #[test]
    fn palette_index_out_of_range() {
        let palette = [[0, 0, 0, 255]; 2];
        let layout = PixelLayout::new(PngColor::Palette, 8, None).unwrap();
        let mut out = vec![[0; 4]; 3];

        let err = SampleExpander::new(layout, &palette)
            .expand_row(&[0, 1, 2], &mut out)
            .unwrap_err();

        assert!(matches!(err, PngDecodeErrors::PaletteIndexOutOfRange(2, 2)));
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
