//! Adam7 pass geometry and reassembly
use crate::constants::{XORIG, XSPC, YORIG, YSPC};

/// Dimensions of Adam7 pass `pass` (0..7) of a `width` x `height` image
///
/// Either dimension may be zero for small images, such passes carry no data.
pub(crate) const fn pass_dimensions(width: usize, height: usize, pass: usize) -> (usize, usize) {
    let x = (width + XSPC[pass] - 1).saturating_sub(XORIG[pass]) / XSPC[pass];
    let y = (height + YSPC[pass] - 1).saturating_sub(YORIG[pass]) / YSPC[pass];
    (x, y)
}

/// Bytes in one scanline without the filter byte, `None` on overflow
pub(crate) fn row_bytes(width: usize, components: u8, depth: u8) -> Option<usize> {
    let bits = width.checked_mul(usize::from(components) * usize::from(depth))?;
    Some(bits.checked_add(7)? / 8)
}

/// Bytes of filtered data, filter bytes included, needed for a
/// `width` x `height` sub-image, `None` on overflow
pub(crate) fn filtered_size(
    width: usize, height: usize, components: u8, depth: u8
) -> Option<usize> {
    if width == 0 || height == 0 {
        return Some(0);
    }
    row_bytes(width, components, depth)?
        .checked_add(1)?
        .checked_mul(height)
}

/// Total filtered bytes for an image, summing all seven passes when interlaced
pub(crate) fn raw_image_size(
    width: usize, height: usize, components: u8, depth: u8, interlaced: bool
) -> Option<usize> {
    if !interlaced {
        return filtered_size(width, height, components, depth);
    }
    (0..7).try_fold(0_usize, |acc, pass| {
        let (x, y) = pass_dimensions(width, height, pass);
        acc.checked_add(filtered_size(x, y, components, depth)?)
    })
}

/// Copy row `pass_y` of pass `pass` into its place in the full image
///
/// `out` holds the whole image, `width` pixels per row.
pub(crate) fn scatter_row<T: Copy>(
    pass: usize, pass_y: usize, row: &[T], out: &mut [T], width: usize
) {
    let y = pass_y * YSPC[pass] + YORIG[pass];
    let start = y * width + XORIG[pass];
    let end = (y + 1) * width;

    if start >= end || end > out.len() {
        return;
    }
    for (dst, src) in out[start..end].iter_mut().step_by(XSPC[pass]).zip(row) {
        *dst = *src;
    }
}

#[cfg(test)]
mod tests {
    use crate::interlace::{pass_dimensions, raw_image_size, row_bytes, scatter_row};

    #[test]
    fn eight_by_eight_passes() {
        let dims: Vec<(usize, usize)> = (0..7).map(|p| pass_dimensions(8, 8, p)).collect();
        assert_eq!(
            dims,
            [(1, 1), (1, 1), (2, 1), (2, 2), (4, 2), (4, 4), (8, 4)]
        );
        let total: usize = dims.iter().map(|(x, y)| x * y).sum();
        assert_eq!(total, 64);
    }

    #[test]
    fn tiny_images_have_empty_passes() {
        let dims: Vec<(usize, usize)> = (0..7).map(|p| pass_dimensions(1, 1, p)).collect();
        assert_eq!(dims[0], (1, 1));
        assert!(dims[1..].iter().all(|&(x, y)| x == 0 || y == 0));

        for (w, h) in [(1, 5), (3, 2), (5, 1), (9, 13)] {
            let total: usize = (0..7)
                .map(|p| pass_dimensions(w, h, p))
                .map(|(x, y)| x * y)
                .sum();
            assert_eq!(total, w * h, "{w}x{h}");
        }
    }

    #[test]
    fn raw_sizes() {
        assert_eq!(row_bytes(3, 1, 1), Some(1));
        assert_eq!(row_bytes(9, 1, 1), Some(2));
        assert_eq!(row_bytes(2, 4, 16), Some(16));
        assert_eq!(row_bytes(usize::MAX, 4, 16), None);

        assert_eq!(raw_image_size(4, 4, 3, 8, false), Some(4 * (12 + 1)));
        // 1x1 interlaced only has pass one
        assert_eq!(raw_image_size(1, 1, 1, 8, true), Some(2));
        // 2x2 gray 8: passes 1 (1x1), 6 (1x1) and 7 (2x1)
        assert_eq!(raw_image_size(2, 2, 1, 8, true), Some(2 + 2 + 3));
    }

    #[test]
    fn scatter_covers_every_pixel_once() {
        for (w, h) in [(8, 8), (5, 3), (1, 1), (11, 7)] {
            let mut hits = vec![0_u8; w * h];
            let mut owner = vec![usize::MAX; w * h];

            for pass in 0..7 {
                let (pw, ph) = pass_dimensions(w, h, pass);

                for py in 0..ph {
                    let row = vec![pass; pw];
                    let mut marks = owner.clone();
                    scatter_row(pass, py, &row, &mut marks, w);

                    for (i, (old, new)) in owner.iter().zip(&marks).enumerate() {
                        if old != new {
                            hits[i] += 1;
                        }
                    }
                    owner = marks;
                }
            }
            assert!(hits.iter().all(|&n| n == 1), "{w}x{h}");
        }
    }
}
