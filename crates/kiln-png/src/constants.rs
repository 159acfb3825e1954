/// The eight bytes every png stream starts with
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Largest value a chunk length or image dimension may hold
pub const PNG_MAX_U31: usize = (1 << 31) - 1;

/// Multiplier taking a sub-byte sample to the full 8 bit range,
/// indexed by bit depth
pub const DEPTH_SCALE_TABLE: [u8; 9] = [0, 0xff, 0x55, 0, 0x11, 0, 0, 0, 0x01];

// Adam7 pass origins and spacing
pub const XORIG: [usize; 7] = [0, 4, 0, 2, 0, 1, 0];
pub const YORIG: [usize; 7] = [0, 0, 4, 0, 2, 0, 1];

pub const XSPC: [usize; 7] = [8, 8, 4, 4, 2, 2, 1];
pub const YSPC: [usize; 7] = [8, 8, 8, 4, 4, 2, 2];
