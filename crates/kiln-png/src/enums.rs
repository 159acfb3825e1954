#![allow(clippy::upper_case_acronyms, non_camel_case_types)]

/// Chunk types the decoder recognizes, see table 5.3 of
/// https://www.w3.org/TR/2003/REC-PNG-20031110/
/// plus the animated png extension chunks
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PngChunkType {
    IHDR,
    PLTE,
    IDAT,
    IEND,
    eXIf,
    cHRM,
    gAMA,
    iCCP,
    sBIT,
    sRGB,
    bKGD,
    hIST,
    tRNS,
    pHYs,
    sPLT,
    tIME,
    iTXt,
    tEXt,
    zTXt,
    acTL,
    fcTL,
    fdAT,
    unkn
}

impl PngChunkType {
    pub fn from_tag(tag: [u8; 4]) -> PngChunkType {
        match &tag {
            b"IHDR" => Self::IHDR,
            b"PLTE" => Self::PLTE,
            b"IDAT" => Self::IDAT,
            b"IEND" => Self::IEND,
            b"eXIf" => Self::eXIf,
            b"cHRM" => Self::cHRM,
            b"gAMA" => Self::gAMA,
            b"iCCP" => Self::iCCP,
            b"sBIT" => Self::sBIT,
            b"sRGB" => Self::sRGB,
            b"bKGD" => Self::bKGD,
            b"hIST" => Self::hIST,
            b"tRNS" => Self::tRNS,
            b"pHYs" => Self::pHYs,
            b"sPLT" => Self::sPLT,
            b"tIME" => Self::tIME,
            b"iTXt" => Self::iTXt,
            b"tEXt" => Self::tEXt,
            b"zTXt" => Self::zTXt,
            b"acTL" => Self::acTL,
            b"fcTL" => Self::fcTL,
            b"fdAT" => Self::fdAT,
            _ => Self::unkn
        }
    }

    /// Return true for the animated png extension chunks
    pub const fn is_animation_chunk(self) -> bool {
        matches!(self, Self::acTL | Self::fcTL | Self::fdAT)
    }

    /// Return true if a chunk should appear
    /// before the PLTE chunk
    pub const fn should_appear_before_plte(self) -> bool {
        matches!(
            self,
            Self::cHRM | Self::gAMA | Self::iCCP | Self::sBIT | Self::sRGB
        )
    }

    /// Return true if a chunk should appear
    /// before the IDAT chunk
    pub const fn should_appear_before_idat(self) -> bool {
        matches!(
            self,
            Self::PLTE
                | Self::cHRM
                | Self::gAMA
                | Self::iCCP
                | Self::sBIT
                | Self::sRGB
                | Self::bKGD
                | Self::hIST
                | Self::tRNS
                | Self::pHYs
                | Self::sPLT
                | Self::acTL
        )
    }

    /// Return true if at most one chunk of this type may appear
    pub const fn is_unique(self) -> bool {
        !matches!(
            self,
            Self::IDAT | Self::sPLT | Self::iTXt | Self::tEXt | Self::zTXt | Self::fcTL | Self::fdAT
        )
    }
}

/// Return true if the ancillary bit (bit 5 of the first byte,
/// a lower case letter) of a chunk tag is set
pub const fn is_ancillary(tag: [u8; 4]) -> bool {
    tag[0] & (1 << 5) != 0
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FilterMethod {
    None,
    Sub,
    Up,
    Average,
    Paeth,
    // average filter on the first scanline
    AvgFirst
}

impl FilterMethod {
    pub fn from_int(int: u8) -> Option<FilterMethod> {
        match int {
            0 => Some(FilterMethod::None),
            1 => Some(FilterMethod::Sub),
            2 => Some(FilterMethod::Up),
            3 => Some(FilterMethod::Average),
            4 => Some(FilterMethod::Paeth),
            _ => None
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum InterlaceMethod {
    #[default]
    Standard,
    Adam7
}

impl InterlaceMethod {
    pub fn from_int(int: u8) -> Option<InterlaceMethod> {
        match int {
            0 => Some(Self::Standard),
            1 => Some(Self::Adam7),
            _ => None
        }
    }
}

/// How the frame area is treated before rendering the next frame
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DisposeOp {
    #[default]
    None,
    Background,
    Previous
}

impl DisposeOp {
    pub fn from_int(int: u8) -> Option<DisposeOp> {
        match int {
            0 => Some(Self::None),
            1 => Some(Self::Background),
            2 => Some(Self::Previous),
            _ => None
        }
    }
}

/// How a frame is combined with the output buffer
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BlendOp {
    #[default]
    Source,
    Over
}

impl BlendOp {
    pub fn from_int(int: u8) -> Option<BlendOp> {
        match int {
            0 => Some(Self::Source),
            1 => Some(Self::Over),
            _ => None
        }
    }
}

/// Color type of the encoded image
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PngColor {
    #[default]
    Luma,
    Palette,
    LumaA,
    RGB,
    RGBA
}

impl PngColor {
    /// Number of samples stored per pixel
    pub const fn num_components(self) -> u8 {
        match self {
            PngColor::Luma => 1,
            PngColor::Palette => 1,
            PngColor::LumaA => 2,
            PngColor::RGB => 3,
            PngColor::RGBA => 4
        }
    }

    pub(crate) fn from_int(int: u8) -> Option<PngColor> {
        match int {
            0 => Some(Self::Luma),
            2 => Some(Self::RGB),
            3 => Some(Self::Palette),
            4 => Some(Self::LumaA),
            6 => Some(Self::RGBA),
            _ => None
        }
    }

    /// Return true if `depth` is a legal bit depth for this color type
    pub const fn allows_depth(self, depth: u8) -> bool {
        match self {
            PngColor::Luma => matches!(depth, 1 | 2 | 4 | 8 | 16),
            PngColor::Palette => matches!(depth, 1 | 2 | 4 | 8),
            PngColor::LumaA | PngColor::RGB | PngColor::RGBA => matches!(depth, 8 | 16)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::enums::{is_ancillary, PngChunkType, PngColor};

    #[test]
    fn depth_color_combinations() {
        let legal = [
            (0, &[1, 2, 4, 8, 16][..]),
            (2, &[8, 16][..]),
            (3, &[1, 2, 4, 8][..]),
            (4, &[8, 16][..]),
            (6, &[8, 16][..])
        ];
        for (color, depths) in legal {
            let color = PngColor::from_int(color).unwrap();

            for depth in [0, 1, 2, 3, 4, 5, 8, 12, 16, 32] {
                assert_eq!(
                    color.allows_depth(depth),
                    depths.contains(&depth),
                    "{color:?} at depth {depth}"
                );
            }
        }
        assert!(PngColor::from_int(1).is_none());
        assert!(PngColor::from_int(5).is_none());
        assert!(PngColor::from_int(7).is_none());
    }

    #[test]
    fn ancillary_bit() {
        assert!(!is_ancillary(*b"IHDR"));
        assert!(!is_ancillary(*b"IDAT"));
        assert!(is_ancillary(*b"tRNS"));
        assert!(is_ancillary(*b"prVt"));
        assert_eq!(PngChunkType::from_tag(*b"prVt"), PngChunkType::unkn);
    }
}
