/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Table driven CRC-32 (ISO-HDLC, the one used by zlib and gzip)
//!
//! Processes eight bytes per step using eight derived tables,
//! the tables are built at compile time.

const CRC_POLYNOMIAL: u32 = 0xEDB8_8320;

const fn make_crc_tables() -> [[u32; 256]; 8] {
    let mut tables = [[0_u32; 256]; 8];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;

        while bit < 8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ CRC_POLYNOMIAL
            } else {
                crc >> 1
            };
            bit += 1;
        }
        tables[0][i] = crc;
        i += 1;
    }

    let mut i = 0;

    while i < 256 {
        let mut table = 1;

        while table < 8 {
            let prev = tables[table - 1][i];
            tables[table][i] = (prev >> 8) ^ tables[0][(prev & 0xFF) as usize];
            table += 1;
        }
        i += 1;
    }
    tables
}

static CRC_TABLES: [[u32; 256]; 8] = make_crc_tables();

/// Update a running crc with `data`
///
/// The crc is neither pre nor post inverted, a full
/// checksum is `!crc32_slice8(data, u32::MAX)`
pub fn crc32_slice8(data: &[u8], mut crc: u32) -> u32 {
    let tab = &CRC_TABLES;

    let mut chunks = data.chunks_exact(8);

    for chunk in chunks.by_ref() {
        let lo = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) ^ crc;
        let hi = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);

        crc = tab[7][(lo & 0xFF) as usize]
            ^ tab[6][((lo >> 8) & 0xFF) as usize]
            ^ tab[5][((lo >> 16) & 0xFF) as usize]
            ^ tab[4][(lo >> 24) as usize]
            ^ tab[3][(hi & 0xFF) as usize]
            ^ tab[2][((hi >> 8) & 0xFF) as usize]
            ^ tab[1][((hi >> 16) & 0xFF) as usize]
            ^ tab[0][(hi >> 24) as usize];
    }

    for byte in chunks.remainder() {
        crc = (crc >> 8) ^ tab[0][((crc ^ u32::from(*byte)) & 0xFF) as usize];
    }
    crc
}

/// Calculate the CRC-32 of `data`
pub fn calc_crc(data: &[u8]) -> u32 {
    !crc32_slice8(data, u32::MAX)
}

#[cfg(test)]
mod tests {
    use crate::crc::{calc_crc, crc32_slice8};

    #[test]
    fn check_value() {
        assert_eq!(calc_crc(b"123456789"), 0xCBF4_3926);
        assert_eq!(calc_crc(b""), 0);
    }

    #[test]
    fn iend_chunk() {
        // every png ends with this chunk, whose crc is fixed
        assert_eq!(calc_crc(b"IEND"), 0xAE42_6082);
    }

    #[test]
    fn incremental_matches_one_shot() {
        let data: Vec<u8> = (0..=255_u8).cycle().take(1000).collect();
        let (a, b) = data.split_at(333);

        let crc = !crc32_slice8(b, crc32_slice8(a, u32::MAX));
        assert_eq!(crc, calc_crc(&data));
    }
}
