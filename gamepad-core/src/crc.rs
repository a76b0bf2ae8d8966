//! CRC-16 integrity trailer for report frames.
//!
//! Uses CRC-16/X-25 (reflected CCITT polynomial, init `0xFFFF`, final
//! inversion). Frames are built with a 256-entry lookup table generated at
//! compile time; [`Crc16`] and [`verify`] use the `crc` crate's X-25
//! definition of the same algorithm.

use crc::{Crc, CRC_16_IBM_SDLC};

/// CRC-16/X-25 calculator.
const X25: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// Reflected form of the CCITT generator polynomial `0x1021`.
pub const POLY_REFLECTED: u16 = 0x8408;

/// Register value at the start of every computation.
pub const INIT: u16 = 0xFFFF;

/// Register value left after running the CRC over a frame that carries a
/// valid trailer, before the final inversion.
pub const RESIDUE: u16 = 0xF0B8;

/// Byte-wise lookup table.
pub const TABLE: [u16; 256] = make_table(POLY_REFLECTED);

const fn make_table(poly: u16) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut reg = i as u16;
        let mut bit = 0;
        while bit < 8 {
            reg = if reg & 1 != 0 { (reg >> 1) ^ poly } else { reg >> 1 };
            bit += 1;
        }
        table[i] = reg;
        i += 1;
    }
    table
}

/// Advance the register by one byte.
#[inline(always)]
#[must_use]
pub const fn update(register: u16, byte: u8) -> u16 {
    (register >> 8) ^ TABLE[((register ^ byte as u16) & 0xFF) as usize]
}

/// Calculate the CRC-16/X-25 of a byte slice.
#[inline]
#[must_use]
pub fn checksum(data: &[u8]) -> u16 {
    !data.iter().fold(INIT, |register, &byte| update(register, byte))
}

/// Check a frame whose last two bytes are a little-endian trailer produced by
/// this module.
#[must_use]
pub fn verify(frame: &[u8]) -> bool {
    frame.len() >= 2 && X25.checksum(frame) == !RESIDUE
}

/// CRC-16 digest for incremental calculation.
pub struct Crc16 {
    digest: crc::Digest<'static, u16>,
}

impl Crc16 {
    /// Create a new CRC-16 digest.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            digest: X25.digest(),
        }
    }

    /// Update the digest with a single byte.
    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.digest.update(&[byte]);
    }

    /// Update the digest with a byte slice.
    #[inline]
    pub fn update_slice(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    /// Finalize and return the checksum value.
    #[inline]
    #[must_use]
    pub fn finalize(self) -> u16 {
        self.digest.finalize()
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Bit-at-a-time CRC-16/X-25 without any table.
    fn bitwise_x25(data: &[u8]) -> u16 {
        let mut reg: u16 = 0xFFFF;
        for &byte in data {
            reg ^= u16::from(byte);
            for _ in 0..8 {
                reg = if reg & 1 != 0 {
                    (reg >> 1) ^ 0x8408
                } else {
                    reg >> 1
                };
            }
        }
        !reg
    }

    const BODIES: [[u8; 4]; 6] = [
        [0x00, 0x00, 0x00, 0x00],
        [0xFF, 0xFF, 0xFF, 0xFF],
        [0x00, 0x00, 0x00, 0x80],
        [0x01, 0x02, 0x03, 0x04],
        [0xA5, 0x5A, 0x0F, 0xF0],
        [0xFF, 0xFF, 0xFF, 0x8F],
    ];

    #[test]
    fn test_table_known_entries() {
        assert_eq!(TABLE[0], 0x0000);
        assert_eq!(TABLE[1], 0x1189);
        assert_eq!(TABLE[128], 0x8408);
        assert_eq!(TABLE[255], 0x0F78);
    }

    #[test]
    fn test_check_value() {
        assert_eq!(checksum(b"123456789"), 0x906E);
    }

    #[test]
    fn test_matches_bitwise_reference() {
        for body in BODIES {
            assert_eq!(checksum(&body), bitwise_x25(&body), "body {:02X?}", body);
        }
    }

    #[test]
    fn test_matches_crc_crate() {
        for body in BODIES {
            assert_eq!(checksum(&body), X25.checksum(&body), "body {:02X?}", body);
        }
    }

    #[test]
    fn test_known_checksums() {
        assert_eq!(checksum(&[0x00, 0x00, 0x00, 0x00]), 0xFCDE);
        assert_eq!(checksum(&[0xFF, 0xFF, 0xFF, 0xFF]), 0x0F47);
        assert_eq!(checksum(&[0x00, 0x00, 0x00, 0x80]), 0x78D6);
    }

    #[test]
    fn test_residue_over_frame_with_trailer() {
        for body in BODIES {
            let [lo, hi] = checksum(&body).to_le_bytes();
            let frame = [body[0], body[1], body[2], body[3], lo, hi];
            let register = frame.iter().fold(INIT, |reg, &b| update(reg, b));
            assert_eq!(register, RESIDUE, "body {:02X?}", body);

            let mut digest = Crc16::new();
            digest.update_slice(&frame);
            assert_eq!(digest.finalize(), !RESIDUE);
        }
    }

    #[test]
    fn test_verify_rejects_corruption() {
        let body = [0x12, 0x34, 0x56, 0x78];
        let [lo, hi] = checksum(&body).to_le_bytes();
        let mut frame = [body[0], body[1], body[2], body[3], lo, hi];
        assert!(verify(&frame));

        frame[2] ^= 0x01;
        assert!(!verify(&frame));
        assert!(!verify(&[0x00]));
    }

    #[test]
    fn test_digest_matches_batch() {
        let data = [0x10, 0x20, 0x30, 0x40];
        let mut digest = Crc16::default();
        for &b in &data {
            digest.update(b);
        }
        assert_eq!(digest.finalize(), checksum(&data));
    }
}
