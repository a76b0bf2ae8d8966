//! Transmission frames: report body plus CRC-16 trailer.
//!
//! Wire format: `[btn0, btn1, btn2, btn3_lo | hat << 4, crc_lo, crc_hi]`.

use crate::crc;
use crate::report::{encode, RawInput, BODY_SIZE};

/// Size of a frame in bytes.
pub const FRAME_SIZE: usize = BODY_SIZE + 2;

/// Append the CRC-16 trailer (low byte first) to a report body.
#[must_use]
pub fn append_crc(body: [u8; BODY_SIZE]) -> [u8; FRAME_SIZE] {
    let [lo, hi] = crc::checksum(&body).to_le_bytes();
    [body[0], body[1], body[2], body[3], lo, hi]
}

/// A complete 6-byte report frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame([u8; FRAME_SIZE]);

impl Frame {
    /// Assemble the frame for one raw sample.
    #[must_use]
    pub fn assemble(raw: RawInput) -> Self {
        Self(append_crc(encode(raw)))
    }

    /// Frame with nothing pressed.
    #[must_use]
    pub fn released() -> Self {
        Self::assemble(RawInput::RELEASED)
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }

    /// The 4-byte report body.
    #[inline]
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.0[..BODY_SIZE]
    }

    /// The trailer as transmitted.
    #[inline]
    #[must_use]
    pub const fn crc(&self) -> u16 {
        u16::from_le_bytes([self.0[4], self.0[5]])
    }

    /// Re-check the trailer against the body.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        crc::verify(&self.0)
    }
}

impl From<Frame> for [u8; FRAME_SIZE] {
    fn from(frame: Frame) -> Self {
        frame.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::{Crc16, RESIDUE};

    #[test]
    fn test_golden_released_frame() {
        assert_eq!(
            Frame::released().as_bytes(),
            &[0x00, 0x00, 0x00, 0x80, 0xD6, 0x78]
        );
    }

    #[test]
    fn test_append_crc_all_ones() {
        assert_eq!(
            append_crc([0xFF, 0xFF, 0xFF, 0xFF]),
            [0xFF, 0xFF, 0xFF, 0xFF, 0x47, 0x0F]
        );
    }

    #[test]
    fn test_all_pressed_frame() {
        let frame = Frame::assemble(RawInput(u32::MAX));
        assert_eq!(frame.as_bytes(), &[0xFF, 0xFF, 0xFF, 0x8F, 0xC0, 0x7C]);
    }

    #[test]
    fn test_frames_carry_valid_trailer() {
        for raw in [0, 1, 0x10, 0xABCD_EF01, 0x0FFF_FFF0, u32::MAX] {
            let frame = Frame::assemble(RawInput(raw));
            assert!(frame.is_valid(), "raw {raw:#010X}");

            let mut digest = Crc16::new();
            digest.update_slice(frame.as_bytes());
            assert_eq!(digest.finalize(), !RESIDUE);
        }
    }

    #[test]
    fn test_body_and_crc_accessors() {
        let frame = Frame::assemble(RawInput(0b0100));
        assert_eq!(frame.body(), &[0x00, 0x00, 0x00, 0x00]);
        assert_eq!(frame.crc(), crc::checksum(frame.body()));
        let bytes: [u8; FRAME_SIZE] = frame.into();
        assert_eq!(bytes.len(), 6);
    }
}
