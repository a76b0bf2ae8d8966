//! HID report body encoding.
//!
//! Layout of the 4-byte body (little-endian):
//!
//! | Bits  | Content |
//! |-------|---------|
//! | 0-27  | Buttons 1-28 |
//! | 28-31 | Hat switch (0-7, 8 = null) |

use crate::hat::{DpadCode, Hat};

/// Size of the report body in bytes.
pub const BODY_SIZE: usize = 4;

/// Number of single-bit buttons in the report.
pub const BUTTON_COUNT: u32 = 28;

const BUTTON_MASK: u32 = (1 << BUTTON_COUNT) - 1;

/// One masked, active-high sample of the monitored pins.
///
/// Bit 0 is the first monitored pin. The low nibble holds the dpad lines, the
/// remaining bits are buttons.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawInput(pub u32);

impl RawInput {
    /// Nothing pressed.
    pub const RELEASED: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The four dpad lines.
    #[inline]
    #[must_use]
    pub const fn dpad(self) -> DpadCode {
        DpadCode::from_raw(self.0)
    }

    /// The button bits, reindexed to start at bit 0.
    #[inline]
    #[must_use]
    pub const fn buttons(self) -> ButtonBitmap {
        ButtonBitmap(self.0 >> 4)
    }
}

/// 28 button bits, bit 0 = button 1.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonBitmap(u32);

impl ButtonBitmap {
    /// Every button pressed.
    pub const ALL: Self = Self(BUTTON_MASK);

    /// Build from raw bits. Bits above the 28th are dropped.
    #[inline]
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits & BUTTON_MASK)
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0 & BUTTON_MASK
    }

    /// Check if button `n` (1-based, as in the descriptor's usage range) is pressed.
    #[inline]
    #[must_use]
    pub const fn is_pressed(self, n: u32) -> bool {
        n >= 1 && n <= BUTTON_COUNT && self.0 & (1 << (n - 1)) != 0
    }
}

/// Pack buttons and hat into a report body.
#[inline]
#[must_use]
pub const fn pack(buttons: ButtonBitmap, hat: Hat) -> [u8; BODY_SIZE] {
    let word = buttons.bits() | ((hat.value() as u32) << BUTTON_COUNT);
    word.to_le_bytes()
}

/// Encode a raw sample into a report body.
#[inline]
#[must_use]
pub const fn encode(raw: RawInput) -> [u8; BODY_SIZE] {
    pack(raw.buttons(), raw.dpad().hat())
}
