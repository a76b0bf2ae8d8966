//! Hat switch resolution for the directional pad.
//!
//! The four dpad lines occupy the low nibble of the raw input sample. The
//! report descriptor declares the hat switch with Logical Minimum 0, Logical
//! Maximum 7 (eight compass points, clockwise from up in 45° steps) and the
//! Null State flag, so any value outside 0-7 means "no direction". This module
//! uses 8 for that.

/// Directional bits of the low nibble, as wired on the board.
pub mod dir {
    pub const LEFT: u8 = 1 << 0;
    pub const RIGHT: u8 = 1 << 1;
    pub const UP: u8 = 1 << 2;
    pub const DOWN: u8 = 1 << 3;
}

/// Hat switch position as reported to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Hat {
    Up = 0,
    UpRight = 1,
    Right = 2,
    DownRight = 3,
    Down = 4,
    DownLeft = 5,
    Left = 6,
    UpLeft = 7,
    /// No direction (outside the logical range).
    Null = 8,
}

impl Hat {
    /// Report value (0-8).
    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }
}

/// The four directional lines, extracted from a raw sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DpadCode(u8);

impl DpadCode {
    /// Take the low nibble of `raw`.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self((raw & 0x0F) as u8)
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Resolve to a hat position via [`HAT_TABLE`].
    #[inline]
    #[must_use]
    pub const fn hat(self) -> Hat {
        HAT_TABLE[self.0 as usize]
    }
}

/// Hat position for every possible dpad code.
pub const HAT_TABLE: [Hat; 16] = make_table();

const fn make_table() -> [Hat; 16] {
    let mut table = [Hat::Null; 16];
    let mut code = 0;
    while code < 16 {
        table[code] = resolve(code as u8);
        code += 1;
    }
    table
}

/// Map a combination of directional bits to a hat position.
///
/// Opposing directions held together (up+down or left+right) give
/// [`Hat::Null`], regardless of the remaining lines.
const fn resolve(code: u8) -> Hat {
    // Three lines held (e.g. up+left+right) are null too, not the leftover direction.
    let up = code & dir::UP != 0;
    let down = code & dir::DOWN != 0;
    let left = code & dir::LEFT != 0;
    let right = code & dir::RIGHT != 0;

    if (up && down) || (left && right) {
        return Hat::Null;
    }

    match (up, down, left, right) {
        (true, _, false, false) => Hat::Up,
        (true, _, false, true) => Hat::UpRight,
        (false, false, false, true) => Hat::Right,
        (_, true, false, true) => Hat::DownRight,
        (_, true, false, false) => Hat::Down,
        (_, true, true, _) => Hat::DownLeft,
        (false, false, true, _) => Hat::Left,
        (true, _, true, _) => Hat::UpLeft,
        (false, false, false, false) => Hat::Null,
    }
}
