//! Compile-time configuration.
//!
//! Everything the firmware needs to know about the board and the USB identity
//! lives here. There is no runtime configuration surface.

/// GPIO lines sampled each cycle (GPIO 2-22 and 26-28).
///
/// GPIO 0/1 carry the USB data lines and GPIO 23-25 are used by the Pico
/// board itself (power save, VBUS sense, LED).
pub const PIN_MASK: u32 = 0b0001_1100_0111_1111_1111_1111_1111_1100;

/// Right shift that moves the first monitored pin (GPIO 2) to bit 0.
pub const PIN_SHIFT: u32 = PIN_MASK.trailing_zeros();

/// Delay between two samples on the sampling core, in microseconds.
///
/// Well below the 1 ms host poll interval.
pub const SAMPLE_PERIOD_US: u64 = 100;

/// USB vendor ID.
pub const USB_VID: u16 = 0xCAFE;

/// USB product ID.
pub const USB_PID: u16 = 0x0666;

/// Manufacturer string (string descriptor index 1).
pub const MANUFACTURER: &str = "RP2040";

/// Product string (string descriptor index 2).
pub const PRODUCT: &str = "Zero Latency Gamepad";

/// Supported language ID (US English).
pub const LANGUAGE_ID: u16 = 0x0409;

/// Endpoint number of the interrupt IN endpoint carrying reports.
pub const REPORT_ENDPOINT: u8 = 1;

/// Max packet size of EP0 and of the report endpoint.
pub const MAX_PACKET_SIZE: u16 = 64;

/// Report endpoint polling interval (frames).
pub const POLL_INTERVAL: u8 = 1;

/// Bus power draw in mA.
pub const MAX_POWER_MA: u16 = 100;

/// USB PHY pin assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhyConfig {
    /// GPIO carrying D+.
    pub pin_dp: u8,
    /// GPIO carrying D-. Always the pin after D+.
    pub pin_dm: u8,
}

impl PhyConfig {
    /// D+ on GPIO 0, D- on GPIO 1.
    pub const DEFAULT: Self = Self::with_dp(0);

    /// Build a configuration with D- on the pin following `pin_dp`.
    #[must_use]
    pub const fn with_dp(pin_dp: u8) -> Self {
        Self {
            pin_dp,
            pin_dm: pin_dp + 1,
        }
    }

    /// Bitmask of the two PHY pins.
    #[must_use]
    pub const fn pin_mask(&self) -> u32 {
        (1 << self.pin_dp) | (1 << self.pin_dm)
    }
}

impl Default for PhyConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_shift_matches_first_monitored_pin() {
        assert_eq!(PIN_SHIFT, 2);
    }

    #[test]
    fn test_monitored_pin_count() {
        // 4 dpad lines + 20 buttons wired
        assert_eq!(PIN_MASK.count_ones(), 24);
    }

    #[test]
    fn test_phy_pins_not_sampled() {
        assert_eq!(PhyConfig::DEFAULT.pin_mask() & PIN_MASK, 0);
        assert_eq!(PhyConfig::DEFAULT.pin_dm, 1);
    }
}
