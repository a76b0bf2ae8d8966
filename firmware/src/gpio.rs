//! GPIO bank sampling on the RP2040.

use embassy_rp::gpio::{AnyPin, Input, Pin, Pull};
use embassy_rp::{pac, Peri};
use zl_gamepad_core::config::PIN_MASK;
use zl_gamepad_core::PinBank;

/// Number of monitored lines.
pub const MONITORED_PINS: usize = PIN_MASK.count_ones() as usize;

/// The monitored GPIO lines, configured as pull-up inputs.
///
/// Holding the [`Input`] drivers keeps the pads configured; the levels are
/// read in a single access to `SIO.GPIO_IN` so all lines come from the same
/// instant.
pub struct GpioBank<'d> {
    _inputs: [Input<'d>; MONITORED_PINS],
}

impl<'d> GpioBank<'d> {
    /// Configure `pins` as pull-up inputs.
    ///
    /// # Panics
    ///
    /// If `pins` is not exactly the set described by [`PIN_MASK`].
    #[must_use]
    pub fn new(pins: [Peri<'d, AnyPin>; MONITORED_PINS]) -> Self {
        let mask = pins.iter().fold(0u32, |mask, pin| mask | 1 << pin.pin());
        defmt::assert_eq!(mask, PIN_MASK, "pin list does not match PIN_MASK");

        Self {
            _inputs: pins.map(|pin| Input::new(pin, Pull::Up)),
        }
    }
}

impl PinBank for GpioBank<'_> {
    #[inline]
    fn read_bank(&self) -> u32 {
        pac::SIO.gpio_in(0).read()
    }
}
