//! Pin sampling.

use crate::config::{PIN_MASK, PIN_SHIFT};
use crate::report::RawInput;

/// A GPIO bank that can be read in one access.
///
/// Implementations return the electrical level of every line, bit `n` for
/// GPIO `n`. Lines are pulled up, so a pressed switch reads 0.
pub trait PinBank {
    fn read_bank(&self) -> u32;
}

impl<B: PinBank + ?Sized> PinBank for &B {
    fn read_bank(&self) -> u32 {
        (**self).read_bank()
    }
}

/// Turn a bank level snapshot into a [`RawInput`].
///
/// Inverts (pressed = 1), masks to the monitored pins and shifts the first
/// monitored pin to bit 0.
#[inline]
#[must_use]
pub const fn normalize(level: u32) -> RawInput {
    RawInput((!level & PIN_MASK) >> PIN_SHIFT)
}

/// Samples the monitored pins of a [`PinBank`].
pub struct Sampler<B> {
    bank: B,
}

impl<B: PinBank> Sampler<B> {
    /// Create a sampler over an already configured bank.
    pub fn new(bank: B) -> Self {
        Self { bank }
    }

    /// Read every monitored pin at once.
    #[inline]
    pub fn sample(&self) -> RawInput {
        normalize(self.bank.read_bank())
    }

    /// Get a reference to the underlying bank.
    pub fn bank(&self) -> &B {
        &self.bank
    }
}
