//! Seam between the input pipeline and the USB device backend.
//!
//! The backend owns enumeration and host-poll handling. The pipeline only
//! needs to find the report endpoint and drop frames into it.

use crate::frame::Frame;
use portable_atomic::{AtomicU8, Ordering};

/// Lifecycle of the emulated USB device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DeviceState {
    /// Not initialized yet.
    Uninitialized = 0,
    /// Attached, waiting for the host to address and configure it.
    Enumerating = 1,
    /// Host selected the configuration, endpoint not yet serving reports.
    Configured = 2,
    /// Report endpoint is live.
    Operational = 3,
}

impl DeviceState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Enumerating,
            2 => Self::Configured,
            3 => Self::Operational,
            _ => Self::Uninitialized,
        }
    }
}

/// Device state shared between the protocol task and the sampling core.
pub struct DeviceStatus {
    state: AtomicU8,
}

impl DeviceStatus {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(DeviceState::Uninitialized as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> DeviceState {
        DeviceState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Record a new state, returning the previous one.
    pub fn set(&self, state: DeviceState) -> DeviceState {
        let prev = DeviceState::from_u8(self.state.swap(state as u8, Ordering::AcqRel));
        if prev != state {
            debug!("usb device state {:?} -> {:?}", prev, state);
        }
        prev
    }

    /// Bus enabled (`true`) or disabled (`false`).
    ///
    /// Returns `true` if this took the report endpoint out of service.
    pub fn on_enabled(&self, enabled: bool) -> bool {
        self.fall_back(if enabled {
            DeviceState::Enumerating
        } else {
            DeviceState::Uninitialized
        })
    }

    /// Bus reset by the host.
    ///
    /// Returns `true` if this took the report endpoint out of service.
    pub fn on_reset(&self) -> bool {
        self.fall_back(DeviceState::Enumerating)
    }

    /// Host set (`true`) or cleared (`false`) the configuration.
    ///
    /// Setting the configuration again while already configured leaves the
    /// state alone. Returns `true` if this took the report endpoint out of
    /// service.
    pub fn on_configured(&self, configured: bool) -> bool {
        if !configured {
            return self.fall_back(DeviceState::Enumerating);
        }
        let _ = self.advance(DeviceState::Enumerating, DeviceState::Configured);
        false
    }

    /// Report endpoint enabled. Ignored unless the device is configured.
    pub fn endpoint_ready(&self) {
        let _ = self.advance(DeviceState::Configured, DeviceState::Operational);
    }

    fn advance(&self, from: DeviceState, to: DeviceState) -> bool {
        let moved = self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if moved {
            debug!("usb device state {:?} -> {:?}", from, to);
        }
        moved
    }

    fn fall_back(&self, state: DeviceState) -> bool {
        self.set(state) == DeviceState::Operational
    }

    #[inline]
    pub fn is_operational(&self) -> bool {
        self.get() == DeviceState::Operational
    }
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// An interrupt IN endpoint accepting report frames.
pub trait ReportEndpoint {
    /// Hand a frame to the endpoint.
    ///
    /// Never blocks. At most one frame is pending: if the host has not polled
    /// since the last push, `frame` replaces the pending one.
    fn push(&self, frame: &Frame);
}

impl<E: ReportEndpoint + ?Sized> ReportEndpoint for &E {
    fn push(&self, frame: &Frame) {
        (**self).push(frame)
    }
}

/// An initialized USB device, as seen from the sampling core.
pub trait UsbDevice: Sync {
    type Endpoint: ReportEndpoint;

    /// Current lifecycle state.
    fn state(&self) -> DeviceState;

    /// Look up an IN endpoint by number.
    ///
    /// Returns `None` for unknown endpoints and while the device is not
    /// [`DeviceState::Operational`].
    fn endpoint(&self, number: u8) -> Option<&Self::Endpoint>;
}
