//! Zero latency USB gamepad for RP2040.
//!
//! # Overview
//!
//! The firmware splits the work across the two Cortex-M0+ cores:
//!
//! - **Core 1** owns the USB device: it builds the descriptors, brings up the
//!   USB stack, publishes the device handle and then serves host polls
//!   forever.
//! - **Core 0** samples the buttons every [`SAMPLE_PERIOD_US`] µs, encodes a
//!   6-byte frame (report body + CRC-16) and pushes it into the report
//!   endpoint once the device is operational.
//!
//! The cores share exactly two things: the one-shot device handle
//! ([`PublishCell`]) and the endpoint's single pending-frame slot.
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | USB D+/D- | 0, 1 | Reserved, never sampled |
//! | Dpad     | 2-5  | Left, right, up, down (active low, pull-up) |
//! | Buttons  | 6-22, 26-28 | Buttons 1-17, 21-23 (active low, pull-up) |
//!
//! # Modules
//!
//! - [`gpio`]: Single-access GPIO bank ([`GpioBank`])
//! - [`usb_device`]: `embassy-usb` backend ([`GamepadDevice`], [`initialize`], [`serve_reports`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//!
//! [`SAMPLE_PERIOD_US`]: zl_gamepad_core::config::SAMPLE_PERIOD_US
//! [`PublishCell`]: zl_gamepad_core::PublishCell

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features");

// Re-export core types for convenience
pub use zl_gamepad_core::{
    config, DescriptorSet, DeviceState, Frame, Pipeline, PublishCell, RawInput, UsbDevice,
};

pub mod gpio;
pub mod usb_device;

pub use gpio::{GpioBank, MONITORED_PINS};
pub use usb_device::{initialize, serve_reports, GamepadDevice, HidEndpoint, ReportWriter, UsbStack};
