//! Platform-agnostic input pipeline of the zero latency gamepad.
//!
//! This crate contains everything between the GPIO bank and the USB stack
//! that does not depend on the chip, so it can be used both on the RP2040 and
//! on host for testing.
//!
//! # Overview
//!
//! - [`sampler`]: Pin bank trait and active-low normalization ([`Sampler`])
//! - [`hat`]: Dpad to hat switch resolution ([`Hat`], [`HAT_TABLE`])
//! - [`report`]: 4-byte report body encoding ([`encode`], [`RawInput`])
//! - [`crc`]: CRC-16/X-25 table engine ([`Crc16`])
//! - [`frame`]: Body plus CRC trailer ([`Frame`], [`append_crc`])
//! - [`publish`]: One-shot cross-core handle exchange ([`PublishCell`])
//! - [`device`]: USB backend seam and lifecycle ([`UsbDevice`], [`ReportEndpoint`])
//! - [`descriptors`]: USB/HID descriptor tables ([`DescriptorSet`])
//! - [`pipeline`]: The sampling loop ([`Pipeline`])
//!
//! # Wire format
//!
//! ```text
//! [btn0, btn1, btn2, btn3_lo | hat << 4, crc_lo, crc_hi]
//! ```
//!
//! # Example
//!
//! ```
//! use zl_gamepad_core::{Frame, RawInput};
//!
//! let frame = Frame::assemble(RawInput::RELEASED);
//! assert_eq!(frame.as_bytes(), &[0x00, 0x00, 0x00, 0x80, 0xD6, 0x78]);
//! assert!(frame.is_valid());
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod config;
pub mod crc;
pub mod descriptors;
pub mod device;
pub mod frame;
pub mod hat;
pub mod pipeline;
pub mod publish;
pub mod report;
pub mod sampler;

// Re-export main types at crate root
pub use crc::Crc16;
pub use descriptors::{DescriptorError, DescriptorSet, StringDescriptor, HID_REPORT_DESCRIPTOR};
pub use device::{DeviceState, DeviceStatus, ReportEndpoint, UsbDevice};
pub use frame::{append_crc, Frame, FRAME_SIZE};
pub use hat::{DpadCode, Hat, HAT_TABLE};
pub use pipeline::{Cycle, Outcome, Pipeline};
pub use publish::{PublishCell, PublishError};
pub use report::{encode, ButtonBitmap, RawInput, BODY_SIZE};
pub use sampler::{PinBank, Sampler};
