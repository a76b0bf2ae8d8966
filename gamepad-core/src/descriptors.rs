//! USB descriptors of the gamepad.
//!
//! These must stay bit-exact: hosts cache them per VID/PID, and the report
//! descriptor is what gives the 4-byte report body its meaning.

use crate::config;
use heapless::Vec;

/// Descriptor type codes.
pub mod kind {
    pub const DEVICE: u8 = 0x01;
    pub const CONFIGURATION: u8 = 0x02;
    pub const STRING: u8 = 0x03;
    pub const INTERFACE: u8 = 0x04;
    pub const ENDPOINT: u8 = 0x05;
    pub const HID: u8 = 0x21;
    pub const HID_REPORT: u8 = 0x22;
}

/// Length of the HID class descriptor.
pub const HID_LEN: usize = 9;

/// Endpoint bmAttributes transfer type of an interrupt endpoint.
pub const TRANSFER_INTERRUPT: u8 = 0x03;

/// HID report descriptor: 28 buttons followed by a 4-bit hat switch with a
/// null state.
pub const HID_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Game Pad)
    0xA1, 0x01, // Collection (Application)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x35, 0x00, //   Physical Minimum (0)
    0x45, 0x01, //   Physical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x1C, //   Report Count (28)
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x1C, //   Usage Maximum (Button 28)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Hat switch ---
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x25, 0x07, //   Logical Maximum (7)
    0x46, 0x3B, 0x01, //   Physical Maximum (315)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x65, 0x14, //   Unit (English Rotation, Degrees)
    0x09, 0x39, //   Usage (Hat switch)
    0x81, 0x42, //   Input (Data, Variable, Absolute, Null State)
    //
    0xC0, // End Collection
];

/// Device descriptor fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// bcdUSB.
    pub usb_version: u16,
    pub device_class: u8,
    pub device_sub_class: u8,
    pub device_protocol: u8,
    pub max_packet_size_0: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    /// bcdDevice.
    pub device_release: u16,
    pub manufacturer_index: u8,
    pub product_index: u8,
    pub serial_number_index: u8,
    pub num_configurations: u8,
}

impl DeviceDescriptor {
    pub const LEN: usize = 18;

    #[must_use]
    pub const fn to_bytes(&self) -> [u8; Self::LEN] {
        let usb = self.usb_version.to_le_bytes();
        let vid = self.vendor_id.to_le_bytes();
        let pid = self.product_id.to_le_bytes();
        let rel = self.device_release.to_le_bytes();
        [
            Self::LEN as u8,
            kind::DEVICE,
            usb[0],
            usb[1],
            self.device_class,
            self.device_sub_class,
            self.device_protocol,
            self.max_packet_size_0,
            vid[0],
            vid[1],
            pid[0],
            pid[1],
            rel[0],
            rel[1],
            self.manufacturer_index,
            self.product_index,
            self.serial_number_index,
            self.num_configurations,
        ]
    }
}

/// Configuration descriptor with its single HID interface, HID class
/// descriptor and interrupt IN endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigurationDescriptor {
    pub configuration_value: u8,
    /// bmAttributes (bit 7 must be set).
    pub attributes: u8,
    pub max_power_ma: u16,
    pub interface_class: u8,
    /// bcdHID.
    pub hid_version: u16,
    pub country_code: u8,
    pub report_descriptor_len: u16,
    pub endpoint_address: u8,
    /// Endpoint bmAttributes (transfer type).
    pub endpoint_attributes: u8,
    pub endpoint_max_packet_size: u16,
    pub endpoint_interval: u8,
}

impl ConfigurationDescriptor {
    /// wTotalLength: configuration + interface + HID + endpoint.
    pub const LEN: usize = 9 + 9 + HID_LEN + 7;

    /// bmAttributes bit: device has its own power source.
    pub const SELF_POWERED: u8 = 1 << 6;
    /// bmAttributes bit: device may signal remote wakeup.
    pub const REMOTE_WAKEUP: u8 = 1 << 5;

    #[must_use]
    pub const fn self_powered(&self) -> bool {
        self.attributes & Self::SELF_POWERED != 0
    }

    #[must_use]
    pub const fn remote_wakeup(&self) -> bool {
        self.attributes & Self::REMOTE_WAKEUP != 0
    }

    /// Whether the report endpoint is an interrupt IN endpoint.
    #[must_use]
    pub const fn is_interrupt_in(&self) -> bool {
        self.endpoint_address & 0x80 != 0 && self.endpoint_attributes & 0x03 == TRANSFER_INTERRUPT
    }

    /// HID class descriptor, as embedded in the configuration and as returned
    /// for a `GET_DESCRIPTOR(HID)` request on the interface.
    #[must_use]
    pub const fn hid_class_descriptor(&self) -> [u8; HID_LEN] {
        let hid = self.hid_version.to_le_bytes();
        let report_len = self.report_descriptor_len.to_le_bytes();
        [
            HID_LEN as u8,
            kind::HID,
            hid[0],
            hid[1],
            self.country_code,
            1, // bNumDescriptors
            kind::HID_REPORT,
            report_len[0],
            report_len[1],
        ]
    }

    #[must_use]
    pub const fn to_bytes(&self) -> [u8; Self::LEN] {
        let total = (Self::LEN as u16).to_le_bytes();
        let hid = self.hid_class_descriptor();
        let packet = self.endpoint_max_packet_size.to_le_bytes();
        [
            // Configuration
            9,
            kind::CONFIGURATION,
            total[0],
            total[1],
            1, // bNumInterfaces
            self.configuration_value,
            0, // iConfiguration
            self.attributes,
            (self.max_power_ma / 2) as u8,
            // Interface
            9,
            kind::INTERFACE,
            0, // bInterfaceNumber
            0, // bAlternateSetting
            1, // bNumEndpoints
            self.interface_class,
            0, // no boot subclass
            0, // no boot protocol
            0, // iInterface
            // HID
            hid[0],
            hid[1],
            hid[2],
            hid[3],
            hid[4],
            hid[5],
            hid[6],
            hid[7],
            hid[8],
            // Endpoint
            7,
            kind::ENDPOINT,
            self.endpoint_address,
            self.endpoint_attributes,
            packet[0],
            packet[1],
            self.endpoint_interval,
        ]
    }
}

/// Longest string, in characters, a string descriptor carries.
pub const MAX_STRING_CHARS: usize = 31;

/// Encoded string descriptor: `[bLength, 0x03, UTF-16LE...]`.
pub type StringDescriptor = Vec<u8, { 2 + 2 * MAX_STRING_CHARS }>;

/// Error type for descriptor encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorError {
    /// Output buffer cannot hold the encoded descriptor.
    BufferTooSmall,
}

/// Encode `s` as a string descriptor into `buf`, returning the length used.
///
/// Strings longer than [`MAX_STRING_CHARS`] UTF-16 units are truncated.
pub fn encode_string_descriptor(s: &str, buf: &mut [u8]) -> Result<usize, DescriptorError> {
    let units = s.encode_utf16().take(MAX_STRING_CHARS);
    let len = 2 + 2 * units.clone().count();
    if buf.len() < len {
        return Err(DescriptorError::BufferTooSmall);
    }

    buf[0] = len as u8;
    buf[1] = kind::STRING;
    for (chunk, unit) in buf[2..len].chunks_exact_mut(2).zip(units) {
        chunk.copy_from_slice(&unit.to_le_bytes());
    }
    Ok(len)
}

/// Encode `s` as a string descriptor.
#[must_use]
pub fn string_descriptor(s: &str) -> StringDescriptor {
    let mut buf = [0u8; 2 + 2 * MAX_STRING_CHARS];
    let len = encode_string_descriptor(s, &mut buf).unwrap_or(0);
    // `len` never exceeds the capacity.
    Vec::from_slice(&buf[..len]).unwrap_or_default()
}

/// String descriptor 0: the supported language IDs.
#[must_use]
pub const fn language_descriptor(language_id: u16) -> [u8; 4] {
    let id = language_id.to_le_bytes();
    [4, kind::STRING, id[0], id[1]]
}

/// Everything the device backend needs to enumerate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DescriptorSet {
    pub device: DeviceDescriptor,
    pub configuration: ConfigurationDescriptor,
    pub hid_report: &'static [u8],
    pub language_id: u16,
    pub manufacturer: &'static str,
    pub product: &'static str,
}

impl DescriptorSet {
    /// The zero latency gamepad.
    pub const GAMEPAD: Self = Self {
        device: DeviceDescriptor {
            usb_version: 0x0110,
            device_class: 0x00, // per interface
            device_sub_class: 0x00,
            device_protocol: 0x00,
            max_packet_size_0: config::MAX_PACKET_SIZE as u8,
            vendor_id: config::USB_VID,
            product_id: config::USB_PID,
            device_release: 0x0100,
            manufacturer_index: 1,
            product_index: 2,
            serial_number_index: 0,
            num_configurations: 1,
        },
        configuration: ConfigurationDescriptor {
            configuration_value: 1,
            attributes: 0x80, // bus powered
            max_power_ma: config::MAX_POWER_MA,
            interface_class: 0x03, // HID
            hid_version: 0x0111,
            country_code: 0,
            report_descriptor_len: HID_REPORT_DESCRIPTOR.len() as u16,
            endpoint_address: 0x80 | config::REPORT_ENDPOINT,
            endpoint_attributes: TRANSFER_INTERRUPT,
            endpoint_max_packet_size: config::MAX_PACKET_SIZE,
            endpoint_interval: config::POLL_INTERVAL,
        },
        hid_report: HID_REPORT_DESCRIPTOR,
        language_id: config::LANGUAGE_ID,
        manufacturer: config::MANUFACTURER,
        product: config::PRODUCT,
    };

    /// String descriptor by index: 0 language, then the device's
    /// manufacturer and product strings.
    #[must_use]
    pub fn string(&self, index: u8) -> Option<StringDescriptor> {
        match index {
            0 => Vec::from_slice(&language_descriptor(self.language_id)).ok(),
            _ => self.string_text(index).map(string_descriptor),
        }
    }

    /// Text of a string descriptor index, cut to what the descriptor carries.
    #[must_use]
    pub fn string_text(&self, index: u8) -> Option<&'static str> {
        let text = match index {
            0 => return None,
            i if i == self.device.manufacturer_index => self.manufacturer,
            i if i == self.device.product_index => self.product,
            _ => return None,
        };
        Some(truncate(text))
    }
}

/// Longest prefix of `s` that fits in [`MAX_STRING_CHARS`] UTF-16 units.
fn truncate(s: &str) -> &str {
    let mut units = 0;
    for (at, c) in s.char_indices() {
        units += c.len_utf16();
        if units > MAX_STRING_CHARS {
            return &s[..at];
        }
    }
    s
}
