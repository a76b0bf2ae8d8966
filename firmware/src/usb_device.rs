//! USB HID gamepad device on top of `embassy-usb`.
//!
//! [`initialize`] builds the device from a [`DescriptorSet`] and returns the
//! three parts the device-owning core needs: the shared [`GamepadDevice`]
//! handle (to publish to the sampling core), the USB stack to run, and the
//! report endpoint that [`serve_reports`] drains the pending frame into.
//!
//! The HID interface is written from the descriptor tables field by field,
//! and the report and HID class descriptors are served from them as well.

use defmt::{debug, info, warn};
use embassy_futures::select::{select, Either};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_usb::control::{InResponse, OutResponse, Recipient, Request, RequestType};
use embassy_usb::driver::{Endpoint as _, EndpointAddress, EndpointError, EndpointIn as _};
use embassy_usb::{Builder, Config as UsbConfig, Handler};
use static_cell::StaticCell;
use zl_gamepad_core::config::{PhyConfig, REPORT_ENDPOINT};
use zl_gamepad_core::descriptors::{kind, HID_LEN};
use zl_gamepad_core::{DescriptorSet, DeviceState, DeviceStatus, Frame, ReportEndpoint, UsbDevice};

/// USB driver of the device-owning core.
pub type UsbDriver = Driver<'static, USB>;

/// The running USB stack.
pub type UsbStack = embassy_usb::UsbDevice<'static, UsbDriver>;

/// Interrupt IN endpoint carrying report frames.
pub type ReportWriter = <UsbDriver as embassy_usb::driver::Driver<'static>>::EndpointIn;

/// HID class request codes.
mod hid_request {
    pub const GET_IDLE: u8 = 0x02;
    pub const GET_PROTOCOL: u8 = 0x03;
    pub const SET_IDLE: u8 = 0x0A;
    pub const SET_PROTOCOL: u8 = 0x0B;
}

/// Report protocol, the only one a non-boot interface speaks.
const REPORT_PROTOCOL: u8 = 1;

static DEVICE: StaticCell<GamepadDevice> = StaticCell::new();
static HANDLER: StaticCell<DeviceHandler> = StaticCell::new();

/// USB device configuration buffers.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// The interrupt IN endpoint carrying report frames.
///
/// Holds at most one pending frame. A push before the host polled replaces it.
pub struct HidEndpoint {
    pending: Signal<CriticalSectionRawMutex, Frame>,
}

impl HidEndpoint {
    const fn new() -> Self {
        Self {
            pending: Signal::new(),
        }
    }
}

impl ReportEndpoint for HidEndpoint {
    #[inline]
    fn push(&self, frame: &Frame) {
        self.pending.signal(*frame);
    }
}

/// Shared handle of the initialized gamepad device.
pub struct GamepadDevice {
    status: DeviceStatus,
    endpoint: HidEndpoint,
    /// Raised on every bus event, so the endpoint pump re-checks the state.
    bus_event: Signal<CriticalSectionRawMutex, ()>,
}

impl GamepadDevice {
    const fn new() -> Self {
        Self {
            status: DeviceStatus::new(),
            endpoint: HidEndpoint::new(),
            bus_event: Signal::new(),
        }
    }
}

impl UsbDevice for GamepadDevice {
    type Endpoint = HidEndpoint;

    fn state(&self) -> DeviceState {
        self.status.get()
    }

    fn endpoint(&self, number: u8) -> Option<&HidEndpoint> {
        (number == REPORT_ENDPOINT && self.status.is_operational()).then_some(&self.endpoint)
    }
}

/// Mirrors bus events into the device state and answers the HID interface's
/// control requests.
struct DeviceHandler {
    device: &'static GamepadDevice,
    interface: u8,
    hid_class: [u8; HID_LEN],
    hid_report: &'static [u8],
    idle: u8,
}

impl DeviceHandler {
    fn bus_event(&self, out_of_service: bool) {
        if out_of_service {
            warn!("report endpoint out of service");
        }
        self.device.bus_event.signal(());
    }

    fn for_interface(&self, req: &Request) -> bool {
        matches!(req.recipient, Recipient::Interface) && req.index == u16::from(self.interface)
    }
}

impl Handler for DeviceHandler {
    fn enabled(&mut self, enabled: bool) {
        let lost = self.device.status.on_enabled(enabled);
        self.bus_event(lost);
    }

    fn reset(&mut self) {
        let lost = self.device.status.on_reset();
        self.bus_event(lost);
    }

    fn addressed(&mut self, addr: u8) {
        debug!("usb address {}", addr);
    }

    fn configured(&mut self, configured: bool) {
        let lost = self.device.status.on_configured(configured);
        self.bus_event(lost);
    }

    fn control_out(&mut self, req: Request, _data: &[u8]) -> Option<OutResponse> {
        if !self.for_interface(&req) || !matches!(req.request_type, RequestType::Class) {
            return None;
        }
        match req.request {
            hid_request::SET_IDLE => {
                self.idle = (req.value >> 8) as u8;
                Some(OutResponse::Accepted)
            }
            hid_request::SET_PROTOCOL if req.value == u16::from(REPORT_PROTOCOL) => {
                Some(OutResponse::Accepted)
            }
            _ => Some(OutResponse::Rejected),
        }
    }

    fn control_in<'a>(&'a mut self, req: Request, buf: &'a mut [u8]) -> Option<InResponse<'a>> {
        if !self.for_interface(&req) {
            return None;
        }
        match req.request_type {
            RequestType::Standard if req.request == Request::GET_DESCRIPTOR => {
                match (req.value >> 8) as u8 {
                    kind::HID_REPORT => Some(InResponse::Accepted(self.hid_report)),
                    kind::HID => Some(InResponse::Accepted(&self.hid_class)),
                    _ => Some(InResponse::Rejected),
                }
            }
            RequestType::Class => match req.request {
                hid_request::GET_IDLE => {
                    buf[0] = self.idle;
                    Some(InResponse::Accepted(&buf[..1]))
                }
                hid_request::GET_PROTOCOL => {
                    buf[0] = REPORT_PROTOCOL;
                    Some(InResponse::Accepted(&buf[..1]))
                }
                _ => Some(InResponse::Rejected),
            },
            _ => None,
        }
    }
}

/// Build the USB device from `descriptors`.
///
/// Must be called once, on the core that will run the USB stack.
///
/// `phy` names the pins carrying D+/D-. They are excluded from sampling; the
/// native RP2040 PHY uses its dedicated pads, so the driver does not consume
/// them.
pub fn initialize(
    driver: UsbDriver,
    descriptors: &'static DescriptorSet,
    phy: PhyConfig,
) -> (&'static GamepadDevice, UsbStack, ReportWriter) {
    info!("usb phy D+ GPIO{} D- GPIO{}", phy.pin_dp, phy.pin_dm);

    let dev = &descriptors.device;
    let cfg = &descriptors.configuration;
    debug!("device descriptor {:02x}", dev.to_bytes());
    debug!("configuration descriptor {:02x}", cfg.to_bytes());

    // Fields the stack writes with fixed values
    defmt::assert_eq!(dev.num_configurations, 1);
    defmt::assert_eq!(dev.manufacturer_index, 1);
    defmt::assert_eq!(dev.product_index, 2);
    defmt::assert_eq!(dev.serial_number_index, 0);
    defmt::assert_eq!(cfg.configuration_value, 1);
    defmt::assert_eq!(descriptors.language_id, 0x0409);
    defmt::assert!(cfg.is_interrupt_in());
    defmt::assert_eq!(usize::from(cfg.report_descriptor_len), descriptors.hid_report.len());

    let mut usb_config = UsbConfig::new(dev.vendor_id, dev.product_id);
    usb_config.manufacturer = descriptors.string_text(dev.manufacturer_index);
    usb_config.product = descriptors.string_text(dev.product_index);
    usb_config.serial_number = None;
    usb_config.device_release = dev.device_release;
    usb_config.device_class = dev.device_class;
    usb_config.device_sub_class = dev.device_sub_class;
    usb_config.device_protocol = dev.device_protocol;
    usb_config.composite_with_iads = false;
    usb_config.self_powered = cfg.self_powered();
    usb_config.supports_remote_wakeup = cfg.remote_wakeup();
    usb_config.max_power = cfg.max_power_ma;
    usb_config.max_packet_size_0 = dev.max_packet_size_0;

    let mut builder = Builder::new(
        driver,
        usb_config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        MSOS_DESCRIPTOR.init([0; 256]),
        CONTROL_BUF.init([0; 64]),
    );

    let hid_class = cfg.hid_class_descriptor();
    let mut function = builder.function(cfg.interface_class, 0, 0);
    let mut interface = function.interface();
    let interface_number = u8::from(interface.interface_number());
    let mut alt = interface.alt_setting(cfg.interface_class, 0, 0, None);
    alt.descriptor(kind::HID, &hid_class[2..]);
    let writer = alt.endpoint_interrupt_in(
        Some(EndpointAddress::from(cfg.endpoint_address)),
        cfg.endpoint_max_packet_size,
        cfg.endpoint_interval,
    );
    drop(function);

    let device: &'static GamepadDevice = DEVICE.init(GamepadDevice::new());
    builder.handler(HANDLER.init(DeviceHandler {
        device,
        interface: interface_number,
        hid_class,
        hid_report: descriptors.hid_report,
        idle: 0,
    }));

    let usb = builder.build();
    device.status.on_enabled(true);

    (device, usb, writer)
}

/// Serve host polls from the endpoint's pending frame. Never returns.
///
/// Each frame taken from the pending slot is written once; frames pushed
/// while a write waits for the host poll supersede each other. A bus event
/// that takes the device out of the operational state sends the pump back to
/// waiting for the endpoint.
pub async fn serve_reports(mut writer: ReportWriter, device: &'static GamepadDevice) -> ! {
    loop {
        writer.wait_enabled().await;
        device.status.endpoint_ready();
        if !device.status.is_operational() {
            device.bus_event.wait().await;
            continue;
        }
        info!("report endpoint ready");

        loop {
            match select(device.endpoint.pending.wait(), device.bus_event.wait()).await {
                Either::First(frame) => match writer.write(frame.as_bytes()).await {
                    Ok(()) => {}
                    Err(EndpointError::Disabled) => {
                        warn!("report endpoint disabled");
                        break;
                    }
                    Err(e) => warn!("report write failed: {:?}", e),
                },
                Either::Second(()) if device.status.is_operational() => {}
                Either::Second(()) => break,
            }
        }
    }
}
