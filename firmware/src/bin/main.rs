#![no_std]
#![no_main]

use defmt::{error, info};
use defmt_rtt as _;
use embassy_executor::{Executor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_rp::Peri;
use embassy_time::Timer;
use static_cell::StaticCell;
use zero_latency_gamepad::config::{PhyConfig, SAMPLE_PERIOD_US};
use zero_latency_gamepad::{
    initialize, serve_reports, DescriptorSet, GamepadDevice, GpioBank, Pipeline, PublishCell,
    UsbStack,
};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

static mut CORE1_STACK: Stack<4096> = Stack::new();
static EXECUTOR0: StaticCell<Executor> = StaticCell::new();
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();

/// Device handle, published by core 1 once the USB device is built.
static DEVICE_HANDLE: PublishCell<GamepadDevice> = PublishCell::new();

#[cortex_m_rt::entry]
fn main() -> ! {
    info!("Zero Latency Gamepad starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let usb = p.USB;
    spawn_core1(
        p.CORE1,
        unsafe { &mut *core::ptr::addr_of_mut!(CORE1_STACK) },
        move || {
            let executor1 = EXECUTOR1.init(Executor::new());
            executor1.run(|spawner| spawner.spawn(device_task(spawner, usb).unwrap()));
        },
    );

    // --- GPIO Setup ---
    let bank = GpioBank::new([
        p.PIN_2.into(),
        p.PIN_3.into(),
        p.PIN_4.into(),
        p.PIN_5.into(),
        p.PIN_6.into(),
        p.PIN_7.into(),
        p.PIN_8.into(),
        p.PIN_9.into(),
        p.PIN_10.into(),
        p.PIN_11.into(),
        p.PIN_12.into(),
        p.PIN_13.into(),
        p.PIN_14.into(),
        p.PIN_15.into(),
        p.PIN_16.into(),
        p.PIN_17.into(),
        p.PIN_18.into(),
        p.PIN_19.into(),
        p.PIN_20.into(),
        p.PIN_21.into(),
        p.PIN_22.into(),
        p.PIN_26.into(),
        p.PIN_27.into(),
        p.PIN_28.into(),
    ]);

    let executor0 = EXECUTOR0.init(Executor::new());
    executor0.run(|spawner| spawner.spawn(sampling_task(bank).unwrap()));
}

/// Core 1: bring up the USB device, publish it, then serve the report endpoint.
#[embassy_executor::task]
async fn device_task(spawner: Spawner, usb: Peri<'static, USB>) {
    // Let the supply and the pull-ups settle before attaching
    Timer::after_millis(10).await;

    let driver = Driver::new(usb, Irqs);
    let (device, stack, writer) = initialize(driver, &DescriptorSet::GAMEPAD, PhyConfig::DEFAULT);

    if let Err(e) = DEVICE_HANDLE.publish(device) {
        error!("device handle: {:?}", e);
    }
    info!("USB device initialized, waiting for host...");

    spawner.spawn(usb_task(stack).unwrap());
    serve_reports(writer, device).await
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut stack: UsbStack) {
    stack.run().await;
}

/// Core 0: sample, frame and push forever.
#[embassy_executor::task]
async fn sampling_task(bank: GpioBank<'static>) {
    let mut pipeline = Pipeline::new(bank, &DEVICE_HANDLE);
    pipeline
        .run(|| Timer::after_micros(SAMPLE_PERIOD_US))
        .await
}
