//! The sampling-core loop: sample, encode, frame, push.

use core::future::Future;

use crate::config::REPORT_ENDPOINT;
use crate::device::{ReportEndpoint, UsbDevice};
use crate::frame::Frame;
use crate::publish::PublishCell;
use crate::sampler::{PinBank, Sampler};

/// What happened to the frame of one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Handed to the report endpoint.
    Pushed,
    /// Device handle not published yet.
    NoDevice,
    /// Device present but its report endpoint is not live.
    NotOperational,
}

/// Result of one pipeline cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cycle {
    pub frame: Frame,
    pub outcome: Outcome,
}

/// Drives frames from a pin bank into whichever device the device-owning
/// core publishes.
pub struct Pipeline<B, D: 'static> {
    sampler: Sampler<B>,
    device: &'static PublishCell<D>,
    announced: bool,
}

impl<B: PinBank, D: UsbDevice + 'static> Pipeline<B, D> {
    /// Create a pipeline reading from `bank` and pushing to the device
    /// published in `device`.
    pub fn new(bank: B, device: &'static PublishCell<D>) -> Self {
        Self {
            sampler: Sampler::new(bank),
            device,
            announced: false,
        }
    }

    /// Run one cycle.
    ///
    /// The frame is always assembled, so the cost of a cycle does not depend on
    /// whether the host is listening yet.
    pub fn step(&mut self) -> Cycle {
        let frame = Frame::assemble(self.sampler.sample());

        let Some(device) = self.device.get() else {
            return Cycle {
                frame,
                outcome: Outcome::NoDevice,
            };
        };
        if !self.announced {
            info!("usb device published");
            self.announced = true;
        }

        let outcome = match device.endpoint(REPORT_ENDPOINT) {
            Some(endpoint) => {
                endpoint.push(&frame);
                trace!("pushed {:?}", frame);
                Outcome::Pushed
            }
            None => Outcome::NotOperational,
        };
        Cycle { frame, outcome }
    }

    /// Run the pipeline forever, awaiting `pause()` between cycles.
    pub async fn run<F, Fut>(&mut self, mut pause: F) -> !
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        loop {
            let _ = self.step();
            pause().await;
        }
    }

    /// Get a reference to the sampler.
    pub fn sampler(&self) -> &Sampler<B> {
        &self.sampler
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::device::{DeviceState, DeviceStatus};
    use crate::report::RawInput;
    use core::cell::Cell;
    use embassy_futures::block_on;
    use std::boxed::Box;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Mutex;
    use std::vec::Vec;

    struct MockBank {
        level: Cell<u32>,
    }

    impl PinBank for MockBank {
        fn read_bank(&self) -> u32 {
            self.level.get()
        }
    }

    // Keeps only the latest frame pending, like a real interrupt endpoint.
    struct MockEndpoint {
        pending: Mutex<Option<Frame>>,
        pushes: Mutex<usize>,
    }

    impl MockEndpoint {
        // Simulate a host IN poll.
        fn poll(&self) -> Option<Frame> {
            self.pending.lock().unwrap().take()
        }
    }

    impl ReportEndpoint for MockEndpoint {
        fn push(&self, frame: &Frame) {
            *self.pending.lock().unwrap() = Some(*frame);
            *self.pushes.lock().unwrap() += 1;
        }
    }

    struct MockDevice {
        status: DeviceStatus,
        endpoint: MockEndpoint,
    }

    impl UsbDevice for MockDevice {
        type Endpoint = MockEndpoint;

        fn state(&self) -> DeviceState {
            self.status.get()
        }

        fn endpoint(&self, number: u8) -> Option<&MockEndpoint> {
            (number == REPORT_ENDPOINT && self.status.is_operational()).then_some(&self.endpoint)
        }
    }

    fn leak_device() -> &'static MockDevice {
        Box::leak(Box::new(MockDevice {
            status: DeviceStatus::new(),
            endpoint: MockEndpoint {
                pending: Mutex::new(None),
                pushes: Mutex::new(0),
            },
        }))
    }

    fn make_operational(device: &MockDevice) {
        device.status.on_enabled(true);
        device.status.on_configured(true);
        device.status.endpoint_ready();
    }

    fn pipeline() -> Pipeline<MockBank, MockDevice> {
        let cell: &'static PublishCell<MockDevice> = Box::leak(Box::new(PublishCell::new()));
        Pipeline::new(
            MockBank {
                level: Cell::new(u32::MAX),
            },
            cell,
        )
    }

    #[test]
    fn test_skips_without_device() {
        let mut p = pipeline();
        let cycle = p.step();
        assert_eq!(cycle.outcome, Outcome::NoDevice);
        assert_eq!(cycle.frame, Frame::released());
    }

    #[test]
    fn test_skips_until_operational() {
        let mut p = pipeline();
        let device = leak_device();
        p.device.publish(device).unwrap();

        assert_eq!(p.step().outcome, Outcome::NotOperational);
        device.status.on_enabled(true);
        device.status.on_configured(true);
        assert_eq!(p.step().outcome, Outcome::NotOperational);
        assert_eq!(*device.endpoint.pushes.lock().unwrap(), 0);

        device.status.endpoint_ready();
        assert_eq!(p.step().outcome, Outcome::Pushed);
        assert_eq!(device.endpoint.poll(), Some(Frame::released()));
    }

    #[test]
    fn test_pushes_fresh_sample() {
        let mut p = pipeline();
        let device = leak_device();
        make_operational(device);
        p.device.publish(device).unwrap();

        // GPIO 4 (dpad up) and GPIO 6 (button 1) pressed
        p.sampler().bank().level.set(!((1 << 4) | (1 << 6)));
        let cycle = p.step();
        assert_eq!(cycle.outcome, Outcome::Pushed);
        assert_eq!(cycle.frame, Frame::assemble(RawInput(0b1_0100)));
        assert_eq!(&cycle.frame.as_bytes()[..4], &[0x01, 0x00, 0x00, 0x00]);
        assert_eq!(device.endpoint.poll(), Some(cycle.frame));
    }

    #[test]
    fn test_newer_frame_supersedes_pending() {
        let mut p = pipeline();
        let device = leak_device();
        make_operational(device);
        p.device.publish(device).unwrap();

        let mut frames = Vec::new();
        for level in [u32::MAX, !(1 << 5), !(1 << 7)] {
            p.sampler().bank().level.set(level);
            frames.push(p.step().frame);
        }

        assert_eq!(*device.endpoint.pushes.lock().unwrap(), 3);
        assert_eq!(device.endpoint.poll(), Some(frames[2]));
        assert_eq!(device.endpoint.poll(), None);
    }

    #[test]
    fn test_stops_pushing_after_deconfigure() {
        let mut p = pipeline();
        let device = leak_device();
        make_operational(device);
        p.device.publish(device).unwrap();

        assert_eq!(p.step().outcome, Outcome::Pushed);
        device.status.on_configured(false);
        assert_eq!(p.step().outcome, Outcome::NotOperational);
        assert_eq!(device.state(), DeviceState::Enumerating);
    }

    #[test]
    fn test_keeps_pushing_after_repeated_set_configuration() {
        let mut p = pipeline();
        let device = leak_device();
        make_operational(device);
        p.device.publish(device).unwrap();

        device.status.on_configured(true);
        assert_eq!(p.step().outcome, Outcome::Pushed);
        assert_eq!(device.state(), DeviceState::Operational);
    }

    #[test]
    fn test_resumes_after_reset_and_reconfigure() {
        let mut p = pipeline();
        let device = leak_device();
        make_operational(device);
        p.device.publish(device).unwrap();

        assert!(device.status.on_reset());
        assert_eq!(p.step().outcome, Outcome::NotOperational);

        device.status.on_configured(true);
        device.status.endpoint_ready();
        assert_eq!(p.step().outcome, Outcome::Pushed);
    }

    #[test]
    fn test_run_steps_before_each_pause() {
        let mut p = pipeline();
        let device = leak_device();
        make_operational(device);
        p.device.publish(device).unwrap();

        let mut pushes_at_pause = Vec::new();
        let stopped = catch_unwind(AssertUnwindSafe(|| {
            block_on(p.run(|| {
                pushes_at_pause.push(*device.endpoint.pushes.lock().unwrap());
                if pushes_at_pause.len() == 3 {
                    panic!("stop the sampling loop");
                }
                core::future::ready(())
            }));
        }));

        assert!(stopped.is_err());
        assert_eq!(pushes_at_pause, [1, 2, 3]);
        assert_eq!(device.endpoint.poll(), Some(Frame::released()));
    }
}
