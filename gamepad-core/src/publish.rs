//! One-shot handle exchange between cores.

use core::ptr;
use portable_atomic::{AtomicPtr, Ordering};

/// Error returned by [`PublishCell::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishError {
    /// A value was already published; the cell keeps the first one.
    AlreadyPublished,
}

/// A cell that goes from empty to holding a `&'static T` exactly once.
///
/// The writer publishes with release ordering and readers load with acquire
/// ordering, so a reader that sees the reference also sees everything the
/// writer did to the value before publishing it. Once set, the cell never
/// changes again.
pub struct PublishCell<T: 'static> {
    ptr: AtomicPtr<T>,
}

impl<T: Sync + 'static> PublishCell<T> {
    /// Create an empty cell.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Publish `value`. Only the first call succeeds.
    pub fn publish(&self, value: &'static T) -> Result<(), PublishError> {
        let new = value as *const T as *mut T;
        self.ptr
            .compare_exchange(ptr::null_mut(), new, Ordering::Release, Ordering::Relaxed)
            .map(|_| ())
            .map_err(|_| PublishError::AlreadyPublished)
    }

    /// The published value, if any.
    #[inline]
    pub fn get(&self) -> Option<&'static T> {
        let ptr = self.ptr.load(Ordering::Acquire);
        // SAFETY: the only non-null pointer ever stored comes from a
        // `&'static T` in `publish` and is never replaced, and `T: Sync`
        // makes sharing it with other cores sound.
        unsafe { ptr.cast_const().as_ref() }
    }

    /// Whether a value has been published.
    #[inline]
    pub fn is_published(&self) -> bool {
        self.get().is_some()
    }
}

impl<T: Sync + 'static> Default for PublishCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::boxed::Box;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;
    use std::vec::Vec;

    struct Device {
        id: u32,
    }

    fn leak(id: u32) -> &'static Device {
        Box::leak(Box::new(Device { id }))
    }

    #[test]
    fn test_starts_absent() {
        let cell: PublishCell<Device> = PublishCell::new();
        assert!(cell.get().is_none());
        assert!(!cell.is_published());
    }

    #[test]
    fn test_publish_once() {
        let cell = PublishCell::new();
        assert_eq!(cell.publish(leak(1)), Ok(()));
        assert_eq!(cell.get().map(|d| d.id), Some(1));
    }

    #[test]
    fn test_second_publish_rejected() {
        let cell = PublishCell::new();
        let first = leak(1);
        cell.publish(first).unwrap();
        assert_eq!(cell.publish(leak(2)), Err(PublishError::AlreadyPublished));
        assert!(ptr::eq(cell.get().unwrap(), first));
    }

    #[test]
    fn test_concurrent_publishers_one_wins() {
        static CELL: PublishCell<Device> = PublishCell::new();

        let handles: Vec<_> = (0..8)
            .map(|id| thread::spawn(move || CELL.publish(leak(id)).is_ok()))
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(wins, 1);
        assert!(CELL.is_published());
    }

    #[test]
    fn test_reader_never_reverts_to_absent() {
        static CELL: PublishCell<Device> = PublishCell::new();
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let done = done.clone();
            thread::spawn(move || {
                let mut seen: Option<u32> = None;
                let mut transitions = 0;
                while !done.load(Ordering::Acquire) {
                    let now = CELL.get().map(|d| d.id);
                    match (seen, now) {
                        (None, Some(_)) => transitions += 1,
                        (Some(_), None) => panic!("handle reverted to absent"),
                        (Some(a), Some(b)) => assert_eq!(a, b),
                        (None, None) => {}
                    }
                    seen = now;
                }
                (seen, transitions)
            })
        };

        thread::sleep(std::time::Duration::from_millis(5));
        CELL.publish(leak(7)).unwrap();
        thread::sleep(std::time::Duration::from_millis(5));
        done.store(true, Ordering::Release);

        let (seen, transitions) = reader.join().unwrap();
        assert_eq!(seen, Some(7));
        assert_eq!(transitions, 1);
    }

    #[test]
    fn test_published_value_fully_visible() {
        static CELL: PublishCell<[u32; 64]> = PublishCell::new();

        let reader = thread::spawn(|| loop {
            if let Some(values) = CELL.get() {
                return values.iter().all(|&v| v == 0xDEAD_BEEF);
            }
            std::hint::spin_loop();
        });

        let values: &'static [u32; 64] = Box::leak(Box::new([0xDEAD_BEEF; 64]));
        CELL.publish(values).unwrap();
        assert!(reader.join().unwrap());
    }
}
