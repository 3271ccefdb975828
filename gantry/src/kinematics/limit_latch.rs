use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use embedded_hal::digital::PinState;
use heapless::Deque;
use log::warn;

use crate::{LimitEvent, LimitSwitch};

/// Maximum number of limit events held between two services.
pub const EVENT_CAPACITY: usize = 8;

struct Shared {
    stop: AtomicBool,
    events: Mutex<Deque<LimitEvent, EVENT_CAPACITY>>,
}

/// Stop flag and event queue shared between the stepping loop and the
/// limit-switch interrupt callbacks.
///
/// The stepping loop polls [LimitLatch::is_raised] before every pulse. The
/// interrupt side only ever goes through a [LimitHandle].
pub(crate) struct LimitLatch {
    shared: Arc<Shared>,
}
impl LimitLatch {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                stop: AtomicBool::new(false),
                events: Mutex::new(Deque::new()),
            }),
        }
    }

    /// Returns a handle for interrupt callbacks.
    pub fn handle(&self) -> LimitHandle {
        LimitHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn is_raised(&self) -> bool {
        self.shared.stop.load(Ordering::Acquire)
    }

    pub fn raise(&self) {
        self.shared.stop.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.shared.stop.store(false, Ordering::Release);
    }

    /// Removes the oldest pending event.
    pub fn pop_event(&self) -> Option<LimitEvent> {
        self.shared
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub fn has_events(&self) -> bool {
        !self
            .shared
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

/// Cloneable handle used by limit-switch interrupt callbacks.
///
/// A handle never moves a motor. It records the event and raises the stop
/// flag; the controller does the rest once its stepping loop has unwound.
#[derive(Clone)]
pub struct LimitHandle {
    shared: Arc<Shared>,
}
impl LimitHandle {
    /// Stops the move in progress and queues `switch` for backoff.
    ///
    /// If the queue is full the event is dropped, but the stop flag is
    /// still raised.
    ///
    /// # Parameters
    ///
    /// - `switch`: Switch which fired.
    /// - `level`: Pin level seen by the interrupt.
    pub fn interrupt_movement(&self, switch: LimitSwitch, level: PinState) {
        let queued = self
            .shared
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(LimitEvent { switch, level })
            .is_ok();
        self.shared.stop.store(true, Ordering::Release);
        if queued {
            warn!("Limit switch {:?} triggered ({:?})", switch, level);
        } else {
            warn!("Limit switch {:?} triggered, event queue full", switch);
        }
    }
}
