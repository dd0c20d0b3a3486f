use std::sync::atomic::{Ordering, AtomicBool};
use std::sync::Arc;

use tracing::trace;
use event_listener::Event;

const DEFAULT_EVENT_ORDERING: Ordering = Ordering::SeqCst;

/// One-shot signal which stays set once notified.
///
/// Used as the cancellation context of an installation run: the orchestrator
/// calls [`StickyEvent::notify`] when the cancel timeout elapses and workers
/// poll [`StickyEvent::is_set`] before picking the next job.
#[derive(Debug)]
pub struct StickyEvent {
    flag: AtomicBool,
    event: Event,
}

impl StickyEvent {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self {
            flag: AtomicBool::new(false),
            event: Event::new(),
        })
    }

    // is flag set
    pub fn is_set(&self) -> bool {
        self.flag.load(DEFAULT_EVENT_ORDERING)
    }

    /// wait until flag is set, returns immediately if it already is
    pub async fn listen(&self) {
        if self.is_set() {
            trace!("before, flag is set");
            return;
        }

        let listener = self.event.listen();

        if self.is_set() {
            trace!("after flag is set");
            return;
        }

        listener.await
    }

    /// set flag and wake up all listeners, repeated calls are no-op
    pub fn notify(&self) {
        if self.flag.swap(true, DEFAULT_EVENT_ORDERING) {
            trace!("flag was already set");
            return;
        }
        self.event.notify(usize::MAX);
    }
}
