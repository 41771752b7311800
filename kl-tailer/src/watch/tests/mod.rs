
use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};

// A stand-in child for reconciler tests; remembers whether it has been
// dropped so tests can observe teardown.
pub(crate) struct TestChild {
    alive: Arc<AtomicBool>,
}

impl TestChild {
    pub(crate) fn new() -> (TestChild, Arc<AtomicBool>) {
        let alive = Arc::new(AtomicBool::new(true));
        (TestChild { alive: alive.clone() }, alive)
    }
}

impl Drop for TestChild {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
