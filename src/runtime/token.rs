use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared run flag for the render and control loops.
///
/// Clones observe the same flag. Cancelling is one-way.
#[derive(Debug, Clone)]
pub struct RunToken {
    running: Arc<AtomicBool>,
}

impl RunToken {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Default for RunToken {
    fn default() -> Self {
        Self::new()
    }
}
