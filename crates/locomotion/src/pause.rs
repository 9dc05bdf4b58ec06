/// Reference-counted pause. The subsystem is paused iff the count is non-zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PauseCounter {
    count: u32,
}

impl PauseCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a pause hold. Returns true if this call paused the subsystem.
    pub fn request(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        tracing::debug!(count = self.count, "pause requested");
        self.count == 1
    }

    /// Drop a pause hold. Returns false, without changing anything, if none is held.
    pub fn release(&mut self) -> bool {
        if self.count == 0 {
            tracing::warn!("pause released while not paused");
            return false;
        }
        self.count -= 1;
        tracing::debug!(count = self.count, "pause released");
        true
    }

    pub fn is_paused(&self) -> bool {
        self.count > 0
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
