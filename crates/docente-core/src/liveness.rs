use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag telling async work whether its owner still exists.
///
/// Clones observe the same flag. Once [`detach`](Self::detach) is called,
/// results that arrive later must be dropped instead of written back.
#[derive(Debug, Clone)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn detach(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let owner = Liveness::new();
        let task = owner.clone();
        assert!(task.is_alive());
        owner.detach();
        assert!(!task.is_alive());
    }
}
