//! Single-flight guard keyed by position.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::shared::PositionId;

/// Set of positions with an exit in flight.
///
/// [`try_acquire`](Self::try_acquire) tests and inserts under one lock. The
/// returned permit removes the entry when dropped, on every path out of the
/// exit including early returns and panics.
#[derive(Debug, Clone, Default)]
pub struct ExitGuard {
    exiting: Arc<Mutex<HashSet<PositionId>>>,
}

impl ExitGuard {
    /// Create an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `position_id`, or `None` if an exit is already in flight.
    #[must_use]
    pub fn try_acquire(&self, position_id: &PositionId) -> Option<ExitPermit> {
        let inserted = self.exiting.lock().insert(position_id.clone());
        inserted.then(|| ExitPermit {
            position_id: position_id.clone(),
            exiting: Arc::clone(&self.exiting),
        })
    }

    /// Whether `position_id` is exiting.
    #[must_use]
    pub fn is_exiting(&self, position_id: &PositionId) -> bool {
        self.exiting.lock().contains(position_id)
    }

    /// Number of exits in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.exiting.lock().len()
    }
}

/// Ownership of one position's exit. Released on drop.
#[derive(Debug)]
pub struct ExitPermit {
    position_id: PositionId,
    exiting: Arc<Mutex<HashSet<PositionId>>>,
}

impl ExitPermit {
    /// The guarded position.
    #[must_use]
    pub const fn position_id(&self) -> &PositionId {
        &self.position_id
    }
}

impl Drop for ExitPermit {
    fn drop(&mut self) {
        self.exiting.lock().remove(&self.position_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_drop() {
        let guard = ExitGuard::new();
        let id = PositionId::new("p-1");

        let permit = guard.try_acquire(&id).unwrap();
        assert!(guard.try_acquire(&id).is_none());
        assert!(guard.is_exiting(&id));
        assert_eq!(guard.in_flight(), 1);

        drop(permit);
        assert!(!guard.is_exiting(&id));
        assert!(guard.try_acquire(&id).is_some());
    }

    #[test]
    fn permits_are_per_position() {
        let guard = ExitGuard::new();
        let _a = guard.try_acquire(&PositionId::new("a")).unwrap();
        let _b = guard.try_acquire(&PositionId::new("b")).unwrap();
        assert_eq!(guard.in_flight(), 2);
    }

    #[test]
    fn permit_released_on_panic() {
        let guard = ExitGuard::new();
        let id = PositionId::new("p-1");
        let cloned = guard.clone();
        let inner = id.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _permit = cloned.try_acquire(&inner).unwrap();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!guard.is_exiting(&id));
    }
}
