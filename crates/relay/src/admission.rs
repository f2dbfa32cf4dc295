//! One-active-job-per-user admission control.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

/// Set of senders that currently hold an active job.
///
/// std::sync::Mutex because every operation is a single set lookup; the lock
/// is never held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct AdmissionSet {
    active: Arc<Mutex<HashSet<u64>>>,
}

impl AdmissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically admit `user_id` if it has no active job.
    ///
    /// The returned permit releases the slot when dropped, including during
    /// unwinding, so membership never outlives the job.
    pub fn try_admit(&self, user_id: u64) -> Option<AdmissionPermit> {
        if !lock(&self.active).insert(user_id) {
            return None;
        }
        Some(AdmissionPermit {
            user_id,
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, user_id: u64) -> bool {
        lock(&self.active).contains(&user_id)
    }

    pub fn active_count(&self) -> usize {
        lock(&self.active).len()
    }
}

/// Proof of admission for one job.
#[derive(Debug)]
pub struct AdmissionPermit {
    user_id: u64,
    active: Arc<Mutex<HashSet<u64>>>,
}

impl AdmissionPermit {
    pub fn user_id(&self) -> u64 {
        self.user_id
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.user_id);
    }
}

// A panic elsewhere must not wedge admission for every user.
fn lock(set: &Mutex<HashSet<u64>>) -> MutexGuard<'_, HashSet<u64>> {
    set.lock().unwrap_or_else(|e| e.into_inner())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_admission_for_same_user_is_refused() {
        let set = AdmissionSet::new();
        let permit = set.try_admit(1).unwrap();
        assert_eq!(permit.user_id(), 1);
        assert!(set.try_admit(1).is_none());
        assert!(set.is_active(1));
    }

    #[test]
    fn different_users_are_independent() {
        let set = AdmissionSet::new();
        let _a = set.try_admit(1).unwrap();
        let _b = set.try_admit(2).unwrap();
        assert_eq!(set.active_count(), 2);
    }

    #[test]
    fn dropping_permit_releases_slot() {
        let set = AdmissionSet::new();
        drop(set.try_admit(1).unwrap());
        assert!(!set.is_active(1));
        assert!(set.try_admit(1).is_some());
    }

    #[test]
    fn permit_released_when_holder_panics() {
        let set = AdmissionSet::new();
        let cloned = set.clone();
        let result = std::thread::spawn(move || {
            let _permit = cloned.try_admit(9).unwrap();
            panic!("stage blew up");
        })
        .join();
        assert!(result.is_err());
        assert!(!set.is_active(9));
    }

    #[test]
    fn concurrent_admission_admits_exactly_one() {
        let set = AdmissionSet::new();
        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let set = set.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    // Hold the permit until the test inspects the count.
                    set.try_admit(5).map(std::mem::forget).is_some()
                })
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(set.active_count(), 1);
    }
}
