//! Re-entrant dispatch gate.
//!
//! Only one thread at a time may run publish-and-notify rounds. The owning
//! thread may re-enter (a publish from inside a listener), which is how
//! depth-first fan-out works; every other thread waits until the owner has
//! fully unwound.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
struct Owner {
    thread: Option<ThreadId>,
    depth: usize,
}

#[derive(Debug, Default)]
pub(crate) struct DispatchGate {
    owner: Mutex<Owner>,
    released: Condvar,
}

/// Held for the duration of one round; dropping it leaves the gate.
pub(crate) struct GateGuard<'a> {
    gate: &'a DispatchGate,
    depth: usize,
}

impl GateGuard<'_> {
    /// Nesting level of this round, 1 for a top-level publish
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}

impl DispatchGate {
    fn lock(&self) -> MutexGuard<'_, Owner> {
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the gate is free or already owned by this thread
    fn wait_turn(&self) -> MutexGuard<'_, Owner> {
        let me = thread::current().id();
        let mut owner = self.lock();
        while owner.thread.is_some_and(|id| id != me) {
            owner = self
                .released
                .wait(owner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        owner
    }

    fn admit(&self, mut owner: MutexGuard<'_, Owner>) -> GateGuard<'_> {
        owner.thread = Some(thread::current().id());
        owner.depth += 1;
        GateGuard {
            gate: self,
            depth: owner.depth,
        }
    }

    /// Enter the gate, blocking while another thread owns it.
    pub(crate) fn enter(&self) -> GateGuard<'_> {
        let owner = self.wait_turn();
        self.admit(owner)
    }

    /// Like [`enter`](Self::enter), but refused once `limit` rounds are
    /// already open on this thread. The error carries the current depth.
    pub(crate) fn enter_bounded(&self, limit: usize) -> Result<GateGuard<'_>, usize> {
        let owner = self.wait_turn();
        if owner.depth >= limit {
            return Err(owner.depth);
        }
        Ok(self.admit(owner))
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        let mut owner = self.gate.lock();
        owner.depth = owner.depth.saturating_sub(1);
        if owner.depth == 0 {
            owner.thread = None;
            drop(owner);
            self.gate.released.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_reentry_tracks_depth() {
        let gate = DispatchGate::default();
        let outer = gate.enter();
        assert_eq!(outer.depth(), 1);
        {
            let inner = gate.enter();
            assert_eq!(inner.depth(), 2);
        }
        let again = gate.enter();
        assert_eq!(again.depth(), 2);
    }

    #[test]
    fn test_limit_refuses_deeper_rounds() {
        let gate = DispatchGate::default();
        let _one = gate.enter_bounded(2).unwrap();
        let _two = gate.enter_bounded(2).unwrap();
        assert_eq!(gate.enter_bounded(2).err(), Some(2));
        // Unbounded entry still works
        assert_eq!(gate.enter().depth(), 3);
    }

    #[test]
    fn test_released_after_unwind() {
        let gate = DispatchGate::default();
        {
            let _outer = gate.enter();
            let _inner = gate.enter();
        }
        let guard = gate.enter_bounded(1).unwrap();
        assert_eq!(guard.depth(), 1);
    }

    #[test]
    fn test_zero_limit_refuses_first_entry() {
        let gate = DispatchGate::default();
        assert_eq!(gate.enter_bounded(0).err(), Some(0));
        assert_eq!(gate.enter().depth(), 1);
    }

    #[test]
    fn test_other_thread_waits_for_owner() {
        let gate = Arc::new(DispatchGate::default());
        let entered = Arc::new(AtomicBool::new(false));

        let guard = gate.enter();
        let handle = {
            let gate = Arc::clone(&gate);
            let entered = Arc::clone(&entered);
            std::thread::spawn(move || {
                let _guard = gate.enter();
                entered.store(true, Ordering::SeqCst);
            })
        };

        std::thread::sleep(Duration::from_millis(50));
        assert!(!entered.load(Ordering::SeqCst));

        drop(guard);
        handle.join().unwrap();
        assert!(entered.load(Ordering::SeqCst));
    }
}
