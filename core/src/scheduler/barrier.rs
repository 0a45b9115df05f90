//! Single-superstep rendezvous barrier
//!
//! `BarrierContext` implements the BSP coordination point: every
//! participant does its local work, then blocks in [`arrive`] until
//! all participants have arrived, at which point all are released
//! together. One context is created per parallel invocation and
//! discarded after its workers join; it is never a process-wide
//! singleton.
//!
//! [`arrive`]: BarrierContext::arrive

use std::sync::{Condvar, Mutex};

/// Shared rendezvous state for a fixed set of participants.
#[derive(Debug)]
pub struct BarrierContext {
    participants: usize,
    arrived: Mutex<usize>,
    all_arrived: Condvar,
}

impl BarrierContext {
    /// Create a barrier for `participants` threads.
    ///
    /// # Panics
    ///
    /// Panics if `participants` is zero.
    pub fn new(participants: usize) -> Self {
        assert!(participants >= 1, "a barrier needs at least one participant");
        Self {
            participants,
            arrived: Mutex::new(0),
            all_arrived: Condvar::new(),
        }
    }

    /// Number of participants the barrier was created for.
    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Announce completion of this participant's local work and block
    /// until every participant has done the same.
    ///
    /// The last arrival wakes all waiters; earlier arrivals wait on
    /// the condition variable in a loop, so spurious wakeups are
    /// absorbed. Called exactly once per participant per superstep.
    pub fn arrive(&self) {
        let mut arrived = self.arrived.lock().unwrap();
        *arrived += 1;
        if *arrived == self.participants {
            self.all_arrived.notify_all();
        } else {
            while *arrived != self.participants {
                arrived = self.all_arrived.wait(arrived).unwrap();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn single_participant_never_blocks() {
        let barrier = BarrierContext::new(1);
        barrier.arrive();
    }

    #[test]
    fn releases_all_participants_together() {
        const THREADS: usize = 8;
        let barrier = Arc::new(BarrierContext::new(THREADS));
        let pre_arrivals = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                let pre_arrivals = Arc::clone(&pre_arrivals);
                thread::spawn(move || {
                    pre_arrivals.fetch_add(1, Ordering::SeqCst);
                    barrier.arrive();
                    // Released only after every thread has arrived.
                    pre_arrivals.load(Ordering::SeqCst)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), THREADS);
        }
    }

    #[test]
    fn holds_until_last_arrival() {
        let barrier = Arc::new(BarrierContext::new(2));
        let (sender, receiver) = mpsc::channel();

        let waiter = {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.arrive();
                sender.send(()).unwrap();
            })
        };

        // The first arrival must stay blocked on its own.
        assert!(receiver.recv_timeout(Duration::from_millis(100)).is_err());

        barrier.arrive();
        receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();
    }

    #[test]
    #[should_panic(expected = "at least one participant")]
    fn zero_participants_is_rejected() {
        let _ = BarrierContext::new(0);
    }
}
