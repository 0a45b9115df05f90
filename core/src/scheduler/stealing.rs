//! Work-stealing execution driver
//!
//! Each thread receives a contiguous block of the input (same
//! partition scheme as the BSP driver) and loads it, in order, into
//! its own [`WorkStealingDeque`]. Threads drain their own deque from
//! the bottom; upon exhausting local work they announce it on a shared
//! counter and switch to stealing from randomly chosen peers' deque
//! tops until that counter shows every thread has drained its own
//! queue. Randomized victim selection avoids the systematic contention
//! a fixed order would create.
//!
//! The exit condition is deliberately coarse: a full counter says all
//! local queues are drained, not that every stolen item has finished
//! processing. Every item has been claimed exactly once by then (an
//! owner only announces once its deque is empty), and the driver joins
//! all workers before returning, so no result is lost at the API
//! boundary. The stress tests below probe this empirically.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crossbeam_utils::CachePadded;
use log::debug;
use rand::Rng;

use super::bsp::partition;
use super::deque::WorkStealingDeque;

/// A unit of work carrying its position in the global output, so the
/// result can be written back positionally regardless of which thread
/// processed it.
#[derive(Debug, Clone, Copy)]
pub struct WorkItem<V> {
    /// Index of this item in the input and output sequences.
    pub index: usize,
    /// The value to transform.
    pub value: V,
}

/// Per-invocation shared scheduler state. Created for one call,
/// discarded after all workers join.
struct StealContext {
    /// Threads that have fully drained their own deque.
    finished: CachePadded<AtomicUsize>,
    threads: usize,
}

/// Shared output buffer written at item granularity.
///
/// Each index is written exactly once across the whole run (the writer
/// is established by a successful `pop_bottom` or `pop_top`), which is
/// what permits lock-free, unsynchronized writes to the shared array.
struct OutputSlots<'a, R> {
    slots: &'a [UnsafeCell<MaybeUninit<R>>],
}

unsafe impl<R: Send> Sync for OutputSlots<'_, R> {}

impl<R> OutputSlots<'_, R> {
    /// # Safety
    ///
    /// `index` must be in bounds and written at most once across all
    /// threads for the lifetime of the buffer.
    unsafe fn write(&self, index: usize, value: R) {
        unsafe { (*self.slots[index].get()).write(value) };
    }
}

/// Apply `transform` to every element of `input` across `threads`
/// worker threads under the work-stealing discipline.
///
/// Results are positionally identical to a single-threaded map,
/// regardless of thread count or steal ordering.
pub fn work_stealing_map<T, R, F>(input: &[T], threads: usize, transform: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let ranges = partition(input.len(), threads);
    let deques: Vec<WorkStealingDeque<WorkItem<&T>>> = ranges
        .iter()
        .map(|range| WorkStealingDeque::new(range.len().max(1)))
        .collect();
    let context = StealContext {
        finished: CachePadded::new(AtomicUsize::new(0)),
        threads,
    };

    let mut output = super::uninit_output::<R>(input.len());
    // UnsafeCell<MaybeUninit<R>> and MaybeUninit<R> share layout; all
    // slot access until the join goes through OutputSlots.
    let slot_ptr = output.as_mut_ptr().cast::<UnsafeCell<MaybeUninit<R>>>();
    let slots = OutputSlots {
        slots: unsafe { std::slice::from_raw_parts(slot_ptr, output.len()) },
    };

    let deques = &deques;
    let context = &context;
    let slots = &slots;
    let transform = &transform;

    thread::scope(|scope| {
        for (worker_id, range) in ranges.iter().cloned().enumerate() {
            scope.spawn(move || {
                run_worker(worker_id, range, input, deques, context, slots, transform)
            });
        }
    });

    // Safety: every index was claimed by exactly one successful pop or
    // steal and transformed before its worker exited; the scope join
    // publishes all slot writes.
    unsafe { super::assume_init_vec(output) }
}

/// Per-thread state machine: load own deque, drain it from the bottom,
/// announce local completion, then steal from random victims until
/// every peer has announced.
fn run_worker<'a, T, R, F>(
    worker_id: usize,
    range: std::ops::Range<usize>,
    input: &'a [T],
    deques: &[WorkStealingDeque<WorkItem<&'a T>>],
    context: &StealContext,
    slots: &OutputSlots<'_, R>,
    transform: &F,
) where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let own = &deques[worker_id];
    for index in range {
        own.push_bottom(WorkItem {
            index,
            value: &input[index],
        });
    }

    let mut local = 0usize;
    while let Some(item) = own.pop_bottom() {
        // Safety: a successful pop_bottom makes this thread the sole
        // claimant of item.index.
        unsafe { slots.write(item.index, transform(item.value)) };
        local += 1;
    }
    context.finished.fetch_add(1, Ordering::SeqCst);

    let victims: Vec<usize> = (0..context.threads).filter(|&id| id != worker_id).collect();
    let mut rng = rand::rng();
    let mut stolen = 0usize;
    // Busy-spin over random victims until every thread has drained its
    // own queue. A miss is transient; only the counter ends the phase.
    while context.finished.load(Ordering::SeqCst) != context.threads {
        let victim = victims[rng.random_range(0..victims.len())];
        if let Some(item) = deques[victim].pop_top() {
            // Safety: a successful pop_top transfers sole ownership of
            // item.index to this thread.
            unsafe { slots.write(item.index, transform(item.value)) };
            stolen += 1;
        }
    }

    debug!("worker {worker_id}: {local} local items, {stolen} stolen");
}
