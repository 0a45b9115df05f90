//! Concurrency substrate for parallel encode and decode
//!
//! Three building blocks, leaves first: a lock-free work-stealing
//! deque with a stamped top register ([`deque`]), a reusable
//! rendezvous barrier ([`barrier`]), and two drivers that apply a pure
//! transform across a slice with a fixed pool of OS threads: the
//! barrier-synchronized BSP driver ([`bsp`]) and the work-stealing
//! driver ([`stealing`]). Threads are created per invocation and
//! joined before it returns; there is no pool reuse and no async
//! scheduling.

pub mod barrier;
pub mod bsp;
pub mod deque;
pub mod stealing;

pub use barrier::BarrierContext;
pub use bsp::{partition, partitioned_map};
pub use deque::{StampedTop, WorkStealingDeque};
pub use stealing::{work_stealing_map, WorkItem};

use std::mem::{ManuallyDrop, MaybeUninit};

/// Allocate an output buffer with one uninitialized slot per input
/// element. Both drivers fill every slot exactly once before the
/// buffer is converted back with [`assume_init_vec`].
fn uninit_output<R>(len: usize) -> Vec<MaybeUninit<R>> {
    let mut output = Vec::with_capacity(len);
    output.resize_with(len, MaybeUninit::uninit);
    output
}

/// Convert a fully written output buffer into its initialized form.
///
/// # Safety
///
/// Every element of `output` must have been initialized.
unsafe fn assume_init_vec<R>(output: Vec<MaybeUninit<R>>) -> Vec<R> {
    let mut output = ManuallyDrop::new(output);
    let (ptr, len, cap) = (output.as_mut_ptr(), output.len(), output.capacity());
    // MaybeUninit<R> and R have identical layout.
    unsafe { Vec::from_raw_parts(ptr.cast::<R>(), len, cap) }
}
