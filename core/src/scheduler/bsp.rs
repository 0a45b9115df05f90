//! Barrier-synchronized partitioned execution (BSP superstep)
//!
//! Divides an input slice into contiguous, roughly equal blocks, one
//! per thread. Each thread independently transforms its block into an
//! exclusive region of the output, then rendezvouses at a
//! [`BarrierContext`] before the call returns. The partition is a
//! complete, gap-free, order-preserving cover, so the output needs no
//! merge step beyond returning the single pre-allocated buffer.

use std::ops::Range;
use std::thread;

use log::debug;

use super::barrier::BarrierContext;

/// Split `[0, len)` into `threads` contiguous blocks of size
/// `len / threads`, with the final block absorbing the remainder.
///
/// # Panics
///
/// Panics if `threads` is zero.
pub fn partition(len: usize, threads: usize) -> Vec<Range<usize>> {
    assert!(threads >= 1, "partitioning requires at least one thread");
    let block = len / threads;
    (0..threads)
        .map(|i| {
            let start = i * block;
            let end = if i == threads - 1 { len } else { start + block };
            start..end
        })
        .collect()
}

/// Apply `transform` to every element of `input` across `threads`
/// worker threads under the BSP discipline.
///
/// Each worker writes into its exclusive output block, so no ordering
/// between threads' writes is needed; the barrier separates "all
/// writes done" from anything that follows. Workers are spawned per
/// invocation and joined before the call returns.
pub fn partitioned_map<T, R, F>(input: &[T], threads: usize, transform: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let ranges = partition(input.len(), threads);
    debug!(
        "bsp superstep: {} items across {} threads (block {})",
        input.len(),
        threads,
        input.len() / threads
    );

    let mut output = super::uninit_output::<R>(input.len());
    let barrier = BarrierContext::new(threads);
    let barrier = &barrier;
    let transform = &transform;

    thread::scope(|scope| {
        let mut remaining = output.as_mut_slice();
        for range in ranges {
            let (block, rest) = remaining.split_at_mut(range.len());
            remaining = rest;
            let values = &input[range];
            scope.spawn(move || {
                for (slot, value) in block.iter_mut().zip(values) {
                    slot.write(transform(value));
                }
                barrier.arrive();
            });
        }
    });

    // Safety: the partition covers every index exactly once and each
    // worker wrote its whole block before arriving at the barrier.
    unsafe { super::assume_init_vec(output) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn partition_distributes_remainder_to_last_block() {
        let ranges = partition(10, 3);
        assert_eq!(ranges, vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn partition_with_more_threads_than_items() {
        let ranges = partition(2, 4);
        assert_eq!(ranges, vec![0..0, 0..0, 0..0, 0..2]);
    }

    #[test]
    fn partition_single_thread_takes_everything() {
        assert_eq!(partition(7, 1), vec![0..7]);
    }

    proptest! {
        /// The partition is a contiguous, non-overlapping, complete
        /// cover of `[0, len)`.
        #[test]
        fn partition_covers_exactly(len in 0usize..10_000, threads in 1usize..64) {
            let ranges = partition(len, threads);
            prop_assert_eq!(ranges.len(), threads);
            prop_assert_eq!(ranges[0].start, 0);
            prop_assert_eq!(ranges[threads - 1].end, len);
            for window in ranges.windows(2) {
                prop_assert_eq!(window[0].end, window[1].start);
            }
            let block = len / threads;
            for range in &ranges[..threads - 1] {
                prop_assert_eq!(range.len(), block);
            }
        }
    }

    #[test]
    fn matches_sequential_transform() {
        let input: Vec<u64> = (0..1_000).collect();
        let expected: Vec<u64> = input.iter().map(|x| x * 3 + 1).collect();
        for threads in [1, 2, 3, 7, 16] {
            let got = partitioned_map(&input, threads, |x| x * 3 + 1);
            assert_eq!(got, expected, "threads = {threads}");
        }
    }

    #[test]
    fn handles_empty_input() {
        let got: Vec<u8> = partitioned_map(&[] as &[u8], 4, |x| *x);
        assert!(got.is_empty());
    }

    #[test]
    fn preserves_order_for_non_copy_output() {
        let input: Vec<String> = (0..57).map(|i| format!("tok{i}")).collect();
        let got = partitioned_map(&input, 5, |s| format!("<{s}>"));
        let expected: Vec<String> = input.iter().map(|s| format!("<{s}>")).collect();
        assert_eq!(got, expected);
    }
}
