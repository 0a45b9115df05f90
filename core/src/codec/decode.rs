//! Index-to-token substitution under each concurrency discipline

use crate::codec::codebook::Codebook;
use crate::scheduler::{partitioned_map, work_stealing_map};

/// Single-threaded reference decode.
pub fn decode(encoded: &[u32], codebook: &Codebook) -> Vec<String> {
    encoded
        .iter()
        .map(|&index| codebook.decode_index(index).to_owned())
        .collect()
}

/// Barrier-synchronized parallel decode over `threads` workers.
pub fn par_decode(encoded: &[u32], codebook: &Codebook, threads: usize) -> Vec<String> {
    partitioned_map(encoded, threads, |&index| {
        codebook.decode_index(index).to_owned()
    })
}

/// Work-stealing parallel decode over `threads` workers.
pub fn steal_decode(encoded: &[u32], codebook: &Codebook, threads: usize) -> Vec<String> {
    work_stealing_map(encoded, threads, |&index| {
        codebook.decode_index(index).to_owned()
    })
}
