//! Token-to-index substitution under each concurrency discipline
//!
//! The transform itself is a pure codebook lookup; the variants differ
//! only in which scheduler driver applies it. All of them produce the
//! same order-preserving index sequence, one entry per input token.

use crate::codec::codebook::Codebook;
use crate::scheduler::{partitioned_map, work_stealing_map};

/// Single-threaded reference encode.
pub fn encode(tokens: &[String], codebook: &Codebook) -> Vec<u32> {
    tokens.iter().map(|token| codebook.encode_token(token)).collect()
}

/// Barrier-synchronized parallel encode over `threads` workers.
pub fn par_encode(tokens: &[String], codebook: &Codebook, threads: usize) -> Vec<u32> {
    partitioned_map(tokens, threads, |token| codebook.encode_token(token))
}

/// Work-stealing parallel encode over `threads` workers.
pub fn steal_encode(tokens: &[String], codebook: &Codebook, threads: usize) -> Vec<u32> {
    work_stealing_map(tokens, threads, |token| codebook.encode_token(token))
}
