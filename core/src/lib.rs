//! parlex-core: parallel dictionary compression engine
//!
//! Tokenizes text into a stream of tokens, builds a codebook of unique
//! tokens, and substitutes each token with its codebook index. The
//! substitution itself is trivial; the engine exists to drive it under
//! three execution disciplines:
//!
//! - a single-threaded reference transform,
//! - barrier-synchronized contiguous partitioning (a BSP superstep),
//! - a lock-free work-stealing scheduler over per-worker deques.
//!
//! The [`scheduler`] module holds the concurrency substrate (the
//! stamped-top work-stealing deque, the barrier, and the two parallel
//! map drivers). The [`codec`] module holds the substitution logic and
//! its collaborators (tokenizer, codebook, binary persistence).

pub mod codec;
pub mod scheduler;

pub use codec::codebook::Codebook;
pub use codec::storage::Archive;
pub use scheduler::barrier::BarrierContext;
pub use scheduler::deque::{StampedTop, WorkStealingDeque};
