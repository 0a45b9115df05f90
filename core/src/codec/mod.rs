//! Dictionary substitution codec
//!
//! Token streams in, index streams out. [`tokenizer`] splits a text
//! file into tokens, [`codebook`] maps tokens to indices and back,
//! [`encode`] and [`decode`] run the substitution under each of the
//! concurrency disciplines, and [`storage`] persists the encoded
//! sequence together with its codebook.

pub mod codebook;
pub mod decode;
pub mod encode;
pub mod storage;
pub mod tokenizer;

pub use codebook::Codebook;
pub use decode::{decode, par_decode, steal_decode};
pub use encode::{encode, par_encode, steal_encode};
pub use storage::Archive;
pub use tokenizer::{tokenize_file, tokenize_reader, NEWLINE_TOKEN};
