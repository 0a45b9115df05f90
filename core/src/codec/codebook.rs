//! Token dictionary
//!
//! An ordered, deduplicated list of tokens; a token's position is its
//! integer encoding. Construction order is first-seen, so ties in the
//! encode scan resolve to the lowest index by construction. The book
//! is read-only once built and is shared by every worker during
//! encode and decode without synchronization.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

/// Ordered, deduplicated encoding alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codebook {
    tokens: Vec<String>,
}

impl Codebook {
    /// Build a codebook from a token stream, keeping the first
    /// occurrence of each distinct token.
    pub fn build(tokens: &[String]) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for token in tokens {
            if seen.insert(token.as_str()) {
                unique.push(token.clone());
            }
        }
        debug!("codebook: {} unique of {} tokens", unique.len(), tokens.len());
        Self { tokens: unique }
    }

    /// Wrap an existing token list, trusted to be deduplicated.
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Index of `token` in the book. Linear scan, first match wins.
    ///
    /// # Panics
    ///
    /// The encode alphabet is closed over the input by construction,
    /// so a missing token is a caller contract violation and panics.
    pub fn encode_token(&self, token: &str) -> u32 {
        self.tokens
            .iter()
            .position(|code| code == token)
            .unwrap_or_else(|| panic!("token {token:?} is not in the codebook")) as u32
    }

    /// Token at `index`.
    ///
    /// # Panics
    ///
    /// An out-of-range index is a caller contract violation; the
    /// decode alphabet is closed over any encoding produced by this
    /// book.
    pub fn decode_index(&self, index: u32) -> &str {
        &self.tokens[index as usize]
    }

    /// The ordered token list.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the book has no entries.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
