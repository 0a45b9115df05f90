//! Binary persistence of encoded payloads
//!
//! An [`Archive`] pairs the encoded index sequence with the codebook
//! needed to invert it, serialized through bincode over buffered file
//! I/O. The format is unversioned by design. [`write_text`] renders a
//! decoded token stream back to text, translating the newline marker
//! token into a real line break; that translation belongs to the
//! writer, not to the codec.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bincode::config;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::codebook::Codebook;
use crate::codec::tokenizer::NEWLINE_TOKEN;

/// Persisted compression payload: the integer-encoded document plus
/// its encoding alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    /// Codebook indices, one per input token, in document order.
    pub encoded: Vec<u32>,
    /// The alphabet the indices point into.
    pub codebook: Codebook,
}

/// Storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive serialization failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("archive deserialization failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

impl Archive {
    /// Write the archive to `path`, returning the serialized size in
    /// bytes.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<u64, StorageError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        let written =
            bincode::serde::encode_into_std_write(self, &mut writer, config::standard())?;
        writer.flush()?;
        debug!(
            "archived {} indices / {} codes to {} ({} bytes)",
            self.encoded.len(),
            self.codebook.len(),
            path.display(),
            written
        );
        Ok(written as u64)
    }

    /// Read an archive back from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        let archive = bincode::serde::decode_from_std_read(&mut reader, config::standard())?;
        Ok(archive)
    }
}

/// Render a decoded token stream to a text file. The
/// [`NEWLINE_TOKEN`] marker becomes a real newline; every other token
/// is written verbatim.
pub fn write_text(path: impl AsRef<Path>, tokens: &[String]) -> Result<(), StorageError> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    for token in tokens {
        if token == NEWLINE_TOKEN {
            writer.write_all(b"\n")?;
        } else {
            writer.write_all(token.as_bytes())?;
        }
    }
    writer.flush()?;
    Ok(())
}
