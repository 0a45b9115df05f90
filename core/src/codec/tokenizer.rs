//! Line-oriented text tokenization
//!
//! Splits each input line with a fixed pattern matching words (with
//! embedded hyphens, apostrophes, periods and double quotes) or a
//! single space, comma or newline, and appends a literal `\n` marker
//! token after every line so the line structure survives the round
//! trip. The grammar is fixed by design; making it configurable is a
//! non-goal.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use thiserror::Error;

/// Marker token standing in for a line break. The text writer in
/// [`storage`](crate::codec::storage) turns it back into a real
/// newline; the codec treats it as an ordinary token.
pub const NEWLINE_TOKEN: &str = "\\n";

const TOKEN_PATTERN: &str = r#"[\w\-.'"]+|[ ,\n]"#;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The pattern is a compile-time constant; failure here is a defect
    // in this module, not an input condition.
    RE.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern must compile"))
}

/// Tokenization failures with the offending path attached.
#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Tokenize a text file, one [`NEWLINE_TOKEN`] per input line.
pub fn tokenize_file(path: impl AsRef<Path>) -> Result<Vec<String>, TokenizeError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TokenizeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let tokens = tokenize_reader(BufReader::new(file)).map_err(|source| TokenizeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("tokenized {} into {} tokens", path.display(), tokens.len());
    Ok(tokens)
}

/// Tokenize an already-open line source.
pub fn tokenize_reader<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let re = token_regex();
    let mut tokens = Vec::new();
    for line in reader.lines() {
        let line = line?;
        for found in re.find_iter(&line) {
            tokens.push(found.as_str().to_owned());
        }
        tokens.push(NEWLINE_TOKEN.to_owned());
    }
    Ok(tokens)
}
