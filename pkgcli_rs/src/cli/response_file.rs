//! Response file expansion.
//!
//! A token of the form `@path` is replaced by the whitespace separated
//! tokens read from `path`. Files may reference further response files up to
//! [`MAX_DEPTH`] levels; there is no cycle detection, the depth limit alone
//! guarantees termination.

use std::io::Read;
use std::path::{Path, PathBuf};

use super::error::ResponseFileError;

/// Deepest allowed nesting of response files.
pub const MAX_DEPTH: usize = 3;

/// Largest accepted response file, in bytes.
pub const MAX_FILE_SIZE: u64 = 2_000_000;

const SEPARATORS: [char; 4] = [' ', '\t', '\r', '\n'];

/// Expand response files relative to the process working directory.
pub fn expand(tokens: &[String]) -> Result<Vec<String>, ResponseFileError> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    expand_from(&cwd, tokens)
}

/// Expand response files, resolving relative paths against `base`.
pub fn expand_from(base: &Path, tokens: &[String]) -> Result<Vec<String>, ResponseFileError> {
    let mut expanded = Vec::with_capacity(tokens.len());
    expand_into(base, tokens, 0, &mut expanded)?;
    Ok(expanded)
}

fn expand_into(
    base: &Path,
    tokens: &[String],
    depth: usize,
    out: &mut Vec<String>,
) -> Result<(), ResponseFileError> {
    for token in tokens {
        let Some(raw_path) = token.strip_prefix('@') else {
            out.push(token.clone());
            continue;
        };

        if raw_path.is_empty() {
            return Err(ResponseFileError::NotFound {
                path: token.clone(),
            });
        }

        let path = base.join(raw_path);
        if depth >= MAX_DEPTH {
            return Err(ResponseFileError::TooDeep { path });
        }

        let content = read_limited(&path, raw_path)?;
        let nested: Vec<String> = tokenize(&content).map(str::to_string).collect();
        tracing::trace!(
            path = %path.display(),
            depth = depth + 1,
            tokens = nested.len(),
            "expanded response file"
        );
        expand_into(base, &nested, depth + 1, out)?;
    }
    Ok(())
}

/// Read a response file, refusing anything above [`MAX_FILE_SIZE`].
fn read_limited(path: &Path, display: &str) -> Result<String, ResponseFileError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => {
            return Err(ResponseFileError::NotFound {
                path: display.to_string(),
            });
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ResponseFileError::NotFound {
                path: display.to_string(),
            });
        }
        Err(source) => {
            return Err(ResponseFileError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if metadata.len() > MAX_FILE_SIZE {
        return Err(ResponseFileError::TooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
        });
    }

    // The file may grow between the metadata call and the read.
    let file = std::fs::File::open(path).map_err(|source| ResponseFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bytes = Vec::with_capacity(metadata.len() as usize);
    file.take(MAX_FILE_SIZE + 1)
        .read_to_end(&mut bytes)
        .map_err(|source| ResponseFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    if bytes.len() as u64 > MAX_FILE_SIZE {
        return Err(ResponseFileError::TooLarge {
            path: path.to_path_buf(),
            size: bytes.len() as u64,
        });
    }

    String::from_utf8(bytes).map_err(|_| ResponseFileError::InvalidEncoding {
        path: path.to_path_buf(),
    })
}

/// Split response file content into tokens. Blank lines yield nothing.
fn tokenize(content: &str) -> impl Iterator<Item = &str> {
    content
        .trim_start_matches('\u{feff}')
        .split(SEPARATORS)
        .filter(|piece| !piece.is_empty())
}
