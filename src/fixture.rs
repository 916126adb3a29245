//! Loading JSON fixtures and writing the entities captured during a run.
//!
//! A benchmark with half its input is meaningless, so there is no partial
//! load: the whole document parses or the run stops.

use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("fixture '{path}' could not be opened: {source}")]
    Missing { path: PathBuf, source: io::Error },
    #[error("fixture '{path}' is not a valid JSON array: {source}")]
    Malformed { path: PathBuf, source: serde_json::Error },
    #[error("could not write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Reads a JSON array from `path`.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, FixtureError> {
    let file = fs::File::open(path).map_err(|source| FixtureError::Missing {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<T> =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| FixtureError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Loaded {} entries from '{}'", entries.len(), path.display());
    Ok(entries)
}

/// Writes `entries` as a JSON array, creating parent directories as needed.
pub fn store<T: Serialize>(path: &Path, entries: &[T]) -> Result<(), FixtureError> {
    let write_err = |source| FixtureError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut out = BufWriter::new(fs::File::create(path).map_err(write_err)?);
    serde_json::to_writer(&mut out, entries).map_err(|e| write_err(e.into()))?;
    out.flush().map_err(write_err)?;
    info!("Wrote {} entries to '{}'", entries.len(), path.display());
    Ok(())
}
