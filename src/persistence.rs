//! Persistence Gateway - Deck Files on Disk
//!
//! Wraps the codec's blob format with whole-file reads and writes. Paths come
//! from a picker (a native dialog in the editor); a cancelled pick is always
//! a no-op.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::codec::{self, CodecError, FormatVersion};
use crate::slides::{Deck, Slide};

/// Conventional extension for saved decks.
pub const DECK_EXTENSION: &str = "nsl";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Cannot write deck {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read deck {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed deck {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

/// Supplies file paths, typically via a dialog. `None` means cancelled.
pub trait PathPicker {
    fn pick_save_path(&mut self) -> Option<PathBuf>;
    fn pick_open_path(&mut self) -> Option<PathBuf>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    Cancelled,
    Saved { path: PathBuf, bytes: usize },
}

#[derive(Debug)]
pub enum LoadOutcome {
    Cancelled,
    Loaded { path: PathBuf, slides: usize },
    /// The file could not be used; the deck was left as it was.
    Unchanged { error: PersistError },
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

/// Append the deck extension when the path has none.
pub fn with_deck_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(DECK_EXTENSION)
    }
}

/// Write `deck` in the legacy zero-delimited form. Returns bytes written.
pub fn save_to(path: &Path, deck: &Deck) -> Result<usize, PersistError> {
    save_versioned_to(path, deck, FormatVersion::Legacy)
}

pub fn save_versioned_to(
    path: &Path,
    deck: &Deck,
    version: FormatVersion,
) -> Result<usize, PersistError> {
    let bytes = codec::encode_binary_versioned(deck, version);
    let write_err = |source: std::io::Error| PersistError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(write_err)?;
    file.write_all(&bytes).map_err(write_err)?;
    tracing::info!(
        path = %path.display(),
        slides = deck.len(),
        bytes = bytes.len(),
        ?version,
        "deck saved"
    );
    Ok(bytes.len())
}

/// Read and decode a deck file. The result may be empty.
pub fn load_from(path: &Path) -> Result<Vec<Slide>, PersistError> {
    let bytes = fs::read(path).map_err(|source| PersistError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let slides = codec::decode_binary(&bytes).map_err(|source| PersistError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), slides = slides.len(), "deck loaded");
    Ok(slides)
}

/// Ask for a destination and save there.
pub fn save(deck: &Deck, picker: &mut impl PathPicker) -> Result<SaveOutcome, PersistError> {
    let Some(path) = picker.pick_save_path() else {
        return Ok(SaveOutcome::Cancelled);
    };
    let path = with_deck_extension(path);
    let bytes = save_to(&path, deck)?;
    Ok(SaveOutcome::Saved { path, bytes })
}

/// Ask for a source and replace `deck` with its contents. Any failure leaves
/// `deck` untouched.
pub fn load(deck: &mut Deck, picker: &mut impl PathPicker) -> LoadOutcome {
    let Some(path) = picker.pick_open_path() else {
        return LoadOutcome::Cancelled;
    };
    match load_from(&path) {
        Ok(slides) => {
            deck.replace_all(slides);
            LoadOutcome::Loaded {
                path,
                slides: deck.len(),
            }
        }
        Err(error) => {
            tracing::warn!(%error, "load skipped");
            LoadOutcome::Unchanged { error }
        }
    }
}
