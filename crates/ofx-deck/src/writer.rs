//! Deck file output.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::emitter::{DeckHeader, render_deck};
use crate::error::Result;
use crate::registry::FinalDeck;

/// Render and write a deck.
///
/// The text is fully rendered before the file system is touched, so a
/// rendering failure never leaves a file behind.
pub fn write_deck(path: impl AsRef<Path>, deck: &FinalDeck, header: &DeckHeader) -> Result<()> {
    let text = render_deck(deck, header)?;
    write_rendered(path, &text)
}

/// Write already rendered deck text through a temporary file next to `path`
/// that is renamed into place, so readers never see a truncated deck.
pub fn write_rendered(path: impl AsRef<Path>, text: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|err| err.error)?;

    debug!(path = %path.display(), bytes = text.len(), "deck written");
    Ok(())
}
