//! Source file metadata from embedded tags

use crate::model::Track;
use anyhow::{Context, Result};
use lofty::prelude::*;
use lofty::probe::Probe;
use std::path::Path;

/// Read track metadata from a local audio file's tags
///
/// Fields missing from the tags keep the defaults of [`Track::from_file`].
pub fn read_metadata(path: &Path) -> Result<Track> {
    let mut track = Track::from_file(path);

    let tagged_file = Probe::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?
        .read()
        .with_context(|| format!("Failed to read tags from: {}", path.display()))?;

    track.duration_ms = tagged_file.properties().duration().as_millis() as u32;

    if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        if let Some(title) = tag.title() {
            track.title = title.into_owned();
        }
        if let Some(artist) = tag.artist() {
            track.artist = artist.into_owned();
        }
        if let Some(album) = tag.album() {
            track.album = album.into_owned();
        }
        track.genre = tag.genre().map(|g| g.into_owned());
        track.comment = tag.comment().map(|c| c.into_owned());
        track.track_number = tag.track();
        track.year = tag.year();
    }

    Ok(track)
}

/// Like [`read_metadata`], falling back to file-name metadata when the
/// tags cannot be read
pub fn read_metadata_or_default(path: &Path) -> Track {
    match read_metadata(path) {
        Ok(track) => track,
        Err(e) => {
            log::warn!("Using file name as metadata for {:?}: {:#}", path, e);
            Track::from_file(path)
        }
    }
}
