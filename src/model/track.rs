use serde::{Deserialize, Serialize};
use std::path::Path;

/// Represents a single music track with all its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier for this track
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Genre (optional)
    pub genre: Option<String>,

    /// Track duration in milliseconds
    pub duration_ms: u32,

    /// Where the track lives: `file:///...` for local files,
    /// `afc://<host>/...` for tracks on a device
    pub location: String,

    /// File size in bytes
    pub file_size: u64,

    /// Track number in album (optional)
    pub track_number: Option<u32>,

    /// Year/date (optional)
    pub year: Option<u32>,

    /// Comment/description (optional)
    pub comment: Option<String>,
}

impl Track {
    /// Create a track for a local file with placeholder metadata
    ///
    /// The title defaults to the file stem; everything else is unknown.
    pub fn from_file(path: &Path) -> Self {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        Self {
            id: String::new(),
            title,
            artist: "Unknown Artist".to_string(),
            album: "Unknown Album".to_string(),
            genre: None,
            duration_ms: 0,
            location: file_location(path),
            file_size,
            track_number: None,
            year: None,
            comment: None,
        }
    }

    /// File extension of the track's location, without the dot
    ///
    /// Returns an empty string when the final path segment has no `.`.
    pub fn extension(&self) -> &str {
        let last_segment = self.location.rsplit('/').next().unwrap_or("");
        match last_segment.rfind('.') {
            Some(idx) => &last_segment[idx + 1..],
            None => "",
        }
    }
}

/// Build a `file://` URI for a local path, percent-encoding each segment
pub fn file_location(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let encoded: Vec<String> = raw
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("file://{}", encoded.join("/"))
}
