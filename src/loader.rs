//! Loads a local database copy and resolves its tracks to device locations

use crate::itdb::{device_to_fs, Database, DbTrack};
use crate::model::Track;
use crate::progress::ProgressSink;
use crate::transfer::local_database_path;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A parsed database together with its caller-facing tracks
#[derive(Debug)]
pub struct LoadedDatabase {
    pub db: Database,
    pub tracks: Vec<Track>,
}

pub struct DatabaseLoader {
    local_path: PathBuf,
    database_path: String,
    music_path_prefix: String,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl DatabaseLoader {
    pub fn new(local_path: &Path, database_path: &str) -> Self {
        Self {
            local_path: local_path.to_path_buf(),
            database_path: database_path.to_string(),
            music_path_prefix: String::new(),
            progress: None,
        }
    }

    /// Prefix prepended to every track's device path, e.g. `afc://<host>`
    pub fn with_music_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.music_path_prefix = prefix.into();
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Parse the database and build the track list
    pub fn load(&self) -> Result<LoadedDatabase> {
        if let Some(progress) = &self.progress {
            progress.task_started("Loading device database");
        }

        let path = local_database_path(&self.local_path, &self.database_path);
        let db = Database::parse(&path)?;

        let tracks: Vec<Track> = db
            .tracks()
            .iter()
            .filter_map(|record| track_from_record(record, &self.music_path_prefix))
            .collect();

        log::info!(
            "Loaded {} tracks ({} records) from {:?}",
            tracks.len(),
            db.track_count(),
            path
        );
        Ok(LoadedDatabase { db, tracks })
    }
}

/// Convert a database record into a track located under `prefix`
///
/// Records without a device path have no backing file and are skipped.
pub fn track_from_record(record: &DbTrack, prefix: &str) -> Option<Track> {
    let Some(ipod_path) = record.ipod_path.as_deref() else {
        log::debug!("Skipping record {} without a device path", record.id);
        return None;
    };

    Some(Track {
        id: record.id.to_string(),
        title: record.title.clone(),
        artist: record.artist.clone(),
        album: record.album.clone(),
        genre: record.genre.clone(),
        duration_ms: record.duration_ms,
        location: device_location(prefix, ipod_path),
        file_size: record.size,
        track_number: record.track_number,
        year: record.year,
        comment: record.comment.clone(),
    })
}

/// Build a `<prefix>/<fs path>` location from a device-native path
pub fn device_location(prefix: &str, ipod_path: &str) -> String {
    let fs_path = device_to_fs(ipod_path);
    let encoded: Vec<String> = fs_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", prefix, encoded.join("/"))
}
