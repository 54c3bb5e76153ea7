//! In-memory library database handle

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// One track entry in the library database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DbTrack {
    /// Sequential track ID, assigned by [`Database::add_track`]
    pub id: u32,

    /// 64-bit database ID, stable across sessions
    pub dbid: u64,

    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: Option<String>,
    pub duration_ms: u32,
    pub track_number: Option<u32>,
    pub year: Option<u32>,
    pub comment: Option<String>,
    pub size: u64,

    /// Device-native path (`:`-separated), None until the file is placed
    pub ipod_path: Option<String>,

    /// Four-character file type code, big-endian
    pub filetype_marker: u32,

    /// True once the backing file exists on the device
    pub transferred: bool,

    /// Unix timestamp of when the record was created
    pub time_added: i64,
}

/// Parsed library database
///
/// A handle is owned by exactly one thread at a time; it is moved between
/// threads, never shared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    tracks: Vec<DbTrack>,

    /// Device sysinfo values carried with the database
    sysinfo: BTreeMap<String, String>,

    /// Last assigned track ID
    last_id: u32,

    #[serde(skip)]
    syncing: bool,
}

impl Database {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a database file
    pub fn parse(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open database: {:?}", path))?;

        let db: Database = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse database: {:?}", path))?;

        log::debug!("Parsed database {:?}: {} tracks", path, db.tracks.len());
        Ok(db)
    }

    /// Write the database to a file, replacing any existing content
    pub fn serialize(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create database file: {:?}", path))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("Failed to serialize database: {:?}", path))?;
        writer.flush()?;

        log::debug!("Wrote database {:?}: {} tracks", path, self.tracks.len());
        Ok(())
    }

    /// Add a track, assigning it the next free ID
    pub fn add_track(&mut self, mut track: DbTrack) -> u32 {
        self.last_id += 1;
        track.id = self.last_id;
        self.tracks.push(track);
        self.last_id
    }

    /// Remove a track by ID
    pub fn remove_track(&mut self, id: u32) -> Option<DbTrack> {
        let idx = self.tracks.iter().position(|t| t.id == id)?;
        Some(self.tracks.remove(idx))
    }

    pub fn track_mut(&mut self, id: u32) -> Option<&mut DbTrack> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    pub fn tracks(&self) -> &[DbTrack] {
        &self.tracks
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Whether any track already references this device-native path
    pub fn contains_path(&self, ipod_path: &str) -> bool {
        self.tracks
            .iter()
            .any(|t| t.ipod_path.as_deref() == Some(ipod_path))
    }

    /// Set or unset (`None`) a sysinfo value
    pub fn set_sysinfo(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(v) => {
                self.sysinfo.insert(key.to_string(), v.to_string());
            }
            None => {
                self.sysinfo.remove(key);
            }
        }
    }

    pub fn sysinfo(&self, key: &str) -> Option<&str> {
        self.sysinfo.get(key).map(String::as_str)
    }

    /// Mark the start of a write-back to the device
    pub fn start_sync(&mut self) {
        log::debug!("Database sync started");
        self.syncing = true;
    }

    pub fn stop_sync(&mut self) {
        log::debug!("Database sync stopped");
        self.syncing = false;
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn track(title: &str) -> DbTrack {
        DbTrack {
            title: title.to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_ids_are_sequential_and_not_reused() {
        let mut db = Database::new();
        let a = db.add_track(track("a"));
        let b = db.add_track(track("b"));
        assert_eq!((a, b), (1, 2));

        db.remove_track(b);
        let c = db.add_track(track("c"));
        assert_eq!(c, 3);
        assert_eq!(db.track_count(), 2);
    }

    #[test]
    fn test_sysinfo_set_and_unset() {
        let mut db = Database::new();
        db.set_sysinfo("FirewireGuid", Some("abc"));
        assert_eq!(db.sysinfo("FirewireGuid"), Some("abc"));

        db.set_sysinfo("FirewireGuid", None);
        assert_eq!(db.sysinfo("FirewireGuid"), None);
    }

    #[test]
    fn test_serialize_then_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("iTunesDB");

        let mut db = Database::new();
        let id = db.add_track(track("Song"));
        db.track_mut(id).unwrap().ipod_path = Some(":iPod_Control:Music:F00:ABCD.mp3".into());
        db.set_sysinfo("FirewireGuid", Some("device-1"));
        db.start_sync();
        db.serialize(&path).unwrap();

        let parsed = Database::parse(&path).unwrap();
        assert_eq!(parsed.tracks(), db.tracks());
        assert_eq!(parsed.sysinfo("FirewireGuid"), Some("device-1"));
        assert!(parsed.contains_path(":iPod_Control:Music:F00:ABCD.mp3"));
        assert!(!parsed.is_syncing());

        // IDs continue after the parsed maximum
        let mut parsed = parsed;
        assert_eq!(parsed.add_track(track("Next")), 2);
    }

    #[test]
    fn test_parse_garbage_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("iTunesDB");
        std::fs::write(&path, b"not a database").unwrap();

        assert!(Database::parse(&path).is_err());
        assert!(Database::parse(&dir.path().join("missing")).is_err());
    }
}
