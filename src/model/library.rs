use super::Track;
use std::collections::HashMap;

/// Index of the tracks currently visible to callers, keyed by track ID
#[derive(Debug, Clone)]
pub struct Library {
    tracks: HashMap<String, Track>,
}

impl Library {
    /// Create a new empty library
    pub fn new() -> Self {
        Self {
            tracks: HashMap::new(),
        }
    }

    /// Add a track to the library, replacing any track with the same ID
    pub fn add_track(&mut self, track: Track) {
        self.tracks.insert(track.id.clone(), track);
    }

    /// Get a track by ID
    pub fn get_track(&self, id: &str) -> Option<&Track> {
        self.tracks.get(id)
    }

    /// Get all tracks
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Total number of tracks
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, title: &str) -> Track {
        Track {
            id: id.to_string(),
            title: title.to_string(),
            artist: "Test Artist".to_string(),
            album: "Test Album".to_string(),
            genre: Some("Electronic".to_string()),
            duration_ms: 180000,
            location: format!("afc://device/iPod_Control/Music/F00/{}.mp3", id),
            file_size: 5000000,
            track_number: Some(1),
            year: Some(2024),
            comment: None,
        }
    }

    #[test]
    fn test_library_creation() {
        let lib = Library::new();
        assert_eq!(lib.track_count(), 0);
    }

    #[test]
    fn test_add_track() {
        let mut lib = Library::new();
        lib.add_track(track("test123", "Test Song"));

        assert_eq!(lib.track_count(), 1);
        assert!(lib.get_track("test123").is_some());
        assert_eq!(lib.get_track("test123").unwrap().title, "Test Song");
    }

    #[test]
    fn test_add_track_replaces_same_id() {
        let mut lib = Library::new();
        lib.add_track(track("1", "Old"));
        lib.add_track(track("1", "New"));

        assert_eq!(lib.track_count(), 1);
        assert_eq!(lib.get_track("1").unwrap().title, "New");
    }

    #[test]
    fn test_clear() {
        let mut lib = Library::new();
        lib.add_track(track("1", "One"));
        lib.add_track(track("2", "Two"));
        assert_eq!(lib.track_count(), 2);

        lib.clear();
        assert_eq!(lib.track_count(), 0);
    }
}
