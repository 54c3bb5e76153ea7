//! Session configuration

/// Configuration for a device sync session
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Device-relative path of the library database
    pub database_path: String,

    /// Number of `Fnn` music directories to spread new files across when
    /// the device does not report its own
    pub music_dir_count: u32,

    /// Sysinfo key holding the device-lock token
    pub lock_key: String,

    /// Scheme of visible track locations (`<scheme>://<host>/...`)
    pub url_scheme: String,

    /// Name prefix for the scratch directory
    pub scratch_prefix: String,

    /// First sync with this device: a missing device database is created
    /// empty instead of failing the session
    pub first_time: bool,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self {
            database_path: "/iPod_Control/iTunes/iTunesDB".to_string(),
            music_dir_count: 20,
            lock_key: "FirewireGuid".to_string(),
            url_scheme: "afc".to_string(),
            scratch_prefix: "device-sync-".to_string(),
            first_time: false,
        }
    }

    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = path.into();
        self
    }

    pub fn with_music_dirs(mut self, count: u32) -> Self {
        self.music_dir_count = count;
        self
    }

    pub fn with_first_time(mut self, first_time: bool) -> Self {
        self.first_time = first_time;
        self
    }

    /// Location prefix for tracks on `host`
    pub fn music_path_prefix(&self, host: &str) -> String {
        format!("{}://{}", self.url_scheme, host)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
