//! Database file transfer between a device and scratch storage
//!
//! Copies exactly one file, the library database, in either direction.
//! Every failure collapses to `false`; the cause is logged.

use crate::device::DeviceConnector;
use crate::itdb::Database;
use crate::progress::ProgressSink;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Location of the working database copy inside a scratch directory
///
/// Mirrors the device layout, e.g. `<scratch>/iPod_Control/iTunes/iTunesDB`.
pub fn local_database_path(scratch: &Path, database_path: &str) -> PathBuf {
    scratch.join(database_path.trim_start_matches('/'))
}

/// One database copy job
pub struct Transfer {
    host: String,
    local_path: PathBuf,
    database_path: String,
    connector: Arc<dyn DeviceConnector>,
    progress: Option<Arc<dyn ProgressSink>>,
    first_time: bool,
}

impl Transfer {
    pub fn new(
        host: &str,
        local_path: &Path,
        database_path: &str,
        connector: Arc<dyn DeviceConnector>,
    ) -> Self {
        Self {
            host: host.to_string(),
            local_path: local_path.to_path_buf(),
            database_path: database_path.to_string(),
            connector,
            progress: None,
            first_time: false,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Start from an empty database if the device has none yet
    pub fn with_first_time(mut self, first_time: bool) -> Self {
        self.first_time = first_time;
        self
    }

    /// Copy the database from the device into scratch storage
    pub fn copy_from_device(&self) -> bool {
        if let Some(progress) = &self.progress {
            progress.task_started("Copying database from device");
        }

        match self.try_copy_from_device() {
            Ok(bytes) => {
                log::info!("Copied database from {} ({} bytes)", self.host, bytes);
                true
            }
            Err(e) => {
                log::error!("Copy from device {} failed: {:#}", self.host, e);
                false
            }
        }
    }

    /// Copy the database from scratch storage back onto the device
    pub fn copy_to_device(&self) -> bool {
        if let Some(progress) = &self.progress {
            progress.task_started("Copying database to device");
        }

        match self.try_copy_to_device() {
            Ok(bytes) => {
                log::info!("Copied database to {} ({} bytes)", self.host, bytes);
                true
            }
            Err(e) => {
                log::error!("Copy to device {} failed: {:#}", self.host, e);
                false
            }
        }
    }

    fn try_copy_from_device(&self) -> Result<u64> {
        let connection = self.connector.connect(&self.host)?;
        let local = local_database_path(&self.local_path, &self.database_path);
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        if self.first_time && !connection.exists(&self.database_path) {
            log::info!("No database on {} yet, starting from an empty one", self.host);
            Database::new().serialize(&local)?;
            return Ok(0);
        }

        let mut source = connection.open_read(&self.database_path)?;
        let mut dest = File::create(&local)
            .with_context(|| format!("Failed to create local database: {:?}", local))?;
        let bytes = io::copy(&mut source, &mut dest)
            .with_context(|| format!("Failed to read {} from device", self.database_path))?;
        Ok(bytes)
    }

    fn try_copy_to_device(&self) -> Result<u64> {
        let connection = self.connector.connect(&self.host)?;
        let local = local_database_path(&self.local_path, &self.database_path);

        let mut source = File::open(&local)
            .with_context(|| format!("Failed to open local database: {:?}", local))?;
        let mut dest = connection.open_write(&self.database_path)?;
        let bytes = io::copy(&mut source, &mut dest)
            .with_context(|| format!("Failed to write {} to device", self.database_path))?;
        dest.flush()?;
        Ok(bytes)
    }
}
