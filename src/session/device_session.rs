//! Device session orchestration
//!
//! Sequences copy-in, load, mutations and copy-out for one attached device,
//! and brackets the session with the device-lock token handshake.

use super::config::SyncConfig;
use super::state::SessionState;
use super::worker::{Worker, WorkerCommand, WorkerContext, WorkerEvent};
use crate::device::{allocate_unused_path, DeviceConnection, DeviceConnector};
use crate::encoder;
use crate::error::{Result, SyncError};
use crate::itdb::Database;
use crate::loader::{track_from_record, LoadedDatabase};
use crate::model::{Library, Track};
use crate::progress::{LogProgress, ProgressSink};
use crate::transfer::{local_database_path, Transfer};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::mpsc::TryRecvError;
use std::sync::Arc;
use tempfile::TempDir;

const COPY_IN_FAILED: &str = "An error occurred copying the database from the device";
const COPY_OUT_FAILED: &str = "An error occurred copying the database onto the device";

/// One sync session with an attached device
pub struct DeviceSession {
    host: String,
    config: SyncConfig,
    connector: Arc<dyn DeviceConnector>,
    progress: Arc<dyn ProgressSink>,
    state: SessionState,

    /// Exclusively owned working directory, removed on close
    scratch: Option<TempDir>,

    /// Background worker, alive only while copying in and loading
    worker: Option<Worker>,

    /// Set once loading succeeds; only touched from the session's thread
    db: Option<Database>,

    /// Tracks visible to callers
    library: Library,
}

impl DeviceSession {
    pub fn new(host: &str, connector: Arc<dyn DeviceConnector>, config: SyncConfig) -> Self {
        Self {
            host: host.to_string(),
            config,
            connector,
            progress: Arc::new(LogProgress),
            state: SessionState::Uninitialized,
            scratch: None,
            worker: None,
            db: None,
            library: Library::new(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn scratch_path(&self) -> Option<&Path> {
        self.scratch.as_ref().map(|dir| dir.path())
    }

    /// Tracks currently visible on the device
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.library.tracks()
    }

    pub fn track_count(&self) -> usize {
        self.library.track_count()
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn database(&self) -> Option<&Database> {
        self.db.as_ref()
    }

    /// Begin copying the device database into scratch storage
    ///
    /// Returns as soon as the copy is queued on the worker thread. Use
    /// [`poll`](Self::poll) or [`wait`](Self::wait) to follow progress.
    pub fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Uninitialized || self.scratch.is_some() {
            return Err(SyncError::AlreadyStarted(self.host.clone()));
        }

        let scratch = tempfile::Builder::new()
            .prefix(&self.config.scratch_prefix)
            .tempdir()
            .map_err(|e| SyncError::IoFailure(format!("Failed to create scratch directory: {}", e)))?;
        log::info!("Session {}: scratch directory {:?}", self.host, scratch.path());

        let worker = Worker::spawn(WorkerContext {
            host: self.host.clone(),
            local_path: scratch.path().to_path_buf(),
            database_path: self.config.database_path.clone(),
            first_time: self.config.first_time,
            connector: self.connector.clone(),
        })
        .map_err(|e| SyncError::IoFailure(format!("Failed to start worker: {}", e)))?;

        let queued = worker.send(WorkerCommand::CopyFromDevice);
        self.scratch = Some(scratch);
        self.worker = Some(worker);
        self.set_state(SessionState::CopyingIn);

        if !queued {
            self.worker_lost();
        }
        Ok(())
    }

    /// Handle any worker results that have arrived, without blocking
    pub fn poll(&mut self) -> &SessionState {
        while self.state.is_pending() {
            let received = match &self.worker {
                Some(worker) => worker.try_recv(),
                None => Err(TryRecvError::Disconnected),
            };
            match received {
                Ok(event) => self.handle_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.worker_lost(),
            }
        }
        &self.state
    }

    /// Block until the database is loaded or the session has failed
    pub fn wait(&mut self) -> Result<()> {
        while self.state.is_pending() {
            let event = match &self.worker {
                Some(worker) => worker.recv().ok(),
                None => None,
            };
            match event {
                Some(event) => self.handle_event(event),
                None => self.worker_lost(),
            }
        }

        match &self.state {
            SessionState::Ready => Ok(()),
            SessionState::Failed(error) => Err(error.clone()),
            other => Err(SyncError::InvalidState {
                operation: "wait for the database",
                state: other.to_string(),
            }),
        }
    }

    fn handle_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::TaskStarted(name) => self.progress.task_started(&name),
            WorkerEvent::CopyFinished(success) => self.copy_finished(success),
            WorkerEvent::LoadFinished(Ok(loaded)) => self.load_finished(loaded),
            WorkerEvent::LoadFinished(Err(message)) => {
                self.stop_worker();
                self.fail(SyncError::LoadFailure(message));
            }
        }
    }

    fn copy_finished(&mut self, success: bool) {
        if !success {
            self.stop_worker();
            self.fail(SyncError::TransferFailure(COPY_IN_FAILED.to_string()));
            return;
        }

        // Keep the device from starting its own sync while the local copy is
        // the working copy
        if let Err(e) = self.set_device_lock(None) {
            log::error!("Session {}: failed to clear device lock: {:#}", self.host, e);
            self.stop_worker();
            self.fail(SyncError::TransferFailure(COPY_IN_FAILED.to_string()));
            return;
        }

        let music_path_prefix = self.config.music_path_prefix(&self.host);
        let queued = self
            .worker
            .as_ref()
            .map(|w| w.send(WorkerCommand::LoadDatabase { music_path_prefix }))
            .unwrap_or(false);

        if queued {
            self.set_state(SessionState::Loading);
        } else {
            self.worker_lost();
        }
    }

    fn load_finished(&mut self, loaded: LoadedDatabase) {
        self.stop_worker();

        let LoadedDatabase { mut db, tracks } = loaded;
        db.set_sysinfo(&self.config.lock_key, None);

        self.library.clear();
        for track in tracks {
            self.library.add_track(track);
        }
        self.db = Some(db);

        log::info!(
            "Session {}: {} tracks visible",
            self.host,
            self.library.track_count()
        );
        self.set_state(SessionState::Ready);
    }

    fn worker_lost(&mut self) {
        self.stop_worker();
        let error = match self.state {
            SessionState::Loading => SyncError::LoadFailure("worker stopped unexpectedly".into()),
            _ => SyncError::TransferFailure(COPY_IN_FAILED.to_string()),
        };
        self.fail(error);
    }

    /// Copy a local file onto the device and add it to the database
    ///
    /// Returns `Ok(false)` if no device path could be allocated or the file
    /// could not be streamed; in both cases the new record is removed again.
    pub fn copy_to_storage(
        &mut self,
        source: &Path,
        metadata: &Track,
        remove_original: bool,
    ) -> Result<bool> {
        if !self.is_ready() {
            return Err(self.invalid_state("copy to storage"));
        }
        let music_path_prefix = self.config.music_path_prefix(&self.host);
        let Some(db) = self.db.as_mut() else {
            return Err(SyncError::InvalidState {
                operation: "copy to storage",
                state: "ready without a database".to_string(),
            });
        };

        let id = db.add_track(encoder::new_record(metadata));

        let connection = match self.connector.connect(&self.host) {
            Ok(connection) => connection,
            Err(e) => {
                db.remove_track(id);
                log::warn!("{}", SyncError::IoFailure(format!("{:#}", e)));
                return Ok(false);
            }
        };

        let music_dirs = match connection.music_dir_count() {
            0 => self.config.music_dir_count,
            n => n,
        };
        let Some(dest) = allocate_unused_path(connection.as_ref(), db, metadata, music_dirs) else {
            db.remove_track(id);
            log::warn!("{}", SyncError::PathAllocationFailure(metadata.location.clone()));
            return Ok(false);
        };

        if let Err(e) = stream_file(connection.as_ref(), source, &dest) {
            db.remove_track(id);
            if connection.exists(&dest) {
                if let Err(e) = connection.remove(&dest) {
                    log::warn!("Failed to remove partial file {}: {:#}", dest, e);
                }
            }
            log::warn!("{}", SyncError::IoFailure(format!("{:#}", e)));
            return Ok(false);
        }

        let Some(record) = db.track_mut(id) else {
            return Ok(false);
        };
        encoder::finish_record(record, &dest);

        if let Some(track) = track_from_record(record, &music_path_prefix) {
            log::info!("Copied {:?} to {}", source, track.location);
            self.library.add_track(track);
        }

        if remove_original {
            if let Err(e) = fs::remove_file(source) {
                log::warn!("Failed to remove original {:?}: {}", source, e);
            }
        }

        Ok(true)
    }

    /// Removing files from the device is not supported by this session
    pub fn delete_from_storage(&self, track: &Track) -> bool {
        log::debug!("Delete from storage not supported: {}", track.location);
        false
    }

    /// Write the database back to the device
    ///
    /// Re-applies the device-lock token, serializes the database and copies
    /// it out on the calling thread. If the copy fails the device token is
    /// cleared again so the device does not trust a stale database.
    pub fn finalise(&mut self) -> Result<()> {
        if !self.is_ready() {
            return Err(self.invalid_state("finalise"));
        }
        let Some(scratch) = self.scratch.as_ref().map(|d| d.path().to_path_buf()) else {
            return Err(self.invalid_state("finalise"));
        };
        self.set_state(SessionState::Finalizing);

        let host = self.host.clone();
        let lock_key = self.config.lock_key.clone();
        let local = local_database_path(&scratch, &self.config.database_path);

        let mut success = match self.set_device_lock(Some(&host)) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Session {}: failed to set device lock: {:#}", host, e);
                false
            }
        };

        if let Some(db) = self.db.as_mut() {
            db.set_sysinfo(&lock_key, Some(&host));
            db.start_sync();
            if success {
                if let Err(e) = db.serialize(&local) {
                    log::error!("Session {}: {:#}", host, e);
                    success = false;
                }
            }
            if success {
                success = Transfer::new(
                    &host,
                    &scratch,
                    &self.config.database_path,
                    self.connector.clone(),
                )
                .with_progress(self.progress.clone())
                .copy_to_device();
            }
            db.stop_sync();
        }

        if !success {
            if let Err(e) = self.set_device_lock(None) {
                log::warn!("Session {}: failed to clear device lock: {:#}", host, e);
            }
            let error = SyncError::TransferFailure(COPY_OUT_FAILED.to_string());
            self.fail(error.clone());
            return Err(error);
        }

        self.set_state(SessionState::Closed);
        Ok(())
    }

    /// Stop the worker and delete the scratch directory
    pub fn close(&mut self) -> Result<()> {
        self.stop_worker();
        self.db = None;
        self.library.clear();

        if let Some(scratch) = self.scratch.take() {
            let path = scratch.path().to_path_buf();
            scratch.close().map_err(|e| {
                SyncError::IoFailure(format!("Failed to remove scratch directory {:?}: {}", path, e))
            })?;
            log::debug!("Session {}: removed {:?}", self.host, path);
        }

        self.set_state(SessionState::Closed);
        Ok(())
    }

    fn set_device_lock(&self, value: Option<&str>) -> anyhow::Result<()> {
        let connection = self.connector.connect(&self.host)?;
        connection.set_sysinfo(&self.config.lock_key, value)
    }

    fn stop_worker(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            log::info!("Session {}: {} -> {}", self.host, self.state, state);
            self.state = state;
        }
    }

    fn fail(&mut self, error: SyncError) {
        log::error!("Session {}: {}", self.host, error);
        self.set_state(SessionState::Failed(error));
    }

    fn invalid_state(&self, operation: &'static str) -> SyncError {
        SyncError::InvalidState {
            operation,
            state: self.state.to_string(),
        }
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            log::debug!("Session for {} dropped while {}", self.host, self.state);
        }
        self.stop_worker();
    }
}

/// Stream a local file into a new device file
fn stream_file(connection: &dyn DeviceConnection, source: &Path, dest: &str) -> anyhow::Result<u64> {
    use anyhow::Context;

    let mut input = File::open(source)
        .with_context(|| format!("Failed to open source file: {:?}", source))?;
    let mut output = connection.open_write(dest)?;
    let bytes = io::copy(&mut input, &mut output)
        .with_context(|| format!("Failed to copy {:?} to {}", source, dest))?;
    output.flush()?;
    Ok(bytes)
}
