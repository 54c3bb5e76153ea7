//! Background worker shared sequentially by the transfer and the loader
//!
//! The session owns the worker. Commands go in over one channel, results
//! come back over another; the worker never holds a reference to the
//! session, and the database handle is moved back to the session inside
//! `LoadFinished`.

use crate::device::DeviceConnector;
use crate::loader::{DatabaseLoader, LoadedDatabase};
use crate::progress::ProgressSink;
use crate::transfer::Transfer;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub(crate) enum WorkerCommand {
    CopyFromDevice,
    LoadDatabase { music_path_prefix: String },
}

pub(crate) enum WorkerEvent {
    TaskStarted(String),
    CopyFinished(bool),
    LoadFinished(Result<LoadedDatabase, String>),
}

/// Everything the worker needs, moved onto its thread
pub(crate) struct WorkerContext {
    pub host: String,
    pub local_path: PathBuf,
    pub database_path: String,
    pub first_time: bool,
    pub connector: Arc<dyn DeviceConnector>,
}

/// Forwards progress notifications over the event channel
struct ChannelProgress {
    events: Sender<WorkerEvent>,
}

impl ProgressSink for ChannelProgress {
    fn task_started(&self, name: &str) {
        // Session gone means nobody is listening
        let _ = self.events.send(WorkerEvent::TaskStarted(name.to_string()));
    }
}

pub(crate) struct Worker {
    commands: Option<Sender<WorkerCommand>>,
    events: Receiver<WorkerEvent>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(ctx: WorkerContext) -> io::Result<Self> {
        let (commands_tx, commands_rx) = mpsc::channel();
        let (events_tx, events_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name(format!("device-sync-{}", ctx.host))
            .spawn(move || run(ctx, commands_rx, events_tx))?;

        Ok(Self {
            commands: Some(commands_tx),
            events: events_rx,
            handle: Some(handle),
        })
    }

    /// Queue a command; false if the worker has stopped
    pub fn send(&self, command: WorkerCommand) -> bool {
        match &self.commands {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        }
    }

    pub fn try_recv(&self) -> Result<WorkerEvent, TryRecvError> {
        self.events.try_recv()
    }

    pub fn recv(&self) -> Result<WorkerEvent, RecvError> {
        self.events.recv()
    }

    /// Stop accepting commands and wait for the thread to exit
    pub fn shutdown(&mut self) {
        self.commands.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Device sync worker panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(ctx: WorkerContext, commands: Receiver<WorkerCommand>, events: Sender<WorkerEvent>) {
    log::debug!("Worker started for {}", ctx.host);
    let progress: Arc<dyn ProgressSink> = Arc::new(ChannelProgress {
        events: events.clone(),
    });

    for command in commands {
        let event = match command {
            WorkerCommand::CopyFromDevice => {
                let transfer = Transfer::new(
                    &ctx.host,
                    &ctx.local_path,
                    &ctx.database_path,
                    ctx.connector.clone(),
                )
                .with_progress(progress.clone())
                .with_first_time(ctx.first_time);

                WorkerEvent::CopyFinished(transfer.copy_from_device())
            }
            WorkerCommand::LoadDatabase { music_path_prefix } => {
                let result = DatabaseLoader::new(&ctx.local_path, &ctx.database_path)
                    .with_music_path_prefix(music_path_prefix)
                    .with_progress(progress.clone())
                    .load()
                    .map_err(|e| format!("{:#}", e));

                WorkerEvent::LoadFinished(result)
            }
        };

        if events.send(event).is_err() {
            break;
        }
    }

    log::debug!("Worker stopped for {}", ctx.host);
}
