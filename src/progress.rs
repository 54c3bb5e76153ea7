//! Task progress notifications

/// Receives fire-and-forget "task started" notifications
pub trait ProgressSink: Send + Sync {
    fn task_started(&self, name: &str);
}

/// Progress sink that writes to the log
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn task_started(&self, name: &str) {
        log::info!("Task started: {}", name);
    }
}
