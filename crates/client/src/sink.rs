//! Progress reporting seam between the poller and whatever presents
//! progress to the user.

use aivoice_core::job_status::StatusPayload;
use aivoice_core::types::TaskId;
use tokio::sync::mpsc;

/// One progress report from a polling session.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub task_id: TaskId,
    /// Current step as reported by the server.
    pub message: Option<String>,
    /// New progress percentage. Only set when it differs from the last
    /// reported value.
    pub progress: Option<i64>,
}

/// Receives progress reports from the poller.
///
/// Called from inside the polling loop, so implementations must not
/// block. A sink shared between concurrent sessions receives interleaved
/// calls; [`ProgressUpdate::task_id`] tells them apart.
pub trait ProgressSink: Send + Sync {
    fn report(&self, update: &ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: &ProgressUpdate) {
        self(update)
    }
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _update: &ProgressUpdate) {}
}

/// Logs every report at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn report(&self, update: &ProgressUpdate) {
        tracing::info!(
            task_id = %update.task_id,
            progress = update.progress,
            detail = update.message.as_deref().unwrap_or(""),
            "Job progress",
        );
    }
}

/// Forwards reports over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn report(&self, update: &ProgressUpdate) {
        // Receiver gone means nobody is watching any more.
        let _ = self.tx.send(update.clone());
    }
}

/// Decides which status payloads produce a progress report.
///
/// A payload is reported when it carries a message, or when its
/// progress differs from the last progress reported. The first observed
/// progress value always counts as a change.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last_progress: Option<i64>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, task_id: &TaskId, payload: &StatusPayload) -> Option<ProgressUpdate> {
        let progress = payload
            .progress
            .filter(|p| self.last_progress != Some(*p));

        if let Some(p) = progress {
            self.last_progress = Some(p);
        }

        if progress.is_none() && payload.message.is_none() {
            return None;
        }

        Some(ProgressUpdate {
            task_id: task_id.clone(),
            message: payload.message.clone(),
            progress,
        })
    }
}
