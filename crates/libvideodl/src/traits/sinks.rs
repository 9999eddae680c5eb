//! Module for the host-facing progress and status callbacks

use crate::data::progress::ProgressEvent;

/// Receiver for progress updates from the download and process phases.
///
/// Implementations are invoked from worker threads and must be thread-safe.
/// Callbacks must never block the caller for more than a few milliseconds;
/// long work belongs behind the refresh coalescer
/// ([`sync::dirty`](crate::sync::dirty)).
pub trait ProgressSink: Send + Sync {
	/// A update from the extraction / download phase
	fn on_download_progress(&self, event: &ProgressEvent);
	/// A update from the probe / transcode phase
	fn on_process_progress(&self, event: &ProgressEvent);
}

/// Receiver for human-readable phase text ("Extracting cookies...", "Fetching video info...")
pub trait StatusSink: Send + Sync {
	fn on_status(&self, message: &str);
}

/// No-op sinks for hosts that do not display one of the channels
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
	fn on_download_progress(&self, _event: &ProgressEvent) {}

	fn on_process_progress(&self, _event: &ProgressEvent) {}
}

impl StatusSink for NullSink {
	fn on_status(&self, _message: &str) {}
}
