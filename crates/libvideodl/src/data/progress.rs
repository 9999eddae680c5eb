//! Module for progress events and progress math

/// Which pipeline phase a event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
	/// Extraction / download via the extractor
	Download,
	/// Probing / remuxing / re-encoding via the external media tool
	Process,
}

/// Coarse state of the reporting phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
	Downloading,
	Processing,
	Finished,
}

/// A single progress update, emitted from worker threads into a
/// [`ProgressSink`](crate::traits::sinks::ProgressSink).
///
/// All payload fields are optional, a event carries whatever the source line
/// contained. Sinks must not block on these, see the sink contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
	pub phase:                ProgressPhase,
	pub status:               ProgressStatus,
	/// Bytes already downloaded / written
	pub processed_bytes:      Option<u64>,
	/// Exact total size, when the source knows it
	pub total_bytes:          Option<u64>,
	/// Estimated total size, when only a estimate is known
	pub total_bytes_estimate: Option<u64>,
	/// Current speed in bytes per second
	pub speed_bps:            Option<f64>,
	/// Fraction in `[0.0, 1.0]`, `1.0` only on the finished event
	pub progress_fraction:    Option<f64>,
	/// Display label of the running action ("Remuxing" / "Re-encoding")
	pub action_label:         Option<String>,
	/// Position inside a playlist, 1-based
	pub playlist_index:       Option<usize>,
	/// Total entries of the playlist
	pub playlist_count:       Option<usize>,
}

impl ProgressEvent {
	/// Create a empty event for the given phase and status
	#[must_use]
	pub fn new(phase: ProgressPhase, status: ProgressStatus) -> Self {
		return Self {
			phase,
			status,
			processed_bytes: None,
			total_bytes: None,
			total_bytes_estimate: None,
			speed_bps: None,
			progress_fraction: None,
			action_label: None,
			playlist_index: None,
			playlist_count: None,
		};
	}

	/// Create a finished event for the given phase, fraction pinned to `1.0`
	#[must_use]
	pub fn finished(phase: ProgressPhase) -> Self {
		let mut event = Self::new(phase, ProgressStatus::Finished);
		event.progress_fraction = Some(1.0);

		return event;
	}
}

/// Highest fraction reported while a phase is still running.
///
/// The terminal "finished" event carries `1.0` instead, see [`ProgressEvent::finished`].
pub const RUNNING_FRACTION_CAP: f64 = 0.99;

/// Compute the progress-bar fraction and the new "last known" fraction.
///
/// A explicitly provided fraction wins and does not move the last-known value.
/// Otherwise the fraction is derived from processed / total and clamped so a
/// running phase never displays full; a unusable total keeps the last value.
#[must_use]
pub fn compute_progress(
	progress_fraction: Option<f64>,
	processed: Option<u64>,
	total: Option<u64>,
	last_fraction: f64,
) -> (f64, f64) {
	if let Some(fraction) = progress_fraction {
		return (fraction, last_fraction);
	}

	let (Some(processed), Some(total)) = (processed, total) else {
		return (last_fraction, last_fraction);
	};

	if total == 0 {
		return (last_fraction, last_fraction);
	}

	#[allow(clippy::cast_precision_loss)] // file sizes stay far below 2^52 bytes
	let fraction = (processed as f64 / total as f64).clamp(0.0, RUNNING_FRACTION_CAP);

	return (fraction, fraction);
}
