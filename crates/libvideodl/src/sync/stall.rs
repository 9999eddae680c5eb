//! Module for the download stall watchdog

use std::{
	sync::Mutex,
	time::{
		Duration,
		Instant,
	},
};

/// Tracks whether the extractor is making progress.
///
/// Every progress hook invocation and every matched log line calls [`StallDetector::tick`];
/// the driver polls [`StallDetector::is_stalled`] to decide when to reap and retry.
#[derive(Debug)]
pub struct StallDetector {
	stall_timeout: Duration,
	last_activity: Mutex<Instant>,
}

impl StallDetector {
	/// Create a new detector with the given timeout, starting from "now"
	#[must_use]
	pub fn new(stall_timeout: Duration) -> Self {
		return Self {
			stall_timeout,
			last_activity: Mutex::new(Instant::now()),
		};
	}

	/// Signal activity, resets the stall clock
	pub fn tick(&self) {
		let mut guard = self.last_activity.lock().expect("stall detector mutex poisoned");
		*guard = Instant::now();
	}

	/// Check if more than the configured timeout has elapsed since the last tick
	#[must_use]
	pub fn is_stalled(&self) -> bool {
		let guard = self.last_activity.lock().expect("stall detector mutex poisoned");

		return guard.elapsed() > self.stall_timeout;
	}
}
