//! Module for the UI refresh coalescer

use std::{
	sync::{
		Condvar,
		Mutex,
		atomic::{
			AtomicBool,
			Ordering,
		},
	},
	time::Duration,
};

/// How long a wait on the flag lasts before re-checking the stop condition
const WAIT_GRANULARITY: Duration = Duration::from_millis(150);
/// Minimum pause between two flushes, caps the refresh rate at 5 per second
const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(200);

/// Dirty flag set by worker threads whenever displayed state changed.
///
/// Workers only ever set the flag; the coalescer loop is the single consumer
/// that clears it and posts one UI update per wake-up.
#[derive(Debug, Default)]
pub struct DirtyFlag {
	state:   Mutex<bool>,
	condvar: Condvar,
}

impl DirtyFlag {
	/// Create a new, clean flag
	#[must_use]
	pub fn new() -> Self {
		return Self {
			state:   Mutex::new(false),
			condvar: Condvar::new(),
		};
	}

	/// Mark the displayed state as changed and wake the coalescer
	pub fn set(&self) {
		let mut guard = self.state.lock().expect("dirty flag mutex poisoned");
		*guard = true;
		self.condvar.notify_one();
	}

	/// Wait up to [`WAIT_GRANULARITY`] for the flag, clearing it if set
	/// Returns whether the flag had been set
	pub fn wait_and_clear(&self) -> bool {
		let guard = self.state.lock().expect("dirty flag mutex poisoned");
		let (mut guard, _timeout) = self
			.condvar
			.wait_timeout_while(guard, WAIT_GRANULARITY, |dirty| return !*dirty)
			.expect("dirty flag mutex poisoned");

		let was_set = *guard;
		*guard = false;

		return was_set;
	}
}

/// Run the coalescer loop until `stop` is set.
///
/// Wakes on the dirty flag, posts exactly one flush, then sleeps the minimum
/// interval before re-waiting, so a callback firing 100 times a second still
/// yields at most 5 flushes a second. A final flush always happens after the
/// stop flag is observed so terminal state is never lost.
pub fn run_coalescer<F>(flag: &DirtyFlag, stop: &AtomicBool, mut flush: F)
where
	F: FnMut(),
{
	while !stop.load(Ordering::Acquire) {
		if flag.wait_and_clear() {
			flush();
			std::thread::sleep(MIN_FLUSH_INTERVAL);
		}
	}

	// final flush to deliver the terminal state promptly
	flag.wait_and_clear();
	flush();
}
