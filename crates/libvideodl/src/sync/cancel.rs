//! Module for the cooperative cancellation token

use std::sync::{
	Arc,
	atomic::{
		AtomicBool,
		Ordering,
	},
};

/// Cooperative cancellation signal shared between the orchestrator and its workers.
///
/// Once set, the token stays set for its whole life; a new token is created per
/// download session. Consumers poll [`CancelToken::is_cancelled`] at phase boundaries
/// and inside progress callbacks, it is a single atomic load and safe for tight loops.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	/// Create a new, un-cancelled token
	#[must_use]
	pub fn new() -> Self {
		return Self(Arc::new(AtomicBool::new(false)));
	}

	/// Request cancellation, idempotent and thread-safe
	pub fn cancel(&self) {
		self.0.store(true, Ordering::Release);
	}

	/// Check if cancellation has been requested
	#[must_use]
	pub fn is_cancelled(&self) -> bool {
		return self.0.load(Ordering::Acquire);
	}

	/// Return [`Error::Cancelled`](crate::Error::Cancelled) if the token is set
	pub fn err_if_cancelled(&self) -> Result<(), crate::Error> {
		if self.is_cancelled() {
			return Err(crate::Error::Cancelled);
		}

		return Ok(());
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_starts_uncancelled() {
		let token = CancelToken::new();
		assert!(!token.is_cancelled());
		assert!(token.err_if_cancelled().is_ok());
	}

	#[test]
	fn test_cancel_is_monotone() {
		let token = CancelToken::new();
		token.cancel();
		assert!(token.is_cancelled());
		// a second cancel must not change anything
		token.cancel();
		assert!(token.is_cancelled());
		assert_eq!(token.err_if_cancelled(), Err(crate::Error::Cancelled));
	}

	#[test]
	fn test_clones_share_state() {
		let token = CancelToken::new();
		let cloned = token.clone();
		token.cancel();
		assert!(cloned.is_cancelled());
	}

	#[test]
	fn test_visible_across_threads() {
		let token = CancelToken::new();
		let cloned = token.clone();
		let handle = std::thread::spawn(move || {
			cloned.cancel();
		});
		handle.join().expect("Expected the thread to join");
		assert!(token.is_cancelled());
	}
}
