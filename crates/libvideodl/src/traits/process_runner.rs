//! Module for the external-tool execution seam

use std::{
	ffi::OsString,
	time::Duration,
};

/// Host-agnostic result of a completed process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
	/// Exit code, [`None`] when the process was terminated by a signal
	pub code:   Option<i32>,
	pub stdout: String,
	pub stderr: String,
}

impl ProcessOutput {
	/// Check if the process exited with code 0
	#[must_use]
	pub fn success(&self) -> bool {
		return self.code == Some(0);
	}
}

/// Abstraction over process execution, swappable per host.
///
/// Desktop hosts shell out via [`std::process`]
/// (see [`spawn::runner::DesktopRunner`](crate::spawn::runner::DesktopRunner)),
/// other hosts route through their own process-builder equivalent. Probing
/// and encoder discovery depend only on this trait.
pub trait ProcessRunner: Send + Sync {
	/// Run to completion with captured output and a optional timeout
	fn run(&self, argv: &[OsString], timeout: Option<Duration>) -> Result<ProcessOutput, crate::Error>;

	/// Spawn, wait for exit and capture stdout / stderr
	fn popen_communicate(&self, argv: &[OsString]) -> Result<ProcessOutput, crate::Error>;
}
