//! Module for the desktop implementation of the process-runner seam

use std::{
	ffi::OsString,
	process::{
		Command,
		Stdio,
	},
	time::{
		Duration,
		Instant,
	},
};

use crate::traits::process_runner::{
	ProcessOutput,
	ProcessRunner,
};

/// Desktop implementation, delegates to [`std::process`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopRunner;

impl DesktopRunner {
	#[must_use]
	pub fn new() -> Self {
		return Self;
	}
}

impl ProcessRunner for DesktopRunner {
	fn run(&self, argv: &[OsString], timeout: Option<Duration>) -> Result<ProcessOutput, crate::Error> {
		let (program, args) = split_argv(argv)?;

		let mut child = Command::new(program)
			.args(args)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()?;

		if let Some(timeout) = timeout {
			let start = Instant::now();

			// std::process offers no waiting with a timeout, so poll in small steps
			loop {
				if child.try_wait()?.is_some() {
					break;
				}

				if start.elapsed() > timeout {
					child.kill()?;
					let _ = child.wait();

					return Err(crate::Error::CommandNotSuccessful(format!(
						"\"{}\" did not exit within {}s",
						program.to_string_lossy(),
						timeout.as_secs()
					)));
				}

				std::thread::sleep(Duration::from_millis(100));
			}
		}

		let output = child.wait_with_output()?;

		return Ok(ProcessOutput {
			code:   output.status.code(),
			stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
			stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
		});
	}

	fn popen_communicate(&self, argv: &[OsString]) -> Result<ProcessOutput, crate::Error> {
		return self.run(argv, None);
	}
}

/// Split a argv into program and arguments
fn split_argv(argv: &[OsString]) -> Result<(&OsString, &[OsString]), crate::Error> {
	let Some((program, args)) = argv.split_first() else {
		return Err(crate::Error::other("Cannot run a empty argv"));
	};

	return Ok((program, args));
}
