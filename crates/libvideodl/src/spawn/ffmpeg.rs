//! Module that contains all logic for spawning the "ffmpeg" command
use std::ffi::OsStr;
use std::process::Command;
use std::process::{
	Output,
	Stdio,
};
use std::sync::LazyLock;

use regex::Regex;

/// Binary name used when no explicit ffmpeg path is configured
pub const FFMPEG_BIN_NAME: &str = "ffmpeg";
/// Binary name used when no explicit ffprobe path is configured
pub const FFPROBE_BIN_NAME: &str = "ffprobe";

/// Create a Command with basic ffmpeg options
#[inline]
pub fn base_ffmpeg<P: AsRef<OsStr>>(ffmpeg_path: &P, overwrite: bool) -> Command {
	let mut cmd = Command::new(ffmpeg_path);

	if overwrite {
		cmd.arg("-y"); // always overwrite output path
	}

	// explicitly disable interactive mode
	cmd.arg("-nostdin");

	return cmd;
}

/// Create a Command with basic ffmpeg options
/// Calls [`base_ffmpeg`] and adds argument `-hide_banner`
#[inline]
pub fn base_ffmpeg_hidebanner<P: AsRef<OsStr>>(ffmpeg_path: &P, overwrite: bool) -> Command {
	let mut cmd = base_ffmpeg(ffmpeg_path, overwrite);

	cmd.arg("-hide_banner");

	return cmd;
}

/// Regex to parse the version from a "ffmpeg -version" output
/// cap1: version
static FFMPEG_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	return Regex::new(r"(?mi)^ffmpeg version ([a-z0-9.-]+) Copyright").unwrap();
});

/// Helper to consistently create a error
pub(crate) fn unsuccessful_command_exit(status: std::process::ExitStatus) -> crate::Error {
	return crate::Error::CommandNotSuccessful(format!(
		"FFMPEG did not successfully exit! Exit Code: {}",
		status.code().map_or("None".to_owned(), |v| return v.to_string())
	));
}

/// Get Version of `ffmpeg`
#[inline]
pub fn ffmpeg_version<P: AsRef<OsStr>>(ffmpeg_path: &P) -> Result<String, crate::Error> {
	let mut cmd = base_ffmpeg(ffmpeg_path, false);
	cmd.arg("-version");

	let command_output: Output = cmd
		.stderr(Stdio::null())
		.stdout(Stdio::piped())
		.stdin(Stdio::null())
		.spawn()?
		.wait_with_output()?;

	if !command_output.status.success() {
		return Err(unsuccessful_command_exit(command_output.status));
	}

	let as_string = String::from_utf8(command_output.stdout)?;

	return ffmpeg_parse_version(&as_string);
}

/// Internal Function to parse the input to a ffmpeg version with regex
#[inline]
fn ffmpeg_parse_version(input: &str) -> Result<String, crate::Error> {
	return Ok(FFMPEG_VERSION_REGEX
		.captures_iter(input)
		.next()
		.ok_or_else(|| return crate::Error::NoCapturesFound("FFMPEG Version could not be determined".to_owned()))?[1]
		.to_owned());
}

#[cfg(test)]
mod test {
	use super::ffmpeg_version;

	#[test]
	pub fn test_ffmpeg_parse_version_invalid_input() {
		assert_eq!(
			super::ffmpeg_parse_version("hello"),
			Err(crate::Error::NoCapturesFound(
				"FFMPEG Version could not be determined".to_owned()
			))
		);
	}

	#[test]
	pub fn test_ffmpeg_parse_version_valid_static_input() {
		let ffmpeg_output = "ffmpeg version n7.1 Copyright (c) 2000-2024 the FFmpeg developers
built with gcc 14.2.1 (GCC)
configuration: --prefix=/usr --disable-debug --enable-gpl --enable-libx264 --enable-libx265 --enable-libsvtav1 --enable-nvenc
libavutil      59. 39.100 / 59. 39.100
libavcodec     61. 19.100 / 61. 19.100
libavformat    61.  7.100 / 61.  7.100
";

		assert_eq!(super::ffmpeg_parse_version(ffmpeg_output), Ok("n7.1".to_owned()));
	}

	#[test]
	#[ignore = "CI Install not present currently"]
	pub fn test_ffmpeg_spawn() {
		assert!(ffmpeg_version(&super::FFMPEG_BIN_NAME).is_ok());
	}
}
