//! Module that contains all logic for spawning the "yt-dlp" command
use std::process::{
	Command,
	Output,
	Stdio,
};
use std::sync::LazyLock;

use regex::Regex;

/// Binary name of the extractor
pub const YTDL_BIN_NAME: &str = "yt-dlp";

#[inline]
pub fn base_ytdl() -> Command {
	return Command::new(YTDL_BIN_NAME);
}

/// Regex to parse the version from a "yt-dlp --version" output
/// cap1: version (date)
static YTDL_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	return Regex::new(r"(?mi)^(\d{4}\.\d{1,2}\.\d{1,2})").unwrap();
});

/// Get Version of `yt-dlp`
#[inline]
pub fn ytdl_version() -> Result<String, crate::Error> {
	let mut cmd = base_ytdl();
	cmd.arg("--version");

	let command_output: Output = cmd
		.stderr(Stdio::null())
		.stdout(Stdio::piped())
		.stdin(Stdio::null())
		.spawn()?
		.wait_with_output()?;

	if !command_output.status.success() {
		return Err(crate::Error::CommandNotSuccessful(
			"YTDL did not successfully exit!".to_owned(),
		));
	}

	let as_string = String::from_utf8(command_output.stdout)?;

	return ytdl_parse_version(&as_string);
}

/// Internal Function to parse the input to a yt-dlp version with regex
#[inline]
fn ytdl_parse_version(input: &str) -> Result<String, crate::Error> {
	return Ok(YTDL_VERSION_REGEX
		.captures_iter(input)
		.next()
		.ok_or_else(|| return crate::Error::NoCapturesFound("YTDL Version could not be determined".to_owned()))?[1]
		.to_owned());
}

/// Convert a version string like "2024.03.10" to a date for comparisons
#[must_use]
pub fn version_as_date(version: &str) -> Option<chrono::NaiveDate> {
	let mut parts = version.split('.');
	let year = parts.next()?.parse::<i32>().ok()?;
	let month = parts.next()?.parse::<u32>().ok()?;
	let day = parts.next()?.parse::<u32>().ok()?;

	return chrono::NaiveDate::from_ymd_opt(year, month, day);
}
