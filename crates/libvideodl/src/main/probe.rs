//! Module for probing downloaded files via ffprobe

use std::{
	ffi::OsString,
	path::Path,
};

use serde::Deserialize;

use crate::traits::process_runner::ProcessRunner;

/// Video codecs editors import without transcoding
pub const NLE_COMPATIBLE_VCODECS: &[&str] = &["avc1", "h264", "hevc", "h265", "prores"];
/// Audio codecs editors import without transcoding
pub const NLE_COMPATIBLE_ACODECS: &[&str] = &["aac", "mp3", "mp4a", "pcm_s16le", "pcm_s24le"];

/// One stream as reported by ffprobe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FfprobeStream {
	#[serde(default)]
	pub codec_type: String,
	#[serde(default)]
	pub codec_name: String,
	pub width:      Option<u32>,
	pub height:     Option<u32>,
}

/// Container-level information as reported by ffprobe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FfprobeFormat {
	pub duration: Option<String>,
}

/// Raw deserialized "-of json" output
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FfprobeOutput {
	#[serde(default)]
	pub streams: Vec<FfprobeStream>,
	#[serde(default)]
	pub format:  FfprobeFormat,
}

/// Distilled probe result of a downloaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeInfo {
	/// Video codec name, "na" when the file has no video stream
	pub vcodec:        String,
	/// Audio codec name, "na" when the file has no audio stream
	pub acodec:        String,
	pub width:         Option<u32>,
	pub height:        Option<u32>,
	pub duration_secs: u64,
}

impl ProbeInfo {
	/// Check if the video codec imports into editors without transcoding
	#[must_use]
	pub fn vcodec_nle_compatible(&self) -> bool {
		return NLE_COMPATIBLE_VCODECS.contains(&self.vcodec.to_lowercase().as_str());
	}

	/// Check if the audio codec imports into editors without transcoding
	#[must_use]
	pub fn acodec_nle_compatible(&self) -> bool {
		return NLE_COMPATIBLE_ACODECS.contains(&self.acodec.to_lowercase().as_str());
	}

	/// Check if the smaller video dimension is above 1080
	#[must_use]
	pub fn big_dimension(&self) -> bool {
		let (Some(width), Some(height)) = (self.width, self.height) else {
			return false;
		};

		return width.min(height) > 1080;
	}
}

/// Condense a deserialized ffprobe output into a [`ProbeInfo`]
pub fn condense_probe_output(output: &FfprobeOutput) -> Result<ProbeInfo, crate::Error> {
	let duration_str = output
		.format
		.duration
		.as_deref()
		.ok_or_else(|| return crate::Error::ProbeFailed("Probe output has no duration".to_owned()))?;

	let duration = duration_str
		.parse::<f64>()
		.map_err(|_| return crate::Error::ProbeFailed(format!("Probe duration \"{duration_str}\" is not numeric")))?;

	let mut info = ProbeInfo {
		vcodec:        "na".to_owned(),
		acodec:        "na".to_owned(),
		width:         None,
		height:        None,
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		duration_secs: duration.max(0.0) as u64,
	};

	for stream in &output.streams {
		match stream.codec_type.as_str() {
			"audio" => {
				info.acodec = stream.codec_name.clone();
			},
			"video" => {
				info.vcodec = stream.codec_name.clone();
				info.width = stream.width;
				info.height = stream.height;
			},
			_ => (),
		}
	}

	return Ok(info);
}

/// Parse the JSON output of a ffprobe run
pub fn parse_probe_json(input: &str) -> Result<ProbeInfo, crate::Error> {
	let output: FfprobeOutput = serde_json::from_str(input)
		.map_err(|err| return crate::Error::ProbeFailed(format!("Probe output is not valid JSON: {err}")))?;

	return condense_probe_output(&output);
}

/// Probe the given file for stream and duration information
pub fn ffprobe<P: AsRef<Path>>(
	runner: &dyn ProcessRunner,
	ffprobe_path: P,
	file: P,
) -> Result<ProbeInfo, crate::Error> {
	let argv = [
		OsString::from(ffprobe_path.as_ref()),
		OsString::from("-show_format"),
		OsString::from("-show_streams"),
		OsString::from("-of"),
		OsString::from("json"),
		OsString::from(file.as_ref()),
	];

	let output = runner.popen_communicate(&argv)?;

	if !output.success() {
		return Err(crate::Error::ProbeFailed(format!(
			"ffprobe exited with code {:?}: {}",
			output.code, output.stderr
		)));
	}

	return parse_probe_json(&output.stdout);
}
