//! Module for hardware encoder discovery and selection

use std::{
	collections::HashSet,
	ffi::OsString,
	sync::OnceLock,
	time::Duration,
};

use crate::data::config::TargetVcodec;
use crate::traits::process_runner::ProcessRunner;

/// Platform encoder families, in selection priority order.
/// On typical hosts at most one hardware family is usable and the quality
/// delta between hardware families is negligible; CPU is the universal fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
	QuickSync,
	Nvenc,
	Amf,
	Apple,
	Raspberry,
	MediaCodec,
	Cpu,
}

/// One row of the encoder registry
#[derive(Debug, Clone, Copy)]
pub struct EncoderEntry {
	pub family:  PlatformFamily,
	/// Encoder binary name inside ffmpeg, [`None`] when the family cannot produce the target
	pub encoder: Option<&'static str>,
	/// Quality flags injected for high-resolution outputs
	pub quality: &'static [&'static str],
}

const fn entry(
	family: PlatformFamily,
	encoder: Option<&'static str>,
	quality: &'static [&'static str],
) -> EncoderEntry {
	return EncoderEntry {
		family,
		encoder,
		quality,
	};
}

/// Quality flags shared by the NVENC h264/hevc entries
const NVENC_QUALITY: &[&str] = &[
	"-preset:v",
	"p7",
	"-tune:v",
	"hq",
	"-rc:v",
	"vbr",
	"-cq:v",
	"19",
	"-b:v",
	"0",
	"-profile:v",
	"high",
];

/// Default ProRes quality block, also used at low resolutions
pub const PRORES_QUALITY: &[&str] = &["-profile:v", "0", "-qscale:v", "4"];

const X264_ENCODERS: &[EncoderEntry] = &[
	entry(
		PlatformFamily::QuickSync,
		Some("h264_qsv"),
		&["-global_quality", "20", "-look_ahead", "1"],
	),
	entry(PlatformFamily::Nvenc, Some("h264_nvenc"), NVENC_QUALITY),
	entry(PlatformFamily::Amf, Some("h264_amf"), &["-quality", "quality"]),
	entry(PlatformFamily::Apple, Some("h264_videotoolbox"), &["-q:v", "35"]),
	entry(PlatformFamily::Raspberry, Some("h264_v4l2m2m"), &[]),
	entry(PlatformFamily::MediaCodec, None, &[]),
	entry(PlatformFamily::Cpu, Some("libx264"), &["-crf", "20"]),
];

const X265_ENCODERS: &[EncoderEntry] = &[
	entry(
		PlatformFamily::QuickSync,
		Some("hevc_qsv"),
		&["-global_quality", "20", "-look_ahead", "1"],
	),
	entry(PlatformFamily::Nvenc, Some("hevc_nvenc"), NVENC_QUALITY),
	entry(PlatformFamily::Amf, Some("hevc_amf"), &["-quality", "quality"]),
	entry(PlatformFamily::Apple, Some("hevc_videotoolbox"), &["-q:v", "35"]),
	entry(PlatformFamily::Raspberry, Some("hevc_v4l2m2m"), &[]),
	entry(PlatformFamily::MediaCodec, None, &[]),
	entry(PlatformFamily::Cpu, Some("libx265"), &["-crf", "20"]),
];

const PRORES_ENCODERS: &[EncoderEntry] = &[
	entry(PlatformFamily::QuickSync, None, &[]),
	entry(PlatformFamily::Nvenc, None, &[]),
	entry(PlatformFamily::Amf, None, &[]),
	entry(PlatformFamily::Apple, Some("prores_videotoolbox"), PRORES_QUALITY),
	entry(PlatformFamily::Raspberry, None, &[]),
	entry(PlatformFamily::MediaCodec, None, &[]),
	entry(PlatformFamily::Cpu, Some("prores_ks"), PRORES_QUALITY),
];

const AV1_ENCODERS: &[EncoderEntry] = &[
	entry(PlatformFamily::QuickSync, Some("av1_qsv"), &[]),
	entry(PlatformFamily::Nvenc, Some("av1_nvenc"), &[]),
	entry(PlatformFamily::Amf, None, &[]),
	entry(PlatformFamily::Apple, None, &[]),
	entry(PlatformFamily::Raspberry, None, &[]),
	entry(PlatformFamily::MediaCodec, None, &[]),
	entry(PlatformFamily::Cpu, Some("libsvtav1"), &["-crf", "23"]),
];

/// Get the registry rows for a target codec, in selection priority order
#[must_use]
pub const fn registry_for(target: TargetVcodec) -> &'static [EncoderEntry] {
	return match target {
		TargetVcodec::X264 => X264_ENCODERS,
		TargetVcodec::X265 => X265_ENCODERS,
		TargetVcodec::ProRes => PRORES_ENCODERS,
		TargetVcodec::Av1 => AV1_ENCODERS,
	};
}

/// A usable encoder picked from the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedEncoder {
	pub name:    &'static str,
	pub family:  PlatformFamily,
	/// Quality flags, owned so the CRF adaptation can rewrite them
	pub quality: Vec<String>,
}

/// Process-wide cache of the encoders available in the host's ffmpeg build
static AVAILABLE_ENCODERS: OnceLock<HashSet<String>> = OnceLock::new();

/// Parse the output of "ffmpeg -encoders -hide_banner".
/// Encoder lines have exactly 6 capability flag characters as the first token
/// and the encoder name as the second; legend lines carry a "=" instead.
#[must_use]
pub fn parse_encoders_output(input: &str) -> HashSet<String> {
	let mut encoders = HashSet::new();

	for line in input.lines() {
		let mut parts = line.split_whitespace();
		let (Some(flags), Some(name)) = (parts.next(), parts.next()) else {
			continue;
		};

		if flags.len() == 6 && name != "=" {
			encoders.insert(name.to_owned());
		}
	}

	return encoders;
}

/// Query the host's ffmpeg for its available encoders, cached for process lifetime.
/// Failures (tool missing, timeout) yield the empty set so selection falls through to CPU.
pub fn available_encoders<P: AsRef<std::path::Path>>(
	runner: &dyn ProcessRunner,
	ffmpeg_path: P,
) -> &'static HashSet<String> {
	return AVAILABLE_ENCODERS.get_or_init(|| {
		let argv = [
			OsString::from(ffmpeg_path.as_ref()),
			OsString::from("-encoders"),
			OsString::from("-hide_banner"),
		];

		match runner.run(&argv, Some(Duration::from_secs(10))) {
			Ok(output) => {
				let encoders = parse_encoders_output(&output.stdout);
				info!("Found {} available encoders", encoders.len());

				return encoders;
			},
			Err(err) => {
				warn!("Could not query ffmpeg encoders: {err}");

				return HashSet::new();
			},
		}
	});
}

/// Pick the first registry entry whose encoder exists in the available set
pub fn select_encoder(target: TargetVcodec, available: &HashSet<String>) -> Result<SelectedEncoder, crate::Error> {
	for entry in registry_for(target) {
		let Some(encoder) = entry.encoder else {
			continue;
		};

		if available.contains(encoder) {
			info!("Selected encoder {encoder} ({:?}) for {}", entry.family, target.as_str());

			return Ok(SelectedEncoder {
				name:    encoder,
				family:  entry.family,
				quality: entry.quality.iter().map(|v| return (*v).to_owned()).collect(),
			});
		}
	}

	return Err(crate::Error::NoValidEncoder(target.as_str().to_owned()));
}

/// Determine the fastest usable encoder for the target codec.
///
/// The first available encoder in family order wins, hardware families rarely
/// coexist and their quality difference does not justify probing them all.
pub fn fastest_encoder<P: AsRef<std::path::Path>>(
	runner: &dyn ProcessRunner,
	ffmpeg_path: P,
	target: TargetVcodec,
) -> Result<SelectedEncoder, crate::Error> {
	return select_encoder(target, available_encoders(runner, ffmpeg_path));
}

/// Adapt a "-crf <n>" pair inside quality flags to the output height.
/// Above 1080p the CRF drops (better quality), at 720p and below it rises,
/// bounded to `[15, 30]`; flags without a CRF are returned unchanged.
#[must_use]
pub fn adapt_crf(flags: &[String], height: u32) -> Vec<String> {
	let mut adapted: Vec<String> = flags.to_vec();

	let Some(crf_idx) = adapted.iter().position(|v| return v == "-crf") else {
		return adapted;
	};

	let Some(value) = adapted.get(crf_idx + 1).and_then(|v| return v.parse::<i32>().ok()) else {
		return adapted;
	};

	let new_value = if height > 1080 {
		(value - 2).max(15)
	} else if height <= 720 {
		(value + 3).min(30)
	} else {
		value
	};

	adapted[crf_idx + 1] = new_value.to_string();

	return adapted;
}
