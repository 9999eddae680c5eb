//! Module for the remux / re-encode decision and the transcode runner

use std::{
	ffi::OsString,
	io::{
		BufRead,
		BufReader,
	},
	path::{
		Path,
		PathBuf,
	},
	process::{
		Command,
		Stdio,
	},
	sync::LazyLock,
};

use regex::Regex;

use crate::{
	data::{
		config::{
			TargetVcodec,
			VcodecMode,
		},
		progress::{
			ProgressEvent,
			ProgressPhase,
			ProgressStatus,
			RUNNING_FRACTION_CAP,
		},
	},
	main::{
		hwaccel,
		hwaccel::SelectedEncoder,
		probe::ProbeInfo,
	},
	sync::CancelToken,
	traits::{
		process_runner::ProcessRunner,
		sinks::ProgressSink,
	},
};

/// Resolve a probed video codec name to the registry target it already satisfies.
/// Unknown codecs resolve to x264, the universal re-encode target.
#[must_use]
pub fn vcodec_name_to_target(codec_name: &str) -> TargetVcodec {
	return match codec_name.to_lowercase().as_str() {
		"avc1" | "h264" => TargetVcodec::X264,
		"hevc" | "h265" => TargetVcodec::X265,
		"prores" => TargetVcodec::ProRes,
		_ => TargetVcodec::X264,
	};
}

/// Canonical ffprobe codec name for a registry target
#[must_use]
pub fn target_to_vcodec_name(target: TargetVcodec) -> &'static str {
	return match target {
		TargetVcodec::X264 => "avc1",
		TargetVcodec::X265 => "hevc",
		TargetVcodec::ProRes => "prores",
		TargetVcodec::Av1 => "av1",
	};
}

/// Whether the transcode is a pure rewrap or changes stream data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeAction {
	Remux,
	Reencode,
}

impl EncodeAction {
	/// Display label for progress events
	#[must_use]
	pub fn label(&self) -> &'static str {
		return match self {
			Self::Remux => "Remuxing",
			Self::Reencode => "Re-encoding",
		};
	}
}

/// Per-file outcome of the decision table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeDecision {
	pub copy_video:    bool,
	pub copy_audio:    bool,
	pub target_vcodec: TargetVcodec,
	/// Output extension, ".mov" only for ProRes
	pub extension:     &'static str,
	pub action:        EncodeAction,
}

/// Decide per stream whether to copy or re-encode for the given target mode.
/// Returns [`None`] for [`VcodecMode::Best`], which skips post-processing entirely.
#[must_use]
pub fn decide(mode: VcodecMode, probe: &ProbeInfo) -> Option<EncodeDecision> {
	let (copy_video, copy_audio, target_vcodec) = match mode {
		VcodecMode::Best => return None,
		VcodecMode::Original => (true, true, vcodec_name_to_target(&probe.vcodec)),
		VcodecMode::Nle => {
			let audio_ok = probe.acodec_nle_compatible();

			if probe.vcodec_nle_compatible() {
				(true, audio_ok, vcodec_name_to_target(&probe.vcodec))
			} else {
				(false, audio_ok, TargetVcodec::X264)
			}
		},
		VcodecMode::Target(target) => {
			let video_matches = target_to_vcodec_name(target) == probe.vcodec.to_lowercase();

			(video_matches, probe.acodec_nle_compatible(), target)
		},
	};

	let extension = if target_vcodec == TargetVcodec::ProRes { ".mov" } else { ".mp4" };
	let action = if copy_video && copy_audio {
		EncodeAction::Remux
	} else {
		EncodeAction::Reencode
	};

	return Some(EncodeDecision {
		copy_video,
		copy_audio,
		target_vcodec,
		extension,
		action,
	});
}

/// Temp output path for a transcode: `<stem>.tmp<new_ext>`
#[must_use]
pub fn tmp_path_for(input: &Path, extension: &str) -> PathBuf {
	let stem = input.with_extension("");

	let mut as_os = stem.into_os_string();
	as_os.push(".tmp");
	as_os.push(extension);

	return PathBuf::from(as_os);
}

/// Final output path for a transcode: `<stem><new_ext>`
#[must_use]
pub fn final_path_for(input: &Path, extension: &str) -> PathBuf {
	let mut as_os = input.with_extension("").into_os_string();
	as_os.push(extension);

	return PathBuf::from(as_os);
}

/// Assemble the transcode argument vector, in the fixed order the tool expects
#[must_use]
pub fn build_transcode_args(
	ffmpeg_path: &Path,
	input: &Path,
	tmp_path: &Path,
	decision: &EncodeDecision,
	encoder: Option<&SelectedEncoder>,
	big_dimension: bool,
	height: u32,
) -> Vec<OsString> {
	let mut args: Vec<OsString> = vec![
		ffmpeg_path.into(),
		"-hide_banner".into(),
		"-i".into(),
		input.into(),
		"-c:a".into(),
		if decision.copy_audio { "copy".into() } else { "aac".into() },
		"-c:v".into(),
		match encoder {
			Some(encoder) => encoder.name.into(),
			None => "copy".into(),
		},
		"-metadata".into(),
		"creation_time=now".into(),
	];

	if big_dimension {
		let quality = encoder.map_or_else(Vec::new, |v| return hwaccel::adapt_crf(&v.quality, height));
		args.extend(quality.into_iter().map(OsString::from));
	} else if decision.target_vcodec == TargetVcodec::ProRes {
		args.extend(hwaccel::PRORES_QUALITY.iter().map(OsString::from));
	}

	args.push("-progress".into());
	args.push("pipe:1".into());
	args.push("-y".into());
	args.push(tmp_path.into());

	return args;
}

/// Regex for the bitrate key of the "-progress pipe:1" stream, e.g. "bitrate=4423.1kbits/s"
static BITRATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	return Regex::new(r"^\s*([\d.]+)kbits/s").unwrap();
});

/// Incremental parser for the tool's "-progress pipe:1" key-value stream.
///
/// Values accumulate until a "progress=" line closes the block, then one
/// event is emitted for the block.
#[derive(Debug)]
pub struct TranscodeProgress {
	duration_secs: u64,
	action:        EncodeAction,
	out_time_us:   Option<u64>,
	total_size:    Option<u64>,
	speed_bps:     Option<f64>,
}

impl TranscodeProgress {
	#[must_use]
	pub fn new(duration_secs: u64, action: EncodeAction) -> Self {
		return Self {
			duration_secs,
			action,
			out_time_us: None,
			total_size: None,
			speed_bps: None,
		};
	}

	/// Feed one line of the progress stream; returns a event when a block completed
	pub fn handle_line(&mut self, line: &str) -> Option<ProgressEvent> {
		let (key, value) = line.split_once('=')?;

		match key.trim() {
			// out_time_ms is in microseconds despite its name
			"out_time_ms" | "out_time_us" => {
				self.out_time_us = value.trim().parse::<u64>().ok();
			},
			"out_time" => {
				// fallback for builds that only emit the timestamp form
				if self.out_time_us.is_none() {
					self.out_time_us = parse_out_time_us(value.trim());
				}
			},
			"total_size" => {
				self.total_size = value.trim().parse::<u64>().ok();
			},
			"bitrate" => {
				self.speed_bps = BITRATE_REGEX
					.captures(value.trim())
					.and_then(|cap| return cap[1].parse::<f64>().ok())
					.map(|kbits| return kbits * 1000.0 / 8.0);
			},
			"progress" => return Some(self.emit()),
			_ => (),
		}

		return None;
	}

	/// Build the event for the current block
	fn emit(&mut self) -> ProgressEvent {
		let mut event = ProgressEvent::new(ProgressPhase::Process, ProgressStatus::Processing);

		if let Some(out_time_us) = self.out_time_us {
			if self.duration_secs > 0 {
				#[allow(clippy::cast_precision_loss)]
				let fraction = (out_time_us as f64 / 1_000_000.0) / self.duration_secs as f64;
				event.progress_fraction = Some(fraction.clamp(0.0, RUNNING_FRACTION_CAP));
			}
		}

		event.processed_bytes = self.total_size;
		event.speed_bps = self.speed_bps;
		event.action_label = Some(self.action.label().to_owned());

		return event;
	}
}

/// Parse a "HH:MM:SS.micro" out_time value to microseconds
fn parse_out_time_us(input: &str) -> Option<u64> {
	let (hms, micros) = input.split_once('.').unwrap_or((input, "0"));
	let mut parts = hms.split(':');

	let hours = parts.next()?.parse::<u64>().ok()?;
	let minutes = parts.next()?.parse::<u64>().ok()?;
	let seconds = parts.next()?.parse::<u64>().ok()?;
	let micros = micros.parse::<u64>().ok()?;

	return Some(((hours * 3600 + minutes * 60 + seconds) * 1_000_000) + micros);
}

/// Remove the temp file after a observed cancellation, ignoring a missing file
pub fn cleanup_cancelled(tmp_path: &Path) {
	if tmp_path.is_file() {
		std::fs::remove_file(tmp_path).unwrap_or_else(|err| {
			warn!("Failed to remove cancelled temp file: {err}");
		});
	}
}

/// Atomically swap the finished temp file into place.
/// The input file is removed and the temp renamed to `<stem><new_ext>`,
/// replacing any previous output at that path.
pub fn finalize_transcode(input: &Path, tmp_path: &Path, extension: &str) -> Result<PathBuf, crate::Error> {
	if !tmp_path.is_file() {
		return Err(crate::Error::TranscodeFailed {
			code:   Some(0),
			stderr: format!("Output file \"{}\" does not exist", tmp_path.to_string_lossy()),
		});
	}

	let final_path = final_path_for(input, extension);

	std::fs::remove_file(input)?;
	std::fs::rename(tmp_path, &final_path)?;

	return Ok(final_path);
}

/// Probe the file and post-process it according to the target mode.
/// [`VcodecMode::Best`] returns immediately without even probing.
pub fn post_process_dl<P: AsRef<Path>>(
	full_path: P,
	mode: VcodecMode,
	cancel: &CancelToken,
	progress: &dyn ProgressSink,
	runner: &dyn ProcessRunner,
	ffmpeg_path: &Path,
	ffprobe_path: &Path,
) -> Result<(), crate::Error> {
	if mode == VcodecMode::Best {
		return Ok(());
	}

	let full_path = full_path.as_ref();
	let probe = crate::main::probe::ffprobe(runner, ffprobe_path, full_path)?;

	let Some(decision) = decide(mode, &probe) else {
		return Ok(());
	};

	let encoder = if decision.copy_video {
		None
	} else {
		Some(hwaccel::fastest_encoder(runner, ffmpeg_path, decision.target_vcodec)?)
	};

	return run_transcode(full_path, &decision, encoder.as_ref(), &probe, cancel, progress, ffmpeg_path);
}

/// Run the transcode process with live progress capture and the atomic swap
fn run_transcode(
	input: &Path,
	decision: &EncodeDecision,
	encoder: Option<&SelectedEncoder>,
	probe: &ProbeInfo,
	cancel: &CancelToken,
	progress: &dyn ProgressSink,
	ffmpeg_path: &Path,
) -> Result<(), crate::Error> {
	let tmp_path = tmp_path_for(input, decision.extension);
	let args = build_transcode_args(
		ffmpeg_path,
		input,
		&tmp_path,
		decision,
		encoder,
		probe.big_dimension(),
		probe.height.unwrap_or(0),
	);

	debug!("Transcode command: {args:?}");

	let (program, rest) = args
		.split_first()
		.expect("Expected the transcode argv to contain the program");

	let mut child = Command::new(program)
		.args(rest)
		.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()?;

	// drain stderr on a separate thread so a chatty tool cannot deadlock the pipe
	let stderr_handle = child.stderr.take().map(|stderr| {
		return std::thread::spawn(move || {
			let mut collected = String::new();
			for line in BufReader::new(stderr).lines().map_while(Result::ok) {
				trace!("ffmpeg [STDERR]: \"{line}\"");
				collected.push_str(&line);
				collected.push('\n');
			}

			return collected;
		});
	});

	let mut tracker = TranscodeProgress::new(probe.duration_secs, decision.action);
	let mut was_cancelled = false;

	if let Some(stdout) = child.stdout.take() {
		for line in BufReader::new(stdout).lines().map_while(Result::ok) {
			if cancel.is_cancelled() {
				was_cancelled = true;
				child.kill()?;
				break;
			}

			if let Some(event) = tracker.handle_line(&line) {
				progress.on_process_progress(&event);
			}
		}
	}

	let status = child.wait()?;
	let stderr = stderr_handle
		.and_then(|handle| return handle.join().ok())
		.unwrap_or_default();

	if was_cancelled || cancel.is_cancelled() {
		cleanup_cancelled(&tmp_path);

		return Ok(());
	}

	if !status.success() {
		return Err(crate::Error::TranscodeFailed {
			code: status.code(),
			stderr,
		});
	}

	finalize_transcode(input, &tmp_path, decision.extension)?;

	let mut finished = ProgressEvent::finished(ProgressPhase::Process);
	finished.action_label = Some(decision.action.label().to_owned());
	progress.on_process_progress(&finished);

	return Ok(());
}

#[cfg(test)]
mod test {
	use super::*;

	fn probe(vcodec: &str, acodec: &str, width: u32, height: u32) -> ProbeInfo {
		return ProbeInfo {
			vcodec:        vcodec.to_owned(),
			acodec:        acodec.to_owned(),
			width:         Some(width),
			height:        Some(height),
			duration_secs: 120,
		};
	}

	mod decide {
		use super::*;

		#[test]
		fn test_best_skips_post_processing() {
			assert_eq!(decide(VcodecMode::Best, &probe("vp9", "opus", 1920, 1080)), None);
		}

		#[test]
		fn test_original_copies_both() {
			let decision = decide(VcodecMode::Original, &probe("hevc", "opus", 1920, 1080))
				.expect("Expected a decision");

			assert!(decision.copy_video);
			assert!(decision.copy_audio);
			assert_eq!(decision.target_vcodec, TargetVcodec::X265);
			assert_eq!(decision.extension, ".mp4");
			assert_eq!(decision.action, EncodeAction::Remux);
		}

		#[test]
		fn test_nle_compatible_input_remuxes() {
			let decision =
				decide(VcodecMode::Nle, &probe("h264", "aac", 1920, 1080)).expect("Expected a decision");

			assert!(decision.copy_video);
			assert!(decision.copy_audio);
			assert_eq!(decision.target_vcodec, TargetVcodec::X264);
			assert_eq!(decision.action, EncodeAction::Remux);
		}

		#[test]
		fn test_nle_incompatible_audio_reencodes_audio_only() {
			let decision =
				decide(VcodecMode::Nle, &probe("h264", "opus", 1920, 1080)).expect("Expected a decision");

			assert!(decision.copy_video);
			assert!(!decision.copy_audio);
			assert_eq!(decision.action, EncodeAction::Reencode);
		}

		#[test]
		fn test_nle_incompatible_video_targets_x264() {
			let decision =
				decide(VcodecMode::Nle, &probe("vp9", "opus", 1920, 1080)).expect("Expected a decision");

			assert!(!decision.copy_video);
			assert!(!decision.copy_audio);
			assert_eq!(decision.target_vcodec, TargetVcodec::X264);
			assert_eq!(decision.extension, ".mp4");
			assert_eq!(decision.action, EncodeAction::Reencode);
		}

		#[test]
		fn test_specific_target_matching_input_copies() {
			let decision = decide(
				VcodecMode::Target(TargetVcodec::X265),
				&probe("hevc", "aac", 1920, 1080),
			)
			.expect("Expected a decision");

			assert!(decision.copy_video);
			assert!(decision.copy_audio);
			assert_eq!(decision.target_vcodec, TargetVcodec::X265);
		}

		#[test]
		fn test_specific_target_different_input_reencodes() {
			let decision = decide(
				VcodecMode::Target(TargetVcodec::Av1),
				&probe("h264", "aac", 1920, 1080),
			)
			.expect("Expected a decision");

			assert!(!decision.copy_video);
			assert!(decision.copy_audio);
			assert_eq!(decision.target_vcodec, TargetVcodec::Av1);
		}

		#[test]
		fn test_prores_uses_mov_extension() {
			let decision = decide(
				VcodecMode::Target(TargetVcodec::ProRes),
				&probe("h264", "aac", 1920, 1080),
			)
			.expect("Expected a decision");

			assert_eq!(decision.extension, ".mov");
		}

		#[test]
		fn test_acodec_copy_follows_nle_compat_independently() {
			let decision = decide(
				VcodecMode::Target(TargetVcodec::X264),
				&probe("vp9", "vorbis", 1920, 1080),
			)
			.expect("Expected a decision");

			assert!(!decision.copy_video);
			assert!(!decision.copy_audio);
		}
	}

	mod codec_maps {
		use super::*;

		#[test]
		fn test_vcodec_name_to_target() {
			assert_eq!(vcodec_name_to_target("avc1"), TargetVcodec::X264);
			assert_eq!(vcodec_name_to_target("h264"), TargetVcodec::X264);
			assert_eq!(vcodec_name_to_target("HEVC"), TargetVcodec::X265);
			assert_eq!(vcodec_name_to_target("prores"), TargetVcodec::ProRes);
			// unknown codecs resolve to the universal target
			assert_eq!(vcodec_name_to_target("vp9"), TargetVcodec::X264);
		}

		#[test]
		fn test_target_to_vcodec_name() {
			assert_eq!(target_to_vcodec_name(TargetVcodec::X264), "avc1");
			assert_eq!(target_to_vcodec_name(TargetVcodec::X265), "hevc");
			assert_eq!(target_to_vcodec_name(TargetVcodec::ProRes), "prores");
			assert_eq!(target_to_vcodec_name(TargetVcodec::Av1), "av1");
		}
	}

	mod paths {
		use super::*;

		#[test]
		fn test_tmp_path() {
			assert_eq!(
				tmp_path_for(Path::new("/dl/video.webm"), ".mp4"),
				PathBuf::from("/dl/video.tmp.mp4")
			);
		}

		#[test]
		fn test_final_path_changes_extension() {
			assert_eq!(
				final_path_for(Path::new("/dl/video.webm"), ".mp4"),
				PathBuf::from("/dl/video.mp4")
			);
			assert_eq!(
				final_path_for(Path::new("/dl/video.mp4"), ".mov"),
				PathBuf::from("/dl/video.mov")
			);
		}
	}

	mod transcode_args {
		use super::*;

		fn decision_remux() -> EncodeDecision {
			return EncodeDecision {
				copy_video:    true,
				copy_audio:    true,
				target_vcodec: TargetVcodec::X264,
				extension:     ".mp4",
				action:        EncodeAction::Remux,
			};
		}

		fn as_strings(args: &[OsString]) -> Vec<String> {
			return args.iter().map(|v| return v.to_string_lossy().into_owned()).collect();
		}

		#[test]
		fn test_remux_args_order() {
			let args = build_transcode_args(
				Path::new("ffmpeg"),
				Path::new("/dl/in.mp4"),
				Path::new("/dl/in.tmp.mp4"),
				&decision_remux(),
				None,
				false,
				1080,
			);

			assert_eq!(
				as_strings(&args),
				vec![
					"ffmpeg",
					"-hide_banner",
					"-i",
					"/dl/in.mp4",
					"-c:a",
					"copy",
					"-c:v",
					"copy",
					"-metadata",
					"creation_time=now",
					"-progress",
					"pipe:1",
					"-y",
					"/dl/in.tmp.mp4",
				]
			);
		}

		#[test]
		fn test_quality_flags_only_above_1080() {
			let decision = EncodeDecision {
				copy_video:    false,
				copy_audio:    true,
				target_vcodec: TargetVcodec::X264,
				extension:     ".mp4",
				action:        EncodeAction::Reencode,
			};
			let encoder = SelectedEncoder {
				name:    "libx264",
				family:  hwaccel::PlatformFamily::Cpu,
				quality: vec!["-crf".to_owned(), "20".to_owned()],
			};

			let args_small = build_transcode_args(
				Path::new("ffmpeg"),
				Path::new("/dl/in.webm"),
				Path::new("/dl/in.tmp.mp4"),
				&decision,
				Some(&encoder),
				false,
				1080,
			);
			let small = as_strings(&args_small);
			assert!(!small.contains(&"-crf".to_owned()));

			let args_big = build_transcode_args(
				Path::new("ffmpeg"),
				Path::new("/dl/in.webm"),
				Path::new("/dl/in.tmp.mp4"),
				&decision,
				Some(&encoder),
				true,
				2160,
			);
			let big = as_strings(&args_big);
			let crf_idx = big.iter().position(|v| return v == "-crf").expect("Expected -crf");
			// CRF adapted for the 4k output
			assert_eq!(big[crf_idx + 1], "18");
		}

		#[test]
		fn test_prores_quality_at_small_dimension() {
			let decision = EncodeDecision {
				copy_video:    false,
				copy_audio:    true,
				target_vcodec: TargetVcodec::ProRes,
				extension:     ".mov",
				action:        EncodeAction::Reencode,
			};
			let encoder = SelectedEncoder {
				name:    "prores_ks",
				family:  hwaccel::PlatformFamily::Cpu,
				quality: hwaccel::PRORES_QUALITY.iter().map(|v| return (*v).to_owned()).collect(),
			};

			let args = build_transcode_args(
				Path::new("ffmpeg"),
				Path::new("/dl/in.mp4"),
				Path::new("/dl/in.tmp.mov"),
				&decision,
				Some(&encoder),
				false,
				1080,
			);
			let strings = as_strings(&args);

			let profile_idx = strings
				.iter()
				.position(|v| return v == "-profile:v")
				.expect("Expected -profile:v");
			assert_eq!(strings[profile_idx + 1], "0");
			assert_eq!(strings[profile_idx + 2], "-qscale:v");
			assert_eq!(strings[profile_idx + 3], "4");
		}

		#[test]
		fn test_audio_reencode_uses_aac() {
			let decision = EncodeDecision {
				copy_audio: false,
				..decision_remux()
			};

			let args = build_transcode_args(
				Path::new("ffmpeg"),
				Path::new("/dl/in.mp4"),
				Path::new("/dl/in.tmp.mp4"),
				&decision,
				None,
				false,
				1080,
			);
			let strings = as_strings(&args);
			let ca_idx = strings.iter().position(|v| return v == "-c:a").expect("Expected -c:a");
			assert_eq!(strings[ca_idx + 1], "aac");
		}
	}

	mod transcode_progress {
		use super::*;

		#[test]
		fn test_block_emits_one_event() {
			let mut tracker = TranscodeProgress::new(120, EncodeAction::Remux);

			assert_eq!(tracker.handle_line("frame=100"), None);
			assert_eq!(tracker.handle_line("out_time_ms=60000000"), None);
			assert_eq!(tracker.handle_line("total_size=1048576"), None);
			assert_eq!(tracker.handle_line("bitrate=4000.0kbits/s"), None);

			let event = tracker
				.handle_line("progress=continue")
				.expect("Expected a event on the progress key");

			assert_eq!(event.phase, ProgressPhase::Process);
			assert_eq!(event.progress_fraction, Some(0.5));
			assert_eq!(event.processed_bytes, Some(1_048_576));
			assert_eq!(event.speed_bps, Some(500_000.0));
			assert_eq!(event.action_label.as_deref(), Some("Remuxing"));
		}

		#[test]
		fn test_fraction_clamped_while_running() {
			let mut tracker = TranscodeProgress::new(60, EncodeAction::Reencode);

			// out_time beyond the probed duration must cap below 1.0
			tracker.handle_line("out_time_ms=90000000");
			let event = tracker.handle_line("progress=continue").expect("Expected a event");
			assert_eq!(event.progress_fraction, Some(0.99));
		}

		#[test]
		fn test_out_time_fallback_parse() {
			let mut tracker = TranscodeProgress::new(120, EncodeAction::Remux);

			tracker.handle_line("out_time=00:00:30.000000");
			let event = tracker.handle_line("progress=continue").expect("Expected a event");
			assert_eq!(event.progress_fraction, Some(0.25));
		}

		#[test]
		fn test_garbage_lines_ignored() {
			let mut tracker = TranscodeProgress::new(120, EncodeAction::Remux);

			assert_eq!(tracker.handle_line("not a key value line"), None);
			assert_eq!(tracker.handle_line("unknown_key=5"), None);
		}

		#[test]
		fn test_zero_duration_emits_no_fraction() {
			let mut tracker = TranscodeProgress::new(0, EncodeAction::Remux);

			tracker.handle_line("out_time_ms=1000000");
			let event = tracker.handle_line("progress=continue").expect("Expected a event");
			assert_eq!(event.progress_fraction, None);
		}
	}

	mod swap {
		use super::*;

		#[test]
		fn test_finalize_replaces_input() {
			let dir = tempfile::Builder::new()
				.prefix("videodl-test-encode-")
				.tempdir()
				.expect("Expected a temp dir to be created");

			let input = dir.path().join("video.webm");
			let tmp = dir.path().join("video.tmp.mp4");
			std::fs::write(&input, b"input data").expect("Expected input write");
			std::fs::write(&tmp, b"transcoded data").expect("Expected tmp write");

			let final_path = finalize_transcode(&input, &tmp, ".mp4").expect("Expected the swap to succeed");

			assert_eq!(final_path, dir.path().join("video.mp4"));
			assert!(final_path.is_file());
			assert!(!input.exists());
			assert!(!tmp.exists());
		}

		#[test]
		fn test_finalize_missing_tmp_fails() {
			let dir = tempfile::Builder::new()
				.prefix("videodl-test-encode-")
				.tempdir()
				.expect("Expected a temp dir to be created");

			let input = dir.path().join("video.webm");
			std::fs::write(&input, b"input data").expect("Expected input write");

			let result = finalize_transcode(&input, &dir.path().join("video.tmp.mp4"), ".mp4");
			assert!(matches!(result, Err(crate::Error::TranscodeFailed { .. })));
			// the input must stay untouched on failure
			assert!(input.is_file());
		}

		#[test]
		fn test_cleanup_cancelled_removes_tmp() {
			let dir = tempfile::Builder::new()
				.prefix("videodl-test-encode-")
				.tempdir()
				.expect("Expected a temp dir to be created");

			let tmp = dir.path().join("video.tmp.mp4");
			std::fs::write(&tmp, b"partial data").expect("Expected tmp write");

			cleanup_cancelled(&tmp);
			assert!(!tmp.exists());

			// a second cleanup on a missing file must be a no-op
			cleanup_cancelled(&tmp);
		}
	}
}
