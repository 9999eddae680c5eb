//! Module for driving the extractor through extraction and download

use std::{
	collections::HashSet,
	io::{
		BufRead,
		BufReader,
	},
	time::{
		Duration,
		Instant,
	},
};

use parse_linetype::{
	Marker,
	YtdlLine,
	try_get_status,
};

use crate::{
	data::{
		config::DownloadConfig,
		media::MediaEntry,
		progress::{
			ProgressEvent,
			ProgressPhase,
			ProgressStatus,
		},
	},
	error::IOErrorToError,
	main::options::{
		YtdlOpts,
		build_download_opts,
	},
	spawn::ytdl::YTDL_BIN_NAME,
	sync::{
		CancelToken,
		StallDetector,
	},
	traits::{
		process_runner::ProcessRunner,
		sinks::{
			ProgressSink,
			StatusSink,
		},
	},
};

pub mod assemble_cmd;
pub mod parse_linetype;
pub mod reap;

pub use assemble_cmd::assemble_ytdl_command;

/// Seconds without any progress-hook or log activity before a attempt counts as hung
pub const STALL_TIMEOUT: Duration = Duration::from_secs(120);
/// Maximum extraction attempts per URL
pub const MAX_RETRIES: u32 = 3;
/// Backoff before the first retry, doubles each further retry
pub const BASE_BACKOFF: Duration = Duration::from_secs(5);
/// How long the driver waits between checks of the worker / cancel / stall state
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// The minimal yt-dlp version expected to be used.
///
/// 2023.3.24 is the date "--no-quiet" was added, which the line parsing relies on.
pub const MINIMAL_YTDL_VERSION: chrono::NaiveDate = chrono::NaiveDate::from_ymd_opt(2023, 3, 24).unwrap();

/// Warn if a version lower than the minimal is used
pub fn warn_minimal_version(ytdl_version: &str) {
	let Some(as_date) = crate::spawn::ytdl::version_as_date(ytdl_version) else {
		warn!("Could not interpret {YTDL_BIN_NAME} version \"{ytdl_version}\" as a date");
		return;
	};

	if as_date < MINIMAL_YTDL_VERSION {
		warn!(
			"Used {} version ({}) is lower than the recommended minimal {}",
			YTDL_BIN_NAME,
			as_date.format("%Y.%m.%d"),
			MINIMAL_YTDL_VERSION.format("%Y.%m.%d"),
		);
	}
}

/// Outcome of a single extraction attempt
enum AttemptOutcome {
	/// The extractor ran to completion (successfully or with a extractor error)
	Completed(Result<Vec<MediaEntry>, crate::Error>),
	/// The stall watchdog fired, children were reaped and the attempt should be retried
	Stalled,
}

/// A extractor session for one batch of URLs.
///
/// The option map is built once per session and reused across URLs, so
/// expensive extractor-side setup (like cookie extraction) happens once.
#[derive(Debug)]
pub struct YtdlSession {
	config: DownloadConfig,
	opts:   YtdlOpts,
}

impl YtdlSession {
	/// Create a new session for the given, validated configuration
	pub fn new(config: DownloadConfig) -> Result<Self, crate::Error> {
		config.validate()?;

		let opts = build_download_opts(&config);

		return Ok(Self { config, opts });
	}

	/// The configuration this session was created with
	#[must_use]
	pub fn config(&self) -> &DownloadConfig {
		return &self.config;
	}

	/// The option map this session runs with
	#[must_use]
	pub fn opts(&self) -> &YtdlOpts {
		return &self.opts;
	}

	/// Download a single URL and post-process every downloaded media.
	/// Assumes yt-dlp and ffmpeg have already been checked to exist and work
	/// (like using [`crate::spawn::ytdl::ytdl_version`]).
	pub fn download_url(
		&self,
		url: &str,
		cancel: &CancelToken,
		progress: &dyn ProgressSink,
		status: &dyn StatusSink,
		runner: &dyn ProcessRunner,
	) -> Result<Vec<MediaEntry>, crate::Error> {
		let entries = self.download_with_retries(url, cancel, progress, status)?;

		cancel.err_if_cancelled()?;

		if entries.is_empty() {
			return Err(crate::Error::PlaylistNotFound);
		}

		// the finished download event always precedes the first process event
		progress.on_download_progress(&ProgressEvent::finished(ProgressPhase::Download));

		if self.config.audio_only {
			// codec conversion happened through the extractor's audio post-processor
			return Ok(entries);
		}

		for entry in &entries {
			cancel.err_if_cancelled()?;

			let Some(filepath) = &entry.filepath else {
				warn!("Media \"{}\" has no known file path, skipping post-processing", entry.id);
				continue;
			};

			crate::main::encode::post_process_dl(
				filepath,
				self.config.vcodec_mode,
				cancel,
				progress,
				runner,
				&self.config.ffmpeg_path,
				&self.config.ffprobe_path,
			)?;
		}

		cancel.err_if_cancelled()?;

		return Ok(entries);
	}

	/// Run extraction attempts until one completes, the retry budget is
	/// exhausted or a non-stall error surfaces
	fn download_with_retries(
		&self,
		url: &str,
		cancel: &CancelToken,
		progress: &dyn ProgressSink,
		status: &dyn StatusSink,
	) -> Result<Vec<MediaEntry>, crate::Error> {
		let stall = StallDetector::new(STALL_TIMEOUT);

		for attempt in 0..MAX_RETRIES {
			cancel.err_if_cancelled()?;

			let children_before = reap::child_pids();
			stall.tick();

			match self.run_attempt(url, cancel, progress, status, &stall, &children_before)? {
				AttemptOutcome::Completed(result) => return result,
				AttemptOutcome::Stalled => {
					let backoff = BASE_BACKOFF * 2u32.pow(attempt);
					warn!(
						"Attempt {}/{} stalled for \"{}\", retrying in {}s",
						attempt + 1,
						MAX_RETRIES,
						url,
						backoff.as_secs()
					);
					std::thread::sleep(backoff);
				},
			}
		}

		return Err(crate::Error::DownloadTimeout(url.to_owned()));
	}

	/// Run one extraction attempt with the stall watchdog and cancellation polling
	fn run_attempt(
		&self,
		url: &str,
		cancel: &CancelToken,
		progress: &dyn ProgressSink,
		status: &dyn StatusSink,
		stall: &StallDetector,
		children_before: &HashSet<sysinfo::Pid>,
	) -> Result<AttemptOutcome, crate::Error> {
		let args = assemble_ytdl_command(&self.opts, url);
		debug!("Running {YTDL_BIN_NAME} with {} arguments", args.len());

		// merge stderr into stdout
		let reader = duct::cmd(YTDL_BIN_NAME, args)
			.stderr_to_stdout()
			.reader()
			.attach_location_err("duct ytdl reader")?;

		let mut was_cancelled = false;
		let mut was_stalled = false;

		let worker_result = std::thread::scope(|scope| {
			let worker = scope.spawn(|| {
				return handle_output(BufReader::new(&reader), progress, status, stall);
			});

			'poll: while !worker.is_finished() {
				// wait one poll interval, in small steps so a finished worker is noticed quickly
				let wait_start = Instant::now();
				while wait_start.elapsed() < POLL_INTERVAL {
					if worker.is_finished() {
						break 'poll;
					}
					std::thread::sleep(Duration::from_millis(100));
				}

				if cancel.is_cancelled() {
					was_cancelled = true;
					kill_attempt(&reader, children_before);
					break;
				}

				if stall.is_stalled() {
					was_stalled = true;
					warn!(
						"No progress for {}s on \"{url}\", terminating child processes",
						STALL_TIMEOUT.as_secs()
					);
					kill_attempt(&reader, children_before);
					break;
				}
			}

			return worker.join();
		});

		let worker_result = worker_result.map_err(|_| return crate::Error::other("Extractor worker panicked"))?;

		// wait loop, because a "ReaderHandle" does not implement "wait", only "try_wait"
		loop {
			match reader.try_wait() {
				Ok(v) => {
					// only in the "Some" case is the wait actually finished
					if v.is_some() {
						break;
					}
				},
				Err(err) => {
					// a killed or non-0-exited child surfaces here, both are handled by the outcome below
					debug!("{YTDL_BIN_NAME} exited with a non-0 code: {err}");
					break;
				},
			}

			std::thread::sleep(Duration::from_millis(100));
		}

		if was_cancelled {
			return Err(crate::Error::Cancelled);
		}

		if was_stalled {
			return Ok(AttemptOutcome::Stalled);
		}

		return Ok(AttemptOutcome::Completed(worker_result));
	}
}

/// Kill the extractor child and reap everything it left behind since the snapshot
fn kill_attempt(reader: &duct::ReaderHandle, children_before: &HashSet<sysinfo::Pid>) {
	if let Err(err) = reader.kill() {
		warn!("Failed to kill the extractor process: {err}");
	}

	reap::reap_new_children(children_before);
}

/// Helper function to handle the output from a spawned extractor command.
/// Parses progress / marker / log lines, ticks the stall detector and fans
/// events into the sinks; returns all downloaded media.
fn handle_output<R: BufRead>(
	reader: R,
	progress: &dyn ProgressSink,
	status: &dyn StatusSink,
	stall: &StallDetector,
) -> Result<Vec<MediaEntry>, crate::Error> {
	let mut entries: Vec<MediaEntry> = Vec::new();
	// "current" may not be set, it cannot be guaranteed that a start marker was emitted
	let mut current: Option<MediaEntry> = None;
	// whether the current media actually transferred data, or was just found
	let mut had_download = false;
	// store the last error line encountered
	let mut last_error: Option<crate::Error> = None;
	let mut playlist_index: usize = 0;
	let mut playlist_count: Option<usize> = None;

	for line in reader.lines() {
		let line = match line {
			Ok(v) => v,
			Err(err) => {
				// a killed child or non-0 exit ends the stream with a error, the remaining
				// state still gets evaluated normally below
				debug!("extractor lines reader errored: {err}");
				break;
			},
		};

		stall.tick();
		trace!("ytdl [STDOUT]: \"{line}\"");

		// log bridge: scan every line for a phase status
		if let Some(kind) = try_get_status(&line) {
			status.on_status(kind.label());
		}

		match YtdlLine::parse(&line) {
			YtdlLine::Download(tick) => {
				// download activity clears a earlier error, so one broken playlist
				// entry does not fail the whole url
				last_error = None;
				had_download = true;

				if let Some(tick) = tick {
					let mut event = ProgressEvent::new(ProgressPhase::Download, ProgressStatus::Downloading);
					event.progress_fraction = Some(tick.fraction);
					event.total_bytes = tick.total_bytes;
					event.total_bytes_estimate = tick.total_estimate;
					event.speed_bps = tick.speed_bps;
					event.playlist_index = Some(playlist_index.max(1));
					event.playlist_count = playlist_count;

					progress.on_download_progress(&event);
				}
			},
			YtdlLine::Marker(marker) => {
				last_error = None;

				handle_marker(
					marker,
					&mut current,
					&mut had_download,
					&mut playlist_index,
					&mut playlist_count,
					&mut entries,
					progress,
				);
			},
			YtdlLine::Error => {
				// debug printing, because the line may include escape characters
				warn!("Encountered extractor error: {line:#?}");
				last_error = Some(crate::Error::other(line));
				current.take(); // this media should not be returned
			},
			YtdlLine::Warning => {
				// extractor warnings are non-fatal, but should still be logged
				warn!("{YTDL_BIN_NAME}: {line:#?}");
			},
			// chatter neither clears nor sets a error, blank lines often follow a error line
			YtdlLine::Chatter => (),
		}
	}

	if let Some(last_error) = last_error {
		return Err(last_error);
	}

	return Ok(entries);
}

/// Handle a [`Marker`] line
///
/// outsourced, because it would otherwise become really nested
fn handle_marker(
	marker: Marker,
	current: &mut Option<MediaEntry>,
	had_download: &mut bool,
	playlist_index: &mut usize,
	playlist_count: &mut Option<usize>,
	entries: &mut Vec<MediaEntry>,
	progress: &dyn ProgressSink,
) {
	match marker {
		Marker::Start(entry) => {
			debug!("Found PARSE_START: \"{}\" \"{}\" \"{:?}\"", entry.id, entry.provider, entry.title);
			if current.is_some() {
				warn!("Found PARSE_START, but \"current\" is still \"Some\"");
			}

			current.replace(entry);
			*had_download = false;
			*playlist_index += 1;

			// zeroed event so the displayed bar resets for the new media
			let mut event = ProgressEvent::new(ProgressPhase::Download, ProgressStatus::Downloading);
			event.progress_fraction = Some(0.0);
			event.playlist_index = Some(*playlist_index);
			event.playlist_count = *playlist_count;
			progress.on_download_progress(&event);
		},
		Marker::End { id } => {
			debug!("Found PARSE_END: \"{id}\"");

			if let Some(finished) = current.take() {
				if id != finished.id {
					// weird case where "current" and the end marker dont match
					warn!("Found PARSE_END, but the ID does not match with \"current\"!");
				}

				// do not return media that was only found but never transferred
				if *had_download {
					entries.push(finished);
				}
			} else {
				debug!("Found a PARSE_END, but \"current\" was \"None\"!");
			}

			*had_download = false;
		},
		Marker::Playlist(count) => {
			debug!("Found PLAYLIST {count}");
			playlist_count.replace(count);

			let mut event = ProgressEvent::new(ProgressPhase::Download, ProgressStatus::Downloading);
			event.playlist_count = Some(count);
			progress.on_download_progress(&event);
		},
		Marker::Move { id, filepath } => {
			debug!("Found MOVE: \"{id}\" \"{}\"", filepath.display());

			if let Some(current) = current.as_mut() {
				if id != current.id {
					warn!("Found MOVE, but the ID does not match with \"current\"!");
				}
				current.filepath = Some(filepath);
			} else {
				warn!("Found MOVE, but did not have a current media");
			}
		},
	}
}

#[cfg(test)]
pub(crate) mod test_utils {
	use std::sync::Mutex;

	use crate::data::progress::ProgressEvent;
	use crate::traits::sinks::{
		ProgressSink,
		StatusSink,
	};

	/// Sink recording every event and status for assertions
	#[derive(Debug, Default)]
	pub struct RecordingSink {
		pub download_events: Mutex<Vec<ProgressEvent>>,
		pub process_events:  Mutex<Vec<ProgressEvent>>,
		pub statuses:        Mutex<Vec<String>>,
	}

	impl ProgressSink for RecordingSink {
		fn on_download_progress(&self, event: &ProgressEvent) {
			self.download_events
				.lock()
				.expect("recording sink mutex poisoned")
				.push(event.clone());
		}

		fn on_process_progress(&self, event: &ProgressEvent) {
			self.process_events
				.lock()
				.expect("recording sink mutex poisoned")
				.push(event.clone());
		}
	}

	impl StatusSink for RecordingSink {
		fn on_status(&self, message: &str) {
			self.statuses
				.lock()
				.expect("recording sink mutex poisoned")
				.push(message.to_owned());
		}
	}
}
