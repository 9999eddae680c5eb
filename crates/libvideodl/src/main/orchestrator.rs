//! Module for running a whole queue of URLs through the pipeline

use std::collections::HashSet;
use std::path::PathBuf;

use crate::{
	data::{
		config::DownloadConfig,
		media::MediaEntry,
		progress::{
			ProgressEvent,
			ProgressPhase,
			ProgressStatus,
		},
		report::{
			ErrorReport,
			build_error_report,
		},
	},
	main::download::YtdlSession,
	sync::CancelToken,
	traits::{
		process_runner::ProcessRunner,
		sinks::{
			ProgressSink,
			StatusSink,
		},
	},
};

/// Terminal state of one URL
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
	/// All media of the URL downloaded and post-processed
	Done,
	/// The URL failed, the batch continued
	Failed(ErrorReport),
	/// The user cancelled the session while this URL ran
	Cancelled(ErrorReport),
}

/// One URL of the batch with its terminal state
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
	pub url:     String,
	pub outcome: JobOutcome,
}

/// Result of a whole batch run
#[derive(Debug, Clone, PartialEq)]
pub struct QueueOutcome {
	/// Every URL that was reached, in processing order
	pub jobs:            Vec<Job>,
	/// Queue URLs that remain for a later retry (neither completed nor cancelled mid-run)
	pub remaining_queue: Vec<String>,
	/// Destination directory, for the open-folder affordance
	pub dest_dir:        PathBuf,
	/// Whether no URL produced a error report
	pub finished_clean:  bool,
}

/// Run the configured batch: the main URL first, then the queue, strictly in order
pub fn run_queue(
	session: &YtdlSession,
	cancel: &CancelToken,
	progress: &dyn ProgressSink,
	status: &dyn StatusSink,
	runner: &dyn ProcessRunner,
) -> QueueOutcome {
	return run_queue_with(session.config(), progress, status, |url| {
		return session.download_url(url, cancel, progress, status, runner);
	});
}

/// Queue loop with the per-URL download behavior injected, so the policy is
/// testable without spawning the extractor
fn run_queue_with<D>(
	config: &DownloadConfig,
	progress: &dyn ProgressSink,
	status: &dyn StatusSink,
	mut download: D,
) -> QueueOutcome
where
	D: FnMut(&str) -> Result<Vec<MediaEntry>, crate::Error>,
{
	let urls = config.all_urls();
	let total = urls.len();

	let mut jobs: Vec<Job> = Vec::with_capacity(total);
	let mut completed: HashSet<String> = HashSet::new();
	let mut cancelled_url: Option<String> = None;

	// a empty queue and empty URL is a no-op, without any status change
	if total == 0 {
		return QueueOutcome {
			jobs,
			remaining_queue: Vec::new(),
			dest_dir: config.dest_dir.clone(),
			finished_clean: true,
		};
	}

	for (index, url) in urls.iter().enumerate() {
		zero_progress(progress);

		if total == 1 {
			status.on_status("Preparing...");
		} else {
			status.on_status(&format!("{}/{} - {}", index + 1, total, url));
		}

		match download(url) {
			Ok(_entries) => {
				completed.insert(url.clone());
				jobs.push(Job {
					url:     url.clone(),
					outcome: JobOutcome::Done,
				});
			},
			Err(err) => {
				let report = build_error_report(&err);
				status.on_status(&report.short_message);

				if report.should_break {
					info!("Batch stopped at \"{url}\": {}", report.short_message);
					cancelled_url = Some(url.clone());
					jobs.push(Job {
						url:     url.clone(),
						outcome: JobOutcome::Cancelled(report),
					});
					break;
				}

				error!("URL \"{url}\" failed: {}", report.short_message);
				jobs.push(Job {
					url:     url.clone(),
					outcome: JobOutcome::Failed(report),
				});
			},
		}
	}

	let finished_clean = jobs.iter().all(|job| return job.outcome == JobOutcome::Done);

	if finished_clean {
		status.on_status("Download finished");
	}

	return QueueOutcome {
		jobs,
		remaining_queue: retain_queue(&config.queue, &completed, cancelled_url.as_deref()),
		dest_dir: config.dest_dir.clone(),
		finished_clean,
	};
}

/// Keep only queue URLs that were neither completed nor explicitly
/// started-and-cancelled, so cancellation leaves the rest queued for retry
fn retain_queue(queue: &[String], completed: &HashSet<String>, cancelled_url: Option<&str>) -> Vec<String> {
	return queue
		.iter()
		.filter(|url| return !completed.contains(*url) && Some(url.as_str()) != cancelled_url)
		.cloned()
		.collect();
}

/// Zero both progress channels before a new URL starts
fn zero_progress(progress: &dyn ProgressSink) {
	let mut download = ProgressEvent::new(ProgressPhase::Download, ProgressStatus::Downloading);
	download.progress_fraction = Some(0.0);
	progress.on_download_progress(&download);

	let mut process = ProgressEvent::new(ProgressPhase::Process, ProgressStatus::Processing);
	process.progress_fraction = Some(0.0);
	progress.on_process_progress(&process);
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::main::download::test_utils::RecordingSink;

	fn config_with(url: Option<&str>, queue: &[&str]) -> DownloadConfig {
		return DownloadConfig {
			url:   url.map(str::to_owned),
			queue: queue.iter().map(|v| return (*v).to_owned()).collect(),
			..Default::default()
		};
	}

	fn ok_entries() -> Result<Vec<MediaEntry>, crate::Error> {
		return Ok(vec![MediaEntry::new("someid", "youtube")]);
	}

	#[test]
	fn test_empty_input_is_noop() {
		let sink = RecordingSink::default();
		let config = config_with(None, &[]);

		let outcome = run_queue_with(&config, &sink, &sink, |_url| return ok_entries());

		assert!(outcome.jobs.is_empty());
		assert!(outcome.finished_clean);
		// a no-op run never touches the status area
		assert!(sink.statuses.lock().expect("lock").is_empty());
	}

	#[test]
	fn test_single_url_success() {
		let sink = RecordingSink::default();
		let config = config_with(Some("https://a.example/1"), &[]);

		let outcome = run_queue_with(&config, &sink, &sink, |_url| return ok_entries());

		assert_eq!(outcome.jobs.len(), 1);
		assert_eq!(outcome.jobs[0].outcome, JobOutcome::Done);
		assert!(outcome.finished_clean);

		let statuses = sink.statuses.lock().expect("lock");
		// single-url runs show "Preparing...", batches show the counter instead
		assert_eq!(*statuses, vec!["Preparing...".to_owned(), "Download finished".to_owned()]);
	}

	#[test]
	fn test_batch_shows_counter_labels() {
		let sink = RecordingSink::default();
		let config = config_with(Some("https://a.example/1"), &["https://a.example/2"]);

		let outcome = run_queue_with(&config, &sink, &sink, |_url| return ok_entries());

		assert!(outcome.finished_clean);
		let statuses = sink.statuses.lock().expect("lock");
		assert_eq!(statuses[0], "1/2 - https://a.example/1");
		assert_eq!(statuses[1], "2/2 - https://a.example/2");
	}

	#[test]
	fn test_failed_url_continues_batch() {
		let sink = RecordingSink::default();
		let config = config_with(Some("https://a.example/1"), &["https://a.example/2"]);

		let outcome = run_queue_with(&config, &sink, &sink, |url| {
			if url.ends_with('1') {
				return Err(crate::Error::PlaylistNotFound);
			}
			return ok_entries();
		});

		assert_eq!(outcome.jobs.len(), 2);
		assert!(matches!(outcome.jobs[0].outcome, JobOutcome::Failed(_)));
		assert_eq!(outcome.jobs[1].outcome, JobOutcome::Done);
		assert!(!outcome.finished_clean);
		// the completed queue url left the queue
		assert!(outcome.remaining_queue.is_empty());
	}

	#[test]
	fn test_cancellation_breaks_batch_and_keeps_queue() {
		let sink = RecordingSink::default();
		let config = config_with(
			None,
			&["https://a.example/1", "https://a.example/2", "https://a.example/3"],
		);

		// url 1 completes, url 2 observes the cancellation, url 3 is never reached
		let outcome = run_queue_with(&config, &sink, &sink, |url| {
			if url.ends_with('2') {
				return Err(crate::Error::Cancelled);
			}
			return ok_entries();
		});

		assert_eq!(outcome.jobs.len(), 2);
		assert_eq!(outcome.jobs[0].outcome, JobOutcome::Done);
		assert!(matches!(outcome.jobs[1].outcome, JobOutcome::Cancelled(_)));

		// completed and cancelled urls leave the queue, unreached ones stay
		assert_eq!(outcome.remaining_queue, vec!["https://a.example/3".to_owned()]);
		assert!(!outcome.finished_clean);
	}

	#[test]
	fn test_progress_zeroed_per_url() {
		let sink = RecordingSink::default();
		let config = config_with(Some("https://a.example/1"), &["https://a.example/2"]);

		run_queue_with(&config, &sink, &sink, |_url| return ok_entries());

		let download_events = sink.download_events.lock().expect("lock");
		let zeroed = download_events
			.iter()
			.filter(|v| return v.progress_fraction == Some(0.0))
			.count();
		assert_eq!(zeroed, 2);

		let process_events = sink.process_events.lock().expect("lock");
		assert_eq!(process_events.len(), 2);
	}

	#[test]
	fn test_cancelled_report_should_break() {
		let sink = RecordingSink::default();
		let config = config_with(Some("https://a.example/1"), &[]);

		let outcome = run_queue_with(&config, &sink, &sink, |_url| return Err(crate::Error::Cancelled));

		let JobOutcome::Cancelled(report) = &outcome.jobs[0].outcome else {
			panic!("expected a cancelled outcome");
		};
		assert!(report.should_break);
		assert_eq!(report.short_message, "Download cancelled.");
	}

	#[test]
	fn test_retain_queue() {
		let queue = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];
		let completed: HashSet<String> = ["a".to_owned()].into();

		assert_eq!(retain_queue(&queue, &completed, Some("b")), vec!["c".to_owned()]);
		assert_eq!(
			retain_queue(&queue, &completed, None),
			vec!["b".to_owned(), "c".to_owned()]
		);
	}
}
