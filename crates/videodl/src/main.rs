#![allow(clippy::needless_return)]
#![warn(clippy::implicit_return)]

#[macro_use]
extern crate log;

use std::io::Error as ioError;

use colored::Colorize;
use flexi_logger::LogSpecification;
use libvideodl::{
	data::report::{
		ErrorReport,
		ReportColor,
	},
	main::{
		download::{
			YtdlSession,
			warn_minimal_version,
		},
		orchestrator::{
			JobOutcome,
			run_queue,
		},
	},
	spawn::runner::DesktopRunner,
	sync::CancelToken,
};

mod clap_conf;
use clap_conf::CliDerive;

mod logger;
mod sinks;
mod utils;

use sinks::TerminalUi;

/// Main
fn main() -> Result<(), ioError> {
	let logger_handle = logger::setup_logger()?;

	let cli_matches = CliDerive::custom_parse();

	// apply the verbosity flags, "--verbose" covers all dependencies, "--debug" only this app
	if cli_matches.verbose {
		logger_handle.set_new_spec(
			LogSpecification::parse("debug").expect("Expected LogSpecification to parse correctly"),
		);
	} else if cli_matches.debug {
		logger_handle.set_new_spec(
			LogSpecification::parse("warn,videodl=debug,libvideodl=debug")
				.expect("Expected LogSpecification to parse correctly"),
		);
	}

	let config = cli_matches
		.to_config()
		.map_err(|err| return ioError::other(err.to_string()))?;

	let ytdl_version = utils::require_ytdl_installed(&config.ffmpeg_path)?;
	info!("Found yt-dlp version {ytdl_version}");
	warn_minimal_version(&ytdl_version);

	let session = YtdlSession::new(config).map_err(|err| return ioError::other(err.to_string()))?;

	// one token per session, set once by Ctrl-C and observed at every phase boundary
	let cancel = CancelToken::new();
	{
		let cancel = cancel.clone();
		ctrlc::set_handler(move || {
			cancel.cancel();
		})
		.expect("Expected the Ctrl-C handler to install");
	}

	let ui = TerminalUi::new();
	let refresh_thread = ui.spawn_refresh_thread(cli_matches.is_interactive());

	let outcome = run_queue(&session, &cancel, ui.as_ref(), ui.as_ref(), &DesktopRunner::new());

	ui.finish();
	refresh_thread
		.join()
		.map_err(|_| return ioError::other("UI refresh thread panicked"))?;

	for job in &outcome.jobs {
		match &job.outcome {
			JobOutcome::Done => println!("{} {}", "done".green(), job.url),
			JobOutcome::Failed(report) | JobOutcome::Cancelled(report) => print_report(&job.url, report),
		}
	}

	if outcome.finished_clean && !outcome.jobs.is_empty() {
		println!("{}", "Download finished".green());
		println!("Files are in \"{}\"", outcome.dest_dir.to_string_lossy());
	}

	if !outcome.remaining_queue.is_empty() {
		println!("{} URL(s) remain queued for a retry", outcome.remaining_queue.len());
	}

	return Ok(());
}

/// Print a per-URL error report in its severity color
fn print_report(url: &str, report: &ErrorReport) {
	let message = match report.color {
		ReportColor::Yellow => report.short_message.yellow(),
		ReportColor::Red => report.short_message.red(),
		ReportColor::Green => report.short_message.green(),
	};

	println!("{message} {url}");

	if report.has_detail {
		// the full detail only clutters the output unless debugging
		debug!("Detail for \"{url}\": {}", report.detail);
	}
}
