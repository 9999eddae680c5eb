//! Module for rendering pipeline progress into the terminal

use std::sync::{
	Arc,
	Mutex,
	atomic::{
		AtomicBool,
		Ordering,
	},
};

use indicatif::{
	HumanBytes,
	MultiProgress,
	ProgressBar,
	ProgressDrawTarget,
	ProgressStyle,
};
use libvideodl::{
	data::progress::{
		ProgressEvent,
		ProgressStatus,
		compute_progress,
	},
	sync::dirty::{
		DirtyFlag,
		run_coalescer,
	},
	traits::sinks::{
		ProgressSink,
		StatusSink,
	},
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Static for easily referencing the 100% length for a progressbar
const PG_PERCENT_100: u64 = 100;
/// Static size the progress bar decoration takes (plus some spacers)
const STYLE_STATIC_SIZE: usize = 23;

/// Displayed state, written by worker callbacks and read by the coalescer flush
#[derive(Debug, Default)]
struct UiState {
	status:            String,
	download_fraction: f64,
	download_label:    String,
	process_fraction:  f64,
	process_label:     String,
}

/// Terminal sink: callbacks only mutate shared state and set the dirty flag,
/// the coalescer thread is the single place that touches the bars
#[derive(Debug)]
pub struct TerminalUi {
	state: Mutex<UiState>,
	dirty: DirtyFlag,
	stop:  AtomicBool,
}

impl TerminalUi {
	#[must_use]
	pub fn new() -> Arc<Self> {
		return Arc::new(Self {
			state: Mutex::new(UiState::default()),
			dirty: DirtyFlag::new(),
			stop:  AtomicBool::new(false),
		});
	}

	/// Spawn the refresh thread that owns the progress bars.
	/// With `interactive` false the bars stay hidden and only status lines print.
	pub fn spawn_refresh_thread(self: &Arc<Self>, interactive: bool) -> std::thread::JoinHandle<()> {
		let ui = Arc::clone(self);

		return std::thread::spawn(move || {
			let multi = MultiProgress::new();
			if !interactive {
				multi.set_draw_target(ProgressDrawTarget::hidden());
			}

			let bar_style = ProgressStyle::default_bar()
				.template("{prefix:.dim} [{elapsed_precise}] {wide_bar:.cyan/blue} {msg}")
				.expect("Expected ProgressStyle template to be valid")
				.progress_chars("#>-");

			let status_bar = multi.add(ProgressBar::new_spinner());
			let download_bar = multi.add(ProgressBar::new(PG_PERCENT_100).with_style(bar_style.clone()));
			let process_bar = multi.add(ProgressBar::new(PG_PERCENT_100).with_style(bar_style));
			download_bar.set_prefix("DL ");
			process_bar.set_prefix("PP ");

			let mut last_status = String::new();

			run_coalescer(&ui.dirty, &ui.stop, || {
				let state = ui.state.lock().expect("ui state mutex poisoned");

				#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
				download_bar.set_position((state.download_fraction * 100.0) as u64);
				download_bar.set_message(truncate_message(&state.download_label));
				#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
				process_bar.set_position((state.process_fraction * 100.0) as u64);
				process_bar.set_message(truncate_message(&state.process_label));

				if state.status != last_status {
					last_status = state.status.clone();
					status_bar.set_message(last_status.clone());
					if !interactive {
						println!("{last_status}");
					}
				}
			});

			status_bar.finish_and_clear();
			download_bar.finish_and_clear();
			process_bar.finish_and_clear();
		});
	}

	/// Signal the refresh thread to do a final flush and exit
	pub fn finish(&self) {
		self.stop.store(true, Ordering::Release);
		self.dirty.set();
	}
}

impl ProgressSink for TerminalUi {
	fn on_download_progress(&self, event: &ProgressEvent) {
		{
			let mut state = self.state.lock().expect("ui state mutex poisoned");

			let (fraction, _last) = compute_progress(
				event.progress_fraction,
				event.processed_bytes,
				event.total_bytes.or(event.total_bytes_estimate),
				state.download_fraction,
			);
			state.download_fraction = if event.status == ProgressStatus::Finished { 1.0 } else { fraction };
			state.download_label = download_label(event);
		}

		self.dirty.set();
	}

	fn on_process_progress(&self, event: &ProgressEvent) {
		{
			let mut state = self.state.lock().expect("ui state mutex poisoned");

			let (fraction, _last) = compute_progress(event.progress_fraction, None, None, state.process_fraction);
			state.process_fraction = if event.status == ProgressStatus::Finished { 1.0 } else { fraction };
			state.process_label = process_label(event);
		}

		self.dirty.set();
	}
}

impl StatusSink for TerminalUi {
	fn on_status(&self, message: &str) {
		{
			let mut state = self.state.lock().expect("ui state mutex poisoned");
			state.status = message.to_owned();
		}

		self.dirty.set();
	}
}

/// Build the download bar message from a event
fn download_label(event: &ProgressEvent) -> String {
	let mut parts: Vec<String> = Vec::with_capacity(3);

	if let (Some(index), Some(count)) = (event.playlist_index, event.playlist_count) {
		parts.push(format!("({index}/{count})"));
	}

	if let Some(total) = event.total_bytes.or(event.total_bytes_estimate) {
		parts.push(format!("of {}", HumanBytes(total)));
	}

	if let Some(speed) = event.speed_bps {
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		parts.push(format!("at {}/s", HumanBytes(speed as u64)));
	}

	return parts.join(" ");
}

/// Build the process bar message from a event
fn process_label(event: &ProgressEvent) -> String {
	let mut parts: Vec<String> = Vec::with_capacity(2);

	if let Some(action) = &event.action_label {
		parts.push(action.clone());
	}

	if let Some(speed) = event.speed_bps {
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		parts.push(format!("at {}/s", HumanBytes(speed as u64)));
	}

	return parts.join(" ");
}

/// Truncate the given message so the progressbar does not wrap to a new line.
/// Grapheme clusters and display width are respected, a plain byte cut would
/// split multi-byte characters.
fn truncate_message<M>(msg: &M) -> String
where
	M: AsRef<str>,
{
	let msg = msg.as_ref();

	let Some((terminal_width, _)) = terminal_size::terminal_size().map(|(w, h)| return (w.0 as usize, h.0)) else {
		// if no terminal dimensions are available, use the full message
		return msg.to_owned();
	};

	let width_available = terminal_width.saturating_sub(STYLE_STATIC_SIZE);

	if msg.width() <= width_available {
		return msg.to_owned();
	}

	let mut result = String::new();
	let mut used = 0usize;

	for grapheme in msg.graphemes(true) {
		let grapheme_width = grapheme.width();
		if used + grapheme_width > width_available.saturating_sub(3) {
			break;
		}

		used += grapheme_width;
		result.push_str(grapheme);
	}

	result.push_str("...");

	return result;
}
