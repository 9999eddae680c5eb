//! Module for parsing the extractor's output lines.
//!
//! The driver only ever needs three things from the stream: download
//! progress, the marker prints installed by
//! [`assemble_cmd::add_prints`](super::assemble_cmd), and error / warning
//! lines. Everything else the extractor says is chatter (it still feeds the
//! status bridge and the stall watchdog, see [`try_get_status`]).

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::data::media::MediaEntry;

/// Download progress values parsed from a "[download]" line
#[derive(Debug, PartialEq, Clone)]
pub struct DownloadTick {
	/// Fraction in `[0.0, 1.0]`
	pub fraction:       f64,
	/// Total size in bytes, when printed without a estimate marker
	pub total_bytes:    Option<u64>,
	/// Total size in bytes, when printed as a estimate ("~")
	pub total_estimate: Option<u64>,
	/// Download speed in bytes per second
	pub speed_bps:      Option<f64>,
}

impl DownloadTick {
	/// Try to parse the progress values out of a "[download]" line.
	/// Returns [`None`] for download lines without a percentage
	/// (like "[download] Downloading item 1 of 4").
	pub fn try_from_line(input: &str) -> Option<Self> {
		/// Regex to parse percentage, total size and speed from a download progress line
		/// cap "percent": percentage, "tilde": estimate marker, "size"+"sunit": total, "speed"+"spunit": speed
		static DOWNLOAD_PROGRESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
			return Regex::new(
				r"(?mi)^\[download\]\s+(?<percent>\d{1,3}(?:\.\d+)?)%(?:\s+of\s+(?<tilde>~)?\s*(?<size>[\d.]+)(?<sunit>[KMGT]?i?B))?(?:\s+at\s+(?<speed>[\d.]+)(?<spunit>[KMGT]?i?B)/s)?",
			)
			.unwrap();
		});

		let cap = DOWNLOAD_PROGRESS_REGEX.captures(input)?;

		let percent = cap.name("percent")?.as_str().parse::<f64>().ok()?;
		let fraction = (percent / 100.0).clamp(0.0, 1.0);

		let total = match (cap.name("size"), cap.name("sunit")) {
			(Some(size), Some(unit)) => parse_size(size.as_str(), unit.as_str()),
			_ => None,
		};
		let is_estimate = cap.name("tilde").is_some();

		let speed_bps = match (cap.name("speed"), cap.name("spunit")) {
			(Some(speed), Some(unit)) => parse_size(speed.as_str(), unit.as_str()).map(|v| {
				#[allow(clippy::cast_precision_loss)]
				return v as f64;
			}),
			_ => None,
		};

		return Some(Self {
			fraction,
			total_bytes: if is_estimate { None } else { total },
			total_estimate: if is_estimate { total } else { None },
			speed_bps,
		});
	}
}

/// One of the "--print" markers this crate installs on the extractor command.
/// The shapes here must stay in sync with
/// [`assemble_cmd::add_prints`](super::assemble_cmd).
#[derive(Debug, PartialEq, Clone)]
pub enum Marker {
	/// "PARSE_START 'provider' 'id' title": a media begins downloading
	Start(MediaEntry),
	/// "PARSE_END 'provider' 'id'": a media finished all extractor-side processing
	End {
		id: String,
	},
	/// "MOVE 'provider' 'id' path": the finished file reached its final path
	Move {
		id:       String,
		filepath: PathBuf,
	},
	/// "PLAYLIST 'count'": entry count of the playlist being downloaded
	Playlist(usize),
}

/// Shared tail of the marker prints: 'provider' 'id' plus optional free text
/// cap1: provider, cap2: id, cap3: rest (title or path)
static MARKER_TAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	return Regex::new(r"^'([^']+)' '([^']+)'(?: (.+))?$").unwrap();
});

impl Marker {
	/// Try to parse a marker line; [`None`] for anything that is not one of
	/// this crate's own prints. A "PLAYLIST 'NA'" print (emitted outside of
	/// playlists) is deliberately no marker.
	pub fn try_from_line(input: &str) -> Option<Self> {
		if let Some(rest) = input.strip_prefix("PLAYLIST ") {
			let count = rest.strip_prefix('\'')?.strip_suffix('\'')?;

			return count.parse::<usize>().ok().map(Self::Playlist);
		}

		let (name, rest) = input.split_once(' ')?;

		if !matches!(name, "PARSE_START" | "PARSE_END" | "MOVE") {
			return None;
		}

		let cap = MARKER_TAIL_REGEX.captures(rest)?;

		match name {
			"PARSE_START" => {
				let title = cap.get(3)?;

				return Some(Self::Start(
					MediaEntry::new(&cap[2], &cap[1]).with_title(title.as_str()),
				));
			},
			"PARSE_END" => {
				return Some(Self::End { id: cap[2].to_owned() });
			},
			"MOVE" => {
				let path = cap.get(3)?;

				return Some(Self::Move {
					id:       cap[2].to_owned(),
					filepath: PathBuf::from(path.as_str()),
				});
			},
			// unreachable because of the name check above
			_ => return None,
		}
	}
}

/// One classified extractor output line
#[derive(Debug, PartialEq, Clone)]
pub enum YtdlLine {
	/// A "[download]" line, with values when the line carries a percentage
	Download(Option<DownloadTick>),
	/// One of this crate's own marker prints
	Marker(Marker),
	/// A "ERROR:" line, fatal for the current media
	Error,
	/// A "WARNING:" line, non-fatal
	Warning,
	/// Anything else the extractor prints (provider chatter, ffmpeg output, cookie lines)
	Chatter,
}

impl YtdlLine {
	/// Classify a single output line
	#[must_use]
	pub fn parse(input: &str) -> Self {
		if input.starts_with("ERROR:") || input.starts_with("yt-dlp: error:") {
			return Self::Error;
		}

		if input.starts_with("WARNING:") {
			return Self::Warning;
		}

		if input.starts_with("[download]") {
			return Self::Download(DownloadTick::try_from_line(input));
		}

		if let Some(marker) = Marker::try_from_line(input) {
			return Self::Marker(marker);
		}

		return Self::Chatter;
	}
}

/// Phase labels derived from the extractor's log lines
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StatusKind {
	ExtractingCookies,
	SolvingJsChallenge,
	FetchingInfo,
}

impl StatusKind {
	/// Human-readable label for the status area
	#[must_use]
	pub fn label(&self) -> &'static str {
		return match self {
			Self::ExtractingCookies => "Extracting cookies...",
			Self::SolvingJsChallenge => "Solving JS challenge...",
			Self::FetchingInfo => "Fetching video info...",
		};
	}
}

/// Ordered log-bridge patterns, first match wins
const STATUS_PATTERNS: &[(&[&str], StatusKind)] = &[
	(&["extracting cookies from"], StatusKind::ExtractingCookies),
	(&["solving js challenge"], StatusKind::SolvingJsChallenge),
	(
		&["extracting url", "downloading webpage", "downloading player"],
		StatusKind::FetchingInfo,
	),
];

/// Scan a log line for a phase status, case-insensitive substring match.
/// Never matches on warning or error lines, those do not update the status.
#[must_use]
pub fn try_get_status(input: &str) -> Option<StatusKind> {
	if input.starts_with("WARNING:") || input.starts_with("ERROR:") {
		return None;
	}

	let lowered = input.to_lowercase();

	for (needles, kind) in STATUS_PATTERNS {
		if needles.iter().any(|needle| return lowered.contains(needle)) {
			return Some(*kind);
		}
	}

	return None;
}

/// Convert a size value with its unit ("78.44" + "MiB") to bytes
fn parse_size(value: &str, unit: &str) -> Option<u64> {
	let value = value.parse::<f64>().ok()?;

	let multiplier: f64 = match unit.chars().next()? {
		'K' | 'k' => 1024.0,
		'M' | 'm' => 1024.0 * 1024.0,
		'G' | 'g' => 1024.0 * 1024.0 * 1024.0,
		'T' | 't' => 1024.0 * 1024.0 * 1024.0 * 1024.0,
		_ => 1.0,
	};

	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	return Some((value * multiplier) as u64);
}
