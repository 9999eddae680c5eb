//! Module for building the extractor option map from a configuration.
//!
//! Every builder is a pure function returning a fragment of the option map;
//! the final map is the union of all fragments. Fragments never conflict on
//! plain keys, and post-processor lists are appended across fragments.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{
	Value,
	json,
};

use crate::data::config::{
	AcodecMode,
	DownloadConfig,
	OriginalStreams,
	TargetVcodec,
	TrimSpec,
	VcodecMode,
};

/// Maximum length of the output file stem, in characters
const TRIM_FILE_NAME: u64 = 250;
/// Output template, title truncated to 100 characters
const OUTPUT_TEMPLATE: &str = "%(title).100s - %(uploader)s.%(ext)s";

/// SponsorBlock categories removed in song-only mode
pub const SPONSORBLOCK_CATEGORIES: &[&str] = &[
	"sponsor",
	"intro",
	"outro",
	"selfpromo",
	"preview",
	"filler",
	"interaction",
	"music_offtopic",
	"poi_highlight",
	"chapter",
];

/// Ordered map of extractor options, the values use the extractor's own key names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YtdlOpts(BTreeMap<String, Value>);

impl YtdlOpts {
	/// Create a new, empty map
	#[must_use]
	pub fn new() -> Self {
		return Self(BTreeMap::new());
	}

	/// Set a single option
	pub fn set<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> &mut Self {
		self.0.insert(key.into(), value.into());

		return self;
	}

	/// Get a option value
	#[must_use]
	pub fn get(&self, key: &str) -> Option<&Value> {
		return self.0.get(key);
	}

	/// Union with another fragment, later values win on plain keys.
	/// "postprocessors" lists are appended instead of replaced, post-processor
	/// passes from different concerns must all survive the merge.
	#[must_use]
	pub fn merge(mut self, other: Self) -> Self {
		for (key, value) in other.0 {
			if key == "postprocessors" {
				if let (Some(Value::Array(existing)), Value::Array(new)) = (self.0.get_mut(&key), &value) {
					existing.extend(new.iter().cloned());
					continue;
				}
			}

			self.0.insert(key, value);
		}

		return self;
	}

	/// Iterate over all options in key order
	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		return self.0.iter();
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		return self.0.is_empty();
	}
}

/// Build the file / playlist options
#[must_use]
pub fn build_file_opts(
	playlist: bool,
	dest_dir: &Path,
	indices: Option<&str>,
	ffmpeg_path: &Path,
) -> YtdlOpts {
	let mut opts = YtdlOpts::new();

	opts.set("noplaylist", !playlist);
	// carried through verbatim, the exact semantics are the extractor's
	opts.set(
		"ignoreerrors",
		if playlist { json!("only_download") } else { json!(false) },
	);
	opts.set("overwrites", true);
	opts.set("trim_file_name", TRIM_FILE_NAME);
	opts.set(
		"outtmpl",
		dest_dir.join(OUTPUT_TEMPLATE).to_string_lossy().into_owned(),
	);

	if let Some(indices) = indices {
		let value = if indices.is_empty() { "1" } else { indices };
		opts.set("playlist_items", value);
	}

	if ffmpeg_path != Path::new(crate::spawn::ffmpeg::FFMPEG_BIN_NAME) {
		opts.set("ffmpeg_location", ffmpeg_path.to_string_lossy().into_owned());
	}

	return opts;
}

/// Build the audio / video format options
#[must_use]
pub fn build_av_opts(audio_only: bool, acodec: AcodecMode, max_height: u32, max_fps: u32) -> YtdlOpts {
	let mut opts = YtdlOpts::new();

	if audio_only {
		let mut format_opt = "ba/ba*".to_owned();
		if acodec != AcodecMode::Auto {
			format_opt = format!("ba[acodec*={}]/{}", acodec.as_str(), format_opt);
		}

		let mut postprocessor = serde_json::Map::new();
		postprocessor.insert("key".to_owned(), json!("FFmpegExtractAudio"));
		if acodec != AcodecMode::Auto {
			postprocessor.insert("preferredcodec".to_owned(), json!(acodec.as_str()));
		}

		opts.set("extract_audio", true);
		opts.set("postprocessors", Value::Array(vec![Value::Object(postprocessor)]));
		opts.set("format", format_opt);
	} else {
		let vcodec_re = "vcodec~='avc1|h264'";
		let acodec_re = "acodec~='aac|mp3|mp4a'";
		let format_opt = format!(
			"((bv[{vcodec_re}][height={max_height}]/bv[height={max_height}]/bv)+(ba[{acodec_re}]/ba))/b"
		);

		opts.set(
			"format_sort",
			json!([format!("res:{max_height}"), format!("fps:{max_fps}")]),
		);
		opts.set("merge_output_format", "mp4");
		opts.set("format", format_opt);
	}

	return opts;
}

/// Build the options for "Original" mode with specific stream selection
#[must_use]
pub fn build_original_opts(streams: &OriginalStreams, audio_only: bool) -> YtdlOpts {
	let mut opts = YtdlOpts::new();

	let format_opt = match (audio_only, &streams.video_id, &streams.audio_id) {
		(true, _, Some(audio_id)) => audio_id.clone(),
		(_, Some(video_id), Some(audio_id)) => format!("{video_id}+{audio_id}"),
		(_, Some(video_id), None) => format!("{video_id}+ba"),
		(_, None, Some(audio_id)) => format!("bv+{audio_id}"),
		(_, None, None) => "bv+ba/b".to_owned(),
	};

	opts.set("format", format_opt);
	opts.set("merge_output_format", "mp4");

	return opts;
}

/// Build the trim options, empty when no endpoint is enabled.
///
/// The trim runs through ffmpeg as the external downloader; on Windows the
/// external downloader needs the explicit binary location to find it.
#[must_use]
pub fn build_trim_opts(trim: &TrimSpec, on_windows: bool, ffmpeg_path: &Path) -> YtdlOpts {
	let mut opts = YtdlOpts::new();

	if !trim.is_enabled() {
		return opts;
	}

	let start = trim.start.map_or("00:00:00".to_owned(), |v| return v.to_string());
	let mut ffmpeg_args = vec![json!("-ss"), json!(start)];
	if let Some(end) = trim.end {
		ffmpeg_args.push(json!("-to"));
		ffmpeg_args.push(json!(end.to_string()));
	}

	opts.set("external_downloader", "ffmpeg");
	opts.set("external_downloader_args", json!({ "ffmpeg_i": ffmpeg_args }));

	if on_windows {
		opts.set("ffmpeg_location", ffmpeg_path.to_string_lossy().into_owned());
	}

	return opts;
}

/// Build the subtitle options
#[must_use]
pub fn build_subtitles_opts(enabled: bool) -> YtdlOpts {
	let mut opts = YtdlOpts::new();

	if enabled {
		opts.set("subtitleslangs", json!(["all"]));
		opts.set("writesubtitles", true);
	}

	return opts;
}

/// Build the browser-cookie options
#[must_use]
pub fn build_browser_opts(cookies_browser: Option<&str>) -> YtdlOpts {
	let mut opts = YtdlOpts::new();

	if let Some(browser) = cookies_browser {
		if !browser.is_empty() {
			opts.set("cookiesfrombrowser", json!([browser.to_lowercase()]));
		}
	}

	return opts;
}

/// Build the SponsorBlock options for song-only mode
#[must_use]
pub fn build_sponsor_block_opts(song_only: bool) -> YtdlOpts {
	let mut opts = YtdlOpts::new();

	if song_only {
		opts.set(
			"postprocessors",
			json!([
				{ "key": "SponsorBlock", "when": "pre_process" },
				{ "key": "ModifyChapters", "SponsorBlock": SPONSORBLOCK_CATEGORIES },
			]),
		);
	}

	return opts;
}

/// Determine the effective video codec mode from the raw user choices
#[must_use]
pub fn effective_vcodec(original_on: bool, explicit: Option<TargetVcodec>, nle_ready: bool) -> VcodecMode {
	if original_on {
		return VcodecMode::Original;
	}
	if let Some(target) = explicit {
		return VcodecMode::Target(target);
	}
	if nle_ready {
		return VcodecMode::Nle;
	}

	return VcodecMode::Best;
}

/// Compose the full option map for a download session, in builder order
/// {file, av / original, trim, subtitles, cookies, sponsorblock}
#[must_use]
pub fn build_download_opts(config: &DownloadConfig) -> YtdlOpts {
	let file_opts = build_file_opts(
		config.playlist,
		&config.dest_dir,
		config.indices.as_deref(),
		&config.ffmpeg_path,
	);

	let av_opts = if config.vcodec_mode == VcodecMode::Original {
		build_original_opts(&config.original_streams, config.audio_only)
	} else {
		build_av_opts(config.audio_only, config.acodec_mode, config.max_height, config.max_fps)
	};

	return file_opts
		.merge(av_opts)
		.merge(build_trim_opts(&config.trim, cfg!(target_os = "windows"), &config.ffmpeg_path))
		.merge(build_subtitles_opts(config.subtitles))
		.merge(build_browser_opts(config.cookies_browser.as_deref()))
		.merge(build_sponsor_block_opts(config.song_only));
}

/// One format descriptor from the extractor's format list
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFormat {
	#[serde(default)]
	pub format_id: String,
	pub vcodec:    Option<String>,
	pub acodec:    Option<String>,
	pub height:    Option<u32>,
	pub abr:       Option<f64>,
}

/// A selectable stream for the Original-mode pickers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatChoice {
	pub format_id: String,
	pub label:     String,
}

/// Check if a codec field actually names a codec ("none" means absent)
fn has_codec(codec: Option<&String>) -> bool {
	return codec.is_some_and(|v| return v != "none");
}

/// Filter and organize the extractor's raw format list for the Original-mode pickers.
///
/// Within each codec family only the best representative survives (highest
/// height for video, highest bitrate for audio), sorted descending by quality.
/// Muxed formats count as video and are excluded from the audio list.
#[must_use]
pub fn filter_formats(formats: &[RawFormat]) -> (Vec<FormatChoice>, Vec<FormatChoice>) {
	struct SeenVideo {
		format_id: String,
		height:    u32,
	}
	struct SeenAudio {
		format_id: String,
		abr:       f64,
	}

	let mut video_seen: BTreeMap<String, SeenVideo> = BTreeMap::new();
	let mut audio_seen: BTreeMap<String, SeenAudio> = BTreeMap::new();

	for format in formats {
		if has_codec(format.vcodec.as_ref()) {
			let height = format.height.unwrap_or(0);
			let key = codec_family(format.vcodec.as_deref().unwrap_or_default());

			let better = video_seen.get(&key).is_none_or(|seen| return height > seen.height);
			if better {
				video_seen.insert(
					key,
					SeenVideo {
						format_id: format.format_id.clone(),
						height,
					},
				);
			}
		}

		if has_codec(format.acodec.as_ref()) && !has_codec(format.vcodec.as_ref()) {
			let abr = format.abr.unwrap_or(0.0);
			let key = codec_family(format.acodec.as_deref().unwrap_or_default());

			let better = audio_seen.get(&key).is_none_or(|seen| return abr > seen.abr);
			if better {
				audio_seen.insert(
					key,
					SeenAudio {
						format_id: format.format_id.clone(),
						abr,
					},
				);
			}
		}
	}

	let mut video_entries: Vec<(String, SeenVideo)> = video_seen.into_iter().collect();
	video_entries.sort_by(|a, b| return b.1.height.cmp(&a.1.height));
	let video_formats = video_entries
		.into_iter()
		.map(|(key, seen)| {
			return FormatChoice {
				format_id: seen.format_id,
				label:     format!("{} - {}p", key, seen.height),
			};
		})
		.collect();

	let mut audio_entries: Vec<(String, SeenAudio)> = audio_seen.into_iter().collect();
	audio_entries.sort_by(|a, b| return b.1.abr.total_cmp(&a.1.abr));
	let audio_formats = audio_entries
		.into_iter()
		.map(|(key, seen)| {
			let label = if seen.abr > 0.0 {
				#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
				let kbps = seen.abr as u64;
				format!("{key} - {kbps}kbps")
			} else {
				key
			};

			return FormatChoice {
				format_id: seen.format_id,
				label,
			};
		})
		.collect();

	return (video_formats, audio_formats);
}

/// Reduce a codec name to its family ("avc1.64001f" -> "avc1")
fn codec_family(codec: &str) -> String {
	return codec.split('.').next().unwrap_or(codec).to_owned();
}
