//! Module for translating the option map into the extractor's argument vector

use std::ffi::OsString;

use serde_json::Value;

use crate::main::options::YtdlOpts;

/// Internal Struct for easily adding various types that resolve to [`OsString`] and output a [`Vec<OsString>`]
/// exists because [`std::process::Command`] is too overkill to use for a argument collection for having to use [duct] later
#[derive(Debug)]
struct ArgsHelper(Vec<OsString>);
impl ArgsHelper {
	/// Create a new instance of ArgsHelper
	pub fn new() -> Self {
		return Self(Vec::default());
	}

	/// Add a new Argument to the list, added at the end and converted to a [`OsString`]
	/// Returns the input reference to "self" for chaining
	pub fn arg<U>(&mut self, arg: U) -> &mut Self
	where
		U: Into<OsString>,
	{
		self.0.push(arg.into());

		return self;
	}

	/// Convert Self to the inner value
	/// Consumes self
	pub fn into_inner(self) -> Vec<OsString> {
		return self.0;
	}
}

impl From<ArgsHelper> for Vec<OsString> {
	fn from(v: ArgsHelper) -> Self {
		return v.into_inner();
	}
}

/// Assemble the full extractor command for the given option map and url.
/// Map entries translate to the extractor's CLI switches; the marker prints,
/// progress flags and the url are appended after.
#[must_use]
pub fn assemble_ytdl_command(opts: &YtdlOpts, url: &str) -> Vec<OsString> {
	let mut ytdl_args = ArgsHelper::new();

	for (key, value) in opts.iter() {
		apply_option(&mut ytdl_args, key, value);
	}

	add_prints(&mut ytdl_args);

	// required to get the status log lines on stdout
	ytdl_args.arg("--no-quiet");
	// ensure progress reports are printed
	ytdl_args.arg("--progress");
	// ensure progress reports are printed on a new line each
	ytdl_args.arg("--newline");
	// ensure it is not in simulate mode (for example set via extra arguments)
	ytdl_args.arg("--no-simulate");

	// apply the url to download as the last argument
	ytdl_args.arg(url);

	return ytdl_args.into();
}

/// Translate one option map entry to its CLI switch(es)
fn apply_option(args: &mut ArgsHelper, key: &str, value: &Value) {
	match key {
		"noplaylist" => {
			if value.as_bool() == Some(true) {
				args.arg("--no-playlist");
			} else {
				args.arg("--yes-playlist");
			}
		},
		"ignoreerrors" => {
			// "only_download" is the extractor's own continue-on-entry-error mode
			if value.as_str() == Some("only_download") {
				args.arg("--no-abort-on-error");
			} else {
				args.arg("--abort-on-error");
			}
		},
		"overwrites" => {
			if value.as_bool() == Some(true) {
				args.arg("--force-overwrites");
			}
		},
		"trim_file_name" => {
			args.arg("--trim-filenames");
			args.arg(value_to_string(value));
		},
		"outtmpl" => {
			args.arg("-o");
			args.arg(value_to_string(value));
		},
		"playlist_items" => {
			args.arg("--playlist-items");
			args.arg(value_to_string(value));
		},
		"ffmpeg_location" => {
			args.arg("--ffmpeg-location");
			args.arg(value_to_string(value));
		},
		"format" => {
			args.arg("-f");
			args.arg(value_to_string(value));
		},
		"format_sort" => {
			args.arg("-S");
			args.arg(join_string_array(value, ","));
		},
		"merge_output_format" => {
			args.arg("--merge-output-format");
			args.arg(value_to_string(value));
		},
		"extract_audio" => {
			if value.as_bool() == Some(true) {
				args.arg("-x");
			}
		},
		"postprocessors" => apply_postprocessors(args, value),
		"external_downloader" => {
			args.arg("--downloader");
			args.arg(value_to_string(value));
		},
		"external_downloader_args" => {
			if let Some(map) = value.as_object() {
				for (target, target_args) in map {
					args.arg("--downloader-args");
					args.arg(format!("{}:{}", target, join_string_array(target_args, " ")));
				}
			}
		},
		"subtitleslangs" => {
			args.arg("--sub-langs");
			args.arg(join_string_array(value, ","));
		},
		"writesubtitles" => {
			if value.as_bool() == Some(true) {
				args.arg("--write-subs");
			}
		},
		"cookiesfrombrowser" => {
			if let Some(browser) = value.as_array().and_then(|v| return v.first()) {
				args.arg("--cookies-from-browser");
				args.arg(value_to_string(browser));
			}
		},
		unknown => {
			// a builder emitted a key this translation does not know, that is a bug in the builders
			warn!("Unhandled extractor option \"{unknown}\"");
		},
	}
}

/// Translate the post-processor passes to their CLI switches
fn apply_postprocessors(args: &mut ArgsHelper, value: &Value) {
	let Some(list) = value.as_array() else {
		return;
	};

	for postprocessor in list {
		match postprocessor.get("key").and_then(Value::as_str) {
			Some("FFmpegExtractAudio") => {
				if let Some(codec) = postprocessor.get("preferredcodec").and_then(Value::as_str) {
					args.arg("--audio-format");
					args.arg(codec);
				}
			},
			Some("ModifyChapters") => {
				if let Some(categories) = postprocessor.get("SponsorBlock") {
					args.arg("--sponsorblock-remove");
					args.arg(join_string_array(categories, ","));
				}
			},
			// the SponsorBlock fetch pass is implied by "--sponsorblock-remove"
			Some("SponsorBlock") => (),
			other => {
				warn!("Unhandled post-processor {other:?}");
			},
		}
	}
}

/// Add the custom print statements used for detecting different stages and information
fn add_prints(ytdl_args: &mut ArgsHelper) {
	// print playlist information when available
	ytdl_args
		.arg("--print")
		// print the playlist count to get a sizehint
		.arg("before_dl:PLAYLIST '%(playlist_count)s'");

	// print once before the video starts to download to get all information and to get a consistent start point
	ytdl_args
		.arg("--print")
		.arg("before_dl:PARSE_START '%(extractor)s' '%(id)s' %(title)s");
	// print once after the video got fully processed to get a consistent end point
	ytdl_args
		.arg("--print")
		// only "extractor" and "id" is required, because it can be safely assumed that when this is printed, the "PARSE_START" was also printed
		.arg("after_video:PARSE_END '%(extractor)s' '%(id)s'");

	// print after move to get the filepath of the final output file
	ytdl_args
		.arg("--print")
		// includes "extractor" and "id" for identifying which media the filepath is for
		.arg("after_move:MOVE '%(extractor)s' '%(id)s' %(filepath)s");
}

/// Stringify a scalar option value without JSON quoting
fn value_to_string(value: &Value) -> String {
	return match value {
		Value::String(v) => v.clone(),
		other => other.to_string(),
	};
}

/// Join a JSON string array with the given separator
fn join_string_array(value: &Value, separator: &str) -> String {
	let Some(list) = value.as_array() else {
		return value_to_string(value);
	};

	return list
		.iter()
		.map(value_to_string)
		.collect::<Vec<String>>()
		.join(separator);
}
