//! Module for the download configuration and its invariants

use std::path::PathBuf;

use serde::{
	Deserialize,
	Serialize,
};

/// Video codec targets that exist in the encoder registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetVcodec {
	X264,
	X265,
	ProRes,
	Av1,
}

impl TargetVcodec {
	/// Name used in logs and error messages
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		return match self {
			Self::X264 => "x264",
			Self::X265 => "x265",
			Self::ProRes => "ProRes",
			Self::Av1 => "AV1",
		};
	}
}

/// Effective video codec mode for a download session
///
/// Resolution from the raw user choices happens in
/// [`effective_vcodec`](crate::main::options::effective_vcodec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VcodecMode {
	/// Download the best stream and keep it as-is, no post-processing at all
	Best,
	/// Keep the exact streams the user picked, remux into mp4
	Original,
	/// Remux when the streams already import into editors, re-encode otherwise
	Nle,
	/// Re-encode to a specific codec (unless the input already is that codec)
	Target(TargetVcodec),
}

/// Audio codec selection for audio-only downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcodecMode {
	Auto,
	Aac,
	Alac,
	Flac,
	Opus,
	Mp3,
	Vorbis,
	Wav,
}

impl AcodecMode {
	/// The codec name as the extractor expects it in format filters
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		return match self {
			Self::Auto => "Auto",
			Self::Aac => "aac",
			Self::Alac => "alac",
			Self::Flac => "flac",
			Self::Opus => "opus",
			Self::Mp3 => "mp3",
			Self::Vorbis => "vorbis",
			Self::Wav => "wav",
		};
	}
}

/// A "HH:MM:SS" timecode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timecode {
	pub h: u32,
	pub m: u32,
	pub s: u32,
}

impl Timecode {
	/// Parse a "H:M:S" string, components must be numeric and minutes / seconds below 60
	pub fn parse(input: &str) -> Result<Self, crate::Error> {
		let parts: Vec<&str> = input.split(':').collect();

		if parts.len() != 3 {
			return Err(crate::Error::InvalidConfig(format!(
				"Timecode \"{input}\" is not in \"H:M:S\" form"
			)));
		}

		let mut numbers = [0u32; 3];
		for (idx, part) in parts.iter().enumerate() {
			numbers[idx] = part.parse::<u32>().map_err(|_| {
				return crate::Error::InvalidConfig(format!("Timecode \"{input}\" has a non-numeric component"));
			})?;
		}

		let [h, m, s] = numbers;

		if m >= 60 || s >= 60 {
			return Err(crate::Error::InvalidConfig(format!(
				"Timecode \"{input}\" has minutes or seconds above 59"
			)));
		}

		return Ok(Self { h, m, s });
	}

	/// Total seconds represented by this timecode
	#[must_use]
	pub fn as_seconds(&self) -> u64 {
		return u64::from(self.h) * 3600 + u64::from(self.m) * 60 + u64::from(self.s);
	}
}

impl std::fmt::Display for Timecode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		return write!(f, "{:02}:{:02}:{:02}", self.h, self.m, self.s);
	}
}

/// Optional start / end trim points for a download
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimSpec {
	pub start: Option<Timecode>,
	pub end:   Option<Timecode>,
}

impl TrimSpec {
	/// Check if either endpoint is enabled
	#[must_use]
	pub fn is_enabled(&self) -> bool {
		return self.start.is_some() || self.end.is_some();
	}

	/// Validate that, when both ends are given, start is strictly before end
	pub fn validate(&self) -> Result<(), crate::Error> {
		if let (Some(start), Some(end)) = (self.start, self.end) {
			if start.as_seconds() >= end.as_seconds() {
				return Err(crate::Error::InvalidConfig(format!(
					"Trim start \"{start}\" is not before trim end \"{end}\""
				)));
			}
		}

		return Ok(());
	}
}

/// Explicit stream format ids for "Original" mode, as listed by the extractor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalStreams {
	pub video_id: Option<String>,
	pub audio_id: Option<String>,
}

/// All user options consumed by the download / encode pipeline.
///
/// Populated by the host (CLI or GUI), shared read-only with the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
	/// The main URL to download, may be empty if only the queue is filled
	pub url:              Option<String>,
	/// Additional URLs processed after the main one, in order
	pub queue:            Vec<String>,
	/// Directory the final files are placed in
	pub dest_dir:         PathBuf,
	/// Skip all video handling, only extract audio
	pub audio_only:       bool,
	/// Effective video codec mode, see [`VcodecMode`]
	pub vcodec_mode:      VcodecMode,
	/// Audio codec for audio-only downloads
	pub acodec_mode:      AcodecMode,
	/// Explicit stream selection for [`VcodecMode::Original`]
	pub original_streams: OriginalStreams,
	/// Maximum video height, e.g. 1080
	pub max_height:       u32,
	/// Maximum framerate, 30 or 60
	pub max_fps:          u32,
	/// Optional start / end trim
	pub trim:             TrimSpec,
	/// Download and embed subtitles
	pub subtitles:        bool,
	/// Strip non-music segments via SponsorBlock (implies audio-only)
	pub song_only:        bool,
	/// Browser to extract cookies from, [`None`] to not use cookies
	pub cookies_browser:  Option<String>,
	/// Treat the URL as a playlist
	pub playlist:         bool,
	/// Playlist indices specification, e.g. "1,3-5" (requires `playlist`)
	pub indices:          Option<String>,
	/// Path of the ffmpeg binary to use
	pub ffmpeg_path:      PathBuf,
	/// Path of the ffprobe binary to use
	pub ffprobe_path:     PathBuf,
}

impl Default for DownloadConfig {
	fn default() -> Self {
		return Self {
			url:              None,
			queue:            Vec::default(),
			dest_dir:         PathBuf::default(),
			audio_only:       false,
			vcodec_mode:      VcodecMode::Best,
			acodec_mode:      AcodecMode::Auto,
			original_streams: OriginalStreams::default(),
			max_height:       1080,
			max_fps:          60,
			trim:             TrimSpec::default(),
			subtitles:        false,
			song_only:        false,
			cookies_browser:  None,
			playlist:         false,
			indices:          None,
			ffmpeg_path:      PathBuf::from("ffmpeg"),
			ffprobe_path:     PathBuf::from("ffprobe"),
		};
	}
}

impl DownloadConfig {
	/// All URLs of the session, main URL first, then the queue in order
	#[must_use]
	pub fn all_urls(&self) -> Vec<String> {
		let mut urls: Vec<String> = Vec::with_capacity(self.queue.len() + 1);

		if let Some(url) = &self.url {
			if !url.is_empty() {
				urls.push(url.clone());
			}
		}

		urls.extend(self.queue.iter().cloned());

		return urls;
	}

	/// Validate all cross-field invariants
	pub fn validate(&self) -> Result<(), crate::Error> {
		if self.indices.is_some() && !self.playlist {
			return Err(crate::Error::InvalidConfig(
				"Playlist indices require playlist mode".to_owned(),
			));
		}

		if self.song_only && !self.audio_only {
			return Err(crate::Error::InvalidConfig(
				"Song-only mode requires audio-only mode".to_owned(),
			));
		}

		self.trim.validate()?;

		for url in self.all_urls() {
			validate_url(&url)?;
		}

		return Ok(());
	}
}

/// Check that the given string is a well-formed absolute URL with scheme and authority
pub fn validate_url(input: &str) -> Result<(), crate::Error> {
	let parsed = url::Url::parse(input)
		.map_err(|err| return crate::Error::InvalidConfig(format!("URL \"{input}\" is not valid: {err}")))?;

	if !parsed.has_authority() {
		return Err(crate::Error::InvalidConfig(format!(
			"URL \"{input}\" does not have a authority (host) part"
		)));
	}

	return Ok(());
}

#[cfg(test)]
mod test {
	use super::*;

	mod timecode {
		use super::*;

		#[test]
		fn test_parse_valid() {
			assert_eq!(Timecode::parse("00:01:30"), Ok(Timecode { h: 0, m: 1, s: 30 }));
			assert_eq!(Timecode::parse("2:0:0"), Ok(Timecode { h: 2, m: 0, s: 0 }));
		}

		#[test]
		fn test_parse_rejects_high_components() {
			assert!(Timecode::parse("00:60:00").is_err());
			assert!(Timecode::parse("00:00:60").is_err());
		}

		#[test]
		fn test_parse_rejects_non_numeric() {
			assert!(Timecode::parse("aa:bb:cc").is_err());
			assert!(Timecode::parse("00:01").is_err());
		}

		#[test]
		fn test_display_pads() {
			assert_eq!(Timecode { h: 1, m: 2, s: 3 }.to_string(), "01:02:03");
		}
	}

	mod trim_spec {
		use super::*;

		#[test]
		fn test_empty_is_valid_and_disabled() {
			let trim = TrimSpec::default();
			assert!(!trim.is_enabled());
			assert!(trim.validate().is_ok());
		}

		#[test]
		fn test_start_before_end() {
			let trim = TrimSpec {
				start: Some(Timecode { h: 0, m: 0, s: 10 }),
				end:   Some(Timecode { h: 0, m: 1, s: 0 }),
			};
			assert!(trim.is_enabled());
			assert!(trim.validate().is_ok());
		}

		#[test]
		fn test_start_equal_end_invalid() {
			let point = Timecode { h: 0, m: 1, s: 0 };
			let trim = TrimSpec {
				start: Some(point),
				end:   Some(point),
			};
			assert!(trim.validate().is_err());
		}

		#[test]
		fn test_start_after_end_invalid() {
			let trim = TrimSpec {
				start: Some(Timecode { h: 1, m: 0, s: 0 }),
				end:   Some(Timecode { h: 0, m: 59, s: 59 }),
			};
			assert!(trim.validate().is_err());
		}
	}

	mod validate_url {
		use super::*;

		#[test]
		fn test_valid_urls() {
			assert!(validate_url("https://www.youtube.com/watch?v=aaaaaaaaaaa").is_ok());
			assert!(validate_url("http://example.com/video").is_ok());
		}

		#[test]
		fn test_missing_scheme() {
			assert!(validate_url("www.youtube.com/watch?v=aaaaaaaaaaa").is_err());
		}

		#[test]
		fn test_not_a_url() {
			assert!(validate_url("hello world").is_err());
		}
	}

	mod config {
		use super::*;

		#[test]
		fn test_default_validates() {
			assert!(DownloadConfig::default().validate().is_ok());
		}

		#[test]
		fn test_indices_require_playlist() {
			let config = DownloadConfig {
				indices: Some("1-3".to_owned()),
				..Default::default()
			};
			assert!(config.validate().is_err());

			let config = DownloadConfig {
				indices: Some("1-3".to_owned()),
				playlist: true,
				..Default::default()
			};
			assert!(config.validate().is_ok());
		}

		#[test]
		fn test_song_only_requires_audio_only() {
			let config = DownloadConfig {
				song_only: true,
				..Default::default()
			};
			assert!(config.validate().is_err());

			let config = DownloadConfig {
				song_only: true,
				audio_only: true,
				..Default::default()
			};
			assert!(config.validate().is_ok());
		}

		#[test]
		fn test_all_urls_order() {
			let config = DownloadConfig {
				url: Some("https://a.example/1".to_owned()),
				queue: vec!["https://a.example/2".to_owned(), "https://a.example/3".to_owned()],
				..Default::default()
			};
			assert_eq!(
				config.all_urls(),
				vec![
					"https://a.example/1".to_owned(),
					"https://a.example/2".to_owned(),
					"https://a.example/3".to_owned()
				]
			);
		}

		#[test]
		fn test_invalid_queue_url_rejected() {
			let config = DownloadConfig {
				queue: vec!["not a url".to_owned()],
				..Default::default()
			};
			assert!(config.validate().is_err());
		}
	}
}
