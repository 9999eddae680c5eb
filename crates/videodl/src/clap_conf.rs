//! Module for Clap related structs (derived)

#![deny(missing_docs)] // comments are used for "--help" generation, so it should always be defined

use clap::{
	Parser,
	ValueEnum,
};
use libvideodl::data::config::{
	AcodecMode,
	DownloadConfig,
	OriginalStreams,
	TargetVcodec,
	Timecode,
	TrimSpec,
};
use libvideodl::main::options::effective_vcodec;
use std::path::PathBuf;

/// Video codec choices exposed on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum VcodecArg {
	/// Pick automatically (best stream, or NLE handling with "--nle")
	#[default]
	Auto,
	/// H.264 / AVC
	X264,
	/// H.265 / HEVC
	X265,
	/// Apple ProRes (output becomes ".mov")
	Prores,
	/// AV1
	Av1,
}

impl VcodecArg {
	/// Convert to the library's target codec, [`None`] for Auto
	#[must_use]
	pub fn as_target(&self) -> Option<TargetVcodec> {
		return match self {
			Self::Auto => None,
			Self::X264 => Some(TargetVcodec::X264),
			Self::X265 => Some(TargetVcodec::X265),
			Self::Prores => Some(TargetVcodec::ProRes),
			Self::Av1 => Some(TargetVcodec::Av1),
		};
	}
}

/// Audio codec choices exposed on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AcodecArg {
	/// Keep whatever the source provides
	#[default]
	Auto,
	/// AAC
	Aac,
	/// Apple Lossless
	Alac,
	/// FLAC
	Flac,
	/// Opus
	Opus,
	/// MP3
	Mp3,
	/// Vorbis
	Vorbis,
	/// WAV / PCM
	Wav,
}

impl AcodecArg {
	/// Convert to the library's audio codec mode
	#[must_use]
	pub fn as_mode(&self) -> AcodecMode {
		return match self {
			Self::Auto => AcodecMode::Auto,
			Self::Aac => AcodecMode::Aac,
			Self::Alac => AcodecMode::Alac,
			Self::Flac => AcodecMode::Flac,
			Self::Opus => AcodecMode::Opus,
			Self::Mp3 => AcodecMode::Mp3,
			Self::Vorbis => AcodecMode::Vorbis,
			Self::Wav => AcodecMode::Wav,
		};
	}
}

/// Download media URLs and make them NLE-ready
#[derive(Debug, Parser)]
#[command(author, version = env!("VIDEODL_VERSION"), about, long_about = None)]
#[command(bin_name("videodl"))]
pub struct CliDerive {
	/// Enable debug logs for videodl itself (does not replace RUST_LOG)
	#[arg(long)]
	pub debug:           bool,
	/// Enable debug logs for videodl and all dependencies
	#[arg(long)]
	pub verbose:         bool,
	/// Output directory for the finished files (defaults to the system download directory)
	#[arg(short, long, env = "VIDEODL_OUT")]
	pub output:          Option<PathBuf>,
	/// Only extract audio, skip all video handling
	#[arg(short = 'a', long)]
	pub audio_only:      bool,
	/// Video codec to target
	#[arg(long, value_enum, default_value = "auto")]
	pub vcodec:          VcodecArg,
	/// Audio codec for audio-only downloads
	#[arg(long, value_enum, default_value = "auto")]
	pub acodec:          AcodecArg,
	/// Make the output directly importable into non-linear editors
	#[arg(long)]
	pub nle:             bool,
	/// Keep the exact source streams, only remuxed into mp4
	#[arg(long)]
	pub original:        bool,
	/// Specific video format id for "--original" (as listed by the extractor)
	#[arg(long)]
	pub video_format_id: Option<String>,
	/// Specific audio format id for "--original" (as listed by the extractor)
	#[arg(long)]
	pub audio_format_id: Option<String>,
	/// Maximum video height, like "1080p" or "1080"
	#[arg(long, default_value = "1080p")]
	pub quality:         String,
	/// Maximum framerate (30 or 60)
	#[arg(long, default_value_t = 60)]
	pub framerate:       u32,
	/// Trim start timecode "H:M:S"
	#[arg(long)]
	pub start:           Option<String>,
	/// Trim end timecode "H:M:S"
	#[arg(long)]
	pub end:             Option<String>,
	/// Download and embed subtitles
	#[arg(long)]
	pub subtitles:       bool,
	/// Strip non-music segments via SponsorBlock (requires "--audio-only")
	#[arg(long)]
	pub song_only:       bool,
	/// Browser to extract cookies from (like "firefox" or "chrome")
	#[arg(long)]
	pub cookies:         Option<String>,
	/// Treat the URLs as playlists
	#[arg(long)]
	pub playlist:        bool,
	/// Playlist indices to download, like "1,3-5" (requires "--playlist")
	#[arg(long)]
	pub indices:         Option<String>,
	/// Path of the ffmpeg binary to use
	#[arg(long, env = "VIDEODL_FFMPEG", default_value = "ffmpeg")]
	pub ffmpeg_path:     PathBuf,
	/// Path of the ffprobe binary to use
	#[arg(long, env = "VIDEODL_FFPROBE", default_value = "ffprobe")]
	pub ffprobe_path:    PathBuf,
	/// The URLs to download, processed strictly in order
	pub urls:            Vec<String>,
}

impl CliDerive {
	/// Execute [`clap::Parser::parse`] and apply custom validation logic
	#[must_use]
	pub fn custom_parse() -> Self {
		return Self::parse();
	}

	/// Check if the CLI runs attached to a terminal (for progress bars)
	#[must_use]
	pub fn is_interactive(&self) -> bool {
		use is_terminal::IsTerminal;

		return std::io::stderr().is_terminal();
	}

	/// Translate the raw arguments into the pipeline configuration
	pub fn to_config(&self) -> Result<DownloadConfig, libvideodl::Error> {
		let dest_dir = match &self.output {
			Some(path) => libvideodl::utils::to_absolute(path)?,
			None => dirs::download_dir().ok_or_else(|| {
				return libvideodl::Error::InvalidConfig(
					"No system download directory found, use \"--output\"".to_owned(),
				);
			})?,
		};

		let trim = TrimSpec {
			start: self.start.as_deref().map(Timecode::parse).transpose()?,
			end:   self.end.as_deref().map(Timecode::parse).transpose()?,
		};

		let (url, queue) = match self.urls.split_first() {
			Some((first, rest)) => (Some(first.clone()), rest.to_vec()),
			None => (None, Vec::new()),
		};

		let config = DownloadConfig {
			url,
			queue,
			dest_dir,
			audio_only: self.audio_only || self.song_only,
			vcodec_mode: effective_vcodec(self.original, self.vcodec.as_target(), self.nle),
			acodec_mode: self.acodec.as_mode(),
			original_streams: OriginalStreams {
				video_id: self.video_format_id.clone(),
				audio_id: self.audio_format_id.clone(),
			},
			max_height: parse_quality(&self.quality)?,
			max_fps: self.framerate,
			trim,
			subtitles: self.subtitles,
			song_only: self.song_only,
			cookies_browser: self.cookies.clone(),
			playlist: self.playlist,
			indices: self.indices.clone(),
			ffmpeg_path: self.ffmpeg_path.clone(),
			ffprobe_path: self.ffprobe_path.clone(),
		};

		config.validate()?;

		return Ok(config);
	}
}

/// Parse a quality argument like "1080p" or "1080" to a height
fn parse_quality(input: &str) -> Result<u32, libvideodl::Error> {
	let digits = input.strip_suffix('p').unwrap_or(input);

	return digits
		.parse::<u32>()
		.map_err(|_| return libvideodl::Error::InvalidConfig(format!("Quality \"{input}\" is not a height")));
}

#[cfg(test)]
mod test {
	use super::*;
	use libvideodl::data::config::VcodecMode;

	fn base_cli(urls: &[&str]) -> CliDerive {
		return CliDerive {
			debug:           false,
			verbose:         false,
			output:          Some(PathBuf::from("/downloads")),
			audio_only:      false,
			vcodec:          VcodecArg::Auto,
			acodec:          AcodecArg::Auto,
			nle:             false,
			original:        false,
			video_format_id: None,
			audio_format_id: None,
			quality:         "1080p".to_owned(),
			framerate:       60,
			start:           None,
			end:             None,
			subtitles:       false,
			song_only:       false,
			cookies:         None,
			playlist:        false,
			indices:         None,
			ffmpeg_path:     PathBuf::from("ffmpeg"),
			ffprobe_path:    PathBuf::from("ffprobe"),
			urls:            urls.iter().map(|v| return (*v).to_owned()).collect(),
		};
	}

	#[test]
	fn test_parse_quality() {
		assert_eq!(parse_quality("1080p").ok(), Some(1080));
		assert_eq!(parse_quality("720").ok(), Some(720));
		assert!(parse_quality("best").is_err());
	}

	#[test]
	fn test_urls_split_into_main_and_queue() {
		let cli = base_cli(&["https://a.example/1", "https://a.example/2"]);
		let config = cli.to_config().expect("Expected the config to build");

		assert_eq!(config.url.as_deref(), Some("https://a.example/1"));
		assert_eq!(config.queue, vec!["https://a.example/2".to_owned()]);
	}

	#[test]
	fn test_song_only_implies_audio_only() {
		let mut cli = base_cli(&["https://a.example/1"]);
		cli.song_only = true;

		let config = cli.to_config().expect("Expected the config to build");
		assert!(config.audio_only);
		assert!(config.song_only);
	}

	#[test]
	fn test_vcodec_resolution() {
		let mut cli = base_cli(&["https://a.example/1"]);
		assert_eq!(
			cli.to_config().expect("Expected the config to build").vcodec_mode,
			VcodecMode::Best
		);

		cli.nle = true;
		assert_eq!(
			cli.to_config().expect("Expected the config to build").vcodec_mode,
			VcodecMode::Nle
		);

		cli.vcodec = VcodecArg::X265;
		assert_eq!(
			cli.to_config().expect("Expected the config to build").vcodec_mode,
			VcodecMode::Target(TargetVcodec::X265)
		);

		cli.original = true;
		assert_eq!(
			cli.to_config().expect("Expected the config to build").vcodec_mode,
			VcodecMode::Original
		);
	}

	#[test]
	fn test_trim_parsing() {
		let mut cli = base_cli(&["https://a.example/1"]);
		cli.start = Some("0:0:10".to_owned());
		cli.end = Some("0:1:0".to_owned());

		let config = cli.to_config().expect("Expected the config to build");
		assert_eq!(config.trim.start, Some(Timecode { h: 0, m: 0, s: 10 }));
		assert_eq!(config.trim.end, Some(Timecode { h: 0, m: 1, s: 0 }));
	}

	#[test]
	fn test_invalid_trim_rejected() {
		let mut cli = base_cli(&["https://a.example/1"]);
		cli.start = Some("0:2:0".to_owned());
		cli.end = Some("0:1:0".to_owned());

		assert!(cli.to_config().is_err());
	}

	#[test]
	fn test_indices_without_playlist_rejected() {
		let mut cli = base_cli(&["https://a.example/1"]);
		cli.indices = Some("1-3".to_owned());

		assert!(cli.to_config().is_err());
	}
}
