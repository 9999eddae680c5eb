//! Utils for the `videodl` binary

use std::io::Error as ioError;
use std::path::Path;

use libvideodl::spawn::{
	ffmpeg::ffmpeg_version,
	ytdl::ytdl_version,
};

/// Test if yt-dlp is installed and reachable, including required dependencies like ffmpeg
pub fn require_ytdl_installed(ffmpeg_path: &Path) -> Result<String, ioError> {
	require_ffmpeg_installed(ffmpeg_path)?;

	return match ytdl_version() {
		Ok(version) => Ok(version),
		Err(err) => {
			log::error!("Could not start or find yt-dlp! Error: {err}");

			Err(ioError::new(
				std::io::ErrorKind::NotFound,
				"yt-dlp version could not be determined, is it installed and reachable?",
			))
		},
	};
}

/// Test if FFmpeg is installed and reachable
pub fn require_ffmpeg_installed(ffmpeg_path: &Path) -> Result<(), ioError> {
	if let Err(err) = ffmpeg_version(&ffmpeg_path.as_os_str()) {
		log::error!("Could not start or find ffmpeg! Error: {err}");

		return Err(ioError::new(
			std::io::ErrorKind::NotFound,
			"FFmpeg version could not be determined, is it installed and reachable?",
		));
	}

	return Ok(());
}
