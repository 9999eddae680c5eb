//! Module for the Error type this library uses

/// Error type for "videodl", implements all Error types that could happen in this lib
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// Wrapper Variant for [`std::io::Error`]
	#[error("IoError: {0}")]
	IoError(#[from] std::io::Error),
	/// Wrapper Variant for [`std::string::FromUtf8Error`]
	#[error("FromStringUTF8Error: {0}")]
	FromStringUTF8Error(#[from] std::string::FromUtf8Error),
	/// Variant for serde-json Errors
	#[error("SerdeJSONError: {0}")]
	SerdeJSONError(#[from] serde_json::Error),
	/// Variant for when a spawned command was not successfull
	#[error("CommandNotSuccessful: {0}")]
	CommandNotSuccessful(String),
	/// Variant for when no regex captures have been found
	#[error("NoCapturesFound: {0}")]
	NoCapturesFound(String),
	/// Variant for a Unexpected Process Exit (like when yt-dlp fails to spawn)
	#[error("UnexpectedProcessExit: {0}")]
	UnexpectedProcessExit(String),
	/// Variant for when the user requested cancellation of the running session
	#[error("Cancelled")]
	Cancelled,
	/// Variant for when the extractor finished without yielding any media for a URL
	#[error("PlaylistNotFound")]
	PlaylistNotFound,
	/// Variant for when no encoder in the registry is usable for the target codec
	#[error("NoValidEncoder: no capable encoder found for {0}")]
	NoValidEncoder(String),
	/// Variant for when all extraction attempts for a URL stalled out
	#[error("DownloadTimeout: {0}")]
	DownloadTimeout(String),
	/// Variant for when probing a downloaded file failed
	#[error("ProbeFailed: {0}")]
	ProbeFailed(String),
	/// Variant for when the transcode process exited non-zero or produced no output
	#[error("TranscodeFailed (code {code:?}): {stderr}")]
	TranscodeFailed {
		/// Exit code of the transcode process, if any
		code:   Option<i32>,
		/// Captured stderr of the transcode process
		stderr: String,
	},
	/// Variant for when the input configuration violates a invariant
	#[error("InvalidConfig: {0}")]
	InvalidConfig(String),
	/// Variant for Other messages
	#[error("Other: {0}")]
	Other(String),
}

impl Error {
	pub fn other<M>(msg: M) -> Self
	where
		M: Into<String>,
	{
		return Self::Other(msg.into());
	}

	/// Check if this error should stop the whole batch instead of just the current URL
	#[must_use]
	pub fn is_cancellation(&self) -> bool {
		return matches!(self, Self::Cancelled);
	}
}

// this is custom, some errors like "std::io::Error" do not implement "PartialEq", but some inner type may do
impl PartialEq for Error {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::IoError(l0), Self::IoError(r0)) => return l0.kind() == r0.kind(),
			(Self::FromStringUTF8Error(l0), Self::FromStringUTF8Error(r0)) => return l0 == r0,
			(Self::CommandNotSuccessful(l0), Self::CommandNotSuccessful(r0)) => return l0 == r0,
			(Self::NoCapturesFound(l0), Self::NoCapturesFound(r0)) => return l0 == r0,
			(Self::Cancelled, Self::Cancelled) => return true,
			(Self::PlaylistNotFound, Self::PlaylistNotFound) => return true,
			(Self::NoValidEncoder(l0), Self::NoValidEncoder(r0)) => return l0 == r0,
			(Self::DownloadTimeout(l0), Self::DownloadTimeout(r0)) => return l0 == r0,
			(Self::ProbeFailed(l0), Self::ProbeFailed(r0)) => return l0 == r0,
			(
				Self::TranscodeFailed {
					code: lc,
					stderr: ls,
				},
				Self::TranscodeFailed {
					code: rc,
					stderr: rs,
				},
			) => return lc == rc && ls == rs,
			(Self::InvalidConfig(l0), Self::InvalidConfig(r0)) => return l0 == r0,
			(Self::Other(l0), Self::Other(r0)) => return l0 == r0,
			// Always return "false" for a serde_json::Error
			(Self::SerdeJSONError(_l0), Self::SerdeJSONError(_r0)) => return false,
			// Always return "false" for a Unexpected Process Exit
			(Self::UnexpectedProcessExit(_l0), Self::UnexpectedProcessExit(_r0)) => return false,
			(_, _) => return false,
		}
	}
}

/// Helper trait to attach a path to a io-error for better error messages
pub trait IOErrorToError<T> {
	/// Attach the given path to the error message
	fn attach_path_err<P: AsRef<std::path::Path>>(self, path: P) -> Result<T, Error>;
	/// Attach the given location description to the error message
	fn attach_location_err<L: AsRef<str>>(self, location: L) -> Result<T, Error>;
}

impl<T> IOErrorToError<T> for Result<T, std::io::Error> {
	fn attach_path_err<P: AsRef<std::path::Path>>(self, path: P) -> Result<T, Error> {
		return match self {
			Ok(v) => Ok(v),
			Err(e) => Err(Error::IoError(std::io::Error::new(
				e.kind(),
				format!("{} (Path: \"{}\")", e, path.as_ref().to_string_lossy()),
			))),
		};
	}

	fn attach_location_err<L: AsRef<str>>(self, location: L) -> Result<T, Error> {
		return match self {
			Ok(v) => Ok(v),
			Err(e) => Err(Error::IoError(std::io::Error::new(
				e.kind(),
				format!("{} (In: \"{}\")", e, location.as_ref()),
			))),
		};
	}
}
