//! Module for the per-media result data of a extractor run

use std::path::PathBuf;

/// Information about a single downloaded media, assembled from the extractor's output markers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaEntry {
	/// Provider-scoped media id
	pub id:       String,
	/// Extractor name the media came from ("youtube", "soundcloud", ...)
	pub provider: String,
	/// Media title, set once the start marker has been parsed
	pub title:    Option<String>,
	/// Full path of the downloaded file, set once the move marker has been parsed
	pub filepath: Option<PathBuf>,
}

impl MediaEntry {
	/// Create a new instance with the required fields
	pub fn new<I: Into<String>, P: Into<String>>(id: I, provider: P) -> Self {
		return Self {
			id:       id.into(),
			provider: provider.into(),
			title:    None,
			filepath: None,
		};
	}

	/// Builder: add a title
	#[must_use]
	pub fn with_title<T: Into<String>>(mut self, title: T) -> Self {
		self.title = Some(title.into());

		return self;
	}

	/// Builder: add the downloaded file path
	#[must_use]
	pub fn with_filepath<P: Into<PathBuf>>(mut self, filepath: P) -> Self {
		self.filepath = Some(filepath.into());

		return self;
	}

	/// Set the downloaded file path in-place
	pub fn set_filepath<P: Into<PathBuf>>(&mut self, filepath: P) {
		self.filepath = Some(filepath.into());
	}
}
