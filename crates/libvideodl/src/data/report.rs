//! Module for turning pipeline failures into UI-surfaceable reports

use crate::Error;

/// Severity color the host should render the report in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportColor {
	Yellow,
	Red,
	Green,
}

/// Structured record of a failure, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
	/// One-line message for the status area
	pub short_message: String,
	/// Full detail (error chain), only meaningful when `has_detail`
	pub detail:        String,
	pub color:         ReportColor,
	/// Whether the whole batch should stop (user cancelled the session)
	pub should_break:  bool,
	/// Whether `detail` carries anything worth offering a dialog for
	pub has_detail:    bool,
}

/// Classify a error into a structured report for the UI
#[must_use]
pub fn build_error_report(err: &Error) -> ErrorReport {
	match err {
		Error::Cancelled => {
			return ErrorReport {
				short_message: "Download cancelled.".to_owned(),
				detail:        String::new(),
				color:         ReportColor::Yellow,
				should_break:  true,
				has_detail:    false,
			};
		},
		Error::PlaylistNotFound => {
			return ErrorReport {
				short_message: "Playlist not found, it may be private or empty.".to_owned(),
				detail:        String::new(),
				color:         ReportColor::Yellow,
				should_break:  false,
				has_detail:    false,
			};
		},
		Error::NoValidEncoder(_) => {
			return ErrorReport {
				short_message: "No capable encoder found".to_owned(),
				detail:        String::new(),
				color:         ReportColor::Red,
				should_break:  false,
				has_detail:    false,
			};
		},
		Error::DownloadTimeout(url) => {
			return ErrorReport {
				short_message: format!("Timeout for {url}"),
				detail:        String::new(),
				color:         ReportColor::Yellow,
				should_break:  false,
				has_detail:    false,
			};
		},
		other => {
			// drop the extractor's own "ERROR: " marker, it adds nothing for the user
			let message = other.to_string().replacen("ERROR: ", "", 1);

			return ErrorReport {
				short_message: format!("Download error: {message}"),
				detail:        format!("{other:?}"),
				color:         ReportColor::Red,
				should_break:  false,
				has_detail:    true,
			};
		},
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_cancelled_breaks_batch() {
		let report = build_error_report(&Error::Cancelled);
		assert_eq!(report.short_message, "Download cancelled.");
		assert_eq!(report.color, ReportColor::Yellow);
		assert!(report.should_break);
		assert!(!report.has_detail);
	}

	#[test]
	fn test_playlist_not_found_continues() {
		let report = build_error_report(&Error::PlaylistNotFound);
		assert_eq!(report.color, ReportColor::Yellow);
		assert!(!report.should_break);
		assert!(!report.has_detail);
	}

	#[test]
	fn test_no_valid_encoder_is_red() {
		let report = build_error_report(&Error::NoValidEncoder("ProRes".to_owned()));
		assert_eq!(report.short_message, "No capable encoder found");
		assert_eq!(report.color, ReportColor::Red);
		assert!(!report.should_break);
	}

	#[test]
	fn test_timeout_names_url() {
		let report = build_error_report(&Error::DownloadTimeout("https://a.example/v".to_owned()));
		assert_eq!(report.short_message, "Timeout for https://a.example/v");
		assert_eq!(report.color, ReportColor::Yellow);
		assert!(!report.should_break);
		assert!(!report.has_detail);
	}

	#[test]
	fn test_unexpected_error_carries_detail() {
		let report = build_error_report(&Error::other("something broke"));
		assert!(report.short_message.starts_with("Download error: "));
		assert_eq!(report.color, ReportColor::Red);
		assert!(!report.should_break);
		assert!(report.has_detail);
		assert!(!report.detail.is_empty());
	}

	#[test]
	fn test_error_prefix_is_stripped() {
		let report = build_error_report(&Error::other("ERROR: bad things"));
		// the "Other: " display prefix stays, the extractor "ERROR: " marker must not
		assert!(!report.short_message.contains("ERROR: "));
	}
}
