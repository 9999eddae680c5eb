//! Module for utility functions, that may be used in various other modules

use std::path::{
	Path,
	PathBuf,
};

use path_absolutize::Absolutize;

/// Resolve a leading "~" to the Home directory
/// System agnostic as long as [`dirs::home_dir`] support's it, "~user" syntax is not supported
pub fn expand_tilde<I: AsRef<Path>>(input: I) -> Option<PathBuf> {
	let path = input.as_ref();

	if !path.starts_with("~") {
		return Some(path.to_owned());
	}
	if path == Path::new("~") {
		return dirs::home_dir();
	}
	if !path.starts_with("~/") {
		// "~user" style, return unchanged
		return Some(path.to_owned());
	}

	return dirs::home_dir().map(|mut home| {
		// "unwrap" can be used, because it is already checked that the path starts with the prefix
		home.push(path.strip_prefix("~/").unwrap());

		return home;
	});
}

/// Convert the input to a absolute path, without hitting the filesystem.
/// Resolves `~`(home) and `.` / `..` components; a relative start is based on the CWD.
pub fn to_absolute<P: AsRef<Path>>(input: P) -> std::io::Result<PathBuf> {
	let Some(expanded) = expand_tilde(input) else {
		return Err(std::io::Error::new(
			std::io::ErrorKind::InvalidInput,
			"Could not resolve \"~\"",
		));
	};

	return expanded.absolutize().map(|v| return v.to_path_buf());
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_expand_tilde() {
		// fake home
		unsafe { std::env::set_var("HOME", "/custom/home") };

		// absolute and relative paths stay unchanged
		assert_eq!(
			Some(PathBuf::from("/absolute/to/path")),
			expand_tilde("/absolute/to/path")
		);
		assert_eq!(Some(PathBuf::from("./inner/path")), expand_tilde("./inner/path"));

		// "~" resolves with and without extra components
		assert_eq!(dirs::home_dir(), expand_tilde("~"));
		assert_eq!(
			dirs::home_dir().map(|v| return v.join("some/path")),
			expand_tilde("~/some/path")
		);
	}

	#[test]
	fn test_to_absolute() {
		unsafe { std::env::set_var("HOME", "/custom/home") };

		assert_eq!(
			PathBuf::from("/absolute/to/path"),
			to_absolute("/absolute/to/inner/../path").expect("Expected to return a OK value")
		);

		let cwd = std::env::current_dir().expect("Expected to have a CWD");
		assert_eq!(
			cwd.join("inner/path"),
			to_absolute("./inner/path").expect("Expected to return a OK value")
		);
	}
}
