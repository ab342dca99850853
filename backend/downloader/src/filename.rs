//! Destination filename derivation.

use std::path::{Path, PathBuf};

use url::Url;
use uuid::Uuid;

/// Name used when the URL path has no usable final segment.
pub const FALLBACK_FILENAME: &str = "file";

/// Suffix of the in-progress file that is renamed into place on success.
const PART_SUFFIX: &str = ".part";

/// Final segment of the URL path, or [`FALLBACK_FILENAME`].
///
/// The segment is kept exactly as it appears in the URL (still
/// percent-encoded), so it can never contain a path separator.
pub fn derive_filename(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Sibling path the body is streamed into before the final rename.
///
/// Each call yields a fresh `<name>.<uuid>.part`, so overlapping fetches of
/// the same name never write into one another's partial file.
pub fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| FALLBACK_FILENAME.into());
    name.push(format!(".{}{}", Uuid::new_v4().simple(), PART_SUFFIX));
    destination.with_file_name(name)
}
