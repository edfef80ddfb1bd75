/// Separator used by the remote listing and by prefix keys
pub const SEPARATOR: char = '/';

/// Returns true if a listing entry denotes a directory (trailing separator).
#[inline]
pub fn is_folder_entry(entry: &str) -> bool {
    entry.ends_with(SEPARATOR)
}

/// Splits a URL at the repository root marker.
///
/// Returns `(server_url, repo_path)` where `server_url` ends right before the
/// marker segment and `repo_path` starts with it, e.g.
/// `https://host/svn/repo/trunk/` with marker `repo` yields
/// `("https://host/svn/", "repo/trunk/")`.
///
/// The marker must appear as a whole path segment; the first occurrence wins.
pub fn split_at_root<'a>(url: &'a str, marker: &str) -> Option<(&'a str, &'a str)> {
    let marker = marker.trim_matches(SEPARATOR);
    if marker.is_empty() {
        return None;
    }
    let needle = format!("{SEPARATOR}{marker}{SEPARATOR}");
    let idx = url.find(&needle)?;
    Some(url.split_at(idx + 1))
}

/// Splits a normalized relative path into its segments.
///
/// Returns `(is_file, segments)`; the empty tail left by a directory's
/// trailing separator is dropped, as are empty segments from doubled separators.
pub fn split_segments(path: &str) -> (bool, Vec<&str>) {
    let is_file = !is_folder_entry(path);
    let segments = path
        .split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect();
    (is_file, segments)
}

/// Ensures a directory URL ends with the separator.
pub fn with_trailing_separator(url: &str) -> String {
    if is_folder_entry(url) {
        url.to_string()
    } else {
        format!("{url}{SEPARATOR}")
    }
}
