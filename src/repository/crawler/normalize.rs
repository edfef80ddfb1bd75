//! Turns a raw listing payload into ordered repository-relative paths.

use std::borrow::Cow;

use crate::error::CrawlError;
use crate::util::{is_folder_entry, natural_sort, split_at_root, with_trailing_separator};

/// Decode a listing payload: UTF-8 when valid, Latin-1 otherwise.
pub fn decode_payload(payload: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(payload) {
        Ok(text) => Cow::Borrowed(text),
        // Every byte maps to the code point of the same value in Latin-1
        Err(_) => Cow::Owned(payload.iter().map(|&b| b as char).collect()),
    }
}

/// Normalize the listing of `directory_url`.
///
/// Returns every entry prefixed with the directory's path inside the
/// repository (starting at the root marker segment): all folders first in
/// natural order, then all files in natural order. An empty payload gives
/// an empty sequence.
pub fn normalize(
    directory_url: &str,
    root_marker: &str,
    payload: &[u8],
) -> Result<Vec<String>, CrawlError> {
    let (_, prefix) =
        split_at_root(directory_url, root_marker).ok_or_else(|| CrawlError::RootMarkerMissing {
            url: directory_url.to_string(),
            marker: root_marker.to_string(),
        })?;
    let prefix = with_trailing_separator(prefix);

    let text = decode_payload(payload);
    let (mut folders, mut files): (Vec<&str>, Vec<&str>) = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .partition(|line| is_folder_entry(line));

    natural_sort(&mut folders);
    natural_sort(&mut files);

    Ok(folders
        .into_iter()
        .chain(files)
        .map(|entry| format!("{prefix}{entry}"))
        .collect())
}
