//! Storage of URL-like values.
//!
//! A URL written through [`SettingsStore::set_url`](crate::SettingsStore::set_url) is stored as
//! an archived [`Value::Data`]: a fixed header followed by the URL text. Only
//! [`Value::coerce_url`] decodes it again.

use std::path::PathBuf;

use url::Url;

use crate::Value;

const ARCHIVE_HEADER: &[u8] = b"defaults.locator.v1\0";

pub(crate) fn archive(url: &Url) -> Value {
    let mut bytes = Vec::with_capacity(ARCHIVE_HEADER.len() + url.as_str().len());
    bytes.extend_from_slice(ARCHIVE_HEADER);
    bytes.extend_from_slice(url.as_str().as_bytes());
    Value::Data(bytes)
}

pub(crate) fn unarchive(bytes: &[u8]) -> Option<Url> {
    let text = std::str::from_utf8(bytes.strip_prefix(ARCHIVE_HEADER)?).ok()?;
    Url::parse(text).ok()
}

/// Builds a file URL from a path. A leading `~` is expanded to the home directory and relative
/// paths are resolved against the current working directory.
pub(crate) fn file_url(path: &str) -> Option<Url> {
    if path.is_empty() {
        return None;
    }

    let expanded = expand_home(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir().ok()?.join(expanded)
    };
    Url::from_file_path(absolute).ok()
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            PathBuf::from(home).join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn archived_url_round_trips() {
        let url = Url::parse("https://example.com/path?q=1").expect("valid url");

        let archived = archive(&url);

        assert_eq!(archived.coerce_url(), Some(url));
    }

    #[test]
    fn plain_bytes_are_not_a_locator() {
        assert_eq!(Value::data(b"https://example.com".to_vec()).coerce_url(), None);
        assert_eq!(unarchive(b"defaults.locator.v1\0not a url"), None);
    }

    #[test]
    fn absolute_path_becomes_file_url() {
        let url = Value::from("/tmp/settings.plist")
            .coerce_url()
            .expect("absolute path converts");

        assert_eq!(url.scheme(), "file");
        assert_eq!(url.path(), "/tmp/settings.plist");
    }

    #[test]
    fn relative_path_resolves_against_working_directory() {
        let cwd = std::env::current_dir().expect("working directory");

        let url = file_url("notes.txt").expect("relative path converts");

        assert_eq!(url.to_file_path().ok(), Some(cwd.join("notes.txt")));
    }

    #[test]
    fn non_path_values_are_not_urls() {
        assert_eq!(file_url(""), None);
        assert_eq!(Value::from(1).coerce_url(), None);
        assert_eq!(Value::from(["/tmp"]).coerce_url(), None);
    }
}
