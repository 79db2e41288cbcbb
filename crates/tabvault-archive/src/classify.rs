//! Entry classification and destination-key derivation.
//!
//! Archive entry names are untrusted. Both `/` and `\` are accepted as
//! separators, and any path segment beginning with `.` (dotfiles, `.git/`,
//! `..`) excludes the entry outright, which also rules out parent traversal.

use crate::data::ArchiveEntry;
use crate::mime::content_type_for;

/// Why an entry will not be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Directory,
    Hidden,
    /// Nothing left of the name after normalization.
    Degenerate,
    /// Symlink, hard link or device node.
    Special,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SkipReason::Directory => "directory",
            SkipReason::Hidden => "hidden or system path",
            SkipReason::Degenerate => "empty path",
            SkipReason::Special => "not a regular file",
        };
        f.write_str(reason)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Skip(SkipReason),
    /// Eligible; carries the separator-normalized in-archive path.
    Eligible(String),
}

/// Decide whether `entry` should be extracted.
pub fn classify(entry: &ArchiveEntry) -> Classification {
    if entry.is_directory {
        return Classification::Skip(SkipReason::Directory);
    }
    if entry.is_special() {
        return Classification::Skip(SkipReason::Special);
    }
    if is_hidden(&entry.name) {
        return Classification::Skip(SkipReason::Hidden);
    }
    match normalize_path(&entry.name) {
        Some(path) => Classification::Eligible(path),
        None => Classification::Skip(SkipReason::Degenerate),
    }
}

/// True if any segment of `name` starts with `.`.
pub fn is_hidden(name: &str) -> bool {
    segments(name).any(|segment| segment.starts_with('.'))
}

/// Forward-slash form of `name` with empty segments removed, or `None` if no
/// segment survives.
pub fn normalize_path(name: &str) -> Option<String> {
    let joined = segments(name)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    (!joined.is_empty()).then_some(joined)
}

fn segments(name: &str) -> impl Iterator<Item = &str> {
    name.split(['/', '\\'])
}

/// Resolved destination for one eligible entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionTarget {
    pub target_folder: String,
    pub original_path: String,
    pub destination_key: String,
    pub content_type: &'static str,
}

impl ExtractionTarget {
    /// `original_path` must already be normalized (see [`normalize_path`]).
    pub fn new(prefix: &str, target_folder: &str, original_path: String) -> Self {
        let destination_key = destination_key(prefix, target_folder, &original_path);
        let content_type = content_type_for(&original_path);
        Self {
            target_folder: target_folder.to_owned(),
            original_path,
            destination_key,
            content_type,
        }
    }
}

/// `{prefix}/{target_folder}/{path}` with every separator forced to `/` and
/// no empty segments, so the key never starts with or doubles a slash.
pub fn destination_key(prefix: &str, target_folder: &str, path: &str) -> String {
    [prefix, target_folder, path]
        .iter()
        .flat_map(|part| segments(part))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> ArchiveEntry {
        ArchiveEntry::new(name, 1)
    }

    #[test]
    fn plain_file_is_eligible() {
        assert_eq!(
            classify(&file("src/main.py")),
            Classification::Eligible("src/main.py".to_string())
        );
    }

    #[test]
    fn directories_are_skipped() {
        assert_eq!(
            classify(&file("src/")),
            Classification::Skip(SkipReason::Directory)
        );
        assert_eq!(
            classify(&file("src\\nested\\")),
            Classification::Skip(SkipReason::Directory)
        );
    }

    #[test]
    fn hidden_segments_at_any_depth_are_skipped() {
        for name in [
            ".env",
            ".git/config",
            "a/.cache/b/c.txt",
            "deep/er/.DS_Store",
            "win\\.hidden\\x.txt",
        ] {
            assert_eq!(
                classify(&file(name)),
                Classification::Skip(SkipReason::Hidden),
                "{name}"
            );
        }
    }

    #[test]
    fn parent_traversal_is_hidden() {
        assert_eq!(
            classify(&file("../../etc/passwd")),
            Classification::Skip(SkipReason::Hidden)
        );
        assert_eq!(
            classify(&file("a\\..\\..\\b")),
            Classification::Skip(SkipReason::Hidden)
        );
    }

    #[test]
    fn dot_inside_segment_is_not_hidden() {
        assert!(!is_hidden("docs/readme.v2.txt"));
        assert!(!is_hidden("archive.tar.gz"));
    }

    #[test]
    fn degenerate_names_are_skipped() {
        for name in ["", "//", "\\/\\"] {
            let entry = ArchiveEntry {
                is_directory: false,
                ..file(name)
            };
            assert_eq!(
                classify(&entry),
                Classification::Skip(SkipReason::Degenerate),
                "{name:?}"
            );
        }
    }

    #[test]
    fn special_entries_are_skipped() {
        assert_eq!(
            classify(&file("bin/link").special()),
            Classification::Skip(SkipReason::Special)
        );
    }

    #[test]
    fn normalize_collapses_separators() {
        assert_eq!(
            normalize_path("sub\\dir\\file.txt").as_deref(),
            Some("sub/dir/file.txt")
        );
        assert_eq!(normalize_path("/a//b/").as_deref(), Some("a/b"));
        assert_eq!(normalize_path("///"), None);
    }

    #[test]
    fn backslash_entry_key() {
        let path = normalize_path("sub\\dir\\file.txt").unwrap();
        let target = ExtractionTarget::new("tabs", "proj1", path);
        assert_eq!(target.destination_key, "tabs/proj1/sub/dir/file.txt");
        assert_eq!(target.original_path, "sub/dir/file.txt");
        assert_eq!(target.content_type, "text/plain");
    }

    #[test]
    fn destination_key_never_contains_backslash() {
        let key = destination_key("tabs\\", "\\team\\demo", "x\\y.md");
        assert_eq!(key, "tabs/team/demo/x/y.md");
        assert!(!key.contains('\\'));
    }

    #[test]
    fn destination_key_without_prefix() {
        assert_eq!(destination_key("", "demo", "a.txt"), "demo/a.txt");
    }
}
