//! Local names for remote items.
//!
//! Remote names may contain anything the provider allows, including path
//! separators. Every name that becomes a path segment goes through
//! [`sanitize_segment`] first, so a mirrored path never leaves the directory
//! it is joined to.

/// Extension of pointer files.
pub const POINTER_EXTENSION: &str = "strm";

/// Longest file name most filesystems accept, in bytes.
const MAX_SEGMENT_BYTES: usize = 255;

const REPLACEMENT: char = '_';

/// Characters that are separators or reserved on at least one major filesystem.
const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Turn a remote display name into a single valid path segment.
///
/// - reserved and control characters become `_`
/// - trailing dots and spaces are dropped
/// - names that end up empty, `.` or `..` become `_`
/// - the result is cut to at most 255 bytes on a char boundary
pub fn sanitize_segment(name: &str) -> String {
    sanitize_with_limit(name, MAX_SEGMENT_BYTES)
}

fn sanitize_with_limit(name: &str, max_bytes: usize) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_control() || RESERVED_CHARS.contains(&c) {
                REPLACEMENT
            } else {
                c
            }
        })
        .collect();

    let mut segment = truncate_to_bytes(&replaced, max_bytes)
        .trim_end_matches(&['.', ' '][..])
        .to_string();

    if segment.is_empty() || segment == "." || segment == ".." {
        segment = REPLACEMENT.to_string();
    }

    segment
}

fn truncate_to_bytes(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Drop the extension of `name`, if it has one.
///
/// Only a dot that is neither the first nor the last character starts an
/// extension, so `.hidden` and `trailing.` are returned unchanged.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => &name[..idx],
        _ => name,
    }
}

/// File name of the pointer for a remote file.
///
/// `Movie.mkv` becomes `Movie.mkv.strm` when extensions are kept and
/// `Movie.strm` when they are stripped.
pub fn pointer_file_name(remote_name: &str, include_extensions: bool) -> String {
    let stem = if include_extensions {
        remote_name
    } else {
        strip_extension(remote_name)
    };
    let max_stem = MAX_SEGMENT_BYTES - POINTER_EXTENSION.len() - 1;
    format!(
        "{}.{}",
        sanitize_with_limit(stem, max_stem),
        POINTER_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_names_unchanged() {
        assert_eq!(sanitize_segment("Season 1"), "Season 1");
        assert_eq!(sanitize_segment("Amélie (2001)"), "Amélie (2001)");
    }

    #[test]
    fn test_sanitize_replaces_separators_and_reserved() {
        assert_eq!(sanitize_segment("AC/DC"), "AC_DC");
        assert_eq!(sanitize_segment(r"a\b"), "a_b");
        assert_eq!(sanitize_segment("What? Why: *now*"), "What_ Why_ _now_");
        assert_eq!(sanitize_segment("tab\there"), "tab_here");
    }

    #[test]
    fn test_sanitize_dot_names() {
        assert_eq!(sanitize_segment(""), "_");
        assert_eq!(sanitize_segment("."), "_");
        assert_eq!(sanitize_segment(".."), "_");
        assert_eq!(sanitize_segment("Dr. Who..."), "Dr. Who");
        assert_eq!(sanitize_segment("name  "), "name");
        assert_eq!(sanitize_segment(".config"), ".config");
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let long = "é".repeat(200);
        let segment = sanitize_segment(&long);
        assert!(segment.len() <= 255);
        assert!(segment.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("a.mp4"), "a");
        assert_eq!(strip_extension("show.s01e01.mkv"), "show.s01e01");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert_eq!(strip_extension("trailing."), "trailing.");
    }

    #[test]
    fn test_pointer_file_name_extension_policy() {
        assert_eq!(pointer_file_name("a.mp4", false), "a.strm");
        assert_eq!(pointer_file_name("a.mp4", true), "a.mp4.strm");
        assert_eq!(pointer_file_name("Movie.mkv", true), "Movie.mkv.strm");
        assert_eq!(pointer_file_name("Movie.mkv", false), "Movie.strm");
        assert_eq!(pointer_file_name("noext", false), "noext.strm");
    }

    #[test]
    fn test_pointer_file_name_is_sanitized() {
        assert_eq!(pointer_file_name("AC/DC - Live.flac", false), "AC_DC - Live.strm");
        assert_eq!(pointer_file_name("..", true), "_.strm");
    }

    #[test]
    fn test_pointer_file_name_fits_limit() {
        let long = format!("{}.mkv", "x".repeat(400));
        let name = pointer_file_name(&long, true);
        assert_eq!(name.len(), 255);
        assert!(name.ends_with(".strm"));
    }
}
