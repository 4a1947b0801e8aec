//! Filesystem-safe name sanitization.

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Longest file name accepted by common filesystems, in bytes.
const NAME_MAX: usize = 255;

/// Characters that are invalid in a file name on at least one platform.
static INVALID_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[\x00-\x1f\x7f/\\:*?"<>|]"#).expect("static regex is valid")
});

/// Remove characters that cannot appear in a file name.
///
/// - Drops path separators, `: * ? " < > |` and control characters
/// - Trims surrounding whitespace, and trailing dots
/// - Truncates to 255 bytes on a grapheme boundary
/// - Maps `.` and `..` to an empty string
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = INVALID_CHARS.replace_all(name, "");
    let trimmed = cleaned.trim().trim_end_matches('.').trim_end();

    if trimmed.is_empty() {
        return String::new();
    }

    truncate_graphemes(trimmed, NAME_MAX)
}

/// Sanitize an attachment name, stripping any URL scheme first.
pub fn sanitize_attachment_name(name: &str) -> String {
    let stripped = name.replace("https://", "").replace("http://", "");
    sanitize_filename(&stripped)
}

fn truncate_graphemes(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }

    let mut out = String::with_capacity(max_bytes);
    for grapheme in s.graphemes(true) {
        if out.len() + grapheme.len() > max_bytes {
            break;
        }
        out.push_str(grapheme);
    }
    out.trim_end().to_string()
}
