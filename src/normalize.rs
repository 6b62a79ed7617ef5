use std::path::Path;

use crate::error::{Error, Result};

/// Turn a raw WebVTT caption stream into a deduplicated plain-text
/// transcript.
///
/// Cue timing lines (containing `-->`) and the `WEBVTT` header are dropped,
/// angle-bracket markup is stripped, and exact duplicate lines — auto-caption
/// tracks repeat each line as cues roll — are kept only at their first
/// occurrence. Idempotent: feeding the output back in returns it unchanged.
/// Empty or header-only input yields an empty string, not an error.
pub fn normalize_captions(raw: &str) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut unique_lines = Vec::new();

    for line in raw.lines() {
        if line.contains("-->") {
            continue;
        }
        let clean = strip_markup(line);
        let clean = clean.trim();
        if clean.is_empty() || clean.starts_with("WEBVTT") {
            continue;
        }
        if seen.insert(clean.to_string()) {
            unique_lines.push(clean.to_string());
        }
    }

    unique_lines.join("\n")
}

/// Read a caption file and normalize it.
/// A missing file maps to [`Error::CaptionNotFound`] so the pipeline can
/// report which path the downloader was expected to produce.
pub async fn normalize_caption_file(path: &Path) -> Result<String> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::CaptionNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    Ok(normalize_captions(&raw))
}

/// Remove all `<...>` spans from a line. Inline cue tags like
/// `<00:00:01.000>` and `<c>` carry no transcript text.
fn strip_markup(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut depth = 0usize;
    for c in line.chars() {
        match c {
            '<' => depth += 1,
            '>' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_VTT: &str = "\
WEBVTT

00:00:00.000 --> 00:00:02.500
<c>first line</c>

00:00:02.500 --> 00:00:05.000
first line
second<00:00:03.000> line

00:00:05.000 --> 00:00:07.000
second line
";

    #[test]
    fn test_drops_timing_and_header_lines() {
        let out = normalize_captions(SAMPLE_VTT);
        assert!(!out.contains("-->"));
        assert!(!out.contains("WEBVTT"));
    }

    #[test]
    fn test_strips_inline_tags() {
        let out = normalize_captions(SAMPLE_VTT);
        assert!(!out.contains('<'));
        assert!(out.contains("second line"));
    }

    #[test]
    fn test_deduplicates_preserving_first_occurrence() {
        let input = "a\nb\na\na\nc\nb\n";
        assert_eq!(normalize_captions(input), "a\nb\nc");
    }

    #[test]
    fn test_repeated_line_kept_once_at_first_position() {
        let out = normalize_captions(SAMPLE_VTT);
        assert_eq!(out, "first line\nsecond line");
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let once = normalize_captions(SAMPLE_VTT);
        assert_eq!(normalize_captions(&once), once);
    }

    #[test]
    fn test_empty_input_yields_empty_string() {
        assert_eq!(normalize_captions(""), "");
    }

    #[test]
    fn test_header_only_input_yields_empty_string() {
        assert_eq!(normalize_captions("WEBVTT\n\n"), "");
    }

    #[test]
    fn test_header_metadata_lines_are_kept() {
        // Only the WEBVTT line itself is a header; Kind/Language metadata
        // lines pass through like any other text line.
        let input = "WEBVTT\nKind: captions\nLanguage: ko\n\n\
                     00:00:00.000 --> 00:00:02.000\nhello\n";
        assert_eq!(
            normalize_captions(input),
            "Kind: captions\nLanguage: ko\nhello"
        );
    }

    #[test]
    fn test_strip_markup_unclosed_tag_swallows_rest() {
        assert_eq!(strip_markup("before <never closed"), "before ");
    }

    #[tokio::test]
    async fn test_missing_caption_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1000.ko.vtt");
        let err = normalize_caption_file(&path).await.unwrap_err();
        assert!(matches!(err, Error::CaptionNotFound { .. }));
    }
}
