use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Validate that a string looks like a URL.
/// Rejects anything that isn't http:// or https://.
fn validate_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(())
    } else {
        Err(Error::Download(format!(
            "invalid URL (must start with http:// or https://): {trimmed}"
        )))
    }
}

/// Next output file number given the numbers already present: `max + 1`, or
/// `floor` when there are none. Pure over the listing; the caller performs
/// the directory read.
pub fn next_file_number(existing: impl IntoIterator<Item = u64>, floor: u64) -> u64 {
    existing
        .into_iter()
        .max()
        .map_or(floor, |max| max + 1)
}

/// Numeric stems of the caption files already in `dir`.
/// A `1000.ko.vtt` entry yields 1000; non-numeric stems are skipped.
pub fn existing_file_numbers(dir: &Path) -> Result<Vec<u64>> {
    let mut numbers = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.ends_with(".vtt") {
            continue;
        }
        let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(n) = digits.parse::<u64>() {
            numbers.push(n);
        }
    }
    Ok(numbers)
}

/// Download the auto-generated subtitle track for a video URL using yt-dlp.
/// Returns the path the caption file is written to:
/// `{output_dir}/{file_number}.{sub_lang}.vtt`.
///
/// # Security
/// - URL is validated to start with http:// or https://
/// - Arguments are passed to yt-dlp via `.arg()` (no shell expansion)
/// - `--no-exec` prevents yt-dlp from running post-processing commands
pub async fn download_subtitles(
    url: &str,
    output_dir: &Path,
    file_number: u64,
    sub_lang: &str,
) -> Result<PathBuf> {
    validate_url(url)?;

    info!(%url, file_number, "downloading subtitles");

    // Check yt-dlp is installed
    let check = tokio::process::Command::new("yt-dlp")
        .arg("--version")
        .output()
        .await;

    if check.is_err() {
        return Err(Error::YtDlpNotFound);
    }

    std::fs::create_dir_all(output_dir)?;

    let output_template = output_dir
        .join(file_number.to_string())
        .to_str()
        .ok_or_else(|| Error::Download("output directory path contains invalid UTF-8".into()))?
        .to_string();

    let output = tokio::process::Command::new("yt-dlp")
        .args([
            "--write-auto-subs",
            "--write-subs",
            "--sub-langs",
            sub_lang,
            "--sub-format",
            "vtt",
            "--skip-download",
            "--no-playlist",
            "--no-exec",
            "--output",
            &output_template,
        ])
        .arg(url)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // Limit error message length to avoid dumping huge stderr
        let stderr_truncated: String = stderr.chars().take(1000).collect();
        return Err(Error::Download(format!("yt-dlp failed: {stderr_truncated}")));
    }

    let caption_path = output_dir.join(format!("{file_number}.{sub_lang}.vtt"));
    if !caption_path.exists() {
        return Err(Error::Download(format!(
            "caption file not written at {} (video may have no {} subtitle track)",
            caption_path.display(),
            sub_lang
        )));
    }

    debug!(path = %caption_path.display(), "subtitles downloaded");

    Ok(caption_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_https() {
        assert!(validate_url("https://youtube.com/watch?v=abc").is_ok());
    }

    #[test]
    fn test_validate_url_http() {
        assert!(validate_url("http://example.com/watch?v=abc").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_no_scheme() {
        assert!(validate_url("youtube.com/watch?v=abc").is_err());
    }

    #[test]
    fn test_validate_url_rejects_file_scheme() {
        assert!(validate_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_validate_url_rejects_empty() {
        assert!(validate_url("").is_err());
    }

    #[test]
    fn test_validate_url_rejects_command() {
        assert!(validate_url("$(whoami)").is_err());
    }

    #[test]
    fn test_next_file_number_empty_uses_floor() {
        assert_eq!(next_file_number(std::iter::empty(), 1000), 1000);
    }

    #[test]
    fn test_next_file_number_is_max_plus_one() {
        assert_eq!(next_file_number([1000, 1003, 1001], 1000), 1004);
    }

    #[test]
    fn test_next_file_number_ignores_floor_when_files_exist() {
        assert_eq!(next_file_number([5], 1000), 6);
    }

    #[test]
    fn test_existing_file_numbers_parses_caption_stems() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1000.ko.vtt"), "").unwrap();
        std::fs::write(dir.path().join("1002.en.vtt"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::write(dir.path().join("draft.vtt"), "").unwrap();

        let mut numbers = existing_file_numbers(dir.path()).unwrap();
        numbers.sort_unstable();
        assert_eq!(numbers, vec![1000, 1002]);
    }
}
