use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Lowest port a service instance may bind; also the default.
pub const DEFAULT_PORT: u16 = 8000;
/// Inclusive upper bound of the usable port range.
pub const MAX_PORT: u16 = 8009;
/// Allowance seeded into a fresh quota record.
pub const INITIAL_ALLOWANCE: i64 = 1000;
/// First output file number when the download directory holds none.
pub const FILE_NUMBER_FLOOR: u64 = 1000;

/// Validate that a port falls inside the permitted instance range.
pub fn validate_port(port: u16) -> Result<u16> {
    if (DEFAULT_PORT..=MAX_PORT).contains(&port) {
        Ok(port)
    } else {
        Err(Error::InvalidPort {
            port,
            min: DEFAULT_PORT,
            max: MAX_PORT,
        })
    }
}

/// Builder for service configuration.
///
/// Defaults mirror a single-instance local deployment: captions land in
/// `~/Downloads/YouTube` (overridable via the `DOWNLOAD_PATH` environment
/// variable), the counter database sits next to the download directory, and
/// a fresh instance is seeded with [`INITIAL_ALLOWANCE`] requests.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory caption files are written into.
    pub download_dir: PathBuf,
    /// Path of the SQLite counter database.
    pub db_path: PathBuf,
    /// Allowance seeded when no record exists for the instance key.
    pub initial_allowance: i64,
    /// Floor for the monotonically increasing output file number.
    pub file_number_floor: u64,
    /// Subtitle language requested from the downloader.
    pub subtitle_lang: String,
    /// Base URL of the OpenAI-compatible chat API.
    pub api_base_url: String,
    /// Chat model used for summarization.
    pub model: String,
    /// File the API key is read from.
    pub api_key_file: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let download_dir = std::env::var_os("DOWNLOAD_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("Downloads")
                    .join("YouTube")
            });
        Self {
            download_dir,
            db_path: PathBuf::from("user_count.db"),
            initial_allowance: INITIAL_ALLOWANCE,
            file_number_floor: FILE_NUMBER_FLOOR,
            subtitle_lang: "ko".into(),
            api_base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4-1106-preview".into(),
            api_key_file: PathBuf::from("openaisec.key"),
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn download_dir(mut self, dir: PathBuf) -> Self {
        self.download_dir = dir;
        self
    }

    pub fn db_path(mut self, path: PathBuf) -> Self {
        self.db_path = path;
        self
    }

    pub fn initial_allowance(mut self, allowance: i64) -> Self {
        self.initial_allowance = allowance;
        self
    }

    pub fn file_number_floor(mut self, floor: u64) -> Self {
        self.file_number_floor = floor;
        self
    }

    pub fn subtitle_lang(mut self, lang: &str) -> Self {
        self.subtitle_lang = lang.into();
        self
    }

    pub fn api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn model(mut self, model: &str) -> Self {
        self.model = model.into();
        self
    }

    pub fn api_key_file(mut self, path: PathBuf) -> Self {
        self.api_key_file = path;
        self
    }

    /// Create the download directory if it does not exist yet.
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.download_dir)?;
        Ok(())
    }

    /// Read and trim the API key from [`ServiceConfig::api_key_file`].
    /// A missing key file is a startup error, not a per-request one.
    pub fn load_api_key(&self) -> Result<String> {
        read_key_file(&self.api_key_file)
    }
}

fn read_key_file(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(contents.trim().to_string()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::ApiKeyNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_port_accepts_range() {
        assert!(validate_port(8000).is_ok());
        assert!(validate_port(8009).is_ok());
    }

    #[test]
    fn test_validate_port_rejects_outside_range() {
        assert!(validate_port(7999).is_err());
        assert!(validate_port(8010).is_err());
        assert!(validate_port(80).is_err());
    }

    #[test]
    fn test_load_api_key_trims() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("api.key");
        std::fs::write(&key_path, "sk-test-key\n").unwrap();

        let config = ServiceConfig::new().api_key_file(key_path);
        assert_eq!(config.load_api_key().unwrap(), "sk-test-key");
    }

    #[test]
    fn test_load_api_key_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::new().api_key_file(dir.path().join("nope.key"));
        assert!(matches!(
            config.load_api_key(),
            Err(Error::ApiKeyNotFound { .. })
        ));
    }
}
