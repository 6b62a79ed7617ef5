//! Request orchestration: allowance consume, subtitle download, transcript
//! normalization, language detection, summarization, and the compensating
//! restore when anything past the consume fails.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::ServiceConfig;
use crate::download;
use crate::error::{Error, Result};
use crate::language::Language;
use crate::normalize;
use crate::prompt::{self, PromptPair};
use crate::quota::QuotaManager;
use crate::store::CounterStore;
use crate::summarize::SummaryClient;

/// Subtitle download collaborator. Writes a caption file named
/// `{file_number}.{sub_lang}.vtt` under `output_dir` and returns its path.
#[async_trait]
pub trait SubtitleSource: Send + Sync {
    async fn download(
        &self,
        url: &str,
        output_dir: &Path,
        file_number: u64,
        sub_lang: &str,
    ) -> Result<PathBuf>;
}

/// Summarization collaborator: prompt pair in, summary text out.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompts: &PromptPair) -> Result<String>;
}

/// Production downloader backed by the yt-dlp subprocess.
pub struct YtDlpSource;

#[async_trait]
impl SubtitleSource for YtDlpSource {
    async fn download(
        &self,
        url: &str,
        output_dir: &Path,
        file_number: u64,
        sub_lang: &str,
    ) -> Result<PathBuf> {
        download::download_subtitles(url, output_dir, file_number, sub_lang).await
    }
}

#[async_trait]
impl Summarizer for SummaryClient {
    async fn summarize(&self, prompts: &PromptPair) -> Result<String> {
        SummaryClient::summarize(self, prompts).await
    }
}

/// Everything a completed request hands back to the caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineResult {
    /// Full deduplicated transcript.
    pub transcript: String,
    /// Model output.
    pub summary: String,
    /// Language the prompt templates were selected for.
    pub language: Language,
    /// Allowance observed after the request completed.
    pub remaining: i64,
}

/// One service instance's request pipeline.
///
/// Owns the quota manager and the two external collaborators. All long
/// work (download, summarizer call) runs outside the quota lock.
pub struct Pipeline<D, S> {
    config: ServiceConfig,
    instance_key: u16,
    quota: QuotaManager,
    downloader: D,
    summarizer: S,
}

impl Pipeline<YtDlpSource, SummaryClient> {
    /// Wire up a production pipeline for the instance listening on `port`:
    /// validates the port, creates the download directory, loads the API
    /// key, opens the counter store, and seeds the quota record if absent.
    pub async fn bootstrap(config: ServiceConfig, port: u16) -> Result<Self> {
        let instance_key = crate::config::validate_port(port)?;
        config.ensure_directories()?;
        let api_key = config.load_api_key()?;

        let store = CounterStore::open(&config.db_path)?;
        let quota = QuotaManager::new(store, config.initial_allowance);
        quota.initialize(instance_key).await?;

        let summarizer = SummaryClient::new(&config.api_base_url, &api_key, &config.model);

        Ok(Self {
            config,
            instance_key,
            quota,
            downloader: YtDlpSource,
            summarizer,
        })
    }
}

impl<D: SubtitleSource, S: Summarizer> Pipeline<D, S> {
    /// Assemble a pipeline from explicit parts. Tests use this to swap in
    /// in-process collaborators.
    pub fn new(
        config: ServiceConfig,
        instance_key: u16,
        quota: QuotaManager,
        downloader: D,
        summarizer: S,
    ) -> Self {
        Self {
            config,
            instance_key,
            quota,
            downloader,
            summarizer,
        }
    }

    pub fn instance_key(&self) -> u16 {
        self.instance_key
    }

    pub fn downloader_ref(&self) -> &D {
        &self.downloader
    }

    pub fn summarizer_ref(&self) -> &S {
        &self.summarizer
    }

    /// Current allowance without consuming anything.
    pub async fn peek_remaining(&self) -> Result<i64> {
        self.quota.remaining(self.instance_key).await
    }

    /// Handle one request end to end.
    ///
    /// Consumes one unit of allowance up front; if no allowance remains the
    /// request is rejected with [`Error::QuotaExhausted`] before any
    /// external call. Every failure after a successful consume triggers
    /// exactly one compensating restore before the error is surfaced.
    pub async fn consume_and_summarize(&self, url: &str) -> Result<PipelineResult> {
        if !self.quota.try_consume(self.instance_key).await? {
            return Err(Error::QuotaExhausted {
                instance_key: self.instance_key,
            });
        }

        match self.run_consumed(url).await {
            Ok(result) => Ok(result),
            Err(err) => {
                // Single compensation point for all post-consume failures.
                if let Err(restore_err) = self.quota.restore(self.instance_key).await {
                    error!(
                        instance_key = self.instance_key,
                        error = %restore_err,
                        "failed to restore allowance after pipeline error"
                    );
                }
                Err(err)
            }
        }
    }

    /// The post-consume stages. Any error returned here has a unit of
    /// allowance to answer for; the caller compensates.
    async fn run_consumed(&self, url: &str) -> Result<PipelineResult> {
        let file_number = download::next_file_number(
            download::existing_file_numbers(&self.config.download_dir)?,
            self.config.file_number_floor,
        );

        let caption_path = self
            .downloader
            .download(
                url,
                &self.config.download_dir,
                file_number,
                &self.config.subtitle_lang,
            )
            .await?;

        let transcript = normalize::normalize_caption_file(&caption_path).await?;
        let language = Language::detect(&transcript);
        let prompts = prompt::prompts_for(language, &transcript);

        let summary = self.summarizer.summarize(&prompts).await?;

        let remaining = self.quota.remaining(self.instance_key).await?;
        info!(
            instance_key = self.instance_key,
            %language,
            remaining,
            "request summarized"
        );

        Ok(PipelineResult {
            transcript,
            summary,
            language,
            remaining,
        })
    }
}
