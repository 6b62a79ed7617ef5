//! Quota-gated subtitle summarization.
//!
//! A video URL goes in; the auto-generated subtitle track is downloaded,
//! normalized into a clean transcript, classified by language, and sent to
//! an OpenAI-compatible chat API for summarization — but only while the
//! instance's durable request allowance lasts. A unit of allowance is
//! consumed per accepted request and restored whenever a later stage fails,
//! so the balance always accounts for completed summaries only.
//!
//! ```no_run
//! use subsum::{Pipeline, ServiceConfig};
//!
//! # async fn run() -> subsum::Result<()> {
//! let pipeline = Pipeline::bootstrap(ServiceConfig::default(), 8000).await?;
//! let result = pipeline
//!     .consume_and_summarize("https://www.youtube.com/watch?v=abc123")
//!     .await?;
//! println!("{}\n({} requests left)", result.summary, result.remaining);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod language;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod quota;
pub mod store;
pub mod summarize;

pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use language::Language;
pub use pipeline::{Pipeline, PipelineResult, SubtitleSource, Summarizer, YtDlpSource};
pub use quota::QuotaManager;
pub use store::{CounterStore, QuotaRecord};
pub use summarize::SummaryClient;
