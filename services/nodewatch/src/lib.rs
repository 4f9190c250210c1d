//! Nodewatch - fleet downtime and exception alerting
//!
//! Polls the secure-node and super-node status APIs for open downtimes and
//! exceptions, drops records of ignored nodes, and posts the rest to a chat
//! webhook. Each invocation performs a single sweep and returns.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod formatter;
pub mod io;
pub mod model;
pub mod orchestrator;

pub use config::{load_config, Config};
pub use error::{NodewatchError, Result};
pub use orchestrator::{PairReport, PollOrchestrator, RunReport};

use std::sync::Arc;
use std::time::Duration;

use crate::io::ReqwestHttpClient;

/// Validate `config` and run one sweep against the live endpoints
pub async fn run(config: Config) -> Result<RunReport> {
    config.validate()?;

    let timeout = Duration::from_secs(config.fetch.timeout_seconds);
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::new(timeout)?);

    tracing::debug!(
        "Sweeping with strategy {:?}, page size {}, fetch errors {:?}",
        config.format.strategy,
        config.fetch.page_size,
        config.fetch.on_error
    );

    PollOrchestrator::new(&config, http).run().await
}
