//! Status API client for open downtimes and exceptions

use std::sync::Arc;

use crate::io::HttpClient;
use crate::model::{RawResultSet, RecordKind};
use crate::NodewatchError;

/// Issues one authenticated page read against a category's status API
pub struct RecordFetcher {
    http: Arc<dyn HttpClient>,
    page_size: u32,
}

impl std::fmt::Debug for RecordFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordFetcher")
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl RecordFetcher {
    pub fn new(http: Arc<dyn HttpClient>, page_size: u32) -> Self {
        Self { http, page_size }
    }

    /// Fetch the first page of open records of `kind`.
    ///
    /// Transport failures, non-2xx responses and undecodable bodies all
    /// surface as [`NodewatchError::Fetch`]; none of them reads as "no records".
    pub async fn fetch(
        &self,
        base_url: &str,
        kind: RecordKind,
        api_key: &str,
    ) -> crate::Result<RawResultSet> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), kind.path());
        let rows = self.page_size.to_string();
        let query = [
            ("page", "1"),
            ("rows", rows.as_str()),
            ("status", "o"),
            ("key", api_key),
        ];

        let response = self
            .http
            .get(&url, &query)
            .await
            .map_err(|e| NodewatchError::Fetch(format!("{}: {}", url, e)))?;

        if !response.is_success() {
            return Err(NodewatchError::Fetch(format!(
                "{} returned status {}",
                url, response.status
            )));
        }

        let page: RawResultSet = serde_json::from_str(&response.body).map_err(|e| {
            NodewatchError::Fetch(format!("{} returned a malformed body: {}", url, e))
        })?;

        tracing::debug!(
            "Fetched {} open {} record(s) ({} row(s)) from {}",
            page.records,
            kind,
            page.rows.len(),
            url
        );
        Ok(page)
    }
}
