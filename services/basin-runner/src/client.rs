//! Basin event listing and CID retrieval.

use reqwest::blocking::Client;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{RunnerConfig, RunnerError, RunnerResult};

fn http_client(config: &RunnerConfig) -> RunnerResult<Client> {
    Ok(Client::builder().timeout(config.http_timeout).build()?)
}

/// Lists the CIDs a namespace published inside a time window.
pub struct EventIndex {
    client: Client,
    url: String,
    limit: u32,
}

impl EventIndex {
    pub fn new(config: &RunnerConfig) -> RunnerResult<Self> {
        Ok(Self {
            client: http_client(config)?,
            url: config.events_url(),
            limit: config.events_limit,
        })
    }

    /// CIDs of events in `[after, before]`, in the order the index returns them.
    ///
    /// Events without a string `cid` are skipped.
    pub fn fetch_cids(&self, after: i64, before: i64) -> RunnerResult<Vec<String>> {
        let events: Vec<Value> = self
            .client
            .get(&self.url)
            .query(&[
                ("limit", self.limit.to_string()),
                ("after", after.to_string()),
                ("before", before.to_string()),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        let total = events.len();
        let cids: Vec<String> = events
            .into_iter()
            .filter_map(|event| event.get("cid").and_then(Value::as_str).map(str::to_string))
            .collect();
        if cids.len() < total {
            warn!(skipped = total - cids.len(), "Events without a CID ignored");
        }
        info!(events = total, cids = cids.len(), "Fetched event index");
        Ok(cids)
    }
}

/// Downloads a CID to a temporary file, falling back once to the public
/// gateway when the preferred source fails.
pub struct Retriever {
    client: Client,
    config: RunnerConfig,
}

impl Retriever {
    pub fn new(config: &RunnerConfig) -> RunnerResult<Self> {
        Ok(Self {
            client: http_client(config)?,
            config: config.clone(),
        })
    }

    pub fn fetch(&self, cid: &str) -> RunnerResult<NamedTempFile> {
        let preferred = match self.download(&self.config.preferred_url(cid)) {
            Ok(file) => return Ok(file),
            Err(reason) => reason,
        };
        warn!(cid, reason = %preferred, "Preferred source failed; trying public gateway");

        match self.download(&self.config.fallback_url(cid)) {
            Ok(file) => Ok(file),
            Err(fallback) => Err(RunnerError::Retrieval {
                cid: cid.to_string(),
                preferred,
                fallback,
            }),
        }
    }

    /// Any failure is flattened to a message so both attempts can be reported.
    fn download(&self, url: &str) -> Result<NamedTempFile, String> {
        debug!(url, "Downloading");
        let mut response = self.client.get(url).send().map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("{url} returned {status}"));
        }

        let mut file = self.scratch_file().map_err(|e| e.to_string())?;
        let bytes = response.copy_to(&mut file).map_err(|e| e.to_string())?;
        debug!(url, bytes, "Download complete");
        Ok(file)
    }

    fn scratch_file(&self) -> std::io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("telemetry-").suffix(".parquet");
        match &self.config.download_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)
            }
            None => builder.tempfile(),
        }
    }
}
