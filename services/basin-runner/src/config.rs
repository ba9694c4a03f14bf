//! Runner configuration from the environment.

use chrono::NaiveDate;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use wxresolve_core::PipelineConfig;

use crate::{RunnerError, RunnerResult};

pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs";
pub const DEFAULT_IPFS_LOCAL_GATEWAY: &str = "http://localhost:8080/ipfs";
pub const DEFAULT_BASIN_STORAGE_URL: &str = "https://basin.tableland.xyz/events";
pub const DEFAULT_EVENTS_LIMIT: u32 = 100;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where a CID is fetched from before falling back to the public gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CidSource {
    /// Basin event storage
    #[default]
    Basin,
    /// A local IPFS node's gateway
    Ipfs,
}

impl FromStr for CidSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basin" => Ok(CidSource::Basin),
            "ipfs" => Ok(CidSource::Ipfs),
            other => Err(format!("expected `basin` or `ipfs`, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub namespace: String,
    pub base_url: String,
    pub after_date: String,
    pub before_date: String,
    /// Window start, UTC unix seconds
    pub after: i64,
    /// Window end, UTC unix seconds
    pub before: i64,
    pub ipfs_gateway: String,
    pub ipfs_local_gateway: String,
    pub basin_storage_url: String,
    pub cid_source: CidSource,
    pub events_limit: u32,
    pub http_timeout: Duration,
    pub download_dir: Option<PathBuf>,
    pub lowmem: bool,
    pub pipeline: PipelineConfig,
}

impl RunnerConfig {
    pub fn from_env() -> RunnerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and blank values are treated alike.
    pub fn from_lookup<F>(lookup: F) -> RunnerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(RunnerError::MissingConfiguration(key));

        let namespace = required("BASIN_NAMESPACE")?;
        let base_url = required("BASIN_API_BASE_URL")?;
        let after_date = required("AFTER")?;
        let before_date = required("BEFORE")?;
        let after = unix_timestamp(&after_date)?;
        let before = unix_timestamp(&before_date)?;
        if after > before {
            return Err(RunnerError::MalformedDateRange(format!(
                "AFTER {after_date} is later than BEFORE {before_date}"
            )));
        }

        let mut pipeline = match get("WXRESOLVE_CONFIG") {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(path) = get("BOUNDARY_PATH") {
            pipeline.boundary.path = PathBuf::from(path);
        }
        if let Some(resolution) = parsed(&get, "H3_RESOLUTION")? {
            pipeline.boundary.resolution = resolution;
        }
        pipeline.validate()?;

        let cid_source = match get("CID_SOURCE") {
            Some(value) => value
                .parse()
                .map_err(|reason| RunnerError::InvalidConfiguration {
                    var: "CID_SOURCE",
                    reason,
                })?,
            None => CidSource::default(),
        };

        Ok(Self {
            namespace,
            base_url,
            after_date,
            before_date,
            after,
            before,
            ipfs_gateway: get("IPFS_GATEWAY").unwrap_or_else(|| DEFAULT_IPFS_GATEWAY.to_string()),
            ipfs_local_gateway: get("IPFS_LOCAL_GATEWAY")
                .unwrap_or_else(|| DEFAULT_IPFS_LOCAL_GATEWAY.to_string()),
            basin_storage_url: get("BASIN_STORAGE_URL")
                .unwrap_or_else(|| DEFAULT_BASIN_STORAGE_URL.to_string()),
            cid_source,
            events_limit: parsed(&get, "EVENTS_LIMIT")?.unwrap_or(DEFAULT_EVENTS_LIMIT),
            http_timeout: Duration::from_secs(
                parsed(&get, "HTTP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            download_dir: get("DOWNLOAD_DIR").map(PathBuf::from),
            lowmem: parsed(&get, "LOWMEM")?.unwrap_or(true),
            pipeline,
        })
    }

    /// URL tried first for a CID.
    pub fn preferred_url(&self, cid: &str) -> String {
        let base = match self.cid_source {
            CidSource::Basin => &self.basin_storage_url,
            CidSource::Ipfs => &self.ipfs_local_gateway,
        };
        join(base, cid)
    }

    /// Public gateway URL tried once when the preferred source fails.
    pub fn fallback_url(&self, cid: &str) -> String {
        join(&self.ipfs_gateway, cid)
    }

    pub fn events_url(&self) -> String {
        format!("{}/events", join(&self.base_url, &self.namespace))
    }
}

fn join(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment)
}

fn parsed<T, G>(get: &G, key: &'static str) -> RunnerResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|e| RunnerError::InvalidConfiguration {
                    var: key,
                    reason: format!("{value:?}: {e}"),
                })
        })
        .transpose()
}

/// Midnight UTC of a `%Y-%m-%d` date, in unix seconds.
pub fn unix_timestamp(date: &str) -> RunnerResult<i64> {
    let day = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| RunnerError::MalformedDateRange(format!("{date:?}: {e}")))?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| RunnerError::MalformedDateRange(format!("{date:?}: no midnight")))?;
    Ok(midnight.and_utc().timestamp())
}
