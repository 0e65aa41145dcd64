//! Connection parameters shared by every protocol call.

use std::{fmt, time::Duration};

use anyhow::{anyhow, Result};
use url::Url;

use crate::config::Config;

#[derive(Clone)]
pub struct ConnectionInfo {
    pub host: String,
    pub cluster_id: String,
    pub access_token: String,
    /// Deadline for one statement of an applied script.
    pub apply_timeout: Option<Duration>,
}

impl ConnectionInfo {
    pub fn new(
        host: impl Into<String>,
        cluster_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        let host = host.into();
        Self {
            host: host.trim_end_matches('/').to_string(),
            cluster_id: cluster_id.into(),
            access_token: access_token.into(),
            apply_timeout: None,
        }
    }

    pub fn with_apply_timeout(mut self, timeout: Duration) -> Self {
        self.apply_timeout = Some(timeout);
        self
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let required = |key: &str| {
            cfg.get(key)
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| {
                    anyhow!(
                        "Missing {}. Set it in env, {} or pass it on the command line",
                        key,
                        cfg.config_path.display()
                    )
                })
        };
        let info = Self::new(
            required("DBX_HOST")?,
            required("DBX_CLUSTER_ID")?,
            required("DBX_TOKEN")?,
        );
        Ok(info.with_apply_timeout(cfg.apply_timeout()))
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}{}", self.host, path))
    }

    pub fn endpoint_with_params<'a>(
        &self,
        path: &str,
        params: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Url, url::ParseError> {
        Url::parse_with_params(&format!("{}{}", self.host, path), params)
    }
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("host", &self.host)
            .field("cluster_id", &self.cluster_id)
            .field("access_token", &"<redacted>")
            .field("apply_timeout", &self.apply_timeout)
            .finish()
    }
}
