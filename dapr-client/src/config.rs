use std::time::Duration;

use reqwest::Url;

use crate::error::{Error, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 3500;

/// Where the sidecar listens. Built by the caller (typically from
/// `DAPR_HOST` / `DAPR_HTTP_PORT`) and handed to the transport; nothing in
/// this crate reads the environment itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarConfig {
    pub host: String,
    pub http_port: u16,
    /// Per-request timeout enforced by the HTTP client. `None` waits
    /// indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        SidecarConfig {
            host: DEFAULT_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            timeout: None,
        }
    }
}

impl SidecarConfig {
    pub fn base_url(&self) -> Result<Url> {
        let s = format!("http://{}:{}/", self.host, self.http_port);
        Url::parse(&s).map_err(|e| Error::InvalidEndpoint(format!("{}: {}", s, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        assert_eq!(
            SidecarConfig::default().base_url().unwrap().as_str(),
            "http://127.0.0.1:3500/"
        );
    }

    #[test]
    fn test_custom_base_url() {
        let config = SidecarConfig {
            host: "dapr.local".to_string(),
            http_port: 3601,
            timeout: Some(Duration::from_secs(1)),
        };
        assert_eq!(config.base_url().unwrap().as_str(), "http://dapr.local:3601/");
    }

    #[test]
    fn test_invalid_host() {
        let config = SidecarConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.base_url(), Err(Error::InvalidEndpoint(_))));
    }
}
