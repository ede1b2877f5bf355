use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::models::BoundsPolicy;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the clip backend
    pub backend_url: Url,

    /// Address the local console listens on
    pub listen_addr: SocketAddr,

    /// Timeout applied to every backend request
    pub request_timeout: Duration,

    /// How out-of-range form numbers are handled
    pub bounds_policy: BoundsPolicy,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Optional environment variables:
    /// - CLIPCRAFT_BACKEND_URL: clip backend base URL (default: http://localhost:8000)
    /// - CLIPCRAFT_LISTEN_ADDR: console bind address (default: 127.0.0.1:3000)
    /// - CLIPCRAFT_REQUEST_TIMEOUT: request timeout in seconds (default: 30)
    /// - CLIPCRAFT_BOUNDS_POLICY: clamp, reject or passthrough (default: clamp)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = parse_backend_url(
            &lookup("CLIPCRAFT_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
        )?;

        let raw_addr =
            lookup("CLIPCRAFT_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = raw_addr.parse().map_err(|e: std::net::AddrParseError| {
            invalid("CLIPCRAFT_LISTEN_ADDR", &raw_addr, e.to_string())
        })?;

        let request_timeout = match lookup("CLIPCRAFT_REQUEST_TIMEOUT") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(invalid(
                        "CLIPCRAFT_REQUEST_TIMEOUT",
                        &raw,
                        "expected a positive number of seconds".to_string(),
                    ))
                }
            },
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let bounds_policy = match lookup("CLIPCRAFT_BOUNDS_POLICY") {
            Some(raw) => raw
                .parse::<BoundsPolicy>()
                .map_err(|reason| invalid("CLIPCRAFT_BOUNDS_POLICY", &raw, reason))?,
            None => BoundsPolicy::default(),
        };

        Ok(Config {
            backend_url,
            listen_addr,
            request_timeout,
            bounds_policy,
        })
    }
}

fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| invalid("CLIPCRAFT_BACKEND_URL", raw, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(
            "CLIPCRAFT_BACKEND_URL",
            raw,
            format!("unsupported scheme {other:?}"),
        )),
    }
}

fn invalid(var: &'static str, value: &str, reason: String) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason,
    }
}
