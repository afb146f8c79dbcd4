use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::num::{NonZeroU64, NonZeroUsize};
use std::time::Duration;

/// Where and how a service accepts HTTP connections.
#[derive(Debug, Clone, Deserialize)]
pub struct Listen {
    /// **Environment variables**:
    /// - `HOSPITAL_LISTEN_IP`
    #[serde(default = "Listen::default_ip")]
    pub ip: IpAddr,
    /// Every service has its own default port.
    ///
    /// **Environment variables**:
    /// - `HOSPITAL_LISTEN_PORT`
    pub port: u16,
    /// **Environment variables**:
    /// - `HOSPITAL_LISTEN_WORKERS`
    #[serde(default = "Listen::default_workers")]
    pub workers: NonZeroUsize,
    /// Requests that take longer than this are answered with
    /// `504 Gateway Timeout`.
    ///
    /// **Environment variables**:
    /// - `HOSPITAL_LISTEN_REQUEST_TIMEOUT_SECS`
    #[serde(default = "Listen::default_request_timeout_secs")]
    pub request_timeout_secs: NonZeroU64,
}

impl Listen {
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 65;

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.get())
    }

    const fn default_ip() -> IpAddr {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    }

    fn default_workers() -> NonZeroUsize {
        std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
    }

    const fn default_request_timeout_secs() -> NonZeroU64 {
        match NonZeroU64::new(Self::DEFAULT_REQUEST_TIMEOUT_SECS) {
            Some(n) => n,
            None => panic!("DEFAULT_REQUEST_TIMEOUT_SECS is accidentally set to 0"),
        }
    }
}
