use serde::Deserialize;
use std::num::NonZeroU64;
use std::time::Duration;
use url::Url;

/// Backend services the gateway forwards requests to.
#[derive(Debug, Clone, Deserialize)]
pub struct Upstream {
    /// **Environment variables**:
    /// - `HOSPITAL_UPSTREAM_ADMIN_URL` or `ADMIN_API_URL`
    #[serde(default = "Upstream::default_admin_url")]
    pub admin_url: Url,
    /// **Environment variables**:
    /// - `HOSPITAL_UPSTREAM_CONSULTAS_URL` or `CONSULTAS_API_URL`
    #[serde(default = "Upstream::default_consultas_url")]
    pub consultas_url: Url,
    /// **Environment variables**:
    /// - `HOSPITAL_UPSTREAM_TIMEOUT_SECS`
    #[serde(default = "Upstream::default_timeout_secs")]
    pub timeout_secs: NonZeroU64,
}

impl Upstream {
    const DEFAULT_ADMIN_URL: &'static str = "http://localhost:3000";
    const DEFAULT_CONSULTAS_URL: &'static str = "http://localhost:4000";
    const DEFAULT_TIMEOUT_SECS: u64 = 60;

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.get())
    }

    #[allow(clippy::unwrap_used)]
    fn default_admin_url() -> Url {
        Url::parse(Self::DEFAULT_ADMIN_URL).unwrap()
    }

    #[allow(clippy::unwrap_used)]
    fn default_consultas_url() -> Url {
        Url::parse(Self::DEFAULT_CONSULTAS_URL).unwrap()
    }

    const fn default_timeout_secs() -> NonZeroU64 {
        match NonZeroU64::new(Self::DEFAULT_TIMEOUT_SECS) {
            Some(n) => n,
            None => panic!("DEFAULT_TIMEOUT_SECS is accidentally set to 0"),
        }
    }
}

impl Default for Upstream {
    fn default() -> Self {
        Self {
            admin_url: Self::default_admin_url(),
            consultas_url: Self::default_consultas_url(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}
