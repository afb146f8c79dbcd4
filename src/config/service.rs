use error_stack::{Report, Result, ResultExt};
use serde::{de::DeserializeOwned, Deserialize};
use validator::Validate;

use super::{Auth, Database, Listen, ParseError, Upstream};
use crate::util::{figment::FigmentErrorAttachable, validator::IntoValidatorReport};

/// Configuration of the gateway/reverse proxy.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Gateway {
    pub listen: Listen,
    #[validate(nested)]
    pub auth: Auth,
    #[serde(default)]
    pub upstream: Upstream,
}

/// Configuration of the admin data service.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Admin {
    pub listen: Listen,
    #[validate(nested)]
    pub auth: Auth,
    #[validate(nested)]
    pub db: Database,
}

/// Configuration of the consultations service.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Consultas {
    pub listen: Listen,
    #[validate(nested)]
    pub auth: Auth,
    #[validate(nested)]
    pub db: Database,
}

impl Gateway {
    pub const DEFAULT_PORT: u16 = 8080;

    pub fn load() -> Result<Self, ParseError> {
        load(figment(Self::DEFAULT_PORT))
    }
}

impl Admin {
    pub const DEFAULT_PORT: u16 = 3000;

    pub fn load() -> Result<Self, ParseError> {
        load(figment(Self::DEFAULT_PORT))
    }
}

impl Consultas {
    pub const DEFAULT_PORT: u16 = 4000;

    pub fn load() -> Result<Self, ParseError> {
        load(figment(Self::DEFAULT_PORT))
    }
}

fn load<T: DeserializeOwned + Validate>(figment: figment::Figment) -> Result<T, ParseError> {
    dotenvy::dotenv().ok();

    let config = figment
        .extract::<T>()
        .map_err(|e| Report::new(ParseError).attach_figment_error(e))?;

    config
        .validate()
        .into_validator_report()
        .change_context(ParseError)?;

    Ok(config)
}

const DEFAULT_CONFIG_FILE: &str = "hospital.toml";

/// Creates a default [`Figment`] object to load service
/// configuration from `hospital.toml` and the environment.
///
/// [`Figment`]: figment::Figment
pub(crate) fn figment(default_port: u16) -> figment::Figment {
    use figment::{
        providers::{Env, Format, Serialized, Toml},
        Figment,
    };

    Figment::new()
        .merge(Serialized::default("listen.port", default_port))
        .merge(Toml::file(DEFAULT_CONFIG_FILE))
        // One big con about figment (env provider to be specific) especially
        // these fields with underscore in it.
        .merge(Env::prefixed("HOSPITAL_").map(|v| match v.as_str() {
            "LISTEN_REQUEST_TIMEOUT_SECS" => "listen.request_timeout_secs".into(),

            "AUTH_JWT_SECRET" => "auth.jwt_secret".into(),
            "AUTH_GOOGLE_CLIENT_ID" => "auth.google_client_id".into(),

            "DB_POOL_SIZE" => "db.pool_size".into(),
            "DB_MIN_IDLE" => "db.min_idle".into(),
            "DB_TIMEOUT_SECS" => "db.timeout_secs".into(),
            "DB_ENFORCE_TLS" => "db.enforce_tls".into(),
            "DB_RUN_MIGRATIONS" => "db.run_migrations".into(),

            "UPSTREAM_ADMIN_URL" => "upstream.admin_url".into(),
            "UPSTREAM_CONSULTAS_URL" => "upstream.consultas_url".into(),
            "UPSTREAM_TIMEOUT_SECS" => "upstream.timeout_secs".into(),

            _ => v.as_str().replace('_', ".").into(),
        }))
        // Environment variable aliases
        .merge(
            Env::raw()
                .only(&["DATABASE_URL", "JWT_SECRET", "ADMIN_API_URL", "CONSULTAS_API_URL"])
                .map(|v| match v.as_str() {
                    "DATABASE_URL" => "db.url".into(),
                    "JWT_SECRET" => "auth.jwt_secret".into(),
                    "ADMIN_API_URL" => "upstream.admin_url".into(),
                    "CONSULTAS_API_URL" => "upstream.consultas_url".into(),
                    _ => v.into(),
                }),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::num::{NonZeroU32, NonZeroU64};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn env_aliases() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "postgres://localhost/admin");
            jail.set_env("JWT_SECRET", SECRET);

            jail.set_env("HOSPITAL_DB_MIN_IDLE", "2");
            jail.set_env("HOSPITAL_DB_POOL_SIZE", "20");
            jail.set_env("HOSPITAL_DB_ENFORCE_TLS", "false");
            jail.set_env("HOSPITAL_DB_TIMEOUT_SECS", "30");
            jail.set_env("HOSPITAL_LISTEN_REQUEST_TIMEOUT_SECS", "10");

            let config: Admin = figment(Admin::DEFAULT_PORT).extract()?;
            assert_eq!(config.db.url.as_str(), "postgres://localhost/admin");
            assert_eq!(config.auth.jwt_secret.as_str(), SECRET);
            assert_eq!(config.db.min_idle, NonZeroU32::new(2));
            assert_eq!(config.db.pool_size, NonZeroU32::new(20).unwrap());
            assert!(!config.db.enforce_tls);
            assert!(!config.db.run_migrations);
            assert_eq!(config.db.timeout_secs, NonZeroU64::new(30).unwrap());
            assert_eq!(config.listen.request_timeout_secs, NonZeroU64::new(10).unwrap());
            assert_eq!(config.listen.port, Admin::DEFAULT_PORT);
            assert_eq!(config.auth.issuer, Auth::DEFAULT_ISSUER);
            assert_eq!(config.auth.audience, Auth::DEFAULT_AUDIENCE);

            Ok(())
        });
    }

    #[test]
    fn gateway_defaults_and_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                [listen]
                port = 9000

                [auth]
                jwt_secret = "0123456789abcdef0123456789abcdef"
                "#,
            )?;
            jail.set_env("CONSULTAS_API_URL", "http://consultas:4000");

            let config: Gateway = figment(Gateway::DEFAULT_PORT).extract()?;
            assert_eq!(config.listen.port, 9000);
            assert_eq!(config.upstream.admin_url.as_str(), "http://localhost:3000/");
            assert_eq!(config.upstream.consultas_url.as_str(), "http://consultas:4000/");
            assert_eq!(config.upstream.timeout_secs, NonZeroU64::new(60).unwrap());
            assert!(config.auth.google_client_id.is_none());

            Ok(())
        });
    }

    #[test]
    fn per_service_default_port() {
        Jail::expect_with(|jail| {
            jail.set_env("JWT_SECRET", SECRET);
            jail.set_env("DATABASE_URL", "postgres://localhost/consultas");

            let config: Consultas = figment(Consultas::DEFAULT_PORT).extract()?;
            assert_eq!(config.listen.port, 4000);
            Ok(())
        });
    }

    #[test]
    fn rejects_short_secret() {
        Jail::expect_with(|jail| {
            jail.set_env("JWT_SECRET", "short");

            let result = load::<Gateway>(figment(Gateway::DEFAULT_PORT));
            assert!(result.is_err());
            Ok(())
        });
    }

    #[test]
    fn rejects_non_postgres_url() {
        Jail::expect_with(|jail| {
            jail.set_env("JWT_SECRET", SECRET);
            jail.set_env("DATABASE_URL", "mysql://localhost/admin");

            let result = load::<Admin>(figment(Admin::DEFAULT_PORT));
            let report = format!("{:?}", result.unwrap_err());
            assert!(report.contains("Invalid Postgres connection URL"));
            Ok(())
        });
    }
}
