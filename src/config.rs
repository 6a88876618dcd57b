use std::{fmt, net::IpAddr, str::FromStr};

use anyhow::Context;
use axum::http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(Debug)]
pub struct JwtConfig {
    pub secret: SecretString,
}

pub struct DatabaseConfig {
    pub connect: PgConnectOptions,
    pub max_connections: u32,
}

// PgConnectOptions prints its password, so only the addressing parts are shown.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.connect.get_host())
            .field("port", &self.connect.get_port())
            .field("username", &self.connect.get_username())
            .field("database", &self.connect.get_database())
            .field("password", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub cors_origins: Vec<HeaderValue>,
}

#[derive(Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let connect = match get("DATABASE_URL") {
            Some(url) => PgConnectOptions::from_str(&url).context("invalid DATABASE_URL")?,
            None => connect_options_from_parts(&get)?,
        };
        let database = DatabaseConfig {
            connect,
            max_connections: get("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
        };

        let jwt = JwtConfig {
            secret: SecretString::new(get("JWT_SECRET").context("JWT_SECRET is not set")?),
        };
        if jwt.secret.expose_secret().is_empty() {
            tracing::warn!("JWT_SECRET is empty; token signing and validation will fail");
        }

        let port = get("APP_PORT")
            .or_else(|| get("PORT"))
            .unwrap_or_else(|| "8080".into());
        let host = get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let server = ServerConfig {
            host: host
                .parse()
                .with_context(|| format!("invalid APP_HOST {host:?}, expected an IP address"))?,
            port: port
                .parse()
                .with_context(|| format!("invalid port {port:?}"))?,
            cors_origins: parse_origins(
                &get("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| "http://localhost:3000".into()),
            )?,
        };

        Ok(Self {
            server,
            database,
            jwt,
        })
    }
}

/// Builds connect options field by field, so credentials never pass through URL parsing.
fn connect_options_from_parts<F>(get: &F) -> anyhow::Result<PgConnectOptions>
where
    F: Fn(&str) -> Option<String>,
{
    let host = get("DB_HOST").context("neither DATABASE_URL nor DB_HOST is set")?;
    let port = get("DB_PORT").unwrap_or_else(|| "5432".into());
    let user = get("DB_USER").context("DB_USER is not set")?;
    let name = get("DB_NAME").context("DB_NAME is not set")?;

    let mut options = PgConnectOptions::new()
        .host(&host)
        .port(
            port.parse()
                .with_context(|| format!("invalid DB_PORT {port:?}"))?,
        )
        .username(&user)
        .database(&name)
        .ssl_mode(PgSslMode::Disable);
    if let Some(password) = get("DB_PASSWORD").filter(|p| !p.is_empty()) {
        options = options.password(&password);
    }
    Ok(options)
}

fn parse_origins(raw: &str) -> anyhow::Result<Vec<HeaderValue>> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin {o:?}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_keys_set() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://u:p@db:5432/app"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.server.host, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.cors_origins, vec![HeaderValue::from_static("http://localhost:3000")]);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.jwt.secret.expose_secret(), "s3cret");
    }

    #[test]
    fn database_url_is_composed_from_parts() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DB_HOST", "localhost"),
            ("DB_USER", "tracker"),
            ("DB_PASSWORD", "pw"),
            ("DB_NAME", "expenses"),
            ("JWT_SECRET", "x"),
            ("PORT", "9000"),
        ]))
        .expect("config should load");

        let db = &cfg.database.connect;
        assert_eq!(db.get_host(), "localhost");
        assert_eq!(db.get_port(), 5432);
        assert_eq!(db.get_username(), "tracker");
        assert_eq!(db.get_database(), Some("expenses"));
        assert_eq!(cfg.server.port, 9000);
    }

    #[test]
    fn reserved_characters_in_db_parts_are_kept_literal() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_USER", "tracker"),
            ("DB_PASSWORD", "p@ss/w#rd"),
            ("DB_NAME", "expenses"),
            ("JWT_SECRET", "x"),
        ]))
        .expect("config should load");

        let db = &cfg.database.connect;
        assert_eq!(db.get_host(), "db.internal");
        assert_eq!(db.get_port(), 6543);
        assert_eq!(db.get_username(), "tracker");
        assert_eq!(db.get_database(), Some("expenses"));
        assert!(!format!("{cfg:?}").contains("p@ss/w#rd"));
    }

    #[test]
    fn ipv6_and_invalid_hosts() {
        let base = [("DATABASE_URL", "postgres://u@db/app"), ("JWT_SECRET", "x")];

        let cfg = AppConfig::from_lookup(lookup(&[base[0], base[1], ("APP_HOST", "::")])).unwrap();
        assert_eq!(cfg.server.host, IpAddr::from([0u16; 8]));

        let err = AppConfig::from_lookup(lookup(&[base[0], base[1], ("APP_HOST", "not a host")]))
            .unwrap_err();
        assert!(err.to_string().contains("APP_HOST"));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://u:hunter2@db/app"),
            ("JWT_SECRET", "very-secret-value"),
        ]))
        .unwrap();
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("very-secret-value"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let origins = parse_origins("http://a.test, http://b.test ,").unwrap();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[1], HeaderValue::from_static("http://b.test"));
    }
}
