//! Connection configuration.

use std::env;
use std::time::Duration;

use tokio_postgres::config::Host;

use crate::error::{OrmError, OrmResult};

/// Settings used to open the PostgreSQL session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Reported to the server as `application_name`.
    pub application_name: Option<String>,
    pub connect_timeout: Option<Duration>,
    /// Server options sent at startup, e.g. `-c search_path=blog`.
    pub options: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            username: "postgres".to_string(),
            password: String::new(),
            application_name: Some("pgrecord".to_string()),
            connect_timeout: Some(Duration::from_secs(10)),
            options: None,
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Parse a `postgres://` URL or a key/value connection string.
    pub fn from_url(url: &str) -> OrmResult<Self> {
        let parsed: tokio_postgres::Config = url
            .parse()
            .map_err(|e: tokio_postgres::Error| OrmError::Config(e.to_string()))?;

        let mut config = Self::default();
        if let Some(Host::Tcp(host)) = parsed.get_hosts().first() {
            config.host = host.clone();
        }
        if let Some(port) = parsed.get_ports().first() {
            config.port = *port;
        }
        if let Some(dbname) = parsed.get_dbname() {
            config.database = dbname.to_string();
        }
        if let Some(user) = parsed.get_user() {
            config.username = user.to_string();
        }
        if let Some(password) = parsed.get_password() {
            config.password = String::from_utf8(password.to_vec())
                .map_err(|_| OrmError::Config("password is not valid UTF-8".to_string()))?;
        }
        if let Some(name) = parsed.get_application_name() {
            config.application_name = Some(name.to_string());
        }
        if let Some(timeout) = parsed.get_connect_timeout() {
            config.connect_timeout = Some(*timeout);
        }
        if let Some(options) = parsed.get_options() {
            config.options = Some(options.to_string());
        }
        Ok(config)
    }

    /// Load settings from the environment, reading a `.env` file first if present.
    ///
    /// `DATABASE_URL` wins when set; otherwise `DB_HOST`, `DB_PORT`,
    /// `DB_DATABASE`, `DB_USERNAME` and `DB_PASSWORD` override the defaults.
    pub fn from_env() -> OrmResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OrmResult<Self> {
        if let Some(url) = lookup("DATABASE_URL") {
            return Self::from_url(&url);
        }

        let mut config = Self::default();
        if let Some(host) = lookup("DB_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| OrmError::Config(format!("DB_PORT is not a valid port: {port}")))?;
        }
        if let Some(database) = lookup("DB_DATABASE") {
            config.database = database;
        }
        if let Some(username) = lookup("DB_USERNAME") {
            config.username = username;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            config.password = password;
        }
        Ok(config)
    }

    /// Build the driver configuration.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.username);
        if !self.password.is_empty() {
            pg.password(&self.password);
        }
        if let Some(name) = &self.application_name {
            pg.application_name(name);
        }
        if let Some(timeout) = self.connect_timeout {
            pg.connect_timeout(timeout);
        }
        if let Some(options) = &self.options {
            pg.options(options);
        }
        pg
    }
}
