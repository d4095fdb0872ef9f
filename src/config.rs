//! Configuration manager for xpressboat.
//!
//! Everything comes from environment variables, optionally seeded from a
//! `.env` file:
//! - `PORT`: listen port (default: 5000)
//! - `DB_USER`: MongoDB Atlas account username
//! - `DB_PASS`: MongoDB Atlas account password
//! - `MONGODB_URI`: full connection string, replaces the Atlas one when set

use std::env::var;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;
use url::Url;

pub const DEFAULT_PORT: u16 = 5000;
pub const CLUSTER_HOST: &str = "cluster0.jboz5.mongodb.net";
pub const DATABASE_NAME: &str = "xPressBoat";
const CONNECTION_OPTIONS: &str = "retryWrites=true&w=majority";

/// Errors that may occur during the configuration loading process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("cannot build connection string: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Configuration {
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Related to MongoDB configuration.
    pub store: Store,
}

/// MongoDB configuration.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Store {
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Connection string overriding the Atlas cluster.
    pub uri: Option<String>,
}

impl Configuration {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // a missing `.env` file is not an error.
        let _ = dotenvy::dotenv();

        let port = match non_empty("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|err| ConfigError::InvalidEnvVar("PORT".into(), err.to_string()))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            store: Store {
                username: non_empty("DB_USER"),
                password: non_empty("DB_PASS"),
                uri: non_empty("MONGODB_URI"),
            },
        })
    }

    /// Address the server binds to, every interface.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port)
    }
}

impl Store {
    /// Connection string handed to the MongoDB driver.
    pub fn connection_string(&self) -> Result<String, ConfigError> {
        if let Some(uri) = &self.uri {
            return Ok(uri.clone());
        }

        let mut url = Url::parse(&format!(
            "mongodb+srv://{CLUSTER_HOST}/{DATABASE_NAME}?{CONNECTION_OPTIONS}"
        ))?;

        match (&self.username, &self.password) {
            (Some(username), password) => {
                // the userinfo encode set leaves `%` as is.
                let escape = |credential: &str| credential.replace('%', "%25");

                // `set_username` only fails on URLs without host.
                let _ = url.set_username(&escape(username));
                let _ = url.set_password(password.as_deref().map(escape).as_deref());
            },
            (None, _) => {
                tracing::warn!("missing `DB_USER` environment variable, connecting without credentials");
            },
        }

        Ok(url.to_string())
    }
}

fn non_empty(key: &str) -> Option<String> {
    var(key).ok().filter(|value| !value.trim().is_empty())
}
