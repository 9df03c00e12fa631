use std::env;

use config::{
    builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File, Map,
};
use serde::Deserialize;

use crate::sqlite;

/// `db/users.db` inside the api crate, so the server finds the same file
/// whichever directory it is started from.
pub const DEFAULT_DATABASE_URL: &str =
    concat!("sqlite://", env!("CARGO_MANIFEST_DIR"), "/db/users.db");
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Server {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub sqlite: sqlite::Settings,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_env(env::vars().collect())
    }

    /// Layers, lowest precedence first: built-in defaults, `config/default`,
    /// `config/local`, `APP__*` variables, then `DATABASE_URL` and
    /// `API_PORT` (or `PORT`). Variables are read from `vars` only.
    pub fn from_env(vars: Map<String, String>) -> Result<Self, ConfigError> {
        let url = vars.get("DATABASE_URL").cloned();
        let port = vars.get("API_PORT").or_else(|| vars.get("PORT")).cloned();

        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true)
                    .source(Some(vars)),
            )
            .set_override_option("sqlite.url", url)?
            .set_override_option("server.port", port)?
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("sqlite.url", DEFAULT_DATABASE_URL)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))
    }
}
