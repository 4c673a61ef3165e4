use std::{net::SocketAddr, path::PathBuf};

use crate::cli::Cli;

/// Signing secret used when none is configured. Only fit for development.
pub const DEV_JWT_SECRET: &str = "recipe-api-dev-secret";

pub const DB_FILE: &str = "recipe-api.sqlite";

#[derive(Clone, Debug)]
pub struct Configuration {
    pub data_dir: PathBuf,
    pub api_listen: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub log_file: Option<PathBuf>,
    pub reset: bool,
}

impl Configuration {
    pub fn from_cli(cli: &Cli) -> Self {
        let jwt_secret = match cli.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                log::warn!("⚠️ No JWT secret configured, using the development default");
                DEV_JWT_SECRET.to_string()
            }
        };

        Self {
            data_dir: PathBuf::from(&cli.data_dir),
            api_listen: cli.api_listen,
            jwt_secret,
            token_ttl_secs: cli.token_ttl_secs.max(1),
            log_file: cli.log_file.as_ref().map(PathBuf::from),
            reset: cli.reset,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }
}
