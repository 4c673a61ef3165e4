use clap::Parser;
use std::env;

use crate::cli::command::Command;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Recipe sharing REST API",
    long_about = "A JSON REST API for users, roles, categories, ingredients, recipes and reviews, backed by SQLite and secured with JWT bearer tokens.",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,

    #[arg(
        long,
        env = "RECIPE_API_DATA_DIR",
        default_value = ".recipe-api/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long = "jwt-secret",
        env = "RECIPE_API_JWT_SECRET",
        value_name = "SECRET",
        hide_env_values = true,
        help = "HMAC secret used to sign access tokens"
    )]
    pub jwt_secret: Option<String>,

    #[arg(
        long = "token-ttl-secs",
        env = "RECIPE_API_TOKEN_TTL_SECS",
        default_value_t = 86_400i64,
        value_name = "SECS",
        help = "Lifetime of issued access tokens"
    )]
    pub token_ttl_secs: i64,

    #[arg(
        long = "log-file",
        env = "RECIPE_API_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long = "api-listen",
        env = "RECIPE_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:8080",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    if dotenvy::from_filename(&dotenv_path).is_ok() {
        log::info!("📄 Loaded env from {}", dotenv_path);
    }
    Cli::parse()
}
