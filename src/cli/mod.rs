pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use client::ApiClient;

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Scout CLI - administer a Scout API server")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, env = "SCOUT_URL", default_value = "http://localhost:3000", help = "Server base URL")]
    pub url: String,

    #[arg(long, short = 'u', global = true, env = "SCOUT_USERNAME", help = "Username for authenticated calls")]
    pub username: Option<String>,

    #[arg(long, short = 'p', global = true, env = "SCOUT_PASSWORD", hide_env_values = true, help = "Password for authenticated calls")]
    pub password: Option<String>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Check credentials and print the role and a bearer token")]
    Login,

    #[command(about = "Create the default admin account if it does not exist")]
    Init,

    #[command(about = "User management (requires users permissions)")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UserCommands,
    },

    #[command(about = "Upload a file of scouting entries through the bulk endpoint")]
    Ingest {
        #[arg(help = "JSON file holding an entry array or {\"entries\": [...]}")]
        file: std::path::PathBuf,
        #[arg(long, env = "SCOUT_INGEST_SECRET", hide_env_values = true, help = "Shared ingest secret")]
        secret: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = ApiClient::new(&cli.url, cli.username, cli.password)?;

    match cli.command {
        Commands::Login => commands::auth::login(&client, output_format).await,
        Commands::Init => commands::auth::init(&client, output_format).await,
        Commands::Users { cmd } => commands::users::handle(&client, cmd, output_format).await,
        Commands::Ingest { file, secret } => {
            commands::ingest::handle(&client, &file, &secret, output_format).await
        }
    }
}
