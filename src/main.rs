use std::sync::Mutex;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use nest_funds::config::AppConfig;
use nest_funds::database::db::{connection, migrate};
use nest_funds::database::models::Role;
use nest_funds::domain::members;
use nest_funds::{backend, cli};

const TUI_LOG_FILE: &str = "nest_funds.log";

#[derive(Parser)]
#[command(name = "nest-funds")]
#[command(about = "Membership, donation and death committee ledger")]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Server,
    /// Run the terminal console (default)
    Tui,
    /// Apply database migrations and exit
    Migrate,
    /// Create an account
    CreateUser {
        email: String,
        password: String,
        name: String,
        #[arg(long, default_value = "MEMBER")]
        role: Role,
    },
    /// Create an admin account
    CreateAdmin {
        email: String,
        password: String,
        name: String,
    },
    /// Replace a user's password
    ResetPassword { email: String, password: String },
}

fn init_logging(filter: &str, to_file: bool) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::new(filter));
    if to_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(TUI_LOG_FILE)
            .with_context(|| format!("opening {TUI_LOG_FILE}"))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Cli::parse();
    let config = AppConfig::from_env()?;

    let cmd = args.cmd.unwrap_or(Command::Tui);
    init_logging(&config.log, matches!(cmd, Command::Tui))?;

    let pool = connection::get_db_pool(&config.database_url)
        .await
        .with_context(|| format!("connecting to {}", config.database_url))?;
    migrate::run_migrations(&pool).await?;

    match cmd {
        Command::Server => backend::run_server(pool, config).await?,
        Command::Tui => cli::run(pool, config).await?,
        Command::Migrate => {
            tracing::info!(database = %config.database_url, "migrations up to date");
        }
        Command::CreateUser { email, password, name, role } => {
            let user = members::create_user(&pool, &config, &email, &password, &name, role).await?;
            println!("Created {} {} <{}>", user.role, user.name, user.email);
        }
        Command::CreateAdmin { email, password, name } => {
            let user = members::create_user(&pool, &config, &email, &password, &name, Role::Admin).await?;
            println!("Created {} {} <{}>", user.role, user.name, user.email);
        }
        Command::ResetPassword { email, password } => {
            members::reset_password(&pool, &config, &email, &password).await?;
            println!("Password updated for {email}");
        }
    }
    Ok(())
}
