//! Backend entry-point: applies migrations, then serves the REST API or runs
//! an administrative command.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

mod server;

use std::ffi::OsString;

use actix_web::web;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Report, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use experiences::domain::ports::{RegisterUserRequest, UserAccounts};
use experiences::domain::{Email, Password, UserName};
use experiences::inbound::http::health::HealthState;
use experiences::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

use server::{ServerConfig, ServerSettings, build_user_accounts, create_server};

/// `experiences` command arguments.
#[derive(Debug, Parser)]
#[command(name = "experiences", about = "Experiences REST backend", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (the default).
    Serve,
    /// Create an account with staff and superuser rights.
    CreateSuperuser {
        #[arg(long, value_name = "address")]
        email: String,
        #[arg(long, value_name = "password")]
        password: String,
        #[arg(long, value_name = "name", default_value = "")]
        name: String,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let settings = ServerSettings::load_from_iter([OsString::from("experiences")])
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    let pool = connect(&settings).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings, pool).await,
        Command::CreateSuperuser {
            email,
            password,
            name,
        } => create_superuser(&pool, &email, &password, &name).await,
    }
}

/// Apply pending migrations and open the connection pool.
async fn connect(settings: &ServerSettings) -> Result<DbPool> {
    let database_url = settings.database_url()?;
    let applied = run_pending_migrations(database_url)
        .await
        .wrap_err("database migration failed")?;
    info!(applied, "migrations applied");

    let config = PoolConfig::new(database_url).with_max_size(settings.db_max_connections()?);
    DbPool::new(config)
        .await
        .wrap_err("failed to create database pool")
}

async fn serve(settings: ServerSettings, pool: DbPool) -> Result<()> {
    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig {
        bind_addr: settings.bind_addr()?,
        pool,
        settings,
    };
    let server = create_server(health_state, config).wrap_err("failed to start server")?;
    server.await.wrap_err("server terminated")
}

async fn create_superuser(pool: &DbPool, email: &str, password: &str, name: &str) -> Result<()> {
    let request = RegisterUserRequest {
        email: Email::parse(email).map_err(Report::new)?,
        password: Password::new(password).map_err(Report::new)?,
        name: UserName::new(name).map_err(Report::new)?,
    };
    let user = build_user_accounts(pool)
        .create_superuser(request)
        .await
        .map_err(|err| eyre!("failed to create superuser: {err}"))?;
    info!(user_id = %user.id(), email = %user.email(), "superuser created");
    Ok(())
}
