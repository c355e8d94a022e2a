//! `zoneadmin` binary: settings administration and the OAuth login server.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use zoneadmin_settings::cli::settings as settings_cli;
use zoneadmin_settings::cli::{Cli, Command};
use zoneadmin_settings::config::{ConfigOverride, ConfigPaths, ProcessEnv};
use zoneadmin_settings::context::AppContext;
use zoneadmin_settings::logging::{LogTarget, init_tracing, level_for};
use zoneadmin_settings::oauth::MemorySessionStore;
use zoneadmin_settings::server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The log level may come from LOG_LEVEL in the environment before files are read.
    let level = level_for(std::env::var("LOG_LEVEL").ok().as_deref(), cli.verbose);
    init_tracing(&LogTarget::parse(&cli.log), level)?;

    let env = ProcessEnv;
    let ctx = AppContext::bootstrap(
        ConfigPaths::discover(),
        &env,
        cli.config.as_ref().map(|p| ConfigOverride::File(PathBuf::from(p))),
        cli.database.as_ref().map(PathBuf::from),
    )
    .context("failed to load settings")?;

    for source in ctx.config_sources() {
        info!(tier = %source.tier, path = ?source.path, "Configuration layer");
    }

    match cli.command {
        Some(Command::Settings(command)) => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            settings_cli::run(&ctx, &command, &mut out)?;
        }
        Some(Command::Serve { port }) => serve(&ctx, port).await?,
        None => serve(&ctx, None).await?,
    }

    Ok(())
}

async fn serve(ctx: &AppContext, port: Option<u16>) -> Result<()> {
    let host = ctx.host();
    let ip: IpAddr = host
        .get_str("BIND_ADDRESS")
        .unwrap_or_else(|| "127.0.0.1".to_string())
        .parse()
        .context("invalid BIND_ADDRESS")?;
    let port = port.or_else(|| host.get_u16("PORT")).unwrap_or(9191);

    let providers = ctx.oauth_providers().context("failed to configure OAuth providers")?;
    if providers.is_empty() {
        warn!("No OAuth providers enabled");
    } else {
        info!(providers = ?providers.names(), "OAuth providers registered");
    }

    let app = server::build_router(&providers, Arc::new(MemorySessionStore::new()), host.clone());
    let (shutdown_tx, _addr) = server::start_server(app, SocketAddr::new(ip, port)).await?;

    tokio::signal::ctrl_c().await?;
    info!("Received interrupt");
    let _ = shutdown_tx.send(());
    Ok(())
}
