//! # Grip Search CLI Entry Point
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the
//!    tracing subscriber.
//! 2. **Dispatch**: Runs the GRIPSource server, lists backend tables, or generates a
//!    configuration.
//! 3. **Presentation**: Prints results to standard output and failures to standard error.

mod cli;
mod logging;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use futures_util::StreamExt;
use grip_search_core::{ProxyConfig, SearchClient, SearchProxy, generate_config};
use gripper_proto::FILE_DESCRIPTOR_SET;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::process;
use tonic::transport::Server;
use tracing::info;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    logging::init(args.log_format);

    let result = match args.command {
        Commands::Server { config, port } => serve(&config, port).await,
        Commands::List { base_url } => list(&base_url).await,
        Commands::GenConfig { base_url } => gen_config(&base_url).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn serve(config_path: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = ProxyConfig::load(config_path)
        .with_context(|| format!("Cannot load config '{}'", config_path.display()))?;

    if let Some(port) = port {
        config.port = port;
    }

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let proxy = SearchProxy::new(config).context("Cannot create search client")?;

    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()
        .context("Cannot build reflection service")?;

    info!(
        %addr,
        backend = %proxy.config().base_url,
        collections = proxy.config().queryable_collections().count(),
        "starting GRIPSource server"
    );

    Server::builder()
        .add_service(reflection)
        .add_service(proxy.into_server())
        .serve_with_shutdown(addr, shutdown_signal())
        .await
        .with_context(|| format!("Server on {addr} failed"))?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn list(base_url: &str) -> anyhow::Result<()> {
    let client = SearchClient::new(base_url)?;
    let mut tables = client.list_collections();

    while let Some(table) = tables.next().await {
        println!("{}", serde_json::to_string(&table)?);
    }

    Ok(())
}

async fn gen_config(base_url: &str) -> anyhow::Result<()> {
    let client = SearchClient::new(base_url)?;
    let config = generate_config(&client).await;

    println!("{}", config.to_yaml_string()?);
    Ok(())
}
