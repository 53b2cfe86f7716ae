#[cfg(test)]
mod tests;

use crate::client::FailoverClient;
use crate::config::{Config, YouTubeConfig, load_config};
use crate::format::format_server_status;
use crate::gateway::{self, AppState};
use crate::health::HealthService;
use crate::responder::{AutoResponder, ChatCompletionsReplier};
use crate::scheduler::PeriodicTask;
use crate::tools::build_registry;
#[cfg(feature = "whatsapp-web")]
use crate::utils::get_chatterbox_home;
use crate::utils::expand_home;
#[cfg(feature = "whatsapp-web")]
use crate::whatsapp::LinkedSession;
#[cfg(not(feature = "whatsapp-web"))]
use crate::whatsapp::UnlinkedSession;
use crate::whatsapp::{WhatsAppService, WhatsAppSession};
use crate::youtube::{CredentialSource, OAuthClient, StaticToken, TokenFile, YouTubeService};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "chatterbox")]
#[command(about = "WhatsApp and YouTube tools for MCP agents", version)]
pub struct Cli {
    /// Config file (default: ~/.chatterbox/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the agent tools over MCP on stdio
    Mcp,
    /// Run the backing HTTP API (and the auto-responder when configured)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Probe every configured server and print their status
    Status,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Mcp => mcp(&config).await?,
        Commands::Serve { host, port } => serve(config, host, port).await?,
        Commands::Status => status(&config).await?,
    }

    Ok(())
}

fn failover_client(config: &Config) -> Arc<FailoverClient> {
    let client = FailoverClient::new(&config.client.server_urls, &config.secret);
    if client.server_urls().is_empty() {
        warn!("no server URLs configured; set client.serverUrls or CHATTERBOX_SERVER_URLS");
    }
    Arc::new(client)
}

async fn mcp(config: &Config) -> Result<()> {
    let client = failover_client(config);
    let registry = Arc::new(build_registry(client));
    info!("serving {} tools over MCP stdio", registry.len());
    crate::mcp::serve_stdio(registry).await
}

async fn status(config: &Config) -> Result<()> {
    let client = failover_client(config);
    let servers = client.all_servers_health().await;
    match client.active_server().await {
        Ok(current) => print!("{}", format_server_status(&current, &servers)),
        Err(e) => {
            println!("{}", e);
            for server in &servers {
                println!("- {}: ❌ UNHEALTHY", server.url);
            }
        }
    }
    Ok(())
}

/// `tokenFile` wins over a static `accessToken`. The file is refreshed in
/// place when an OAuth client is configured.
pub(crate) fn credential_source(config: &YouTubeConfig) -> Arc<dyn CredentialSource> {
    if config.token_file.trim().is_empty() {
        return Arc::new(StaticToken::new(config.access_token.clone()));
    }
    let file = TokenFile::new(expand_home(&config.token_file));
    if config.can_refresh() {
        Arc::new(file.with_refresh(OAuthClient {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_uri: config.token_uri.clone(),
        }))
    } else {
        Arc::new(file)
    }
}

pub(crate) fn app_state(config: &Config, whatsapp: WhatsAppService) -> AppState {
    if config.secret.is_empty() {
        warn!("no shared secret configured; protected routes will answer 500");
    }
    AppState {
        whatsapp,
        youtube: Arc::new(YouTubeService::with_base_url(
            credential_source(&config.youtube),
            &config.youtube.api_base,
        )),
        health: Arc::new(HealthService::new()),
        secret: Some(config.secret.as_str())
            .filter(|s| !s.is_empty())
            .map(Arc::from),
    }
}

/// Build the auto-responder schedule, or `None` when no numbers are set.
pub(crate) fn auto_responder(config: &Config, whatsapp: WhatsAppService) -> Option<PeriodicTask> {
    let settings = &config.auto_response;
    if !settings.enabled() {
        info!("auto-responder disabled: no numbers configured");
        return None;
    }
    if settings.reply.api_key.is_empty() {
        warn!("auto-responder enabled without autoResponse.reply.apiKey");
    }
    let replier = ChatCompletionsReplier::new(
        &settings.reply.api_base,
        settings.reply.api_key.clone(),
        settings.reply.model.clone(),
    )
    .with_max_tokens(settings.reply.max_tokens)
    .with_system_prompt(settings.reply.system_prompt.clone());

    let responder = Arc::new(AutoResponder::new(
        whatsapp,
        Arc::new(replier),
        settings.numbers.clone(),
    ));
    responder.into_task(Duration::from_millis(settings.interval_ms))
}

#[cfg(feature = "whatsapp-web")]
fn whatsapp_session() -> Result<Arc<dyn WhatsAppSession>> {
    let db = get_chatterbox_home()?.join("whatsapp").join("whatsapp.db");
    Ok(LinkedSession::start(db)?)
}

#[cfg(not(feature = "whatsapp-web"))]
fn whatsapp_session() -> Result<Arc<dyn WhatsAppSession>> {
    warn!("built without the whatsapp-web feature; WhatsApp routes will report not ready");
    Ok(Arc::new(UnlinkedSession))
}

async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let whatsapp = WhatsAppService::new(whatsapp_session()?);
    let state = app_state(&config, whatsapp.clone());

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let (mut server, addr) = gateway::start(
        &config.server.host,
        config.server.port,
        state,
        async move {
            let _ = shutdown_rx.await;
        },
    )
    .await
    .context("failed to start backing API")?;
    info!("chatterbox serving on http://{}", addr);

    let poller = auto_responder(&config, whatsapp.clone());
    if let Some(ref poller) = poller {
        poller.start().await;
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
        res = &mut server => {
            if let Err(e) = res {
                error!("backing API task failed: {}", e);
            }
        }
    }

    if let Some(poller) = poller {
        poller.stop().await;
    }
    let _ = shutdown_tx.send(());
    if !server.is_finished() {
        let _ = server.await;
    }
    whatsapp.shutdown().await;
    Ok(())
}
