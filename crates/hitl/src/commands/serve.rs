//! Serve command - runs the gateway.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;

use hitl_auth::{
    Algorithm, ApiKeyVerifier, Authenticator, CachedVerifier, CredentialVerifier, JwtSettings,
    JwtVerifier, TtlCache,
};
use hitl_client::{HitlClient, LoopsApi};
use hitl_config::{AuthStrategy, HitlConfig, load_config};
use hitl_server::{Server, ServerConfig};
use hitl_tools::hitl_registry;
use tracing::info;

use super::Context;

/// Arguments for the serve command.
///
/// CLI arguments override config file and environment values.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// HITL API base URL (overrides config)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Credential verification strategy: api_key or jwt (overrides config)
    #[arg(long)]
    pub strategy: Option<AuthStrategy>,
}

impl ServeArgs {
    fn apply(&self, config: &mut HitlConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(url) = &self.base_url {
            config.upstream.base_url = url.clone();
        }
        if let Some(strategy) = self.strategy {
            config.auth.strategy = strategy;
        }
    }
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let loaded = load_config(ctx.config_path.as_deref()).context("failed to load configuration")?;
    match &loaded.source {
        Some(path) => info!(path = %path.display(), "Loaded configuration"),
        None => info!("No config file found, using defaults"),
    }

    let mut config = loaded.config;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let client = HitlClient::builder()
        .base_url(config.upstream.base_url.clone())
        .timeout(config.upstream.timeout())
        .user_agent(format!("hitl-mcp/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HITL API client")?;
    let api: Arc<dyn LoopsApi> = Arc::new(client);

    let authenticator = build_authenticator(&config, api.clone())?;
    let registry = hitl_registry(api);
    let server_config = server_config(&config)?;

    if ctx.verbose {
        info!(
            base_url = %config.upstream.base_url,
            strategy = %config.auth.strategy,
            cache_ttl_secs = config.auth.cache_ttl_secs,
            "Gateway configured"
        );
    }

    Server::new(registry, authenticator, server_config)
        .run_with_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// The verifier selected by `auth.strategy`, behind the shared cache.
pub fn build_authenticator(config: &HitlConfig, api: Arc<dyn LoopsApi>) -> Result<Authenticator> {
    let verifier = build_verifier(config, api)?;
    let cache = Arc::new(TtlCache::new(config.auth.cache_capacity));
    Ok(Authenticator::new(
        CachedVerifier::new(verifier, cache).with_ttl(config.auth.cache_ttl()),
    ))
}

fn build_verifier(
    config: &HitlConfig,
    api: Arc<dyn LoopsApi>,
) -> Result<Arc<dyn CredentialVerifier>> {
    match config.auth.strategy {
        AuthStrategy::ApiKey => Ok(Arc::new(ApiKeyVerifier::new(api))),
        AuthStrategy::Jwt => {
            let jwt = &config.auth.jwt;
            let issuer = jwt
                .issuer
                .as_deref()
                .context("auth.jwt.issuer is required for the jwt strategy")?;
            let audience = jwt
                .audience
                .as_deref()
                .context("auth.jwt.audience is required for the jwt strategy")?;
            let algorithms = jwt
                .algorithms
                .iter()
                .map(|name| {
                    name.parse::<Algorithm>()
                        .with_context(|| format!("unsupported signing algorithm '{name}'"))
                })
                .collect::<Result<Vec<_>>>()?;

            let mut settings = JwtSettings::new(issuer, audience)
                .with_algorithms(algorithms)
                .with_jwks_ttl(jwt.jwks_ttl())
                .with_leeway_secs(jwt.leeway_secs);
            if let Some(url) = &jwt.jwks_url {
                settings = settings.with_jwks_url(url.clone());
            }

            let verifier =
                JwtVerifier::new(settings).context("failed to configure token verifier")?;
            Ok(Arc::new(verifier))
        }
    }
}

fn server_config(config: &HitlConfig) -> Result<ServerConfig> {
    let server = &config.server;
    Ok(ServerConfig::new()
        .with_bind_address(server.socket_addr()?)
        .with_request_timeout(server.request_timeout())
        .with_max_body_size(server.max_body_size)
        .with_request_logging(server.request_logging)
        .with_cors_origins(server.cors_origins.clone()))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
