use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use token_bridge_authz::{CredentialClients, KubeAccessGate};
use token_bridge_provider::{ProviderCapability, ProviderClient};
use token_bridge_server::{
    auth::{self, AppState, FlowController, FlowSettings},
    config::ServerConfig,
    template::RedirectTemplate,
};
use token_bridge_session::{FlowCorrelator, MemorySessionStore, SessionStore};
use token_bridge_state::StateCodec;
use token_bridge_storage::{KubeResourceFetcher, SecretTokenPersister};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(providers = config.providers.len(), "Loaded configuration");

    let signing_secret = config
        .signing_secret()
        .expect("failed to load state signing secret");
    let codec = StateCodec::new(&signing_secret).expect("invalid state signing secret");
    let base_path = config.base_path().expect("invalid base_url");

    let template = match &config.redirect_template_file {
        Some(path) => RedirectTemplate::from_file(path),
        None => RedirectTemplate::builtin(),
    }
    .expect("failed to load redirect notice template");

    // Cluster clients: the service's own identity writes secrets, callers'
    // credentials are used for the access review and the resource read.
    let kube_config = kube::Config::infer()
        .await
        .expect("failed to infer cluster configuration");
    let service_client =
        kube::Client::try_from(kube_config.clone()).expect("failed to create cluster client");
    let credential_clients = CredentialClients::new(kube_config);

    let request_timeout = Duration::from_secs(config.server.request_timeout_seconds);
    let mut providers = HashMap::new();
    for (name, settings) in &config.providers {
        let capability = ProviderCapability::from_settings(name, settings)
            .expect("invalid provider configuration");
        let client = ProviderClient::new(
            capability,
            settings.client_id.clone(),
            settings.client_secret.clone(),
            &config.base_url,
            request_timeout,
        )
        .expect("failed to create provider client");
        tracing::info!(provider = %client.name(), callback = %client.redirect_url(), "Registered provider");
        providers.insert(client.name().to_string(), client);
    }

    // Spawn periodic session cleanup task
    let session_store = Arc::new(MemorySessionStore::new(chrono::Duration::minutes(
        config.session.ttl_minutes,
    )));
    let cleanup_store = session_store.clone();
    let cleanup_interval_secs = config.session.cleanup_interval_seconds;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;
            match cleanup_store.delete_expired().await {
                Ok(count) if count > 0 => {
                    tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to cleanup expired sessions");
                }
            }
        }
    });

    let controller = FlowController::new(
        codec,
        FlowCorrelator::new(session_store),
        Arc::new(KubeAccessGate::new(credential_clients.clone())),
        Arc::new(KubeResourceFetcher::new(
            credential_clients,
            &config.cluster.token_resource,
        )),
        Arc::new(SecretTokenPersister::new(
            service_client,
            config.cluster.secret_name_suffix.clone(),
        )),
        template,
        FlowSettings {
            access: config.cluster.access.clone(),
            base_url: config.base_url.clone(),
            single_use_flows: config.session.single_use_flows,
        },
    );

    let app_state = Arc::new(AppState::new(controller, providers, config.session));

    let app = auth::with_middleware(auth::router(app_state, &base_path), request_timeout);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
