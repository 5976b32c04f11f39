//! Command runners invoked from `main`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use nlq_gateway::{
    academic_schema, create_rest_router, Authenticator, Config, Gateway, MySqlExecutor,
    PromptCompiler,
};

use super::output;

/// Run the HTTP gateway until Ctrl-C.
pub async fn run_serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    let authenticator = Authenticator::new(config.auth.clone())?;
    // Lazy pool so the gateway starts, and /health reports, while MySQL is down
    let executor = Arc::new(MySqlExecutor::connect_lazy(&config.database)?);
    let gateway = Arc::new(Gateway::from_config(&config, executor)?);

    tracing::info!(
        oracle = gateway.oracle_name(),
        model = %config.oracle.model,
        guard = ?config.database.guard,
        auth = authenticator.is_enabled(),
        "Gateway initialized"
    );

    let app = create_rest_router(gateway, authenticator, &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("NLQ gateway listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("NLQ gateway shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Answer one question against the configured database.
pub async fn run_ask(config: Config, question: String, json: bool) -> anyhow::Result<()> {
    let executor = Arc::new(MySqlExecutor::connect(&config.database).await?);
    let gateway = Gateway::from_config(&config, executor)?;

    let envelope = gateway.ask(&question).await;
    output::print_envelope(&envelope, json)
}

/// Print the compiled prompt for a question without calling the model.
pub fn run_prompt(question: String) -> anyhow::Result<()> {
    let prompt = PromptCompiler::default().compile(&question);
    println!("{}", prompt);
    Ok(())
}

/// Print the schema description embedded in every prompt.
pub fn run_schema() -> anyhow::Result<()> {
    println!("{}", academic_schema().render());
    Ok(())
}

/// Issue a token accepted by the gatekeeper.
pub fn run_token(config: Config, id: i64, username: String) -> anyhow::Result<()> {
    let authenticator = Authenticator::new(config.auth)?;
    let token = authenticator.generate_token(id, &username)?;
    println!("{}", token);
    Ok(())
}
