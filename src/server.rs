//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! The composition root: opens the database, wires the shared state into
//! the tool handler, and runs the chosen transport. No ambient globals —
//! every component receives its dependencies here.

use crate::config::SynthesisConfig;
use crate::db;
use crate::tools::SynthesisTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared setup: open the database and check index compatibility.
fn setup_shared_state(
    config: SynthesisConfig,
) -> Result<(Arc<Mutex<rusqlite::Connection>>, Arc<SynthesisConfig>)> {
    let db_path = config.resolved_db_path();
    let busy_timeout = Duration::from_millis(config.storage.busy_timeout_ms);
    let conn = db::open_database(&db_path, busy_timeout)?;
    tracing::info!(db = %db_path.display(), "database ready");

    // Refuse quietly-wrong vector math: the store must have been built for
    // the dimensionality this binary expects.
    if let Ok(Some(stored_dim)) = db::migrations::get_embedding_dim(&conn) {
        if stored_dim != db::migrations::EMBEDDING_DIM {
            tracing::warn!(
                stored = stored_dim,
                expected = db::migrations::EMBEDDING_DIM,
                "embedding dimension mismatch — reindex embeddings before searching"
            );
        }
    }

    Ok((Arc::new(Mutex::new(conn)), Arc::new(config)))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: SynthesisConfig) -> Result<()> {
    tracing::info!("starting synthesis MCP server on stdio");

    let (db, config) = setup_shared_state(config)?;

    let tools = SynthesisTools::new(db, config);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running — waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP.
pub async fn serve_http(config: SynthesisConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting synthesis MCP server on HTTP");

    let (db, config) = setup_shared_state(config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(SynthesisTools::new(db.clone(), config.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
