//! # erp-rpc
//!
//! Line-delimited JSON server for Boxwork ERP records.
//!
//! ```text
//! $ echo '{"id":1,"method":"list","params":{"module_key":"partners"}}' | erp-rpc
//! {"jsonrpc":"2.0","id":1,"result":{"records":[]}}
//! ```

use erp_rpc::{init_tracing, open, serve, RpcConfig};
use tokio::io::BufReader;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = RpcConfig::load()?;
    init_tracing(&config.log_filter);

    info!(
        database = %config.database_path,
        max_connections = config.max_connections,
        "Starting erp-rpc"
    );

    let (handler, db) = open(&config).await?;
    if !db.is_healthy().await {
        warn!("Database health check failed at startup");
    }

    let served = serve(
        &handler,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        shutdown_signal(),
    )
    .await;

    db.close().await;

    let replies = served?;
    info!(replies, "erp-rpc stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
