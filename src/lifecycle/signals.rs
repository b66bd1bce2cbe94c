//! OS signal handling.

/// Resolve on Ctrl+C.
///
/// If the handler cannot be installed the error is logged and this never
/// resolves, so the process keeps serving rather than exiting at once.
pub async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
