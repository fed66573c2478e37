use std::net::SocketAddr;

use axum::{
    routing::{delete, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    services::{create_subscription, delete_subscription, list_subscriptions},
    state::AppState,
};

/// Builds the subscription API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/subscriptions",
            post(create_subscription).get(list_subscriptions),
        )
        .route("/subscriptions/{id}", delete(delete_subscription))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serves the API on `address` until Ctrl+C or SIGTERM.
pub async fn run(address: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!(%address, "Subscription API listening");

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
