//! Axum-based API server.

use std::future::Future;
use std::net::SocketAddr;

use axum::routing::{delete, get, post};
use axum::Router;
use meetpoll_ledger::PollService;
use meetpoll_store::PollStore;
use tower_http::cors::CorsLayer;

use crate::error::RpcError;
use crate::handlers;

/// Build the API router over `service`.
pub fn router<S: PollStore + 'static>(service: PollService<S>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/sessions", post(handlers::create_session::<S>))
        .route("/api/v1/sessions/:id", get(handlers::get_session::<S>))
        .route("/api/v1/sessions/:id/vote", post(handlers::submit_vote::<S>))
        .route(
            "/api/v1/sessions/:id/timeslots",
            post(handlers::create_timeslot::<S>),
        )
        .route(
            "/api/v1/sessions/:id/timeslots/:timeslot_id",
            delete(handlers::delete_timeslot::<S>),
        )
        .layer(CorsLayer::permissive())
        .with_state(service)
}

pub struct RpcServer {
    pub addr: SocketAddr,
}

impl RpcServer {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Serve the API until `shutdown` resolves.
    pub async fn serve<S, F>(&self, service: PollService<S>, shutdown: F) -> Result<(), RpcError>
    where
        S: PollStore + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!(addr = %self.addr, "API server listening");
        axum::serve(listener, router(service))
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
