//! HTTP surface.
//!
//! | Method | Path            | Response                                   |
//! |--------|-----------------|--------------------------------------------|
//! | GET    | `/update`       | 8-byte little-endian challenge             |
//! | POST   | `/update`       | 200, 403 on rejection, 500 on store failure |
//! | GET    | `/posts`        | JSON `[{name, timestamp}]`                 |
//! | GET    | `/posts/latest` | JSON record, 404 when empty                |
//! | GET    | `/posts/:name`  | JSON record, 404 when absent               |
//!
//! Store calls are synchronous and run on the blocking pool. `/update` reads
//! its body itself, bounded by [`ServerContext::update_limit`], instead of
//! through axum's default body limit.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{ConnectInfo, DefaultBodyLimit, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::Instrument;

use quire_core::ContentRecord;
use quire_store::{IndexEntry, Table};

use crate::context::ServerContext;
use crate::error::{Result, ServerError};
use crate::update;

type Ctx<T> = State<Arc<ServerContext<T>>>;

/// Build the router over `ctx`.
pub fn router<T: Table + 'static>(ctx: Arc<ServerContext<T>>) -> Router {
    Router::new()
        .route(
            "/update",
            get(get_update::<T>)
                .post(post_update::<T>)
                .layer(DefaultBodyLimit::disable()),
        )
        .route("/posts", get(list_posts::<T>))
        .route("/posts/latest", get(latest_post::<T>))
        .route("/posts/:name", get(get_post::<T>))
        .layer(middleware::from_fn(trace_request))
        .with_state(ctx)
}

/// Serve `ctx` on `listener` until `shutdown` resolves.
pub async fn serve<T, F>(listener: TcpListener, ctx: Arc<ServerContext<T>>, shutdown: F) -> Result<()>
where
    T: Table + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(ctx);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    Ok(())
}

async fn trace_request(req: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
    );
    async move {
        let response = next.run(req).await;
        tracing::info!(status = response.status().as_u16(), "handled");
        response
    }
    .instrument(span)
    .await
}

/// Run a store operation on the blocking pool.
async fn blocking<F, R>(f: F) -> Result<R>
where
    F: FnOnce() -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Worker(e.to_string()))?
}

fn peer(connect: Option<ConnectInfo<SocketAddr>>) -> Option<SocketAddr> {
    connect.map(|ConnectInfo(addr)| addr)
}

async fn get_update<T: Table + 'static>(
    State(ctx): Ctx<T>,
    connect: Option<ConnectInfo<SocketAddr>>,
) -> impl IntoResponse {
    let challenge = update::issue_challenge(&ctx, peer(connect));
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        challenge.to_vec(),
    )
}

async fn post_update<T: Table + 'static>(
    State(ctx): Ctx<T>,
    connect: Option<ConnectInfo<SocketAddr>>,
    body: Body,
) -> Result<StatusCode> {
    // The challenge is spent before any of the body is read.
    let challenge = update::take_challenge(&ctx, peer(connect))?;

    let body = to_bytes(body, ctx.update_limit())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, limit = ctx.update_limit(), "update body rejected");
            ServerError::NotAuthorized
        })?;

    blocking(move || update::apply_update(&ctx, challenge, &body)).await?;
    Ok(StatusCode::OK)
}

async fn list_posts<T: Table + 'static>(State(ctx): Ctx<T>) -> Result<Json<Vec<IndexEntry>>> {
    let entries = blocking(move || Ok(ctx.store().list()?)).await?;
    Ok(Json(entries))
}

async fn latest_post<T: Table + 'static>(State(ctx): Ctx<T>) -> Result<Json<ContentRecord>> {
    let record = blocking(move || Ok(ctx.store().latest()?)).await?;
    Ok(Json(record))
}

async fn get_post<T: Table + 'static>(
    State(ctx): Ctx<T>,
    Path(name): Path<String>,
) -> Result<Json<ContentRecord>> {
    let record = blocking(move || Ok(ctx.store().get(&name)?)).await?;
    Ok(Json(record))
}
