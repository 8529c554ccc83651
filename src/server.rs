use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::app::AppContext;
use crate::endpoints::{self, ApiReply, CACHE_CONTROL};

type Ctx = Arc<AppContext>;

pub fn router(ctx: Ctx) -> Router {
    Router::new()
        .route("/api/healthz", get(healthz))
        .route("/api/revalidate", get(revalidate).post(revalidate))
        .route("/api/proxy-status", get(proxy_status))
        .route("/api/test-webhook", get(test_webhook))
        .route("/api/deep-diagnostic", get(deep_diagnostic))
        .route("/api/fpl", get(fpl))
        .with_state(ctx)
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(ctx: Ctx, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "http server listening");
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server error")?;
    Ok(())
}

fn reply(reply: ApiReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CACHE_CONTROL, CACHE_CONTROL)],
        Json(reply.body),
    )
        .into_response()
}

// Handlers do blocking upstream I/O; keep it off the runtime's worker threads.
async fn blocking<F>(ctx: Ctx, handler: F) -> Response
where
    F: FnOnce(&AppContext) -> ApiReply + Send + 'static,
{
    match tokio::task::spawn_blocking(move || handler(ctx.as_ref())).await {
        Ok(out) => reply(out),
        Err(err) => {
            error!(error = %err, "handler task failed");
            reply(ApiReply {
                status: 500,
                body: json!({ "error": "internal error" }),
            })
        }
    }
}

async fn healthz(State(ctx): State<Ctx>) -> Response {
    blocking(ctx, endpoints::healthz).await
}

#[derive(Debug, Default, Deserialize)]
struct RevalidateParams {
    path: Option<String>,
    secret: Option<String>,
}

async fn revalidate(State(ctx): State<Ctx>, Query(params): Query<RevalidateParams>) -> Response {
    blocking(ctx, move |ctx| {
        endpoints::revalidate(ctx, params.path.as_deref(), params.secret.as_deref())
    })
    .await
}

async fn proxy_status(State(ctx): State<Ctx>) -> Response {
    reply(endpoints::proxy_status(&ctx))
}

async fn test_webhook(State(ctx): State<Ctx>) -> Response {
    blocking(ctx, endpoints::test_webhook).await
}

async fn deep_diagnostic(State(ctx): State<Ctx>) -> Response {
    blocking(ctx, endpoints::deep_diagnostic).await
}

async fn fpl(State(ctx): State<Ctx>) -> Response {
    blocking(ctx, endpoints::fpl_snapshot).await
}
