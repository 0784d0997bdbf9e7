//! HTTP transport for [`crate::api`].

use anyhow::{anyhow, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::api::{self, ApiRequest, AppState};

/// Request bodies above this are refused with 413.
pub const MAX_BODY_BYTES: usize = 1 << 20;

/// Accept connections until Ctrl-C, then flush the store.
pub async fn serve(listen: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| anyhow!("serve: failed to bind {listen}: {e}"))?;
    let bound = listener
        .local_addr()
        .map_err(|e| anyhow!("serve: failed to read bound addr: {e}"))?;
    tracing::info!(addr = %bound, "listening on http://{bound}");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted.map_err(|e| anyhow!("serve: accept failed: {e}"))?;
                let io = TokioIo::new(stream);
                let state = state.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req| handle_request(req, state.clone()));
                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        tracing::warn!(%peer, error = %e, "connection error");
                    }
                });
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
        }
    }

    state.store.flush().await?;
    Ok(())
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let (parts, body) = req.into_parts();

    let body = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Ok(json_error(StatusCode::PAYLOAD_TOO_LARGE, "request body too large"));
        }
        Err(e) => return Ok(json_error(StatusCode::BAD_REQUEST, &e.to_string())),
    };

    let authorization = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let resp = api::handle(
        &state,
        ApiRequest {
            method: parts.method.clone(),
            path: parts.uri.path(),
            query: parts.uri.query(),
            authorization,
            body: &body,
        },
    )
    .await;

    tracing::debug!(
        method = %parts.method,
        path = parts.uri.path(),
        status = resp.status.as_u16(),
        "request"
    );
    Ok(json_response(resp.status, &resp.body))
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{\"error\":\"serialize\"}".to_vec());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"{\"error\":\"internal\"}"))))
}

fn json_error(status: StatusCode, msg: &str) -> Response<Full<Bytes>> {
    let v = serde_json::json!({ "error": msg });
    json_response(status, &v)
}
