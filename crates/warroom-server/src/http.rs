//! hyper glue: accept loop and JSON responses

use crate::api::App;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Largest request body accepted, in bytes
pub const MAX_BODY: usize = 64 * 1024;

/// Accept connections forever, serving each on its own task
pub async fn serve(app: Arc<App>, listener: TcpListener) {
    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
                continue;
            }
        };

        let app = app.clone();
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| {
                let app = app.clone();
                async move { handle_request(app, remote_addr, req).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::error!(%remote_addr, error = %e, "connection failed");
            }
        });
    }
}

async fn handle_request(
    app: Arc<App>,
    remote_addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    tracing::debug!(%remote_addr, %method, %path, "request");

    if method == Method::OPTIONS {
        return Ok(preflight());
    }

    let body = match read_body(req.into_body()).await {
        Ok(body) => body,
        Err((status, body)) => {
            tracing::warn!(%remote_addr, %method, %path, %status, "failed to read request body");
            return Ok(json_response(status, &body));
        }
    };

    let (status, value) = app.handle(&method, &path, &body).await;
    Ok(json_response(status, &value))
}

/// Collect a request body of at most `MAX_BODY` bytes
async fn read_body<B>(body: B) -> Result<Bytes, (StatusCode, Value)>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, MAX_BODY).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            json!({
                "error": format!("Request body exceeds {MAX_BODY} bytes"),
                "kind": "payload_too_large",
            }),
        )),
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            json!({ "error": e.to_string(), "kind": "bad_request" }),
        )),
    }
}

/// Build a JSON response carrying the permissive CORS header
pub fn json_response(status: StatusCode, value: &Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(value.to_string())));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

fn preflight() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    response
}
