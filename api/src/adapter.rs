//! Fetch-style request adapter.
//!
//! Turns one HTTP request on the RPC endpoint into procedure calls and one
//! HTTP response. Procedure failures become error envelopes (the adapter
//! *handles* them); failures of the adapter itself are *rethrown* to the
//! caller as [`TransportError`]. Both are reported to `on_error` first.
//!
//! # Wire format
//!
//! ```text
//! GET  /api/trpc/post.byId?input={"id":"..."}       query
//! POST /api/trpc/post.create   {"title":..}          mutation
//! GET  /api/trpc/post.all,auth.getSession?batch=1&input={"1":null}
//!
//! 200 {"result":{"data":...}}
//! 401 {"error":{"message":"UNAUTHORIZED","code":"UNAUTHORIZED","httpStatus":401,"path":"auth.signOut"}}
//! ```
//!
//! Batches answer with an array of envelopes, one per path, and `207` when
//! their statuses differ.

use crate::context::RpcContext;
use crate::error::{RpcError, TransportError};
use crate::providers::PostRepository;
use crate::router::{ProcedureKind, RpcRouter};
use acme_auth::SessionStore;
use axum::body::Body;
use axum::extract::{OriginalUri, Request};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use serde_json::{json, Map, Value};
use std::future::Future;

/// Largest request body read.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Whether the adapter answered an error itself or passed it on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Rendered into an error envelope and returned as a normal response.
    Handled,
    /// Returned to the caller as `Err`; nothing was written.
    Rethrown,
}

/// What `on_error` is told about a failure.
#[derive(Debug)]
pub struct RpcErrorEvent<'a> {
    /// Procedure path, when the failure belongs to one.
    pub path: Option<&'a str>,
    /// The failure.
    pub error: &'a (dyn std::error::Error + Send + Sync),
    /// How the adapter dealt with it.
    pub disposition: ErrorDisposition,
}

/// Inputs of [`fetch_request_handler`].
pub struct FetchHandlerOptions<'a, C, E> {
    /// Mount path of the RPC endpoint, e.g. `/api/trpc`.
    pub endpoint: &'a str,
    /// Procedure table.
    pub router: &'a RpcRouter,
    /// The request, untouched.
    pub request: Request,
    /// Builds the context from the request headers.
    pub create_context: C,
    /// Called once per failure, before the response is produced.
    pub on_error: E,
}

/// Handle one request on the RPC endpoint.
///
/// # Errors
///
/// Returns [`TransportError`] if the request is not below `endpoint`, its
/// body cannot be read, or the response cannot be encoded. Procedure errors
/// are not errors here: they are part of the response.
pub async fn fetch_request_handler<P, S, C, Fut, E>(
    options: FetchHandlerOptions<'_, C, E>,
) -> Result<Response, TransportError>
where
    P: PostRepository,
    S: SessionStore,
    C: FnOnce(HeaderMap) -> Fut,
    Fut: Future<Output = crate::error::Result<RpcContext<P, S>>>,
    E: Fn(&RpcErrorEvent<'_>),
{
    let FetchHandlerOptions {
        endpoint,
        router,
        request,
        create_context,
        on_error,
    } = options;

    let rethrow = |error: TransportError, path: Option<&str>| {
        on_error(&RpcErrorEvent {
            path,
            error: &error,
            disposition: ErrorDisposition::Rethrown,
        });
        metrics::counter!("rpc.transport.errors").increment(1);
        error
    };

    let (parts, body) = request.into_parts();
    let full_path = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0)
        .path()
        .to_string();

    let Some(rest) = full_path.strip_prefix(endpoint) else {
        return Err(rethrow(
            TransportError::EndpointMismatch {
                path: full_path.clone(),
                endpoint: endpoint.to_string(),
            },
            None,
        ));
    };
    let rest = rest.trim_start_matches('/');

    let query: Vec<(String, String)> =
        serde_urlencoded::from_str(parts.uri.query().unwrap_or_default()).unwrap_or_default();
    let is_batch = query.iter().any(|(k, v)| k == "batch" && v == "1");
    let paths: Vec<&str> = if is_batch {
        rest.split(',').collect()
    } else {
        vec![rest]
    };

    let kind = match parts.method {
        Method::GET => Some(ProcedureKind::Query),
        Method::POST => Some(ProcedureKind::Mutation),
        _ => None,
    };

    let raw_input = if parts.method == Method::POST {
        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| rethrow(TransportError::Body(e.to_string()), paths.first().copied()))?;
        (!bytes.is_empty()).then(|| String::from_utf8_lossy(&bytes).into_owned())
    } else {
        query
            .iter()
            .find(|(k, _)| k == "input")
            .map(|(_, v)| v.clone())
    };

    let inputs = parse_inputs(paths.len(), raw_input.as_deref(), is_batch);
    let context = create_context(parts.headers).await;

    let mut results = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().copied().enumerate() {
        let result = match (&context, &inputs, kind) {
            (Err(err), _, _) | (_, Err(err), _) => Err(err.clone()),
            (_, _, None) => Err(RpcError::method_not_supported(format!(
                "Unsupported {}-request",
                parts.method
            ))),
            (Ok(ctx), Ok(inputs), Some(kind)) => {
                let input = inputs.get(index).cloned().flatten();
                router.call(ctx, kind, path, input).await
            }
        };

        if let Err(err) = &result {
            on_error(&RpcErrorEvent {
                path: (!path.is_empty()).then_some(path),
                error: err,
                disposition: ErrorDisposition::Handled,
            });
            metrics::counter!("rpc.errors", "code" => err.code.as_str()).increment(1);
        }
        results.push((path, result));
    }

    let (status, body) = if is_batch {
        let status = batch_status(&results);
        let envelopes: Vec<Value> = results.iter().map(|(p, r)| envelope(p, r)).collect();
        (status, Value::Array(envelopes))
    } else {
        let (path, result) = results
            .first()
            .map_or(("", None), |(p, r)| (*p, Some(r)));
        match result {
            Some(result) => (result_status(result), envelope(path, result)),
            None => (StatusCode::OK, Value::Null),
        }
    };

    let bytes = serde_json::to_vec(&body).map_err(|e| rethrow(TransportError::Encode(e), None))?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

/// Split the raw input among `count` calls.
///
/// A batch input is an object keyed by call index. Invalid JSON fails every
/// call with `PARSE_ERROR`.
fn parse_inputs(
    count: usize,
    raw_input: Option<&str>,
    is_batch: bool,
) -> Result<Vec<Option<Value>>, RpcError> {
    let parsed = raw_input
        .map(serde_json::from_str::<Value>)
        .transpose()
        .map_err(|e| RpcError::parse(format!("Failed to parse input: {e}")))?;

    if !is_batch {
        return Ok(vec![parsed; count]);
    }

    let mut by_index = match parsed {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(RpcError::parse("Batch input must be an object")),
    };

    Ok((0..count)
        .map(|index| by_index.remove(&index.to_string()).filter(|v| !v.is_null()))
        .collect())
}

fn result_status(result: &Result<Value, RpcError>) -> StatusCode {
    match result {
        Ok(_) => StatusCode::OK,
        Err(err) => err.code.http_status(),
    }
}

fn batch_status(results: &[(&str, Result<Value, RpcError>)]) -> StatusCode {
    let mut statuses = results.iter().map(|(_, r)| result_status(r));
    let first = statuses.next().unwrap_or(StatusCode::OK);
    if statuses.all(|s| s == first) {
        first
    } else {
        StatusCode::MULTI_STATUS
    }
}

fn envelope(path: &str, result: &Result<Value, RpcError>) -> Value {
    match result {
        Ok(data) => json!({ "result": { "data": data } }),
        Err(err) => {
            let path = if path.is_empty() { Value::Null } else { Value::from(path) };
            let mut error = json!({
                "message": err.message,
                "code": err.code.as_str(),
                "httpStatus": err.code.http_status().as_u16(),
                "path": path,
            });
            if let (Some(fields), Some(object)) = (&err.field_errors, error.as_object_mut()) {
                object.insert("fieldErrors".to_string(), json!(fields));
            }
            json!({ "error": error })
        }
    }
}
