//! HTTP response building module
//!
//! Provides builders for the responses the router emits, decoupled from specific business logic.

use std::convert::Infallible;

use futures::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::error::AppError;
use crate::storage::ByteStream;

/// Body type shared by every response: buffered JSON/text or a streamed object
pub type ResponseBody = UnsyncBoxBody<Bytes, std::io::Error>;

pub const NOT_FOUND_MESSAGE: &str = "Not Found";
pub const OCTET_STREAM: &str = "application/octet-stream";

pub fn full<T: Into<Bytes>>(chunk: T) -> ResponseBody {
    Full::new(chunk.into())
        .map_err(|never: Infallible| match never {})
        .boxed_unsync()
}

pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never: Infallible| match never {})
        .boxed_unsync()
}

/// Wrap an object stream as a response body, one data frame per chunk
pub fn streamed(stream: ByteStream) -> ResponseBody {
    StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync()
}

/// Build 204 No Content response (preflight)
pub fn build_no_content_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("204", &e);
            Response::new(empty())
        })
}

/// Build 404 Not Found response for unknown routes; no `Content-Type` is declared
pub fn build_404_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(full(NOT_FOUND_MESSAGE))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(full(NOT_FOUND_MESSAGE))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
}

/// Build plain-text response
pub fn build_text_response(status: StatusCode, text: &'static str) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(full(text))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(full(text))
        })
}

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<ResponseBody> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header(CONTENT_TYPE, "application/json")
                .body(full(r#"{"error":"Internal server error"}"#))
                .unwrap_or_else(|_| Response::new(full("Error")));
        }
    };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(full(json))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(full("Error"))
        })
}

/// Render a handler failure: plain text for upload validation, `{"error": ...}` otherwise
pub fn build_error_response(err: &AppError) -> Response<ResponseBody> {
    let status = err.status();
    let message = err.message();

    if err.is_plain_text() {
        return Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(full(message.clone()))
            .unwrap_or_else(|e| {
                log_build_error(status.as_str(), &e);
                Response::new(full(message))
            });
    }

    json_response(status, &serde_json::json!({ "error": message }))
}

/// Build 200 response streaming a stored object
pub fn build_stream_response(content_type: &str, body: ByteStream) -> Response<ResponseBody> {
    match Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .body(())
    {
        Ok(resp) => resp.map(|()| streamed(body)),
        Err(e) => {
            // Stored content type is not a valid header value
            log_build_error("200", &e);
            let mut resp = Response::new(streamed(body));
            resp.headers_mut().insert(
                CONTENT_TYPE,
                hyper::header::HeaderValue::from_static(OCTET_STREAM),
            );
            resp
        }
    }
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
